use embedded_can::Id;

use crate::{checksum::checksum, MAX_DATA_LENGTH};

/// A classic CAN data frame as exchanged with the servo: an identifier and up
/// to 8 data bytes. The last data byte of every well-formed frame is the
/// checksum, see [`checksum`](crate::checksum()).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CanFrame {
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    id: Id,
    dlc: usize,
    data: [u8; MAX_DATA_LENGTH],
}

impl CanFrame {
    /// Creates a new data frame. `data` must have a length in the range 0..=8
    /// or else `None` will be returned instead.
    pub fn new_data(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        if data.len() > MAX_DATA_LENGTH {
            return None;
        }

        let mut copy = [0u8; MAX_DATA_LENGTH];
        copy[..data.len()].copy_from_slice(data);

        Some(Self {
            id: id.into(),
            dlc: data.len(),
            data: copy,
        })
    }

    /// Builds a frame from a fixed command layout and appends its checksum.
    ///
    /// The layout plus checksum has to fit into a single frame, which is
    /// checked when the layout is compiled rather than when it is sent.
    pub(crate) fn with_checksum<const N: usize>(id: Id, payload: [u8; N]) -> Self {
        const {
            assert!(
                N < MAX_DATA_LENGTH,
                "command layout leaves no room for the checksum"
            )
        };

        let mut data = [0u8; MAX_DATA_LENGTH];
        data[..N].copy_from_slice(&payload);
        data[N] = checksum(id.raw(), &payload);

        Self {
            id,
            dlc: N + 1,
            data,
        }
    }

    /// Gets the message ID of the frame
    pub fn id(&self) -> Id {
        self.id
    }

    /// Gets the DLC (Data Length Code) of the frame
    pub fn dlc(&self) -> usize {
        self.dlc
    }

    /// Gets the data bytes of the frame, checksum included
    pub fn data(&self) -> &[u8] {
        &self.data[..self.dlc]
    }

    /// Whether the trailing byte matches the checksum of everything before it.
    /// Empty frames carry no checksum and are never valid.
    pub fn has_valid_checksum(&self) -> bool {
        match self.data().split_last() {
            Some((received, payload)) => checksum(self.id.raw(), payload) == *received,
            None => false,
        }
    }
}

impl embedded_can::Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        Self::new_data(id, data)
    }

    /// The servo protocol has no use for remote frames
    fn new_remote(_id: impl Into<Id>, _dlc: usize) -> Option<Self> {
        None
    }

    fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    fn is_remote_frame(&self) -> bool {
        false
    }

    fn id(&self) -> Id {
        self.id
    }

    fn dlc(&self) -> usize {
        self.dlc
    }

    fn data(&self) -> &[u8] {
        CanFrame::data(self)
    }
}

pub trait IdExt {
    /// The numeric identifier as it enters the checksum
    fn raw(self) -> u32;
}

impl IdExt for Id {
    fn raw(self) -> u32 {
        match self {
            Id::Standard(id) => id.as_raw() as u32,
            Id::Extended(id) => id.as_raw(),
        }
    }
}
