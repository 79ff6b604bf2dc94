use embedded_can::Id;

use crate::{
    frame::IdExt, transport::Transport, Command, Response, DEFAULT_SEND_TIMEOUT_MS,
};

/// Settings applied to every call on a [`ServoBus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusConfig {
    /// How long a send may wait for the transport to accept a frame
    pub send_timeout_ms: u32,
    /// Drop received frames whose checksum does not match instead of decoding
    /// them. The servo firmware always appends a checksum, so only noisy buses
    /// need this.
    pub discard_bad_checksums: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            send_timeout_ms: DEFAULT_SEND_TIMEOUT_MS,
            discard_bad_checksums: false,
        }
    }
}

impl BusConfig {
    pub fn with_send_timeout_ms(mut self, send_timeout_ms: u32) -> Self {
        self.send_timeout_ms = send_timeout_ms;
        self
    }

    pub fn with_discard_bad_checksums(mut self, discard_bad_checksums: bool) -> Self {
        self.discard_bad_checksums = discard_bad_checksums;
        self
    }
}

/// Sends commands to servos on a bus and reports what they answer.
///
/// Sends are fire-and-forget: a successful [`send`](Self::send) only means the
/// transport accepted the frame. Responses are collected separately with
/// [`poll_responses`](Self::poll_responses).
pub struct ServoBus<T> {
    transport: T,
    config: BusConfig,
}

impl<T: Transport> ServoBus<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, BusConfig::default())
    }

    pub fn with_config(transport: T, config: BusConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    pub fn open(&mut self) -> Result<(), T::Error> {
        self.transport.open()
    }

    /// Encodes `command` for the servo at `id` and hands it to the transport
    pub fn send(&mut self, id: impl Into<Id>, command: &Command) -> Result<(), T::Error> {
        let frame = command.encode(id);

        debug!(
            "TX -> id=0x{:03X} {:?} data={:?}",
            frame.id().raw(),
            command,
            frame.data()
        );

        self.transport.send(&frame, self.config.send_timeout_ms)
    }

    /// Receives and decodes frames until none arrives within `timeout_ms`,
    /// handing each decoded response to `report` along with the identifier it
    /// came from. Frames too short for their code are skipped.
    ///
    /// Returns the number of responses reported.
    pub fn poll_responses<F>(&mut self, timeout_ms: u32, mut report: F) -> Result<usize, T::Error>
    where
        F: FnMut(Id, Response),
    {
        let mut reported = 0;

        while let Some(frame) = self.transport.receive(timeout_ms)? {
            let raw_id = frame.id().raw();

            if self.config.discard_bad_checksums && !frame.has_valid_checksum() {
                warn!(
                    "RX <- id=0x{:03X} dropped, bad checksum: {:?}",
                    raw_id,
                    frame.data()
                );
                continue;
            }

            match Response::from_frame(&frame) {
                Ok(response) => {
                    info!("RX <- id=0x{:03X} {}", raw_id, response);
                    report(frame.id(), response);
                    reported += 1;
                }
                Err(e) => debug!("RX <- id=0x{:03X} skipped: {}", raw_id, e),
            }
        }

        Ok(reported)
    }
}
