use embedded_can::Frame;
use embedded_hal::delay::DelayNs;

use crate::frame::CanFrame;

/// A CAN channel the codec can send frames on and receive frames from.
///
/// Implementations are used by a single caller at a time; sharing one bus
/// between several execution contexts requires serializing access outside of
/// this crate.
pub trait Transport {
    type Error: core::fmt::Debug;

    /// Brings the channel up. Channels that are ready on construction need
    /// not override this.
    fn open(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Queues `frame` for transmission, waiting at most `timeout_ms` for room
    fn send(&mut self, frame: &CanFrame, timeout_ms: u32) -> Result<(), Self::Error>;

    /// Waits at most `timeout_ms` for a frame. `Ok(None)` means nothing arrived
    /// in time.
    fn receive(&mut self, timeout_ms: u32) -> Result<Option<CanFrame>, Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn open(&mut self) -> Result<(), Self::Error> {
        (**self).open()
    }

    fn send(&mut self, frame: &CanFrame, timeout_ms: u32) -> Result<(), Self::Error> {
        (**self).send(frame, timeout_ms)
    }

    fn receive(&mut self, timeout_ms: u32) -> Result<Option<CanFrame>, Self::Error> {
        (**self).receive(timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NbTransportError<E> {
    #[error("The controller did not accept the frame within {0:?} ms")]
    Timeout(u32),
    #[error("A lower priority frame displaced from the mailbox was not requeued within {0:?} ms")]
    Displaced(u32),
    #[error("The controller's frame type cannot represent the frame")]
    FrameRejected,
    #[error("The CAN controller reported an error ({0:?})")]
    Controller(E),
}

/// Adapts any non-blocking [`embedded_can::nb::Can`] controller into a
/// [`Transport`], polling it in 1 ms steps until the timeout runs out.
pub struct NbCanTransport<C, D> {
    can: C,
    delay: D,
}

impl<C, D> NbCanTransport<C, D>
where
    C: embedded_can::nb::Can,
    D: DelayNs,
{
    pub fn new(can: C, delay: D) -> Self {
        Self { can, delay }
    }

    pub fn into_inner(self) -> (C, D) {
        (self.can, self.delay)
    }
}

impl<C, D> Transport for NbCanTransport<C, D>
where
    C: embedded_can::nb::Can,
    D: DelayNs,
{
    type Error = NbTransportError<C::Error>;

    /// Controllers may hand back a lower priority frame that the new one
    /// displaced from the mailbox. That frame was already reported as sent, so
    /// it is retried within the same timeout.
    fn send(&mut self, frame: &CanFrame, timeout_ms: u32) -> Result<(), Self::Error> {
        let mut pending =
            C::Frame::new(frame.id(), frame.data()).ok_or(NbTransportError::FrameRejected)?;
        let mut displaced = false;
        let mut waited_ms = 0;

        loop {
            match self.can.transmit(&pending) {
                Ok(None) => return Ok(()),
                Ok(Some(frame)) => {
                    debug!("requeueing a lower priority frame displaced from the mailbox");
                    pending = frame;
                    displaced = true;
                }
                Err(nb::Error::Other(e)) => return Err(NbTransportError::Controller(e)),
                Err(nb::Error::WouldBlock) => {}
            }

            if waited_ms >= timeout_ms {
                return Err(if displaced {
                    NbTransportError::Displaced(timeout_ms)
                } else {
                    NbTransportError::Timeout(timeout_ms)
                });
            }

            self.delay.delay_ms(1);
            waited_ms += 1;
        }
    }

    /// Remote frames and frames longer than 8 bytes are skipped. Skipping
    /// still counts against `timeout_ms`.
    fn receive(&mut self, timeout_ms: u32) -> Result<Option<CanFrame>, Self::Error> {
        let mut waited_ms = 0;

        loop {
            match self.can.receive() {
                Ok(frame) if frame.is_remote_frame() => {
                    trace!("ignoring remote frame");
                }
                Ok(frame) => match CanFrame::new_data(frame.id(), frame.data()) {
                    Some(frame) => return Ok(Some(frame)),
                    None => debug!("ignoring frame with {} data bytes", frame.data().len()),
                },
                Err(nb::Error::Other(e)) => return Err(NbTransportError::Controller(e)),
                Err(nb::Error::WouldBlock) => {}
            }

            if waited_ms >= timeout_ms {
                return Ok(None);
            }

            self.delay.delay_ms(1);
            waited_ms += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use embedded_can::{ErrorKind, Frame, Id, StandardId};
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use heapless::{Deque, Vec};

    use super::*;
    use crate::IdExt;

    /// Controller double answering each call from a script, then idling
    #[derive(Default)]
    struct ScriptedCan {
        transmit_script: Deque<nb::Result<Option<CanFrame>, ErrorKind>, 16>,
        receive_script: Deque<nb::Result<CanFrame, ErrorKind>, 16>,
        transmitted: Vec<CanFrame, 8>,
    }

    impl embedded_can::nb::Can for ScriptedCan {
        type Frame = CanFrame;
        type Error = ErrorKind;

        fn transmit(&mut self, frame: &CanFrame) -> nb::Result<Option<CanFrame>, ErrorKind> {
            let result = self.transmit_script.pop_front().unwrap_or(Ok(None));
            if matches!(result, Ok(_)) {
                self.transmitted.push(frame.clone()).unwrap();
            }
            result
        }

        fn receive(&mut self) -> nb::Result<CanFrame, ErrorKind> {
            self.receive_script
                .pop_front()
                .unwrap_or(Err(nb::Error::WouldBlock))
        }
    }

    fn frame(data: &[u8]) -> CanFrame {
        CanFrame::new_data(StandardId::new(1).unwrap(), data).unwrap()
    }

    #[test]
    fn send_waits_for_a_free_mailbox() {
        let mut can = ScriptedCan::default();
        for _ in 0..3 {
            can.transmit_script.push_back(Err(nb::Error::WouldBlock)).unwrap();
        }

        let mut transport = NbCanTransport::new(can, NoopDelay::new());
        assert_eq!(transport.send(&frame(&[0x30, 0x31]), 5), Ok(()));

        let (can, _) = transport.into_inner();
        assert_eq!(can.transmitted.len(), 1);
        assert_eq!(can.transmitted[0].data(), &[0x30, 0x31]);
    }

    #[test]
    fn send_times_out() {
        let mut can = ScriptedCan::default();
        for _ in 0..16 {
            can.transmit_script.push_back(Err(nb::Error::WouldBlock)).unwrap();
        }

        let mut transport = NbCanTransport::new(can, NoopDelay::new());
        assert_eq!(
            transport.send(&frame(&[0x30, 0x31]), 4),
            Err(NbTransportError::Timeout(4))
        );

        // one attempt up front and one after each millisecond waited
        let (can, _) = transport.into_inner();
        assert_eq!(can.transmit_script.len(), 16 - 5);
    }

    #[test]
    fn send_reports_controller_errors() {
        let mut can = ScriptedCan::default();
        can.transmit_script
            .push_back(Err(nb::Error::Other(ErrorKind::Bit)))
            .unwrap();

        let mut transport = NbCanTransport::new(can, NoopDelay::new());
        assert_eq!(
            transport.send(&frame(&[0x30, 0x31]), 100),
            Err(NbTransportError::Controller(ErrorKind::Bit))
        );
    }

    #[test]
    fn receive_returns_frames_and_none_on_timeout() {
        let mut can = ScriptedCan::default();
        can.receive_script.push_back(Err(nb::Error::WouldBlock)).unwrap();
        can.receive_script
            .push_back(Ok(frame(&[0xF1, 0x01, 0xF3])))
            .unwrap();

        let mut transport = NbCanTransport::new(can, NoopDelay::new());
        assert_eq!(transport.receive(10), Ok(Some(frame(&[0xF1, 0x01, 0xF3]))));
        assert_eq!(transport.receive(10), Ok(None));
        assert_eq!(transport.receive(0), Ok(None));
    }

    #[test]
    fn receive_reports_controller_errors() {
        let mut can = ScriptedCan::default();
        can.receive_script
            .push_back(Err(nb::Error::Other(ErrorKind::Overrun)))
            .unwrap();

        let mut transport = NbCanTransport::new(can, NoopDelay::new());
        assert_eq!(
            transport.receive(10),
            Err(NbTransportError::Controller(ErrorKind::Overrun))
        );
    }

    #[test]
    fn borrowed_transports() {
        let mut transport = NbCanTransport::new(ScriptedCan::default(), NoopDelay::new());

        fn open_and_send<T: Transport>(mut transport: T) -> Result<(), T::Error> {
            transport.open()?;
            transport.send(&frame(&[0xF7, 0xF8]), 1)
        }

        assert_eq!(open_and_send(&mut transport), Ok(()));

        let (can, _) = transport.into_inner();
        assert_eq!(can.transmitted[0].data(), &[0xF7, 0xF8]);
    }

    /// Single mailbox that lets a higher priority frame displace the queued
    /// one, and puts the queued frame on the wire after it has been busy for
    /// two polls
    #[derive(Default)]
    struct MailboxCan {
        mailbox: Option<CanFrame>,
        busy_polls: u8,
        wire: Vec<CanFrame, 8>,
    }

    impl embedded_can::nb::Can for MailboxCan {
        type Frame = CanFrame;
        type Error = ErrorKind;

        fn transmit(&mut self, frame: &CanFrame) -> nb::Result<Option<CanFrame>, ErrorKind> {
            if self.busy_polls == 0 {
                if let Some(sent) = self.mailbox.take() {
                    self.wire.push(sent).unwrap();
                }
            }

            match &self.mailbox {
                None => {
                    self.mailbox = Some(frame.clone());
                    self.busy_polls = 2;
                    Ok(None)
                }
                Some(queued) if frame.id().raw() < queued.id().raw() => {
                    self.busy_polls = 2;
                    Ok(self.mailbox.replace(frame.clone()))
                }
                Some(_) => {
                    self.busy_polls -= 1;
                    Err(nb::Error::WouldBlock)
                }
            }
        }

        fn receive(&mut self) -> nb::Result<CanFrame, ErrorKind> {
            Err(nb::Error::WouldBlock)
        }
    }

    fn frame_to(raw_id: u16, data: &[u8]) -> CanFrame {
        CanFrame::new_data(StandardId::new(raw_id).unwrap(), data).unwrap()
    }

    #[test]
    fn displaced_frames_are_requeued() {
        let mut transport = NbCanTransport::new(MailboxCan::default(), NoopDelay::new());

        assert_eq!(transport.send(&frame_to(0x10, &[0xF7, 0x07]), 10), Ok(()));
        assert_eq!(transport.send(&frame_to(0x01, &[0x30, 0x31]), 10), Ok(()));

        let (can, _) = transport.into_inner();
        assert_eq!(can.wire.as_slice(), &[frame_to(0x01, &[0x30, 0x31])]);
        assert_eq!(can.mailbox, Some(frame_to(0x10, &[0xF7, 0x07])));
    }

    #[test]
    fn displaced_frame_not_requeued_in_time_is_an_error() {
        let mut transport = NbCanTransport::new(MailboxCan::default(), NoopDelay::new());

        assert_eq!(transport.send(&frame_to(0x10, &[0xF7, 0x07]), 10), Ok(()));
        assert_eq!(
            transport.send(&frame_to(0x01, &[0x30, 0x31]), 1),
            Err(NbTransportError::Displaced(1))
        );
    }

    /// Remote request frame, the only kind [`RemoteFlood`] ever receives
    struct RemoteRequest(Id);

    impl Frame for RemoteRequest {
        fn new(_id: impl Into<Id>, _data: &[u8]) -> Option<Self> {
            None
        }

        fn new_remote(id: impl Into<Id>, _dlc: usize) -> Option<Self> {
            Some(Self(id.into()))
        }

        fn is_extended(&self) -> bool {
            matches!(self.0, Id::Extended(_))
        }

        fn is_remote_frame(&self) -> bool {
            true
        }

        fn id(&self) -> Id {
            self.0
        }

        fn dlc(&self) -> usize {
            0
        }

        fn data(&self) -> &[u8] {
            &[]
        }
    }

    /// Bus that never stops delivering remote frames
    #[derive(Default)]
    struct RemoteFlood {
        polls: u32,
    }

    impl embedded_can::nb::Can for RemoteFlood {
        type Frame = RemoteRequest;
        type Error = ErrorKind;

        fn transmit(&mut self, _: &RemoteRequest) -> nb::Result<Option<RemoteRequest>, ErrorKind> {
            Err(nb::Error::WouldBlock)
        }

        fn receive(&mut self) -> nb::Result<RemoteRequest, ErrorKind> {
            self.polls += 1;
            Ok(RemoteRequest(StandardId::new(0x7FF).unwrap().into()))
        }
    }

    #[test]
    fn skipped_frames_count_against_the_timeout() {
        let mut transport = NbCanTransport::new(RemoteFlood::default(), NoopDelay::new());
        assert_eq!(transport.receive(5), Ok(None));

        let (can, _) = transport.into_inner();
        assert_eq!(can.polls, 6);
    }
}
