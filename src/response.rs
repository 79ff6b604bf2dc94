use core::fmt;

use heapless::Vec;

use crate::{
    codec::{be_i16, be_i32, be_i48, be_u16},
    frame::CanFrame,
    FunctionCode, GoHomeStatus, MotorStatus, MoveStatus, SpeedModeStatus, ZeroStatus,
    ENCODER_TICKS_PER_REVOLUTION, MAX_DATA_LENGTH,
};

/// Bytes of a parameter value that fit between the parameter index and the
/// checksum of a single frame
pub const MAX_PARAMETER_LENGTH: usize = MAX_DATA_LENGTH - 3;

/// A decoded frame sent by a servo
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    /// Encoder value split into full turns (`carry`) and the position within
    /// the current turn (0..=0x3FFF)
    EncoderCarry { carry: i32, value: u16 },
    /// Accumulated encoder value, 0x4000 per turn
    EncoderAddition(i64),
    /// Shaft speed in RPM, negative when turning counter-clockwise
    Speed(i16),
    /// Step pulses received
    Pulses(i32),
    IoStatus(IoStatus),
    /// Raw accumulated encoder reading
    RawEncoder(i64),
    AngleError(AngleError),
    /// Whether the driver is enabled
    EnablePin(bool),
    ZeroStatus(ZeroStatus),
    /// Whether releasing the locked-rotor protection succeeded
    ReleaseProtection(bool),
    /// Whether the locked-rotor protection has tripped
    ProtectionState(bool),
    GoHome(GoHomeStatus),
    /// Value of a system parameter as raw bytes, checksum excluded
    Parameter {
        index: u8,
        #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
        value: Vec<u8, MAX_PARAMETER_LENGTH>,
    },
    MotorStatus(MotorStatus),
    SpeedMode(SpeedModeStatus),
    RelativeMove(MoveStatus),
    AbsoluteMove(MoveStatus),
    AxisMove(MoveStatus),
    /// Acknowledgement of a command that only reports success or failure
    Ack { code: FunctionCode, success: bool },
    /// A frame whose code is not part of the protocol, kept as received
    Unrecognized(
        #[cfg_attr(feature = "defmt", defmt(Debug2Format))] Vec<u8, MAX_DATA_LENGTH>,
    ),
}

/// State of the servo's I/O pins (0x34)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IoStatus(pub u8);

impl IoStatus {
    pub fn in_1(&self) -> bool {
        self.0 & 0x01 != 0
    }

    pub fn in_2(&self) -> bool {
        self.0 & 0x02 != 0
    }

    pub fn out_1(&self) -> bool {
        self.0 & 0x04 != 0
    }

    pub fn out_2(&self) -> bool {
        self.0 & 0x08 != 0
    }
}

/// Difference between target and actual shaft angle (0x39), in encoder ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AngleError {
    pub ticks: i32,
}

impl AngleError {
    pub fn degrees(&self) -> f32 {
        self.ticks as f32 * 360.0 / ENCODER_TICKS_PER_REVOLUTION as f32
    }
}

/// Ways a frame can fail to decode. A shared bus carries partial frames, so
/// these are expected and callers usually skip the frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponseParseError {
    #[error("Tried to parse an empty frame")]
    Empty,
    #[error("Received a response ({0:?}) but less bytes than is required to parse it ({1:?})")]
    NotEnoughBytes(FunctionCode, usize),
    #[error("Received more bytes ({0:?}) than fit into a single frame")]
    TooManyBytes(usize),
}

impl Response {
    pub fn from_frame(frame: &CanFrame) -> Result<Self, ResponseParseError> {
        Self::from_bytes(frame.data())
    }

    /// Decodes the data bytes of a frame, checksum included. Codes outside the
    /// protocol decode to [`Response::Unrecognized`] rather than failing.
    pub fn from_bytes(buffer: &[u8]) -> Result<Self, ResponseParseError> {
        let Some(&first) = buffer.first() else {
            return Err(ResponseParseError::Empty);
        };

        if buffer.len() > MAX_DATA_LENGTH {
            return Err(ResponseParseError::TooManyBytes(buffer.len()));
        }

        let Ok(code) = FunctionCode::try_from(first) else {
            return Ok(Self::Unrecognized(buffer.iter().copied().collect()));
        };

        /* Validate data length */

        if buffer.len() < code.min_response_length() {
            return Err(ResponseParseError::NotEnoughBytes(code, buffer.len()));
        }

        /* Parse data bytes */

        let status = buffer[1];

        Ok(match code {
            FunctionCode::ReadEncoderCarry => Self::EncoderCarry {
                carry: be_i32(buffer, 1),
                value: be_u16(buffer, 5),
            },
            FunctionCode::ReadEncoderAddition => Self::EncoderAddition(be_i48(buffer, 1)),
            FunctionCode::ReadSpeed => Self::Speed(be_i16(buffer, 1)),
            FunctionCode::ReadPulses => Self::Pulses(be_i32(buffer, 1)),
            FunctionCode::ReadIoStatus => Self::IoStatus(IoStatus(status)),
            FunctionCode::ReadRawEncoder => Self::RawEncoder(be_i48(buffer, 1)),
            FunctionCode::ReadAngleError => Self::AngleError(AngleError {
                ticks: be_i32(buffer, 1),
            }),
            FunctionCode::ReadEnablePin => Self::EnablePin(status != 0),
            FunctionCode::ReadZeroStatus => Self::ZeroStatus(status.into()),
            FunctionCode::ReleaseProtection => Self::ReleaseProtection(status != 0),
            FunctionCode::ReadProtectionState => Self::ProtectionState(status != 0),
            FunctionCode::GoHome => Self::GoHome(status.into()),
            FunctionCode::ReadParameter => Self::Parameter {
                index: status,
                value: buffer
                    .get(2..buffer.len() - 1)
                    .unwrap_or_default()
                    .iter()
                    .copied()
                    .collect(),
            },
            FunctionCode::QueryStatus => Self::MotorStatus(status.into()),
            FunctionCode::RunSpeed => Self::SpeedMode(status.into()),
            FunctionCode::MoveRelative => Self::RelativeMove(status.into()),
            FunctionCode::MoveAbsolute => Self::AbsoluteMove(status.into()),
            FunctionCode::MoveAxis => Self::AxisMove(status.into()),
            FunctionCode::RestoreDefaults
            | FunctionCode::Restart
            | FunctionCode::Calibrate
            | FunctionCode::SetWorkMode
            | FunctionCode::SetCurrent
            | FunctionCode::SetMicrostep
            | FunctionCode::SetEnableActive
            | FunctionCode::SetDirection
            | FunctionCode::SetAutoSleep
            | FunctionCode::SetProtection
            | FunctionCode::SetInterpolation
            | FunctionCode::SetCanBitRate
            | FunctionCode::SetCanId
            | FunctionCode::SetCanResponse
            | FunctionCode::SetGroupId
            | FunctionCode::SetKeyLock
            | FunctionCode::SetHoldCurrent
            | FunctionCode::SetPositionErrorProtection
            | FunctionCode::SetHomeParams
            | FunctionCode::SetZeroPoint
            | FunctionCode::SetNoLimitHome
            | FunctionCode::SetZeroMode
            | FunctionCode::SetLimitRemap
            | FunctionCode::EnableMotor
            | FunctionCode::EmergencyStop
            | FunctionCode::SaveSpeedState => Self::Ack {
                code,
                success: status != 0,
            },
        })
    }
}

fn ok_or_fail(success: bool) -> &'static str {
    if success {
        "OK"
    } else {
        "Fail"
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EncoderCarry { carry, value } => write!(f, "EncCarry={carry}, value={value}"),
            Self::EncoderAddition(value) => write!(f, "EncAdd={value}"),
            Self::Speed(rpm) => write!(f, "Speed={rpm} RPM"),
            Self::Pulses(pulses) => write!(f, "Pulses={pulses}"),
            Self::IoStatus(io) => write!(f, "IOstat=0b{:08b}", io.0),
            Self::RawEncoder(value) => write!(f, "RawEnc={value}"),
            Self::AngleError(error) => {
                write!(f, "ErrTicks={} ({:.2}°)", error.ticks, error.degrees())
            }
            Self::EnablePin(enabled) => {
                write!(f, "EN={}", if *enabled { "Enabled" } else { "Disabled" })
            }
            Self::ZeroStatus(status) => write!(f, "ZeroStatus={status}"),
            Self::ReleaseProtection(success) => write!(f, "ReleaseProt={}", ok_or_fail(*success)),
            Self::ProtectionState(tripped) => {
                write!(f, "Protected={}", if *tripped { "Yes" } else { "No" })
            }
            Self::GoHome(status) => write!(f, "GoHome={status}"),
            Self::Parameter { index, value } => {
                write!(f, "SysParam0x{index:02X} =")?;
                value.iter().try_for_each(|byte| write!(f, " {byte:02X}"))
            }
            Self::MotorStatus(status) => write!(f, "Status={status}"),
            Self::SpeedMode(status) => write!(f, "SpeedMode={status}"),
            Self::RelativeMove(status) => write!(f, "PosRel={}", status.relative_name()),
            Self::AbsoluteMove(status) => write!(f, "PosAbs={status}"),
            Self::AxisMove(status) => write!(f, "PosAxis={status}"),
            Self::Ack { code, success } => write!(
                f,
                "{code:?} (0x{:02X}) status={}",
                u8::from(*code),
                ok_or_fail(*success)
            ),
            Self::Unrecognized(bytes) => {
                f.write_str("RAW:")?;
                bytes.iter().try_for_each(|byte| write!(f, " {byte:02X}"))
            }
        }
    }
}
