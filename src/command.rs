use embedded_can::Id;
use num_enum::IntoPrimitive;

use crate::{
    codec::{pack_direction_speed, u24_to_be_bytes},
    frame::CanFrame,
    FunctionCode,
};

/// Every operation the servo accepts over CAN. Multi-byte fields are sent most
/// significant byte first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /* Status reads */
    ReadEncoderCarry,
    ReadEncoderAddition,
    /// Read the shaft speed in RPM
    ReadSpeed,
    /// Read the number of step pulses received
    ReadPulses,
    ReadIoStatus,
    ReadRawEncoder,
    /// Read the difference between target and actual shaft angle
    ReadAngleError,
    ReadEnablePin,
    /// Read the progress of setting the zero point after power-on
    ReadZeroStatus,
    /// Release the locked-rotor protection state
    ReleaseProtection,
    ReadProtectionState,
    /// Read the value of a system parameter, indexed by the function code that
    /// sets it
    ReadParameter(u8),

    /* Maintenance */
    RestoreDefaults,
    Restart,
    /// Calibrate the encoder (the motor must be unloaded)
    Calibrate,

    /* System configuration */
    SetWorkMode(WorkMode),
    /// Working current in milliamps
    SetCurrent(u16),
    /// Microsteps per full step, 0 is interpreted as 256 by the firmware
    SetMicrostep(u8),
    SetEnableActive(EnableLevel),
    /// Direction in which the motor turns for positive moves
    SetDirection(Direction),
    /// Turn the display off automatically after a while
    SetAutoSleep(bool),
    /// Locked-rotor protection
    SetProtection(bool),
    /// Microstep interpolation
    SetInterpolation(bool),
    SetCanBitRate(CanBitRate),
    /// Moves the servo to a new bus identifier (0x001..=0x7FF)
    SetCanId(u16),
    /// Whether the servo responds to commands at all, and whether it sends
    /// completion frames for moves on its own
    SetCanResponse { respond: bool, active: bool },
    /// Additional identifier the servo also listens on
    SetGroupId(u16),
    SetKeyLock(bool),
    /// Holding current in 10% steps of the working current (0 = 10%)
    SetHoldCurrent(u8),
    /// Enable-pin-triggered homing and position error protection. The servo
    /// faults when the angle error exceeds `error` for `time` × 15 ms.
    SetPositionErrorProtection {
        en_trigger: bool,
        protect: bool,
        time: u16,
        error: u16,
    },

    /* Homing and zero */
    SetHomeParams {
        trigger: HomeTrigger,
        direction: Direction,
        /// RPM
        speed: u16,
        /// Stop at the end-limit switch during normal moves
        end_limit: bool,
        mode: HomeMode,
    },
    GoHome,
    /// Make the current position the zero point
    SetZeroPoint,
    /// Sensorless homing parameters: the angle to back off after hitting the
    /// hard stop and the current used to detect it (milliamps)
    SetNoLimitHome { return_angle: u32, current: u16 },
    /// Power-on return-to-zero behaviour
    SetZeroMode {
        mode: ZeroMode,
        set_zero: bool,
        /// 0 (fastest) to 4 (slowest)
        speed: u8,
        direction: Direction,
    },
    /// Remap the limit switch inputs onto the En and Dir pins
    SetLimitRemap(bool),

    /* Motion */
    QueryStatus,
    EnableMotor(bool),
    EmergencyStop,
    /// Run at constant speed. Only the low 12 bits of `speed` (RPM) are sent.
    RunSpeed {
        direction: Direction,
        speed: u16,
        acceleration: u8,
    },
    /// Leave speed mode. An acceleration of 0 stops immediately, anything
    /// else decelerates.
    StopSpeed { acceleration: u8 },
    /// Save or clear the speed mode parameters used on power-on
    SaveSpeedState(SpeedStateAction),
    /// Move by a pulse count. Only the low 12 bits of `speed` and the low 24
    /// bits of `pulses` are sent.
    MoveRelative {
        direction: Direction,
        speed: u16,
        acceleration: u8,
        pulses: u32,
    },
    StopRelativeMove { acceleration: u8 },
    /// Move to an absolute position in pulses, sent as a 24-bit two's
    /// complement value
    MoveAbsolute {
        axis: i32,
        speed: u16,
        acceleration: u8,
    },
    StopAbsoluteMove { acceleration: u8 },
    /// Move by an encoder count relative to the current axis, sent as a 24-bit
    /// two's complement value
    MoveAxis {
        relative: i32,
        speed: u16,
        acceleration: u8,
    },
    StopAxisMove { acceleration: u8 },
}

/// Control loop and input the servo uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum WorkMode {
    /// Pulse interface, open loop
    PulseOpen = 0,
    /// Pulse interface, closed loop
    PulseClose = 1,
    /// Pulse interface, field oriented control
    PulseFoc = 2,
    /// Serial/CAN interface, open loop
    BusOpen = 3,
    /// Serial/CAN interface, closed loop
    BusClose = 4,
    /// Serial/CAN interface, field oriented control
    #[default]
    BusFoc = 5,
}

/// Level of the En pin that enables the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum EnableLevel {
    #[default]
    Low = 0,
    High = 1,
    /// Ignore the pin, the driver is always enabled
    Always = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Direction {
    #[default]
    Clockwise = 0,
    CounterClockwise = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum CanBitRate {
    Rate125Kbit = 0,
    Rate250Kbit = 1,
    #[default]
    Rate500Kbit = 2,
    Rate1Mbit = 3,
}

/// Active level of the home switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum HomeTrigger {
    #[default]
    Low = 0,
    High = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum HomeMode {
    /// Home against the limit switch
    #[default]
    LimitSwitch = 0,
    /// Home against a hard stop, see [`Command::SetNoLimitHome`]
    NoLimit = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ZeroMode {
    #[default]
    Disabled = 0,
    /// Return to zero turning in the configured direction
    Direction = 1,
    /// Return to zero along the shortest path
    Nearest = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SpeedStateAction {
    Save = 0xC8,
    Clear = 0xCA,
}

impl Direction {
    fn is_counter_clockwise(self) -> bool {
        self == Self::CounterClockwise
    }
}

impl Command {
    pub fn code(&self) -> FunctionCode {
        match self {
            Self::ReadEncoderCarry => FunctionCode::ReadEncoderCarry,
            Self::ReadEncoderAddition => FunctionCode::ReadEncoderAddition,
            Self::ReadSpeed => FunctionCode::ReadSpeed,
            Self::ReadPulses => FunctionCode::ReadPulses,
            Self::ReadIoStatus => FunctionCode::ReadIoStatus,
            Self::ReadRawEncoder => FunctionCode::ReadRawEncoder,
            Self::ReadAngleError => FunctionCode::ReadAngleError,
            Self::ReadEnablePin => FunctionCode::ReadEnablePin,
            Self::ReadZeroStatus => FunctionCode::ReadZeroStatus,
            Self::ReleaseProtection => FunctionCode::ReleaseProtection,
            Self::ReadProtectionState => FunctionCode::ReadProtectionState,
            Self::ReadParameter(_) => FunctionCode::ReadParameter,
            Self::RestoreDefaults => FunctionCode::RestoreDefaults,
            Self::Restart => FunctionCode::Restart,
            Self::Calibrate => FunctionCode::Calibrate,
            Self::SetWorkMode(_) => FunctionCode::SetWorkMode,
            Self::SetCurrent(_) => FunctionCode::SetCurrent,
            Self::SetMicrostep(_) => FunctionCode::SetMicrostep,
            Self::SetEnableActive(_) => FunctionCode::SetEnableActive,
            Self::SetDirection(_) => FunctionCode::SetDirection,
            Self::SetAutoSleep(_) => FunctionCode::SetAutoSleep,
            Self::SetProtection(_) => FunctionCode::SetProtection,
            Self::SetInterpolation(_) => FunctionCode::SetInterpolation,
            Self::SetCanBitRate(_) => FunctionCode::SetCanBitRate,
            Self::SetCanId(_) => FunctionCode::SetCanId,
            Self::SetCanResponse { .. } => FunctionCode::SetCanResponse,
            Self::SetGroupId(_) => FunctionCode::SetGroupId,
            Self::SetKeyLock(_) => FunctionCode::SetKeyLock,
            Self::SetHoldCurrent(_) => FunctionCode::SetHoldCurrent,
            Self::SetPositionErrorProtection { .. } => FunctionCode::SetPositionErrorProtection,
            Self::SetHomeParams { .. } => FunctionCode::SetHomeParams,
            Self::GoHome => FunctionCode::GoHome,
            Self::SetZeroPoint => FunctionCode::SetZeroPoint,
            Self::SetNoLimitHome { .. } => FunctionCode::SetNoLimitHome,
            Self::SetZeroMode { .. } => FunctionCode::SetZeroMode,
            Self::SetLimitRemap(_) => FunctionCode::SetLimitRemap,
            Self::QueryStatus => FunctionCode::QueryStatus,
            Self::EnableMotor(_) => FunctionCode::EnableMotor,
            Self::EmergencyStop => FunctionCode::EmergencyStop,
            Self::RunSpeed { .. } | Self::StopSpeed { .. } => FunctionCode::RunSpeed,
            Self::SaveSpeedState(_) => FunctionCode::SaveSpeedState,
            Self::MoveRelative { .. } | Self::StopRelativeMove { .. } => {
                FunctionCode::MoveRelative
            }
            Self::MoveAbsolute { .. } | Self::StopAbsoluteMove { .. } => {
                FunctionCode::MoveAbsolute
            }
            Self::MoveAxis { .. } | Self::StopAxisMove { .. } => FunctionCode::MoveAxis,
        }
    }

    /// Lays the command out as a frame addressed to `id`, checksum appended
    pub fn encode(&self, id: impl Into<Id>) -> CanFrame {
        let id = id.into();
        let code: u8 = self.code().into();

        match *self {
            Self::ReadEncoderCarry
            | Self::ReadEncoderAddition
            | Self::ReadSpeed
            | Self::ReadPulses
            | Self::ReadIoStatus
            | Self::ReadRawEncoder
            | Self::ReadAngleError
            | Self::ReadEnablePin
            | Self::ReadZeroStatus
            | Self::ReleaseProtection
            | Self::ReadProtectionState
            | Self::RestoreDefaults
            | Self::Restart
            | Self::GoHome
            | Self::SetZeroPoint
            | Self::QueryStatus
            | Self::EmergencyStop => CanFrame::with_checksum(id, [code]),

            Self::ReadParameter(index) => CanFrame::with_checksum(id, [code, index]),
            Self::Calibrate => CanFrame::with_checksum(id, [code, 0x00]),

            Self::SetWorkMode(mode) => CanFrame::with_checksum(id, [code, mode.into()]),
            Self::SetMicrostep(microsteps) => CanFrame::with_checksum(id, [code, microsteps]),
            Self::SetEnableActive(level) => CanFrame::with_checksum(id, [code, level.into()]),
            Self::SetDirection(direction) => {
                CanFrame::with_checksum(id, [code, direction.into()])
            }
            Self::SetCanBitRate(rate) => CanFrame::with_checksum(id, [code, rate.into()]),
            Self::SetHoldCurrent(step) => CanFrame::with_checksum(id, [code, step]),
            Self::SaveSpeedState(action) => CanFrame::with_checksum(id, [code, action.into()]),

            Self::SetAutoSleep(enabled)
            | Self::SetProtection(enabled)
            | Self::SetInterpolation(enabled)
            | Self::SetKeyLock(enabled)
            | Self::SetLimitRemap(enabled)
            | Self::EnableMotor(enabled) => CanFrame::with_checksum(id, [code, enabled.into()]),

            Self::SetCurrent(value) | Self::SetCanId(value) | Self::SetGroupId(value) => {
                let [high, low] = value.to_be_bytes();
                CanFrame::with_checksum(id, [code, high, low])
            }

            Self::SetCanResponse { respond, active } => {
                CanFrame::with_checksum(id, [code, respond.into(), active.into()])
            }

            Self::SetPositionErrorProtection {
                en_trigger,
                protect,
                time,
                error,
            } => {
                let flags = (u8::from(protect) << 1) | u8::from(en_trigger);
                let [time_high, time_low] = time.to_be_bytes();
                let [error_high, error_low] = error.to_be_bytes();

                CanFrame::with_checksum(
                    id,
                    [code, flags, time_high, time_low, error_high, error_low],
                )
            }

            Self::SetHomeParams {
                trigger,
                direction,
                speed,
                end_limit,
                mode,
            } => {
                let [speed_high, speed_low] = speed.to_be_bytes();

                CanFrame::with_checksum(
                    id,
                    [
                        code,
                        trigger.into(),
                        direction.into(),
                        speed_high,
                        speed_low,
                        end_limit.into(),
                        mode.into(),
                    ],
                )
            }

            Self::SetNoLimitHome {
                return_angle,
                current,
            } => {
                let [r3, r2, r1, r0] = return_angle.to_be_bytes();
                let [current_high, current_low] = current.to_be_bytes();

                CanFrame::with_checksum(id, [code, r3, r2, r1, r0, current_high, current_low])
            }

            Self::SetZeroMode {
                mode,
                set_zero,
                speed,
                direction,
            } => CanFrame::with_checksum(
                id,
                [code, mode.into(), set_zero.into(), speed, direction.into()],
            ),

            Self::RunSpeed {
                direction,
                speed,
                acceleration,
            } => {
                let [packed, speed_low] =
                    pack_direction_speed(direction.is_counter_clockwise(), speed);

                CanFrame::with_checksum(id, [code, packed, speed_low, acceleration])
            }
            Self::StopSpeed { acceleration } => {
                CanFrame::with_checksum(id, [code, 0x00, 0x00, acceleration])
            }

            Self::MoveRelative {
                direction,
                speed,
                acceleration,
                pulses,
            } => {
                let [packed, speed_low] =
                    pack_direction_speed(direction.is_counter_clockwise(), speed);
                let [p2, p1, p0] = u24_to_be_bytes(pulses);

                CanFrame::with_checksum(id, [code, packed, speed_low, acceleration, p2, p1, p0])
            }

            Self::MoveAbsolute {
                axis: target,
                speed,
                acceleration,
            }
            | Self::MoveAxis {
                relative: target,
                speed,
                acceleration,
            } => {
                let [speed_high, speed_low] = speed.to_be_bytes();
                let [t2, t1, t0] = u24_to_be_bytes(target as u32);

                CanFrame::with_checksum(
                    id,
                    [code, speed_high, speed_low, acceleration, t2, t1, t0],
                )
            }

            Self::StopRelativeMove { acceleration }
            | Self::StopAbsoluteMove { acceleration }
            | Self::StopAxisMove { acceleration } => {
                CanFrame::with_checksum(id, [code, 0x00, 0x00, acceleration, 0x00, 0x00, 0x00])
            }
        }
    }
}
