use num_enum::{IntoPrimitive, TryFromPrimitive};

/// The first data byte of every frame. A servo answers a command with a frame
/// carrying the same code, so one table covers both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FunctionCode {
    /* Status reads */
    ReadParameter = 0x00,
    ReadEncoderCarry = 0x30,
    ReadEncoderAddition = 0x31,
    ReadSpeed = 0x32,
    ReadPulses = 0x33,
    ReadIoStatus = 0x34,
    ReadRawEncoder = 0x35,
    ReadAngleError = 0x39,
    ReadEnablePin = 0x3A,
    ReadZeroStatus = 0x3B,
    ReleaseProtection = 0x3D,
    ReadProtectionState = 0x3E,

    /* Maintenance */
    RestoreDefaults = 0x3F,
    Restart = 0x41,
    Calibrate = 0x80,

    /* System configuration */
    SetWorkMode = 0x82,
    SetCurrent = 0x83,
    SetMicrostep = 0x84,
    SetEnableActive = 0x85,
    SetDirection = 0x86,
    SetAutoSleep = 0x87,
    SetProtection = 0x88,
    SetInterpolation = 0x89,
    SetCanBitRate = 0x8A,
    SetCanId = 0x8B,
    SetCanResponse = 0x8C,
    SetGroupId = 0x8D,
    SetKeyLock = 0x8F,
    SetHoldCurrent = 0x9B,
    SetPositionErrorProtection = 0x9D,

    /* Homing and zero */
    SetHomeParams = 0x90,
    GoHome = 0x91,
    SetZeroPoint = 0x92,
    SetNoLimitHome = 0x94,
    SetZeroMode = 0x9A,
    SetLimitRemap = 0x9E,

    /* Motion */
    QueryStatus = 0xF1,
    EnableMotor = 0xF3,
    MoveAxis = 0xF4,
    RunSpeed = 0xF6,
    EmergencyStop = 0xF7,
    MoveRelative = 0xFD,
    MoveAbsolute = 0xFE,
    SaveSpeedState = 0xFF,
}

impl FunctionCode {
    /// Smallest response frame (code and checksum included) that carries every
    /// field decoded for this code
    pub const fn min_response_length(&self) -> usize {
        match self {
            Self::ReadEncoderCarry => 1 + 4 + 2 + 1,
            Self::ReadEncoderAddition => 1 + 6 + 1,
            Self::ReadSpeed => 1 + 2 + 1,
            Self::ReadPulses => 1 + 4 + 1,
            Self::ReadRawEncoder => 1 + 6 + 1,
            Self::ReadAngleError => 1 + 4 + 1,
            Self::ReadParameter
            | Self::ReadIoStatus
            | Self::ReadEnablePin
            | Self::ReadZeroStatus
            | Self::ReleaseProtection
            | Self::ReadProtectionState
            | Self::RestoreDefaults
            | Self::Restart
            | Self::Calibrate
            | Self::SetWorkMode
            | Self::SetCurrent
            | Self::SetMicrostep
            | Self::SetEnableActive
            | Self::SetDirection
            | Self::SetAutoSleep
            | Self::SetProtection
            | Self::SetInterpolation
            | Self::SetCanBitRate
            | Self::SetCanId
            | Self::SetCanResponse
            | Self::SetGroupId
            | Self::SetKeyLock
            | Self::SetHoldCurrent
            | Self::SetPositionErrorProtection
            | Self::SetHomeParams
            | Self::GoHome
            | Self::SetZeroPoint
            | Self::SetNoLimitHome
            | Self::SetZeroMode
            | Self::SetLimitRemap
            | Self::QueryStatus
            | Self::EnableMotor
            | Self::MoveAxis
            | Self::RunSpeed
            | Self::EmergencyStop
            | Self::MoveRelative
            | Self::MoveAbsolute
            | Self::SaveSpeedState => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FunctionCode;

    #[test]
    fn codes_round_trip_through_bytes() {
        let mut known = 0;

        for byte in 0..=u8::MAX {
            if let Ok(code) = FunctionCode::try_from(byte) {
                assert_eq!(u8::from(code), byte);
                known += 1;
            }
        }

        assert_eq!(known, 44);
    }

    #[test]
    fn unassigned_codes() {
        for byte in [0x01, 0x36, 0x40, 0x50, 0x81, 0x8E, 0xF0, 0xF5] {
            assert!(FunctionCode::try_from(byte).is_err());
        }
    }

    #[test]
    fn response_lengths() {
        assert_eq!(FunctionCode::ReadEncoderCarry.min_response_length(), 8);
        assert_eq!(FunctionCode::ReadEncoderAddition.min_response_length(), 8);
        assert_eq!(FunctionCode::ReadSpeed.min_response_length(), 4);
        assert_eq!(FunctionCode::ReadPulses.min_response_length(), 6);
        assert_eq!(FunctionCode::ReadAngleError.min_response_length(), 6);
        assert_eq!(FunctionCode::MoveRelative.min_response_length(), 2);
    }
}
