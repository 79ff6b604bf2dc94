//! Status bytes reported by the servo. Each status maps a short run of values
//! starting at 0 to names; any other value decodes to `Unknown`.

use core::fmt;

use num_enum::{FromPrimitive, IntoPrimitive};

macro_rules! status_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$variant_meta:meta])* $variant:ident = $value:literal => $label:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        #[repr(u8)]
        pub enum $name {
            $($(#[$variant_meta])* $variant = $value,)+
            /// A value the servo firmware is not documented to send
            #[num_enum(catch_all)]
            Unknown(u8),
        }

        impl $name {
            /// Names of the known values, indexed by their raw value
            pub const NAMES: &'static [&'static str] = &[$($label),+];

            pub const fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                    Self::Unknown(_) => "Unknown",
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

status_enum! {
    /// Progress of setting the zero point (0x3B)
    pub enum ZeroStatus {
        Going = 0 => "Going",
        Success = 1 => "Success",
        Fail = 2 => "Fail",
    }
}

status_enum! {
    /// Progress of a homing run (0x91)
    pub enum GoHomeStatus {
        Fail = 0 => "Fail",
        Started = 1 => "Start",
        Success = 2 => "Success",
    }
}

status_enum! {
    /// Motor state returned by a status query (0xF1)
    pub enum MotorStatus {
        Fail = 0 => "Fail",
        Stopped = 1 => "Stop",
        Accelerating = 2 => "SpeedUp",
        Decelerating = 3 => "SpeedDown",
        FullSpeed = 4 => "Full",
        Homing = 5 => "Homing",
        Calibrating = 6 => "Calibrating",
    }
}

status_enum! {
    /// Outcome of a speed mode command (0xF6)
    pub enum SpeedModeStatus {
        Fail = 0 => "Fail",
        Running = 1 => "Running",
        /// A stop was requested and the motor is decelerating
        Stopping = 2 => "StopStart",
        Stopped = 3 => "StopOK",
    }
}

status_enum! {
    /// Outcome of a position move (0xFD, 0xFE and 0xF4)
    pub enum MoveStatus {
        Fail = 0 => "Fail",
        Started = 1 => "Start",
        Complete = 2 => "Complete",
        /// The move ended on an end-stop or limit switch
        EndLimit = 3 => "End-limit",
    }
}

impl MoveStatus {
    /// Names reported for a relative move (0xFD), which the firmware words
    /// differently from absolute and axis moves
    pub const RELATIVE_NAMES: &'static [&'static str] =
        &["Run fail", "Run starting", "Run complete", "End-stop"];

    pub const fn relative_name(&self) -> &'static str {
        match self {
            Self::Fail => "Run fail",
            Self::Started => "Run starting",
            Self::Complete => "Run complete",
            Self::EndLimit => "End-stop",
            Self::Unknown(_) => "Unknown",
        }
    }
}
