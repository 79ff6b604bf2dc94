//! Command encoding and response decoding for MKS closed-loop stepper servos
//! driven over CAN.

#![no_std]

#[macro_use]
mod fmt;

mod bus;
mod checksum;
mod code;
mod codec;
mod command;
mod frame;
mod response;
mod status;
mod transport;

pub const MAX_DATA_LENGTH: usize = 8;

/// Encoder resolution; one tick is 360 / 51200 degrees
pub const ENCODER_TICKS_PER_REVOLUTION: u32 = 51200;

pub const DEFAULT_SEND_TIMEOUT_MS: u32 = 100;

pub use bus::*;
pub use checksum::checksum;
pub use code::*;
pub use codec::sign_extend;
pub use command::*;
pub use frame::*;
pub use response::*;
pub use status::*;
pub use transport::*;

pub use embedded_can::{ExtendedId, Id, StandardId};
