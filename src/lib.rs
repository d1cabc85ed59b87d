#![cfg_attr(not(test), no_std)]

extern crate alloc;

use embedded_hal::i2c::ErrorKind;
use thiserror::Error;

#[cfg(feature = "esp32c3")]
pub mod bsp;
pub mod codec;
pub mod config;
pub mod device;
pub mod registers;
pub mod sampler;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{Address, DeviceConfig, FullScale, RetryPolicy};
pub use device::{InitState, Mpu9225, PollLimit};
pub use sampler::{Clock, RawSample, SampleBuffer};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AppError {
    #[error("Failed to send to the accelerometer after {attempts} attempts: {kind}")]
    TransportExhausted { attempts: u8, kind: ErrorKind },
    #[error("Failed to receive from the accelerometer: {0}")]
    Receive(ErrorKind),
    #[error("Full-scale range {0}g must be one of 2, 4, 8 or 16")]
    InvalidFullScale(u8),
    #[error("Retry policy must allow at least one attempt")]
    InvalidRetryPolicy,
    #[error("No device became ready at address {address} after {polls} polls")]
    DeviceNotFound { address: u8, polls: u32 },
    #[error("I2C bus {0} does not exist on this board")]
    UnknownBus(u8),
    #[error("Failed to initialize the I2C peripheral")]
    BusInit,
}

pub type Result<T, E = AppError> = core::result::Result<T, E>;
