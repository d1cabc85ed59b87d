//! Tunable accelerometer configuration.
//!
//! Every value is validated when it is built, so an invalid configuration is
//! rejected before the first byte goes out on the bus.

use crate::{AppError, registers::ACCEL_FS_SEL_MASK};

/// Accelerometer full-scale range in g.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FullScale {
    #[default]
    G2,
    G4,
    G8,
    G16,
}

impl FullScale {
    /// The range in g, as used by the scaling arithmetic.
    pub const fn g(self) -> u8 {
        match self {
            Self::G2 => 2,
            Self::G4 => 4,
            Self::G8 => 8,
            Self::G16 => 16,
        }
    }

    /// The 2-bit `ACCEL_FS_SEL` field value.
    pub const fn field(self) -> u8 {
        match self {
            Self::G2 => 0,
            Self::G4 => 1,
            Self::G8 => 2,
            Self::G16 => 3,
        }
    }

    /// The field value shifted into its place in `ACCEL_CONFIG`.
    pub const fn register_bits(self) -> u8 {
        (self.field() << 3) & ACCEL_FS_SEL_MASK
    }
}

impl TryFrom<u8> for FullScale {
    type Error = AppError;

    fn try_from(g: u8) -> Result<Self, Self::Error> {
        match g {
            2 => Ok(Self::G2),
            4 => Ok(Self::G4),
            8 => Ok(Self::G8),
            16 => Ok(Self::G16),
            other => Err(AppError::InvalidFullScale(other)),
        }
    }
}

/// 7-bit I2C address of the accelerometer, selected by the AD0 pin.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Address(pub u8);

impl Address {
    pub const PRIMARY: Self = Self(0x68);
    pub const SECONDARY: Self = Self(0x69);
}

impl Default for Address {
    fn default() -> Self {
        Self::PRIMARY
    }
}

impl From<Address> for u8 {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl From<u8> for Address {
    fn from(addr: u8) -> Self {
        Self(addr)
    }
}

/// Bounded exponential backoff for bus writes.
///
/// The n-th failed attempt (counting from 0) waits `base_delay_us * 2^n`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u8,
    base_delay_us: u32,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u8 = 10;
    pub const DEFAULT_BASE_DELAY_US: u32 = 500;

    pub fn new(max_attempts: u8, base_delay_us: u32) -> Result<Self, AppError> {
        if max_attempts == 0 {
            return Err(AppError::InvalidRetryPolicy);
        }
        Ok(Self {
            max_attempts,
            base_delay_us,
        })
    }

    pub fn max_attempts(&self) -> u8 {
        self.max_attempts
    }

    pub fn base_delay_us(&self) -> u32 {
        self.base_delay_us
    }

    /// Backoff after failed attempt `attempt`, saturating instead of overflowing.
    pub fn delay_us(&self, attempt: u8) -> u32 {
        let factor = 1u32.checked_shl(attempt.into()).unwrap_or(u32::MAX);
        self.base_delay_us.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            base_delay_us: Self::DEFAULT_BASE_DELAY_US,
        }
    }
}

/// Everything the driver needs to find and configure the device.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DeviceConfig {
    pub full_scale: FullScale,
    pub address: Address,
    pub retry: RetryPolicy,
    /// Wait between two device-ready polls
    pub poll_interval_ms: u32,
    /// Scan the bus before probing the device address
    pub scan: bool,
}

impl DeviceConfig {
    pub const DEFAULT_POLL_INTERVAL_MS: u32 = 1000;

    /// Build a configuration from a full-scale range given in g.
    pub fn with_range_g(g: u8) -> Result<Self, AppError> {
        Ok(Self::default().with_full_scale(FullScale::try_from(g)?))
    }

    pub fn with_full_scale(self, full_scale: FullScale) -> Self {
        Self { full_scale, ..self }
    }

    pub fn with_address(self, address: Address) -> Self {
        Self { address, ..self }
    }

    pub fn with_retry(self, retry: RetryPolicy) -> Self {
        Self { retry, ..self }
    }

    pub fn with_poll_interval_ms(self, poll_interval_ms: u32) -> Self {
        Self {
            poll_interval_ms,
            ..self
        }
    }

    pub fn with_scan(self, scan: bool) -> Self {
        Self { scan, ..self }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            full_scale: FullScale::default(),
            address: Address::default(),
            retry: RetryPolicy::default(),
            poll_interval_ms: Self::DEFAULT_POLL_INTERVAL_MS,
            scan: true,
        }
    }
}
