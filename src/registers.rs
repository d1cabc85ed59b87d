//! MPU-9225 accelerometer register map.
//!
//! Only the registers this crate touches are listed. Axis outputs are stored
//! big-endian across a high/low register pair; reading the high byte first
//! latches the low byte until it has been read.

#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Register {
    /// Sample rate divider
    SmplrtDiv = 0x19,
    /// Full-scale select lives in bits 4:3
    AccelConfig = 0x1C,
    /// Low-pass filter and rate configuration
    AccelConfig2 = 0x1D,
    /// Interrupt status, bit 0 is raw data ready
    IntStatus = 0x3A,
    AccelX_H = 0x3B,
    AccelX_L = 0x3C,
    AccelY_H = 0x3D,
    AccelY_L = 0x3E,
    AccelZ_H = 0x3F,
    AccelZ_L = 0x40,
    /// Power management: sleep bit and clock select
    PwrMgmt1 = 0x6B,
    /// Identity register
    WhoAmI = 0x75,
}

impl From<Register> for u8 {
    fn from(reg: Register) -> Self {
        reg as u8
    }
}

/// `PWR_MGMT_1` clock-select bits.
pub const PWR_MGMT_1_CLKSEL_MASK: u8 = 0b0000_0111;
/// `PWR_MGMT_1` sleep bit.
pub const PWR_MGMT_1_SLEEP_MASK: u8 = 0b0100_0000;
/// `ACCEL_CONFIG` full-scale select bits.
pub const ACCEL_FS_SEL_MASK: u8 = 0b0001_1000;
/// `INT_STATUS` raw data ready bit.
pub const INT_STATUS_RAW_DATA_RDY: u8 = 0b0000_0001;

/// Auto-select the best available clock source (PLL when ready).
pub const CLKSEL_AUTO: u8 = 1;

/// High/low register pairs of the three acceleration axes, in x, y, z order.
pub const AXES: [(Register, Register); 3] = [
    (Register::AccelX_H, Register::AccelX_L),
    (Register::AccelY_H, Register::AccelY_L),
    (Register::AccelZ_H, Register::AccelZ_L),
];
