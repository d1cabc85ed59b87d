//! MPU-9225 accelerometer driver.
//!
//! The driver owns its bus device for its whole life, so one logical register
//! transaction (address write followed by a receive) can never interleave with
//! another caller's traffic.

use embedded_hal::{
    delay::DelayNs,
    i2c::{Error as _, ErrorKind, I2c},
};
use log::{debug, info, warn};

use crate::{
    AppError, Result,
    codec::scale_axis,
    config::DeviceConfig,
    registers::{
        ACCEL_FS_SEL_MASK, AXES, CLKSEL_AUTO, INT_STATUS_RAW_DATA_RDY, PWR_MGMT_1_CLKSEL_MASK,
        PWR_MGMT_1_SLEEP_MASK, Register,
    },
    transport::BusProbe,
};

/// Where the driver is in the bring-up sequence.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InitState {
    /// Awaiting the device address in a bus scan
    Scanning,
    /// Awaiting an acknowledge from the device address
    Probing,
    /// Device found, configuration writes pending or in progress
    Configuring,
    /// Configured and awake
    Ready,
}

/// How long device discovery may go on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PollLimit {
    /// Wait for the hardware to appear, however long it takes
    Forever,
    /// Give up after this many polls (at least one poll is always made)
    Attempts(u32),
}

/// Which shape [`Mpu9225::read_double`] returns.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Layout {
    /// `high * 256 + low`
    Combined,
    /// `[high, low]`
    Pair,
}

/// Result of reading a high/low register pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DoubleRead {
    Combined(u16),
    Pair([u8; 2]),
}

impl DoubleRead {
    /// Big-endian 16-bit value, whatever the shape.
    pub fn value(self) -> u16 {
        match self {
            Self::Combined(value) => value,
            Self::Pair(bytes) => u16::from_be_bytes(bytes),
        }
    }
}

pub struct Mpu9225<I, D> {
    i2c: I,
    delay: D,
    config: DeviceConfig,
    state: InitState,
}

impl<I, D> Mpu9225<I, D>
where
    I: I2c,
    D: DelayNs,
{
    /// Wrap a bus device. No traffic happens until [`Self::init`] or a register access.
    pub fn new(i2c: I, delay: D, config: DeviceConfig) -> Self {
        let state = if config.scan {
            InitState::Scanning
        } else {
            InitState::Probing
        };
        Self {
            i2c,
            delay,
            config,
            state,
        }
    }

    /// Returns the bus device and delay, consuming this driver.
    pub fn release(self) -> (I, D) {
        (self.i2c, self.delay)
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn state(&self) -> InitState {
        self.state
    }

    fn address(&self) -> u8 {
        self.config.address.into()
    }

    /// Write raw bytes to the device, retrying with exponential backoff.
    pub fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let retry = self.config.retry;
        let address = self.address();
        let mut kind = ErrorKind::Other;
        for attempt in 0..retry.max_attempts() {
            match self.i2c.write(address, bytes) {
                Ok(()) => return Ok(()),
                Err(error) => {
                    kind = error.kind();
                    let backoff = retry.delay_us(attempt);
                    warn!(
                        "Send to {:#04x} failed ({}), attempt {}/{}, backing off {}us",
                        address,
                        kind,
                        attempt + 1,
                        retry.max_attempts(),
                        backoff
                    );
                    self.delay.delay_us(backoff);
                }
            }
        }
        Err(AppError::TransportExhausted {
            attempts: retry.max_attempts(),
            kind,
        })
    }

    /// Write a single register.
    pub fn write(&mut self, reg: Register, value: u8) -> Result<()> {
        self.send(&[reg.into(), value])
    }

    /// Replace the bits of `reg` selected by `bitmask` with those of `value`.
    ///
    /// With `read_after` the register is read back and returned.
    pub fn write_masked(
        &mut self,
        reg: Register,
        value: u8,
        bitmask: u8,
        read_after: bool,
    ) -> Result<Option<u8>> {
        let old = self.read(reg)?;
        let new = (old & !bitmask) | (value & bitmask);
        debug!("{:?}: {:#010b} -> {:#010b}", reg, old, new);
        self.write(reg, new)?;
        if read_after {
            self.read(reg).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Read one register as an unsigned byte.
    pub fn read(&mut self, reg: Register) -> Result<u8> {
        self.read_raw(reg).map(|[value]| value)
    }

    /// Read one register as its raw single-byte payload.
    pub fn read_raw(&mut self, reg: Register) -> Result<[u8; 1]> {
        self.send(&[reg.into()])?;
        let mut buf = [0; 1];
        let address = self.address();
        self.i2c
            .read(address, &mut buf)
            .map_err(|e| AppError::Receive(e.kind()))?;
        Ok(buf)
    }

    /// Read a high/low register pair, high first.
    pub fn read_double(
        &mut self,
        high: Register,
        low: Register,
        layout: Layout,
    ) -> Result<DoubleRead> {
        let h = self.read(high)?;
        let l = self.read(low)?;
        Ok(match layout {
            Layout::Combined => DoubleRead::Combined(u16::from(h) * 256 + u16::from(l)),
            Layout::Pair => DoubleRead::Pair([h, l]),
        })
    }

    fn axis(&mut self, (high, low): (Register, Register)) -> Result<i32> {
        let raw = self.read_double(high, low, Layout::Combined)?.value();
        Ok(scale_axis(raw, self.config.full_scale))
    }

    /// X acceleration scaled by `full_scale / 4`; see [`crate::codec`].
    pub fn accel_x(&mut self) -> Result<i32> {
        self.axis(AXES[0])
    }

    pub fn accel_y(&mut self) -> Result<i32> {
        self.axis(AXES[1])
    }

    pub fn accel_z(&mut self) -> Result<i32> {
        self.axis(AXES[2])
    }

    /// All three axes, x then y then z.
    pub fn accel(&mut self) -> Result<[i32; 3]> {
        Ok([self.accel_x()?, self.accel_y()?, self.accel_z()?])
    }

    pub fn who_am_i(&mut self) -> Result<u8> {
        self.read(Register::WhoAmI)
    }

    pub fn set_sample_rate_divider(&mut self, divider: u8) -> Result<()> {
        self.write(Register::SmplrtDiv, divider)
    }

    /// True when fresh samples are waiting in the output registers.
    pub fn data_ready(&mut self) -> Result<bool> {
        Ok(self.read(Register::IntStatus)? & INT_STATUS_RAW_DATA_RDY != 0)
    }

    /// One discovery pass: optional scan, then a readiness probe.
    ///
    /// Returns [`InitState::Configuring`] once the device acknowledges,
    /// otherwise the state it is still waiting in.
    pub fn poll_device(&mut self) -> InitState {
        let address = self.address();
        if self.config.scan {
            self.state = InitState::Scanning;
            let found = self.i2c.scan();
            info!("I2C device addresses: {:?}", found.as_slice());
            if !found.contains(&address) {
                return self.state;
            }
        }
        self.state = InitState::Probing;
        if self.i2c.is_ready(address) {
            info!("Accelerometer ready at {:#04x}", address);
            self.state = InitState::Configuring;
        } else {
            info!("Accelerometer at {:#04x} is not ready", address);
        }
        self.state
    }

    /// Poll until the device responds, sleeping the poll interval in between.
    pub fn wait_for_device(&mut self, limit: PollLimit) -> Result<()> {
        let mut polls: u32 = 0;
        loop {
            polls = polls.saturating_add(1);
            if self.poll_device() == InitState::Configuring {
                return Ok(());
            }
            if let PollLimit::Attempts(max) = limit {
                if polls >= max {
                    return Err(AppError::DeviceNotFound {
                        address: self.address(),
                        polls,
                    });
                }
            }
            self.delay.delay_ms(self.config.poll_interval_ms);
        }
    }

    /// Select the clock, set the full-scale range and wake the device.
    pub fn configure(&mut self) -> Result<()> {
        self.state = InitState::Configuring;
        let full_scale = self.config.full_scale;

        self.write_masked(
            Register::PwrMgmt1,
            CLKSEL_AUTO,
            PWR_MGMT_1_CLKSEL_MASK,
            false,
        )?;
        debug!("Clock source set");

        self.write_masked(
            Register::AccelConfig,
            full_scale.register_bits(),
            ACCEL_FS_SEL_MASK,
            false,
        )?;
        debug!("Full-scale range set to {}g", full_scale.g());

        self.write_masked(Register::PwrMgmt1, 0, PWR_MGMT_1_SLEEP_MASK, false)?;
        info!("Accelerometer configured for {}g and awake", full_scale.g());

        self.state = InitState::Ready;
        Ok(())
    }

    /// Find the device and configure it.
    pub fn init(&mut self, limit: PollLimit) -> Result<()> {
        self.wait_for_device(limit)?;
        self.configure()
    }
}
