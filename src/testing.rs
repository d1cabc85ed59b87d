//! Host-side fakes for the bus, delay and clock.

use embedded_hal::{
    delay::DelayNs,
    i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation},
};

use crate::sampler::Clock;

/// A register file answering at one address the way the accelerometer does:
/// a write sets the register pointer (and stores any following bytes), a read
/// returns bytes from the pointer onwards.
pub struct FakeMpu {
    pub address: u8,
    pub regs: [u8; 256],
    /// Probes of `address` that are NACKed before the device shows up
    pub absent_probes: u32,
    /// Register writes that are NACKed before writes go through
    pub failing_writes: u32,
    /// Every register write that went through
    pub writes: Vec<Vec<u8>>,
    pointer: u8,
}

impl FakeMpu {
    pub fn new(address: u8) -> Self {
        let mut regs = [0; 256];
        regs[0x75] = 0x71;
        Self {
            address,
            regs,
            absent_probes: 0,
            failing_writes: 0,
            writes: Vec::new(),
            pointer: 0,
        }
    }

    pub fn set_axes(&mut self, axes: [u16; 3]) {
        for (i, value) in axes.into_iter().enumerate() {
            let [high, low] = value.to_be_bytes();
            self.regs[0x3B + 2 * i] = high;
            self.regs[0x3C + 2 * i] = low;
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), ErrorKind> {
        let Some((&reg, data)) = bytes.split_first() else {
            if self.absent_probes > 0 {
                self.absent_probes -= 1;
                return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
            }
            return Ok(());
        };
        if self.failing_writes > 0 {
            self.failing_writes -= 1;
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
        }
        self.writes.push(bytes.to_vec());
        self.pointer = reg;
        for &byte in data {
            self.regs[usize::from(self.pointer)] = byte;
            self.pointer = self.pointer.wrapping_add(1);
        }
        self.pointer = reg;
        Ok(())
    }

    fn read_bytes(&mut self, buf: &mut [u8]) {
        for byte in buf {
            *byte = self.regs[usize::from(self.pointer)];
            self.pointer = self.pointer.wrapping_add(1);
        }
    }
}

impl ErrorType for FakeMpu {
    type Error = ErrorKind;
}

impl I2c for FakeMpu {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != self.address {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        for operation in operations {
            match operation {
                Operation::Write(bytes) => self.write_bytes(bytes)?,
                Operation::Read(buf) => self.read_bytes(buf),
            }
        }
        Ok(())
    }
}

/// Records every requested delay in microseconds without sleeping.
#[derive(Default)]
pub struct RecordingDelay {
    pub delays_us: Vec<u32>,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delays_us.push(ns / 1000);
    }

    fn delay_us(&mut self, us: u32) {
        self.delays_us.push(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays_us.push(ms.saturating_mul(1000));
    }
}

/// A microsecond counter that advances by `step` every time it is read.
pub struct StepClock {
    pub now: u32,
    pub step: u32,
    pub reads: u32,
}

impl StepClock {
    pub fn new(start: u32, step: u32) -> Self {
        Self {
            now: start,
            step,
            reads: 0,
        }
    }
}

impl Clock for StepClock {
    fn now_us(&mut self) -> u32 {
        let now = self.now;
        self.now = self.now.wrapping_add(self.step);
        self.reads += 1;
        now
    }
}
