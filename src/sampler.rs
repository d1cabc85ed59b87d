//! Timestamped sampling of the three acceleration axes.
//!
//! [`Mpu9225::sample_batch`] spins (it never sleeps) until at least the
//! requested period has passed since the previous sample, so batches can be
//! chained by feeding the returned timestamp into the next call.

use alloc::vec::Vec;
use core::fmt::{self, Write as _};

use embedded_hal::{delay::DelayNs, i2c::I2c};
use log::trace;

use crate::{Result, device::Mpu9225};

/// Free-running microsecond counter that wraps around at `u32::MAX`.
pub trait Clock {
    fn now_us(&mut self) -> u32;
}

/// Microseconds from `since` to `now`, modulo the counter range.
pub fn elapsed_us(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

/// Longest record is `"4294967295 -131072 -131072 -131072"`.
pub const LINE_CAPACITY: usize = 48;

/// One reading: capture time plus the scaled x, y and z axes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RawSample {
    pub timestamp_us: u32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl RawSample {
    /// The flattened `(timestamp, x, y, z)` quadruple.
    pub fn quadruple(&self) -> [i64; 4] {
        [
            self.timestamp_us.into(),
            self.x.into(),
            self.y.into(),
            self.z.into(),
        ]
    }

    /// The output record `"<timestamp_us> <x> <y> <z>"`.
    pub fn line(&self) -> heapless::String<LINE_CAPACITY> {
        let mut line = heapless::String::new();
        // LINE_CAPACITY covers the widest record
        let _ = write!(line, "{self}");
        line
    }
}

impl fmt::Display for RawSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.timestamp_us, self.x, self.y, self.z)
    }
}

/// Samples flattened into consecutive `(timestamp, x, y, z)` quadruples.
/// Only ever appended to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SampleBuffer {
    values: Vec<i64>,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(samples: usize) -> Self {
        Self {
            values: Vec::with_capacity(samples.saturating_mul(4)),
        }
    }

    pub fn push(&mut self, sample: RawSample) {
        self.values.extend_from_slice(&sample.quadruple());
    }

    /// Number of samples, not of values.
    pub fn len(&self) -> usize {
        self.values.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<i64> {
        self.values
    }

    pub fn samples(&self) -> impl Iterator<Item = RawSample> + '_ {
        self.values.chunks_exact(4).map(|q| RawSample {
            timestamp_us: q[0] as u32,
            x: q[1] as i32,
            y: q[2] as i32,
            z: q[3] as i32,
        })
    }

    pub fn last_timestamp(&self) -> Option<u32> {
        self.samples().last().map(|s| s.timestamp_us)
    }
}

impl<I, D> Mpu9225<I, D>
where
    I: I2c,
    D: DelayNs,
{
    /// Read all three axes stamped with the current time, without waiting.
    pub fn read_sample(&mut self, clock: &mut impl Clock) -> Result<RawSample> {
        let timestamp_us = clock.now_us();
        let [x, y, z] = self.accel()?;
        Ok(RawSample {
            timestamp_us,
            x,
            y,
            z,
        })
    }

    /// Collect `count` samples spaced at least `min_period_us` apart.
    ///
    /// The first sample waits for `min_period_us` after `prev_timestamp_us`.
    /// Returns the samples and the timestamp of the last one (or
    /// `prev_timestamp_us` when `count` is zero).
    pub fn sample_batch(
        &mut self,
        clock: &mut impl Clock,
        count: usize,
        min_period_us: u32,
        prev_timestamp_us: u32,
    ) -> Result<(SampleBuffer, u32)> {
        let mut buf = SampleBuffer::with_capacity(count);
        let mut prev = prev_timestamp_us;
        while buf.len() < count {
            let now = clock.now_us();
            if elapsed_us(now, prev) < min_period_us {
                core::hint::spin_loop();
                continue;
            }
            prev = now;
            let [x, y, z] = self.accel()?;
            trace!("{} {} {} {}", now, x, y, z);
            buf.push(RawSample {
                timestamp_us: now,
                x,
                y,
                z,
            });
        }
        Ok((buf, prev))
    }
}
