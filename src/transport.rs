//! The I2C transport shared by everything that talks to the accelerometer.
//!
//! A [`BusSlot`] holds the single bus handle of the process. The bus is opened
//! lazily on the first [`BusSlot::get_bus`] call; selecting another bus with
//! [`BusSlot::set_bus`] after that point is recorded but does not touch the
//! handle that already exists.

use core::ops::RangeInclusive;

use embedded_hal::i2c::I2c;
use log::{info, warn};

/// Bus selection used when the handle is first created.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BusConfig {
    pub bus_no: u8,
    pub baud_rate: u32,
}

impl BusConfig {
    pub const DEFAULT_BAUD_RATE: u32 = 400_000;

    pub const fn new(bus_no: u8) -> Self {
        Self {
            bus_no,
            baud_rate: Self::DEFAULT_BAUD_RATE,
        }
    }

    pub const fn with_baud_rate(self, baud_rate: u32) -> Self {
        Self {
            bus_no: self.bus_no,
            baud_rate,
        }
    }
}

/// An opened bus together with the configuration it was opened with.
pub struct BusHandle<B> {
    config: BusConfig,
    bus: B,
}

impl<B> BusHandle<B> {
    /// Identity of the handle: bus number and baud rate at creation.
    pub fn config(&self) -> BusConfig {
        self.config
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}

/// Lazily initialized, single-owner slot for the bus handle.
pub struct BusSlot<B> {
    selected: BusConfig,
    handle: Option<BusHandle<B>>,
}

impl<B> BusSlot<B> {
    pub const fn new(config: BusConfig) -> Self {
        Self {
            selected: config,
            handle: None,
        }
    }

    /// Select the bus to open. Only effective before the first [`Self::get_bus`].
    pub fn set_bus(&mut self, bus_no: u8) {
        if let Some(handle) = &self.handle {
            warn!(
                "I2C bus {} selected after bus {} was opened; keeping bus {}",
                bus_no, handle.config.bus_no, handle.config.bus_no
            );
        }
        self.selected.bus_no = bus_no;
    }

    /// The configuration the next (or only) open uses.
    pub fn selected(&self) -> BusConfig {
        self.selected
    }

    pub fn is_initialized(&self) -> bool {
        self.handle.is_some()
    }

    /// Return the bus handle, opening the bus with `open` on first use.
    ///
    /// A failing `open` leaves the slot empty and its error is returned as is.
    pub fn get_bus<E>(
        &mut self,
        open: impl FnOnce(BusConfig) -> Result<B, E>,
    ) -> Result<&mut BusHandle<B>, E> {
        let handle = match self.handle.take() {
            Some(handle) => handle,
            None => {
                let config = self.selected;
                let bus = open(config)?;
                info!(
                    "Opened I2C bus {} at {} baud",
                    config.bus_no, config.baud_rate
                );
                BusHandle { config, bus }
            }
        };
        Ok(self.handle.insert(handle))
    }
}

/// Addresses a bus scan probes; the rest are reserved by the I2C standard.
pub const SCAN_RANGE: RangeInclusive<u8> = 0x08..=0x77;

/// Responding addresses, in ascending order.
pub type ScanResult = heapless::Vec<u8, 128>;

/// Address-level probing on top of a blocking I2C bus.
pub trait BusProbe {
    /// True when a device acknowledges `address`.
    fn is_ready(&mut self, address: u8) -> bool;

    /// All addresses in [`SCAN_RANGE`] that acknowledge.
    fn scan(&mut self) -> ScanResult;
}

impl<I: I2c> BusProbe for I {
    fn is_ready(&mut self, address: u8) -> bool {
        self.write(address, &[]).is_ok()
    }

    fn scan(&mut self) -> ScanResult {
        let mut found = ScanResult::new();
        for address in SCAN_RANGE {
            if self.is_ready(address) {
                // capacity covers the whole scan range
                let _ = found.push(address);
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};

    const NACK: ErrorKind = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address);

    #[test]
    fn opens_once_and_reuses_handle() {
        let mut slot = BusSlot::new(BusConfig::new(1));
        let mut opens = 0;
        for _ in 0..3 {
            let handle = slot
                .get_bus(|config| {
                    opens += 1;
                    Ok::<_, ()>(config.bus_no)
                })
                .unwrap();
            assert_eq!(*handle.bus(), 1);
        }
        assert_eq!(opens, 1);
        assert!(slot.is_initialized());
    }

    #[test]
    fn set_bus_before_first_use_wins() {
        let mut slot = BusSlot::new(BusConfig::new(1));
        slot.set_bus(2);
        let handle = slot.get_bus(|config| Ok::<_, ()>(config.bus_no)).unwrap();
        assert_eq!(handle.config(), BusConfig::new(2));
        assert_eq!(*handle.bus(), 2);
    }

    #[test]
    fn set_bus_after_first_use_keeps_handle() {
        let mut slot = BusSlot::new(BusConfig::new(1));
        slot.get_bus(|config| Ok::<_, ()>(config.bus_no)).unwrap();
        slot.set_bus(3);
        assert_eq!(slot.selected().bus_no, 3);
        let handle = slot
            .get_bus(|_| -> Result<u8, ()> { panic!("bus opened twice") })
            .unwrap();
        assert_eq!(handle.config().bus_no, 1);
        assert_eq!(*handle.bus(), 1);
    }

    #[test]
    fn baud_rate_is_part_of_handle_identity() {
        let config = BusConfig::new(0).with_baud_rate(100_000);
        let mut slot = BusSlot::new(config);
        slot.set_bus(1);
        let handle = slot
            .get_bus(|config| Ok::<_, ()>(config.baud_rate))
            .unwrap();
        assert_eq!(
            handle.config(),
            BusConfig {
                bus_no: 1,
                baud_rate: 100_000
            }
        );
        assert_eq!(*handle.bus(), 100_000);
    }

    #[test]
    fn failed_open_propagates_and_leaves_slot_empty() {
        let mut slot: BusSlot<u8> = BusSlot::new(BusConfig::new(0));
        assert_eq!(slot.get_bus(|_| Err("no peripheral")).err(), Some("no peripheral"));
        assert!(!slot.is_initialized());
        assert!(slot.get_bus(|_| Ok::<_, ()>(7)).is_ok());
    }

    #[test]
    fn is_ready_reflects_address_ack() {
        let expectations = [
            I2cTrans::write(0x68, vec![]),
            I2cTrans::write(0x68, vec![]).with_error(NACK),
        ];
        let mut i2c = I2cMock::new(&expectations);
        assert!(i2c.is_ready(0x68));
        assert!(!i2c.is_ready(0x68));
        i2c.done();
    }

    #[test]
    fn scan_lists_acknowledging_addresses() {
        let present = [0x1E, 0x68];
        let expectations: Vec<_> = SCAN_RANGE
            .map(|address| {
                let expected = I2cTrans::write(address, vec![]);
                if present.contains(&address) {
                    expected
                } else {
                    expected.with_error(NACK)
                }
            })
            .collect();
        let mut i2c = I2cMock::new(&expectations);
        assert_eq!(BusProbe::scan(&mut i2c).as_slice(), &present);
        i2c.done();
    }
}
