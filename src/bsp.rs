//! Board Support Package for the esp32c3-rust-devkit board with an external
//! MPU-9225 accelerometer.
//!
//! <https://github.com/esp-rs/esp-rust-board>
//!
//! ### I2C Peripherals
//!
//! | Peripheral    | Part number | Address |
//! | ------------- | ----------- | ------- |
//! | Accelerometer | MPU-9225    | 0x68    |
//!
//! #### I2C Bus Connection
//!
//! The chip has a single I2C controller, bus 0.
//!
//! | Signal | GPIO   |
//! | ------ | ------ |
//! | SDA    | GPIO10 |
//! | SCL    | GPIO8  |

use core::cell::RefCell;

use embassy_embedded_hal::shared_bus::{self, blocking::i2c::I2cDevice};
use embassy_sync::blocking_mutex::{NoopMutex, raw::NoopRawMutex};
use embassy_time::Instant;
use esp_hal::{
    clock::CpuClock,
    gpio::GpioPin,
    i2c::master::{Config, I2c},
    peripherals::I2C0,
    time::RateExtU32,
    timer::systimer::SystemTimer,
};
use log::{error, info};
use static_cell::StaticCell;

use crate::{
    AppError, Result,
    sampler::Clock,
    transport::{BusConfig, BusSlot},
};

pub type I2cType<'a> = I2c<'a, esp_hal::Blocking>;
pub type I2cBus<'a> = NoopMutex<RefCell<I2cType<'a>>>;
pub type I2cBusDevice<'a> = shared_bus::blocking::i2c::I2cDevice<'a, NoopRawMutex, I2cType<'a>>;

/// The only I2C controller on the ESP32-C3.
pub const DEFAULT_BUS: u8 = 0;

/// Peripherals the I2C bus is built from, held until the bus is first opened.
struct I2cParts {
    i2c0: I2C0,
    scl: GpioPin<8>,
    sda: GpioPin<10>,
}

/// Microsecond clock backed by the embassy time driver.
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_us(&mut self) -> u32 {
        // wraps like a hardware tick counter
        Instant::now().as_micros() as u32
    }
}

/// Board-specific peripherals.
pub struct Board {
    /// I2c Bus, opened on first use and shared for the rest of the program
    bus: BusSlot<&'static I2cBus<'static>>,
    i2c_parts: Option<I2cParts>,
}

impl Board {
    /// Initialize the board. The I2C bus is opened later with `bus`,
    /// unless [`Self::set_bus`] picks another one first.
    pub fn init(bus: BusConfig) -> Self {
        let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
        let p = esp_hal::init(config);
        esp_alloc::heap_allocator!(32 * 1024);

        info!("{} initialized!", esp_hal::chip!());

        let timer0 = SystemTimer::new(p.SYSTIMER);
        esp_hal_embassy::init(timer0.alarm0);
        info!("Initialized Embassy Executor");

        Self {
            bus: BusSlot::new(bus),
            i2c_parts: Some(I2cParts {
                i2c0: p.I2C0,
                scl: p.GPIO8,
                sda: p.GPIO10,
            }),
        }
    }

    /// Select the I2C bus. Has no effect once [`Self::get_bus`] has been called.
    pub fn set_bus(&mut self, bus_no: u8) {
        self.bus.set_bus(bus_no);
    }

    /// The shared I2C bus, opened on the first call.
    pub fn get_bus(&mut self) -> Result<&'static I2cBus<'static>> {
        let parts = &mut self.i2c_parts;
        let handle = self.bus.get_bus(|config| open_bus(config, parts))?;
        Ok(*handle.bus())
    }

    /// A device handle on the shared bus for the accelerometer driver.
    pub fn accelerometer_bus(&mut self) -> Result<I2cBusDevice<'static>> {
        Ok(I2cDevice::new(self.get_bus()?))
    }
}

fn open_bus(config: BusConfig, parts: &mut Option<I2cParts>) -> Result<&'static I2cBus<'static>> {
    if config.bus_no != DEFAULT_BUS {
        return Err(AppError::UnknownBus(config.bus_no));
    }
    let I2cParts { i2c0, scl, sda } = parts.take().ok_or(AppError::BusInit)?;
    static BUS: StaticCell<I2cBus<'static>> = StaticCell::new();
    let i2c = I2c::new(i2c0, Config::default().with_frequency(config.baud_rate.Hz()))
        .map_err(|e| {
            error!("Failed to initialize I2C0: {:?}", e);
            AppError::BusInit
        })?
        .with_scl(scl)
        .with_sda(sda);
    Ok(BUS.init(NoopMutex::new(RefCell::new(i2c))))
}
