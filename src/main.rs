#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_time::Delay;
use esp_backtrace as _;
use log::info;

use mpu9225_stream::{
    DeviceConfig, Mpu9225, PollLimit,
    bsp::{Board, DEFAULT_BUS, EmbassyClock},
    transport::BusConfig,
};

/// Full-scale range in g: 2, 4, 8 or 16.
const FULL_SCALE_G: u8 = 2;

/// I2C clock for the accelerometer bus.
const I2C_BAUD_RATE: u32 = 400_000;

#[esp_hal_embassy::main]
async fn main(_spawner: Spawner) -> ! {
    esp_println::logger::init_logger_from_env();
    let config = DeviceConfig::with_range_g(FULL_SCALE_G).expect("invalid full-scale range");

    let mut board = Board::init(BusConfig::new(DEFAULT_BUS).with_baud_rate(I2C_BAUD_RATE));
    board.set_bus(DEFAULT_BUS);
    let i2c = board.accelerometer_bus().expect("failed to open I2C bus");

    let mut mpu = Mpu9225::new(i2c, Delay, config);
    mpu.init(PollLimit::Forever)
        .expect("failed to configure accelerometer");
    info!("Streaming accelerometer samples");

    // One line per reading, as fast as the bus allows
    let mut clock = EmbassyClock;
    loop {
        let sample = mpu
            .read_sample(&mut clock)
            .expect("accelerometer read failed");
        esp_println::println!("{}", sample);
    }
}
