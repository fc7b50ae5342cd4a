//! HMC5883-family 3-axis magnetometer.
//!
//! 12-bit signed output per axis (-2048..=2047); the chip writes the
//! reserved code -4096 on any axis whose ADC over/underflowed. Data
//! registers are ordered X, Z, Y and big-endian, a classic trap.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use mote_core::sensors::{Sensor, SensorError, SensorReadings};

pub const ADDRESS: u8 = 0x1E;

const REG_CONFIG_A: u8 = 0x00;
const REG_CONFIG_B: u8 = 0x01;
const REG_MODE: u8 = 0x02;
const REG_DATA: u8 = 0x03;
const REG_ID_A: u8 = 0x0A;

/// Contents of identification registers A..C on a genuine chip.
const CHIP_ID: [u8; 3] = *b"H43";

/// 8 samples averaged, 15 Hz data output, normal measurement mode.
const CONFIG_A_DEFAULT: u8 = 0x70;
const MODE_CONTINUOUS: u8 = 0x00;

/// Reserved output on ADC overflow; matches
/// [`mote_core::config::MAG_OVERFLOW`].
pub const OVERFLOW: i16 = -4096;

/// Settle after configuration before the first measurement is valid.
const SETTLE_INIT_US: u32 = 6_000;
/// Worst-case measurement period at the configured output rate.
const SETTLE_READ_US: u32 = 67_000;

/// Field range selection (configuration register B).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Gain {
    Gauss0_88 = 0x00,
    Gauss1_3 = 0x20,
    Gauss1_9 = 0x40,
    Gauss2_5 = 0x60,
    Gauss4_0 = 0x80,
    Gauss4_7 = 0xA0,
    Gauss5_6 = 0xC0,
    Gauss8_1 = 0xE0,
}

#[derive(Debug)]
pub struct MagReadings {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl SensorReadings<3> for MagReadings {
    fn to_array(self) -> [i16; 3] {
        [self.x, self.y, self.z]
    }
}

pub struct Hmc5883<I2C, D> {
    i2c: I2C,
    delay: D,
    gain: Gain,
}

impl<I2C: I2c, D: DelayNs> Hmc5883<I2C, D> {
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self::with_gain(i2c, delay, Gain::Gauss8_1)
    }

    pub fn with_gain(i2c: I2C, delay: D, gain: Gain) -> Self {
        Self { i2c, delay, gain }
    }
}

impl<I2C: I2c, D: DelayNs> Sensor<3> for Hmc5883<I2C, D> {
    type Readings = MagReadings;

    fn init(&mut self) -> bool {
        let mut id = [0u8; 3];
        if self.i2c.write_read(ADDRESS, &[REG_ID_A], &mut id).is_err() {
            log::error!("[mag] no response at 0x{ADDRESS:02x}");
            return false;
        }
        if id != CHIP_ID {
            log::error!("[mag] invalid chip ID {id:02x?}");
            return false;
        }
        log::debug!(
            "[mag] chip ID: {}{}{}",
            id[0] as char,
            id[1] as char,
            id[2] as char
        );

        let configured = self
            .i2c
            .write(ADDRESS, &[REG_CONFIG_A, CONFIG_A_DEFAULT])
            .and_then(|()| self.i2c.write(ADDRESS, &[REG_CONFIG_B, self.gain as u8]))
            .and_then(|()| self.i2c.write(ADDRESS, &[REG_MODE, MODE_CONTINUOUS]));
        if configured.is_err() {
            log::error!("[mag] configuration write failed");
            return false;
        }

        self.delay.delay_us(SETTLE_INIT_US);
        true
    }

    fn read(&mut self) -> Result<MagReadings, SensorError> {
        let mut raw = [0u8; 6];
        self.i2c
            .write_read(ADDRESS, &[REG_DATA], &mut raw)
            .map_err(|_| SensorError::Bus { sensor: "HMC5883" })?;

        // Output register order is X, Z, Y, each big-endian.
        let x = i16::from_be_bytes([raw[0], raw[1]]);
        let z = i16::from_be_bytes([raw[2], raw[3]]);
        let y = i16::from_be_bytes([raw[4], raw[5]]);
        log::debug!("[mag] sample x {x} y {y} z {z}");

        self.delay.delay_us(SETTLE_READ_US);
        Ok(MagReadings { x, y, z })
    }
}
