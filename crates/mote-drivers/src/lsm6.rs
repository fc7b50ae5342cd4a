//! LSM6-family 6-axis IMU (3-axis accelerometer + 3-axis gyroscope).
//!
//! Full-range 16-bit two's-complement output per axis, little-endian, gyro
//! registers first. One burst read grabs all six axes.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use mote_core::sensors::{Sensor, SensorError, SensorReadings};

pub const ADDRESS: u8 = 0x6B;

const REG_WHO_AM_I: u8 = 0x0F;
const WHO_AM_I: u8 = 0x69;

const REG_CTRL1_XL: u8 = 0x10;
const REG_CTRL2_G: u8 = 0x11;
/// Accelerometer 104 Hz, +-2 g.
const CTRL1_104HZ_2G: u8 = 0x40;
/// Gyroscope 104 Hz, 245 dps.
const CTRL2_104HZ_245DPS: u8 = 0x40;

/// First of twelve contiguous output registers: gyro X/Y/Z then accel
/// X/Y/Z, low byte first.
const REG_OUTX_L_G: u8 = 0x22;

/// Time for the first sample to land after enabling both units.
const SETTLE_INIT_US: u32 = 20_000;

pub struct ImuReadings {
    pub ax: i16,
    pub ay: i16,
    pub az: i16,
    pub gx: i16,
    pub gy: i16,
    pub gz: i16,
}

impl SensorReadings<6> for ImuReadings {
    fn to_array(self) -> [i16; 6] {
        [self.ax, self.ay, self.az, self.gx, self.gy, self.gz]
    }
}

pub struct Lsm6<I2C, D> {
    i2c: I2C,
    delay: D,
}

impl<I2C: I2c, D: DelayNs> Lsm6<I2C, D> {
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self { i2c, delay }
    }
}

impl<I2C: I2c, D: DelayNs> Sensor<6> for Lsm6<I2C, D> {
    type Readings = ImuReadings;

    fn init(&mut self) -> bool {
        let mut id = [0u8; 1];
        if self
            .i2c
            .write_read(ADDRESS, &[REG_WHO_AM_I], &mut id)
            .is_err()
        {
            log::error!("[imu] no response at 0x{ADDRESS:02x}");
            return false;
        }
        if id[0] != WHO_AM_I {
            log::error!("[imu] invalid id: 0x{:02x} (expected 0x{WHO_AM_I:02x})", id[0]);
            return false;
        }
        log::debug!("[imu] id: 0x{:02x}", id[0]);

        let configured = self
            .i2c
            .write(ADDRESS, &[REG_CTRL1_XL, CTRL1_104HZ_2G])
            .and_then(|()| self.i2c.write(ADDRESS, &[REG_CTRL2_G, CTRL2_104HZ_245DPS]));
        if configured.is_err() {
            log::error!("[imu] configuration write failed");
            return false;
        }

        self.delay.delay_us(SETTLE_INIT_US);
        true
    }

    fn read(&mut self) -> Result<ImuReadings, SensorError> {
        let mut raw = [0u8; 12];
        self.i2c
            .write_read(ADDRESS, &[REG_OUTX_L_G], &mut raw)
            .map_err(|_| SensorError::Bus { sensor: "LSM6" })?;

        let word = |i: usize| i16::from_le_bytes([raw[i], raw[i + 1]]);
        Ok(ImuReadings {
            gx: word(0),
            gy: word(2),
            gz: word(4),
            ax: word(6),
            ay: word(8),
            az: word(10),
        })
    }
}
