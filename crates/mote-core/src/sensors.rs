//! Sensor contract and the adapter that normalizes heterogeneous drivers
//! into one fixed-shape sample per tick.
//!
//! Drivers live in `mote-drivers` (or the simulator); this module only
//! defines the seam. A driver that fails identification at `init` is
//! permanently disabled for the run, as is one whose bus read later fails:
//! its channels are zero-filled on every subsequent tick rather than
//! surfacing an error. The cascade and encoder therefore always receive a
//! well-shaped input.

use core::marker::PhantomData;

use thiserror_no_std::Error;

use crate::config::{ACCEL_X, CHANNEL_COUNT, MAG_X, TEMPERATURE};
use crate::sample::Sample;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("{sensor} identification mismatch")]
    BadIdentity { sensor: &'static str },
    #[error("{sensor} bus transaction failed")]
    Bus { sensor: &'static str },
}

/// Trait for sensor reading data structures.
/// Provides compile-time guarantees about the number of values produced.
pub trait SensorReadings<const COUNT: usize> {
    /// Convert the readings into a fixed-size array of native-resolution
    /// channel values.
    fn to_array(self) -> [i16; COUNT];
}

/// Contract every physical-sensor driver satisfies.
///
/// `init` performs chip identification and configuration and reports
/// whether the sensor is usable; `read` blocks for the sensor's fixed
/// settle time and returns one measurement at native resolution.
pub trait Sensor<const COUNT: usize> {
    type Readings: SensorReadings<COUNT>;

    fn init(&mut self) -> bool;

    fn read(&mut self) -> Result<Self::Readings, SensorError>;
}

// Type-level index marker tying a driver to its channel range.
pub struct Idx<const N: usize>;

/// A driver bound to its slice of the sample vector, plus its enablement
/// state. The START/COUNT parameters are the only mapping from sensors to
/// channel indices, so a driver cannot scribble over a neighbor's channels.
pub struct IndexedSensor<S, const START: usize, const COUNT: usize>
where
    S: Sensor<COUNT>,
{
    sensor: S,
    enabled: bool,
    _marker: PhantomData<Idx<START>>,
}

impl<S, const START: usize, const COUNT: usize> IndexedSensor<S, START, COUNT>
where
    S: Sensor<COUNT>,
{
    pub const fn new(sensor: S) -> Self {
        Self {
            sensor,
            enabled: false,
            _marker: PhantomData,
        }
    }

    /// Run chip identification/configuration once. A failure permanently
    /// disables this sensor's channels for the run.
    pub fn init(&mut self, name: &'static str) {
        self.enabled = self.sensor.init();
        if !self.enabled {
            log::warn!("{name} unavailable; channels {START}..{} zeroed", START + COUNT);
        }
    }

    /// Read into the sample at the declared channel range. Disabled or
    /// failing sensors leave their channels untouched (zero).
    pub fn read_into(&mut self, values: &mut [i16; CHANNEL_COUNT]) {
        if !self.enabled {
            return;
        }
        match self.sensor.read() {
            Ok(readings) => {
                values[START..START + COUNT].copy_from_slice(&readings.to_array());
            }
            Err(e) => {
                // Protocol failures are absorbed as permanent disablement,
                // not retried.
                log::error!("sensor read failed, disabling: {e:?}");
                self.enabled = false;
            }
        }
    }

    pub const fn enabled(&self) -> bool {
        self.enabled
    }
}

/// Anything the acquisition stage can pull one sample per tick from.
pub trait SampleSource {
    /// Produce this tick's sample. Never fails; unavailable channels are
    /// zero.
    fn read_sample(&mut self) -> Sample;
}

/// The concrete fan-out adapter: one temperature driver, one magnetometer,
/// one six-axis IMU, each optional in effect (a failed `init` degrades the
/// channels to zero while the shape stays constant).
pub struct SensorHub<T, M, I>
where
    T: Sensor<1>,
    M: Sensor<3>,
    I: Sensor<6>,
{
    temp: IndexedSensor<T, TEMPERATURE, 1>,
    mag: IndexedSensor<M, MAG_X, 3>,
    imu: IndexedSensor<I, ACCEL_X, 6>,
}

impl<T, M, I> SensorHub<T, M, I>
where
    T: Sensor<1>,
    M: Sensor<3>,
    I: Sensor<6>,
{
    pub const fn new(temp: T, mag: M, imu: I) -> Self {
        Self {
            temp: IndexedSensor::new(temp),
            mag: IndexedSensor::new(mag),
            imu: IndexedSensor::new(imu),
        }
    }

    /// Bring up every driver once per power-on.
    pub fn init(&mut self) {
        self.temp.init("temperature sensor");
        self.mag.init("magnetometer");
        self.imu.init("imu");
    }

    pub const fn any_enabled(&self) -> bool {
        self.temp.enabled() || self.mag.enabled() || self.imu.enabled()
    }
}

impl<T, M, I> SampleSource for SensorHub<T, M, I>
where
    T: Sensor<1>,
    M: Sensor<3>,
    I: Sensor<6>,
{
    fn read_sample(&mut self) -> Sample {
        let mut sample = Sample::zeroed();
        self.temp.read_into(&mut sample.channels);
        self.mag.read_into(&mut sample.channels);
        self.imu.read_into(&mut sample.channels);
        sample
    }
}
