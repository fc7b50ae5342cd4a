//! Sensor drivers for the mote-rs node.
//!
//! Each driver speaks blocking `embedded-hal` 1.0 I²C (plus `DelayNs` for
//! its fixed settle times) and implements the [`mote_core::sensors::Sensor`]
//! contract: `init` identifies and configures the chip, reporting plain
//! success or failure; `read` returns one native-resolution measurement.
//! The hub in `mote-core` decides what a failed driver degrades to.
//!
//! Drivers are feature-gated per sensor so a build can drop the chips a
//! board variant does not carry.

#![no_std]

#[cfg(feature = "sensor-mag")]
pub mod hmc5883;
#[cfg(feature = "sensor-imu")]
pub mod lsm6;
#[cfg(feature = "sensor-temp")]
pub mod temp;

#[cfg(test)]
pub(crate) mod testbus;
