//! Die-temperature channel from the MCU's internal ADC.
//!
//! The raw conversion is turned into whole degrees C with the factory
//! two-point calibration (readings taken at 30 and 85 degrees against the
//! internal reference):
//!
//! ```text
//! t = (raw - cal30) * (85 - 30) / (cal85 - cal30) + 30
//! ```
//!
//! The ADC itself is behind the tiny [`RawAdc`] seam since it is
//! MCU-specific; any settle/reference-wait belongs to that implementation.

use mote_core::sensors::{Sensor, SensorError, SensorReadings};

const CAL_LOW_C: i32 = 30;
const CAL_SPAN_C: i32 = 55;

/// One-shot raw conversion source. Infallible, matching internal ADCs.
pub trait RawAdc {
    fn sample(&mut self) -> u16;
}

impl<F: FnMut() -> u16> RawAdc for F {
    fn sample(&mut self) -> u16 {
        self()
    }
}

pub struct TempReading {
    pub celsius: i16,
}

impl SensorReadings<1> for TempReading {
    fn to_array(self) -> [i16; 1] {
        [self.celsius]
    }
}

pub struct DieTemp<A> {
    adc: A,
    cal30: i16,
    cal85: i16,
}

impl<A: RawAdc> DieTemp<A> {
    /// `cal30`/`cal85` are the factory calibration conversions at 30 and
    /// 85 degrees C.
    pub fn new(adc: A, cal30: i16, cal85: i16) -> Self {
        Self { adc, cal30, cal85 }
    }
}

impl<A: RawAdc> Sensor<1> for DieTemp<A> {
    type Readings = TempReading;

    fn init(&mut self) -> bool {
        // A blank or corrupt calibration TLV would divide by zero (or flip
        // the slope) on every read.
        if self.cal85 <= self.cal30 {
            log::error!(
                "[temp] degenerate calibration: cal30={} cal85={}",
                self.cal30,
                self.cal85
            );
            return false;
        }
        true
    }

    fn read(&mut self) -> Result<TempReading, SensorError> {
        let raw = self.adc.sample();
        let celsius = (i32::from(raw) - i32::from(self.cal30)) * CAL_SPAN_C
            / (i32::from(self.cal85) - i32::from(self.cal30))
            + CAL_LOW_C;
        log::debug!("[temp] sample={raw} => T={celsius}");
        Ok(TempReading {
            celsius: celsius as i16,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibration_endpoints_map_exactly() {
        let mut t = DieTemp::new(|| 2000u16, 1000, 2000);
        assert!(t.init());
        assert_eq!(t.read().unwrap().celsius, 85);

        let mut t = DieTemp::new(|| 1000u16, 1000, 2000);
        assert_eq!(t.read().unwrap().celsius, 30);
    }

    #[test]
    fn test_interpolates_between_calibration_points() {
        // Halfway between the calibration conversions.
        let mut t = DieTemp::new(|| 1500u16, 1000, 2000);
        assert_eq!(t.read().unwrap().celsius, 57);
    }

    #[test]
    fn test_extrapolates_below_thirty() {
        let mut t = DieTemp::new(|| 0u16, 1000, 2000);
        // (0 - 1000) * 55 / 1000 + 30
        assert_eq!(t.read().unwrap().celsius, -25);
    }

    #[test]
    fn test_degenerate_calibration_fails_init() {
        let mut t = DieTemp::new(|| 0u16, 2000, 2000);
        assert!(!t.init());
        let mut t = DieTemp::new(|| 0u16, 2000, 1000);
        assert!(!t.init());
    }
}
