//! Saturating, order-preserving quantization of channel values into their
//! packed wire widths.
//!
//! Each channel downsamples by an arithmetic right shift (native width minus
//! packed width, minus any documented headroom), then clamps to the signed
//! range of the packed field. Channels whose sensor defines an overflow code
//! reserve the packed minimum as a sentinel meaning "the sensor itself
//! reported overflow", which is distinct from "the value saturated at a
//! range limit".

use crate::config::{ChannelSpec, OVERFLOW_FLAG_SOURCE, OverflowFlagSource};

/// Largest code representable in a `bits`-wide signed field.
pub const fn packed_max(bits: u32) -> i16 {
    ((1i32 << (bits - 1)) - 1) as i16
}

/// Most negative code of a `bits`-wide signed field; reserved as the
/// overflow sentinel on channels that have one.
pub const fn overflow_sentinel(bits: u32) -> i16 {
    -(1i16 << (bits - 1))
}

/// Smallest code a value may clamp to. One above the field minimum when the
/// minimum doubles as the overflow sentinel, the field minimum otherwise.
pub const fn clamp_min(spec: &ChannelSpec) -> i16 {
    if spec.overflow_code.is_some() {
        -packed_max(spec.packed_bits)
    } else {
        overflow_sentinel(spec.packed_bits)
    }
}

/// Reduce one channel to its packed code.
///
/// `average` is the bank mean being encoded; `instantaneous` is the latest
/// raw reading, consulted (per the build-time [`OVERFLOW_FLAG_SOURCE`]
/// choice) to decide whether the sensor reported overflow.
pub fn quantize(spec: &ChannelSpec, average: i16, instantaneous: i16) -> i16 {
    if let Some(code) = spec.overflow_code {
        let flagged = match OVERFLOW_FLAG_SOURCE {
            OverflowFlagSource::Instantaneous => instantaneous == code,
            OverflowFlagSource::Averaged => average == code,
        };
        if flagged {
            return overflow_sentinel(spec.packed_bits);
        }
    }

    let shifted = (i32::from(average) >> spec.shift()) as i16;
    shifted.clamp(clamp_min(spec), packed_max(spec.packed_bits))
}

/// Reconstruct the native-resolution value a packed code stands for.
///
/// The sentinel maps back to the sensor's overflow code; everything else is
/// the inverse shift, so in-range values reconstruct within one downsample
/// factor of the original.
pub fn dequantize(spec: &ChannelSpec, code: i16) -> i16 {
    if let Some(overflow) = spec.overflow_code
        && code == overflow_sentinel(spec.packed_bits)
    {
        return overflow;
    }
    (i32::from(code) << spec.shift()) as i16
}
