//! Compile-time configuration for the node.
//!
//! Everything the device does is fixed at build time: the channel set, the
//! cascade geometry, and the packed bit widths of the wire record. There is
//! no runtime configuration surface.

/// Depth of every ring window, level 0 and cascade banks alike.
///
/// Kept a power of two so window means reduce to an arithmetic right shift.
pub const WINDOW_DEPTH: usize = 4;

/// Number of cascade banks visited per lap.
pub const BANK_COUNT: usize = 4;

/// Bank whose average represents short-term smoothing in the packet.
pub const SHORT_TERM_BANK: usize = 0;

/// Bank whose average represents long-term smoothing in the packet.
pub const LONG_TERM_BANK: usize = BANK_COUNT - 1;

/// Number of channels in every [`crate::Sample`], present sensors or not.
pub const CHANNEL_COUNT: usize = 10;

// Channel indices. Disabled sensors leave their channels zeroed; the sample
// shape never changes.
pub const TEMPERATURE: usize = 0;
pub const MAG_X: usize = 1;
pub const MAG_Y: usize = 2;
pub const MAG_Z: usize = 3;
pub const ACCEL_X: usize = 4;
pub const ACCEL_Y: usize = 5;
pub const ACCEL_Z: usize = 6;
pub const GYRO_X: usize = 7;
pub const GYRO_Y: usize = 8;
pub const GYRO_Z: usize = 9;

/// Value the magnetometer reports on any axis whose ADC overflowed.
///
/// The 12-bit measurement range is -2048..=2047; -4096 is the chip's
/// reserved out-of-range output.
pub const MAG_OVERFLOW: i16 = -4096;

/// Which value the encoder inspects when deciding whether a channel gets
/// the reserved overflow sentinel instead of a quantized average.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowFlagSource {
    /// Flag overflow when the latest raw reading equals the sensor's
    /// overflow code. An average dragged out of range by past overflow
    /// readings merely saturates.
    Instantaneous,
    /// Flag overflow when the window average itself equals the code.
    Averaged,
}

/// Build-time choice for the sentinel check (see [`OverflowFlagSource`]).
pub const OVERFLOW_FLAG_SOURCE: OverflowFlagSource = OverflowFlagSource::Instantaneous;

/// Per-channel quantization parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSpec {
    pub name: &'static str,
    /// Resolution of the sensor's native output.
    pub native_bits: u32,
    /// Width of the packed field in the wire record.
    pub packed_bits: u32,
    /// Extra shift clawed back because the channel's real dynamic range is
    /// narrower than its native full scale.
    pub headroom_shift: u32,
    /// Reserved native value the sensor emits on overflow, if it has one.
    pub overflow_code: Option<i16>,
}

impl ChannelSpec {
    /// Right shift applied when downsampling a native value into its
    /// packed field.
    pub const fn shift(&self) -> u32 {
        self.native_bits - self.packed_bits - self.headroom_shift
    }

    /// Downsample factor; in-range values reconstruct within this.
    pub const fn downsample_factor(&self) -> i16 {
        1 << self.shift()
    }
}

/// The channel table, in wire order.
///
/// - Temperature arrives already reduced to whole degrees C (-40..=85), so
///   it packs 1:1 into 8 bits.
/// - Magnetometer axes are 12-bit with a reserved overflow code; 9 packed
///   bits leave a sentinel plus sign-symmetric saturation range.
/// - Inertial axes are 16-bit, but at the configured full scales the top
///   two bits never carry signal, hence the headroom shift of 2.
pub const CHANNELS: [ChannelSpec; CHANNEL_COUNT] = [
    ChannelSpec {
        name: "temp",
        native_bits: 8,
        packed_bits: 8,
        headroom_shift: 0,
        overflow_code: None,
    },
    ChannelSpec {
        name: "mag_x",
        native_bits: 12,
        packed_bits: 9,
        headroom_shift: 0,
        overflow_code: Some(MAG_OVERFLOW),
    },
    ChannelSpec {
        name: "mag_y",
        native_bits: 12,
        packed_bits: 9,
        headroom_shift: 0,
        overflow_code: Some(MAG_OVERFLOW),
    },
    ChannelSpec {
        name: "mag_z",
        native_bits: 12,
        packed_bits: 9,
        headroom_shift: 0,
        overflow_code: Some(MAG_OVERFLOW),
    },
    ChannelSpec {
        name: "accel_x",
        native_bits: 16,
        packed_bits: 8,
        headroom_shift: 2,
        overflow_code: None,
    },
    ChannelSpec {
        name: "accel_y",
        native_bits: 16,
        packed_bits: 8,
        headroom_shift: 2,
        overflow_code: None,
    },
    ChannelSpec {
        name: "accel_z",
        native_bits: 16,
        packed_bits: 8,
        headroom_shift: 2,
        overflow_code: None,
    },
    ChannelSpec {
        name: "gyro_x",
        native_bits: 16,
        packed_bits: 8,
        headroom_shift: 2,
        overflow_code: None,
    },
    ChannelSpec {
        name: "gyro_y",
        native_bits: 16,
        packed_bits: 8,
        headroom_shift: 2,
        overflow_code: None,
    },
    ChannelSpec {
        name: "gyro_z",
        native_bits: 16,
        packed_bits: 8,
        headroom_shift: 2,
        overflow_code: None,
    },
];

/// Bits in one per-bank sub-record.
pub const SUBRECORD_BITS: usize = {
    let mut i = 0;
    let mut bits = 0;
    while i < CHANNEL_COUNT {
        bits += CHANNELS[i].packed_bits as usize;
        i += 1;
    }
    bits
};

/// Total packet payload length in bytes (two sub-records, byte-aligned).
pub const PACKET_LEN: usize = (SUBRECORD_BITS * 2).div_ceil(8);
