//! The fixed wire record handed to the radio.
//!
//! One packet carries two sub-records, the short-term (first) and long-term
//! (last) bank means, each laid out as the channel table's packed fields in
//! order, MSB-first. Packing is explicit shift/mask work rather than any
//! language-level bit fields so the layout is deterministic and portable;
//! the record is padded out to whole bytes.

use serde::{Deserialize, Serialize};

use crate::config::{CHANNEL_COUNT, CHANNELS, PACKET_LEN};
use crate::quantize::quantize;
use crate::sample::Sample;

/// Cursor-based MSB-first bit packer over a fixed buffer.
struct BitWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> BitWriter<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Append the low `bits` bits of `value`.
    fn write(&mut self, value: u32, bits: u32) {
        debug_assert!(bits >= 1 && bits <= 32);
        let mut remaining = bits as usize;
        while remaining > 0 {
            let byte = self.pos / 8;
            let used = self.pos % 8;
            let take = (8 - used).min(remaining);
            let chunk = (value >> (remaining - take)) as u8 & ((1u16 << take) - 1) as u8;
            self.buf[byte] |= chunk << (8 - used - take);
            self.pos += take;
            remaining -= take;
        }
    }
}

/// Counterpart of [`BitWriter`], used by tests and ground-side tooling.
struct BitReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn read(&mut self, bits: u32) -> u32 {
        let mut out: u32 = 0;
        let mut remaining = bits as usize;
        while remaining > 0 {
            let byte = self.pos / 8;
            let used = self.pos % 8;
            let take = (8 - used).min(remaining);
            let chunk = (self.buf[byte] >> (8 - used - take)) & ((1u16 << take) - 1) as u8;
            out = (out << take) | u32::from(chunk);
            self.pos += take;
            remaining -= take;
        }
        out
    }
}

const fn sign_extend(value: u32, bits: u32) -> i16 {
    ((value << (32 - bits)) as i32 >> (32 - bits)) as i16
}

/// An encoded, ready-to-transmit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    bytes: [u8; PACKET_LEN],
}

impl Default for Packet {
    fn default() -> Self {
        Self {
            bytes: [0; PACKET_LEN],
        }
    }
}

impl Packet {
    /// Quantize and pack the two selected bank means.
    ///
    /// `instantaneous` is the latest raw sample, consulted for the overflow
    /// sentinel decision. Encoding never fails; out-of-range inputs
    /// saturate inside the quantizer.
    pub fn encode(short_term: &Sample, long_term: &Sample, instantaneous: &Sample) -> Self {
        let mut packet = Self::default();
        let mut writer = BitWriter::new(&mut packet.bytes);
        for average in [short_term, long_term] {
            for (ch, spec) in CHANNELS.iter().enumerate() {
                let code = quantize(spec, average.channels[ch], instantaneous.channels[ch]);
                let mask = (1u32 << spec.packed_bits) - 1;
                writer.write(code as u16 as u32 & mask, spec.packed_bits);
            }
        }
        packet
    }

    /// Unpack both sub-records back into per-channel packed codes,
    /// sign-extended. Index 0 is the short-term bank, index 1 long-term.
    pub fn decode(&self) -> [[i16; CHANNEL_COUNT]; 2] {
        let mut reader = BitReader::new(&self.bytes);
        let mut out = [[0i16; CHANNEL_COUNT]; 2];
        for sub in &mut out {
            for (ch, spec) in CHANNELS.iter().enumerate() {
                sub[ch] = sign_extend(reader.read(spec.packed_bits), spec.packed_bits);
            }
        }
        out
    }

    pub const fn as_bytes(&self) -> &[u8; PACKET_LEN] {
        &self.bytes
    }

    pub const fn len(&self) -> usize {
        PACKET_LEN
    }

    pub const fn is_empty(&self) -> bool {
        PACKET_LEN == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MAG_OVERFLOW, MAG_X, MAG_Z, SUBRECORD_BITS, TEMPERATURE};
    use crate::quantize::{dequantize, overflow_sentinel};

    #[test]
    fn test_packet_is_byte_aligned_and_fixed_length() {
        assert_eq!(PACKET_LEN, (SUBRECORD_BITS * 2).div_ceil(8));
        assert_eq!(Packet::default().as_bytes().len(), 21);
    }

    #[test]
    fn test_bit_writer_reader_round_trip_across_byte_seams() {
        let mut buf = [0u8; 4];
        let mut w = BitWriter::new(&mut buf);
        w.write(0b101, 3);
        w.write(0b11_0011_001, 9);
        w.write(0b1111, 4);
        let mut r = BitReader::new(&buf);
        assert_eq!(r.read(3), 0b101);
        assert_eq!(r.read(9), 0b11_0011_001);
        assert_eq!(r.read(4), 0b1111);
    }

    #[test]
    fn test_known_layout_of_leading_fields() {
        // temp 100 = 0x64 occupies the first byte; the next 9 bits are
        // mag_x's packed code.
        let mut avg = Sample::zeroed();
        avg.channels[TEMPERATURE] = 100;
        avg.channels[MAG_X] = -8; // -8 >> 3 = -1 -> nine ones
        let packet = Packet::encode(&avg, &Sample::zeroed(), &Sample::zeroed());
        let bytes = packet.as_bytes();
        assert_eq!(bytes[0], 100);
        assert_eq!(bytes[1], 0xFF);
        assert_eq!(bytes[2] & 0x80, 0x80);
    }

    #[test]
    fn test_decode_inverts_encode() {
        let mut short = Sample::zeroed();
        let mut long = Sample::zeroed();
        for ch in 0..CHANNEL_COUNT {
            short.channels[ch] = (ch as i16 + 1) * 40;
            long.channels[ch] = -(ch as i16 + 1) * 24;
        }
        let packet = Packet::encode(&short, &long, &Sample::zeroed());
        let decoded = packet.decode();

        for (ch, spec) in CHANNELS.iter().enumerate() {
            let factor = i32::from(spec.downsample_factor());
            let near = |got: i16, want: i16| (i32::from(got) - i32::from(want)).abs() <= factor;
            assert!(near(dequantize(spec, decoded[0][ch]), short.channels[ch]));
            assert!(near(dequantize(spec, decoded[1][ch]), long.channels[ch]));
        }
    }

    #[test]
    fn test_sentinel_reaches_both_subrecords() {
        let mut instantaneous = Sample::zeroed();
        instantaneous.channels[MAG_Z] = MAG_OVERFLOW;
        let avg = Sample::splat(50);
        let decoded = Packet::encode(&avg, &avg, &instantaneous).decode();
        assert_eq!(decoded[0][MAG_Z], overflow_sentinel(9));
        assert_eq!(decoded[1][MAG_Z], overflow_sentinel(9));
        // Channels without an overflow reading encode normally.
        assert_ne!(decoded[0][MAG_X], overflow_sentinel(9));
    }

    #[test]
    fn test_constant_100_stream_packet_values() {
        let avg = Sample::splat(100);
        let decoded = Packet::encode(&avg, &avg, &avg).decode();
        for sub in &decoded {
            assert_eq!(sub[TEMPERATURE], 100);
            // mag: 100 >> 3
            assert_eq!(sub[MAG_X], 12);
        }
    }
}
