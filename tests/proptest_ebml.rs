//! Property-based tests for EBML parsing.
//!
//! Uses proptest to verify round-trip correctness of variable-length
//! quantity decoding and the element position-advance contract over full
//! value ranges.

use proptest::prelude::*;
use ytstream::ebml::Reader;
use ytstream::source::BufferSource;

/// Encode `value` as a VLQ of exactly `width` octets (marker bit set,
/// value in the data bits).
fn encode_vlq(value: u64, width: u32) -> Vec<u8> {
    assert!(value < (1u64 << (7 * width)) - 1);
    let mut bytes = vec![0u8; width as usize];
    let mut v = value;
    for b in bytes.iter_mut().rev() {
        *b = (v & 0xFF) as u8;
        v >>= 8;
    }
    bytes[0] |= 0x80 >> (width - 1);
    bytes
}

fn reader(data: Vec<u8>) -> Reader<BufferSource<Vec<u8>>> {
    Reader::new(BufferSource::new(data))
}

// =============================================================================
// VLQ Round-Trip Tests
// =============================================================================

proptest! {
    /// Encoding `n` for width `w` then decoding yields `n` for every
    /// `n < 2^(7w) - 1` (the all-ones pattern is reserved).
    #[test]
    fn roundtrip_vlq_variable_width(value in any::<u64>(), width in 1u32..=8) {
        let max = (1u64 << (7 * width)) - 1;
        let value = value % max;

        let encoded = encode_vlq(value, width);
        let mut r = reader(encoded);
        let mut pos = 0;

        prop_assert_eq!(r.read_size(&mut pos).unwrap(), value);
        prop_assert_eq!(pos, width as u64);
    }

    /// Ids keep the marker: decoding returns the full on-wire bit pattern.
    #[test]
    fn vlq_id_keeps_wire_pattern(value in any::<u64>(), width in 1u32..=8) {
        let max = (1u64 << (7 * width)) - 1;
        let encoded = encode_vlq(value % max, width);

        let mut wire = 0u64;
        for &b in &encoded {
            wire = (wire << 8) | b as u64;
        }

        let mut r = reader(encoded);
        let mut pos = 0;
        prop_assert_eq!(r.read_id(&mut pos).unwrap(), wire);
    }

    /// Signed decode is the two's complement of the width actually read.
    #[test]
    fn vlq_signed_is_twos_complement(value in any::<u64>(), width in 1u32..=8) {
        let max = (1u64 << (7 * width)) - 1;
        let value = value % max;

        let bits = 7 * width;
        let expected = if value >> (bits - 1) & 1 == 1 {
            (value | (u64::MAX << bits)) as i64
        } else {
            value as i64
        };

        let mut r = reader(encode_vlq(value, width));
        let mut pos = 0;
        prop_assert_eq!(r.read_int(&mut pos).unwrap(), expected);
    }
}

// =============================================================================
// Element Position-Advance Tests
// =============================================================================

proptest! {
    /// Reading a non-master element advances the position by
    /// `id_len + size_len + declared_size`, for any payload.
    #[test]
    fn non_master_element_advance(
        // Bounded by the 1-byte size encoding's 126-value range below.
        payload in prop::collection::vec(any::<u8>(), 0..100),
        size_width in 1u32..=4,
    ) {
        // SimpleBlock: a 1-byte binary id.
        let mut data = vec![0xA3];
        data.extend(encode_vlq(payload.len() as u64, size_width));
        let header_len = data.len() as u64;
        data.extend(&payload);

        let mut r = reader(data);
        let mut pos = 0;
        let element = r.read_element(&mut pos).unwrap();

        prop_assert_eq!(element.name, "SimpleBlock");
        prop_assert_eq!(pos, header_len + payload.len() as u64);
    }

    /// Reading a master element does not descend: the position lands after
    /// the entire child range, whatever it contains.
    #[test]
    fn master_element_advance(children in prop::collection::vec(any::<u8>(), 0..256)) {
        // Cluster: a 4-byte master id.
        let mut data = vec![0x1F, 0x43, 0xB6, 0x75];
        data.extend(encode_vlq(children.len() as u64, 2));
        let header_len = data.len() as u64;
        data.extend(&children);

        let mut r = reader(data);
        let mut pos = 0;
        let element = r.read_element(&mut pos).unwrap();

        let (from, to) = element.master_range().unwrap();
        prop_assert_eq!(from, header_len);
        prop_assert_eq!(to, header_len + children.len() as u64);
        prop_assert_eq!(pos, to);
    }
}
