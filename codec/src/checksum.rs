/// XOR of every byte in `bytes`.
///
/// The same function produces the trailer when encoding and verifies it when
/// decoding: a payload followed by its checksum always folds to zero.
#[inline]
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn known_values() {
        assert_eq!(checksum(&[]), 0);
        assert_eq!(checksum(&[0x64, 0x20]), 0x44);
        assert_eq!(checksum(&[0x83, 0x01]), 0x82);
    }

    proptest! {
        #[test]
        fn trailer_folds_to_zero(payload in any::<Vec<u8>>()) {
            let mut with_trailer = payload.clone();
            with_trailer.push(checksum(&payload));

            prop_assert_eq!(checksum(&with_trailer), 0);
        }

        #[test]
        fn split_anywhere(payload in any::<Vec<u8>>(), split in any::<prop::sample::Index>()) {
            let at = if payload.is_empty() { 0 } else { split.index(payload.len()) };
            let (a, b) = payload.split_at(at);

            prop_assert_eq!(checksum(&payload), checksum(a) ^ checksum(b));
        }
    }
}
