//! Rolling XOR obfuscation used by the name table and a few string fields

const NAME_HASH_KEY: [u8; 8] = [0x95, 0x3A, 0xC5, 0x2A, 0x95, 0x7A, 0x95, 0x6A];

/// XOR `data` in place with the name key, cycled by byte index.
///
/// The transform is its own inverse.
pub fn xor_name_bytes(data: &mut [u8]) {
    for (i, byte) in data.iter_mut().enumerate() {
        *byte ^= NAME_HASH_KEY[i % NAME_HASH_KEY.len()];
    }
}

/// Decode a hashed, NUL-terminated string field.
///
/// Everything from the first NUL on is dropped.
pub fn decode_hashed_string(raw: &[u8]) -> String {
    let mut bytes = raw.to_vec();
    xor_name_bytes(&mut bytes);
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Encode a string as hashed bytes including the trailing NUL.
pub fn encode_hashed_string(value: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(value.len() + 1);
    bytes.extend_from_slice(value.as_bytes());
    bytes.push(0);
    xor_name_bytes(&mut bytes);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xor_is_involution() {
        let original = b"PLAYER_1_MDF\0SPRITE\0".to_vec();
        let mut data = original.clone();
        xor_name_bytes(&mut data);
        assert_ne!(data, original);
        xor_name_bytes(&mut data);
        assert_eq!(data, original);
    }

    #[test]
    fn test_key_cycles_every_eight_bytes() {
        let mut zeros = [0u8; 10];
        xor_name_bytes(&mut zeros);
        assert_eq!(&zeros[..8], &NAME_HASH_KEY);
        assert_eq!(zeros[8], NAME_HASH_KEY[0]);
        assert_eq!(zeros[9], NAME_HASH_KEY[1]);
    }

    #[test]
    fn test_hashed_string_strips_terminator() {
        let encoded = encode_hashed_string("sand.bmp");
        assert_eq!(encoded.len(), 9);
        assert_eq!(decode_hashed_string(&encoded), "sand.bmp");
    }
}
