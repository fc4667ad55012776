//! Stellar strkey encoding.
//!
//! ```text
//! base32_nopad(version_byte || payload[32] || crc16_xmodem_le[2])
//! ```

use crate::error::PasskeyKitError;

/// Version byte of an account id (`G...`).
pub const VERSION_ACCOUNT_ID: u8 = 6 << 3;

/// Version byte of a secret seed (`S...`).
pub const VERSION_SECRET_SEED: u8 = 18 << 3;

const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

const PAYLOAD_LEN: usize = 32;
const RAW_LEN: usize = 1 + PAYLOAD_LEN + 2;
// 35 raw bytes, 5 bits per character.
const ENCODED_LEN: usize = 56;

/// Encodes a 32-byte payload under `version`.
#[must_use]
pub fn encode(version: u8, payload: &[u8; PAYLOAD_LEN]) -> String {
    let mut raw = Vec::with_capacity(RAW_LEN);
    raw.push(version);
    raw.extend_from_slice(payload);
    let checksum = crc16_xmodem(&raw);
    raw.extend_from_slice(&checksum.to_le_bytes());
    base32_encode(&raw)
}

/// Decodes a strkey, checking that it carries `version`.
///
/// # Errors
/// Returns [`PasskeyKitError::InvalidStrkey`] on bad length, alphabet,
/// version byte or checksum.
pub fn decode(version: u8, encoded: &str) -> Result<[u8; PAYLOAD_LEN], PasskeyKitError> {
    if encoded.len() != ENCODED_LEN {
        return Err(PasskeyKitError::InvalidStrkey(format!(
            "expected {ENCODED_LEN} characters, got {}",
            encoded.len()
        )));
    }
    let raw = base32_decode(encoded)?;
    if raw.len() != RAW_LEN {
        return Err(PasskeyKitError::InvalidStrkey(
            "decoded length mismatch".to_string(),
        ));
    }
    if raw[0] != version {
        return Err(PasskeyKitError::InvalidStrkey(format!(
            "unexpected version byte {}",
            raw[0]
        )));
    }

    let (body, checksum) = raw.split_at(1 + PAYLOAD_LEN);
    if crc16_xmodem(body).to_le_bytes() != checksum {
        return Err(PasskeyKitError::InvalidStrkey(
            "checksum mismatch".to_string(),
        ));
    }

    let mut payload = [0u8; PAYLOAD_LEN];
    payload.copy_from_slice(&body[1..]);
    Ok(payload)
}

fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for byte in data {
        crc ^= u16::from(*byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 == 0 {
                crc << 1
            } else {
                (crc << 1) ^ 0x1021
            };
        }
    }
    crc
}

fn base32_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(5) * 8);
    let mut buffer: u32 = 0;
    let mut bits = 0;
    for byte in data {
        buffer = (buffer << 8) | u32::from(*byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }
    out
}

fn base32_decode(encoded: &str) -> Result<Vec<u8>, PasskeyKitError> {
    let mut out = Vec::with_capacity(encoded.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits = 0;
    for c in encoded.bytes() {
        let value = match c {
            b'A'..=b'Z' => c - b'A',
            b'2'..=b'7' => c - b'2' + 26,
            _ => {
                return Err(PasskeyKitError::InvalidStrkey(format!(
                    "invalid character {:?}",
                    c as char
                )))
            }
        };
        buffer = (buffer << 5) | u32::from(value);
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            #[allow(clippy::cast_possible_truncation)]
            out.push((buffer >> bits) as u8);
        }
    }
    // Leftover bits must be zero padding.
    if bits > 0 && buffer & ((1 << bits) - 1) != 0 {
        return Err(PasskeyKitError::InvalidStrkey(
            "non-canonical trailing bits".to_string(),
        ));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Account id and seed of the well-known all-zero key.
    const ZERO_ACCOUNT: &str = "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF";

    #[test]
    fn test_encode_zero_account() {
        assert_eq!(encode(VERSION_ACCOUNT_ID, &[0u8; 32]), ZERO_ACCOUNT);
    }

    #[test]
    fn test_decode_matches_encode() {
        let payload: [u8; 32] = core::array::from_fn(|i| u8::try_from(i * 7).unwrap());
        let encoded = encode(VERSION_SECRET_SEED, &payload);
        assert!(encoded.starts_with('S'));
        assert_eq!(decode(VERSION_SECRET_SEED, &encoded).unwrap(), payload);
    }

    #[test]
    fn test_agrees_with_stellar_strkey() {
        let payload: [u8; 32] = core::array::from_fn(|i| u8::try_from(255 - i * 3).unwrap());

        let account = encode(VERSION_ACCOUNT_ID, &payload);
        assert_eq!(account, stellar_strkey::ed25519::PublicKey(payload).to_string());
        let seed = encode(VERSION_SECRET_SEED, &payload);
        assert_eq!(seed, stellar_strkey::ed25519::PrivateKey(payload).to_string());

        let theirs = stellar_strkey::ed25519::PublicKey([9; 32]).to_string();
        assert_eq!(decode(VERSION_ACCOUNT_ID, &theirs).unwrap(), [9; 32]);
    }

    #[test]
    fn test_decode_rejects_wrong_version() {
        let result = decode(VERSION_SECRET_SEED, ZERO_ACCOUNT);
        assert!(matches!(result, Err(PasskeyKitError::InvalidStrkey(_))));
    }

    #[test]
    fn test_decode_rejects_bad_checksum() {
        let mut tampered = ZERO_ACCOUNT.to_string();
        tampered.replace_range(10..11, "B");
        let result = decode(VERSION_ACCOUNT_ID, &tampered);
        assert!(matches!(result, Err(PasskeyKitError::InvalidStrkey(_))));
    }

    #[test]
    fn test_decode_rejects_lowercase() {
        let result = decode(VERSION_ACCOUNT_ID, &ZERO_ACCOUNT.to_lowercase());
        assert!(matches!(result, Err(PasskeyKitError::InvalidStrkey(_))));
    }
}
