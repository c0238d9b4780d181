//! Cryptographic utilities for pickup OTPs.

use rand::rngs::OsRng;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Generates a numeric one-time password of the given length from the OS
/// CSPRNG. Leading zeros are allowed.
pub fn generate_numeric_otp(length: usize) -> String {
    let mut rng = OsRng;
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Constant-time string equality.
///
/// Both inputs are hashed first, so the comparison time is independent of
/// where the candidate diverges from the stored value.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let digest_a = Sha256::digest(a.as_bytes());
    let digest_b = Sha256::digest(b.as_bytes());

    let mut diff = 0u8;
    for (x, y) in digest_a.iter().zip(digest_b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Computes SHA-256 of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_length_and_charset() {
        for len in [4, 6, 8] {
            let otp = generate_numeric_otp(len);
            assert_eq!(otp.len(), len);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_otp_is_not_constant() {
        // 20 draws of 6 digits colliding on every draw is vanishingly unlikely.
        let first = generate_numeric_otp(6);
        let all_same = (0..20).all(|_| generate_numeric_otp(6) == first);
        assert!(!all_same);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("473921", "473921"));
        assert!(!constant_time_eq("473921", "473922"));
        assert!(!constant_time_eq("473921", "47392"));
        assert!(constant_time_eq("", ""));
    }

    #[test]
    fn test_sha256_hex() {
        let hash = sha256_hex("test");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }
}
