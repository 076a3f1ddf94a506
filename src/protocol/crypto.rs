//! Password scrambles and RSA password encryption for the authentication plugins.

use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Oaep, RsaPublicKey};
use sha1::{Digest, Sha1};
use sha2::Sha256;

use crate::error::{Error, Result};

/// `mysql_native_password` scramble:
/// `SHA1(password) XOR SHA1(seed + SHA1(SHA1(password)))`.
///
/// An empty password yields an empty response.
pub fn native_password_scramble(password: &[u8], seed: &[u8]) -> Vec<u8> {
    if password.is_empty() {
        return Vec::new();
    }
    let stage1 = Sha1::digest(password);
    let stage2 = Sha1::digest(stage1);
    let mut hasher = Sha1::new();
    hasher.update(seed);
    hasher.update(stage2);
    let mask = hasher.finalize();
    stage1.iter().zip(mask.iter()).map(|(a, b)| a ^ b).collect()
}

/// `caching_sha2_password` scramble:
/// `SHA256(password) XOR SHA256(SHA256(SHA256(password)) + seed)`.
pub fn caching_sha2_scramble(password: &[u8], seed: &[u8]) -> Vec<u8> {
    if password.is_empty() {
        return Vec::new();
    }
    let stage1 = Sha256::digest(password);
    let stage2 = Sha256::digest(stage1);
    let mut hasher = Sha256::new();
    hasher.update(stage2);
    hasher.update(seed);
    let mask = hasher.finalize();
    stage1.iter().zip(mask.iter()).map(|(a, b)| a ^ b).collect()
}

/// NUL-terminate the password and XOR it with the repeating seed.
pub fn xor_password(password: &[u8], seed: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(password.len() + 1);
    out.extend_from_slice(password);
    out.push(0);
    if seed.is_empty() {
        return out;
    }
    for (i, byte) in out.iter_mut().enumerate() {
        *byte ^= seed[i % seed.len()];
    }
    out
}

/// Parse a PEM public key, SubjectPublicKeyInfo or PKCS#1.
pub fn parse_public_key(pem: &str) -> Result<RsaPublicKey> {
    let pem = pem.trim();
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|e| Error::authentication(format!("Could not parse RSA public key: {}", e)))
}

/// Encrypt the seed-masked password with RSA-OAEP (SHA-1 padding digest).
pub fn encrypt_password(password: &[u8], seed: &[u8], public_key: &RsaPublicKey) -> Result<Vec<u8>> {
    let masked = xor_password(password, seed);
    let mut rng = rand::thread_rng();
    public_key
        .encrypt(&mut rng, Oaep::new::<Sha1>(), &masked)
        .map_err(|e| Error::authentication(format!("Could not encrypt password: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs8::{EncodePublicKey, LineEnding};
    use rsa::RsaPrivateKey;

    const SEED: &[u8] = b"01234567890123456789";

    #[test]
    fn test_native_scramble() {
        assert!(native_password_scramble(b"", SEED).is_empty());
        let s = native_password_scramble(b"secret", SEED);
        assert_eq!(s.len(), 20);
        // unmasking with the seed-derived hash recovers SHA1(password)
        let stage1 = Sha1::digest(b"secret");
        let mut hasher = Sha1::new();
        hasher.update(SEED);
        hasher.update(Sha1::digest(stage1));
        let mask = hasher.finalize();
        let recovered: Vec<u8> = s.iter().zip(mask.iter()).map(|(a, b)| a ^ b).collect();
        assert_eq!(recovered, stage1.to_vec());
    }

    #[test]
    fn test_caching_sha2_scramble() {
        let s = caching_sha2_scramble(b"secret", SEED);
        assert_eq!(s.len(), 32);
        assert_ne!(s, caching_sha2_scramble(b"secret", b"another seed value.."));
        assert!(caching_sha2_scramble(b"", SEED).is_empty());
    }

    #[test]
    fn test_xor_password() {
        let masked = xor_password(b"ab", &[1, 2]);
        assert_eq!(masked, vec![b'a' ^ 1, b'b' ^ 2, 1]);
        assert_eq!(xor_password(b"ab", &[]), b"ab\0".to_vec());
    }

    #[test]
    fn test_rsa_round_trip() {
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, 1024).unwrap();
        let pem = RsaPublicKey::from(&private).to_public_key_pem(LineEnding::LF).unwrap();
        let key = parse_public_key(&pem).unwrap();
        let encrypted = encrypt_password(b"secret", SEED, &key).unwrap();
        let plain = private.decrypt(Oaep::new::<Sha1>(), &encrypted).unwrap();
        assert_eq!(plain, xor_password(b"secret", SEED));
        assert!(parse_public_key("not a key").is_err());
    }
}
