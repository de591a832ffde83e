// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
//! AES_CBC_HMAC_SHA2 composite authenticated encryption (RFC 7518, section 5.2).
//!
//! The content encryption key is split in two halves: the first half keys the HMAC,
//! the second half keys AES-CBC. The tag is the HMAC over
//! `AAD || IV || ciphertext || AL`, truncated to the length of the MAC key, where `AL`
//! is the bit length of the AAD as a 64-bit big-endian integer.
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};

use crate::{
    aes_cbc::{require_iv, AesKeySize, CbcDecryptor, CbcEncryptor},
    error::{key_too_short, CryptoError, Result},
    hash::ShaAlgorithm,
    transform::{CryptoTransform, TransformOutput},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AesCbcHmacSha2 {
    key_size: AesKeySize,
}

impl AesCbcHmacSha2 {
    pub const A128CBC_HS256: AesCbcHmacSha2 = AesCbcHmacSha2::new(AesKeySize::Aes128);
    pub const A192CBC_HS384: AesCbcHmacSha2 = AesCbcHmacSha2::new(AesKeySize::Aes192);
    pub const A256CBC_HS512: AesCbcHmacSha2 = AesCbcHmacSha2::new(AesKeySize::Aes256);

    pub const fn new(key_size: AesKeySize) -> Self {
        Self { key_size }
    }

    pub fn name(&self) -> &'static str {
        match self.key_size {
            AesKeySize::Aes128 => "A128CBC-HS256",
            AesKeySize::Aes192 => "A192CBC-HS384",
            AesKeySize::Aes256 => "A256CBC-HS512",
        }
    }

    /// Size of the AES half of the key. The HMAC half has the same size.
    pub fn key_size(&self) -> AesKeySize {
        self.key_size
    }

    pub fn hmac_algorithm(&self) -> ShaAlgorithm {
        match self.key_size {
            AesKeySize::Aes128 => ShaAlgorithm::Sha256,
            AesKeySize::Aes192 => ShaAlgorithm::Sha384,
            AesKeySize::Aes256 => ShaAlgorithm::Sha512,
        }
    }

    /// Total key length in bits, MAC key and encryption key combined.
    pub fn required_key_bits(&self) -> usize {
        self.key_size.bits() * 2
    }

    pub fn tag_length(&self) -> usize {
        self.key_size.bytes()
    }

    pub fn create_encryptor(
        &self,
        key: &[u8],
        iv: Option<&[u8]>,
        aad: Option<&[u8]>,
    ) -> Result<Box<dyn CryptoTransform>> {
        let (mac_key, enc_key) = self.split_key(key)?;
        let iv = require_iv(iv, self.name())?;
        let aad = aad.ok_or(CryptoError::MissingParameter("aad"))?;

        Ok(Box::new(AesCbcHmacSha2Encryptor {
            cipher: CbcEncryptor::new(enc_key, iv)?,
            authenticator: Authenticator::new(self.hmac_algorithm(), mac_key, iv, aad),
        }))
    }

    pub fn create_decryptor(
        &self,
        key: &[u8],
        iv: Option<&[u8]>,
        aad: Option<&[u8]>,
        tag: Option<&[u8]>,
    ) -> Result<Box<dyn CryptoTransform>> {
        let (mac_key, enc_key) = self.split_key(key)?;
        let iv = require_iv(iv, self.name())?;
        let aad = aad.ok_or(CryptoError::MissingParameter("aad"))?;
        let tag = tag.ok_or(CryptoError::MissingParameter("authentication tag"))?;

        Ok(Box::new(AesCbcHmacSha2Decryptor {
            cipher: CbcDecryptor::new(enc_key, iv)?,
            authenticator: Authenticator::new(self.hmac_algorithm(), mac_key, iv, aad),
            expected_tag: tag.to_vec(),
        }))
    }

    fn split_key<'a>(&self, key: &'a [u8]) -> Result<(&'a [u8], &'a [u8])> {
        if key.len() * 8 < self.required_key_bits() {
            return Err(key_too_short(
                self.name(),
                self.required_key_bits(),
                key.len() * 8,
            ));
        }
        let half = self.key_size.bytes();
        Ok((&key[..half], &key[half..half * 2]))
    }
}

/// MAC state shared by the encryptor and decryptor.
struct Authenticator {
    hash: ShaAlgorithm,
    mac_key: Vec<u8>,
    iv: Vec<u8>,
    aad: Vec<u8>,
    aad_length: [u8; 8],
}

impl Authenticator {
    fn new(hash: ShaAlgorithm, mac_key: &[u8], iv: &[u8], aad: &[u8]) -> Self {
        let aad_bits = (aad.len() as u64) * 8;
        Self {
            hash,
            mac_key: mac_key.to_vec(),
            iv: iv.to_vec(),
            aad: aad.to_vec(),
            aad_length: aad_bits.to_be_bytes(),
        }
    }

    fn mac(&self, ciphertext: &[u8]) -> Result<HmacSha2> {
        let mut mac = HmacSha2::new(self.hash, &self.mac_key)?;
        mac.update(&self.aad);
        mac.update(&self.iv);
        mac.update(ciphertext);
        mac.update(&self.aad_length);
        Ok(mac)
    }

    fn tag(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let mut tag = self.mac(ciphertext)?.finalize();
        tag.truncate(self.mac_key.len());
        Ok(tag)
    }

    /// Constant-time comparison of the truncated MAC with `expected`.
    fn verify(&self, ciphertext: &[u8], expected: &[u8]) -> Result<()> {
        if expected.len() != self.mac_key.len() {
            return Err(CryptoError::AuthenticationFailed);
        }
        self.mac(ciphertext)?.verify_truncated_left(expected)
    }
}

enum HmacSha2 {
    Sha256(Hmac<Sha256>),
    Sha384(Hmac<Sha384>),
    Sha512(Hmac<Sha512>),
}

impl HmacSha2 {
    fn new(hash: ShaAlgorithm, key: &[u8]) -> Result<Self> {
        let invalid = |_| CryptoError::InvalidKey("invalid HMAC key".into());
        match hash {
            ShaAlgorithm::Sha256 => Ok(HmacSha2::Sha256(
                Hmac::<Sha256>::new_from_slice(key).map_err(invalid)?,
            )),
            ShaAlgorithm::Sha384 => Ok(HmacSha2::Sha384(
                Hmac::<Sha384>::new_from_slice(key).map_err(invalid)?,
            )),
            ShaAlgorithm::Sha512 => Ok(HmacSha2::Sha512(
                Hmac::<Sha512>::new_from_slice(key).map_err(invalid)?,
            )),
            ShaAlgorithm::Sha1 => Err(CryptoError::UnsupportedAlgorithm(
                "HMAC-SHA-1 is not used by AES_CBC_HMAC_SHA2".into(),
            )),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            HmacSha2::Sha256(h) => h.update(data),
            HmacSha2::Sha384(h) => h.update(data),
            HmacSha2::Sha512(h) => h.update(data),
        }
    }

    fn finalize(self) -> Vec<u8> {
        match self {
            HmacSha2::Sha256(h) => h.finalize().into_bytes().to_vec(),
            HmacSha2::Sha384(h) => h.finalize().into_bytes().to_vec(),
            HmacSha2::Sha512(h) => h.finalize().into_bytes().to_vec(),
        }
    }

    fn verify_truncated_left(self, tag: &[u8]) -> Result<()> {
        match self {
            HmacSha2::Sha256(h) => h.verify_truncated_left(tag),
            HmacSha2::Sha384(h) => h.verify_truncated_left(tag),
            HmacSha2::Sha512(h) => h.verify_truncated_left(tag),
        }
        .map_err(|_| CryptoError::AuthenticationFailed)
    }
}

struct AesCbcHmacSha2Encryptor {
    cipher: CbcEncryptor,
    authenticator: Authenticator,
}

impl CryptoTransform for AesCbcHmacSha2Encryptor {
    fn do_final(self: Box<Self>, data: &[u8]) -> Result<TransformOutput> {
        let ciphertext = self.cipher.encrypt(data);
        let tag = self.authenticator.tag(&ciphertext)?;
        Ok(TransformOutput {
            data: ciphertext,
            tag: Some(tag),
        })
    }
}

struct AesCbcHmacSha2Decryptor {
    cipher: CbcDecryptor,
    authenticator: Authenticator,
    expected_tag: Vec<u8>,
}

impl CryptoTransform for AesCbcHmacSha2Decryptor {
    fn do_final(self: Box<Self>, data: &[u8]) -> Result<TransformOutput> {
        self.authenticator.verify(data, &self.expected_tag)?;
        Ok(TransformOutput::untagged(self.cipher.decrypt(data)?))
    }

    fn tag(&self) -> Option<&[u8]> {
        Some(&self.expected_tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [AesCbcHmacSha2; 3] = [
        AesCbcHmacSha2::A128CBC_HS256,
        AesCbcHmacSha2::A192CBC_HS384,
        AesCbcHmacSha2::A256CBC_HS512,
    ];

    fn encrypt(
        alg: &AesCbcHmacSha2,
        key: &[u8],
        iv: &[u8],
        aad: &[u8],
        pt: &[u8],
    ) -> TransformOutput {
        alg.create_encryptor(key, Some(iv), Some(aad))
            .unwrap()
            .do_final(pt)
            .unwrap()
    }

    fn decrypt(
        alg: &AesCbcHmacSha2,
        key: &[u8],
        iv: &[u8],
        aad: &[u8],
        tag: &[u8],
        ct: &[u8],
    ) -> Result<Vec<u8>> {
        alg.create_decryptor(key, Some(iv), Some(aad), Some(tag))?
            .do_final(ct)
            .map(|output| output.data)
    }

    fn hex(s: &str) -> Vec<u8> {
        let s: String = s.split_whitespace().collect();
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    #[test]
    fn test_zero_key_hello_world() {
        let alg = AesCbcHmacSha2::A256CBC_HS512;
        let key = [0u8; 64];
        let iv = [0u8; 16];
        let aad = b"test";

        let encrypted = encrypt(&alg, &key, &iv, aad, b"hello world");
        let tag = encrypted.tag.clone().unwrap();
        assert_eq!(tag.len(), 32);

        let decrypted = decrypt(&alg, &key, &iv, aad, &tag, &encrypted.data).unwrap();
        assert_eq!(decrypted, b"hello world");

        for i in 0..tag.len() {
            let mut bad_tag = tag.clone();
            bad_tag[i] ^= 0x01;
            assert_eq!(
                decrypt(&alg, &key, &iv, aad, &bad_tag, &encrypted.data),
                Err(CryptoError::AuthenticationFailed)
            );
        }
    }

    #[test]
    fn test_short_key_names_lengths() {
        // 32 zero bytes only satisfy the 256 bit variant.
        let key = [0u8; 32];
        let iv = [0u8; 16];
        assert!(AesCbcHmacSha2::A128CBC_HS256
            .create_encryptor(&key, Some(&iv), Some(b"test"))
            .is_ok());
        match AesCbcHmacSha2::A256CBC_HS512.create_encryptor(&key, Some(&iv), Some(b"test")) {
            Err(CryptoError::InvalidKey(msg)) => {
                assert!(msg.contains("A256CBC-HS512"), "{msg}");
                assert!(msg.contains("512"), "{msg}");
                assert!(msg.contains("256"), "{msg}");
            },
            _ => panic!("expected InvalidKey"),
        }
    }

    #[test]
    fn test_roundtrip_all_variants() {
        let iv = [3u8; 16];
        for alg in &ALL {
            let key: Vec<u8> = (0..alg.required_key_bits() / 8).map(|i| i as u8).collect();
            for len in 0..40 {
                let pt = vec![0x5au8; len];
                let encrypted = encrypt(alg, &key, &iv, b"header", &pt);
                let tag = encrypted.tag.unwrap();
                assert_eq!(tag.len(), alg.tag_length());
                let decrypted = decrypt(alg, &key, &iv, b"header", &tag, &encrypted.data);
                assert_eq!(decrypted.unwrap(), pt, "{} len {}", alg.name(), len);
            }
        }
    }

    #[test]
    fn test_rfc7518_a128cbc_hs256_vector() {
        // RFC 7518 Appendix B.1
        let key = hex(
            "00 01 02 03 04 05 06 07 08 09 0a 0b 0c 0d 0e 0f
             10 11 12 13 14 15 16 17 18 19 1a 1b 1c 1d 1e 1f",
        );
        let plaintext = hex(
            "41 20 63 69 70 68 65 72 20 73 79 73 74 65 6d 20
             6d 75 73 74 20 6e 6f 74 20 62 65 20 72 65 71 75
             69 72 65 64 20 74 6f 20 62 65 20 73 65 63 72 65
             74 2c 20 61 6e 64 20 69 74 20 6d 75 73 74 20 62
             65 20 61 62 6c 65 20 74 6f 20 66 61 6c 6c 20 69
             6e 74 6f 20 74 68 65 20 68 61 6e 64 73 20 6f 66
             20 74 68 65 20 65 6e 65 6d 79 20 77 69 74 68 6f
             75 74 20 69 6e 63 6f 6e 76 65 6e 69 65 6e 63 65",
        );
        let iv = hex("1a f3 8c 2d c2 b9 6f fd d8 66 94 09 23 41 bc 04");
        let aad = hex(
            "54 68 65 20 73 65 63 6f 6e 64 20 70 72 69 6e 63
             69 70 6c 65 20 6f 66 20 41 75 67 75 73 74 65 20
             4b 65 72 63 6b 68 6f 66 66 73",
        );
        let expected_tag = hex("65 2c 3f a3 6b 0a 7c 5b 32 19 fa b3 a3 0b c1 c4");

        let encrypted = encrypt(&AesCbcHmacSha2::A128CBC_HS256, &key, &iv, &aad, &plaintext);
        assert_eq!(
            encrypted.data[..16],
            hex("c8 0e df a3 2d df 39 d5 ef 00 c0 b4 68 83 42 79")[..]
        );
        assert_eq!(encrypted.tag.unwrap(), expected_tag);
    }

    #[test]
    fn test_bit_flips_fail_authentication() {
        let alg = AesCbcHmacSha2::A128CBC_HS256;
        let key = [0x11u8; 32];
        let iv = [0x22u8; 16];
        let aad = b"associated".to_vec();
        let encrypted = encrypt(&alg, &key, &iv, &aad, b"sixteen byte msg and more");
        let tag = encrypted.tag.unwrap();
        let ct = encrypted.data;

        for byte in 0..ct.len() {
            for bit in 0..8 {
                let mut tampered = ct.clone();
                tampered[byte] ^= 1 << bit;
                assert_eq!(
                    decrypt(&alg, &key, &iv, &aad, &tag, &tampered),
                    Err(CryptoError::AuthenticationFailed)
                );
            }
        }
        for byte in 0..aad.len() {
            let mut tampered = aad.clone();
            tampered[byte] ^= 0x80;
            assert_eq!(
                decrypt(&alg, &key, &iv, &tampered, &tag, &ct),
                Err(CryptoError::AuthenticationFailed)
            );
        }
        let mut tampered_iv = iv;
        tampered_iv[0] ^= 1;
        assert_eq!(
            decrypt(&alg, &key, &tampered_iv, &aad, &tag, &ct),
            Err(CryptoError::AuthenticationFailed)
        );
    }

    #[test]
    fn test_truncated_tag_rejected() {
        let alg = AesCbcHmacSha2::A192CBC_HS384;
        let key = [0x33u8; 48];
        let iv = [0u8; 16];
        let encrypted = encrypt(&alg, &key, &iv, b"", b"data");
        let tag = encrypted.tag.unwrap();
        assert_eq!(
            decrypt(&alg, &key, &iv, b"", &tag[..8], &encrypted.data),
            Err(CryptoError::AuthenticationFailed)
        );
        assert_eq!(
            decrypt(&alg, &key, &iv, b"", &[], &encrypted.data),
            Err(CryptoError::AuthenticationFailed)
        );
    }

    #[test]
    fn test_missing_parameters() {
        let alg = AesCbcHmacSha2::A128CBC_HS256;
        let key = [0u8; 32];
        let iv = [0u8; 16];
        assert!(matches!(
            alg.create_encryptor(&key, None, Some(b"a")),
            Err(CryptoError::MissingParameter("iv"))
        ));
        assert!(matches!(
            alg.create_encryptor(&key, Some(&iv), None),
            Err(CryptoError::MissingParameter("aad"))
        ));
        assert!(matches!(
            alg.create_decryptor(&key, Some(&iv), Some(b"a"), None),
            Err(CryptoError::MissingParameter("authentication tag"))
        ));
    }

    #[test]
    fn test_decryptor_exposes_expected_tag() {
        let alg = AesCbcHmacSha2::A128CBC_HS256;
        let decryptor = alg
            .create_decryptor(&[0u8; 32], Some(&[0u8; 16]), Some(b""), Some(&[9u8; 16]))
            .unwrap();
        assert_eq!(decryptor.tag(), Some(&[9u8; 16][..]));
    }
}
