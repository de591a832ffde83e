// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
//! AES Key Wrap (RFC 3394).
use aes::cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, KeyInit};
use aes_kw::{KekAes128, KekAes192, KekAes256};

use crate::{
    aes_cbc::AesKeySize,
    error::{key_too_short, CryptoError, Result},
    transform::{CryptoTransform, TransformOutput},
};

/// Initial value from RFC 3394, section 2.2.3.1.
pub const DEFAULT_IV: [u8; 8] = [0xA6; 8];

const SEMIBLOCK: usize = 8;

/// Engine performing the wrap/unwrap rounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyWrapProvider {
    /// In-crate RFC 3394 rounds over the `aes` block cipher. Supports any IV.
    #[default]
    Builtin,
    /// The `aes-kw` crate. Only supports [`DEFAULT_IV`].
    AesKw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AesKw {
    key_size: AesKeySize,
}

impl AesKw {
    pub const A128KW: AesKw = AesKw::new(AesKeySize::Aes128);
    pub const A192KW: AesKw = AesKw::new(AesKeySize::Aes192);
    pub const A256KW: AesKw = AesKw::new(AesKeySize::Aes256);

    pub const fn new(key_size: AesKeySize) -> Self {
        Self { key_size }
    }

    pub fn name(&self) -> &'static str {
        match self.key_size {
            AesKeySize::Aes128 => "A128KW",
            AesKeySize::Aes192 => "A192KW",
            AesKeySize::Aes256 => "A256KW",
        }
    }

    pub fn key_size(&self) -> AesKeySize {
        self.key_size
    }

    pub fn create_encryptor(&self, key: &[u8]) -> Result<Box<dyn CryptoTransform>> {
        self.create_encryptor_with_iv_and_provider(key, None, KeyWrapProvider::default())
    }

    pub fn create_encryptor_with_iv(
        &self,
        key: &[u8],
        iv: &[u8],
    ) -> Result<Box<dyn CryptoTransform>> {
        self.create_encryptor_with_iv_and_provider(key, Some(iv), KeyWrapProvider::default())
    }

    pub fn create_encryptor_with_provider(
        &self,
        key: &[u8],
        provider: KeyWrapProvider,
    ) -> Result<Box<dyn CryptoTransform>> {
        self.create_encryptor_with_iv_and_provider(key, None, provider)
    }

    pub fn create_encryptor_with_iv_and_provider(
        &self,
        key: &[u8],
        iv: Option<&[u8]>,
        provider: KeyWrapProvider,
    ) -> Result<Box<dyn CryptoTransform>> {
        Ok(Box::new(self.transform(key, iv, provider, Direction::Wrap)?))
    }

    pub fn create_decryptor(&self, key: &[u8]) -> Result<Box<dyn CryptoTransform>> {
        self.create_decryptor_with_iv_and_provider(key, None, KeyWrapProvider::default())
    }

    pub fn create_decryptor_with_iv(
        &self,
        key: &[u8],
        iv: &[u8],
    ) -> Result<Box<dyn CryptoTransform>> {
        self.create_decryptor_with_iv_and_provider(key, Some(iv), KeyWrapProvider::default())
    }

    pub fn create_decryptor_with_provider(
        &self,
        key: &[u8],
        provider: KeyWrapProvider,
    ) -> Result<Box<dyn CryptoTransform>> {
        self.create_decryptor_with_iv_and_provider(key, None, provider)
    }

    pub fn create_decryptor_with_iv_and_provider(
        &self,
        key: &[u8],
        iv: Option<&[u8]>,
        provider: KeyWrapProvider,
    ) -> Result<Box<dyn CryptoTransform>> {
        Ok(Box::new(self.transform(key, iv, provider, Direction::Unwrap)?))
    }

    fn transform(
        &self,
        key: &[u8],
        iv: Option<&[u8]>,
        provider: KeyWrapProvider,
        direction: Direction,
    ) -> Result<KeyWrapTransform> {
        if key.len() * 8 < self.key_size.bits() {
            return Err(key_too_short(
                self.name(),
                self.key_size.bits(),
                key.len() * 8,
            ));
        }
        let iv: [u8; SEMIBLOCK] = match iv {
            Some(iv) => iv.try_into().map_err(|_| {
                CryptoError::InvalidArgument(format!(
                    "key wrap iv must be 8 bytes, found {} bytes",
                    iv.len()
                ))
            })?,
            None => DEFAULT_IV,
        };
        if provider == KeyWrapProvider::AesKw && iv != DEFAULT_IV {
            return Err(CryptoError::InvalidArgument(
                "the aes-kw provider only supports the default initial value".into(),
            ));
        }
        Ok(KeyWrapTransform {
            key: key[..self.key_size.bytes()].to_vec(),
            iv,
            provider,
            direction,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Wrap,
    Unwrap,
}

struct KeyWrapTransform {
    key: Vec<u8>,
    iv: [u8; SEMIBLOCK],
    provider: KeyWrapProvider,
    direction: Direction,
}

impl CryptoTransform for KeyWrapTransform {
    fn do_final(self: Box<Self>, data: &[u8]) -> Result<TransformOutput> {
        let output = match self.direction {
            Direction::Wrap => {
                if data.len() % SEMIBLOCK != 0 || data.len() < 2 * SEMIBLOCK {
                    return Err(CryptoError::InvalidInput(format!(
                        "key data must be a multiple of 8 bytes and at least 16 bytes, found {} bytes",
                        data.len()
                    )));
                }
                match self.provider {
                    KeyWrapProvider::Builtin => KwCipher::new(&self.key)?.wrap(&self.iv, data),
                    KeyWrapProvider::AesKw => aes_kw_wrap(&self.key, data)?,
                }
            },
            Direction::Unwrap => {
                if data.len() % SEMIBLOCK != 0 || data.len() < 3 * SEMIBLOCK {
                    return Err(CryptoError::InvalidInput(format!(
                        "wrapped key must be a multiple of 8 bytes and at least 24 bytes, found {} bytes",
                        data.len()
                    )));
                }
                match self.provider {
                    KeyWrapProvider::Builtin => KwCipher::new(&self.key)?.unwrap(&self.iv, data)?,
                    KeyWrapProvider::AesKw => aes_kw_unwrap(&self.key, data)?,
                }
            },
        };
        Ok(TransformOutput::untagged(output))
    }
}

enum KwCipher {
    Aes128(aes::Aes128),
    Aes192(aes::Aes192),
    Aes256(aes::Aes256),
}

impl KwCipher {
    fn new(key: &[u8]) -> Result<Self> {
        match key.len() {
            16 => Ok(KwCipher::Aes128(aes::Aes128::new_from_slice(key)?)),
            24 => Ok(KwCipher::Aes192(aes::Aes192::new_from_slice(key)?)),
            32 => Ok(KwCipher::Aes256(aes::Aes256::new_from_slice(key)?)),
            _ => Err(CryptoError::InvalidKey("invalid key wrap key length".into())),
        }
    }

    fn encrypt_block(&self, block: &mut [u8; 16]) {
        let block = GenericArray::from_mut_slice(block);
        match self {
            KwCipher::Aes128(c) => c.encrypt_block(block),
            KwCipher::Aes192(c) => c.encrypt_block(block),
            KwCipher::Aes256(c) => c.encrypt_block(block),
        }
    }

    fn decrypt_block(&self, block: &mut [u8; 16]) {
        let block = GenericArray::from_mut_slice(block);
        match self {
            KwCipher::Aes128(c) => c.decrypt_block(block),
            KwCipher::Aes192(c) => c.decrypt_block(block),
            KwCipher::Aes256(c) => c.decrypt_block(block),
        }
    }

    fn wrap(&self, iv: &[u8; SEMIBLOCK], plaintext: &[u8]) -> Vec<u8> {
        let n = plaintext.len() / SEMIBLOCK;
        let mut a = *iv;
        let mut r = plaintext.to_vec();
        let mut block = [0u8; 16];

        for j in 0..6 {
            for i in 0..n {
                let ri = &mut r[i * SEMIBLOCK..(i + 1) * SEMIBLOCK];
                block[..SEMIBLOCK].copy_from_slice(&a);
                block[SEMIBLOCK..].copy_from_slice(ri);
                self.encrypt_block(&mut block);

                let t = ((n * j) + i + 1) as u64;
                a.copy_from_slice(&block[..SEMIBLOCK]);
                xor_counter(&mut a, t);
                ri.copy_from_slice(&block[SEMIBLOCK..]);
            }
        }

        let mut output = Vec::with_capacity(plaintext.len() + SEMIBLOCK);
        output.extend_from_slice(&a);
        output.extend_from_slice(&r);
        output
    }

    fn unwrap(&self, iv: &[u8; SEMIBLOCK], ciphertext: &[u8]) -> Result<Vec<u8>> {
        let n = ciphertext.len() / SEMIBLOCK - 1;
        let mut a = [0u8; SEMIBLOCK];
        a.copy_from_slice(&ciphertext[..SEMIBLOCK]);
        let mut r = ciphertext[SEMIBLOCK..].to_vec();
        let mut block = [0u8; 16];

        for j in (0..6).rev() {
            for i in (0..n).rev() {
                let ri = &mut r[i * SEMIBLOCK..(i + 1) * SEMIBLOCK];
                let t = ((n * j) + i + 1) as u64;
                xor_counter(&mut a, t);
                block[..SEMIBLOCK].copy_from_slice(&a);
                block[SEMIBLOCK..].copy_from_slice(ri);
                self.decrypt_block(&mut block);

                a.copy_from_slice(&block[..SEMIBLOCK]);
                ri.copy_from_slice(&block[SEMIBLOCK..]);
            }
        }

        let diff = a.iter().zip(iv).fold(0u8, |acc, (x, y)| acc | (x ^ y));
        if diff != 0 {
            return Err(CryptoError::AuthenticationFailed);
        }
        Ok(r)
    }
}

fn xor_counter(a: &mut [u8; SEMIBLOCK], t: u64) {
    for (byte, t) in a.iter_mut().zip(t.to_be_bytes()) {
        *byte ^= t;
    }
}

fn map_aes_kw_error(err: aes_kw::Error) -> CryptoError {
    match err {
        aes_kw::Error::IntegrityCheckFailed => CryptoError::AuthenticationFailed,
        other => CryptoError::InvalidInput(other.to_string()),
    }
}

fn aes_kw_wrap(kek: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    match kek.len() {
        16 => KekAes128::new(GenericArray::from_slice(kek)).wrap_vec(key),
        24 => KekAes192::new(GenericArray::from_slice(kek)).wrap_vec(key),
        32 => KekAes256::new(GenericArray::from_slice(kek)).wrap_vec(key),
        _ => return Err(CryptoError::InvalidKey("invalid key wrap key length".into())),
    }
    .map_err(map_aes_kw_error)
}

fn aes_kw_unwrap(kek: &[u8], wrapped_key: &[u8]) -> Result<Vec<u8>> {
    match kek.len() {
        16 => KekAes128::new(GenericArray::from_slice(kek)).unwrap_vec(wrapped_key),
        24 => KekAes192::new(GenericArray::from_slice(kek)).unwrap_vec(wrapped_key),
        32 => KekAes256::new(GenericArray::from_slice(kek)).unwrap_vec(wrapped_key),
        _ => return Err(CryptoError::InvalidKey("invalid key wrap key length".into())),
    }
    .map_err(map_aes_kw_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    fn wrap(alg: &AesKw, kek: &[u8], key: &[u8], provider: KeyWrapProvider) -> Vec<u8> {
        alg.create_encryptor_with_provider(kek, provider)
            .unwrap()
            .do_final(key)
            .unwrap()
            .data
    }

    fn unwrap(
        alg: &AesKw,
        kek: &[u8],
        wrapped: &[u8],
        provider: KeyWrapProvider,
    ) -> Result<Vec<u8>> {
        alg.create_decryptor_with_provider(kek, provider)?
            .do_final(wrapped)
            .map(|output| output.data)
    }

    #[test]
    fn test_rfc3394_128_bit_kek() {
        let kek = hex("000102030405060708090A0B0C0D0E0F");
        let key = hex("00112233445566778899AABBCCDDEEFF");
        let expected = hex("1FA68B0A8112B447AEF34BD8FB5A7B829D3E862371D2CFE5");
        for provider in [KeyWrapProvider::Builtin, KeyWrapProvider::AesKw] {
            assert_eq!(wrap(&AesKw::A128KW, &kek, &key, provider), expected);
            assert_eq!(unwrap(&AesKw::A128KW, &kek, &expected, provider).unwrap(), key);
        }
    }

    #[test]
    fn test_rfc3394_256_bit_kek_256_bit_key() {
        let kek = hex("000102030405060708090A0B0C0D0E0F101112131415161718191A1B1C1D1E1F");
        let key = hex("00112233445566778899AABBCCDDEEFF000102030405060708090A0B0C0D0E0F");
        let expected = hex(
            "28C9F404C4B810F4CBCCB35CFB87F8263F5786E2D80ED326CBC7F0E71A99F43BFB988B9B7A02DD21",
        );
        assert_eq!(wrap(&AesKw::A256KW, &kek, &key, KeyWrapProvider::Builtin), expected);
    }

    #[test]
    fn test_roundtrip_all_sizes() {
        for alg in [AesKw::A128KW, AesKw::A192KW, AesKw::A256KW] {
            let kek = vec![0x0fu8; alg.key_size().bytes()];
            for key_len in [16, 24, 32] {
                let key: Vec<u8> = (0..key_len as u8).collect();
                let builtin = wrap(&alg, &kek, &key, KeyWrapProvider::Builtin);
                let crate_kw = wrap(&alg, &kek, &key, KeyWrapProvider::AesKw);
                assert_eq!(builtin, crate_kw, "{}", alg.name());
                assert_eq!(builtin.len(), key.len() + 8);
                assert_eq!(
                    unwrap(&alg, &kek, &builtin, KeyWrapProvider::Builtin).unwrap(),
                    key
                );
            }
        }
    }

    #[test]
    fn test_custom_iv() {
        let kek = [1u8; 16];
        let key = [2u8; 16];
        let iv = [0x5Au8; 8];
        let wrapped = AesKw::A128KW
            .create_encryptor_with_iv(&kek, &iv)
            .unwrap()
            .do_final(&key)
            .unwrap()
            .data;
        assert_ne!(wrapped, wrap(&AesKw::A128KW, &kek, &key, KeyWrapProvider::Builtin));

        let unwrapped = AesKw::A128KW
            .create_decryptor_with_iv(&kek, &iv)
            .unwrap()
            .do_final(&wrapped)
            .unwrap()
            .data;
        assert_eq!(unwrapped, key);

        // Unwrapping with the default IV fails the integrity check.
        assert_eq!(
            unwrap(&AesKw::A128KW, &kek, &wrapped, KeyWrapProvider::Builtin),
            Err(CryptoError::AuthenticationFailed)
        );
        assert!(matches!(
            AesKw::A128KW.create_encryptor_with_iv_and_provider(
                &kek,
                Some(&iv),
                KeyWrapProvider::AesKw
            ),
            Err(CryptoError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_tampered_wrapped_key() {
        let kek = [4u8; 24];
        let mut wrapped = wrap(&AesKw::A192KW, &kek, &[8u8; 16], KeyWrapProvider::Builtin);
        wrapped[10] ^= 0x01;
        for provider in [KeyWrapProvider::Builtin, KeyWrapProvider::AesKw] {
            assert_eq!(
                unwrap(&AesKw::A192KW, &kek, &wrapped, provider),
                Err(CryptoError::AuthenticationFailed)
            );
        }
    }

    #[test]
    fn test_key_validation() {
        assert!(matches!(
            AesKw::A256KW.create_encryptor(&[0u8; 16]),
            Err(CryptoError::InvalidKey(_))
        ));
        // Longer keys are truncated to the variant's size.
        let long = wrap(&AesKw::A128KW, &[3u8; 32], &[1u8; 16], KeyWrapProvider::Builtin);
        let exact = wrap(&AesKw::A128KW, &[3u8; 16], &[1u8; 16], KeyWrapProvider::Builtin);
        assert_eq!(long, exact);
        assert!(matches!(
            AesKw::A128KW.create_encryptor_with_iv(&[0u8; 16], &[0u8; 4]),
            Err(CryptoError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_input_length_validation() {
        let kek = [0u8; 16];
        let result = AesKw::A128KW.create_encryptor(&kek).unwrap().do_final(&[0u8; 12]);
        assert!(matches!(result, Err(CryptoError::InvalidInput(_))));
        let result = AesKw::A128KW.create_decryptor(&kek).unwrap().do_final(&[0u8; 16]);
        assert!(matches!(result, Err(CryptoError::InvalidInput(_))));
    }
}
