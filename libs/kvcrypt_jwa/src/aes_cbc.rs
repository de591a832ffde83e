// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use cbc::{Decryptor, Encryptor};

use crate::{
    error::{key_too_short, CryptoError, Result},
    transform::{CryptoTransform, TransformOutput},
};

pub const AES_BLOCK_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AesKeySize {
    Aes128,
    Aes192,
    Aes256,
}

impl AesKeySize {
    pub fn bits(&self) -> usize {
        self.bytes() * 8
    }

    pub fn bytes(&self) -> usize {
        match self {
            AesKeySize::Aes128 => 16,
            AesKeySize::Aes192 => 24,
            AesKeySize::Aes256 => 32,
        }
    }
}

/// AES in CBC mode with PKCS#7 padding. Not authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AesCbc {
    key_size: AesKeySize,
}

impl AesCbc {
    pub const A128CBC: AesCbc = AesCbc::new(AesKeySize::Aes128);
    pub const A192CBC: AesCbc = AesCbc::new(AesKeySize::Aes192);
    pub const A256CBC: AesCbc = AesCbc::new(AesKeySize::Aes256);

    pub const fn new(key_size: AesKeySize) -> Self {
        Self { key_size }
    }

    pub fn name(&self) -> &'static str {
        match self.key_size {
            AesKeySize::Aes128 => "A128CBC",
            AesKeySize::Aes192 => "A192CBC",
            AesKeySize::Aes256 => "A256CBC",
        }
    }

    pub fn key_size(&self) -> AesKeySize {
        self.key_size
    }

    /// `_aad` is accepted for signature parity with authenticated algorithms and ignored.
    pub fn create_encryptor(
        &self,
        key: &[u8],
        iv: Option<&[u8]>,
        _aad: Option<&[u8]>,
    ) -> Result<Box<dyn CryptoTransform>> {
        let key = self.take_key(key)?;
        let iv = require_iv(iv, self.name())?;
        Ok(Box::new(AesCbcEncryptor {
            cipher: CbcEncryptor::new(key, iv)?,
        }))
    }

    pub fn create_decryptor(
        &self,
        key: &[u8],
        iv: Option<&[u8]>,
        _aad: Option<&[u8]>,
        _tag: Option<&[u8]>,
    ) -> Result<Box<dyn CryptoTransform>> {
        let key = self.take_key(key)?;
        let iv = require_iv(iv, self.name())?;
        Ok(Box::new(AesCbcDecryptor {
            cipher: CbcDecryptor::new(key, iv)?,
        }))
    }

    fn take_key<'a>(&self, key: &'a [u8]) -> Result<&'a [u8]> {
        if key.len() * 8 < self.key_size.bits() {
            return Err(key_too_short(
                self.name(),
                self.key_size.bits(),
                key.len() * 8,
            ));
        }
        Ok(&key[..self.key_size.bytes()])
    }
}

pub(crate) fn require_iv<'a>(iv: Option<&'a [u8]>, algorithm: &str) -> Result<&'a [u8]> {
    let iv = iv.ok_or(CryptoError::MissingParameter("iv"))?;
    if iv.len() != AES_BLOCK_SIZE {
        return Err(CryptoError::InvalidArgument(
            [
                "invalid length of iv for ",
                algorithm,
                ". Expected 16 bytes, found ",
                &iv.len().to_string(),
                " bytes",
            ]
            .concat(),
        ));
    }
    Ok(iv)
}

/// An initialized CBC encryption context for one of the three AES key sizes.
pub(crate) enum CbcEncryptor {
    Aes128(Encryptor<aes::Aes128>),
    Aes192(Encryptor<aes::Aes192>),
    Aes256(Encryptor<aes::Aes256>),
}

impl CbcEncryptor {
    pub(crate) fn new(key: &[u8], iv: &[u8]) -> Result<Self> {
        match key.len() {
            16 => Ok(CbcEncryptor::Aes128(Encryptor::new_from_slices(key, iv)?)),
            24 => Ok(CbcEncryptor::Aes192(Encryptor::new_from_slices(key, iv)?)),
            32 => Ok(CbcEncryptor::Aes256(Encryptor::new_from_slices(key, iv)?)),
            len => Err(CryptoError::InvalidKey(format!(
                "unsupported AES key length of {} bits",
                len * 8
            ))),
        }
    }

    pub(crate) fn encrypt(self, data: &[u8]) -> Vec<u8> {
        match self {
            CbcEncryptor::Aes128(c) => c.encrypt_padded_vec_mut::<Pkcs7>(data),
            CbcEncryptor::Aes192(c) => c.encrypt_padded_vec_mut::<Pkcs7>(data),
            CbcEncryptor::Aes256(c) => c.encrypt_padded_vec_mut::<Pkcs7>(data),
        }
    }
}

pub(crate) enum CbcDecryptor {
    Aes128(Decryptor<aes::Aes128>),
    Aes192(Decryptor<aes::Aes192>),
    Aes256(Decryptor<aes::Aes256>),
}

impl CbcDecryptor {
    pub(crate) fn new(key: &[u8], iv: &[u8]) -> Result<Self> {
        match key.len() {
            16 => Ok(CbcDecryptor::Aes128(Decryptor::new_from_slices(key, iv)?)),
            24 => Ok(CbcDecryptor::Aes192(Decryptor::new_from_slices(key, iv)?)),
            32 => Ok(CbcDecryptor::Aes256(Decryptor::new_from_slices(key, iv)?)),
            len => Err(CryptoError::InvalidKey(format!(
                "unsupported AES key length of {} bits",
                len * 8
            ))),
        }
    }

    pub(crate) fn decrypt(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            CbcDecryptor::Aes128(c) => c.decrypt_padded_vec_mut::<Pkcs7>(data),
            CbcDecryptor::Aes192(c) => c.decrypt_padded_vec_mut::<Pkcs7>(data),
            CbcDecryptor::Aes256(c) => c.decrypt_padded_vec_mut::<Pkcs7>(data),
        }
        .map_err(|_| CryptoError::DecryptionFailed)
    }
}

struct AesCbcEncryptor {
    cipher: CbcEncryptor,
}

impl CryptoTransform for AesCbcEncryptor {
    fn do_final(self: Box<Self>, data: &[u8]) -> Result<TransformOutput> {
        Ok(TransformOutput::untagged(self.cipher.encrypt(data)))
    }
}

struct AesCbcDecryptor {
    cipher: CbcDecryptor,
}

impl CryptoTransform for AesCbcDecryptor {
    fn do_final(self: Box<Self>, data: &[u8]) -> Result<TransformOutput> {
        Ok(TransformOutput::untagged(self.cipher.decrypt(data)?))
    }
}
