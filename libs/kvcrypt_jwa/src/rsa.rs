// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use std::fmt;

use rsa::{
    pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey},
    traits::PublicKeyParts,
    BigUint, Oaep, Pkcs1v15Encrypt, Pkcs1v15Sign, Pss, RsaPrivateKey, RsaPublicKey,
};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};

use crate::{
    error::{CryptoError, Result},
    hash::ShaAlgorithm,
    transform::{CryptoTransform, SignatureTransform, TransformOutput},
};

/// An RSA key. Either half may be absent, but not both.
#[derive(Clone, PartialEq, Eq)]
pub struct RsaKeyPair {
    public: Option<RsaPublicKey>,
    private: Option<RsaPrivateKey>,
}

impl RsaKeyPair {
    pub fn new(public: Option<RsaPublicKey>, private: Option<RsaPrivateKey>) -> Result<Self> {
        match (public, private) {
            (None, None) => Err(CryptoError::InvalidKey(
                "an RSA key needs a public or a private portion".into(),
            )),
            (public, Some(private)) => {
                let derived = private.to_public_key();
                if public.as_ref().is_some_and(|public| *public != derived) {
                    return Err(CryptoError::InvalidKey(
                        "public portion does not match the private portion".into(),
                    ));
                }
                Ok(Self {
                    public: Some(derived),
                    private: Some(private),
                })
            },
            (public, None) => Ok(Self {
                public,
                private: None,
            }),
        }
    }

    pub fn from_private_key(private: RsaPrivateKey) -> Self {
        Self {
            public: Some(private.to_public_key()),
            private: Some(private),
        }
    }

    pub fn from_public_key(public: RsaPublicKey) -> Self {
        Self {
            public: Some(public),
            private: None,
        }
    }

    pub fn from_pkcs1_private_der(der: &[u8]) -> Result<Self> {
        let private = RsaPrivateKey::from_pkcs1_der(der).map_err(invalid_key_encoding)?;
        Ok(Self::from_private_key(private))
    }

    pub fn from_pkcs1_public_der(der: &[u8]) -> Result<Self> {
        let public = RsaPublicKey::from_pkcs1_der(der).map_err(invalid_key_encoding)?;
        Ok(Self::from_public_key(public))
    }

    /// Builds a key from big-endian JWK components. `d` selects a private key, in which
    /// case `primes` are the optional `p` and `q` values.
    pub fn from_components(
        n: &[u8],
        e: &[u8],
        d: Option<&[u8]>,
        primes: &[&[u8]],
    ) -> Result<Self> {
        let n = BigUint::from_bytes_be(n);
        let e = BigUint::from_bytes_be(e);
        match d {
            Some(d) => {
                let primes = primes.iter().map(|p| BigUint::from_bytes_be(p)).collect();
                let private =
                    RsaPrivateKey::from_components(n, e, BigUint::from_bytes_be(d), primes)
                        .map_err(invalid_key)?;
                private.validate().map_err(invalid_key)?;
                Ok(Self::from_private_key(private))
            },
            None => Ok(Self::from_public_key(
                RsaPublicKey::new(n, e).map_err(invalid_key)?,
            )),
        }
    }

    pub fn generate(bits: usize) -> Result<Self> {
        let private =
            RsaPrivateKey::new(&mut rand::thread_rng(), bits).map_err(invalid_key)?;
        Ok(Self::from_private_key(private))
    }

    pub fn public_key(&self) -> Option<&RsaPublicKey> {
        self.public.as_ref()
    }

    pub fn private_key(&self) -> Option<&RsaPrivateKey> {
        self.private.as_ref()
    }

    pub fn has_private_key(&self) -> bool {
        self.private.is_some()
    }

    /// Modulus size in bytes.
    pub fn size(&self) -> usize {
        match (&self.public, &self.private) {
            (Some(public), _) => public.size(),
            (None, Some(private)) => private.size(),
            (None, None) => 0,
        }
    }

    /// Drops the private half.
    pub fn to_public(&self) -> Self {
        Self {
            public: self.public.clone(),
            private: None,
        }
    }

    fn require_public(&self, operation: &str) -> Result<&RsaPublicKey> {
        self.public.as_ref().ok_or_else(|| {
            CryptoError::InvalidKey(format!(
                "public portion of the key is not available to {operation}"
            ))
        })
    }

    fn require_private(&self, operation: &str) -> Result<&RsaPrivateKey> {
        self.private.as_ref().ok_or_else(|| {
            CryptoError::InvalidKey(format!(
                "private portion of the key is not available to {operation}"
            ))
        })
    }
}

impl fmt::Debug for RsaKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaKeyPair")
            .field("bits", &(self.size() * 8))
            .field("public", &self.public.is_some())
            .field("private", &self.private.is_some())
            .finish()
    }
}

fn invalid_key(err: rsa::Error) -> CryptoError {
    CryptoError::InvalidKey(err.to_string())
}

fn invalid_key_encoding(err: rsa::pkcs1::Error) -> CryptoError {
    CryptoError::InvalidKey(err.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RsaEncryptionPadding {
    Pkcs1v15,
    OaepSha1,
    OaepSha256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RsaEncryption {
    padding: RsaEncryptionPadding,
}

impl RsaEncryption {
    pub const RSA1_5: RsaEncryption = RsaEncryption::new(RsaEncryptionPadding::Pkcs1v15);
    pub const RSA_OAEP: RsaEncryption = RsaEncryption::new(RsaEncryptionPadding::OaepSha1);
    pub const RSA_OAEP_256: RsaEncryption =
        RsaEncryption::new(RsaEncryptionPadding::OaepSha256);

    pub const fn new(padding: RsaEncryptionPadding) -> Self {
        Self { padding }
    }

    pub fn name(&self) -> &'static str {
        match self.padding {
            RsaEncryptionPadding::Pkcs1v15 => "RSA1_5",
            RsaEncryptionPadding::OaepSha1 => "RSA-OAEP",
            RsaEncryptionPadding::OaepSha256 => "RSA-OAEP-256",
        }
    }

    pub fn padding(&self) -> RsaEncryptionPadding {
        self.padding
    }

    pub fn create_encryptor(
        &self,
        key: &RsaKeyPair,
        iv: Option<&[u8]>,
        aad: Option<&[u8]>,
    ) -> Result<Box<dyn CryptoTransform>> {
        self.reject_iv_and_aad(iv, aad)?;
        Ok(Box::new(RsaEncryptor {
            padding: self.padding,
            key: key.require_public("encrypt")?.clone(),
        }))
    }

    pub fn create_decryptor(
        &self,
        key: &RsaKeyPair,
        iv: Option<&[u8]>,
        aad: Option<&[u8]>,
    ) -> Result<Box<dyn CryptoTransform>> {
        self.reject_iv_and_aad(iv, aad)?;
        Ok(Box::new(RsaDecryptor {
            padding: self.padding,
            key: key.require_private("decrypt")?.clone(),
        }))
    }

    fn reject_iv_and_aad(&self, iv: Option<&[u8]>, aad: Option<&[u8]>) -> Result<()> {
        if iv.is_some() || aad.is_some() {
            return Err(CryptoError::InvalidArgument(format!(
                "{} does not take an iv or additional authenticated data",
                self.name()
            )));
        }
        Ok(())
    }
}

struct RsaEncryptor {
    padding: RsaEncryptionPadding,
    key: RsaPublicKey,
}

impl CryptoTransform for RsaEncryptor {
    fn do_final(self: Box<Self>, data: &[u8]) -> Result<TransformOutput> {
        let mut rng = rand::thread_rng();
        let result = match self.padding {
            RsaEncryptionPadding::Pkcs1v15 => self.key.encrypt(&mut rng, Pkcs1v15Encrypt, data),
            RsaEncryptionPadding::OaepSha1 => {
                self.key.encrypt(&mut rng, Oaep::new::<Sha1>(), data)
            },
            RsaEncryptionPadding::OaepSha256 => {
                self.key.encrypt(&mut rng, Oaep::new::<Sha256>(), data)
            },
        };
        result
            .map(TransformOutput::untagged)
            .map_err(|_| CryptoError::EncryptionFailed)
    }
}

struct RsaDecryptor {
    padding: RsaEncryptionPadding,
    key: RsaPrivateKey,
}

impl CryptoTransform for RsaDecryptor {
    fn do_final(self: Box<Self>, data: &[u8]) -> Result<TransformOutput> {
        let result = match self.padding {
            RsaEncryptionPadding::Pkcs1v15 => self.key.decrypt(Pkcs1v15Encrypt, data),
            RsaEncryptionPadding::OaepSha1 => self.key.decrypt(Oaep::new::<Sha1>(), data),
            RsaEncryptionPadding::OaepSha256 => self.key.decrypt(Oaep::new::<Sha256>(), data),
        };
        result
            .map(TransformOutput::untagged)
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RsaSignaturePadding {
    Pkcs1v15,
    /// Salt length equals the digest length.
    Pss,
}

/// RSA signatures over a pre-computed digest (JWS `RS*` and `PS*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RsaSignature {
    padding: RsaSignaturePadding,
    hash: ShaAlgorithm,
}

impl RsaSignature {
    pub const RS256: RsaSignature =
        RsaSignature::new(RsaSignaturePadding::Pkcs1v15, ShaAlgorithm::Sha256);
    pub const RS384: RsaSignature =
        RsaSignature::new(RsaSignaturePadding::Pkcs1v15, ShaAlgorithm::Sha384);
    pub const RS512: RsaSignature =
        RsaSignature::new(RsaSignaturePadding::Pkcs1v15, ShaAlgorithm::Sha512);
    pub const PS256: RsaSignature =
        RsaSignature::new(RsaSignaturePadding::Pss, ShaAlgorithm::Sha256);
    pub const PS384: RsaSignature =
        RsaSignature::new(RsaSignaturePadding::Pss, ShaAlgorithm::Sha384);
    pub const PS512: RsaSignature =
        RsaSignature::new(RsaSignaturePadding::Pss, ShaAlgorithm::Sha512);

    pub const fn new(padding: RsaSignaturePadding, hash: ShaAlgorithm) -> Self {
        Self { padding, hash }
    }

    pub fn name(&self) -> &'static str {
        match (self.padding, self.hash) {
            (RsaSignaturePadding::Pkcs1v15, ShaAlgorithm::Sha384) => "RS384",
            (RsaSignaturePadding::Pkcs1v15, ShaAlgorithm::Sha512) => "RS512",
            (RsaSignaturePadding::Pkcs1v15, _) => "RS256",
            (RsaSignaturePadding::Pss, ShaAlgorithm::Sha384) => "PS384",
            (RsaSignaturePadding::Pss, ShaAlgorithm::Sha512) => "PS512",
            (RsaSignaturePadding::Pss, _) => "PS256",
        }
    }

    pub fn padding(&self) -> RsaSignaturePadding {
        self.padding
    }

    pub fn hash_algorithm(&self) -> ShaAlgorithm {
        self.hash
    }

    pub fn digest_length(&self) -> usize {
        self.hash.output_len()
    }

    pub fn create_signature_transform(
        &self,
        key: &RsaKeyPair,
    ) -> Result<Box<dyn SignatureTransform>> {
        Ok(Box::new(RsaSignatureTransform {
            algorithm: *self,
            key: key.clone(),
        }))
    }
}

struct RsaSignatureTransform {
    algorithm: RsaSignature,
    key: RsaKeyPair,
}

impl RsaSignatureTransform {
    fn check_digest(&self, digest: &[u8]) -> Result<()> {
        if digest.len() != self.algorithm.digest_length() {
            return Err(CryptoError::InvalidInput(format!(
                "{} expects a {} byte digest, found {} bytes",
                self.algorithm.name(),
                self.algorithm.digest_length(),
                digest.len()
            )));
        }
        Ok(())
    }
}

impl SignatureTransform for RsaSignatureTransform {
    fn sign(&self, digest: &[u8]) -> Result<Vec<u8>> {
        self.check_digest(digest)?;
        let key = self.key.require_private("sign")?;
        let mut rng = rand::thread_rng();
        let salt_len = self.algorithm.digest_length();
        let result = match (self.algorithm.padding, self.algorithm.hash) {
            (RsaSignaturePadding::Pkcs1v15, ShaAlgorithm::Sha256) => {
                key.sign_with_rng(&mut rng, Pkcs1v15Sign::new::<Sha256>(), digest)
            },
            (RsaSignaturePadding::Pkcs1v15, ShaAlgorithm::Sha384) => {
                key.sign_with_rng(&mut rng, Pkcs1v15Sign::new::<Sha384>(), digest)
            },
            (RsaSignaturePadding::Pkcs1v15, ShaAlgorithm::Sha512) => {
                key.sign_with_rng(&mut rng, Pkcs1v15Sign::new::<Sha512>(), digest)
            },
            (RsaSignaturePadding::Pss, ShaAlgorithm::Sha256) => {
                key.sign_with_rng(&mut rng, Pss::new_with_salt::<Sha256>(salt_len), digest)
            },
            (RsaSignaturePadding::Pss, ShaAlgorithm::Sha384) => {
                key.sign_with_rng(&mut rng, Pss::new_with_salt::<Sha384>(salt_len), digest)
            },
            (RsaSignaturePadding::Pss, ShaAlgorithm::Sha512) => {
                key.sign_with_rng(&mut rng, Pss::new_with_salt::<Sha512>(salt_len), digest)
            },
            (_, ShaAlgorithm::Sha1) => {
                return Err(CryptoError::UnsupportedAlgorithm(
                    "RSA signatures over SHA-1".into(),
                ))
            },
        };
        result.map_err(|_| CryptoError::SigningFailed)
    }

    fn verify(&self, digest: &[u8], signature: &[u8]) -> Result<bool> {
        self.check_digest(digest)?;
        let key = self.key.require_public("verify")?;
        let salt_len = self.algorithm.digest_length();
        let result = match (self.algorithm.padding, self.algorithm.hash) {
            (RsaSignaturePadding::Pkcs1v15, ShaAlgorithm::Sha256) => {
                key.verify(Pkcs1v15Sign::new::<Sha256>(), digest, signature)
            },
            (RsaSignaturePadding::Pkcs1v15, ShaAlgorithm::Sha384) => {
                key.verify(Pkcs1v15Sign::new::<Sha384>(), digest, signature)
            },
            (RsaSignaturePadding::Pkcs1v15, ShaAlgorithm::Sha512) => {
                key.verify(Pkcs1v15Sign::new::<Sha512>(), digest, signature)
            },
            (RsaSignaturePadding::Pss, ShaAlgorithm::Sha256) => {
                key.verify(Pss::new_with_salt::<Sha256>(salt_len), digest, signature)
            },
            (RsaSignaturePadding::Pss, ShaAlgorithm::Sha384) => {
                key.verify(Pss::new_with_salt::<Sha384>(salt_len), digest, signature)
            },
            (RsaSignaturePadding::Pss, ShaAlgorithm::Sha512) => {
                key.verify(Pss::new_with_salt::<Sha512>(salt_len), digest, signature)
            },
            (_, ShaAlgorithm::Sha1) => {
                return Err(CryptoError::UnsupportedAlgorithm(
                    "RSA signatures over SHA-1".into(),
                ))
            },
        };
        Ok(result.is_ok())
    }
}
