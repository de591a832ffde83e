// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::{
    error::{CryptoError, Result},
    str_enum,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaAlgorithm {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

str_enum!(ShaAlgorithm, Sha1 => "SHA-1", Sha256 => "SHA-256", Sha384 => "SHA-384", Sha512 => "SHA-512");

impl ShaAlgorithm {
    pub fn output_len(&self) -> usize {
        match self {
            ShaAlgorithm::Sha1 => 20,
            ShaAlgorithm::Sha256 => 32,
            ShaAlgorithm::Sha384 => 48,
            ShaAlgorithm::Sha512 => 64,
        }
    }

    pub fn hasher(&self) -> ShaDigest {
        match self {
            ShaAlgorithm::Sha1 => ShaDigest::Sha1(Sha1::new()),
            ShaAlgorithm::Sha256 => ShaDigest::Sha256(Sha256::new()),
            ShaAlgorithm::Sha384 => ShaDigest::Sha384(Sha384::new()),
            ShaAlgorithm::Sha512 => ShaDigest::Sha512(Sha512::new()),
        }
    }

    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        let mut hasher = self.hasher();
        hasher.update(data);
        hasher.finalize()
    }
}

pub enum ShaDigest {
    Sha1(Sha1),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl ShaDigest {
    pub fn update(&mut self, data: &[u8]) {
        match self {
            ShaDigest::Sha1(h) => Digest::update(h, data),
            ShaDigest::Sha256(h) => Digest::update(h, data),
            ShaDigest::Sha384(h) => Digest::update(h, data),
            ShaDigest::Sha512(h) => Digest::update(h, data),
        }
    }

    pub fn finalize(self) -> Vec<u8> {
        match self {
            ShaDigest::Sha1(h) => h.finalize().to_vec(),
            ShaDigest::Sha256(h) => h.finalize().to_vec(),
            ShaDigest::Sha384(h) => h.finalize().to_vec(),
            ShaDigest::Sha512(h) => h.finalize().to_vec(),
        }
    }
}

/// Returns the digest a JWS signature algorithm signs over.
pub fn signature_hash_algorithm(signature_algorithm: &str) -> Result<ShaAlgorithm> {
    let hash = match signature_algorithm.to_ascii_uppercase().as_str() {
        "ES256" | "RS256" | "PS256" | "ES256K" => ShaAlgorithm::Sha256,
        "ES384" | "RS384" | "PS384" => ShaAlgorithm::Sha384,
        "ES512" | "RS512" | "PS512" => ShaAlgorithm::Sha512,
        _ => {
            return Err(CryptoError::UnsupportedAlgorithm(
                signature_algorithm.to_string(),
            ))
        },
    };
    Ok(hash)
}
