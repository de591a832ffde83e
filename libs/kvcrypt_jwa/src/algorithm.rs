// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use crate::{
    aes_cbc::AesCbc,
    aes_cbc_hmac_sha2::AesCbcHmacSha2,
    aes_kw::AesKw,
    ecdsa::Ecdsa,
    error::Result,
    hash::ShaAlgorithm,
    rsa::{RsaEncryption, RsaSignature},
    transform::CryptoTransform,
};

/// A named JWA algorithm, tagged by what it can do.
///
/// Every built-in constant has a distinct name, so equality is equality of names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    SymmetricEncryption(SymmetricEncryptionAlgorithm),
    AsymmetricEncryption(RsaEncryption),
    KeyWrap(AesKw),
    Signature(SignatureAlgorithm),
}

impl Algorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::SymmetricEncryption(alg) => alg.name(),
            Algorithm::AsymmetricEncryption(alg) => alg.name(),
            Algorithm::KeyWrap(alg) => alg.name(),
            Algorithm::Signature(alg) => alg.name(),
        }
    }

    /// Short description of the capability, used in log and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Algorithm::SymmetricEncryption(_) => "symmetric encryption",
            Algorithm::AsymmetricEncryption(_) => "asymmetric encryption",
            Algorithm::KeyWrap(_) => "key wrap",
            Algorithm::Signature(_) => "signature",
        }
    }

    /// Every algorithm with a local implementation.
    pub fn builtins() -> [Algorithm; 22] {
        use SignatureAlgorithm as Sig;
        use SymmetricEncryptionAlgorithm as Sym;
        [
            Algorithm::SymmetricEncryption(Sym::AesCbc(AesCbc::A128CBC)),
            Algorithm::SymmetricEncryption(Sym::AesCbc(AesCbc::A192CBC)),
            Algorithm::SymmetricEncryption(Sym::AesCbc(AesCbc::A256CBC)),
            Algorithm::SymmetricEncryption(Sym::AesCbcHmacSha2(AesCbcHmacSha2::A128CBC_HS256)),
            Algorithm::SymmetricEncryption(Sym::AesCbcHmacSha2(AesCbcHmacSha2::A192CBC_HS384)),
            Algorithm::SymmetricEncryption(Sym::AesCbcHmacSha2(AesCbcHmacSha2::A256CBC_HS512)),
            Algorithm::KeyWrap(AesKw::A128KW),
            Algorithm::KeyWrap(AesKw::A192KW),
            Algorithm::KeyWrap(AesKw::A256KW),
            Algorithm::AsymmetricEncryption(RsaEncryption::RSA1_5),
            Algorithm::AsymmetricEncryption(RsaEncryption::RSA_OAEP),
            Algorithm::AsymmetricEncryption(RsaEncryption::RSA_OAEP_256),
            Algorithm::Signature(Sig::Ecdsa(Ecdsa::ES256)),
            Algorithm::Signature(Sig::Ecdsa(Ecdsa::ES384)),
            Algorithm::Signature(Sig::Ecdsa(Ecdsa::ES512)),
            Algorithm::Signature(Sig::Ecdsa(Ecdsa::ES256K)),
            Algorithm::Signature(Sig::Rsa(RsaSignature::RS256)),
            Algorithm::Signature(Sig::Rsa(RsaSignature::RS384)),
            Algorithm::Signature(Sig::Rsa(RsaSignature::RS512)),
            Algorithm::Signature(Sig::Rsa(RsaSignature::PS256)),
            Algorithm::Signature(Sig::Rsa(RsaSignature::PS384)),
            Algorithm::Signature(Sig::Rsa(RsaSignature::PS512)),
        ]
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymmetricEncryptionAlgorithm {
    AesCbc(AesCbc),
    AesCbcHmacSha2(AesCbcHmacSha2),
}

impl SymmetricEncryptionAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            SymmetricEncryptionAlgorithm::AesCbc(alg) => alg.name(),
            SymmetricEncryptionAlgorithm::AesCbcHmacSha2(alg) => alg.name(),
        }
    }

    /// Whether encryption produces an authentication tag.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SymmetricEncryptionAlgorithm::AesCbcHmacSha2(_))
    }

    pub fn create_encryptor(
        &self,
        key: &[u8],
        iv: Option<&[u8]>,
        aad: Option<&[u8]>,
    ) -> Result<Box<dyn CryptoTransform>> {
        match self {
            SymmetricEncryptionAlgorithm::AesCbc(alg) => alg.create_encryptor(key, iv, aad),
            SymmetricEncryptionAlgorithm::AesCbcHmacSha2(alg) => {
                alg.create_encryptor(key, iv, aad)
            },
        }
    }

    pub fn create_decryptor(
        &self,
        key: &[u8],
        iv: Option<&[u8]>,
        aad: Option<&[u8]>,
        tag: Option<&[u8]>,
    ) -> Result<Box<dyn CryptoTransform>> {
        match self {
            SymmetricEncryptionAlgorithm::AesCbc(alg) => alg.create_decryptor(key, iv, aad, tag),
            SymmetricEncryptionAlgorithm::AesCbcHmacSha2(alg) => {
                alg.create_decryptor(key, iv, aad, tag)
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    Ecdsa(Ecdsa),
    Rsa(RsaSignature),
}

impl SignatureAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Ecdsa(alg) => alg.name(),
            SignatureAlgorithm::Rsa(alg) => alg.name(),
        }
    }

    pub fn hash_algorithm(&self) -> ShaAlgorithm {
        match self {
            SignatureAlgorithm::Ecdsa(alg) => alg.hash_algorithm(),
            SignatureAlgorithm::Rsa(alg) => alg.hash_algorithm(),
        }
    }

    pub fn digest_length(&self) -> usize {
        self.hash_algorithm().output_len()
    }

    pub fn as_ecdsa(&self) -> Option<&Ecdsa> {
        match self {
            SignatureAlgorithm::Ecdsa(alg) => Some(alg),
            SignatureAlgorithm::Rsa(_) => None,
        }
    }

    pub fn as_rsa(&self) -> Option<&RsaSignature> {
        match self {
            SignatureAlgorithm::Rsa(alg) => Some(alg),
            SignatureAlgorithm::Ecdsa(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::signature_hash_algorithm;

    #[test]
    fn test_builtin_names_are_unique() {
        let builtins = Algorithm::builtins();
        for (i, a) in builtins.iter().enumerate() {
            for b in &builtins[i + 1..] {
                assert_ne!(a.name(), b.name());
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_signature_hash_matches_resolver() {
        for alg in Algorithm::builtins() {
            if let Algorithm::Signature(sig) = alg {
                assert_eq!(
                    signature_hash_algorithm(sig.name()).unwrap(),
                    sig.hash_algorithm(),
                    "{}",
                    sig.name()
                );
            }
        }
    }

    #[test]
    fn test_authenticated_flag() {
        let authenticated: Vec<_> = Algorithm::builtins()
            .into_iter()
            .filter_map(|alg| match alg {
                Algorithm::SymmetricEncryption(sym) if sym.is_authenticated() => Some(sym.name()),
                _ => None,
            })
            .collect();
        assert_eq!(
            authenticated,
            ["A128CBC-HS256", "A192CBC-HS384", "A256CBC-HS512"]
        );
    }

    #[test]
    fn test_display_and_kind() {
        let alg = Algorithm::KeyWrap(AesKw::A256KW);
        assert_eq!(alg.to_string(), "A256KW");
        assert_eq!(alg.kind(), "key wrap");
    }
}
