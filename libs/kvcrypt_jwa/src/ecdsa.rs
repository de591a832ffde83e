// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use std::fmt;

use ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier, RandomizedPrehashSigner};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use tracing::trace;

use crate::{
    error::{CryptoError, Result},
    hash::ShaAlgorithm,
    signature_der::{der_to_raw, raw_to_der},
    str_enum,
    transform::SignatureTransform,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EcCurve {
    P256,
    P384,
    P521,
    Secp256k1,
}

str_enum!(EcCurve, P256 => "P-256", P384 => "P-384", P521 => "P-521", Secp256k1 => "P-256K");

impl EcCurve {
    /// Byte length of one coordinate, and of each half of a raw signature.
    pub fn coordinate_length(&self) -> usize {
        match self {
            EcCurve::P256 | EcCurve::Secp256k1 => 32,
            EcCurve::P384 => 48,
            EcCurve::P521 => 66,
        }
    }

    /// Length of an uncompressed SEC1 point.
    pub fn public_key_length(&self) -> usize {
        1 + 2 * self.coordinate_length()
    }
}

/// An elliptic curve key. Either half may be absent, but not both.
///
/// The public key is kept as an uncompressed SEC1 point and the private key as the
/// big-endian scalar.
#[derive(Clone, PartialEq, Eq)]
pub struct EcKeyPair {
    curve: EcCurve,
    public: Option<Vec<u8>>,
    private: Option<Vec<u8>>,
}

impl EcKeyPair {
    pub fn new(curve: EcCurve, public: Option<&[u8]>, private: Option<&[u8]>) -> Result<Self> {
        match (public, private) {
            (None, None) => Err(CryptoError::InvalidKey(
                "an EC key needs a public or a private portion".into(),
            )),
            (public, Some(d)) => {
                let pair = Self::from_private_scalar(curve, d)?;
                if let Some(public) = public {
                    if Some(normalize_public(curve, public)?) != pair.public {
                        return Err(CryptoError::InvalidKey(
                            "public portion does not match the private portion".into(),
                        ));
                    }
                }
                Ok(pair)
            },
            (Some(public), None) => Self::from_public(curve, public),
        }
    }

    /// Builds a key pair from the private scalar, deriving the public point.
    pub fn from_private_scalar(curve: EcCurve, d: &[u8]) -> Result<Self> {
        let public = derive_public(curve, d)?;
        Ok(Self {
            curve,
            public: Some(public),
            private: Some(d.to_vec()),
        })
    }

    /// Builds a public-only key from a SEC1 point, compressed or not.
    pub fn from_public(curve: EcCurve, sec1: &[u8]) -> Result<Self> {
        Ok(Self {
            curve,
            public: Some(normalize_public(curve, sec1)?),
            private: None,
        })
    }

    /// Builds a key from JWK style `x`, `y` and optional `d` values.
    pub fn from_coordinates(curve: EcCurve, x: &[u8], y: &[u8], d: Option<&[u8]>) -> Result<Self> {
        let len = curve.coordinate_length();
        if x.len() > len || y.len() > len {
            return Err(CryptoError::InvalidKey(format!(
                "{curve} coordinates must be at most {len} bytes"
            )));
        }
        let mut point = vec![0u8; curve.public_key_length()];
        point[0] = 0x04;
        point[1 + len - x.len()..1 + len].copy_from_slice(x);
        point[1 + 2 * len - y.len()..].copy_from_slice(y);
        Self::new(curve, Some(&point), d)
    }

    /// Generates a random key pair on `curve`.
    pub fn generate(curve: EcCurve) -> Result<Self> {
        let mut rng = rand::thread_rng();
        let d = match curve {
            EcCurve::P256 => p256::SecretKey::random(&mut rng).to_bytes().to_vec(),
            EcCurve::P384 => p384::SecretKey::random(&mut rng).to_bytes().to_vec(),
            EcCurve::P521 => p521::SecretKey::random(&mut rng).to_bytes().to_vec(),
            EcCurve::Secp256k1 => {
                secp256k1::SecretKey::new(&mut rng).secret_bytes().to_vec()
            },
        };
        Self::from_private_scalar(curve, &d)
    }

    pub fn curve(&self) -> EcCurve {
        self.curve
    }

    pub fn public_key(&self) -> Option<&[u8]> {
        self.public.as_deref()
    }

    pub fn private_key(&self) -> Option<&[u8]> {
        self.private.as_deref()
    }

    pub fn has_private_key(&self) -> bool {
        self.private.is_some()
    }

    /// Drops the private half.
    pub fn to_public(&self) -> Self {
        Self {
            curve: self.curve,
            public: self.public.clone(),
            private: None,
        }
    }
}

impl fmt::Debug for EcKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcKeyPair")
            .field("curve", &self.curve)
            .field("public", &self.public.is_some())
            .field("private", &self.private.is_some())
            .finish()
    }
}

fn invalid_key<E>(_: E) -> CryptoError {
    CryptoError::InvalidKey("invalid EC key".into())
}

fn derive_public(curve: EcCurve, d: &[u8]) -> Result<Vec<u8>> {
    if d.len() != curve.coordinate_length() {
        return Err(CryptoError::InvalidKey(format!(
            "{curve} private key must be {} bytes, found {} bytes",
            curve.coordinate_length(),
            d.len()
        )));
    }
    let point = match curve {
        EcCurve::P256 => p256::SecretKey::from_slice(d)
            .map_err(invalid_key)?
            .public_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec(),
        EcCurve::P384 => p384::SecretKey::from_slice(d)
            .map_err(invalid_key)?
            .public_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec(),
        EcCurve::P521 => p521::SecretKey::from_slice(d)
            .map_err(invalid_key)?
            .public_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec(),
        EcCurve::Secp256k1 => {
            let secret = secp256k1::SecretKey::from_slice(d).map_err(invalid_key)?;
            secp256k1::PublicKey::from_secret_key(&secp256k1::Secp256k1::signing_only(), &secret)
                .serialize_uncompressed()
                .to_vec()
        },
    };
    Ok(point)
}

fn normalize_public(curve: EcCurve, sec1: &[u8]) -> Result<Vec<u8>> {
    let point = match curve {
        EcCurve::P256 => p256::PublicKey::from_sec1_bytes(sec1)
            .map_err(invalid_key)?
            .to_encoded_point(false)
            .as_bytes()
            .to_vec(),
        EcCurve::P384 => p384::PublicKey::from_sec1_bytes(sec1)
            .map_err(invalid_key)?
            .to_encoded_point(false)
            .as_bytes()
            .to_vec(),
        EcCurve::P521 => p521::PublicKey::from_sec1_bytes(sec1)
            .map_err(invalid_key)?
            .to_encoded_point(false)
            .as_bytes()
            .to_vec(),
        EcCurve::Secp256k1 => secp256k1::PublicKey::from_slice(sec1)
            .map_err(invalid_key)?
            .serialize_uncompressed()
            .to_vec(),
    };
    Ok(point)
}

/// ECDSA over a pre-computed digest (JWS `ES*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ecdsa {
    curve: EcCurve,
}

impl Ecdsa {
    pub const ES256: Ecdsa = Ecdsa::new(EcCurve::P256);
    pub const ES384: Ecdsa = Ecdsa::new(EcCurve::P384);
    pub const ES512: Ecdsa = Ecdsa::new(EcCurve::P521);
    pub const ES256K: Ecdsa = Ecdsa::new(EcCurve::Secp256k1);

    pub const fn new(curve: EcCurve) -> Self {
        Self { curve }
    }

    pub fn name(&self) -> &'static str {
        match self.curve {
            EcCurve::P256 => "ES256",
            EcCurve::P384 => "ES384",
            EcCurve::P521 => "ES512",
            EcCurve::Secp256k1 => "ES256K",
        }
    }

    pub fn curve(&self) -> EcCurve {
        self.curve
    }

    pub fn hash_algorithm(&self) -> ShaAlgorithm {
        match self.curve {
            EcCurve::P256 | EcCurve::Secp256k1 => ShaAlgorithm::Sha256,
            EcCurve::P384 => ShaAlgorithm::Sha384,
            EcCurve::P521 => ShaAlgorithm::Sha512,
        }
    }

    pub fn digest_length(&self) -> usize {
        self.hash_algorithm().output_len()
    }

    pub fn coordinate_length(&self) -> usize {
        self.curve.coordinate_length()
    }

    pub fn create_signature_transform(
        &self,
        key: &EcKeyPair,
    ) -> Result<Box<dyn SignatureTransform>> {
        if key.curve() != self.curve {
            return Err(CryptoError::InvalidKey(format!(
                "{} requires a {} key, found a {} key",
                self.name(),
                self.curve,
                key.curve()
            )));
        }
        Ok(Box::new(EcdsaSignatureTransform {
            algorithm: *self,
            key: key.clone(),
        }))
    }
}

struct EcdsaSignatureTransform {
    algorithm: Ecdsa,
    key: EcKeyPair,
}

impl EcdsaSignatureTransform {
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

impl SignatureTransform for EcdsaSignatureTransform {
    fn sign(&self, digest: &[u8]) -> Result<Vec<u8>> {
        self.check_digest(digest)?;
        let d = self.key.private_key().ok_or_else(|| {
            CryptoError::InvalidKey("private portion of the key is not available to sign".into())
        })?;
        let der = sign_der(self.key.curve(), d, digest)?;
        der_to_raw(&der, self.algorithm.coordinate_length())
    }

    fn verify(&self, digest: &[u8], signature: &[u8]) -> Result<bool> {
        self.check_digest(digest)?;
        let public = self.key.public_key().ok_or_else(|| {
            CryptoError::InvalidKey("public portion of the key is not available to verify".into())
        })?;
        let der = match raw_to_der(signature, self.algorithm.coordinate_length()) {
            Ok(der) => der,
            Err(err) => {
                trace!(algorithm = self.algorithm.name(), %err, "rejecting malformed signature");
                return Ok(false);
            },
        };
        verify_der(self.key.curve(), public, digest, &der)
    }
}

fn sign_der(curve: EcCurve, d: &[u8], digest: &[u8]) -> Result<Vec<u8>> {
    match curve {
        EcCurve::P256 => {
            let signing_key = p256::ecdsa::SigningKey::from_slice(d).map_err(invalid_key)?;
            let signature: p256::ecdsa::Signature = signing_key
                .sign_prehash(digest)
                .map_err(|_| CryptoError::SigningFailed)?;
            Ok(signature.to_der().as_bytes().to_vec())
        },
        EcCurve::P384 => {
            let signing_key = p384::ecdsa::SigningKey::from_slice(d).map_err(invalid_key)?;
            let signature: p384::ecdsa::Signature = signing_key
                .sign_prehash(digest)
                .map_err(|_| CryptoError::SigningFailed)?;
            Ok(signature.to_der().as_bytes().to_vec())
        },
        EcCurve::P521 => {
            // p521's signing key only exposes the randomized prehash signer.
            let signing_key = p521::ecdsa::SigningKey::from_slice(d).map_err(invalid_key)?;
            let signature: p521::ecdsa::Signature = signing_key
                .sign_prehash_with_rng(&mut rand::thread_rng(), digest)
                .map_err(|_| CryptoError::SigningFailed)?;
            Ok(signature.to_der().as_bytes().to_vec())
        },
        EcCurve::Secp256k1 => {
            let secret = secp256k1::SecretKey::from_slice(d).map_err(invalid_key)?;
            let message = secp256k1::Message::from_digest_slice(digest)
                .map_err(|e| CryptoError::InvalidInput(e.to_string()))?;
            let signature = secp256k1::Secp256k1::signing_only().sign_ecdsa(&message, &secret);
            Ok(signature.serialize_der().to_vec())
        },
    }
}

fn verify_der(curve: EcCurve, public: &[u8], digest: &[u8], der: &[u8]) -> Result<bool> {
    match curve {
        EcCurve::P256 => {
            let verifying_key =
                p256::ecdsa::VerifyingKey::from_sec1_bytes(public).map_err(invalid_key)?;
            let Ok(signature) = p256::ecdsa::Signature::from_der(der) else {
                return Ok(false);
            };
            Ok(verifying_key.verify_prehash(digest, &signature).is_ok())
        },
        EcCurve::P384 => {
            let verifying_key =
                p384::ecdsa::VerifyingKey::from_sec1_bytes(public).map_err(invalid_key)?;
            let Ok(signature) = p384::ecdsa::Signature::from_der(der) else {
                return Ok(false);
            };
            Ok(verifying_key.verify_prehash(digest, &signature).is_ok())
        },
        EcCurve::P521 => {
            let verifying_key =
                p521::ecdsa::VerifyingKey::from_sec1_bytes(public).map_err(invalid_key)?;
            let Ok(signature) = p521::ecdsa::Signature::from_der(der) else {
                return Ok(false);
            };
            Ok(verifying_key.verify_prehash(digest, &signature).is_ok())
        },
        EcCurve::Secp256k1 => {
            let public_key = secp256k1::PublicKey::from_slice(public).map_err(invalid_key)?;
            let Ok(mut signature) = secp256k1::ecdsa::Signature::from_der(der) else {
                return Ok(false);
            };
            signature.normalize_s();
            let message = secp256k1::Message::from_digest_slice(digest)
                .map_err(|e| CryptoError::InvalidInput(e.to_string()))?;
            Ok(secp256k1::Secp256k1::verification_only()
                .verify_ecdsa(&message, &signature, &public_key)
                .is_ok())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Ecdsa; 4] = [Ecdsa::ES256, Ecdsa::ES384, Ecdsa::ES512, Ecdsa::ES256K];

    #[test]
    fn test_sign_verify_all_curves() {
        for alg in ALL {
            let key = EcKeyPair::generate(alg.curve()).unwrap();
            let transform = alg.create_signature_transform(&key).unwrap();
            let digest = alg.hash_algorithm().digest(b"hello world");

            let signature = transform.sign(&digest).unwrap();
            assert_eq!(signature.len(), 2 * alg.coordinate_length(), "{}", alg.name());
            assert!(transform.verify(&digest, &signature).unwrap(), "{}", alg.name());

            let other = alg.hash_algorithm().digest(b"goodbye world");
            assert!(!transform.verify(&other, &signature).unwrap(), "{}", alg.name());

            let mut tampered = signature.clone();
            tampered[5] ^= 0x01;
            assert!(!transform.verify(&digest, &tampered).unwrap(), "{}", alg.name());
        }
    }

    #[test]
    fn test_es512_sign_verify() {
        let key = EcKeyPair::generate(EcCurve::P521).unwrap();
        let digest = ShaAlgorithm::Sha512.digest(b"payload");
        let signature = Ecdsa::ES512
            .create_signature_transform(&key)
            .unwrap()
            .sign(&digest)
            .unwrap();
        assert_eq!(signature.len(), 132);

        let verifier = Ecdsa::ES512
            .create_signature_transform(&key.to_public())
            .unwrap();
        assert!(verifier.verify(&digest, &signature).unwrap());
        assert!(!verifier
            .verify(&ShaAlgorithm::Sha512.digest(b"other"), &signature)
            .unwrap());
    }

    #[test]
    fn test_public_key_verifies() {
        for alg in ALL {
            let key = EcKeyPair::generate(alg.curve()).unwrap();
            let digest = alg.hash_algorithm().digest(b"data");
            let signature = alg
                .create_signature_transform(&key)
                .unwrap()
                .sign(&digest)
                .unwrap();

            let public = key.to_public();
            assert!(!public.has_private_key());
            let verifier = alg.create_signature_transform(&public).unwrap();
            assert!(verifier.verify(&digest, &signature).unwrap());
            assert!(matches!(
                verifier.sign(&digest),
                Err(CryptoError::InvalidKey(msg)) if msg.contains("private portion")
            ));
        }
    }

    #[test]
    fn test_wrong_digest_length() {
        for alg in ALL {
            let key = EcKeyPair::generate(alg.curve()).unwrap();
            let transform = alg.create_signature_transform(&key).unwrap();
            let digest = vec![1u8; alg.digest_length() + 1];
            assert!(matches!(transform.sign(&digest), Err(CryptoError::InvalidInput(_))));
            assert!(matches!(
                transform.verify(&digest[..alg.digest_length() - 1], &[0u8; 64]),
                Err(CryptoError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_malformed_signature_is_false() {
        let key = EcKeyPair::generate(EcCurve::P256).unwrap();
        let transform = Ecdsa::ES256.create_signature_transform(&key).unwrap();
        let digest = [7u8; 32];
        assert!(!transform.verify(&digest, &[]).unwrap());
        assert!(!transform.verify(&digest, &[0u8; 63]).unwrap());
        assert!(!transform.verify(&digest, &[0u8; 64]).unwrap());
        assert!(!transform.verify(&digest, &[0xffu8; 64]).unwrap());
    }

    #[test]
    fn test_curve_mismatch() {
        let key = EcKeyPair::generate(EcCurve::P384).unwrap();
        assert!(matches!(
            Ecdsa::ES256.create_signature_transform(&key),
            Err(CryptoError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_key_construction() {
        let key = EcKeyPair::generate(EcCurve::P256).unwrap();
        let public = key.public_key().unwrap();
        assert_eq!(public.len(), 65);
        assert_eq!(public[0], 0x04);

        let (x, y) = public[1..].split_at(32);
        let rebuilt =
            EcKeyPair::from_coordinates(EcCurve::P256, x, y, key.private_key()).unwrap();
        assert_eq!(rebuilt, key);

        let other = EcKeyPair::generate(EcCurve::P256).unwrap();
        assert!(matches!(
            EcKeyPair::new(EcCurve::P256, other.public_key(), key.private_key()),
            Err(CryptoError::InvalidKey(_))
        ));
        assert!(EcKeyPair::new(EcCurve::P256, None, None).is_err());
        assert!(EcKeyPair::from_public(EcCurve::P256, &[0x04; 65]).is_err());
        assert!(EcKeyPair::from_private_scalar(EcCurve::P521, &[1u8; 32]).is_err());
    }

    #[test]
    fn test_debug_hides_key_bytes() {
        let key = EcKeyPair::generate(EcCurve::Secp256k1).unwrap();
        let debug = format!("{key:?}");
        assert_eq!(debug, "EcKeyPair { curve: Secp256k1, public: true, private: true }");
    }

    #[test]
    fn test_curve_names() {
        assert_eq!(EcCurve::Secp256k1.as_str(), "P-256K");
        assert_eq!(EcCurve::try_from("p-521"), Ok(EcCurve::P521));
    }
}
