// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
//! Decides whether an operation runs locally or on the remote key service.
use kvcrypt_jwa::{Algorithm, AlgorithmRegistry, CryptoError};
use tracing::trace;

use crate::{
    error::{CryptographyError, Result},
    key::KeyOperation,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<T> {
    Local(T),
    Delegate,
}

/// Part of the key an operation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPortion {
    Public,
    Private,
    Symmetric,
}

impl KeyPortion {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyPortion::Public => "public",
            KeyPortion::Private => "private",
            KeyPortion::Symmetric => "symmetric",
        }
    }
}

pub struct Dispatcher<'a> {
    registry: &'a AlgorithmRegistry,
    remote_available: bool,
}

impl<'a> Dispatcher<'a> {
    pub fn new(registry: &'a AlgorithmRegistry, remote_available: bool) -> Self {
        Self {
            registry,
            remote_available,
        }
    }

    /// Routes `operation` for `algorithm`.
    ///
    /// `capability` narrows the resolved algorithm to the kind the key family can run,
    /// returning `None` when it cannot. An algorithm that is unknown or of the wrong
    /// kind, and a key missing the needed portion, are delegated when a remote service
    /// is available and are errors otherwise.
    pub fn route<T>(
        &self,
        operation: KeyOperation,
        algorithm: &str,
        capability: impl FnOnce(Algorithm) -> Option<T>,
        portion: KeyPortion,
        portion_available: bool,
    ) -> Result<Route<T>> {
        let Some(local) = self.registry.resolve(algorithm).and_then(capability) else {
            if self.remote_available {
                trace!(algorithm, %operation, route = "remote", "no local implementation");
                return Ok(Route::Delegate);
            }
            return Err(CryptographyError::UnsupportedAlgorithm {
                algorithm: algorithm.to_string(),
                operation,
            });
        };

        if !portion_available {
            if self.remote_available {
                trace!(
                    algorithm,
                    %operation,
                    route = "remote",
                    portion = portion.as_str(),
                    "key portion not available locally"
                );
                return Ok(Route::Delegate);
            }
            return Err(CryptoError::InvalidKey(format!(
                "{} portion of the key is not available to {operation}",
                portion.as_str()
            ))
            .into());
        }

        trace!(algorithm, %operation, route = "local");
        Ok(Route::Local(local))
    }
}

#[cfg(test)]
mod tests {
    use kvcrypt_jwa::{aes_kw::AesKw, rsa::RsaEncryption};

    use super::*;

    fn asymmetric(algorithm: Algorithm) -> Option<RsaEncryption> {
        match algorithm {
            Algorithm::AsymmetricEncryption(alg) => Some(alg),
            _ => None,
        }
    }

    #[test]
    fn test_local_route() {
        let registry = AlgorithmRegistry::default();
        let dispatcher = Dispatcher::new(&registry, true);
        let route = dispatcher
            .route(KeyOperation::Encrypt, "rsa-oaep", asymmetric, KeyPortion::Public, true)
            .unwrap();
        assert_eq!(route, Route::Local(RsaEncryption::RSA_OAEP));
    }

    #[test]
    fn test_unknown_algorithm() {
        let registry = AlgorithmRegistry::default();
        let route = Dispatcher::new(&registry, true)
            .route(KeyOperation::Sign, "RSNULL", asymmetric, KeyPortion::Private, true)
            .unwrap();
        assert_eq!(route, Route::Delegate);

        let err = Dispatcher::new(&registry, false)
            .route(KeyOperation::Sign, "RSNULL", asymmetric, KeyPortion::Private, true)
            .unwrap_err();
        assert_eq!(
            err,
            CryptographyError::UnsupportedAlgorithm {
                algorithm: "RSNULL".into(),
                operation: KeyOperation::Sign
            }
        );
    }

    #[test]
    fn test_wrong_capability() {
        let registry = AlgorithmRegistry::default();
        assert_eq!(
            Dispatcher::new(&registry, true)
                .route(KeyOperation::Encrypt, "A128KW", asymmetric, KeyPortion::Public, true)
                .unwrap(),
            Route::Delegate
        );
        assert!(matches!(
            Dispatcher::new(&registry, false).route(
                KeyOperation::Encrypt,
                "A128KW",
                asymmetric,
                KeyPortion::Public,
                true
            ),
            Err(CryptographyError::UnsupportedAlgorithm { .. })
        ));
    }

    #[test]
    fn test_missing_key_portion() {
        let registry = AlgorithmRegistry::default();
        assert_eq!(
            Dispatcher::new(&registry, true)
                .route(KeyOperation::Decrypt, "RSA1_5", asymmetric, KeyPortion::Private, false)
                .unwrap(),
            Route::Delegate
        );

        let err = Dispatcher::new(&registry, false)
            .route(KeyOperation::Decrypt, "RSA1_5", asymmetric, KeyPortion::Private, false)
            .unwrap_err();
        assert_eq!(
            err,
            CryptographyError::Crypto(CryptoError::InvalidKey(
                "private portion of the key is not available to decrypt".into()
            ))
        );
    }

    #[test]
    fn test_unregistered_algorithm_is_delegated() {
        let registry = AlgorithmRegistry::default();
        registry.unregister("A256KW");
        let key_wrap = |algorithm: Algorithm| match algorithm {
            Algorithm::KeyWrap(alg) => Some(alg),
            _ => None,
        };
        let dispatcher = Dispatcher::new(&registry, true);
        assert_eq!(
            dispatcher
                .route(KeyOperation::WrapKey, "A256KW", key_wrap, KeyPortion::Symmetric, true)
                .unwrap(),
            Route::<AesKw>::Delegate
        );
        assert_eq!(
            dispatcher
                .route(KeyOperation::WrapKey, "A128KW", key_wrap, KeyPortion::Symmetric, true)
                .unwrap(),
            Route::Local(AesKw::A128KW)
        );
    }
}
