// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use std::sync::Arc;

use async_trait::async_trait;
use kvcrypt_jwa::{Algorithm, AlgorithmRegistry, CryptoError};
use thiserror::Error;
use tracing::{trace, warn};

use crate::{
    error::{CryptographyError, Result},
    key::KeyMaterial,
    results::{
        DecryptParameters, DecryptResult, EncryptParameters, EncryptResult, KeyUnwrapResult,
        KeyWrapResult, SignResult, VerifyResult,
    },
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteServiceError {
    #[error("Key not found: {0}")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Malformed request: {0}")]
    MalformedRequest(String),
    #[error("Transport error: {0}")]
    Transport(String),
}

pub type RemoteResult<T> = std::result::Result<T, RemoteServiceError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEncryptOutput {
    pub cipher_text: Vec<u8>,
    pub iv: Option<Vec<u8>>,
    pub authentication_tag: Option<Vec<u8>>,
}

/// A key held by a remote key management service.
///
/// Transport, retries and cancellation are the implementor's concern. Dropping a
/// returned future cancels the request.
#[async_trait]
pub trait RemoteKeyService: Send + Sync {
    /// Identifier reported in operation results.
    fn key_id(&self) -> Option<String>;

    async fn get_key(&self) -> RemoteResult<KeyMaterial>;

    async fn encrypt(
        &self,
        algorithm: &str,
        plain_text: &[u8],
        iv: Option<&[u8]>,
        aad: Option<&[u8]>,
    ) -> RemoteResult<RemoteEncryptOutput>;

    async fn decrypt(
        &self,
        algorithm: &str,
        cipher_text: &[u8],
        iv: Option<&[u8]>,
        aad: Option<&[u8]>,
        tag: Option<&[u8]>,
    ) -> RemoteResult<Vec<u8>>;

    async fn sign(&self, algorithm: &str, digest: &[u8]) -> RemoteResult<Vec<u8>>;

    async fn verify(&self, algorithm: &str, digest: &[u8], signature: &[u8])
        -> RemoteResult<bool>;

    async fn wrap_key(&self, algorithm: &str, key: &[u8]) -> RemoteResult<Vec<u8>>;

    async fn unwrap_key(&self, algorithm: &str, encrypted_key: &[u8]) -> RemoteResult<Vec<u8>>;
}

/// Runs operations on a [`RemoteKeyService`] and shapes the replies into results.
///
/// Encryption replies for registered algorithms are checked against the algorithm: an
/// authenticated algorithm must return a tag and any other must not.
#[derive(Clone)]
pub struct RemoteCryptographyClient {
    service: Arc<dyn RemoteKeyService>,
    registry: Arc<AlgorithmRegistry>,
}

impl RemoteCryptographyClient {
    pub fn new(service: Arc<dyn RemoteKeyService>, registry: Arc<AlgorithmRegistry>) -> Self {
        Self { service, registry }
    }

    pub fn service(&self) -> &Arc<dyn RemoteKeyService> {
        &self.service
    }

    /// `None` when the algorithm is not registered.
    fn is_authenticated(&self, algorithm: &str) -> Option<bool> {
        self.registry.resolve(algorithm).map(|algorithm| {
            matches!(algorithm, Algorithm::SymmetricEncryption(sym) if sym.is_authenticated())
        })
    }

    pub async fn encrypt(&self, parameters: EncryptParameters) -> Result<EncryptResult> {
        trace!(algorithm = %parameters.algorithm, "remote encrypt");
        let output = self
            .service
            .encrypt(
                &parameters.algorithm,
                &parameters.plain_text,
                parameters.iv.as_deref(),
                parameters.additional_authenticated_data.as_deref(),
            )
            .await?;

        let authenticated = self.is_authenticated(&parameters.algorithm);
        match (authenticated, output.authentication_tag.is_some()) {
            (Some(true), false) => {
                warn!(algorithm = %parameters.algorithm, "remote encrypt returned no tag");
                return Err(CryptographyError::InvalidRemoteResponse(format!(
                    "{} encryption returned no authentication tag",
                    parameters.algorithm
                )));
            },
            (Some(false), true) => {
                warn!(algorithm = %parameters.algorithm, "remote encrypt returned a tag");
                return Err(CryptographyError::InvalidRemoteResponse(format!(
                    "{} encryption returned an unexpected authentication tag",
                    parameters.algorithm
                )));
            },
            _ => {},
        }

        Ok(EncryptResult {
            cipher_text: output.cipher_text,
            algorithm: parameters.algorithm,
            key_id: self.service.key_id(),
            iv: output.iv.or(parameters.iv),
            additional_authenticated_data: parameters.additional_authenticated_data,
            authentication_tag: output.authentication_tag,
        })
    }

    pub async fn decrypt(&self, parameters: DecryptParameters) -> Result<DecryptResult> {
        trace!(algorithm = %parameters.algorithm, "remote decrypt");
        if self.is_authenticated(&parameters.algorithm) == Some(true)
            && parameters.authentication_tag.is_none()
        {
            return Err(CryptoError::MissingParameter("authentication tag").into());
        }
        let plain_text = self
            .service
            .decrypt(
                &parameters.algorithm,
                &parameters.cipher_text,
                parameters.iv.as_deref(),
                parameters.additional_authenticated_data.as_deref(),
                parameters.authentication_tag.as_deref(),
            )
            .await?;
        Ok(DecryptResult {
            plain_text,
            algorithm: parameters.algorithm,
            key_id: self.service.key_id(),
        })
    }

    pub async fn sign(&self, algorithm: &str, digest: &[u8]) -> Result<SignResult> {
        trace!(algorithm, "remote sign");
        let signature = self.service.sign(algorithm, digest).await?;
        Ok(SignResult {
            signature,
            algorithm: algorithm.to_string(),
            key_id: self.service.key_id(),
        })
    }

    pub async fn verify(
        &self,
        algorithm: &str,
        digest: &[u8],
        signature: &[u8],
    ) -> Result<VerifyResult> {
        trace!(algorithm, "remote verify");
        let is_valid = self.service.verify(algorithm, digest, signature).await?;
        Ok(VerifyResult {
            is_valid,
            algorithm: algorithm.to_string(),
            key_id: self.service.key_id(),
        })
    }

    pub async fn wrap_key(&self, algorithm: &str, key: &[u8]) -> Result<KeyWrapResult> {
        trace!(algorithm, "remote wrap key");
        let encrypted_key = self.service.wrap_key(algorithm, key).await?;
        Ok(KeyWrapResult {
            encrypted_key,
            algorithm: algorithm.to_string(),
            key_id: self.service.key_id(),
        })
    }

    pub async fn unwrap_key(
        &self,
        algorithm: &str,
        encrypted_key: &[u8],
    ) -> Result<KeyUnwrapResult> {
        trace!(algorithm, "remote unwrap key");
        let key = self.service.unwrap_key(algorithm, encrypted_key).await?;
        Ok(KeyUnwrapResult {
            key,
            algorithm: algorithm.to_string(),
            key_id: self.service.key_id(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replies to every encryption with a fixed tag, or none.
    struct FixedTagService {
        tag: Option<Vec<u8>>,
    }

    #[async_trait]
    impl RemoteKeyService for FixedTagService {
        fn key_id(&self) -> Option<String> {
            Some("fixed".into())
        }

        async fn get_key(&self) -> RemoteResult<KeyMaterial> {
            Err(RemoteServiceError::Forbidden("fixed".into()))
        }

        async fn encrypt(
            &self,
            _algorithm: &str,
            plain_text: &[u8],
            _iv: Option<&[u8]>,
            _aad: Option<&[u8]>,
        ) -> RemoteResult<RemoteEncryptOutput> {
            Ok(RemoteEncryptOutput {
                cipher_text: plain_text.to_vec(),
                iv: None,
                authentication_tag: self.tag.clone(),
            })
        }

        async fn decrypt(
            &self,
            _algorithm: &str,
            cipher_text: &[u8],
            _iv: Option<&[u8]>,
            _aad: Option<&[u8]>,
            _tag: Option<&[u8]>,
        ) -> RemoteResult<Vec<u8>> {
            Ok(cipher_text.to_vec())
        }

        async fn sign(&self, _algorithm: &str, digest: &[u8]) -> RemoteResult<Vec<u8>> {
            Ok(digest.to_vec())
        }

        async fn verify(
            &self,
            _algorithm: &str,
            _digest: &[u8],
            _signature: &[u8],
        ) -> RemoteResult<bool> {
            Ok(true)
        }

        async fn wrap_key(&self, _algorithm: &str, key: &[u8]) -> RemoteResult<Vec<u8>> {
            Ok(key.to_vec())
        }

        async fn unwrap_key(
            &self,
            _algorithm: &str,
            encrypted_key: &[u8],
        ) -> RemoteResult<Vec<u8>> {
            Ok(encrypted_key.to_vec())
        }
    }

    fn client(tag: Option<Vec<u8>>) -> RemoteCryptographyClient {
        RemoteCryptographyClient::new(
            Arc::new(FixedTagService { tag }),
            Arc::new(AlgorithmRegistry::default()),
        )
    }

    #[tokio::test]
    async fn test_authenticated_encryption_requires_tag() {
        let err = client(None)
            .encrypt(EncryptParameters::new("A128CBC-HS256", "data"))
            .await
            .unwrap_err();
        assert!(matches!(err, CryptographyError::InvalidRemoteResponse(_)));

        let result = client(Some(vec![7u8; 16]))
            .encrypt(EncryptParameters::new("a128cbc-hs256", "data"))
            .await
            .unwrap();
        assert_eq!(result.authentication_tag, Some(vec![7u8; 16]));
    }

    #[tokio::test]
    async fn test_unauthenticated_encryption_rejects_tag() {
        for algorithm in ["A256CBC", "RSA-OAEP"] {
            let err = client(Some(vec![7u8; 16]))
                .encrypt(EncryptParameters::new(algorithm, "data"))
                .await
                .unwrap_err();
            assert!(matches!(err, CryptographyError::InvalidRemoteResponse(_)), "{algorithm}");

            let result = client(None)
                .encrypt(EncryptParameters::new(algorithm, "data"))
                .await
                .unwrap();
            assert!(result.authentication_tag.is_none());
        }
    }

    #[tokio::test]
    async fn test_unregistered_algorithm_passes_through() {
        let result = client(Some(vec![1u8; 4]))
            .encrypt(EncryptParameters::new("RSNULL", "data"))
            .await
            .unwrap();
        assert_eq!(result.authentication_tag, Some(vec![1u8; 4]));
    }

    #[tokio::test]
    async fn test_authenticated_decryption_requires_tag() {
        let err = client(None)
            .decrypt(DecryptParameters::new("A192CBC-HS384", vec![1u8; 16]))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CryptographyError::Crypto(CryptoError::MissingParameter("authentication tag"))
        );
    }
}
