// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
//! Clients that run operations with local key material, one per key family.
use std::sync::Arc;

use async_trait::async_trait;
use kvcrypt_jwa::{aes_kw::KeyWrapProvider, hash::signature_hash_algorithm, AlgorithmRegistry};

use crate::{
    dispatch::Dispatcher,
    error::{CryptographyError, Result},
    key::{KeyFamily, KeyMaterial, KeyOperation},
    remote::RemoteCryptographyClient,
    results::{
        DecryptParameters, DecryptResult, EncryptParameters, EncryptResult, KeyUnwrapResult,
        KeyWrapResult, SignResult, VerifyResult,
    },
};

mod ec;
mod rsa;
mod symmetric;

pub use ec::EcKeyCryptographyClient;
pub use rsa::RsaKeyCryptographyClient;
pub use symmetric::SymmetricKeyCryptographyClient;

#[async_trait]
pub trait LocalKeyCryptographyClient: Send + Sync {
    async fn encrypt(&self, parameters: EncryptParameters) -> Result<EncryptResult>;

    async fn decrypt(&self, parameters: DecryptParameters) -> Result<DecryptResult>;

    /// Signs a pre-computed digest.
    async fn sign(&self, algorithm: &str, digest: &[u8]) -> Result<SignResult>;

    async fn verify(&self, algorithm: &str, digest: &[u8], signature: &[u8])
        -> Result<VerifyResult>;

    async fn wrap_key(&self, algorithm: &str, key: &[u8]) -> Result<KeyWrapResult>;

    async fn unwrap_key(&self, algorithm: &str, encrypted_key: &[u8]) -> Result<KeyUnwrapResult>;

    /// Hashes `data` with the digest of `algorithm`, then signs it.
    async fn sign_data(&self, algorithm: &str, data: &[u8]) -> Result<SignResult> {
        let digest = digest_data(KeyOperation::Sign, algorithm, data)?;
        self.sign(algorithm, &digest).await
    }

    async fn verify_data(
        &self,
        algorithm: &str,
        data: &[u8],
        signature: &[u8],
    ) -> Result<VerifyResult> {
        let digest = digest_data(KeyOperation::Verify, algorithm, data)?;
        self.verify(algorithm, &digest, signature).await
    }
}

/// Hashes `data` with the digest of the signature `algorithm`.
///
/// Only digests are sent to a remote service, so an algorithm without a known digest
/// cannot be served anywhere.
pub(crate) fn digest_data(
    operation: KeyOperation,
    algorithm: &str,
    data: &[u8],
) -> Result<Vec<u8>> {
    let hash = signature_hash_algorithm(algorithm).map_err(|_| {
        CryptographyError::UnsupportedAlgorithm {
            algorithm: algorithm.to_string(),
            operation,
        }
    })?;
    Ok(hash.digest(data))
}

/// What a local client needs besides its key.
#[derive(Clone)]
pub struct LocalContext {
    pub key: Arc<KeyMaterial>,
    pub registry: Arc<AlgorithmRegistry>,
    pub key_wrap_provider: KeyWrapProvider,
    pub remote: Option<RemoteCryptographyClient>,
}

impl LocalContext {
    fn dispatcher(&self) -> Dispatcher<'_> {
        Dispatcher::new(&self.registry, self.remote.is_some())
    }

    fn remote(&self) -> Result<&RemoteCryptographyClient> {
        self.remote.as_ref().ok_or_else(|| {
            CryptographyError::InvalidKeyMaterial("no remote key service is configured".into())
        })
    }

    /// Identifier reported in local results.
    fn key_id(&self) -> Option<String> {
        self.key
            .id()
            .map(str::to_string)
            .or_else(|| self.remote.as_ref().and_then(|remote| remote.service().key_id()))
    }

    fn unsupported(&self, operation: KeyOperation) -> CryptographyError {
        CryptographyError::UnsupportedForKeyType {
            operation,
            key_type: self.key.key_type(),
        }
    }
}

/// Builds the client matching the family of the context's key.
pub fn local_client(context: LocalContext) -> Result<Box<dyn LocalKeyCryptographyClient>> {
    Ok(match context.key.value().family() {
        KeyFamily::Rsa => Box::new(RsaKeyCryptographyClient::new(context)?),
        KeyFamily::Ec => Box::new(EcKeyCryptographyClient::new(context)?),
        KeyFamily::Symmetric => Box::new(SymmetricKeyCryptographyClient::new(context)?),
    })
}
