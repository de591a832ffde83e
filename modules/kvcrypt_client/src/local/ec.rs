// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use async_trait::async_trait;
use kvcrypt_jwa::{
    ecdsa::{EcKeyPair, Ecdsa},
    Algorithm, SignatureAlgorithm,
};

use super::{LocalContext, LocalKeyCryptographyClient};
use crate::{
    dispatch::{KeyPortion, Route},
    error::{CryptographyError, Result},
    key::{KeyOperation, KeyValue},
    results::{
        DecryptParameters, DecryptResult, EncryptParameters, EncryptResult, KeyUnwrapResult,
        KeyWrapResult, SignResult, VerifyResult,
    },
};

fn ecdsa(algorithm: Algorithm) -> Option<Ecdsa> {
    match algorithm {
        Algorithm::Signature(SignatureAlgorithm::Ecdsa(alg)) => Some(alg),
        _ => None,
    }
}

/// Runs `EC` and `EC-HSM` keys locally. Only sign and verify are available for them.
pub struct EcKeyCryptographyClient {
    context: LocalContext,
    key: EcKeyPair,
}

impl EcKeyCryptographyClient {
    pub fn new(context: LocalContext) -> Result<Self> {
        let KeyValue::Ec(key) = context.key.value() else {
            return Err(CryptographyError::InvalidKeyMaterial(
                "an EC key is required".into(),
            ));
        };
        let key = key.clone();
        Ok(Self { context, key })
    }
}

#[async_trait]
impl LocalKeyCryptographyClient for EcKeyCryptographyClient {
    async fn encrypt(&self, _parameters: EncryptParameters) -> Result<EncryptResult> {
        Err(self.context.unsupported(KeyOperation::Encrypt))
    }

    async fn decrypt(&self, _parameters: DecryptParameters) -> Result<DecryptResult> {
        Err(self.context.unsupported(KeyOperation::Decrypt))
    }

    async fn sign(&self, algorithm: &str, digest: &[u8]) -> Result<SignResult> {
        let route = self.context.dispatcher().route(
            KeyOperation::Sign,
            algorithm,
            ecdsa,
            KeyPortion::Private,
            self.key.has_private_key(),
        )?;
        let ecdsa = match route {
            Route::Local(ecdsa) => ecdsa,
            Route::Delegate => return self.context.remote()?.sign(algorithm, digest).await,
        };

        let signature = ecdsa.create_signature_transform(&self.key)?.sign(digest)?;
        Ok(SignResult {
            signature,
            algorithm: ecdsa.name().to_string(),
            key_id: self.context.key_id(),
        })
    }

    async fn verify(
        &self,
        algorithm: &str,
        digest: &[u8],
        signature: &[u8],
    ) -> Result<VerifyResult> {
        let route = self.context.dispatcher().route(
            KeyOperation::Verify,
            algorithm,
            ecdsa,
            KeyPortion::Public,
            self.key.public_key().is_some(),
        )?;
        let ecdsa = match route {
            Route::Local(ecdsa) => ecdsa,
            Route::Delegate => {
                return self
                    .context
                    .remote()?
                    .verify(algorithm, digest, signature)
                    .await
            },
        };

        let is_valid = ecdsa
            .create_signature_transform(&self.key)?
            .verify(digest, signature)?;
        Ok(VerifyResult {
            is_valid,
            algorithm: ecdsa.name().to_string(),
            key_id: self.context.key_id(),
        })
    }

    async fn wrap_key(&self, _algorithm: &str, _key: &[u8]) -> Result<KeyWrapResult> {
        Err(self.context.unsupported(KeyOperation::WrapKey))
    }

    async fn unwrap_key(&self, _algorithm: &str, _encrypted_key: &[u8]) -> Result<KeyUnwrapResult> {
        Err(self.context.unsupported(KeyOperation::UnwrapKey))
    }
}
