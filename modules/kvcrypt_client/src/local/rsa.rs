// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use async_trait::async_trait;
use kvcrypt_jwa::{
    rsa::{RsaEncryption, RsaKeyPair, RsaSignature},
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

fn asymmetric_encryption(algorithm: Algorithm) -> Option<RsaEncryption> {
    match algorithm {
        Algorithm::AsymmetricEncryption(alg) => Some(alg),
        _ => None,
    }
}

fn rsa_signature(algorithm: Algorithm) -> Option<RsaSignature> {
    match algorithm {
        Algorithm::Signature(SignatureAlgorithm::Rsa(alg)) => Some(alg),
        _ => None,
    }
}

/// Runs `RSA` and `RSA-HSM` keys locally.
pub struct RsaKeyCryptographyClient {
    context: LocalContext,
    key: RsaKeyPair,
}

impl RsaKeyCryptographyClient {
    pub fn new(context: LocalContext) -> Result<Self> {
        let KeyValue::Rsa(key) = context.key.value() else {
            return Err(CryptographyError::InvalidKeyMaterial(
                "an RSA key is required".into(),
            ));
        };
        let key = key.clone();
        Ok(Self { context, key })
    }

    fn route_encryption(
        &self,
        operation: KeyOperation,
        algorithm: &str,
    ) -> Result<Route<RsaEncryption>> {
        let (portion, available) = match operation {
            KeyOperation::Decrypt | KeyOperation::UnwrapKey => {
                (KeyPortion::Private, self.key.has_private_key())
            },
            _ => (KeyPortion::Public, self.key.public_key().is_some()),
        };
        self.context.dispatcher().route(
            operation,
            algorithm,
            asymmetric_encryption,
            portion,
            available,
        )
    }

    fn route_signature(
        &self,
        operation: KeyOperation,
        algorithm: &str,
    ) -> Result<Route<RsaSignature>> {
        let (portion, available) = match operation {
            KeyOperation::Sign => (KeyPortion::Private, self.key.has_private_key()),
            _ => (KeyPortion::Public, self.key.public_key().is_some()),
        };
        self.context
            .dispatcher()
            .route(operation, algorithm, rsa_signature, portion, available)
    }
}

#[async_trait]
impl LocalKeyCryptographyClient for RsaKeyCryptographyClient {
    async fn encrypt(&self, parameters: EncryptParameters) -> Result<EncryptResult> {
        let algorithm = match self.route_encryption(KeyOperation::Encrypt, &parameters.algorithm)? {
            Route::Local(algorithm) => algorithm,
            Route::Delegate => return self.context.remote()?.encrypt(parameters).await,
        };

        let output = algorithm
            .create_encryptor(
                &self.key,
                parameters.iv.as_deref(),
                parameters.additional_authenticated_data.as_deref(),
            )?
            .do_final(&parameters.plain_text)?;
        Ok(EncryptResult {
            cipher_text: output.data,
            algorithm: algorithm.name().to_string(),
            key_id: self.context.key_id(),
            iv: None,
            additional_authenticated_data: None,
            authentication_tag: None,
        })
    }

    async fn decrypt(&self, parameters: DecryptParameters) -> Result<DecryptResult> {
        let algorithm = match self.route_encryption(KeyOperation::Decrypt, &parameters.algorithm)? {
            Route::Local(algorithm) => algorithm,
            Route::Delegate => return self.context.remote()?.decrypt(parameters).await,
        };

        let output = algorithm
            .create_decryptor(
                &self.key,
                parameters.iv.as_deref(),
                parameters.additional_authenticated_data.as_deref(),
            )?
            .do_final(&parameters.cipher_text)?;
        Ok(DecryptResult {
            plain_text: output.data,
            algorithm: algorithm.name().to_string(),
            key_id: self.context.key_id(),
        })
    }

    async fn sign(&self, algorithm: &str, digest: &[u8]) -> Result<SignResult> {
        let rsa = match self.route_signature(KeyOperation::Sign, algorithm)? {
            Route::Local(rsa) => rsa,
            Route::Delegate => return self.context.remote()?.sign(algorithm, digest).await,
        };

        let signature = rsa.create_signature_transform(&self.key)?.sign(digest)?;
        Ok(SignResult {
            signature,
            algorithm: rsa.name().to_string(),
            key_id: self.context.key_id(),
        })
    }

    async fn verify(
        &self,
        algorithm: &str,
        digest: &[u8],
        signature: &[u8],
    ) -> Result<VerifyResult> {
        let rsa = match self.route_signature(KeyOperation::Verify, algorithm)? {
            Route::Local(rsa) => rsa,
            Route::Delegate => {
                return self
                    .context
                    .remote()?
                    .verify(algorithm, digest, signature)
                    .await
            },
        };

        let is_valid = rsa
            .create_signature_transform(&self.key)?
            .verify(digest, signature)?;
        Ok(VerifyResult {
            is_valid,
            algorithm: rsa.name().to_string(),
            key_id: self.context.key_id(),
        })
    }

    async fn wrap_key(&self, algorithm: &str, key: &[u8]) -> Result<KeyWrapResult> {
        let rsa = match self.route_encryption(KeyOperation::WrapKey, algorithm)? {
            Route::Local(rsa) => rsa,
            Route::Delegate => return self.context.remote()?.wrap_key(algorithm, key).await,
        };

        let output = rsa
            .create_encryptor(&self.key, None, None)?
            .do_final(key)?;
        Ok(KeyWrapResult {
            encrypted_key: output.data,
            algorithm: rsa.name().to_string(),
            key_id: self.context.key_id(),
        })
    }

    async fn unwrap_key(&self, algorithm: &str, encrypted_key: &[u8]) -> Result<KeyUnwrapResult> {
        let rsa = match self.route_encryption(KeyOperation::UnwrapKey, algorithm)? {
            Route::Local(rsa) => rsa,
            Route::Delegate => {
                return self
                    .context
                    .remote()?
                    .unwrap_key(algorithm, encrypted_key)
                    .await
            },
        };

        let output = rsa
            .create_decryptor(&self.key, None, None)?
            .do_final(encrypted_key)?;
        Ok(KeyUnwrapResult {
            key: output.data,
            algorithm: rsa.name().to_string(),
            key_id: self.context.key_id(),
        })
    }
}
