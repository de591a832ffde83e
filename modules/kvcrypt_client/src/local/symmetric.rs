// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use async_trait::async_trait;
use kvcrypt_jwa::{
    aes_cbc::AES_BLOCK_SIZE, aes_kw::AesKw, Algorithm, SymmetricEncryptionAlgorithm,
};
use rand::RngCore;

use super::{LocalContext, LocalKeyCryptographyClient};
use crate::{
    dispatch::{KeyPortion, Route},
    error::{CryptographyError, Result},
    key::{KeyOperation, KeyValue, SymmetricKey},
    results::{
        DecryptParameters, DecryptResult, EncryptParameters, EncryptResult, KeyUnwrapResult,
        KeyWrapResult, SignResult, VerifyResult,
    },
};

fn symmetric_encryption(algorithm: Algorithm) -> Option<SymmetricEncryptionAlgorithm> {
    match algorithm {
        Algorithm::SymmetricEncryption(alg) => Some(alg),
        _ => None,
    }
}

fn key_wrap(algorithm: Algorithm) -> Option<AesKw> {
    match algorithm {
        Algorithm::KeyWrap(alg) => Some(alg),
        _ => None,
    }
}

fn random_iv() -> Vec<u8> {
    let mut iv = vec![0u8; AES_BLOCK_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);
    iv
}

/// Runs `oct` keys locally. Sign and verify are never available for them.
pub struct SymmetricKeyCryptographyClient {
    context: LocalContext,
    key: SymmetricKey,
}

impl SymmetricKeyCryptographyClient {
    pub fn new(context: LocalContext) -> Result<Self> {
        let KeyValue::Symmetric(key) = context.key.value() else {
            return Err(CryptographyError::InvalidKeyMaterial(
                "a symmetric key is required".into(),
            ));
        };
        let key = key.clone();
        Ok(Self { context, key })
    }
}

#[async_trait]
impl LocalKeyCryptographyClient for SymmetricKeyCryptographyClient {
    async fn encrypt(&self, parameters: EncryptParameters) -> Result<EncryptResult> {
        let route = self.context.dispatcher().route(
            KeyOperation::Encrypt,
            &parameters.algorithm,
            symmetric_encryption,
            KeyPortion::Symmetric,
            true,
        )?;
        let algorithm = match route {
            Route::Local(algorithm) => algorithm,
            Route::Delegate => return self.context.remote()?.encrypt(parameters).await,
        };

        let iv = parameters.iv.unwrap_or_else(random_iv);
        let aad = parameters.additional_authenticated_data;
        let output = algorithm
            .create_encryptor(self.key.as_bytes(), Some(&iv), aad.as_deref())?
            .do_final(&parameters.plain_text)?;
        Ok(EncryptResult {
            cipher_text: output.data,
            algorithm: algorithm.name().to_string(),
            key_id: self.context.key_id(),
            iv: Some(iv),
            additional_authenticated_data: aad,
            authentication_tag: output.tag,
        })
    }

    async fn decrypt(&self, parameters: DecryptParameters) -> Result<DecryptResult> {
        let route = self.context.dispatcher().route(
            KeyOperation::Decrypt,
            &parameters.algorithm,
            symmetric_encryption,
            KeyPortion::Symmetric,
            true,
        )?;
        let algorithm = match route {
            Route::Local(algorithm) => algorithm,
            Route::Delegate => return self.context.remote()?.decrypt(parameters).await,
        };

        let output = algorithm
            .create_decryptor(
                self.key.as_bytes(),
                parameters.iv.as_deref(),
                parameters.additional_authenticated_data.as_deref(),
                parameters.authentication_tag.as_deref(),
            )?
            .do_final(&parameters.cipher_text)?;
        Ok(DecryptResult {
            plain_text: output.data,
            algorithm: algorithm.name().to_string(),
            key_id: self.context.key_id(),
        })
    }

    async fn sign(&self, _algorithm: &str, _digest: &[u8]) -> Result<SignResult> {
        Err(self.context.unsupported(KeyOperation::Sign))
    }

    async fn verify(
        &self,
        _algorithm: &str,
        _digest: &[u8],
        _signature: &[u8],
    ) -> Result<VerifyResult> {
        Err(self.context.unsupported(KeyOperation::Verify))
    }

    async fn wrap_key(&self, algorithm: &str, key: &[u8]) -> Result<KeyWrapResult> {
        let route = self.context.dispatcher().route(
            KeyOperation::WrapKey,
            algorithm,
            key_wrap,
            KeyPortion::Symmetric,
            true,
        )?;
        let kw = match route {
            Route::Local(kw) => kw,
            Route::Delegate => return self.context.remote()?.wrap_key(algorithm, key).await,
        };

        let output = kw
            .create_encryptor_with_provider(self.key.as_bytes(), self.context.key_wrap_provider)?
            .do_final(key)?;
        Ok(KeyWrapResult {
            encrypted_key: output.data,
            algorithm: kw.name().to_string(),
            key_id: self.context.key_id(),
        })
    }

    async fn unwrap_key(&self, algorithm: &str, encrypted_key: &[u8]) -> Result<KeyUnwrapResult> {
        let route = self.context.dispatcher().route(
            KeyOperation::UnwrapKey,
            algorithm,
            key_wrap,
            KeyPortion::Symmetric,
            true,
        )?;
        let kw = match route {
            Route::Local(kw) => kw,
            Route::Delegate => {
                return self
                    .context
                    .remote()?
                    .unwrap_key(algorithm, encrypted_key)
                    .await
            },
        };

        let output = kw
            .create_decryptor_with_provider(self.key.as_bytes(), self.context.key_wrap_provider)?
            .do_final(encrypted_key)?;
        Ok(KeyUnwrapResult {
            key: output.data,
            algorithm: kw.name().to_string(),
            key_id: self.context.key_id(),
        })
    }

    async fn sign_data(&self, _algorithm: &str, _data: &[u8]) -> Result<SignResult> {
        Err(self.context.unsupported(KeyOperation::Sign))
    }

    async fn verify_data(
        &self,
        _algorithm: &str,
        _data: &[u8],
        _signature: &[u8],
    ) -> Result<VerifyResult> {
        Err(self.context.unsupported(KeyOperation::Verify))
    }
}
