// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use std::time::Duration;

use async_trait::async_trait;
use kvcrypt_client::{
    remote::RemoteResult, KeyMaterial, RemoteEncryptOutput, RemoteKeyService, RemoteServiceError,
};
use kvcrypt_jwa::{
    ecdsa::{EcCurve, EcKeyPair},
    rsa::RsaKeyPair,
};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

/// Prefix of the signatures produced by [`MockRemoteKeyService`].
pub const REMOTE_SIGNATURE_PREFIX: &[u8] = b"remote-signature:";

/// Prefix of the authentication tags produced by [`MockRemoteKeyService`].
pub const REMOTE_TAG_PREFIX: &[u8] = b"remote-tag:";

/// Installs a test writer subscriber once. Honors `RUST_LOG`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    GetKey,
    Encrypt { algorithm: String },
    Decrypt { algorithm: String },
    Sign { algorithm: String },
    Verify { algorithm: String },
    WrapKey { algorithm: String },
    UnwrapKey { algorithm: String },
}

/// In-memory remote key service that records every call.
///
/// Operations are reversible stand-ins: encrypt and wrap reverse the input bytes,
/// decrypt and unwrap reverse them back, and signatures are
/// [`REMOTE_SIGNATURE_PREFIX`] followed by the digest. Encryption with an `*-HS*`
/// algorithm returns [`REMOTE_TAG_PREFIX`] followed by the cipher text as its tag, and
/// decryption checks it.
pub struct MockRemoteKeyService {
    key_id: Option<String>,
    key: RemoteResult<KeyMaterial>,
    fetch_delay: Option<Duration>,
    omit_tags: bool,
    failure: Mutex<Option<RemoteServiceError>>,
    calls: Mutex<Vec<RemoteCall>>,
}

impl MockRemoteKeyService {
    /// A service whose key material cannot be found.
    pub fn new(key_id: &str) -> Self {
        Self {
            key_id: Some(key_id.to_string()),
            key: Err(RemoteServiceError::NotFound(key_id.to_string())),
            fetch_delay: None,
            omit_tags: false,
            failure: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A service that returns `key` from `get_key`.
    pub fn with_key(key: KeyMaterial) -> Self {
        let key_id = key.id().unwrap_or("mock-key").to_string();
        Self {
            key: Ok(key),
            ..Self::new(&key_id)
        }
    }

    /// A service whose `get_key` fails with `error`.
    pub fn with_key_error(key_id: &str, error: RemoteServiceError) -> Self {
        Self {
            key: Err(error),
            ..Self::new(key_id)
        }
    }

    /// Delays `get_key` replies.
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    /// Drops authentication tags from encryption replies.
    pub fn without_authentication_tags(mut self) -> Self {
        self.omit_tags = true;
        self
    }

    /// Makes every later operation, `get_key` excluded, fail with `error`.
    pub fn fail_operations_with(&self, error: RemoteServiceError) {
        *self.failure.lock() = Some(error);
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().clone()
    }

    /// Recorded calls other than `get_key`.
    pub fn operation_calls(&self) -> Vec<RemoteCall> {
        self.calls
            .lock()
            .iter()
            .filter(|call| **call != RemoteCall::GetKey)
            .cloned()
            .collect()
    }

    pub fn get_key_calls(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| **call == RemoteCall::GetKey)
            .count()
    }

    fn record(&self, call: RemoteCall) -> RemoteResult<()> {
        self.calls.lock().push(call);
        match self.failure.lock().as_ref() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

fn reversed(data: &[u8]) -> Vec<u8> {
    data.iter().rev().copied().collect()
}

fn remote_signature(digest: &[u8]) -> Vec<u8> {
    [REMOTE_SIGNATURE_PREFIX, digest].concat()
}

fn remote_tag(cipher_text: &[u8]) -> Vec<u8> {
    [REMOTE_TAG_PREFIX, cipher_text].concat()
}

fn is_authenticated(algorithm: &str) -> bool {
    algorithm.to_ascii_uppercase().contains("-HS")
}

#[async_trait]
impl RemoteKeyService for MockRemoteKeyService {
    fn key_id(&self) -> Option<String> {
        self.key_id.clone()
    }

    async fn get_key(&self) -> RemoteResult<KeyMaterial> {
        self.calls.lock().push(RemoteCall::GetKey);
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        self.key.clone()
    }

    async fn encrypt(
        &self,
        algorithm: &str,
        plain_text: &[u8],
        iv: Option<&[u8]>,
        _aad: Option<&[u8]>,
    ) -> RemoteResult<RemoteEncryptOutput> {
        self.record(RemoteCall::Encrypt {
            algorithm: algorithm.to_string(),
        })?;
        let cipher_text = reversed(plain_text);
        let authentication_tag = (is_authenticated(algorithm) && !self.omit_tags)
            .then(|| remote_tag(&cipher_text));
        Ok(RemoteEncryptOutput {
            cipher_text,
            iv: iv.map(<[u8]>::to_vec),
            authentication_tag,
        })
    }

    async fn decrypt(
        &self,
        algorithm: &str,
        cipher_text: &[u8],
        _iv: Option<&[u8]>,
        _aad: Option<&[u8]>,
        tag: Option<&[u8]>,
    ) -> RemoteResult<Vec<u8>> {
        self.record(RemoteCall::Decrypt {
            algorithm: algorithm.to_string(),
        })?;
        if is_authenticated(algorithm) && tag != Some(remote_tag(cipher_text).as_slice()) {
            return Err(RemoteServiceError::MalformedRequest(
                "authentication tag mismatch".into(),
            ));
        }
        Ok(reversed(cipher_text))
    }

    async fn sign(&self, algorithm: &str, digest: &[u8]) -> RemoteResult<Vec<u8>> {
        self.record(RemoteCall::Sign {
            algorithm: algorithm.to_string(),
        })?;
        Ok(remote_signature(digest))
    }

    async fn verify(
        &self,
        algorithm: &str,
        digest: &[u8],
        signature: &[u8],
    ) -> RemoteResult<bool> {
        self.record(RemoteCall::Verify {
            algorithm: algorithm.to_string(),
        })?;
        Ok(signature == remote_signature(digest).as_slice())
    }

    async fn wrap_key(&self, algorithm: &str, key: &[u8]) -> RemoteResult<Vec<u8>> {
        self.record(RemoteCall::WrapKey {
            algorithm: algorithm.to_string(),
        })?;
        Ok(reversed(key))
    }

    async fn unwrap_key(&self, algorithm: &str, encrypted_key: &[u8]) -> RemoteResult<Vec<u8>> {
        self.record(RemoteCall::UnwrapKey {
            algorithm: algorithm.to_string(),
        })?;
        Ok(reversed(encrypted_key))
    }
}

static RSA_KEY_PAIR: Lazy<RsaKeyPair> = Lazy::new(|| {
    RsaKeyPair::generate(2048).unwrap_or_else(|err| panic!("RSA key generation failed: {err}"))
});

/// A 2048-bit RSA key pair, generated once per test binary.
pub fn rsa_key_pair() -> RsaKeyPair {
    RSA_KEY_PAIR.clone()
}

/// An `RSA` key permitting every operation.
pub fn rsa_key(id: &str) -> KeyMaterial {
    KeyMaterial::rsa(Some(id.to_string()), rsa_key_pair())
        .unwrap_or_else(|err| panic!("invalid RSA fixture: {err}"))
}

/// An `oct` key of `len` bytes with content `0, 1, 2, ...`.
pub fn symmetric_key(id: &str, len: usize) -> KeyMaterial {
    let bytes: Vec<u8> = (0..len).map(|i| i as u8).collect();
    KeyMaterial::symmetric(Some(id.to_string()), bytes)
        .unwrap_or_else(|err| panic!("invalid symmetric fixture: {err}"))
}

/// An `EC` key on `curve` permitting sign and verify.
pub fn ec_key(id: &str, curve: EcCurve) -> KeyMaterial {
    let key = EcKeyPair::generate(curve)
        .unwrap_or_else(|err| panic!("EC key generation failed: {err}"));
    KeyMaterial::ec(Some(id.to_string()), key)
        .unwrap_or_else(|err| panic!("invalid EC fixture: {err}"))
}
