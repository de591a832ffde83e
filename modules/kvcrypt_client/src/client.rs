// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::{
    error::{CryptographyError, Result},
    key::{KeyMaterial, KeyOperation},
    local::{digest_data, local_client, LocalContext, LocalKeyCryptographyClient},
    options::CryptographyClientOptions,
    remote::{RemoteCryptographyClient, RemoteKeyService, RemoteServiceError},
    results::{
        DecryptParameters, DecryptResult, EncryptParameters, EncryptResult, KeyUnwrapResult,
        KeyWrapResult, SignResult, VerifyResult,
    },
};

enum KeyState {
    Local {
        key: Arc<KeyMaterial>,
        client: Box<dyn LocalKeyCryptographyClient>,
    },
    /// Every operation goes to the remote service. `key` is only known when it was
    /// supplied while local cryptography was disabled.
    RemoteOnly { key: Option<Arc<KeyMaterial>> },
}

enum Target<'a> {
    Local(&'a dyn LocalKeyCryptographyClient),
    Remote(&'a RemoteCryptographyClient),
}

/// Performs key operations locally when the key material allows it and on the remote
/// key service otherwise.
///
/// Key material that was not supplied is fetched from the remote service on first use,
/// once. A key that may be used but not read switches the client to remote-only mode.
pub struct CryptographyClient {
    options: CryptographyClientOptions,
    remote: Option<RemoteCryptographyClient>,
    state: OnceCell<KeyState>,
}

impl CryptographyClient {
    /// A client for local key material only.
    pub fn from_key(key: KeyMaterial) -> Result<Self> {
        Self::with_options(Some(key), None, CryptographyClientOptions::default())
    }

    /// A client backed by a remote key service. The key material is fetched lazily.
    pub fn from_remote(service: Arc<dyn RemoteKeyService>) -> Result<Self> {
        Self::with_options(None, Some(service), CryptographyClientOptions::default())
    }

    pub fn with_options(
        key: Option<KeyMaterial>,
        service: Option<Arc<dyn RemoteKeyService>>,
        options: CryptographyClientOptions,
    ) -> Result<Self> {
        let remote = service
            .map(|service| RemoteCryptographyClient::new(service, options.registry.clone()));
        let mut client = Self {
            options,
            remote,
            state: OnceCell::new(),
        };

        let key = key.map(Arc::new);
        let state = match (key, client.remote.is_some()) {
            (None, false) => {
                return Err(CryptographyError::InvalidKeyMaterial(
                    "either key material or a remote key service is required".into(),
                ))
            },
            (key, true) if !client.options.local_crypto => {
                debug!("local cryptography is disabled");
                Some(KeyState::RemoteOnly { key })
            },
            (Some(key), _) => Some(client.local_state(key)?),
            (None, true) => None,
        };
        client.state = OnceCell::new_with(state);
        Ok(client)
    }

    fn local_state(&self, key: Arc<KeyMaterial>) -> Result<KeyState> {
        let client = local_client(LocalContext {
            key: key.clone(),
            registry: self.options.registry.clone(),
            key_wrap_provider: self.options.key_wrap_provider,
            remote: self.remote.clone(),
        })?;
        Ok(KeyState::Local { key, client })
    }

    async fn state(&self) -> Result<&KeyState> {
        self.state.get_or_try_init(|| self.fetch_state()).await
    }

    async fn fetch_state(&self) -> Result<KeyState> {
        let remote = self.remote()?;
        debug!(key_id = ?remote.service().key_id(), "fetching key material");
        match remote.service().get_key().await {
            Ok(key) => {
                debug!(key_type = %key.key_type(), "fetched key material");
                self.local_state(Arc::new(key))
            },
            Err(RemoteServiceError::Forbidden(reason)) => {
                warn!(%reason, "key material is not readable, using remote operations only");
                Ok(KeyState::RemoteOnly { key: None })
            },
            Err(err) => Err(err.into()),
        }
    }

    fn remote(&self) -> Result<&RemoteCryptographyClient> {
        self.remote.as_ref().ok_or_else(|| {
            CryptographyError::InvalidKeyMaterial("no remote key service is configured".into())
        })
    }

    async fn target(&self, operation: KeyOperation) -> Result<Target<'_>> {
        let (key, target) = match self.state().await? {
            KeyState::Local { key, client } => (Some(key), Target::Local(client.as_ref())),
            KeyState::RemoteOnly { key } => (key.as_ref(), Target::Remote(self.remote()?)),
        };
        if let Some(key) = key {
            if !key.is_operation_permitted(operation) {
                return Err(CryptographyError::OperationNotPermitted(operation));
            }
        }
        Ok(target)
    }

    /// Identifier of the key, if known without a fetch.
    pub fn key_id(&self) -> Option<String> {
        let known = match self.state.get() {
            Some(KeyState::Local { key, .. }) | Some(KeyState::RemoteOnly { key: Some(key) }) => {
                key.id().map(str::to_string)
            },
            _ => None,
        };
        known.or_else(|| self.remote.as_ref().and_then(|remote| remote.service().key_id()))
    }

    /// The key material, fetching it when needed. `None` in remote-only mode.
    pub async fn key(&self) -> Result<Option<Arc<KeyMaterial>>> {
        Ok(match self.state().await? {
            KeyState::Local { key, .. } => Some(key.clone()),
            KeyState::RemoteOnly { key } => key.clone(),
        })
    }

    pub async fn encrypt(&self, parameters: EncryptParameters) -> Result<EncryptResult> {
        match self.target(KeyOperation::Encrypt).await? {
            Target::Local(client) => client.encrypt(parameters).await,
            Target::Remote(remote) => remote.encrypt(parameters).await,
        }
    }

    pub async fn decrypt(&self, parameters: DecryptParameters) -> Result<DecryptResult> {
        match self.target(KeyOperation::Decrypt).await? {
            Target::Local(client) => client.decrypt(parameters).await,
            Target::Remote(remote) => remote.decrypt(parameters).await,
        }
    }

    /// Signs a pre-computed digest.
    pub async fn sign(&self, algorithm: &str, digest: &[u8]) -> Result<SignResult> {
        match self.target(KeyOperation::Sign).await? {
            Target::Local(client) => client.sign(algorithm, digest).await,
            Target::Remote(remote) => remote.sign(algorithm, digest).await,
        }
    }

    pub async fn verify(
        &self,
        algorithm: &str,
        digest: &[u8],
        signature: &[u8],
    ) -> Result<VerifyResult> {
        match self.target(KeyOperation::Verify).await? {
            Target::Local(client) => client.verify(algorithm, digest, signature).await,
            Target::Remote(remote) => remote.verify(algorithm, digest, signature).await,
        }
    }

    pub async fn wrap_key(&self, algorithm: &str, key: &[u8]) -> Result<KeyWrapResult> {
        match self.target(KeyOperation::WrapKey).await? {
            Target::Local(client) => client.wrap_key(algorithm, key).await,
            Target::Remote(remote) => remote.wrap_key(algorithm, key).await,
        }
    }

    pub async fn unwrap_key(
        &self,
        algorithm: &str,
        encrypted_key: &[u8],
    ) -> Result<KeyUnwrapResult> {
        match self.target(KeyOperation::UnwrapKey).await? {
            Target::Local(client) => client.unwrap_key(algorithm, encrypted_key).await,
            Target::Remote(remote) => remote.unwrap_key(algorithm, encrypted_key).await,
        }
    }

    /// Hashes `data` with the digest of `algorithm`, then signs it.
    pub async fn sign_data(&self, algorithm: &str, data: &[u8]) -> Result<SignResult> {
        match self.target(KeyOperation::Sign).await? {
            Target::Local(client) => client.sign_data(algorithm, data).await,
            Target::Remote(remote) => {
                let digest = digest_data(KeyOperation::Sign, algorithm, data)?;
                remote.sign(algorithm, &digest).await
            },
        }
    }

    pub async fn verify_data(
        &self,
        algorithm: &str,
        data: &[u8],
        signature: &[u8],
    ) -> Result<VerifyResult> {
        match self.target(KeyOperation::Verify).await? {
            Target::Local(client) => client.verify_data(algorithm, data, signature).await,
            Target::Remote(remote) => {
                let digest = digest_data(KeyOperation::Verify, algorithm, data)?;
                remote.verify(algorithm, &digest, signature).await
            },
        }
    }
}
