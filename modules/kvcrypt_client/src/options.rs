// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use std::sync::Arc;

use kvcrypt_jwa::{aes_kw::KeyWrapProvider, AlgorithmRegistry};

use crate::environment::LOCAL_CRYPTO_ENABLED;

#[derive(Debug, Clone)]
pub struct CryptographyClientOptions {
    /// Algorithms available for local execution.
    pub registry: Arc<AlgorithmRegistry>,
    /// When `false` and a remote key service is configured, every operation is
    /// delegated and the key material is never fetched.
    pub local_crypto: bool,
    pub key_wrap_provider: KeyWrapProvider,
}

impl Default for CryptographyClientOptions {
    fn default() -> Self {
        Self {
            registry: Arc::new(AlgorithmRegistry::default()),
            local_crypto: *LOCAL_CRYPTO_ENABLED,
            key_wrap_provider: KeyWrapProvider::default(),
        }
    }
}

impl CryptographyClientOptions {
    pub fn with_registry(mut self, registry: Arc<AlgorithmRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_local_crypto(mut self, local_crypto: bool) -> Self {
        self.local_crypto = local_crypto;
        self
    }

    pub fn with_key_wrap_provider(mut self, provider: KeyWrapProvider) -> Self {
        self.key_wrap_provider = provider;
        self
    }
}
