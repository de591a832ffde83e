// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use kvcrypt_jwa::CryptoError;
use thiserror::Error;

use crate::{
    key::{KeyOperation, KeyType},
    remote::RemoteServiceError,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptographyError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error("Operation '{0}' is not permitted for this key")]
    OperationNotPermitted(KeyOperation),
    #[error("Operation '{operation}' is not supported for {key_type} keys")]
    UnsupportedForKeyType {
        operation: KeyOperation,
        key_type: KeyType,
    },
    #[error("Algorithm '{algorithm}' is not supported for operation '{operation}'")]
    UnsupportedAlgorithm {
        algorithm: String,
        operation: KeyOperation,
    },
    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),
    #[error("Invalid response from the remote key service: {0}")]
    InvalidRemoteResponse(String),
    #[error(transparent)]
    Remote(#[from] RemoteServiceError),
}

pub type Result<T> = std::result::Result<T, CryptographyError>;
