// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Data is not authentic")]
    AuthenticationFailed,
    #[error("Encryption failed")]
    EncryptionFailed,
    #[error("Decryption failed")]
    DecryptionFailed,
    #[error("Signing failed")]
    SigningFailed,
}

pub type Result<T> = std::result::Result<T, CryptoError>;

impl From<aes::cipher::InvalidLength> for CryptoError {
    fn from(_: aes::cipher::InvalidLength) -> Self {
        CryptoError::InvalidArgument("invalid key or iv length".into())
    }
}

pub(crate) fn key_too_short(
    algorithm: &str,
    required_bits: usize,
    actual_bits: usize,
) -> CryptoError {
    CryptoError::InvalidKey(format!(
        "{algorithm} requires a key of at least {required_bits} bits, found {actual_bits} bits"
    ))
}
