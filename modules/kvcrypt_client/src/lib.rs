// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
pub mod client;
pub mod dispatch;
pub mod environment;
pub mod error;
pub mod key;
pub mod local;
pub mod options;
pub mod remote;
pub mod results;

pub use client::CryptographyClient;
pub use error::{CryptographyError, Result};
pub use key::{KeyMaterial, KeyOperation, KeyType, KeyValue, SymmetricKey};
pub use options::CryptographyClientOptions;
pub use remote::{RemoteEncryptOutput, RemoteKeyService, RemoteServiceError};
pub use results::{
    DecryptParameters, DecryptResult, EncryptParameters, EncryptResult, KeyUnwrapResult,
    KeyWrapResult, SignResult, VerifyResult,
};
