// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
pub mod aes_cbc;
pub mod aes_cbc_hmac_sha2;
pub mod aes_kw;
pub mod algorithm;
pub mod ecdsa;
pub mod error;
pub mod hash;
pub mod macros;
pub mod registry;
pub mod rsa;
pub mod signature_der;
pub mod transform;

pub use algorithm::{Algorithm, SignatureAlgorithm, SymmetricEncryptionAlgorithm};
pub use error::{CryptoError, Result};
pub use registry::AlgorithmRegistry;
pub use transform::{CryptoTransform, SignatureTransform, TransformOutput};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
