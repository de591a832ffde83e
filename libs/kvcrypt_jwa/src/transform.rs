// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use crate::error::Result;

/// Bytes produced by a [`CryptoTransform`].
///
/// `tag` is only populated by the encryptor of an authenticated algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    pub data: Vec<u8>,
    pub tag: Option<Vec<u8>>,
}

impl TransformOutput {
    pub(crate) fn untagged(data: Vec<u8>) -> Self {
        Self { data, tag: None }
    }
}

/// A single-use cipher bound to one key, IV and AAD.
///
/// The transform is consumed by [`CryptoTransform::do_final`], so one instance can
/// never process two messages.
pub trait CryptoTransform: Send {
    fn do_final(self: Box<Self>, data: &[u8]) -> Result<TransformOutput>;

    /// Expected authentication tag of an authenticated decryptor.
    fn tag(&self) -> Option<&[u8]> {
        None
    }
}

/// Signs and verifies pre-computed digests with one key pair.
pub trait SignatureTransform: Send {
    fn sign(&self, digest: &[u8]) -> Result<Vec<u8>>;

    /// Returns `Ok(false)` for signatures that are malformed or do not match.
    fn verify(&self, digest: &[u8], signature: &[u8]) -> Result<bool>;
}
