// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

/// Inputs of an encrypt operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptParameters {
    pub algorithm: String,
    pub plain_text: Vec<u8>,
    /// Generated for local symmetric encryption when absent.
    pub iv: Option<Vec<u8>>,
    pub additional_authenticated_data: Option<Vec<u8>>,
}

impl EncryptParameters {
    pub fn new(algorithm: impl Into<String>, plain_text: impl Into<Vec<u8>>) -> Self {
        Self {
            algorithm: algorithm.into(),
            plain_text: plain_text.into(),
            iv: None,
            additional_authenticated_data: None,
        }
    }

    pub fn with_iv(mut self, iv: impl Into<Vec<u8>>) -> Self {
        self.iv = Some(iv.into());
        self
    }

    pub fn with_aad(mut self, aad: impl Into<Vec<u8>>) -> Self {
        self.additional_authenticated_data = Some(aad.into());
        self
    }
}

/// Inputs of a decrypt operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptParameters {
    pub algorithm: String,
    pub cipher_text: Vec<u8>,
    pub iv: Option<Vec<u8>>,
    pub additional_authenticated_data: Option<Vec<u8>>,
    pub authentication_tag: Option<Vec<u8>>,
}

impl DecryptParameters {
    pub fn new(algorithm: impl Into<String>, cipher_text: impl Into<Vec<u8>>) -> Self {
        Self {
            algorithm: algorithm.into(),
            cipher_text: cipher_text.into(),
            iv: None,
            additional_authenticated_data: None,
            authentication_tag: None,
        }
    }

    pub fn with_iv(mut self, iv: impl Into<Vec<u8>>) -> Self {
        self.iv = Some(iv.into());
        self
    }

    pub fn with_aad(mut self, aad: impl Into<Vec<u8>>) -> Self {
        self.additional_authenticated_data = Some(aad.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<Vec<u8>>) -> Self {
        self.authentication_tag = Some(tag.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptResult {
    pub cipher_text: Vec<u8>,
    pub algorithm: String,
    pub key_id: Option<String>,
    pub iv: Option<Vec<u8>>,
    pub additional_authenticated_data: Option<Vec<u8>>,
    pub authentication_tag: Option<Vec<u8>>,
}

impl EncryptResult {
    /// Parameters that decrypt this result.
    pub fn to_decrypt_parameters(&self) -> DecryptParameters {
        DecryptParameters {
            algorithm: self.algorithm.clone(),
            cipher_text: self.cipher_text.clone(),
            iv: self.iv.clone(),
            additional_authenticated_data: self.additional_authenticated_data.clone(),
            authentication_tag: self.authentication_tag.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptResult {
    pub plain_text: Vec<u8>,
    pub algorithm: String,
    pub key_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignResult {
    pub signature: Vec<u8>,
    pub algorithm: String,
    pub key_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyResult {
    pub is_valid: bool,
    pub algorithm: String,
    pub key_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyWrapResult {
    pub encrypted_key: Vec<u8>,
    pub algorithm: String,
    pub key_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyUnwrapResult {
    pub key: Vec<u8>,
    pub algorithm: String,
    pub key_id: Option<String>,
}
