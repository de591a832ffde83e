// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use std::fmt;

use kvcrypt_jwa::{ecdsa::EcKeyPair, rsa::RsaKeyPair, str_enum};

use crate::error::{CryptographyError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    Rsa,
    RsaHsm,
    Ec,
    EcHsm,
    Oct,
    OctHsm,
}

str_enum!(
    KeyType,
    Rsa => "RSA",
    RsaHsm => "RSA-HSM",
    Ec => "EC",
    EcHsm => "EC-HSM",
    Oct => "oct",
    OctHsm => "oct-HSM",
);

impl KeyType {
    pub fn family(&self) -> KeyFamily {
        match self {
            KeyType::Rsa | KeyType::RsaHsm => KeyFamily::Rsa,
            KeyType::Ec | KeyType::EcHsm => KeyFamily::Ec,
            KeyType::Oct | KeyType::OctHsm => KeyFamily::Symmetric,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyFamily {
    Rsa,
    Ec,
    Symmetric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyOperation {
    Encrypt,
    Decrypt,
    Sign,
    Verify,
    WrapKey,
    UnwrapKey,
}

str_enum!(
    KeyOperation,
    Encrypt => "encrypt",
    Decrypt => "decrypt",
    Sign => "sign",
    Verify => "verify",
    WrapKey => "wrapKey",
    UnwrapKey => "unwrapKey",
);

/// Raw bytes of an `oct` key.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey {
    bytes: Vec<u8>,
}

impl SymmetricKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bits", &(self.bytes.len() * 8))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyValue {
    Symmetric(SymmetricKey),
    Rsa(RsaKeyPair),
    Ec(EcKeyPair),
}

impl KeyValue {
    pub fn family(&self) -> KeyFamily {
        match self {
            KeyValue::Symmetric(_) => KeyFamily::Symmetric,
            KeyValue::Rsa(_) => KeyFamily::Rsa,
            KeyValue::Ec(_) => KeyFamily::Ec,
        }
    }
}

/// Key material used for local cryptography.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    id: Option<String>,
    key_type: KeyType,
    key_ops: Vec<KeyOperation>,
    value: KeyValue,
}

impl KeyMaterial {
    /// Validates that `value` belongs to the family of `key_type`.
    pub fn new(
        id: Option<String>,
        key_type: KeyType,
        key_ops: Vec<KeyOperation>,
        value: KeyValue,
    ) -> Result<Self> {
        if key_type.family() != value.family() {
            return Err(CryptographyError::InvalidKeyMaterial(format!(
                "key type {key_type} does not match the supplied {:?} key",
                value.family()
            )));
        }
        if let KeyValue::Symmetric(key) = &value {
            if key.is_empty() {
                return Err(CryptographyError::InvalidKeyMaterial(
                    "symmetric key is empty".into(),
                ));
            }
        }
        Ok(Self {
            id,
            key_type,
            key_ops,
            value,
        })
    }

    /// A symmetric `oct` key permitting every operation a symmetric key supports.
    pub fn symmetric(id: Option<String>, bytes: impl Into<Vec<u8>>) -> Result<Self> {
        Self::new(
            id,
            KeyType::Oct,
            vec![
                KeyOperation::Encrypt,
                KeyOperation::Decrypt,
                KeyOperation::WrapKey,
                KeyOperation::UnwrapKey,
            ],
            KeyValue::Symmetric(SymmetricKey::new(bytes)),
        )
    }

    /// An `RSA` key permitting every operation.
    pub fn rsa(id: Option<String>, key: RsaKeyPair) -> Result<Self> {
        Self::new(
            id,
            KeyType::Rsa,
            KeyOperation::VARIANTS.to_vec(),
            KeyValue::Rsa(key),
        )
    }

    /// An `EC` key permitting sign and verify.
    pub fn ec(id: Option<String>, key: EcKeyPair) -> Result<Self> {
        Self::new(
            id,
            KeyType::Ec,
            vec![KeyOperation::Sign, KeyOperation::Verify],
            KeyValue::Ec(key),
        )
    }

    /// Replaces the permitted operations.
    pub fn with_key_ops(mut self, key_ops: Vec<KeyOperation>) -> Self {
        self.key_ops = key_ops;
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn key_ops(&self) -> &[KeyOperation] {
        &self.key_ops
    }

    pub fn value(&self) -> &KeyValue {
        &self.value
    }

    /// An empty operation list permits nothing.
    pub fn is_operation_permitted(&self, operation: KeyOperation) -> bool {
        self.key_ops.contains(&operation)
    }
}

#[cfg(test)]
mod tests {
    use kvcrypt_jwa::ecdsa::EcCurve;

    use super::*;

    #[test]
    fn test_key_type_names() {
        assert_eq!(KeyType::try_from("oct-HSM"), Ok(KeyType::OctHsm));
        assert_eq!(KeyType::try_from("ec"), Ok(KeyType::Ec));
        assert_eq!(KeyType::RsaHsm.to_string(), "RSA-HSM");
        assert!(KeyType::try_from("okp").is_err());
        assert_eq!(KeyType::EcHsm.family(), KeyFamily::Ec);
    }

    #[test]
    fn test_key_operation_names() {
        assert_eq!(KeyOperation::try_from("wrapKey"), Ok(KeyOperation::WrapKey));
        assert_eq!(KeyOperation::UnwrapKey.as_str(), "unwrapKey");
        assert_eq!(KeyOperation::VARIANTS.len(), 6);
    }

    #[test]
    fn test_key_type_must_match_value() {
        let ec = EcKeyPair::generate(EcCurve::P256).unwrap();
        let err = KeyMaterial::new(None, KeyType::Rsa, vec![], KeyValue::Ec(ec)).unwrap_err();
        assert!(matches!(err, CryptographyError::InvalidKeyMaterial(_)));

        let err = KeyMaterial::symmetric(None, Vec::new()).unwrap_err();
        assert!(matches!(err, CryptographyError::InvalidKeyMaterial(_)));
    }

    #[test]
    fn test_permitted_operations() {
        let key = KeyMaterial::symmetric(Some("k1".into()), vec![1u8; 32]).unwrap();
        assert!(key.is_operation_permitted(KeyOperation::Encrypt));
        assert!(!key.is_operation_permitted(KeyOperation::Sign));
        assert_eq!(key.id(), Some("k1"));

        let key = key.with_key_ops(vec![]);
        for operation in KeyOperation::VARIANTS {
            assert!(!key.is_operation_permitted(*operation));
        }
    }

    #[test]
    fn test_debug_hides_key_bytes() {
        let key = SymmetricKey::new(vec![0xAB; 16]);
        assert_eq!(format!("{key:?}"), "SymmetricKey { bits: 128 }");
    }
}
