// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
//! Conversion between ASN.1 DER `ECDSA-Sig-Value` and the fixed-width `r || s` form
//! used by JWS.
use der::{asn1::UintRef, Decode, Encode, Sequence};

use crate::error::{CryptoError, Result};

#[derive(Sequence)]
struct EcdsaSigValue<'a> {
    r: UintRef<'a>,
    s: UintRef<'a>,
}

/// Decodes a DER signature into `r || s`, each left-padded with zeros to `coord_len`.
pub fn der_to_raw(der: &[u8], coord_len: usize) -> Result<Vec<u8>> {
    let value = EcdsaSigValue::from_der(der)
        .map_err(|e| CryptoError::InvalidInput(format!("malformed DER signature: {e}")))?;

    let mut raw = vec![0u8; coord_len * 2];
    for (component, out) in [value.r, value.s].iter().zip(raw.chunks_mut(coord_len)) {
        let bytes = component.as_bytes();
        if bytes.len() > coord_len {
            return Err(CryptoError::InvalidInput(format!(
                "signature component of {} bytes exceeds coordinate length {coord_len}",
                bytes.len()
            )));
        }
        out[coord_len - bytes.len()..].copy_from_slice(bytes);
    }
    Ok(raw)
}

/// Encodes a fixed-width `r || s` signature as DER.
pub fn raw_to_der(raw: &[u8], coord_len: usize) -> Result<Vec<u8>> {
    if raw.len() != coord_len * 2 {
        return Err(CryptoError::InvalidInput(format!(
            "raw signature must be {} bytes, found {} bytes",
            coord_len * 2,
            raw.len()
        )));
    }
    let (r, s) = raw.split_at(coord_len);
    let invalid = |e: der::Error| CryptoError::InvalidInput(e.to_string());
    let value = EcdsaSigValue {
        r: UintRef::new(r).map_err(invalid)?,
        s: UintRef::new(s).map_err(invalid)?,
    };
    value.to_der().map_err(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_components_are_padded() {
        // SEQUENCE { INTEGER 0x01, INTEGER 0x00ff }
        let der = [0x30, 0x07, 0x02, 0x01, 0x01, 0x02, 0x02, 0x00, 0xff];
        let raw = der_to_raw(&der, 4).unwrap();
        assert_eq!(raw, [0, 0, 0, 1, 0, 0, 0, 0xff]);
        assert_eq!(raw_to_der(&raw, 4).unwrap(), der);
    }

    #[test]
    fn test_high_bit_gets_leading_zero() {
        let raw = [0x80u8; 64];
        let der = raw_to_der(&raw, 32).unwrap();
        // 0x30 len 0x02 0x21 0x00 0x80 ...
        assert_eq!(der[0], 0x30);
        assert_eq!(&der[2..5], &[0x02, 0x21, 0x00]);
        assert_eq!(der_to_raw(&der, 32).unwrap(), raw);
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(
            der_to_raw(&[0x30, 0x01], 32),
            Err(CryptoError::InvalidInput(_))
        ));
        assert!(matches!(
            raw_to_der(&[1u8; 63], 32),
            Err(CryptoError::InvalidInput(_))
        ));
        // component longer than the coordinate
        let der = [0x30, 0x08, 0x02, 0x03, 0x01, 0x02, 0x03, 0x02, 0x01, 0x01];
        assert!(matches!(der_to_raw(&der, 2), Err(CryptoError::InvalidInput(_))));
    }
}
