// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use std::env;

use once_cell::sync::Lazy;

/// Set to `0` or `false` to delegate every operation to the remote key service.
pub const ENV_KVCRYPT_LOCAL_CRYPTO: &str = "KVCRYPT_LOCAL_CRYPTO";

pub static LOCAL_CRYPTO_ENABLED: Lazy<bool> =
    Lazy::new(|| local_crypto_enabled(env::var(ENV_KVCRYPT_LOCAL_CRYPTO).ok().as_deref()));

fn local_crypto_enabled(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        Some(value) => !(value == "0" || value.eq_ignore_ascii_case("false")),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_crypto_flag() {
        assert!(local_crypto_enabled(None));
        assert!(local_crypto_enabled(Some("1")));
        assert!(local_crypto_enabled(Some("true")));
        assert!(!local_crypto_enabled(Some("0")));
        assert!(!local_crypto_enabled(Some(" FALSE ")));
    }
}
