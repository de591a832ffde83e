// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

/// Maps each variant of a fieldless enum to its wire name.
///
/// Parsing through `TryFrom<&str>` is case-insensitive.
#[macro_export]
macro_rules! str_enum {
    ($name:ident, $($variant:ident => $str:expr),* $(,)?) => {
        impl $name {
            pub const VARIANTS: &'static [$name] = &[$($name::$variant,)*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $str,)*
                }
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl TryFrom<&str> for $name {
            type Error = String;
            fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
                $(if s.eq_ignore_ascii_case($str) {
                    return Ok($name::$variant);
                })*
                Err(["'", s, "' not available"].concat())
            }
        }
    };
}
