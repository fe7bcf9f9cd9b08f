//! Account and validator addresses.
//!
//! Both are 20 raw bytes. Their textual form is lowercase hex, which is also
//! how they appear in JSON. Ordering is byte-wise, so iteration over stored
//! addresses is deterministic across nodes.

use std::fmt;
use std::str::FromStr;

use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::{ValidationError, ADDRESS_LEN};

/// Address parse failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("invalid hex: {0}")]
    Hex(String),

    #[error("expected 20 bytes, got {0}")]
    Length(usize),
}

macro_rules! address_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr,
        )]
        pub struct $name([u8; ADDRESS_LEN]);

        impl $name {
            pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
                &self.0
            }

            /// Builds an address from a stored byte slice.
            pub fn from_slice(bytes: &[u8]) -> Result<Self, AddressError> {
                let arr: [u8; ADDRESS_LEN] = bytes
                    .try_into()
                    .map_err(|_| AddressError::Length(bytes.len()))?;
                Ok(Self(arr))
            }

            /// Parses a governance-supplied address string.
            pub fn parse(input: &str) -> Result<Self, ValidationError> {
                input
                    .parse()
                    .map_err(|e: AddressError| ValidationError::InvalidAddress {
                        address: input.to_string(),
                        reason: e.to_string(),
                    })
            }
        }

        impl FromStr for $name {
            type Err = AddressError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bytes = hex::decode(s).map_err(|e| AddressError::Hex(e.to_string()))?;
                Self::from_slice(&bytes)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }
    };
}

address_type!(
    /// Delegator / recipient account address.
    AccAddress
);

address_type!(
    /// Validator operator address.
    ValAddress
);
