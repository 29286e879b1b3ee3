// File: testing-framework/src/types.rs
//
// Fixed-length identifiers shared by the node interface and the fixtures.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// 32 bytes / 256 bits
pub const HASH_SIZE: usize = 32;

/// Number of blocks a node reports as produced and propagated
pub type BlockCount = u64;

macro_rules! fixed_hex_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Eq, PartialEq, PartialOrd, Ord, Clone, Hash, Serialize, Deserialize)]
        pub struct $name(#[serde(with = "hex")] [u8; HASH_SIZE]);

        impl $name {
            /// Wrap raw bytes
            pub const fn new(bytes: [u8; HASH_SIZE]) -> Self {
                Self(bytes)
            }

            /// Raw bytes
            pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
                &self.0
            }

            /// Lowercase hex encoding
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// First 8 hex characters, for log lines
            pub fn short(&self) -> String {
                hex::encode(&self.0[..4])
            }
        }

        impl FromStr for $name {
            type Err = hex::FromHexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let mut bytes = [0u8; HASH_SIZE];
                hex::decode_to_slice(s, &mut bytes)?;
                Ok(Self(bytes))
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }
    };
}

fixed_hex_id!(
    /// Opaque identifier of a proposed block; only compared or forwarded
    BlockHash
);

fixed_hex_id!(
    /// Identifier of a submitted deploy
    DeployHash
);

fixed_hex_id!(
    /// Account public key
    PublicKey
);
