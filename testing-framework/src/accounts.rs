// File: testing-framework/src/accounts.rs
//
// Account Registry
//
// Maps symbolic account ids to key material and the pre-built transfer
// payload that credits that account. The scenario core only forwards
// payloads; the fields are public for the node implementations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::HarnessError;
use crate::types::{PublicKey, HASH_SIZE};

/// Node default identity funded at genesis (`3030…30`)
pub const GENESIS_PUBLIC_KEY: PublicKey = PublicKey::new([0x30; HASH_SIZE]);

/// Symbolic account identifier used by scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub u32);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "account-{}", self.0)
    }
}

/// Pre-built session contract that transfers a fixed amount to one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPayload {
    /// Session contract name
    pub contract: String,
    /// Account credited by the contract
    pub recipient: PublicKey,
    /// Amount transferred
    pub amount: u64,
}

/// Registry entry, immutable once loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Symbolic id
    pub id: AccountId,
    /// Account public key
    pub public_key: PublicKey,
    /// Transfer contract crediting this account
    pub transfer_payload: TransferPayload,
}

/// Lookup of fixture accounts by id
pub trait AccountRegistry: Send + Sync {
    /// Resolve an account, failing with `UnknownAccount` if absent
    fn lookup(&self, id: AccountId) -> Result<&Account, HarnessError>;
}

/// In-memory registry
#[derive(Debug, Clone, Default)]
pub struct StaticAccountRegistry {
    accounts: BTreeMap<AccountId, Account>,
}

impl StaticAccountRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account whose transfer contract credits it with `amount`
    ///
    /// Replaces any previous entry with the same id.
    pub fn with_account(mut self, id: AccountId, public_key: PublicKey, amount: u64) -> Self {
        let account = Account {
            id,
            transfer_payload: TransferPayload {
                contract: format!("transfer_to_account_{}.wasm", id.0),
                recipient: public_key.clone(),
                amount,
            },
            public_key,
        };
        self.accounts.insert(id, account);
        self
    }

    /// Number of registered accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl AccountRegistry for StaticAccountRegistry {
    fn lookup(&self, id: AccountId) -> Result<&Account, HarnessError> {
        self.accounts
            .get(&id)
            .ok_or(HarnessError::UnknownAccount(id))
    }
}

/// Standard accounts of the single-node transfer test
///
/// - account 1: `0101…01`, its contract transfers 100
/// - account 2: `0202…02`, its contract transfers 175
pub fn fixture_accounts() -> StaticAccountRegistry {
    StaticAccountRegistry::new()
        .with_account(AccountId(1), PublicKey::new([0x01; HASH_SIZE]), 100)
        .with_account(AccountId(2), PublicKey::new([0x02; HASH_SIZE]), 175)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_accounts() {
        let registry = fixture_accounts();
        assert_eq!(registry.len(), 2);

        let first = registry.lookup(AccountId(1)).unwrap();
        assert_eq!(
            first.public_key.to_hex(),
            "0101010101010101010101010101010101010101010101010101010101010101"
        );
        assert_eq!(first.transfer_payload.amount, 100);
        assert_eq!(first.transfer_payload.recipient, first.public_key);
        assert_eq!(first.transfer_payload.contract, "transfer_to_account_1.wasm");

        let second = registry.lookup(AccountId(2)).unwrap();
        assert_eq!(second.transfer_payload.amount, 175);
    }

    #[test]
    fn test_unknown_account() {
        let registry = fixture_accounts();
        assert_eq!(
            registry.lookup(AccountId(9)),
            Err(HarnessError::UnknownAccount(AccountId(9)))
        );
    }

    #[test]
    fn test_genesis_key_is_not_registered() {
        let registry = fixture_accounts();
        assert!((0..10).all(|id| registry
            .lookup(AccountId(id))
            .map(|a| a.public_key != GENESIS_PUBLIC_KEY)
            .unwrap_or(true)));
    }
}
