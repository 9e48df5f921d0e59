//! Role storage on top of account state.
//!
//! ## Storage Layout
//!
//! Each allow list keeps its entries in the storage of its own precompile
//! account:
//!
//! | Slot | Value |
//! |------|-------|
//! | `address` left-padded to 32 bytes | [`Role`] word (value in the low byte) |
//!
//! An unset slot reads as zero, which is [`Role::NoRole`]. Entries are never
//! deleted, only overwritten.

use crate::{error::StoreError, role::Role};
use alloy_evm::EvmInternals;
use alloy_primitives::{Address, Bytes, Log, B256, U256};
use revm::bytecode::Bytecode;
use std::{collections::BTreeMap, sync::OnceLock};

/// Keyed word storage scoped per account.
///
/// This is the seam to the ledger's persistent state. Implementations are
/// borrowed mutably for the duration of a single call only.
pub trait StateStore {
    /// Reads the word at `slot` of `account`; unset slots read as zero.
    fn get_state(&mut self, account: Address, slot: B256) -> Result<B256, StoreError>;

    /// Overwrites the word at `slot` of `account`.
    fn set_state(&mut self, account: Address, slot: B256, value: B256) -> Result<(), StoreError>;

    /// Makes sure `account` exists so that its storage survives empty-account
    /// pruning. Called before the first write to a precompile account.
    fn ensure_account(&mut self, _account: Address) -> Result<(), StoreError> {
        Ok(())
    }

    /// Records a log emitted by a state-changing call.
    fn emit_log(&mut self, _log: Log) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Storage slot holding the role of `address`.
pub fn allow_list_slot(address: Address) -> B256 {
    address.into_word()
}

/// Reads the role of `address` in the allow list stored at `policy`.
///
/// Returns [`Role::NoRole`] for addresses that were never written.
pub fn get_role<S>(store: &mut S, policy: Address, address: Address) -> Result<Role, StoreError>
where
    S: StateStore + ?Sized,
{
    let word = store.get_state(policy, allow_list_slot(address))?;
    let role = Role::from_word(word).unwrap_or_else(|err| {
        // Only `set_role` writes these slots, so this is unreachable for
        // well-formed state. Fall back to the least privilege.
        tracing::warn!(
            target: "allowlist",
            %policy,
            ?address,
            %err,
            "ignoring malformed role slot"
        );
        Role::NoRole
    });
    tracing::debug!(target: "allowlist", %policy, ?address, %role, "role lookup");
    Ok(role)
}

/// Overwrites the role of `address` in the allow list stored at `policy`.
///
/// Performs no validation; callers gate this behind the dispatch checks.
pub fn set_role<S>(
    store: &mut S,
    policy: Address,
    address: Address,
    role: Role,
) -> Result<(), StoreError>
where
    S: StateStore + ?Sized,
{
    store.ensure_account(policy)?;
    store.set_state(policy, allow_list_slot(address), role.to_word())
}

/// Bytecode marker for precompile accounts.
///
/// The invalid instruction `0xFE` keeps the account non-empty, so it is not
/// pruned, and fails any attempt to execute it as a contract.
fn precompile_bytecode() -> &'static Bytecode {
    static BYTECODE: OnceLock<Bytecode> = OnceLock::new();
    BYTECODE.get_or_init(|| Bytecode::new_raw(Bytes::from_static(&[0xFE])))
}

/// Journal-backed storage used while executing inside the EVM.
///
/// Note: `sload` requires mutable access because Revm tracks warm/cold slots
/// in the journal. Reads do not modify state.
impl StateStore for EvmInternals<'_> {
    fn get_state(&mut self, account: Address, slot: B256) -> Result<B256, StoreError> {
        self.load_account(account).map_err(StoreError::other)?;
        let value = self
            .sload(account, slot.into())
            .map_err(StoreError::other)?;
        let raw_value: U256 = *value;
        Ok(B256::from(raw_value.to_be_bytes::<32>()))
    }

    fn set_state(&mut self, account: Address, slot: B256, value: B256) -> Result<(), StoreError> {
        self.load_account(account).map_err(StoreError::other)?;
        self.sstore(account, slot.into(), value.into())
            .map_err(StoreError::other)?;
        self.touch_account(account).map_err(StoreError::other)
    }

    fn ensure_account(&mut self, account: Address) -> Result<(), StoreError> {
        let loaded = self.load_account(account).map_err(StoreError::other)?;
        if !loaded.info.is_empty_code_hash() {
            return Ok(());
        }

        self.set_code(account, precompile_bytecode().clone())
            .map_err(StoreError::other)?;
        self.bump_nonce(account).map_err(StoreError::other)?;
        self.touch_account(account).map_err(StoreError::other)?;
        tracing::debug!(target: "allowlist", %account, "marked precompile account");
        Ok(())
    }

    fn emit_log(&mut self, log: Log) -> Result<(), StoreError> {
        self.log(log);
        Ok(())
    }
}

/// In-memory [`StateStore`], for tests and offline genesis tooling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    slots: BTreeMap<(Address, B256), B256>,
    logs: Vec<Log>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots ever written.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no slot was ever written.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Logs emitted so far, oldest first.
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }
}

impl StateStore for MemoryStore {
    fn get_state(&mut self, account: Address, slot: B256) -> Result<B256, StoreError> {
        Ok(self
            .slots
            .get(&(account, slot))
            .copied()
            .unwrap_or_default())
    }

    fn set_state(&mut self, account: Address, slot: B256, value: B256) -> Result<(), StoreError> {
        self.slots.insert((account, slot), value);
        Ok(())
    }

    fn emit_log(&mut self, log: Log) -> Result<(), StoreError> {
        self.logs.push(log);
        Ok(())
    }
}
