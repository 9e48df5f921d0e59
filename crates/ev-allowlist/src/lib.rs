//! # Role-Based Allow List Precompile
//!
//! This crate provides a native precompiled contract that keeps a per-address
//! role and lets privileged accounts change roles through contract calls.
//! Chain policies such as "who may deploy contracts" or "who may submit
//! transactions" are built on top of it.
//!
//! ## Well-Known Instances
//!
//! | Address | Name | Gates |
//! |---------|------|-------|
//! | `0x0200…0000` | [`registry::CONTRACT_DEPLOYER_ALLOW_LIST_ADDR`] | Contract deployment |
//! | `0x0200…0002` | [`registry::TX_ALLOW_LIST_ADDR`] | Transaction submission |
//!
//! ## Roles
//!
//! Roles are ordered by privilege: `NoRole < EnabledRole < AdminRole`. Only
//! admins may change roles, and anyone may read them.
//!
//! ## Architecture
//!
//! 1. **Decode** ([`abi`]): the 4-byte selector picks modify or read
//! 2. **Gas** ([`gas`]): a fixed per-operation cost, charged before any state access
//! 3. **Guard** ([`precompile`]): static calls may not modify
//! 4. **Permission** ([`policy`]): only admins may modify
//! 5. **Execute** ([`store`]): roles live in the precompile account's storage
//!
//! Any failure returns empty output and consumes all supplied gas. A
//! successful change emits `RoleSet` from the precompile address.
//!
//! ## Integration
//!
//! Instances are described by [`config::PolicyConfig`], collected in a
//! [`registry::PolicyRegistry`] and installed into the EVM's precompile map.
//!
//! ```ignore
//! use ev_allowlist::{PolicyConfig, PolicyRegistry};
//!
//! let policies: Vec<PolicyConfig> = serde_json::from_value(chainspec_extras)?;
//! let registry = PolicyRegistry::from_configs(&policies)?;
//!
//! // once per block, before its transactions
//! registry.activate(&mut internals, block_number)?;
//! registry.install(&mut precompiles, block_number);
//! ```

pub mod abi;
pub mod config;
pub mod error;
pub mod gas;
pub mod policy;
pub mod precompile;
pub mod registry;
pub mod role;
pub mod store;

#[cfg(test)]
mod test_utils;

pub use abi::AllowListCall;
pub use config::{AllowListConfig, ConfigError, PolicyConfig};
pub use error::{AllowListError, StoreError};
pub use gas::{GasTable, Operation, MODIFY_ALLOW_LIST_GAS_COST, READ_ALLOW_LIST_GAS_COST};
pub use precompile::{AllowListPrecompile, ExecutionResult, RunOutput, RunResult};
pub use registry::{Call, PolicyRegistry, CONTRACT_DEPLOYER_ALLOW_LIST_ADDR, TX_ALLOW_LIST_ADDR};
pub use role::{InvalidRole, Role};
pub use store::{MemoryStore, StateStore};
