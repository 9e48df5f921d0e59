//! Configuration of allow list instances.
//!
//! A policy is configured from a chainspec-style JSON object:
//!
//! ```json
//! {
//!   "name": "contractDeployerAllowList",
//!   "address": "0x0200000000000000000000000000000000000000",
//!   "activationHeight": 0,
//!   "gas": { "modify": 20000, "read": 5000 },
//!   "adminAddresses": ["0x..."],
//!   "enabledAddresses": ["0x..."]
//! }
//! ```
//!
//! `gas`, `activationHeight` and both address lists are optional.

use crate::{
    error::StoreError,
    gas::GasTable,
    precompile::AllowListPrecompile,
    role::Role,
    store::{set_role, StateStore},
};
use alloy_primitives::Address;
use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, str::FromStr};
use thiserror::Error;

/// Initial role assignment applied when an allow list is activated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowListConfig {
    /// Accounts receiving [`Role::AdminRole`].
    #[serde(default)]
    pub admin_addresses: Vec<Address>,
    /// Accounts receiving [`Role::EnabledRole`].
    #[serde(default)]
    pub enabled_addresses: Vec<Address>,
}

impl AllowListConfig {
    /// Creates a configuration from the given address lists.
    pub const fn new(admin_addresses: Vec<Address>, enabled_addresses: Vec<Address>) -> Self {
        Self {
            admin_addresses,
            enabled_addresses,
        }
    }

    /// Creates a configuration with admins only.
    pub const fn with_admins(admin_addresses: Vec<Address>) -> Self {
        Self::new(admin_addresses, Vec::new())
    }

    /// Creates a configuration from environment variables.
    ///
    /// Reads `{prefix}_ADMINS` (required) and `{prefix}_ENABLED` (optional),
    /// both comma-separated address lists.
    pub fn from_env(prefix: &str) -> eyre::Result<Self> {
        let admins_var = format!("{prefix}_ADMINS");
        let admin_addresses = std::env::var(&admins_var)
            .wrap_err_with(|| format!("{admins_var} is not set"))
            .and_then(|raw| {
                parse_address_list(&raw).wrap_err_with(|| format!("invalid {admins_var}"))
            })?;

        let enabled_var = format!("{prefix}_ENABLED");
        let enabled_addresses = std::env::var(&enabled_var)
            .ok()
            .map(|raw| {
                parse_address_list(&raw).wrap_err_with(|| format!("invalid {enabled_var}"))
            })
            .transpose()?
            .unwrap_or_default();

        let config = Self::new(admin_addresses, enabled_addresses);
        config.validate()?;
        Ok(config)
    }

    /// Checks that every account is listed once and none is the zero address.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for address in self.admin_addresses.iter().chain(&self.enabled_addresses) {
            if address.is_zero() {
                return Err(ConfigError::ZeroAddress);
            }
            if !seen.insert(*address) {
                return Err(ConfigError::DuplicateAddress(*address));
            }
        }
        Ok(())
    }

    /// Validates the configuration and writes its roles into the allow list at
    /// `policy`.
    pub fn configure<S>(&self, store: &mut S, policy: Address) -> Result<(), ConfigError>
    where
        S: StateStore + ?Sized,
    {
        self.validate()?;
        for address in &self.admin_addresses {
            set_role(store, policy, *address, Role::AdminRole)?;
        }
        for address in &self.enabled_addresses {
            set_role(store, policy, *address, Role::EnabledRole)?;
        }
        tracing::info!(
            target: "allowlist",
            %policy,
            admins = self.admin_addresses.len(),
            enabled = self.enabled_addresses.len(),
            "applied initial allow list"
        );
        Ok(())
    }
}

/// One allow list instance: where it lives, when it activates, what it costs
/// and who starts with which role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyConfig {
    /// Human-readable name, used in logs.
    pub name: String,
    /// Precompile address.
    pub address: Address,
    /// First block at which the precompile is callable.
    #[serde(default)]
    pub activation_height: u64,
    /// Gas costs; defaults apply to omitted fields.
    #[serde(default)]
    pub gas: GasTable,
    /// Initial roles.
    #[serde(flatten)]
    pub allow_list: AllowListConfig,
}

impl PolicyConfig {
    /// Creates a policy active from genesis with default gas costs.
    pub fn new(name: impl Into<String>, address: Address, allow_list: AllowListConfig) -> Self {
        Self {
            name: name.into(),
            address,
            activation_height: 0,
            gas: GasTable::default(),
            allow_list,
        }
    }

    /// Returns true if the policy is active at the given block number.
    pub const fn is_active(&self, block_number: u64) -> bool {
        block_number >= self.activation_height
    }

    /// Builds the precompile for this policy.
    pub const fn precompile(&self) -> AllowListPrecompile {
        AllowListPrecompile::with_gas_table(self.address, self.gas)
    }
}

/// Errors that can occur while validating or applying allow list configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An account appears more than once across the role lists.
    #[error("address {0} is listed more than once")]
    DuplicateAddress(Address),
    /// The zero address cannot hold a role.
    #[error("zero address cannot hold a role")]
    ZeroAddress,
    /// Two policies share a precompile address.
    #[error("precompile address {0} is configured more than once")]
    DuplicatePolicy(Address),
    /// Writing the initial roles failed.
    #[error("failed to apply initial roles: {0}")]
    Store(#[from] StoreError),
}

fn parse_address_list(raw: &str) -> eyre::Result<Vec<Address>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Address::from_str(s).wrap_err_with(|| format!("invalid address {s:?}")))
        .collect()
}
