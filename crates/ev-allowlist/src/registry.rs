//! Registration table of allow list instances.
//!
//! The table is built once (usually from [`PolicyConfig`]s) and handed by
//! reference to whatever drives execution. Calls are routed by their target
//! address.

use crate::{
    config::{AllowListConfig, ConfigError, PolicyConfig},
    error::AllowListError,
    precompile::{AllowListPrecompile, RunResult},
    store::StateStore,
};
use alloy_evm::precompiles::{DynPrecompile, Precompile, PrecompilesMap};
use alloy_primitives::{address, Address, Bytes};
use std::{collections::BTreeMap, sync::Arc};

/// Allow list gating contract deployment.
pub const CONTRACT_DEPLOYER_ALLOW_LIST_ADDR: Address =
    address!("0x0200000000000000000000000000000000000000");

/// Allow list gating transaction submission.
pub const TX_ALLOW_LIST_ADDR: Address = address!("0x0200000000000000000000000000000000000002");

/// A call routed to an allow list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Account making the call.
    pub caller: Address,
    /// Called precompile address.
    pub target: Address,
    /// Calldata, selector first.
    pub input: Bytes,
    /// Gas supplied to the call.
    pub gas: u64,
    /// Whether the call runs in a read-only (static) context.
    pub read_only: bool,
}

#[derive(Debug, Clone)]
struct Registration {
    name: String,
    precompile: Arc<AllowListPrecompile>,
    activation_height: u64,
    initial_roles: AllowListConfig,
}

impl Registration {
    const fn is_active(&self, block_number: u64) -> bool {
        block_number >= self.activation_height
    }
}

/// Allow list instances keyed by precompile address.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    entries: BTreeMap<Address, Registration>,
}

impl PolicyRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from policy configurations.
    ///
    /// Fails if two policies share an address or a role list is invalid.
    pub fn from_configs<'a>(
        configs: impl IntoIterator<Item = &'a PolicyConfig>,
    ) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for config in configs {
            config.allow_list.validate()?;
            if registry.contains(config.address) {
                return Err(ConfigError::DuplicatePolicy(config.address));
            }
            registry.insert(
                config.name.clone(),
                config.precompile(),
                config.activation_height,
                config.allow_list.clone(),
            );
        }
        Ok(registry)
    }

    /// Registers `precompile` under its own address, active from
    /// `activation_height`, with no initial roles. Returns the instance it
    /// replaced, if any.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        precompile: AllowListPrecompile,
        activation_height: u64,
    ) -> Option<Arc<AllowListPrecompile>> {
        self.insert(
            name.into(),
            precompile,
            activation_height,
            AllowListConfig::default(),
        )
    }

    fn insert(
        &mut self,
        name: String,
        precompile: AllowListPrecompile,
        activation_height: u64,
        initial_roles: AllowListConfig,
    ) -> Option<Arc<AllowListPrecompile>> {
        let address = precompile.address();
        self.entries
            .insert(
                address,
                Registration {
                    name,
                    precompile: Arc::new(precompile),
                    activation_height,
                    initial_roles,
                },
            )
            .map(|previous| previous.precompile)
    }

    /// Returns the instance registered at `address`.
    pub fn get(&self, address: Address) -> Option<&Arc<AllowListPrecompile>> {
        self.entries.get(&address).map(|entry| &entry.precompile)
    }

    /// Returns true if an instance is registered at `address`.
    pub fn contains(&self, address: Address) -> bool {
        self.entries.contains_key(&address)
    }

    /// Returns true if the instance at `address` exists and is active at
    /// `block_number`.
    pub fn is_active(&self, address: Address, block_number: u64) -> bool {
        self.entries
            .get(&address)
            .is_some_and(|entry| entry.is_active(block_number))
    }

    /// Registered addresses in ascending order.
    pub fn addresses(&self) -> impl Iterator<Item = Address> + '_ {
        self.entries.keys().copied()
    }

    /// Number of registered instances.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Routes `call` to the instance registered at its target.
    ///
    /// An instance not yet active at `block_number` is treated as absent.
    pub fn run<S>(&self, store: &mut S, call: &Call, block_number: u64) -> RunResult
    where
        S: StateStore + ?Sized,
    {
        let precompile = self
            .entries
            .get(&call.target)
            .filter(|entry| entry.is_active(block_number))
            .map(|entry| &entry.precompile)
            .ok_or(AllowListError::UnknownPrecompile(call.target))?;
        precompile.run(
            store,
            call.caller,
            call.target,
            &call.input,
            call.gas,
            call.read_only,
        )
    }

    /// Writes the initial roles of every instance whose activation height is
    /// exactly `block_number`. Returns how many instances were activated.
    ///
    /// Call once per block, before executing its transactions.
    pub fn activate<S>(&self, store: &mut S, block_number: u64) -> Result<usize, ConfigError>
    where
        S: StateStore + ?Sized,
    {
        let mut activated = 0;
        for (address, entry) in &self.entries {
            if entry.activation_height != block_number {
                continue;
            }

            store.ensure_account(*address)?;
            entry.initial_roles.configure(store, *address)?;
            tracing::info!(
                target: "allowlist",
                name = %entry.name,
                %address,
                block_number,
                "activated allow list"
            );
            activated += 1;
        }
        Ok(activated)
    }

    /// Installs every instance active at `block_number` into `precompiles`.
    pub fn install(&self, precompiles: &mut PrecompilesMap, block_number: u64) {
        for (address, entry) in &self.entries {
            if !entry.is_active(block_number) {
                continue;
            }

            let precompile = Arc::clone(&entry.precompile);
            let id = AllowListPrecompile::id().clone();

            precompiles.apply_precompile(address, move |_| {
                let precompile_for_call = Arc::clone(&precompile);
                let id_for_call = id;
                Some(DynPrecompile::new_stateful(id_for_call, move |input| {
                    precompile_for_call.call(input)
                }))
            });
            tracing::info!(
                target: "allowlist",
                name = %entry.name,
                %address,
                block_number,
                "installed allow list precompile"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        abi::{pack_modify_allow_list, pack_read_allow_list},
        gas::{GasTable, MODIFY_ALLOW_LIST_GAS_COST, READ_ALLOW_LIST_GAS_COST},
        role::Role,
        store::MemoryStore,
        test_utils::TestEvm,
    };
    use alloy_evm::revm::precompile::Precompiles;

    const ADMIN: Address = address!("0x00000000000000000000000000000000000000a1");
    const USER: Address = address!("0x00000000000000000000000000000000000000b1");

    fn registry() -> PolicyRegistry {
        let mut tx_policy = PolicyConfig::new(
            "txAllowList",
            TX_ALLOW_LIST_ADDR,
            AllowListConfig::with_admins(vec![ADMIN]),
        );
        tx_policy.activation_height = 100;
        tx_policy.gas = GasTable::new(1_000, 100);
        let configs = [
            PolicyConfig::new(
                "contractDeployerAllowList",
                CONTRACT_DEPLOYER_ALLOW_LIST_ADDR,
                AllowListConfig::with_admins(vec![ADMIN]),
            ),
            tx_policy,
        ];
        PolicyRegistry::from_configs(&configs).unwrap()
    }

    #[test]
    fn routes_calls_by_target() {
        let registry = registry();
        let mut store = MemoryStore::new();
        registry.activate(&mut store, 0).unwrap();
        registry.activate(&mut store, 100).unwrap();

        let call = Call {
            caller: ADMIN,
            target: CONTRACT_DEPLOYER_ALLOW_LIST_ADDR,
            input: pack_modify_allow_list(USER, Role::EnabledRole),
            gas: MODIFY_ALLOW_LIST_GAS_COST,
            read_only: false,
        };
        registry.run(&mut store, &call, 100).unwrap();

        let read = Call {
            caller: USER,
            target: TX_ALLOW_LIST_ADDR,
            input: pack_read_allow_list(USER),
            gas: READ_ALLOW_LIST_GAS_COST,
            read_only: true,
        };
        let output = registry.run(&mut store, &read, 100).unwrap();
        assert_eq!(
            output.bytes.as_ref(),
            Role::NoRole.to_word().as_slice(),
            "roles must not leak across policies"
        );
        assert_eq!(output.remaining_gas, READ_ALLOW_LIST_GAS_COST - 100);
    }

    #[test]
    fn unknown_target_is_rejected() {
        let registry = registry();
        let mut store = MemoryStore::new();
        let stray = address!("0x0200000000000000000000000000000000000099");
        let call = Call {
            caller: ADMIN,
            target: stray,
            input: pack_read_allow_list(USER),
            gas: READ_ALLOW_LIST_GAS_COST,
            read_only: false,
        };

        assert_eq!(
            registry.run(&mut store, &call, 0),
            Err(AllowListError::UnknownPrecompile(stray))
        );
    }

    #[test]
    fn inactive_target_is_not_routed() {
        let registry = registry();
        let mut store = MemoryStore::new();
        let call = Call {
            caller: USER,
            target: TX_ALLOW_LIST_ADDR,
            input: pack_read_allow_list(USER),
            gas: READ_ALLOW_LIST_GAS_COST,
            read_only: true,
        };

        assert_eq!(
            registry.run(&mut store, &call, 99),
            Err(AllowListError::UnknownPrecompile(TX_ALLOW_LIST_ADDR))
        );
        assert!(registry.run(&mut store, &call, 100).is_ok());
    }

    #[test]
    fn activation_applies_initial_roles_once_at_height() {
        let registry = registry();
        let mut store = MemoryStore::new();
        let tx_list = registry.get(TX_ALLOW_LIST_ADDR).unwrap();

        assert_eq!(registry.activate(&mut store, 0).unwrap(), 1);
        assert_eq!(
            tx_list.get_role(&mut store, ADMIN).unwrap(),
            Role::NoRole,
            "tx allow list is not active yet"
        );

        assert_eq!(registry.activate(&mut store, 99).unwrap(), 0);
        assert_eq!(registry.activate(&mut store, 100).unwrap(), 1);
        assert_eq!(tx_list.get_role(&mut store, ADMIN).unwrap(), Role::AdminRole);

        let promote = Call {
            caller: ADMIN,
            target: TX_ALLOW_LIST_ADDR,
            input: pack_modify_allow_list(USER, Role::EnabledRole),
            gas: MODIFY_ALLOW_LIST_GAS_COST,
            read_only: false,
        };
        registry.run(&mut store, &promote, 100).unwrap();
        assert_eq!(tx_list.get_role(&mut store, USER).unwrap(), Role::EnabledRole);
    }

    #[test]
    fn activation_marks_accounts_in_journal() {
        let registry = registry();
        let mut evm = TestEvm::new();

        registry.activate(&mut evm.internals(), 0).unwrap();

        let account = evm
            .account(CONTRACT_DEPLOYER_ALLOW_LIST_ADDR)
            .expect("activated account loaded");
        assert_eq!(account.info.nonce, 1);
        assert!(!account.info.is_empty_code_hash());
        assert!(evm.account(TX_ALLOW_LIST_ADDR).is_none());
    }

    #[test]
    fn activation_height_is_respected() {
        let registry = registry();
        assert!(registry.is_active(CONTRACT_DEPLOYER_ALLOW_LIST_ADDR, 0));
        assert!(!registry.is_active(TX_ALLOW_LIST_ADDR, 99));
        assert!(registry.is_active(TX_ALLOW_LIST_ADDR, 100));
        assert!(!registry.is_active(USER, 1_000));
    }

    #[test]
    fn duplicate_addresses_are_rejected() {
        let config = PolicyConfig::new(
            "contractDeployerAllowList",
            CONTRACT_DEPLOYER_ALLOW_LIST_ADDR,
            AllowListConfig::default(),
        );
        let err = PolicyRegistry::from_configs([&config, &config]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::DuplicatePolicy(CONTRACT_DEPLOYER_ALLOW_LIST_ADDR)
        );
    }

    #[test]
    fn install_skips_inactive_instances() {
        let registry = registry();
        let mut precompiles = PrecompilesMap::from_static(Precompiles::latest());

        registry.install(&mut precompiles, 99);

        assert!(precompiles.get(&CONTRACT_DEPLOYER_ALLOW_LIST_ADDR).is_some());
        assert!(precompiles.get(&TX_ALLOW_LIST_ADDR).is_none());

        registry.install(&mut precompiles, 100);
        assert!(precompiles.get(&TX_ALLOW_LIST_ADDR).is_some());
    }

    #[test]
    fn register_replaces_existing_instance() {
        let mut registry = PolicyRegistry::new();
        assert!(registry.is_empty());
        assert!(registry
            .register("a", AllowListPrecompile::new(TX_ALLOW_LIST_ADDR), 0)
            .is_none());
        let replaced = registry.register(
            "b",
            AllowListPrecompile::with_gas_table(TX_ALLOW_LIST_ADDR, GasTable::new(1, 1)),
            0,
        );
        assert_eq!(replaced.map(|p| p.gas_table()), Some(GasTable::default()));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.addresses().collect::<Vec<_>>(), vec![TX_ALLOW_LIST_ADDR]);
    }
}
