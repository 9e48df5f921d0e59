//! Allow list precompile dispatch.
//!
//! Every call goes through the same stages, in this order, and stops at the
//! first failure:
//!
//! 1. **Decode**: the selector picks modify or read; malformed input fails.
//! 2. **Gas**: the fixed cost of the operation is charged.
//! 3. **Read-only guard** (modify only): static calls may not write.
//! 4. **Permission** (modify only): the caller must hold the admin role.
//! 5. **Execute**: write or read the role; a write also emits `RoleSet`.
//!
//! On success the call returns its output and `supplied - cost` gas. On any
//! failure it returns no output, consumes all supplied gas and leaves state
//! unchanged, since nothing is written before the last stage.

use crate::{
    abi::{role_set_log, AllowListCall},
    error::{AllowListError, StoreError},
    gas::{GasTable, MODIFY_ALLOW_LIST_GAS_COST, READ_ALLOW_LIST_GAS_COST},
    policy::ensure_can_modify,
    role::Role,
    store::{get_role, set_role, StateStore},
};
use alloy_evm::{
    precompiles::{Precompile, PrecompileInput},
    revm::precompile::{PrecompileId, PrecompileResult},
};
use alloy_primitives::{Address, Bytes};
use revm::precompile::PrecompileOutput;
use std::sync::OnceLock;
use tracing::instrument;

/// Result of [`AllowListPrecompile::run`].
pub type RunResult = Result<RunOutput, AllowListError>;

/// Successful allow list call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    /// Return data: empty for modifications, the role word for reads.
    pub bytes: Bytes,
    /// Supplied gas minus the operation's fixed cost.
    pub remaining_gas: u64,
}

/// Flat `(output, remaining gas, error)` view of a call.
///
/// Failed calls carry empty output and zero remaining gas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Return data.
    pub output: Bytes,
    /// Gas left to the caller.
    pub remaining_gas: u64,
    /// Failure, if any.
    pub error: Option<AllowListError>,
}

impl From<RunResult> for ExecutionResult {
    fn from(result: RunResult) -> Self {
        match result {
            Ok(RunOutput {
                bytes,
                remaining_gas,
            }) => Self {
                output: bytes,
                remaining_gas,
                error: None,
            },
            Err(err) => Self {
                output: Bytes::new(),
                remaining_gas: 0,
                error: Some(err),
            },
        }
    }
}

/// Role-based allow list bound to one precompile address.
///
/// The address doubles as the storage namespace: roles live in the storage of
/// the precompile account. Policies such as deployment or transaction gating
/// each get their own instance at their own address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllowListPrecompile {
    address: Address,
    gas: GasTable,
}

impl AllowListPrecompile {
    /// Lazily-initialized precompile ID
    pub fn id() -> &'static PrecompileId {
        static ID: OnceLock<PrecompileId> = OnceLock::new();
        ID.get_or_init(|| PrecompileId::custom("allow_list"))
    }

    /// Creates an allow list at `address` with the default gas costs.
    pub const fn new(address: Address) -> Self {
        Self::with_gas_table(
            address,
            GasTable::new(MODIFY_ALLOW_LIST_GAS_COST, READ_ALLOW_LIST_GAS_COST),
        )
    }

    /// Creates an allow list at `address` with custom gas costs.
    pub const fn with_gas_table(address: Address, gas: GasTable) -> Self {
        Self { address, gas }
    }

    /// Precompile address, also the storage namespace.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Gas costs of this instance.
    pub const fn gas_table(&self) -> GasTable {
        self.gas
    }

    /// Reads the role of `account` without charging gas.
    ///
    /// Used by the policies built on top of the list, e.g. to check whether a
    /// sender may deploy.
    pub fn get_role<S>(&self, store: &mut S, account: Address) -> Result<Role, StoreError>
    where
        S: StateStore + ?Sized,
    {
        get_role(store, self.address, account)
    }

    /// Writes the role of `account` without any checks.
    ///
    /// Meant for genesis configuration and tests; calls from the EVM go
    /// through [`Self::run`].
    pub fn set_role<S>(&self, store: &mut S, account: Address, role: Role) -> Result<(), StoreError>
    where
        S: StateStore + ?Sized,
    {
        set_role(store, self.address, account, role)
    }

    /// Executes one call against `store`.
    #[instrument(
        name = "allowlist_run",
        skip_all,
        fields(
            precompile = %self.address,
            contract = %contract_address,
            caller = %caller,
            gas = supplied_gas,
            read_only = read_only,
        )
    )]
    pub fn run<S>(
        &self,
        store: &mut S,
        caller: Address,
        contract_address: Address,
        input: &[u8],
        supplied_gas: u64,
        read_only: bool,
    ) -> RunResult
    where
        S: StateStore + ?Sized,
    {
        let call = AllowListCall::decode(input)?;
        let remaining_gas = self.gas.charge(call.operation(), supplied_gas)?;
        tracing::debug!(
            target: "allowlist",
            operation = ?call.operation(),
            account = %call.target(),
            remaining_gas,
            "charged allow list call"
        );

        let bytes = match call {
            AllowListCall::Modify { target, role } => {
                if read_only {
                    tracing::debug!(
                        target: "allowlist",
                        ?target,
                        "modification in read-only context"
                    );
                    return Err(AllowListError::WriteProtection);
                }
                ensure_can_modify(store, self.address, caller)?;
                let old_role = get_role(store, self.address, target)?;
                set_role(store, self.address, target, role)?;
                store.emit_log(role_set_log(self.address, target, caller, role, old_role))?;
                tracing::info!(
                    target: "allowlist",
                    ?caller,
                    ?target,
                    %old_role,
                    %role,
                    "role updated"
                );
                Bytes::new()
            }
            AllowListCall::Read { target } => {
                let role = get_role(store, self.address, target)?;
                Bytes::copy_from_slice(role.to_word().as_slice())
            }
        };

        Ok(RunOutput {
            bytes,
            remaining_gas,
        })
    }
}

impl Precompile for AllowListPrecompile {
    fn precompile_id(&self) -> &PrecompileId {
        Self::id()
    }

    fn call(&self, mut input: PrecompileInput<'_>) -> PrecompileResult {
        let caller = input.caller;
        let contract_address = input.target_address;
        let gas_limit = input.gas;
        let data = input.data;
        let read_only = input.is_static_call();

        let internals = input.internals_mut();
        let output = self.run(internals, caller, contract_address, data, gas_limit, read_only)?;

        Ok(PrecompileOutput::new(
            gas_limit - output.remaining_gas,
            output.bytes,
        ))
    }

    fn is_pure(&self) -> bool {
        false
    }
}
