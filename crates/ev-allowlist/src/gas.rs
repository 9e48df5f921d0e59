//! Fixed gas costs of allow list operations.
//!
//! Costs are flat: they do not depend on argument size. The whole cost is
//! charged up front, before any state is read or written.

use crate::error::AllowListError;
use serde::{Deserialize, Serialize};

/// Gas cost of writing one storage slot.
pub const WRITE_GAS_COST_PER_SLOT: u64 = 20_000;

/// Gas cost of reading one storage slot.
pub const READ_GAS_COST_PER_SLOT: u64 = 5_000;

/// Default cost of `modifyAllowList` and its `set*` shorthands.
pub const MODIFY_ALLOW_LIST_GAS_COST: u64 = WRITE_GAS_COST_PER_SLOT;

/// Default cost of `readAllowList`.
pub const READ_ALLOW_LIST_GAS_COST: u64 = READ_GAS_COST_PER_SLOT;

/// Kind of allow list operation, as identified by the call selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Role change.
    Modify,
    /// Role lookup.
    Read,
}

/// Per-instance gas costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GasTable {
    /// Cost of a role change.
    pub modify: u64,
    /// Cost of a role lookup.
    pub read: u64,
}

impl Default for GasTable {
    fn default() -> Self {
        Self::new(MODIFY_ALLOW_LIST_GAS_COST, READ_ALLOW_LIST_GAS_COST)
    }
}

impl GasTable {
    /// Creates a table with the given costs.
    pub const fn new(modify: u64, read: u64) -> Self {
        Self { modify, read }
    }

    /// Fixed cost of `operation`.
    pub const fn cost(&self, operation: Operation) -> u64 {
        match operation {
            Operation::Modify => self.modify,
            Operation::Read => self.read,
        }
    }

    /// Charges the cost of `operation` against `supplied` gas.
    ///
    /// Returns the gas left over. All-or-nothing: if `supplied` does not cover
    /// the cost nothing is charged and the call fails with
    /// [`AllowListError::OutOfGas`].
    pub fn charge(&self, operation: Operation, supplied: u64) -> Result<u64, AllowListError> {
        deduct_gas(supplied, self.cost(operation))
    }
}

/// Subtracts `cost` from `supplied`, failing when it does not fit.
pub fn deduct_gas(supplied: u64, cost: u64) -> Result<u64, AllowListError> {
    supplied.checked_sub(cost).ok_or(AllowListError::OutOfGas)
}
