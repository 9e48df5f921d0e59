//! Errors returned by the allow list precompile.

use alloy_evm::revm::precompile::PrecompileError;
use alloy_primitives::Address;
use thiserror::Error;

/// Failure of a single allow list call.
///
/// Every variant is terminal: the call consumes all of its supplied gas and
/// leaves state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllowListError {
    /// Input was malformed, mis-sized, carried an unknown selector or an
    /// out-of-range role.
    #[error("failed to decode allow list input: {0}")]
    Decode(String),
    /// Supplied gas is below the fixed cost of the operation.
    #[error("out of gas")]
    OutOfGas,
    /// A mutation was attempted from a read-only (static) context.
    #[error("write protection")]
    WriteProtection,
    /// The caller does not hold the admin role.
    #[error("non-admin cannot modify allow list")]
    CannotModifyAllowList,
    /// The backing state store failed.
    #[error(transparent)]
    Storage(#[from] StoreError),
    /// No allow list is registered at the called address.
    #[error("no allow list precompile registered at {0}")]
    UnknownPrecompile(Address),
}

impl From<AllowListError> for PrecompileError {
    fn from(err: AllowListError) -> Self {
        match err {
            AllowListError::OutOfGas => Self::OutOfGas,
            other => Self::Other(other.to_string().into()),
        }
    }
}

/// Failure reported by a [`StateStore`](crate::store::StateStore) backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("state access failed: {0}")]
pub struct StoreError(pub String);

impl StoreError {
    /// Wraps any displayable backend error.
    pub fn other(err: impl std::fmt::Display) -> Self {
        Self(err.to_string())
    }
}
