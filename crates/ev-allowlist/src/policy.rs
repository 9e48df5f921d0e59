//! Caller check for the mutation path.

use crate::{
    error::AllowListError,
    role::Role,
    store::{get_role, StateStore},
};
use alloy_primitives::Address;

/// Verifies that `caller` may change roles in the allow list at `policy`.
///
/// Only the caller's own role matters; the requested role and the target's
/// current role are not consulted, so an admin may also demote itself.
/// Returns the caller's role on success.
pub fn ensure_can_modify<S>(
    store: &mut S,
    policy: Address,
    caller: Address,
) -> Result<Role, AllowListError>
where
    S: StateStore + ?Sized,
{
    let caller_role = get_role(store, policy, caller)?;
    if caller_role.can_grant() {
        tracing::debug!(target: "allowlist", ?caller, %caller_role, "modification authorized");
        Ok(caller_role)
    } else {
        tracing::warn!(target: "allowlist", ?caller, %caller_role, "modification denied");
        Err(AllowListError::CannotModifyAllowList)
    }
}
