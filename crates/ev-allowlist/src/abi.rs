//! Call interface of the allow list precompile.
//!
//! ```solidity
//! interface IAllowList {
//!     function modifyAllowList(address target, uint8 role) external;
//!     function readAllowList(address target) external view returns (uint256 role);
//!     function setAdmin(address addr) external;
//!     function setEnabled(address addr) external;
//!     function setNone(address addr) external;
//!
//!     event RoleSet(
//!         uint256 indexed role,
//!         address indexed account,
//!         address indexed sender,
//!         uint256 oldRole
//!     );
//! }
//! ```
//!
//! `setAdmin`, `setEnabled` and `setNone` are shorthands for
//! `modifyAllowList` with a fixed role and behave identically. Every
//! successful change emits `RoleSet` from the precompile address.

use crate::{error::AllowListError, gas::Operation, role::Role};
use alloy_primitives::{Address, Bytes, Log, U256};
use alloy_sol_types::{sol, SolCall, SolEvent, SolInterface};

sol! {
    /// Role-based allow list managed by a precompile.
    interface IAllowList {
        /// Assign `role` to `target`. Admin only.
        /// @param target Account whose role changes
        /// @param role 0 = none, 1 = enabled, 2 = admin
        function modifyAllowList(address target, uint8 role) external;

        /// Read the role of `target`.
        /// @param target Account to look up
        /// @return role The role value in the low byte of the word
        function readAllowList(address target) external view returns (uint256 role);

        /// Grant the admin role to `addr`. Admin only.
        function setAdmin(address addr) external;

        /// Grant the enabled role to `addr`. Admin only.
        function setEnabled(address addr) external;

        /// Revoke any role of `addr`. Admin only.
        function setNone(address addr) external;

        /// Emitted when `sender` changes the role of `account`.
        event RoleSet(
            uint256 indexed role,
            address indexed account,
            address indexed sender,
            uint256 oldRole
        );
    }
}

/// Byte offset of the `role` word in `modifyAllowList` calldata.
const ROLE_WORD_OFFSET: usize = 4 + 32;

/// A decoded allow list call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowListCall {
    /// Set the role of `target`.
    Modify {
        /// Account whose role changes.
        target: Address,
        /// Requested role.
        role: Role,
    },
    /// Read the role of `target`.
    Read {
        /// Account to look up.
        target: Address,
    },
}

impl AllowListCall {
    /// Decodes calldata by its 4-byte selector.
    pub fn decode(input: &[u8]) -> Result<Self, AllowListError> {
        let decoded = IAllowList::IAllowListCalls::abi_decode(input)
            .map_err(|err| AllowListError::Decode(err.to_string()))?;

        let call = match decoded {
            IAllowList::IAllowListCalls::modifyAllowList(call) => {
                // `uint8` decoding only looks at the low byte of the word.
                let word = input
                    .get(ROLE_WORD_OFFSET..ROLE_WORD_OFFSET + 32)
                    .ok_or_else(|| AllowListError::Decode("missing role word".to_string()))?;
                if word[..31].iter().any(|byte| *byte != 0) {
                    return Err(AllowListError::Decode("role out of range".to_string()));
                }
                let role = Role::try_from(call.role)
                    .map_err(|err| AllowListError::Decode(err.to_string()))?;
                Self::Modify {
                    target: call.target,
                    role,
                }
            }
            IAllowList::IAllowListCalls::readAllowList(call) => Self::Read {
                target: call.target,
            },
            IAllowList::IAllowListCalls::setAdmin(call) => Self::Modify {
                target: call.addr,
                role: Role::AdminRole,
            },
            IAllowList::IAllowListCalls::setEnabled(call) => Self::Modify {
                target: call.addr,
                role: Role::EnabledRole,
            },
            IAllowList::IAllowListCalls::setNone(call) => Self::Modify {
                target: call.addr,
                role: Role::NoRole,
            },
        };
        Ok(call)
    }

    /// The gas-table operation this call is charged as.
    pub const fn operation(&self) -> Operation {
        match self {
            Self::Modify { .. } => Operation::Modify,
            Self::Read { .. } => Operation::Read,
        }
    }

    /// Account the call is about.
    pub const fn target(&self) -> Address {
        match self {
            Self::Modify { target, .. } | Self::Read { target } => *target,
        }
    }
}

/// Builds the `RoleSet` log emitted by the allow list at `policy`.
pub fn role_set_log(
    policy: Address,
    account: Address,
    sender: Address,
    role: Role,
    old_role: Role,
) -> Log {
    let event = IAllowList::RoleSet {
        role: U256::from(role.as_u8()),
        account,
        sender,
        oldRole: U256::from(old_role.as_u8()),
    };
    Log {
        address: policy,
        data: event.encode_log_data(),
    }
}

/// Encodes a `modifyAllowList(target, role)` call.
pub fn pack_modify_allow_list(target: Address, role: Role) -> Bytes {
    IAllowList::modifyAllowListCall {
        target,
        role: role.as_u8(),
    }
    .abi_encode()
    .into()
}

/// Encodes a `readAllowList(target)` call.
pub fn pack_read_allow_list(target: Address) -> Bytes {
    IAllowList::readAllowListCall { target }.abi_encode().into()
}

/// Encodes the `set*` shorthand matching `role`.
pub fn pack_set_role(addr: Address, role: Role) -> Bytes {
    match role {
        Role::AdminRole => IAllowList::setAdminCall { addr }.abi_encode().into(),
        Role::EnabledRole => IAllowList::setEnabledCall { addr }.abi_encode().into(),
        Role::NoRole => IAllowList::setNoneCall { addr }.abi_encode().into(),
    }
}
