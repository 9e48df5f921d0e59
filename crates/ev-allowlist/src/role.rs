//! Privilege levels held by accounts in an allow list.
//!
//! Roles form a closed, totally ordered set:
//!
//! | Value | Role | Meaning |
//! |-------|------|---------|
//! | `0` | [`Role::NoRole`] | Default for every account never written |
//! | `1` | [`Role::EnabledRole`] | May use the gated feature |
//! | `2` | [`Role::AdminRole`] | May use the feature and change any role |
//!
//! The numeric value is what gets persisted in the precompile's storage and
//! what `readAllowList` returns, as a 32-byte big-endian word.

use alloy_primitives::{B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Role assigned to an account within one allow list.
///
/// Variants are declared in ascending privilege, so the derived [`Ord`] is the
/// privilege order: `NoRole < EnabledRole < AdminRole`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Role {
    /// No privileges.
    #[default]
    NoRole = 0,
    /// Allowed to use the gated feature.
    EnabledRole = 1,
    /// Allowed to use the gated feature and to modify the allow list.
    AdminRole = 2,
}

impl Role {
    /// All roles in ascending privilege.
    pub const ALL: [Self; 3] = [Self::NoRole, Self::EnabledRole, Self::AdminRole];

    /// Returns true if an account holding this role may grant or revoke roles.
    ///
    /// Only admins may, whatever the requested role or the target's current one.
    pub const fn can_grant(self) -> bool {
        matches!(self, Self::AdminRole)
    }

    /// Returns true if the role permits using the gated feature.
    pub const fn is_enabled(self) -> bool {
        matches!(self, Self::EnabledRole | Self::AdminRole)
    }

    /// Numeric value of the role.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Encodes the role as a storage / return word (value in the low byte).
    pub const fn to_word(self) -> B256 {
        B256::with_last_byte(self.as_u8())
    }

    /// Decodes a role from a storage / return word.
    pub fn from_word(word: B256) -> Result<Self, InvalidRole> {
        if word[..31].iter().any(|byte| *byte != 0) {
            return Err(InvalidRole(U256::from_be_bytes(word.0)));
        }
        Self::try_from(word[31])
    }
}

impl TryFrom<u8> for Role {
    type Error = InvalidRole;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::NoRole),
            1 => Ok(Self::EnabledRole),
            2 => Ok(Self::AdminRole),
            other => Err(InvalidRole(U256::from(other))),
        }
    }
}

impl From<Role> for u8 {
    fn from(role: Role) -> Self {
        role.as_u8()
    }
}

impl From<Role> for U256 {
    fn from(role: Role) -> Self {
        Self::from(role.as_u8())
    }
}

impl From<Role> for B256 {
    fn from(role: Role) -> Self {
        role.to_word()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoRole => "none",
            Self::EnabledRole => "enabled",
            Self::AdminRole => "admin",
        };
        f.write_str(name)
    }
}

/// A numeric value that does not name any [`Role`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid role value {0}")]
pub struct InvalidRole(pub U256);
