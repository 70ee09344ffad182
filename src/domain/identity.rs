//! Caller identity as resolved by the external identity provider

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::booking::BookingStatus;
use crate::domain::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Back-office staff; may drive any tabled transition
    Admin,
    /// Rental desk agent; hands vehicles over and takes them back
    Agent,
    /// End customer; books and cancels own reservations
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Agent => "agent",
            Self::Customer => "customer",
        }
    }

    /// Target statuses this role may request through a status change.
    pub fn may_set_status(&self, target: BookingStatus) -> bool {
        match self {
            Self::Admin => true,
            Self::Agent => matches!(target, BookingStatus::Active | BookingStatus::Completed),
            Self::Customer => false,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Customer
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "agent" => Ok(Self::Agent),
            "customer" | "user" => Ok(Self::Customer),
            other => Err(DomainError::InvalidInput(format!("Unknown role: {}", other))),
        }
    }
}

/// The authenticated caller of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn customer(user_id: Uuid) -> Self {
        Self::new(user_id, Role::Customer)
    }

    pub fn admin(user_id: Uuid) -> Self {
        Self::new(user_id, Role::Admin)
    }

    pub fn agent(user_id: Uuid) -> Self {
        Self::new(user_id, Role::Agent)
    }

    /// Owners and admins may act on a booking.
    pub fn may_manage(&self, owner_id: Uuid) -> bool {
        self.role.is_admin() || self.user_id == owner_id
    }
}
