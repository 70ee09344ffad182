//! Booking lifecycle state machine
//!
//! ```text
//! PENDING ──► CONFIRMED ──► ACTIVE ──► COMPLETED
//!    │            │
//!    ├──► REJECTED└──► CANCELLED
//!    └──► CANCELLED
//! ```
//!
//! COMPLETED, CANCELLED and REJECTED are terminal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::identity::Role;
use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Active,
    Completed,
    Cancelled,
    Rejected,
}

impl BookingStatus {
    /// Statuses that hold the vehicle for their interval.
    pub const HOLDING: [BookingStatus; 3] = [Self::Pending, Self::Confirmed, Self::Active];

    pub const ALL: [BookingStatus; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::Active,
        Self::Completed,
        Self::Cancelled,
        Self::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Transition table: allowed targets from this status.
    pub fn allowed_transitions(&self) -> &'static [BookingStatus] {
        match self {
            Self::Pending => &[Self::Confirmed, Self::Rejected, Self::Cancelled],
            Self::Confirmed => &[Self::Active, Self::Cancelled],
            Self::Active => &[Self::Completed],
            Self::Completed | Self::Cancelled | Self::Rejected => &[],
        }
    }

    pub fn can_transition_to(&self, target: BookingStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    pub fn holds_vehicle(&self) -> bool {
        Self::HOLDING.contains(self)
    }

    /// Entering this status frees the vehicle for new bookings.
    pub fn releases_vehicle(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Rejected)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DomainError::InvalidInput(format!("Unknown booking status: {}", s)))
    }
}

/// Check that `role` may move a booking from `from` to `to`.
///
/// The transition table is consulted first, so a transition outside it is
/// `IllegalTransition` for every role; a tabled transition outside the
/// role's subset is `Forbidden`.
pub fn ensure_transition(from: BookingStatus, to: BookingStatus, role: Role) -> DomainResult<()> {
    if !from.can_transition_to(to) {
        return Err(DomainError::IllegalTransition { from, to });
    }
    if !role.may_set_status(to) {
        return Err(DomainError::Forbidden(format!(
            "Role {} may not move a booking to {}",
            role, to
        )));
    }
    Ok(())
}
