//! # Door State Enums

//! Enums describing where a door stands with respect to the bus and its physical position.

use serde::{Deserialize, Serialize};
use derive_more::{Display, FromStr};

/// Represents the registration of a door on the bus.
#[derive(Debug, Clone, PartialEq, Eq, Copy, Serialize, Deserialize, Display, FromStr)]
pub enum RegistrationState {
    /// The door is not reachable through the bus.
    Unpublished,
    /// The door is registered and receives remote invocations.
    Registered,
    /// A publish or retract request is in flight.
    Pending,
}

/// Represents the position of the door: open or closed.
#[derive(Debug, Clone, PartialEq, Eq, Copy, Serialize, Deserialize, Display, FromStr)]
pub enum DoorPosition {
    /// The door is open.
    #[display("open")]
    Open,
    /// The door is closed.
    #[display("closed")]
    Closed,
}

impl From<bool> for DoorPosition {
    fn from(is_open: bool) -> Self {
        if is_open {
            DoorPosition::Open
        } else {
            DoorPosition::Closed
        }
    }
}
