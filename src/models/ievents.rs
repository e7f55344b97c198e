//! # Bus Traffic Definitions

//! This module defines what a door puts on the bus: property updates, one-way events and replies,
//! plus the registration announcements the bus itself makes. Observers receive these as `BusMessage`s.

use serde::{Deserialize, Serialize};
use crate::models::idoor::ObjectPath;

/// One-way events a door can emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoorEvent {
    /// Someone passed through the door
    PersonPassedThrough { who: String },
}

impl DoorEvent {
    /// The interface member name of the event
    pub fn name(&self) -> &'static str {
        match self {
            DoorEvent::PersonPassedThrough { .. } => "PersonPassedThrough",
        }
    }
}

/// Remote methods a door answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoorMethod {
    Open,
    Close,
}

/// Represents everything observable on the bus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusMessage {
    /// An object was registered and announced under `path`
    Registered { path: ObjectPath },
    /// An object was removed from the bus
    Deregistered { path: ObjectPath },
    /// Property update carrying the current open state of the door at `path`
    Update { path: ObjectPath, is_open: bool },
    /// A one-way event emitted by the door at `path`
    Event { path: ObjectPath, event: DoorEvent },
    /// The reply to a remote method call
    Reply { path: ObjectPath, method: DoorMethod, value: bool },
}

impl BusMessage {
    /// Retrieves the object path the message concerns
    pub fn path(&self) -> &ObjectPath {
        match self {
            BusMessage::Registered { path } => path,
            BusMessage::Deregistered { path } => path,
            BusMessage::Update { path, .. } => path,
            BusMessage::Event { path, .. } => path,
            BusMessage::Reply { path, .. } => path,
        }
    }
}
