//! # Door Representation

//! This module defines the data carried by a single published door: its bus path and the
//! `DoorState` record guarded by the door's lock.

use chrono::NaiveDateTime;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use crate::errors::{DoorBusError, DoorBusResult};
use crate::models::istates::{DoorPosition, RegistrationState};
use crate::models::local_now;

/// A bus-addressable object path such as `/Door/1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
pub struct ObjectPath(String);

impl ObjectPath {
    /// Validates and wraps an object path
    ///
    /// A path starts with `/`, and every segment after it is non-empty and made of
    /// ASCII alphanumerics or `_`. The root path `/` is not a valid door path.
    pub fn parse(path: &str) -> DoorBusResult<Self> {
        let segments = path
            .strip_prefix('/')
            .ok_or_else(|| DoorBusError::InvalidPath(path.to_string()))?;

        let valid = !segments.is_empty()
            && segments.split('/').all(|segment| {
                !segment.is_empty()
                    && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            });

        if valid {
            Ok(Self(path.to_string()))
        } else {
            Err(DoorBusError::InvalidPath(path.to_string()))
        }
    }

    /// Derives the path of the door at `position` (1-based) below `root`.
    pub fn indexed(root: &str, position: usize) -> DoorBusResult<Self> {
        Self::parse(&format!("{}{}", root, position))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The mutable record of a door. Only ever touched while the owning door's lock is held.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoorState {
    /// True when the door is open
    pub is_open: bool,
    /// Where the door stands with respect to the bus
    pub registration: RegistrationState,
    /// When `is_open` last changed, or when the door was created
    pub last_changed: NaiveDateTime,
}

impl DoorState {
    pub fn new(is_open: bool) -> Self {
        Self {
            is_open,
            registration: RegistrationState::Unpublished,
            last_changed: local_now(),
        }
    }

    /// Sets the open flag and stamps the change time. Returns the new value.
    pub fn set_open(&mut self, is_open: bool) -> bool {
        self.is_open = is_open;
        self.last_changed = local_now();
        is_open
    }

    pub fn position(&self) -> DoorPosition {
        DoorPosition::from(self.is_open)
    }

    pub fn is_registered(&self) -> bool {
        self.registration == RegistrationState::Registered
    }
}
