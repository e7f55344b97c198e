use std::sync::{Arc, Weak};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::bus::{BusAdapter, InboundHandler, ReplyHandle};
use crate::controllers::{DoorCapabilities, PublishOutcome};
use crate::errors::{DoorBusError, DoorBusResult};
use crate::models::{DoorEvent, DoorState, ObjectPath, RegistrationState};

/// A door published on the bus
///
/// All state lives behind one lock. Every operation takes the lock for its full duration, including
/// the update, event or reply it sends, so remote calls and local commands on the same door are
/// applied one at a time and each transition is followed by exactly its own notification.
pub struct ProvidedDoor {
    /// Human-readable location, never empty
    location: String,
    /// The path the door is published under
    path: ObjectPath,
    state: Mutex<DoorState>,
    bus: Arc<dyn BusAdapter>,
    /// Handed to the bus on publish; the bus never owns the door
    this: Weak<ProvidedDoor>,
}

impl ProvidedDoor {
    /// Creates an unpublished door
    ///
    /// # Arguments
    ///
    /// * `bus`: The bus the door publishes itself on
    /// * `location`: Where the door is; must not be blank
    /// * `is_open`: The initial open state
    /// * `path`: The object path to publish under
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<ProvidedDoor>)` if the location is usable
    /// * `Err(DoorBusError::InvalidLocation)` otherwise
    pub fn new(
        bus: Arc<dyn BusAdapter>,
        location: &str,
        is_open: bool,
        path: ObjectPath,
    ) -> DoorBusResult<Arc<Self>> {
        if location.trim().is_empty() {
            return Err(DoorBusError::InvalidLocation(location.to_string()));
        }

        Ok(Arc::new_cyclic(|this| Self {
            location: location.trim().to_string(),
            path,
            state: Mutex::new(DoorState::new(is_open)),
            bus,
            this: this.clone(),
        }))
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    /// Returns a copy of the current state.
    pub async fn snapshot(&self) -> DoorState {
        self.state.lock().await.clone()
    }

    pub async fn is_open(&self) -> bool {
        self.state.lock().await.is_open
    }

    pub async fn registration_state(&self) -> RegistrationState {
        self.state.lock().await.registration
    }

    /// Broadcasts the current state. A failed broadcast is logged; observers simply miss it.
    async fn notify(&self, is_open: bool) {
        if let Err(e) = self.bus.broadcast_update(&self.path, is_open).await {
            warn!("Failed to broadcast state of door @ {}: {}", self.location, e);
        }
    }

    /// Moves the door to `target` if it is not there yet, then replies.
    ///
    /// A door that is off the bus refuses the request: it replies `false` and keeps its state.
    async fn request_position(&self, target: bool, reply: ReplyHandle) -> DoorBusResult<bool> {
        let mut state = self.state.lock().await;
        let verb = if target { "open" } else { "close" };
        info!("Door @ {} was requested to {}.", self.location, verb);

        if !state.is_registered() {
            warn!("... but it is not on the bus, refusing.");
            self.bus.send_reply(reply, false).await?;
            return Err(DoorBusError::NotRegistered(self.path.to_string()));
        }

        let complied = if state.is_open == target {
            info!("... but it was already {}.", state.position());
            false
        } else {
            info!("... and it was {}, so we can comply.", state.position());
            let is_open = state.set_open(target);
            self.notify(is_open).await;
            true
        };

        self.bus.send_reply(reply, complied).await?;
        Ok(complied)
    }
}

#[async_trait]
impl DoorCapabilities for ProvidedDoor {
    async fn open(&self, reply: ReplyHandle) -> DoorBusResult<bool> {
        self.request_position(true, reply).await
    }

    async fn close(&self, reply: ReplyHandle) -> DoorBusResult<bool> {
        self.request_position(false, reply).await
    }

    async fn flip_open(&self) -> DoorBusResult<bool> {
        let mut state = self.state.lock().await;
        let action = if state.is_open { "Closing" } else { "Opening" };
        info!("{} door @ {}.", action, self.location);

        let is_open = !state.is_open;
        state.set_open(is_open);
        self.notify(is_open).await;
        Ok(is_open)
    }

    async fn announce_pass_through(&self, who: &str) -> DoorBusResult<()> {
        let _state = self.state.lock().await;
        info!("{} will pass through door @ {}.", who, self.location);
        self.bus
            .emit_event(&self.path, DoorEvent::PersonPassedThrough { who: who.to_string() })
            .await
    }

    async fn publish(&self) -> DoorBusResult<PublishOutcome> {
        let mut state = self.state.lock().await;

        if state.is_registered() {
            info!("Door @ {} is already on the bus, re-announcing its state", self.location);
            self.bus.broadcast_update(&self.path, state.is_open).await?;
            return Ok(PublishOutcome::Reannounced);
        }

        let previous = state.registration;
        state.registration = RegistrationState::Pending;
        let handler: Weak<dyn InboundHandler> = self.this.clone();
        match self.bus.register(&self.path, handler).await {
            Ok(()) => {
                state.registration = RegistrationState::Registered;
                info!("Door @ {} published at {}", self.location, self.path);
                Ok(PublishOutcome::Published)
            }
            Err(e) => {
                state.registration = previous;
                error!("Failed to publish door @ {}: {}", self.location, e);
                Err(e)
            }
        }
    }

    async fn retract(&self) -> DoorBusResult<()> {
        let mut state = self.state.lock().await;

        if !state.is_registered() {
            return Err(DoorBusError::NotRegistered(self.path.to_string()));
        }

        state.registration = RegistrationState::Pending;
        match self.bus.deregister(&self.path).await {
            Ok(()) => {
                state.registration = RegistrationState::Unpublished;
                info!("Door @ {} removed from the bus", self.location);
                Ok(())
            }
            Err(e) => {
                state.registration = RegistrationState::Registered;
                error!("Failed to remove door @ {} from the bus: {}", self.location, e);
                Err(e)
            }
        }
    }
}

#[async_trait]
impl InboundHandler for ProvidedDoor {
    async fn on_open_requested(&self, reply: ReplyHandle) {
        if let Err(e) = self.open(reply).await {
            error!("Open on door @ {} failed: {}", self.location, e);
        }
    }

    async fn on_close_requested(&self, reply: ReplyHandle) {
        if let Err(e) = self.close(reply).await {
            error!("Close on door @ {} failed: {}", self.location, e);
        }
    }
}

impl std::fmt::Debug for ProvidedDoor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvidedDoor")
            .field("location", &self.location)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

