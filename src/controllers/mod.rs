pub mod door;

use async_trait::async_trait;
use crate::bus::ReplyHandle;
use crate::errors::DoorBusResult;

pub use door::ProvidedDoor;

/// What a publish request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The door was put on the bus.
    Published,
    /// The door was already on the bus; its state was announced again.
    Reannounced,
}

/// The operations a published door offers, remotely or to the local harness.
///
/// Each operation is atomic with respect to the door's state.
#[async_trait]
pub trait DoorCapabilities: Send + Sync {
    /// Opens the door if it is closed. Replies `true` when the request changed the door.
    async fn open(&self, reply: ReplyHandle) -> DoorBusResult<bool>;

    /// Closes the door if it is open. Replies `true` when the request changed the door.
    async fn close(&self, reply: ReplyHandle) -> DoorBusResult<bool>;

    /// Inverts the open state and broadcasts it. Returns the new state.
    async fn flip_open(&self) -> DoorBusResult<bool>;

    /// Emits a pass-through event for `who` without touching the open state.
    async fn announce_pass_through(&self, who: &str) -> DoorBusResult<()>;

    /// Puts the door on the bus, or re-announces it when it is already there.
    async fn publish(&self) -> DoorBusResult<PublishOutcome>;

    /// Takes the door off the bus. Fails when the door is not registered.
    async fn retract(&self) -> DoorBusResult<()>;
}
