use std::sync::Weak;
use async_trait::async_trait;
use tokio::sync::oneshot;
use crate::errors::{DoorBusError, DoorBusResult};
use crate::models::{DoorEvent, DoorMethod, ObjectPath};

/// The pending reply to one remote method call.
///
/// `send` consumes the handle, so a reply can be completed at most once.
#[derive(Debug)]
pub struct ReplyHandle {
    path: ObjectPath,
    method: DoorMethod,
    sender: oneshot::Sender<bool>,
}

impl ReplyHandle {
    /// Creates a reply handle together with the receiver the caller waits on.
    pub fn channel(path: ObjectPath, method: DoorMethod) -> (Self, oneshot::Receiver<bool>) {
        let (sender, receiver) = oneshot::channel();
        (Self { path, method, sender }, receiver)
    }

    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    pub fn method(&self) -> DoorMethod {
        self.method
    }

    /// Completes the call with `value`.
    pub fn send(self, value: bool) -> DoorBusResult<()> {
        self.sender.send(value).map_err(|_| {
            DoorBusError::ChannelSendError(format!(
                "caller of {:?} on {} is gone", self.method, self.path
            ))
        })
    }
}

/// Receives remote invocations the bus routes to a registered object.
#[async_trait]
pub trait InboundHandler: Send + Sync {
    async fn on_open_requested(&self, reply: ReplyHandle);

    async fn on_close_requested(&self, reply: ReplyHandle);
}

/// The narrow interface a door needs from the bus.
///
/// The bus only ever holds weak references to registered objects; whoever constructed an object
/// keeps it alive.
#[async_trait]
pub trait BusAdapter: Send + Sync {
    /// Makes `handler` reachable under `path`.
    async fn register(&self, path: &ObjectPath, handler: Weak<dyn InboundHandler>) -> DoorBusResult<()>;

    /// Removes the object at `path` from the bus.
    async fn deregister(&self, path: &ObjectPath) -> DoorBusResult<()>;

    /// Sends the reply of a remote call.
    async fn send_reply(&self, reply: ReplyHandle, value: bool) -> DoorBusResult<()> {
        reply.send(value)
    }

    /// Broadcasts the current open state of the object at `path`.
    async fn broadcast_update(&self, path: &ObjectPath, is_open: bool) -> DoorBusResult<()>;

    /// Emits a one-way event from the object at `path`.
    async fn emit_event(&self, path: &ObjectPath, event: DoorEvent) -> DoorBusResult<()>;
}
