use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Weak;
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use crate::bus::adapter::{BusAdapter, InboundHandler, ReplyHandle};
use crate::config::BusSettings;
use crate::errors::{DoorBusError, DoorBusResult};
use crate::models::{BusMessage, DoorEvent, DoorMethod, ObjectPath};

/// An in-process bus.
///
/// Registered objects are reachable through `request_open` / `request_close`, which deliver the
/// call on a task of their own, the way a transport's worker threads would. Everything the
/// objects send out is fanned out to every subscriber as a `BusMessage`.
pub struct LocalBus {
    /// Registered objects by path
    objects: DashMap<ObjectPath, Weak<dyn InboundHandler>>,
    /// Outbound traffic fan-out
    traffic: broadcast::Sender<BusMessage>,
    /// Paths the bus refuses to register
    denied_paths: RwLock<HashSet<String>>,
    connected: AtomicBool,
}

impl LocalBus {
    /// Creates a connected bus from the bus settings.
    pub fn new(settings: &BusSettings) -> Self {
        let (traffic, _) = broadcast::channel(settings.traffic_capacity.max(1));
        Self {
            objects: DashMap::new(),
            traffic,
            denied_paths: RwLock::new(settings.denied_paths.iter().cloned().collect()),
            connected: AtomicBool::new(true),
        }
    }

    /// Subscribes to everything sent on the bus from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.traffic.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Simulates losing (or regaining) the bus connection.
    pub fn set_connected(&self, connected: bool) {
        info!("Bus connection {}", if connected { "restored" } else { "lost" });
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Makes the bus refuse future registrations on `path`.
    pub fn deny_path(&self, path: &str) {
        self.denied_paths.write().insert(path.to_string());
    }

    pub fn is_registered(&self, path: &ObjectPath) -> bool {
        self.objects
            .get(path)
            .map(|handler| handler.strong_count() > 0)
            .unwrap_or(false)
    }

    pub fn registered_paths(&self) -> Vec<ObjectPath> {
        let mut paths: Vec<ObjectPath> = self.objects.iter().map(|entry| entry.key().clone()).collect();
        paths.sort();
        paths
    }

    /// Calls `Open` on the object at `path` and waits for its reply.
    pub async fn request_open(&self, path: &ObjectPath) -> DoorBusResult<bool> {
        self.request(path, DoorMethod::Open).await
    }

    /// Calls `Close` on the object at `path` and waits for its reply.
    pub async fn request_close(&self, path: &ObjectPath) -> DoorBusResult<bool> {
        self.request(path, DoorMethod::Close).await
    }

    async fn request(&self, path: &ObjectPath, method: DoorMethod) -> DoorBusResult<bool> {
        self.ensure_connected()?;
        let handler = self.objects
            .get(path)
            .and_then(|handler| handler.upgrade())
            .ok_or_else(|| DoorBusError::ObjectNotFound(path.to_string()))?;

        debug!("Delivering {:?} to {}", method, path);
        let (reply, receiver) = ReplyHandle::channel(path.clone(), method);
        tokio::spawn(async move {
            match method {
                DoorMethod::Open => handler.on_open_requested(reply).await,
                DoorMethod::Close => handler.on_close_requested(reply).await,
            }
        });

        Ok(receiver.await?)
    }

    /// Spawns a task logging every message on the bus as JSON.
    pub fn spawn_traffic_logger(&self) -> JoinHandle<()> {
        let mut receiver = self.subscribe();
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(message) => match serde_json::to_string(&message) {
                        Ok(json) => debug!("Bus traffic: {}", json),
                        Err(e) => error!("Failed to serialize bus traffic: {:?}", e),
                    },
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Bus traffic logger skipped {} messages", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    fn ensure_connected(&self) -> DoorBusResult<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(DoorBusError::ConnectionError("bus connection is not available".to_string()))
        }
    }

    fn publish_traffic(&self, message: BusMessage) {
        // No observers is not an error for fire-and-forget traffic
        if self.traffic.send(message).is_err() {
            debug!("No bus observers subscribed");
        }
    }
}

#[async_trait]
impl BusAdapter for LocalBus {
    async fn register(&self, path: &ObjectPath, handler: Weak<dyn InboundHandler>) -> DoorBusResult<()> {
        self.ensure_connected()?;

        if self.denied_paths.read().contains(path.as_str()) {
            return Err(DoorBusError::RegistrationRefused {
                path: path.to_string(),
                reason: "path denied by bus policy".to_string(),
            });
        }
        match self.objects.entry(path.clone()) {
            Entry::Occupied(entry) if entry.get().strong_count() > 0 => {
                return Err(DoorBusError::RegistrationRefused {
                    path: path.to_string(),
                    reason: "path already in use".to_string(),
                });
            }
            Entry::Occupied(mut entry) => {
                entry.insert(handler);
            }
            Entry::Vacant(entry) => {
                entry.insert(handler);
            }
        }
        info!("Registered object at {}", path);
        self.publish_traffic(BusMessage::Registered { path: path.clone() });
        Ok(())
    }

    async fn deregister(&self, path: &ObjectPath) -> DoorBusResult<()> {
        self.ensure_connected()?;
        self.objects
            .remove(path)
            .ok_or_else(|| DoorBusError::NotRegistered(path.to_string()))?;

        info!("Deregistered object at {}", path);
        self.publish_traffic(BusMessage::Deregistered { path: path.clone() });
        Ok(())
    }

    async fn send_reply(&self, reply: ReplyHandle, value: bool) -> DoorBusResult<()> {
        self.publish_traffic(BusMessage::Reply {
            path: reply.path().clone(),
            method: reply.method(),
            value,
        });
        reply.send(value)
    }

    async fn broadcast_update(&self, path: &ObjectPath, is_open: bool) -> DoorBusResult<()> {
        self.ensure_connected()?;
        if !self.is_registered(path) {
            debug!("Dropping update from unregistered object {}", path);
            return Ok(());
        }
        self.publish_traffic(BusMessage::Update { path: path.clone(), is_open });
        Ok(())
    }

    async fn emit_event(&self, path: &ObjectPath, event: DoorEvent) -> DoorBusResult<()> {
        self.ensure_connected()?;
        if !self.is_registered(path) {
            debug!("Dropping {} event from unregistered object {}", event.name(), path);
            return Ok(());
        }
        self.publish_traffic(BusMessage::Event { path: path.clone(), event });
        Ok(())
    }
}
