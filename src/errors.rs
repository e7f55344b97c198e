/// # Door Bus Errors
/// This module defines the `DoorBusError` enum, which encapsulates all potential errors that can occur within the door provider.
/// The variants separate bootstrap failures, bus failures reported back to the operator, and plain local faults,
/// so callers can decide which of them are fatal and which only need to be reported.


use thiserror::Error;
use std::io;
use tokio::sync::oneshot::error::RecvError;

#[derive(Error, Debug)]
pub enum DoorBusError {
    /// Represents errors arising from misconfigurations or invalid settings.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Represents standard input/output errors.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// The bus connection is not available.
    #[error("Bus connection error: {0}")]
    ConnectionError(String),

    /// The bus refused to register an object.
    #[error("Registration refused for {path}: {reason}")]
    RegistrationRefused { path: String, reason: String },

    /// A retract (or other registered-only operation) was attempted on an object that is not on the bus.
    #[error("Object {0} is not registered on the bus")]
    NotRegistered(String),

    /// No registered object answers on the requested path.
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// The supplied object path is not a valid bus path.
    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    /// The supplied location label cannot be used for a door.
    #[error("Invalid location: {0:?}")]
    InvalidLocation(String),

    /// Represents errors when sending data over a channel.
    #[error("Channel send error: {0}")]
    ChannelSendError(String),

    /// Represents errors when receiving data from a channel.
    #[error("Channel receive error: {0}")]
    ChannelRecvError(String),

    /// Every door failed to construct or publish.
    #[error("No doors available")]
    NoDoorsAvailable,
}

impl From<RecvError> for DoorBusError {
    fn from(err: RecvError) -> Self {
        DoorBusError::ChannelRecvError(err.to_string())
    }
}


impl From<config::ConfigError> for DoorBusError {
    fn from(err: config::ConfigError) -> Self {
        DoorBusError::ConfigError(err.to_string())
    }
}

pub type DoorBusResult<T> = Result<T, DoorBusError>;
