pub mod door_registry;

pub use door_registry::DoorRegistry;
