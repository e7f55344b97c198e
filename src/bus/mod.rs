pub mod adapter;
pub mod local_bus;

pub use adapter::{BusAdapter, InboundHandler, ReplyHandle};
pub use local_bus::LocalBus;
