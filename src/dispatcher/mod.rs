pub mod command;
pub mod round_robin;

pub use command::{DoorCommand, HELP};
pub use round_robin::{HarnessContext, LoopControl, RoundRobinDispatcher};
