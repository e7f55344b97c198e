pub mod idoor;
pub mod ievents;
pub mod istates;

pub use idoor::*;
pub use ievents::*;
pub use istates::*;

use chrono::{Local, NaiveDateTime};

pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}
