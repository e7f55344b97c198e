pub mod bus;
pub mod config;
pub mod controllers;
pub mod dispatcher;
pub mod errors;
pub mod init;
pub mod models;
pub mod state_management;
pub mod utils;
