pub mod commands;
pub mod config;
pub mod notify;
pub mod scanner;
pub mod server;
pub mod store;
pub mod youtube;
