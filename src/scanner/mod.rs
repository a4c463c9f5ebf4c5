pub mod cache;
pub mod service;
