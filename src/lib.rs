pub mod config;
pub mod dataset;
pub mod detector;
pub mod errors;
pub mod export;
pub mod render;
pub mod server;
pub mod session;
pub mod store;
