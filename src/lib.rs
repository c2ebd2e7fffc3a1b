pub mod server;

pub mod monitor;
pub mod notifications;
pub mod web;
pub mod version;
