//! Library crate for scan-console-rs exposing reusable modules.
pub mod client;
pub mod control;
pub mod format;
pub mod panel;
pub mod poller;
pub mod ports;
pub mod settings;
pub mod types;
