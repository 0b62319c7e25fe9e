//! Core Palaver library (session controller, chat service client, config).

pub mod client;
pub mod config;
pub mod controller;
pub mod interrupt;
pub mod logging;
pub mod session;
