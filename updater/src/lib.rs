//! Updater runtime (C1-C5): source clients, composite aggregator, price
//! relay, controller/supervisor, and transaction builder, wired together as
//! two cooperatively scheduled Tokio tasks in one process (§5's explicitly
//! allowed implementation choice) joined by the relay<->controller message
//! contract of §6.

pub mod aggregator;
pub mod circuit_breaker;
pub mod config;
pub mod controller;
pub mod error;
pub mod key_handle;
pub mod lock_file;
pub mod pda;
pub mod relay;
pub mod rpc;
pub mod source_clients;
pub mod supervisor;
pub mod tracing_logger;
pub mod tx_builder;
pub mod validator;
pub mod venues;
