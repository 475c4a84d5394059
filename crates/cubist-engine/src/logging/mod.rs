//! Logger setup.
//!
//! Everything in the engine logs through the `log` facade; this module only
//! wires up the `env_logger` backend for binaries that want the default.

mod init;

pub use init::{init_logging, LoggingConfig};
