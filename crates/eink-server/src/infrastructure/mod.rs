//! Infrastructure layer for the server.
//!
//! Contains the adapters that touch the outside world.  At present that is
//! the TOML configuration file; transports live in the embedding application.
//!
//! **Dependency rule**: this layer may depend on `application` and `domain`,
//! but MUST NOT be imported by them.

pub mod config;
