//! Application layer use cases for the server.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure business rules) and the infrastructure (files, sockets).  Use cases
//! here orchestrate domain objects, depend on traits rather than concrete
//! providers, and perform no I/O of their own.
//!
//! # Sub-modules
//!
//! - **`schedule`**      – Converts timing intents into the capped
//!   decisecond schedule stored by the device.
//!
//! - **`serve_request`** – Runs one exchange: validate the Request, render,
//!   quantize, encode, and build the Response.

pub mod schedule;
pub mod serve_request;
