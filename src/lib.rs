//! Docintel Server Library
//!
//! Document-intelligence HTTP service. The server binary is in main.rs.
//!
//! # Modules
//!
//! - `ocr`: Region recognition for screen captures (crop mapping, preprocessing, engine output)
//! - `sds`: Safety Data Sheet verification for remote PDFs
//! - `executor`: Deadline-bounded execution of slow work
//! - `routes`: HTTP surface

pub mod config;
pub mod error;
pub mod executor;
pub mod ocr;
pub mod routes;
pub mod sds;
pub mod state;
