//! PANS-OPS CLI - command line front end for the surface engine.
//!
//! This crate provides the `pansops` binary, which reads a JSON calculation
//! request, runs it through `pansops-core` and writes the surfaces as JSON.

pub mod config;
pub mod oas_table;
pub mod request;

pub use config::Config;
pub use oas_table::{load_oas_constants, parse_oas_constants};
pub use request::{run, Input, Output};
