// ABOUTME: Library root for fleetvisor - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod cleanup;
pub mod config;
pub mod diagnostics;
pub mod discovery;
pub mod drain;
pub mod error;
pub mod fanout;
pub mod orchestrator;
pub mod output;
pub mod process_state;
pub mod report;
pub mod rolling;
pub mod starter;
pub mod stopper;
pub mod supervisor;
pub mod types;
