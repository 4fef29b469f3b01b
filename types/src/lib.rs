//! Shared types for the landing page effects.
//!
//! Configuration lives here so the native engine and the wasm entry point
//! read the same structures; number formatting lives here so every counter
//! and style value is rendered consistently.

mod config;
pub mod formatting;

pub use config::*;
