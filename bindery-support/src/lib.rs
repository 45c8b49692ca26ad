//! # Bindery Support
//!
//! Shared utilities for the Bindery container crates.
//!
//! This crate provides:
//! - Text rendering for resolution chains in error messages
//! - Type-name shortening and "did you mean?" suggestion helpers

pub mod rendering;
