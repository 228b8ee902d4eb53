//! core
//!
//! Domain types, key composition, and configuration for fraudcheck.
//!
//! # Modules
//!
//! - [`types`] - Nodes, content parts, and classification results
//! - [`keys`] - Composite configuration key expansion
//! - [`config`] - Configuration store, resolution, and service settings
//!
//! # Design Principles
//!
//! - Nothing in this layer performs I/O except loading the config file
//! - Key composition is pure and order-preserving

pub mod config;
pub mod keys;
pub mod types;
