//! Bundled content packs.
//!
//! The engine is content-agnostic: maps, piece kinds, operations,
//! events, and flowcharts are all registered at setup. This module holds
//! packs that exercise the full surface, usable both as integration
//! fixtures and as a template for real scenarios.

pub mod frontier;
