//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time (performance clock on web)
//! - Logger and panic hook setup
//! - Exposing the session to the page as a `wasm-bindgen` class

#[cfg(target_arch = "wasm32")]
pub mod web;
