//! modpak - Cloud Native Buildpack for Go modules
//!
//! Detects Go-module applications, caches dependency downloads in a
//! fingerprinted cache layer, and compiles the app into a launch layer.

pub mod cli;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod layer;
pub mod plan;
pub mod toolchain;

pub use error::{BuildpackError, BuildpackResult};
