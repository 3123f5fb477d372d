//! External toolchain invocation

pub mod go;

pub use go::GoTool;
