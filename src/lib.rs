//! emitgen - build-time call-site tables for instrumentation callbacks
//!
//! This library finds where registered metric and log callbacks are actually
//! invoked in a type-checked package and attaches their metadata (event name,
//! property keys, metric kind, enclosing function, file and line) to those
//! invocation sites, so a runtime library can look call sites up instead of
//! walking the stack.

pub mod analysis;
pub mod cli;
pub mod codegen;
pub mod generator;
pub mod loader;
pub mod profile;
pub mod tree;
