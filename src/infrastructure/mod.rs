//! Infrastructure layer: configuration and other externals.

pub mod config;
