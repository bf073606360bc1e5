//! Command handlers, one module per command group

pub mod bookmark;
pub mod config;
pub mod label;
pub mod schemes;
