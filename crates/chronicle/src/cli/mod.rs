//! Command-line surface for chronicle

pub mod commands;
pub mod display;
