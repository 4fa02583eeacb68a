//! Subcommand implementations

pub mod configure;
pub mod inspect;
pub mod predict;
