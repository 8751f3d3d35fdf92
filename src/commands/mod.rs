//! Operator commands

pub mod build;
pub mod check;
pub mod clean;
pub mod deploy;
pub mod watch;
