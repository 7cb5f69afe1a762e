//! Application boundary.
//!
//! [`ports`] holds the traits every external component is reached
//! through; [`commands`] the messages the tasks exchange.

pub mod commands;
pub mod ports;
