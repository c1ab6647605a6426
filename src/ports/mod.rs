//! Port traits separating the domain from I/O.

pub mod config_port;
pub mod swap_port;
