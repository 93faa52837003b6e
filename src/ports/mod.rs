//! Port traits between the domain and the outside world.

pub mod broker_port;
pub mod config_port;
