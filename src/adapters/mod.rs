//! Concrete adapter implementations for ports.

pub mod csv_broker_adapter;
pub mod file_config_adapter;
