//! Resolver and event-processing services.

pub mod attribute_store;
pub mod config_values;
pub mod event_processor;
pub mod resolver;
