//! Site Registry: validated sites loaded from CSV or JSON and looked up by id.

pub mod error;
pub mod site_registry;
