//! Resolution of component version specs against upstream registries
//!
//! - [`spec`]: spec and defaults documents, defaulting, validation, locators
//! - [`version`]: upstream queries, row normalization and version selection
//! - [`resolve`]: batch orchestration
//! - [`output`]: dotenv/json/yaml rendering

pub mod config;
pub mod output;
pub mod resolve;
pub mod spec;
pub mod version;
