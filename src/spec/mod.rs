//! Spec layer
//! - types.rs: component spec and kind
//! - document.rs: spec and defaults document loading
//! - defaults.rs: layered defaulting
//! - validate.rs: required-field validation
//! - enrich.rs: source kind and locator derivation
//! - error.rs: spec errors

pub mod defaults;
pub mod document;
pub mod enrich;
pub mod error;
pub mod types;
pub mod validate;

pub use document::{DefaultsDocument, SpecDocument};
pub use enrich::{Locator, enrich};
pub use error::SpecError;
pub use types::{ComponentSpec, Kind, SpecMap};
