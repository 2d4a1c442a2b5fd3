//! Record layouts. NetFlow v5 has one fixed 48-byte layout; IPFIX
//! layouts are assembled from configuration and announced to the
//! collector in template sets.

mod field_types;
mod layout;
mod manager;

pub use field_types::{Element, ElementKind};
pub use layout::{Template, TemplateError, TemplateField, ENTERPRISE_BIT};
pub use manager::TemplateManager;
