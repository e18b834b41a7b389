//! Catalog Provider implementations.
//!
//! [`StaticCatalog`] serves courses from a JSON document (the built-in seed
//! or a file); [`HttpCatalog`] fetches them from a hosted catalog service.

pub mod error;
pub mod http;
pub mod static_catalog;

pub use error::CatalogError;
pub use http::HttpCatalog;
pub use static_catalog::{CatalogDocument, StaticCatalog};
