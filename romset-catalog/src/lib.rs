//! Catalog model for 1G1R selection: name facet extraction and the
//! Parent/Clone game grouping built from DAT records.

pub mod error;
pub mod model;
pub mod name_parser;

pub use error::CatalogError;
pub use model::{
    Catalog, FileIdentity, Game, Overrides, RomEntry, RomRef, Variant, VariantRecord, VariantRef,
};
pub use name_parser::{Facets, extract};
