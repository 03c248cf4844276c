//! Core type catalog and normalization passes for emmydump

pub mod catalog;
pub mod error;
pub mod merge;
pub mod naming;

pub use catalog::{Catalog, CatalogBuilder, TypeDeclaration, TypeKind};
pub use error::CoreError;
pub use merge::{GenericMerger, MergeOutcome};
