//! EmmyLua annotation generators for the xLua and toLua binding flavors

pub mod annotation;
pub mod chunk_writer;
pub mod dumper;
pub mod error;
pub mod flavor;
pub mod namespace_registry;
pub mod reference_tracker;
pub mod type_expr;

pub use dumper::{dumper_for, DumpOptions, DumpReport, Dumper, ToLuaDumper, XLuaDumper};
pub use error::{CodegenError, FormatError};
pub use flavor::Flavor;
