//! Exported vs. referenced type bookkeeping
//!
//! Declarations routinely mention types that never made it into the
//! catalog (engine internals, BCL types nobody exported). Tooling reports
//! those as undefined unless a stub exists, so the tracker collects them
//! while a flavor is being dumped.
//!
//! ## Usage
//!
//! ```ignore
//! let mut tracker = ReferenceTracker::new("CS.");
//!
//! // Pass 1: everything that will be emitted
//! tracker.collect_exported_types(&types);
//!
//! // Pass 2: every type string an exported declaration mentions
//! tracker.check_and_record_type("UnityEngine.Object");
//!
//! tracker.dump_unexported_types(&out_dir, "xlua_unexported.lua")?;
//! ```

use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs::File;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use emmydump_core::catalog::TypeDeclaration;
use emmydump_core::naming::{display_name, qualify};
use indexmap::IndexSet;
use tracing::{debug, warn};

use crate::annotation::META_HEADER;
use crate::type_expr::lua_primitive;
use crate::CodegenError;

#[derive(Debug)]
pub struct ReferenceTracker {
    /// Root table prefix used when writing stubs (e.g. "CS.")
    type_prefix: String,
    /// Normalized full names of every declaration in the catalog
    exported: HashSet<String>,
    /// Referenced-but-unexported names in first-seen order
    unexported: IndexSet<String>,
    collected: bool,
}

impl ReferenceTracker {
    pub fn new(type_prefix: impl Into<String>) -> Self {
        Self {
            type_prefix: type_prefix.into(),
            exported: HashSet::new(),
            unexported: IndexSet::new(),
            collected: false,
        }
    }

    /// Pass 1: remember the identity of every declaration that will be emitted
    pub fn collect_exported_types(&mut self, types: &[TypeDeclaration]) {
        for decl in types {
            self.exported
                .insert(display_name(&qualify(decl.namespace(), decl.name())));
        }
        self.collected = true;
        debug!("Collected {} exported types", self.exported.len());
    }

    /// Reduce a display string to the type it is built on
    ///
    /// `System.Collections.Generic.List<int>[]` becomes
    /// `System.Collections.Generic.List`, `Nullable<Foo>` and `Foo?` become
    /// `Foo`, `Outer+Inner` becomes `Outer.Inner`.
    pub fn normalize_type_name(type_name: &str) -> String {
        let mut name = type_name.trim();
        for modifier in ["ref ", "out ", "in ", "params "] {
            if let Some(rest) = name.strip_prefix(modifier) {
                name = rest.trim_start();
            }
        }

        if let Some(open) = name.find('<') {
            let head = &name[..open];
            if matches!(head, "Nullable" | "System.Nullable" | "Nullable`1" | "System.Nullable`1") {
                if let Some(close) = name.rfind('>') {
                    if close > open {
                        return Self::normalize_type_name(&name[open + 1..close]);
                    }
                }
            }
            name = head;
        }
        if let Some(bracket) = name.find('[') {
            name = &name[..bracket];
        }
        let name = name.trim_end_matches(&['*', '&', '?'][..]).trim();

        display_name(name)
    }

    /// Pass 2: record `type_name` if it is a user type nobody exports
    ///
    /// Returns `true` when the name was recorded for the first time.
    pub fn check_and_record_type(&mut self, type_name: &str) -> bool {
        self.check_and_record_in_scope(type_name, &[])
    }

    /// Like `check_and_record_type`, ignoring the generic parameters of the
    /// declaration currently being emitted
    pub fn check_and_record_in_scope(&mut self, type_name: &str, generic_params: &[String]) -> bool {
        debug_assert!(self.collected, "exported types must be collected first");
        if !self.collected {
            warn!(
                "Reference to '{}' checked before exported types were collected",
                type_name
            );
        }

        let base = Self::normalize_type_name(type_name);
        if base.is_empty()
            || lua_primitive(&base).is_some()
            || generic_params.iter().any(|p| *p == base)
            || self.exported.contains(&base)
        {
            return false;
        }

        let inserted = self.unexported.insert(base);
        if inserted {
            debug!("Recorded unexported reference '{}'", type_name);
        }
        inserted
    }

    pub fn is_exported(&self, type_name: &str) -> bool {
        self.exported.contains(&Self::normalize_type_name(type_name))
    }

    /// Write one `---@class` stub and table per unexported type
    ///
    /// An empty set produces an empty file so the artifact always exists.
    pub fn dump_unexported_types(&self, dir: &Path, filename: &str) -> Result<PathBuf, CodegenError> {
        let path = dir.join(filename);

        let mut content = String::new();
        if !self.unexported.is_empty() {
            content.push_str(META_HEADER);
            for name in &self.unexported {
                // Writing into a String cannot fail
                let _ = write!(
                    content,
                    "---@class {prefix}{name}\n{prefix}{name} = {{}}\n",
                    prefix = self.type_prefix,
                    name = name
                );
            }
        }

        let mut file = File::create(&path).map_err(|e| CodegenError::io(&path, e))?;
        file.write_all(content.as_bytes())
            .map_err(|e| CodegenError::io(&path, e))?;

        Ok(path)
    }

    pub fn unexported_type_count(&self) -> usize {
        self.unexported.len()
    }

    pub fn exported_type_count(&self) -> usize {
        self.exported.len()
    }

    pub fn unexported_types(&self) -> impl Iterator<Item = &str> {
        self.unexported.iter().map(String::as_str)
    }
}
