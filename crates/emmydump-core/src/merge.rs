//! Collapse constructed generics into a single generic definition
//!
//! The analyzer reports every instantiation it saw (`Box<Apple>`,
//! `Box<Pear>`, ...) as its own class. Annotation consumers only need the
//! open definition once, so the first instantiation of each generic
//! definition is rewritten over placeholder parameters and later
//! instantiations are dropped.
//!
//! Argument substitution is textual: every occurrence of a concrete
//! argument string is replaced, longest argument first. A concrete name
//! that is a substring of an unrelated name is replaced too
//! (`Point` inside `PointF` becomes `TF`).

use crate::catalog::{ClassDecl, TypeDeclaration};
use crate::naming::{arity_of, canonical_generic_name, has_arity_marker, qualify};
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Result of a merge pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    /// Post-merge declarations in original order
    pub types: Vec<TypeDeclaration>,
    /// Instantiations dropped because their definition was already emitted
    pub merged_count: usize,
    /// Constructed generics rewritten into definitions
    pub definitions_created: usize,
}

#[derive(Debug, Clone, Default)]
pub struct GenericMerger;

impl GenericMerger {
    pub fn new() -> Self {
        Self
    }

    /// Merge constructed generics; the input is left untouched
    #[instrument(skip_all, fields(types = types.len()))]
    pub fn merge(&self, types: &[TypeDeclaration]) -> MergeOutcome {
        // Open definitions already in the catalog own their key
        let mut seen: HashSet<String> = types
            .iter()
            .filter_map(|decl| match decl {
                TypeDeclaration::Class(c) if Self::is_open_definition(c) => Some(Self::canonical_key(c)),
                _ => None,
            })
            .collect();
        let mut outcome = MergeOutcome {
            types: Vec::with_capacity(types.len()),
            ..Default::default()
        };

        for decl in types {
            let class = match decl {
                TypeDeclaration::Class(c) if Self::is_candidate(c) => c,
                other => {
                    outcome.types.push(other.clone());
                    continue;
                }
            };

            let key = Self::canonical_key(class);
            if seen.insert(key.clone()) {
                debug!("Converting {} into generic definition {}", class.header.name, key);
                outcome
                    .types
                    .push(TypeDeclaration::Class(Self::into_definition(class)));
                outcome.definitions_created += 1;
            } else {
                debug!("Dropping instantiation {} of {}", class.header.name, key);
                outcome.merged_count += 1;
            }
        }

        outcome
    }

    /// A class is merged when it is a constructed generic whose name or
    /// argument list marks it as generic
    pub fn is_candidate(class: &ClassDecl) -> bool {
        class.is_constructed_generic
            && (has_arity_marker(&class.header.name) || !class.generic_arguments.is_empty())
    }

    /// A generic definition the analyzer exported as such
    pub fn is_open_definition(class: &ClassDecl) -> bool {
        !class.is_constructed_generic
            && (has_arity_marker(&class.header.name) || !class.generic_arguments.is_empty())
    }

    /// Key shared by every instantiation of the same generic definition
    pub fn canonical_key(class: &ClassDecl) -> String {
        let name = canonical_generic_name(&class.header.name, class.generic_arguments.len());
        qualify(&class.header.namespace, &name)
    }

    /// Parameter names for the definition: the analyzer's names when it
    /// supplied a complete list, otherwise `T`, `T1`, `T2`, ...
    pub fn placeholder_names(class: &ClassDecl) -> Vec<String> {
        let count = if class.generic_arguments.is_empty() {
            arity_of(&class.header.name).unwrap_or(0)
        } else {
            class.generic_arguments.len()
        };

        let supplied = &class.generic_parameters;
        if count > 0
            && supplied.len() == count
            && supplied.iter().all(|p| !p.trim().is_empty())
        {
            return supplied.clone();
        }

        (0..count)
            .map(|i| if i == 0 { "T".to_string() } else { format!("T{}", i) })
            .collect()
    }

    fn into_definition(class: &ClassDecl) -> ClassDecl {
        let placeholders = Self::placeholder_names(class);

        let mut substitutions: Vec<(&str, &str)> = class
            .generic_arguments
            .iter()
            .zip(placeholders.iter())
            .filter(|(concrete, placeholder)| !concrete.is_empty() && concrete != placeholder)
            .map(|(concrete, placeholder)| (concrete.as_str(), placeholder.as_str()))
            .collect();
        // Longest first so `ItemStack` is not rewritten through `Item`
        substitutions.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let rewrite = |text: &str| substitute(text, &substitutions);

        let mut def = class.clone();
        def.header.name = canonical_generic_name(&class.header.name, placeholders.len());
        def.is_constructed_generic = false;
        def.generic_arguments = placeholders.clone();
        def.generic_parameters = placeholders.clone();
        def.base_type = class.base_type.as_deref().map(rewrite);
        def.interfaces = class.interfaces.iter().map(|i| rewrite(i)).collect();

        for field in &mut def.fields {
            field.type_name = rewrite(&field.type_name);
        }
        for method in &mut def.methods {
            method.return_type = rewrite(&method.return_type);
            for param in &mut method.parameters {
                param.type_name = rewrite(&param.type_name);
            }
        }

        def
    }
}

/// Apply `(concrete, placeholder)` replacements in order
pub fn substitute(text: &str, substitutions: &[(&str, &str)]) -> String {
    substitutions
        .iter()
        .fold(text.to_string(), |acc, (concrete, placeholder)| {
            acc.replace(concrete, placeholder)
        })
}
