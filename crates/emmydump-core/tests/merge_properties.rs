//! Property tests for the generic merger

use emmydump_core::catalog::{CatalogBuilder, TypeDeclaration};
use emmydump_core::naming::strip_arity;
use emmydump_core::GenericMerger;
use proptest::prelude::*;
use std::collections::HashSet;

const DEFINITIONS: &[&str] = &["List", "Box", "Queue", "Stack"];
const ARGUMENTS: &[&str] = &["int", "string", "Game.Unit", "Game.UnitGroup", "float"];

#[derive(Debug, Clone)]
struct Instance {
    definition: usize,
    argument: usize,
    backtick: bool,
}

fn instance() -> impl Strategy<Value = Instance> {
    (0..DEFINITIONS.len(), 0..ARGUMENTS.len(), any::<bool>()).prop_map(
        |(definition, argument, backtick)| Instance {
            definition,
            argument,
            backtick,
        },
    )
}

fn build(instances: &[Instance], plain_every: usize) -> Vec<TypeDeclaration> {
    let mut builder = CatalogBuilder::new();
    for (idx, inst) in instances.iter().enumerate() {
        if plain_every > 0 && idx % plain_every == 0 {
            builder = builder.class("Game", format!("Plain{}", idx));
        }
        let def = DEFINITIONS[inst.definition];
        let arg = ARGUMENTS[inst.argument];
        let name = if inst.backtick {
            format!("{}`1", def)
        } else {
            format!("{}<{}>", def, arg)
        };
        builder = builder
            .class("Game.Collections", name)
            .constructed_generic([arg])
            .field("head", arg)
            .field("items", format!("{}[]", arg));
    }
    builder.build().types
}

proptest! {
    #[test]
    fn merge_is_idempotent(instances in prop::collection::vec(instance(), 0..24), plain_every in 0usize..4) {
        let types = build(&instances, plain_every);
        let merger = GenericMerger::new();

        let first = merger.merge(&types);
        let second = merger.merge(&first.types);

        prop_assert_eq!(second.merged_count, 0);
        prop_assert_eq!(second.definitions_created, 0);
        prop_assert_eq!(&second.types, &first.types);
    }

    #[test]
    fn one_definition_per_generic(instances in prop::collection::vec(instance(), 1..24)) {
        let types = build(&instances, 0);
        let outcome = GenericMerger::new().merge(&types);

        let distinct: HashSet<usize> = instances.iter().map(|i| i.definition).collect();
        prop_assert_eq!(outcome.definitions_created, distinct.len());
        prop_assert_eq!(outcome.merged_count, instances.len() - distinct.len());

        let names: Vec<String> = outcome.types.iter().map(|t| strip_arity(t.name())).collect();
        let unique: HashSet<&String> = names.iter().collect();
        prop_assert_eq!(unique.len(), names.len());

        for decl in &outcome.types {
            if let TypeDeclaration::Class(c) = decl {
                prop_assert_eq!(&c.fields[0].type_name, "T");
                prop_assert_eq!(&c.fields[1].type_name, "T[]");
            }
        }
    }
}
