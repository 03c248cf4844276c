//! End-to-end dumps of small catalogs through both flavors

use std::fs;
use std::path::Path;

use emmydump_codegen::{CodegenError, DumpOptions, Dumper, ToLuaDumper, XLuaDumper};
use emmydump_core::catalog::{Catalog, CatalogBuilder, Method};
use emmydump_core::GenericMerger;
use pretty_assertions::assert_eq;

/// Enum `Color { Red = 0, Green = 1 }` and class `Animal` with `Speak(): string`
fn color_and_animal() -> Catalog {
    CatalogBuilder::new()
        .enum_type("", "Color")
        .enum_value("Red", Some(0))
        .enum_value("Green", Some(1))
        .class("", "Animal")
        .method(Method::new("Speak", "string"))
        .build()
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_color_and_animal_xlua() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let catalog = color_and_animal();
    let mut dumper = XLuaDumper::new(DumpOptions::default());
    let report = dumper.dump(&catalog.types, dir.path())?;

    assert_eq!(report.types_emitted, 2);
    assert_eq!(report.types_failed, 0);
    assert_eq!(report.files.len(), 1);
    assert!(report.files[0].ends_with("xlua_dump_0.lua"));
    assert_eq!(
        read(&report.files[0]),
        "---@meta\n\
         \n\
         ---@class CS.Color\n\
         local Color = {}\n\
         ---@type CS.Color\n\
         Color.Red = 0\n\
         ---@type CS.Color\n\
         Color.Green = 1\n\
         \n\
         ---@class CS.Animal\n\
         ---@overload fun(): CS.Animal\n\
         local Animal = {}\n\
         \n\
         ---@return string\n\
         function Animal:Speak() end\n\
         \n"
    );

    assert!(report.namespace_file.ends_with("xlua_namespace.lua"));
    assert_eq!(report.namespace_count, 2);
    assert_eq!(
        read(&report.namespace_file),
        "---@meta\n\
         \n\
         ---@type CS.Color\n\
         CS.Color = {}\n\
         \n\
         ---@type CS.Animal\n\
         CS.Animal = {}\n\
         \n"
    );

    assert!(report.unexported_file.ends_with("xlua_unexported.lua"));
    assert_eq!(report.unexported_count, 0);
    assert_eq!(read(&report.unexported_file), "");
    Ok(())
}

#[test]
fn test_color_and_animal_tolua() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let catalog = color_and_animal();
    let mut dumper = ToLuaDumper::new(DumpOptions::default());
    let report = dumper.dump(&catalog.types, dir.path())?;

    assert_eq!(report.files.len(), 1);
    assert!(report.files[0].ends_with("tolua_dump_0.lua"));
    assert_eq!(
        read(&report.files[0]),
        "---@meta\n\
         \n\
         ---@class Color\n\
         Color = {}\n\
         ---@type Color\n\
         Color.Red = 0\n\
         ---@type Color\n\
         Color.Green = 1\n\
         \n\
         ---@class Animal\n\
         ---@overload fun(): Animal\n\
         Animal = {}\n\
         \n\
         ---@return Animal\n\
         function Animal.New() end\n\
         \n\
         ---@return string\n\
         function Animal:Speak() end\n\
         \n"
    );
    assert_eq!(
        read(&report.namespace_file),
        "---@meta\n\n---@type Color\nColor = {}\n\n---@type Animal\nAnimal = {}\n\n"
    );
    assert_eq!(read(&report.unexported_file), "");
    Ok(())
}

#[test]
fn test_merged_box_instances_emit_one_definition() -> Result<(), Box<dyn std::error::Error>> {
    let catalog = CatalogBuilder::new()
        .class("Demo", "Box`1")
        .constructed_generic(["int"])
        .field("value", "int")
        .class("Demo", "Box`1")
        .constructed_generic(["string"])
        .field("value", "string")
        .build();

    let merged = GenericMerger::new().merge(&catalog.types);
    assert_eq!(merged.merged_count, 1);
    assert_eq!(merged.types.len(), 1);

    let dir = tempfile::tempdir()?;
    let report = XLuaDumper::new(DumpOptions::default()).dump(&merged.types, dir.path())?;

    assert_eq!(
        read(&report.files[0]),
        "---@meta\n\
         \n\
         ---@class CS.Demo.Box<T>\n\
         ---@overload fun(): CS.Demo.Box<T>\n\
         local Box = {}\n\
         ---@type T\n\
         Box.value = nil\n\
         \n"
    );
    assert_eq!(
        read(&report.namespace_file),
        "---@meta\n\n---@type table\nCS.Demo = {}\n\n"
    );
    assert_eq!(report.unexported_count, 0);
    Ok(())
}

#[test]
fn test_malformed_type_is_skipped() -> Result<(), Box<dyn std::error::Error>> {
    let catalog = CatalogBuilder::new()
        .class("Game", "Alpha")
        .field("hp", "int")
        .class("Game", "Broken")
        .field("lookup", "System.Collections.Generic.Dictionary<string, int")
        .class("Game", "Omega")
        .field("name", "string")
        .build();

    let dir = tempfile::tempdir()?;
    let report = XLuaDumper::new(DumpOptions::default()).dump(&catalog.types, dir.path())?;

    assert_eq!(report.types_emitted, 2);
    assert_eq!(report.types_failed, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].type_name, "Game.Broken");

    let chunk = read(&report.files[0]);
    assert!(chunk.contains("---@class CS.Game.Alpha\n"));
    assert!(chunk.contains("---@class CS.Game.Omega\n"));
    assert!(!chunk.contains("Broken"));
    Ok(())
}

#[test]
fn test_empty_catalog_still_writes_index_and_stubs() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let report = ToLuaDumper::new(DumpOptions::default()).dump(&[], dir.path())?;

    assert!(report.files.is_empty());
    assert_eq!(report.types_emitted, 0);
    assert_eq!(read(&report.namespace_file), "---@meta\n\n");
    assert_eq!(read(&report.unexported_file), "");
    Ok(())
}

#[test]
fn test_output_directory_is_created() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let nested = dir.path().join("out").join("lua");
    let report = XLuaDumper::new(DumpOptions::default()).dump(&color_and_animal().types, &nested)?;
    assert!(report.files[0].starts_with(&nested));
    Ok(())
}

#[test]
fn test_uncreatable_directory_is_fatal() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "not a directory")?;

    let result = XLuaDumper::new(DumpOptions::default())
        .dump(&color_and_animal().types, &blocker.join("out"));
    assert!(matches!(result, Err(CodegenError::CreateDir { .. })));
    Ok(())
}

#[test]
fn test_unwritable_chunk_aborts_after_first_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    // A directory squatting on the second chunk's name makes its creation fail
    fs::create_dir(dir.path().join("xlua_dump_1.lua"))?;

    let mut builder = CatalogBuilder::new();
    for i in 0..8 {
        builder = builder
            .class("Game", format!("Unit{}", i))
            .field("name", "string")
            .field("hp", "int");
    }
    let catalog = builder.build();

    let options = DumpOptions { chunk_threshold: 128 };
    let result = XLuaDumper::new(options).dump(&catalog.types, dir.path());

    match result {
        Err(CodegenError::Io { path, .. }) => assert!(path.ends_with("xlua_dump_1.lua")),
        other => panic!("expected an I/O error, got {:?}", other.map(|r| r.files)),
    }
    assert!(dir.path().join("xlua_dump_0.lua").is_file());
    assert!(!dir.path().join("xlua_namespace.lua").exists());
    Ok(())
}

#[test]
fn test_unexported_references_become_stubs()-> Result<(), Box<dyn std::error::Error>> {
    let catalog = CatalogBuilder::new()
        .class("UnityEngine", "GameObject")
        .base("UnityEngine.Object")
        .field("transform", "UnityEngine.Transform")
        .field("children", "UnityEngine.Transform[]")
        .method(Method::new("GetComponent", "UnityEngine.Component"))
        .build();

    let dir = tempfile::tempdir()?;
    let report = XLuaDumper::new(DumpOptions::default()).dump(&catalog.types, dir.path())?;

    assert_eq!(report.unexported_count, 3);
    assert_eq!(
        report.unexported_types,
        vec!["UnityEngine.Object", "UnityEngine.Transform", "UnityEngine.Component"]
    );
    assert_eq!(
        read(&report.unexported_file),
        "---@meta\n\
         \n\
         ---@class CS.UnityEngine.Object\n\
         CS.UnityEngine.Object = {}\n\
         ---@class CS.UnityEngine.Transform\n\
         CS.UnityEngine.Transform = {}\n\
         ---@class CS.UnityEngine.Component\n\
         CS.UnityEngine.Component = {}\n"
    );
    Ok(())
}
