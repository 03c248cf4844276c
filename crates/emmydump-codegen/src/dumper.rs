//! Flavor dumpers: walk the catalog and write annotation files
//!
//! One run goes through the same steps for every flavor:
//!
//! 1. create the output directory and collect exported types
//! 2. per declaration: register its namespace, record the types it
//!    references, render it and hand the text to the chunk writer
//! 3. flush the last chunk, then write the namespace index and the
//!    unexported-type stubs
//!
//! A declaration that fails to render is logged and skipped. File system
//! errors abort the run.

use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use emmydump_core::catalog::{
    ClassDecl, DelegateDecl, EnumDecl, Field, InterfaceDecl, Method, TypeDeclaration,
};
use emmydump_core::naming::{display_name, qualify};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::annotation::{self, META_HEADER};
use crate::chunk_writer::{ChunkWriter, DEFAULT_CHUNK_THRESHOLD};
use crate::error::{CodegenError, FormatError};
use crate::flavor::{ClassScope, EnumValueSource, Flavor, FlavorConfig};
use crate::namespace_registry::NamespaceRegistry;
use crate::reference_tracker::ReferenceTracker;
use crate::type_expr::{lua_primitive, TypeMapper};

/// Common interface of the flavor dumpers
pub trait Dumper {
    fn flavor(&self) -> Flavor;

    fn dump(&mut self, types: &[TypeDeclaration], output_dir: &Path)
        -> Result<DumpReport, CodegenError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpOptions {
    /// Chunk files are cut before they grow past this many bytes
    pub chunk_threshold: usize,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            chunk_threshold: DEFAULT_CHUNK_THRESHOLD,
        }
    }
}

/// A declaration that could not be rendered
#[derive(Debug, Clone, Serialize)]
pub struct EmitFailure {
    pub type_name: String,
    pub source_location: Option<String>,
    pub message: String,
}

/// Outcome of one flavor run
#[derive(Debug, Clone, Serialize)]
pub struct DumpReport {
    pub flavor: Flavor,
    pub types_emitted: usize,
    pub types_failed: usize,
    pub files: Vec<PathBuf>,
    pub namespace_file: PathBuf,
    pub namespace_count: usize,
    pub unexported_file: PathBuf,
    pub unexported_count: usize,
    pub unexported_types: Vec<String>,
    pub failures: Vec<EmitFailure>,
}

impl DumpReport {
    fn new(flavor: Flavor) -> Self {
        Self {
            flavor,
            types_emitted: 0,
            types_failed: 0,
            files: Vec::new(),
            namespace_file: PathBuf::new(),
            namespace_count: 0,
            unexported_file: PathBuf::new(),
            unexported_count: 0,
            unexported_types: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// Engine shared by both flavors, driven by a `FlavorConfig`
#[derive(Debug, Clone)]
pub struct FlavorDumper {
    flavor: Flavor,
    config: FlavorConfig,
    options: DumpOptions,
}

impl FlavorDumper {
    pub fn new(flavor: Flavor, options: DumpOptions) -> Self {
        Self {
            flavor,
            config: flavor.config(),
            options,
        }
    }

    #[instrument(skip_all, fields(flavor = self.config.name, types = types.len()))]
    pub fn dump(&self, types: &[TypeDeclaration], output_dir: &Path) -> Result<DumpReport, CodegenError> {
        let mut report = DumpReport::new(self.flavor);
        match self.run(types, output_dir, &mut report) {
            Ok(()) => {
                info!(
                    "{}: emitted {} types into {} files, {} failed, {} unexported references",
                    self.config.name,
                    report.types_emitted,
                    report.files.len(),
                    report.types_failed,
                    report.unexported_count
                );
                Ok(report)
            }
            Err(e) => {
                error!(
                    "{}: aborted after {} types ({} files written): {}",
                    self.config.name,
                    report.types_emitted,
                    report.files.len(),
                    e
                );
                Err(e)
            }
        }
    }

    fn run(
        &self,
        types: &[TypeDeclaration],
        output_dir: &Path,
        report: &mut DumpReport,
    ) -> Result<(), CodegenError> {
        fs::create_dir_all(output_dir).map_err(|source| CodegenError::CreateDir {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let mut tracker = ReferenceTracker::new(self.config.type_prefix);
        tracker.collect_exported_types(types);
        let mut namespaces = NamespaceRegistry::new();
        let mut writer = ChunkWriter::new(output_dir, self.config.name, self.options.chunk_threshold);

        for decl in types {
            namespaces.register(decl.namespace(), decl.name());

            let scope = generic_scope(decl);
            for referenced in decl.referenced_types() {
                tracker.check_and_record_in_scope(referenced, scope);
            }

            let mut block = String::new();
            match self.emit(decl, &mut block) {
                Ok(()) => {
                    writer.append(&block)?;
                    report.types_emitted += 1;
                    report.files = writer.files().to_vec();
                }
                Err(e) => {
                    let type_name = decl.full_name();
                    warn!(
                        "Skipping {} {} ({}): {}",
                        decl.kind().as_str(),
                        type_name,
                        decl.header().source_location.as_deref().unwrap_or("unknown location"),
                        e
                    );
                    report.types_failed += 1;
                    report.failures.push(EmitFailure {
                        type_name,
                        source_location: decl.header().source_location.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        report.files = writer.finish()?;
        report.namespace_file = self.dump_namespace(&namespaces, output_dir)?;
        report.namespace_count = namespaces.len();
        report.unexported_file = tracker.dump_unexported_types(
            output_dir,
            &format!("{}_unexported.lua", self.config.name),
        )?;
        report.unexported_count = tracker.unexported_type_count();
        report.unexported_types = tracker.unexported_types().map(str::to_string).collect();
        Ok(())
    }

    /// Render one declaration into a fresh block
    pub fn render(&self, decl: &TypeDeclaration) -> Result<String, CodegenError> {
        let mut block = String::new();
        self.emit(decl, &mut block)?;
        Ok(block)
    }

    /// Render one declaration
    pub fn emit(&self, decl: &TypeDeclaration, out: &mut String) -> Result<(), FormatError> {
        match decl {
            TypeDeclaration::Class(c) => self.emit_class(c, out),
            TypeDeclaration::Interface(i) => self.emit_interface(i, out),
            TypeDeclaration::Enum(e) => self.emit_enum(e, out),
            TypeDeclaration::Delegate(d) => self.emit_delegate(d, out),
        }
    }

    fn mapper<'a>(&'a self, scope: &'a [String]) -> TypeMapper<'a> {
        TypeMapper::new(self.config.type_prefix).with_generic_params(scope)
    }

    /// Table that members are attached to
    fn owner(&self, full_name: &str, type_name: &str) -> String {
        match self.config.class_scope {
            ClassScope::Global => full_name.to_string(),
            ClassScope::Local => local_name(type_name),
        }
    }

    fn table_declaration(&self, out: &mut String, full_name: &str, type_name: &str) -> Result<(), FormatError> {
        match self.config.class_scope {
            ClassScope::Local => writeln!(out, "local {} = {{}}", local_name(type_name))?,
            ClassScope::Global => writeln!(out, "{} = {{}}", full_name)?,
        }
        Ok(())
    }

    fn emit_class(&self, class: &ClassDecl, out: &mut String) -> Result<(), FormatError> {
        let scope: &[String] = if class.is_constructed_generic {
            &[]
        } else {
            &class.generic_arguments
        };
        let mapper = self.mapper(scope);
        let full_name = mapper.declared_name(&qualify(&class.header.namespace, &class.header.name));
        let owner = self.owner(&full_name, &class.header.name);

        let base = match class.base_type.as_deref() {
            Some(b) if lua_primitive(b).is_none() => Some(mapper.map_value(b)?),
            _ => None,
        };
        let interfaces = map_all(&mapper, &class.interfaces)?;

        annotation::doc_comment(out, class.header.documentation.as_deref())?;
        annotation::type_header(out, "class", &full_name, scope, base.as_deref(), &interfaces)?;
        // Type produced by constructors, parameterized like the header
        let instance = if scope.is_empty() {
            full_name.clone()
        } else {
            format!("{}<{}>", full_name, scope.join(", "))
        };
        if !class.is_static {
            let ctors: Vec<&Method> = class.constructors().collect();
            annotation::constructor_overloads(out, &instance, &ctors, &mapper)?;
        }
        self.table_declaration(out, &full_name, &class.header.name)?;
        self.emit_fields(out, &owner, &class.fields, &mapper)?;

        if self.config.emit_factory && !class.is_static {
            writeln!(out)?;
            annotation::factory_method(out, &owner, &instance)?;
        }
        self.emit_methods(out, &owner, &class.methods, &mapper)?;
        writeln!(out)?;
        Ok(())
    }

    fn emit_interface(&self, iface: &InterfaceDecl, out: &mut String) -> Result<(), FormatError> {
        let mapper = self.mapper(&iface.generic_arguments);
        let full_name = mapper.declared_name(&qualify(&iface.header.namespace, &iface.header.name));
        let owner = self.owner(&full_name, &iface.header.name);
        let interfaces = map_all(&mapper, &iface.interfaces)?;

        annotation::doc_comment(out, iface.header.documentation.as_deref())?;
        annotation::type_header(out, "class", &full_name, &iface.generic_arguments, None, &interfaces)?;
        self.table_declaration(out, &full_name, &iface.header.name)?;
        self.emit_fields(out, &owner, &iface.fields, &mapper)?;
        self.emit_methods(out, &owner, &iface.methods, &mapper)?;
        writeln!(out)?;
        Ok(())
    }

    fn emit_enum(&self, decl: &EnumDecl, out: &mut String) -> Result<(), FormatError> {
        let mapper = self.mapper(&[]);
        let full_name = mapper.declared_name(&qualify(&decl.header.namespace, &decl.header.name));
        let owner = self.owner(&full_name, &decl.header.name);

        annotation::doc_comment(out, decl.header.documentation.as_deref())?;
        annotation::type_header(out, "class", &full_name, &[], None, &[])?;
        self.table_declaration(out, &full_name, &decl.header.name)?;

        for (ordinal, field) in decl.fields.iter().enumerate() {
            let value = match self.config.enum_values {
                EnumValueSource::Constant => field.constant_value.unwrap_or(ordinal as i64),
                EnumValueSource::Ordinal => ordinal as i64,
            };
            annotation::field(
                out,
                &owner,
                &field.name,
                &full_name,
                &value.to_string(),
                field.documentation.as_deref(),
            )?;
        }
        writeln!(out)?;
        Ok(())
    }

    fn emit_delegate(&self, decl: &DelegateDecl, out: &mut String) -> Result<(), FormatError> {
        let mapper = self.mapper(&[]);
        let full_name = mapper.declared_name(&qualify(&decl.header.namespace, &decl.header.name));
        annotation::delegate_alias(
            out,
            &full_name,
            &decl.invoke,
            decl.header.documentation.as_deref(),
            &mapper,
        )?;
        writeln!(out)?;
        Ok(())
    }

    fn emit_fields(
        &self,
        out: &mut String,
        owner: &str,
        fields: &[Field],
        mapper: &TypeMapper<'_>,
    ) -> Result<(), FormatError> {
        for field in fields {
            let lua_type = mapper.map_value(&field.type_name)?;
            let lua_type = if field.is_event { "any".to_string() } else { lua_type };
            annotation::field(out, owner, &field.name, &lua_type, "nil", field.documentation.as_deref())?;
        }
        Ok(())
    }

    fn emit_methods(
        &self,
        out: &mut String,
        owner: &str,
        methods: &[Method],
        mapper: &TypeMapper<'_>,
    ) -> Result<(), FormatError> {
        for method in methods.iter().filter(|m| !m.is_constructor()) {
            writeln!(out)?;
            annotation::method(out, owner, method, mapper)?;
        }
        Ok(())
    }

    /// Write the namespace index: one typed table declaration per entry
    pub fn dump_namespace(&self, registry: &NamespaceRegistry, output_dir: &Path) -> Result<PathBuf, CodegenError> {
        let path = output_dir.join(format!("{}_namespace.lua", self.config.name));
        let prefix = self.config.type_prefix;

        let mut content = String::from(META_HEADER);
        for (name, is_namespace) in registry.entries() {
            let table_type = if is_namespace {
                "table".to_string()
            } else {
                format!("{}{}", prefix, name)
            };
            // Writing into a String cannot fail
            let _ = write!(content, "---@type {}\n{}{} = {{}}\n\n", table_type, prefix, name);
        }

        let mut file = File::create(&path).map_err(|e| CodegenError::io(&path, e))?;
        file.write_all(content.as_bytes())
            .map_err(|e| CodegenError::io(&path, e))?;
        debug!("Wrote namespace index with {} entries", registry.len());
        Ok(path)
    }
}

/// Generic parameters visible inside a declaration
fn generic_scope(decl: &TypeDeclaration) -> &[String] {
    match decl {
        TypeDeclaration::Class(c) if c.is_constructed_generic => &[],
        other => other.generic_arguments(),
    }
}

fn map_all(mapper: &TypeMapper<'_>, names: &[String]) -> Result<Vec<String>, FormatError> {
    names.iter().map(|n| mapper.map_value(n)).collect()
}

/// Last dotted segment of the display name (`Outer+Inner` -> `Inner`)
fn local_name(type_name: &str) -> String {
    let display = display_name(type_name);
    match display.rsplit('.').next() {
        Some(last) => last.to_string(),
        None => display,
    }
}

/// xLua: types under `CS`, constructors by calling the class
#[derive(Debug, Clone)]
pub struct XLuaDumper {
    engine: FlavorDumper,
}

impl XLuaDumper {
    pub fn new(options: DumpOptions) -> Self {
        Self {
            engine: FlavorDumper::new(Flavor::XLua, options),
        }
    }
}

impl Dumper for XLuaDumper {
    fn flavor(&self) -> Flavor {
        Flavor::XLua
    }

    fn dump(&mut self, types: &[TypeDeclaration], output_dir: &Path) -> Result<DumpReport, CodegenError> {
        self.engine.dump(types, output_dir)
    }
}

/// toLua: global type tables, `New` factories, ordinal enum values
#[derive(Debug, Clone)]
pub struct ToLuaDumper {
    engine: FlavorDumper,
}

impl ToLuaDumper {
    pub fn new(options: DumpOptions) -> Self {
        Self {
            engine: FlavorDumper::new(Flavor::ToLua, options),
        }
    }
}

impl Dumper for ToLuaDumper {
    fn flavor(&self) -> Flavor {
        Flavor::ToLua
    }

    fn dump(&mut self, types: &[TypeDeclaration], output_dir: &Path) -> Result<DumpReport, CodegenError> {
        self.engine.dump(types, output_dir)
    }
}

pub fn dumper_for(flavor: Flavor, options: DumpOptions) -> Box<dyn Dumper> {
    match flavor {
        Flavor::XLua => Box::new(XLuaDumper::new(options)),
        Flavor::ToLua => Box::new(ToLuaDumper::new(options)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emmydump_core::catalog::{CatalogBuilder, Parameter, PassBy};
    use pretty_assertions::assert_eq;

    fn render(flavor: Flavor, decl: &TypeDeclaration) -> String {
        FlavorDumper::new(flavor, DumpOptions::default())
            .render(decl)
            .unwrap()
    }

    #[test]
    fn test_class_with_namespace_and_constructors() {
        let catalog = CatalogBuilder::new()
            .class("UnityEngine", "GameObject")
            .doc("Base class for all entities")
            .base("UnityEngine.Object")
            .add_field(Field::new("name", "string"))
            .method(Method::constructor().with_param(Parameter::new("name", "string")))
            .method(
                Method::new("Find", "UnityEngine.GameObject")
                    .static_method()
                    .with_param(Parameter::new("name", "string")),
            )
            .build();

        assert_eq!(
            render(Flavor::XLua, &catalog.types[0]),
            "--- Base class for all entities\n\
             ---@class CS.UnityEngine.GameObject : CS.UnityEngine.Object\n\
             ---@overload fun(name: string): CS.UnityEngine.GameObject\n\
             local GameObject = {}\n\
             ---@type string\n\
             GameObject.name = nil\n\
             \n\
             ---@param name string\n\
             ---@return CS.UnityEngine.GameObject\n\
             function GameObject.Find(name) end\n\
             \n"
        );

        assert_eq!(
            render(Flavor::ToLua, &catalog.types[0]),
            "--- Base class for all entities\n\
             ---@class UnityEngine.GameObject : UnityEngine.Object\n\
             ---@overload fun(name: string): UnityEngine.GameObject\n\
             UnityEngine.GameObject = {}\n\
             ---@type string\n\
             UnityEngine.GameObject.name = nil\n\
             \n\
             ---@return UnityEngine.GameObject\n\
             function UnityEngine.GameObject.New() end\n\
             \n\
             ---@param name string\n\
             ---@return UnityEngine.GameObject\n\
             function UnityEngine.GameObject.Find(name) end\n\
             \n"
        );
    }

    #[test]
    fn test_static_class_has_no_constructors() {
        let catalog = CatalogBuilder::new()
            .class("", "Util")
            .static_class()
            .base("System.Object")
            .method(Method::new("Log", "void").static_method())
            .build();

        assert_eq!(
            render(Flavor::ToLua, &catalog.types[0]),
            "---@class Util\nUtil = {}\n\nfunction Util.Log() end\n\n"
        );
    }

    #[test]
    fn test_enum_values_per_flavor() {
        let catalog = CatalogBuilder::new()
            .enum_type("Game", "Layer")
            .enum_value("Default", Some(0))
            .enum_value("UI", Some(5))
            .enum_value("Water", None)
            .build();

        assert_eq!(
            render(Flavor::XLua, &catalog.types[0]),
            "---@class CS.Game.Layer\nlocal Layer = {}\n\
             ---@type CS.Game.Layer\nLayer.Default = 0\n\
             ---@type CS.Game.Layer\nLayer.UI = 5\n\
             ---@type CS.Game.Layer\nLayer.Water = 2\n\n"
        );
        assert_eq!(
            render(Flavor::ToLua, &catalog.types[0]),
            "---@class Game.Layer\nGame.Layer = {}\n\
             ---@type Game.Layer\nGame.Layer.Default = 0\n\
             ---@type Game.Layer\nGame.Layer.UI = 1\n\
             ---@type Game.Layer\nGame.Layer.Water = 2\n\n"
        );
    }

    #[test]
    fn test_generic_definition_keeps_parameters_bare() {
        let catalog = CatalogBuilder::new()
            .class("Game", "Pool`1")
            .constructed_generic(["Game.Bullet"])
            .field("items", "Game.Bullet[]")
            .build();
        let merged = emmydump_core::GenericMerger::new().merge(&catalog.types);

        assert_eq!(
            render(Flavor::XLua, &merged.types[0]),
            "---@class CS.Game.Pool<T>\n\
             ---@overload fun(): CS.Game.Pool<T>\n\
             local Pool = {}\n\
             ---@type T[]\n\
             Pool.items = nil\n\n"
        );
    }

    #[test]
    fn test_interface_and_delegate() {
        let catalog = CatalogBuilder::new()
            .interface("Game", "IDamageable")
            .implements("Game.IEntity")
            .method(
                Method::new("Hit", "bool")
                    .with_param(Parameter::new("amount", "float"))
                    .with_param(Parameter::new("remaining", "float").pass_by(PassBy::Out)),
            )
            .delegate(
                "Game",
                "OnDeath",
                Method::new("Invoke", "void").with_param(Parameter::new("who", "Game.Actor")),
            )
            .build();

        assert_eq!(
            render(Flavor::XLua, &catalog.types[0]),
            "---@class CS.Game.IDamageable : CS.Game.IEntity\n\
             local IDamageable = {}\n\
             \n\
             ---@param amount number\n\
             ---@return boolean, number\n\
             function IDamageable:Hit(amount) end\n\
             \n"
        );
        assert_eq!(
            render(Flavor::XLua, &catalog.types[1]),
            "---@alias CS.Game.OnDeath fun(who: CS.Game.Actor)\n\n"
        );
    }

    #[test]
    fn test_events_are_typed_any() {
        let catalog = CatalogBuilder::new()
            .class("", "Button")
            .static_class()
            .add_field(Field {
                is_event: true,
                ..Field::new("onClick", "System.Action")
            })
            .build();

        assert_eq!(
            render(Flavor::ToLua, &catalog.types[0]),
            "---@class Button\nButton = {}\n---@type any\nButton.onClick = nil\n\n"
        );
    }

    #[test]
    fn test_malformed_type_is_reported() {
        let catalog = CatalogBuilder::new()
            .class("", "Broken")
            .field("bad", "Dictionary<string, int")
            .build();
        let dumper = FlavorDumper::new(Flavor::XLua, DumpOptions::default());

        let mut out = String::new();
        let result = dumper.emit(&catalog.types[0], &mut out);
        assert!(matches!(result, Err(FormatError::MalformedType { .. })));

        let rendered = dumper.render(&catalog.types[0]);
        assert!(matches!(
            rendered,
            Err(CodegenError::Format(FormatError::MalformedType { .. }))
        ));
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name("GameObject"), "GameObject");
        assert_eq!(local_name("Inventory+Slot"), "Slot");
        assert_eq!(local_name("Pool`1"), "Pool");
    }
}
