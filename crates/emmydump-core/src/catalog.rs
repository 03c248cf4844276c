//! Type catalog: the declarations handed over by the host-language analyzer

use crate::naming::qualify;
use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Ordered list of type declarations plus analyzer statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub types: Vec<TypeDeclaration>,
    #[serde(default)]
    pub stats: CatalogStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogStats {
    /// Symbols the analyzer looked at, including ones it did not export
    #[serde(default)]
    pub analyzed_symbols: usize,
}

/// A single exported declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDeclaration {
    Class(ClassDecl),
    Interface(InterfaceDecl),
    Enum(EnumDecl),
    Delegate(DelegateDecl),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Delegate,
}

impl TypeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Enum => "enum",
            TypeKind::Delegate => "delegate",
        }
    }
}

/// Data every declaration variant carries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeHeader {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub documentation: Option<String>,
    /// Opaque token pointing back into the analyzed sources
    #[serde(default)]
    pub source_location: Option<String>,
}

impl TypeHeader {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            documentation: None,
            source_location: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    #[serde(flatten)]
    pub header: TypeHeader,
    #[serde(default)]
    pub is_struct: bool,
    #[serde(default)]
    pub base_type: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    /// Concrete arguments of a constructed generic, or parameter names of a
    /// generic definition
    #[serde(default)]
    pub generic_arguments: Vec<String>,
    /// Original parameter names, when the analyzer preserved them
    #[serde(default)]
    pub generic_parameters: Vec<String>,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_constructed_generic: bool,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub methods: Vec<Method>,
}

impl ClassDecl {
    pub fn constructors(&self) -> impl Iterator<Item = &Method> {
        self.methods.iter().filter(|m| m.is_constructor())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceDecl {
    #[serde(flatten)]
    pub header: TypeHeader,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub generic_arguments: Vec<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub methods: Vec<Method>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnumDecl {
    #[serde(flatten)]
    pub header: TypeHeader,
    #[serde(default)]
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegateDecl {
    #[serde(flatten)]
    pub header: TypeHeader,
    pub invoke: Method,
}

/// A field, property or event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub type_name: String,
    #[serde(default)]
    pub documentation: Option<String>,
    #[serde(default)]
    pub is_event: bool,
    #[serde(default)]
    pub is_static: bool,
    /// Literal value, only captured for enum members
    #[serde(default)]
    pub constant_value: Option<i64>,
}

impl Field {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.documentation = Some(doc.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    #[serde(default = "void_type")]
    pub return_type: String,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub documentation: Option<String>,
}

fn void_type() -> String {
    "void".to_string()
}

impl Method {
    /// Reserved name marking a constructor
    pub const CONSTRUCTOR: &'static str = ".ctor";

    pub fn new(name: impl Into<String>, return_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            return_type: return_type.into(),
            is_static: false,
            parameters: Vec::new(),
            documentation: None,
        }
    }

    pub fn constructor() -> Self {
        Self::new(Self::CONSTRUCTOR, "void")
    }

    pub fn is_constructor(&self) -> bool {
        self.name == Self::CONSTRUCTOR
    }

    pub fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn with_param(mut self, param: Parameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.documentation = Some(doc.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassBy {
    #[default]
    Value,
    Ref,
    Out,
    In,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
    #[serde(default)]
    pub is_optional: bool,
    #[serde(default)]
    pub pass_by: PassBy,
    #[serde(default)]
    pub documentation: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    pub fn pass_by(mut self, pass_by: PassBy) -> Self {
        self.pass_by = pass_by;
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.documentation = Some(doc.into());
        self
    }

    pub fn is_out(&self) -> bool {
        self.pass_by == PassBy::Out
    }
}

impl TypeDeclaration {
    pub fn header(&self) -> &TypeHeader {
        match self {
            TypeDeclaration::Class(c) => &c.header,
            TypeDeclaration::Interface(i) => &i.header,
            TypeDeclaration::Enum(e) => &e.header,
            TypeDeclaration::Delegate(d) => &d.header,
        }
    }

    pub fn header_mut(&mut self) -> &mut TypeHeader {
        match self {
            TypeDeclaration::Class(c) => &mut c.header,
            TypeDeclaration::Interface(i) => &mut i.header,
            TypeDeclaration::Enum(e) => &mut e.header,
            TypeDeclaration::Delegate(d) => &mut d.header,
        }
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            TypeDeclaration::Class(_) => TypeKind::Class,
            TypeDeclaration::Interface(_) => TypeKind::Interface,
            TypeDeclaration::Enum(_) => TypeKind::Enum,
            TypeDeclaration::Delegate(_) => TypeKind::Delegate,
        }
    }

    pub fn name(&self) -> &str {
        &self.header().name
    }

    pub fn namespace(&self) -> &str {
        &self.header().namespace
    }

    /// Namespace-qualified name, exactly as the analyzer spelled it
    pub fn full_name(&self) -> String {
        qualify(self.namespace(), self.name())
    }

    pub fn generic_arguments(&self) -> &[String] {
        match self {
            TypeDeclaration::Class(c) => &c.generic_arguments,
            TypeDeclaration::Interface(i) => &i.generic_arguments,
            TypeDeclaration::Enum(_) | TypeDeclaration::Delegate(_) => &[],
        }
    }

    /// Every type string this declaration mentions, in declaration order:
    /// base type, interfaces, field types, then return and parameter types
    /// of each method
    pub fn referenced_types(&self) -> Vec<&str> {
        let mut refs = Vec::new();

        match self {
            TypeDeclaration::Class(c) => {
                if let Some(base) = &c.base_type {
                    refs.push(base.as_str());
                }
                refs.extend(c.interfaces.iter().map(String::as_str));
                refs.extend(c.fields.iter().map(|f| f.type_name.as_str()));
                for method in &c.methods {
                    collect_method_refs(method, &mut refs);
                }
            }
            TypeDeclaration::Interface(i) => {
                refs.extend(i.interfaces.iter().map(String::as_str));
                refs.extend(i.fields.iter().map(|f| f.type_name.as_str()));
                for method in &i.methods {
                    collect_method_refs(method, &mut refs);
                }
            }
            TypeDeclaration::Enum(_) => {}
            TypeDeclaration::Delegate(d) => collect_method_refs(&d.invoke, &mut refs),
        }

        refs
    }
}

fn collect_method_refs<'a>(method: &'a Method, refs: &mut Vec<&'a str>) {
    if !method.is_constructor() {
        refs.push(method.return_type.as_str());
    }
    refs.extend(method.parameters.iter().map(|p| p.type_name.as_str()));
}

impl Catalog {
    pub fn new(types: Vec<TypeDeclaration>) -> Self {
        Self {
            types,
            stats: CatalogStats::default(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let json = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject declarations the emitters cannot name at all
    pub fn validate(&self) -> Result<(), CoreError> {
        for (idx, ty) in self.types.iter().enumerate() {
            if ty.name().trim().is_empty() {
                return Err(CoreError::InvalidCatalog(format!(
                    "{} at position {} has an empty name",
                    ty.kind().as_str(),
                    idx
                )));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Builder pattern for constructing catalogs
pub struct CatalogBuilder {
    types: Vec<TypeDeclaration>,
    current: Option<TypeDeclaration>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self {
            types: Vec::new(),
            current: None,
        }
    }

    fn start(mut self, decl: TypeDeclaration) -> Self {
        if let Some(done) = self.current.take() {
            self.types.push(done);
        }
        self.current = Some(decl);
        self
    }

    pub fn class(self, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        self.start(TypeDeclaration::Class(ClassDecl {
            header: TypeHeader::new(namespace, name),
            ..Default::default()
        }))
    }

    pub fn interface(self, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        self.start(TypeDeclaration::Interface(InterfaceDecl {
            header: TypeHeader::new(namespace, name),
            ..Default::default()
        }))
    }

    pub fn enum_type(self, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        self.start(TypeDeclaration::Enum(EnumDecl {
            header: TypeHeader::new(namespace, name),
            fields: Vec::new(),
        }))
    }

    pub fn delegate(
        self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        invoke: Method,
    ) -> Self {
        self.start(TypeDeclaration::Delegate(DelegateDecl {
            header: TypeHeader::new(namespace, name),
            invoke: Method { name: "Invoke".to_string(), ..invoke },
        }))
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        if let Some(ref mut decl) = self.current {
            decl.header_mut().documentation = Some(doc.into());
        }
        self
    }

    pub fn base(mut self, base: impl Into<String>) -> Self {
        if let Some(TypeDeclaration::Class(ref mut c)) = self.current {
            c.base_type = Some(base.into());
        }
        self
    }

    /// Add an implemented interface; repeats are ignored
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        let interface = interface.into();
        let list = match self.current {
            Some(TypeDeclaration::Class(ref mut c)) => Some(&mut c.interfaces),
            Some(TypeDeclaration::Interface(ref mut i)) => Some(&mut i.interfaces),
            _ => None,
        };
        if let Some(list) = list {
            if !list.contains(&interface) {
                list.push(interface);
            }
        }
        self
    }

    pub fn static_class(mut self) -> Self {
        if let Some(TypeDeclaration::Class(ref mut c)) = self.current {
            c.is_static = true;
        }
        self
    }

    /// Mark the current class as a constructed generic over `arguments`
    pub fn constructed_generic<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(TypeDeclaration::Class(ref mut c)) = self.current {
            c.is_constructed_generic = true;
            c.generic_arguments = arguments.into_iter().map(Into::into).collect();
        }
        self
    }

    pub fn generic_parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(TypeDeclaration::Class(ref mut c)) = self.current {
            c.generic_parameters = parameters.into_iter().map(Into::into).collect();
        }
        self
    }

    pub fn field(self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.add_field(Field::new(name, type_name))
    }

    pub fn add_field(mut self, field: Field) -> Self {
        match self.current {
            Some(TypeDeclaration::Class(ref mut c)) => c.fields.push(field),
            Some(TypeDeclaration::Interface(ref mut i)) => i.fields.push(field),
            Some(TypeDeclaration::Enum(ref mut e)) => e.fields.push(field),
            _ => {}
        }
        self
    }

    /// Add an enum member; `value` is the captured literal, if any
    pub fn enum_value(mut self, name: impl Into<String>, value: Option<i64>) -> Self {
        if let Some(TypeDeclaration::Enum(ref mut e)) = self.current {
            let type_name = crate::naming::qualify(&e.header.namespace, &e.header.name);
            e.fields.push(Field {
                constant_value: value,
                is_static: true,
                ..Field::new(name, type_name)
            });
        }
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        match self.current {
            Some(TypeDeclaration::Class(ref mut c)) => c.methods.push(method),
            Some(TypeDeclaration::Interface(ref mut i)) => i.methods.push(method),
            _ => {}
        }
        self
    }

    pub fn build(mut self) -> Catalog {
        if let Some(done) = self.current.take() {
            self.types.push(done);
        }
        Catalog::new(self.types)
    }
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}
