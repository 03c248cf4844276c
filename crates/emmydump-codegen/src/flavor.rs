//! Binding flavors and the conventions that differ between them

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    /// Types hang off the `CS` root table; constructors are class calls
    XLua,
    /// Types are global tables; constructors go through `New`
    ToLua,
}

/// How class bodies are declared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassScope {
    /// `local Name = {}`, members attached to the local
    Local,
    /// `Full.Name = {}`, members attached to the global path
    Global,
}

/// Where enum member values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumValueSource {
    /// Captured literal, ordinal when the analyzer captured none
    Constant,
    /// Zero-based position in the declaration
    Ordinal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlavorConfig {
    /// Used for file names (`xlua_dump_0.lua`)
    pub name: &'static str,
    /// Root table prepended to every host type name
    pub type_prefix: &'static str,
    pub class_scope: ClassScope,
    /// Emit `function X.New() end` next to the overload annotations
    pub emit_factory: bool,
    pub enum_values: EnumValueSource,
}

impl Flavor {
    pub const ALL: [Flavor; 2] = [Flavor::XLua, Flavor::ToLua];

    pub fn config(self) -> FlavorConfig {
        match self {
            Flavor::XLua => FlavorConfig {
                name: "xlua",
                type_prefix: "CS.",
                class_scope: ClassScope::Local,
                emit_factory: false,
                enum_values: EnumValueSource::Constant,
            },
            Flavor::ToLua => FlavorConfig {
                name: "tolua",
                type_prefix: "",
                class_scope: ClassScope::Global,
                emit_factory: true,
                enum_values: EnumValueSource::Ordinal,
            },
        }
    }

    pub fn name(self) -> &'static str {
        self.config().name
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Flavor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xlua" => Ok(Flavor::XLua),
            "tolua" => Ok(Flavor::ToLua),
            other => Err(format!("unknown flavor '{}' (expected xlua or tolua)", other)),
        }
    }
}
