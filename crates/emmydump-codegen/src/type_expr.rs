//! Host type expressions and their Lua annotation spelling
//!
//! Display strings coming from the analyzer look like
//! `System.Collections.Generic.Dictionary<string, UnityEngine.Vector3[]>`.
//! They are parsed into a small tree so the Lua spelling can be produced
//! structurally: primitives map to Lua builtins, arrays become `T[]`,
//! nullables become `T|nil` and everything else is prefixed with the
//! flavor's root table.

use crate::error::FormatError;
use emmydump_core::naming::display_name;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Named { name: String, args: Vec<TypeExpr> },
    /// `rank` is the number of dimensions (`int[,]` has rank 2)
    Array { element: Box<TypeExpr>, rank: usize },
    Nullable(Box<TypeExpr>),
    /// Unmanaged pointer or by-ref (`int*`, `int&`)
    Pointer(Box<TypeExpr>),
}

impl TypeExpr {
    pub fn parse(input: &str) -> Result<TypeExpr, FormatError> {
        let mut parser = Parser {
            source: input,
            chars: input.chars().collect(),
            pos: 0,
        };
        parser.skip_ws();
        parser.skip_modifiers();
        let expr = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != parser.chars.len() {
            return Err(FormatError::malformed(
                input,
                format!("unexpected '{}'", parser.chars[parser.pos]),
            ));
        }
        Ok(expr)
    }
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    /// Drop parameter-passing keywords the analyzer sometimes leaves in
    fn skip_modifiers(&mut self) {
        for modifier in ["ref ", "out ", "in ", "params "] {
            let len = modifier.chars().count();
            let matches = self
                .chars
                .get(self.pos..self.pos + len)
                .is_some_and(|s| s.iter().copied().eq(modifier.chars()));
            if matches {
                self.pos += len;
                self.skip_ws();
            }
        }
    }

    fn error(&self, reason: impl Into<String>) -> FormatError {
        FormatError::malformed(self.source, reason)
    }

    fn parse_type(&mut self) -> Result<TypeExpr, FormatError> {
        self.skip_ws();
        let name = self.parse_name()?;
        self.skip_ws();

        let mut args = Vec::new();
        if self.peek() == Some('<') {
            self.pos += 1;
            loop {
                args.push(self.parse_type()?);
                self.skip_ws();
                match self.peek() {
                    Some(',') => self.pos += 1,
                    Some('>') => {
                        self.pos += 1;
                        break;
                    }
                    Some(c) => return Err(self.error(format!("unexpected '{}' in argument list", c))),
                    None => return Err(self.error("unclosed '<'")),
                }
            }
        }

        let mut expr = TypeExpr::Named { name, args };

        loop {
            self.skip_ws();
            match self.peek() {
                Some('[') => {
                    self.pos += 1;
                    let mut rank = 1;
                    loop {
                        match self.peek() {
                            Some(',') => rank += 1,
                            Some(']') => break,
                            Some(c) if c.is_whitespace() => {}
                            _ => return Err(self.error("unclosed '['")),
                        }
                        self.pos += 1;
                    }
                    self.pos += 1;
                    expr = TypeExpr::Array {
                        element: Box::new(expr),
                        rank,
                    };
                }
                Some('?') => {
                    self.pos += 1;
                    expr = TypeExpr::Nullable(Box::new(expr));
                }
                Some('*') | Some('&') => {
                    self.pos += 1;
                    expr = TypeExpr::Pointer(Box::new(expr));
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_name(&mut self) -> Result<String, FormatError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '+' | '`' | '@'))
        {
            self.pos += 1;
        }
        if self.pos == start {
            return match self.peek() {
                Some(c) => Err(self.error(format!("expected a type name, found '{}'", c))),
                None => Err(self.error("expected a type name")),
            };
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }
}

/// Lua builtin for a host primitive or alias, `None` for user types
pub fn lua_primitive(name: &str) -> Option<&'static str> {
    let name = name.strip_prefix("System.").unwrap_or(name);
    let lua = match name {
        "void" | "Void" => "nil",
        "bool" | "Boolean" => "boolean",
        "byte" | "Byte" | "sbyte" | "SByte" | "short" | "Int16" | "ushort" | "UInt16"
        | "int" | "Int32" | "uint" | "UInt32" | "long" | "Int64" | "ulong" | "UInt64"
        | "nint" | "IntPtr" | "nuint" | "UIntPtr" => "integer",
        "float" | "Single" | "double" | "Double" | "decimal" | "Decimal" => "number",
        "char" | "Char" | "string" | "String" => "string",
        "object" | "Object" | "dynamic" => "any",
        _ => return None,
    };
    Some(lua)
}

pub fn is_void(name: &str) -> bool {
    matches!(name.trim(), "void" | "System.Void" | "Void")
}

/// Renders host display strings as Lua annotation types for one flavor
#[derive(Debug, Clone, Copy)]
pub struct TypeMapper<'a> {
    prefix: &'a str,
    generic_params: &'a [String],
}

impl<'a> TypeMapper<'a> {
    pub fn new(prefix: &'a str) -> Self {
        Self {
            prefix,
            generic_params: &[],
        }
    }

    /// Names in `params` are left bare instead of being prefixed
    pub fn with_generic_params(mut self, params: &'a [String]) -> Self {
        self.generic_params = params;
        self
    }

    /// Lua spelling of `display`; `None` when it is `void`
    pub fn map(&self, display: &str) -> Result<Option<String>, FormatError> {
        if is_void(display) {
            return Ok(None);
        }
        let expr = TypeExpr::parse(display)?;
        Ok(Some(self.map_expr(&expr)))
    }

    /// Like `map`, but `void` renders as `nil`
    pub fn map_value(&self, display: &str) -> Result<String, FormatError> {
        Ok(self.map(display)?.unwrap_or_else(|| "nil".to_string()))
    }

    /// Prefixed Lua name of a declared type
    pub fn declared_name(&self, qualified: &str) -> String {
        format!("{}{}", self.prefix, display_name(qualified))
    }

    pub fn map_expr(&self, expr: &TypeExpr) -> String {
        match expr {
            TypeExpr::Named { name, args } => self.map_named(name, args),
            TypeExpr::Array { element, rank } => {
                let mut out = wrap_union(self.map_expr(element));
                for _ in 0..*rank {
                    out.push_str("[]");
                }
                out
            }
            TypeExpr::Nullable(inner) => nullable(self.map_expr(inner)),
            TypeExpr::Pointer(_) => "any".to_string(),
        }
    }

    fn map_named(&self, name: &str, args: &[TypeExpr]) -> String {
        if args.is_empty() {
            if self.generic_params.iter().any(|p| p == name) {
                return name.to_string();
            }
            if let Some(lua) = lua_primitive(name) {
                return lua.to_string();
            }
        }

        if args.len() == 1 && matches!(name, "Nullable" | "System.Nullable" | "Nullable`1" | "System.Nullable`1") {
            return nullable(self.map_expr(&args[0]));
        }

        let mut out = self.declared_name(name);
        if !args.is_empty() {
            let rendered: Vec<String> = args.iter().map(|a| self.map_expr(a)).collect();
            out.push('<');
            out.push_str(&rendered.join(", "));
            out.push('>');
        }
        out
    }
}

fn nullable(inner: String) -> String {
    if inner == "any" || inner.ends_with("|nil") {
        inner
    } else {
        format!("{}|nil", inner)
    }
}

fn wrap_union(inner: String) -> String {
    if inner.contains('|') {
        format!("({})", inner)
    } else {
        inner
    }
}
