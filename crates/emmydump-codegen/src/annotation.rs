//! EmmyLua annotation formatting
//!
//! Every function renders one declaration element into `out` and knows
//! nothing about the rest of the catalog. Host type strings are converted
//! through the caller's [`TypeMapper`].

use crate::error::FormatError;
use crate::type_expr::TypeMapper;
use emmydump_core::catalog::{Method, Parameter};
use std::borrow::Cow;
use std::fmt::Write;

/// Marker opening every generated file
pub const META_HEADER: &str = "---@meta\n\n";

const LUA_KEYWORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if",
    "in", "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

/// Make a member or parameter name usable as a Lua identifier
pub fn escape_identifier(name: &str) -> Cow<'_, str> {
    if LUA_KEYWORDS.contains(&name) {
        Cow::Owned(format!("{}_", name))
    } else {
        Cow::Borrowed(name)
    }
}

/// Reflow documentation so each line carries its own comment prefix
pub fn doc_comment(out: &mut String, text: Option<&str>) -> Result<(), FormatError> {
    let Some(text) = text else {
        return Ok(());
    };
    let text = text.trim();
    if text.is_empty() {
        return Ok(());
    }
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            writeln!(out, "---")?;
        } else {
            writeln!(out, "--- {}", line)?;
        }
    }
    Ok(())
}

/// `---@<tag> <full_name>[<args>][ : base, interfaces...]`
pub fn type_header(
    out: &mut String,
    tag: &str,
    full_name: &str,
    generic_args: &[String],
    base: Option<&str>,
    interfaces: &[String],
) -> Result<(), FormatError> {
    if full_name.is_empty() {
        return Err(FormatError::EmptyName { what: "type" });
    }
    write!(out, "---@{} {}", tag, full_name)?;
    if !generic_args.is_empty() {
        write!(out, "<{}>", generic_args.join(", "))?;
    }

    let parents: Vec<&str> = base
        .into_iter()
        .chain(interfaces.iter().map(String::as_str))
        .collect();
    if !parents.is_empty() {
        write!(out, " : {}", parents.join(", "))?;
    }
    writeln!(out)?;
    Ok(())
}

/// Type line plus an assignment initializing the member
pub fn field(
    out: &mut String,
    owner: &str,
    name: &str,
    lua_type: &str,
    value: &str,
    doc: Option<&str>,
) -> Result<(), FormatError> {
    if name.is_empty() {
        return Err(FormatError::EmptyName { what: "field" });
    }
    doc_comment(out, doc)?;
    writeln!(out, "---@type {}", lua_type)?;
    writeln!(out, "{}.{} = {}", owner, escape_identifier(name), value)?;
    Ok(())
}

fn parameter_name(param: &Parameter, index: usize) -> Cow<'_, str> {
    if param.name.is_empty() {
        Cow::Owned(format!("arg{}", index))
    } else {
        escape_identifier(&param.name)
    }
}

/// Input parameters in order; `out` parameters are returned, not passed
fn inputs(params: &[Parameter]) -> impl Iterator<Item = (usize, &Parameter)> {
    params.iter().enumerate().filter(|(_, p)| !p.is_out())
}

/// One `---@param` line per input parameter
pub fn parameters(
    out: &mut String,
    params: &[Parameter],
    mapper: &TypeMapper<'_>,
) -> Result<(), FormatError> {
    for (index, param) in inputs(params) {
        let optional = if param.is_optional { "?" } else { "" };
        write!(
            out,
            "---@param {}{} {}",
            parameter_name(param, index),
            optional,
            mapper.map_value(&param.type_name)?
        )?;
        if let Some(doc) = param.documentation.as_deref() {
            // Annotation lines cannot wrap, so multi-line docs are joined
            let doc = doc.split_whitespace().collect::<Vec<_>>().join(" ");
            if !doc.is_empty() {
                write!(out, " {}", doc)?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Primary return type followed by every `out` parameter's type
pub fn return_types(
    return_type: &str,
    params: &[Parameter],
    mapper: &TypeMapper<'_>,
) -> Result<Vec<String>, FormatError> {
    let mut types = Vec::new();
    if let Some(primary) = mapper.map(return_type)? {
        types.push(primary);
    }
    for param in params.iter().filter(|p| p.is_out()) {
        types.push(mapper.map_value(&param.type_name)?);
    }
    Ok(types)
}

pub fn return_annotation(
    out: &mut String,
    return_type: &str,
    params: &[Parameter],
    mapper: &TypeMapper<'_>,
) -> Result<(), FormatError> {
    let types = return_types(return_type, params, mapper)?;
    if !types.is_empty() {
        writeln!(out, "---@return {}", types.join(", "))?;
    }
    Ok(())
}

/// Documentation, parameter and return annotations, then the stub function
pub fn method(
    out: &mut String,
    owner: &str,
    method: &Method,
    mapper: &TypeMapper<'_>,
) -> Result<(), FormatError> {
    if method.name.is_empty() {
        return Err(FormatError::EmptyName { what: "method" });
    }
    doc_comment(out, method.documentation.as_deref())?;
    parameters(out, &method.parameters, mapper)?;
    return_annotation(out, &method.return_type, &method.parameters, mapper)?;

    let separator = if method.is_static { "." } else { ":" };
    let args: Vec<Cow<'_, str>> = inputs(&method.parameters)
        .map(|(index, param)| parameter_name(param, index))
        .collect();
    writeln!(
        out,
        "function {}{}{}({}) end",
        owner,
        separator,
        escape_identifier(&method.name),
        args.join(", ")
    )?;
    Ok(())
}

/// `fun(a: A, b?: B): R, O` built from a method's inputs and results
pub fn fun_signature(method: &Method, mapper: &TypeMapper<'_>) -> Result<String, FormatError> {
    fun_signature_returning(method, mapper, None)
}

fn fun_signature_returning(
    method: &Method,
    mapper: &TypeMapper<'_>,
    produces: Option<&str>,
) -> Result<String, FormatError> {
    let mut params = Vec::new();
    for (index, param) in inputs(&method.parameters) {
        let optional = if param.is_optional { "?" } else { "" };
        params.push(format!(
            "{}{}: {}",
            parameter_name(param, index),
            optional,
            mapper.map_value(&param.type_name)?
        ));
    }

    let results = match produces {
        Some(full_name) => vec![full_name.to_string()],
        None => return_types(&method.return_type, &method.parameters, mapper)?,
    };

    let mut signature = format!("fun({})", params.join(", "));
    if !results.is_empty() {
        signature.push_str(": ");
        signature.push_str(&results.join(", "));
    }
    Ok(signature)
}

/// One `---@overload` per constructor; a type without constructors still
/// gets a single no-argument overload
pub fn constructor_overloads(
    out: &mut String,
    full_name: &str,
    constructors: &[&Method],
    mapper: &TypeMapper<'_>,
) -> Result<(), FormatError> {
    if constructors.is_empty() {
        writeln!(out, "---@overload fun(): {}", full_name)?;
        return Ok(());
    }
    for ctor in constructors {
        let signature = fun_signature_returning(ctor, mapper, Some(full_name))?;
        writeln!(out, "---@overload {}", signature)?;
    }
    Ok(())
}

/// Explicit zero-argument factory producing a new instance
pub fn factory_method(out: &mut String, owner: &str, full_name: &str) -> Result<(), FormatError> {
    writeln!(out, "---@return {}", full_name)?;
    writeln!(out, "function {}.New() end", owner)?;
    Ok(())
}

/// `---@alias <name> fun(...)` for a delegate's invoke signature
pub fn delegate_alias(
    out: &mut String,
    full_name: &str,
    invoke: &Method,
    doc: Option<&str>,
    mapper: &TypeMapper<'_>,
) -> Result<(), FormatError> {
    if full_name.is_empty() {
        return Err(FormatError::EmptyName { what: "delegate" });
    }
    doc_comment(out, doc)?;
    writeln!(out, "---@alias {} {}", full_name, fun_signature(invoke, mapper)?)?;
    Ok(())
}
