//! Shared naming utilities for host type names.
//!
//! Host display names carry two kinds of generic decoration:
//! - a backtick arity marker from metadata names (``List`1``)
//! - an angle-bracket argument list from display names (`List<int>`)
//!
//! Nested types use `+` as the separator (`Outer+Inner`). These helpers
//! normalize such names for keys, lookups and emitted identifiers.

/// Check whether a name carries a generic-arity marker
///
/// # Examples
/// ```
/// use emmydump_core::naming::has_arity_marker;
/// assert!(has_arity_marker("List`1"));
/// assert!(has_arity_marker("List<int>"));
/// assert!(!has_arity_marker("List"));
/// ```
pub fn has_arity_marker(name: &str) -> bool {
    name.contains('`') || name.contains('<')
}

/// Remove every arity marker and generic argument list from a name
///
/// Nested-type separators survive, so ``Dictionary`2+KeyCollection``
/// becomes `Dictionary+KeyCollection`.
///
/// # Examples
/// ```
/// use emmydump_core::naming::strip_arity;
/// assert_eq!(strip_arity("List`1"), "List");
/// assert_eq!(strip_arity("System.Collections.Generic.List<System.Int32>"), "System.Collections.Generic.List");
/// assert_eq!(strip_arity("Dictionary`2+KeyCollection"), "Dictionary+KeyCollection");
/// ```
pub fn strip_arity(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();
    let mut depth = 0usize;

    while let Some(c) = chars.next() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            '`' if depth == 0 => {
                while chars.peek().is_some_and(|d| d.is_ascii_digit()) {
                    chars.next();
                }
            }
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }

    out
}

/// Number of generic parameters encoded in the name, if any
///
/// # Examples
/// ```
/// use emmydump_core::naming::arity_of;
/// assert_eq!(arity_of("Dictionary`2"), Some(2));
/// assert_eq!(arity_of("Dictionary<string, List<int>>"), Some(2));
/// assert_eq!(arity_of("String"), None);
/// ```
pub fn arity_of(name: &str) -> Option<usize> {
    if let Some(idx) = name.rfind('`') {
        let digits: String = name[idx + 1..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        return digits.parse().ok();
    }

    let open = name.find('<')?;
    let mut depth = 0usize;
    let mut count = 1usize;
    for c in name[open..].chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 1 => count += 1,
            _ => {}
        }
    }
    Some(count)
}

/// Canonical backtick form of a generic name
///
/// An existing backtick marker wins; otherwise the argument count is
/// appended when there are arguments at all.
pub fn canonical_generic_name(name: &str, argument_count: usize) -> String {
    if name.contains('`') {
        // Keep the marker, drop any trailing display argument list
        match name.find('<') {
            Some(idx) => name[..idx].to_string(),
            None => name.to_string(),
        }
    } else if argument_count > 0 {
        format!("{}`{}", strip_arity(name), argument_count)
    } else {
        strip_arity(name)
    }
}

/// Join namespace and name; the global namespace yields the bare name
pub fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", namespace, name)
    }
}

/// First segment of a dotted namespace (`UnityEngine.UI` -> `UnityEngine`)
pub fn top_level_segment(namespace: &str) -> &str {
    namespace.split('.').next().unwrap_or(namespace)
}

/// Convert nested-type separators to dots
pub fn dotted(name: &str) -> String {
    name.replace('+', ".")
}

/// Identifier used in emitted text: arity stripped, nested separators dotted
pub fn display_name(name: &str) -> String {
    dotted(&strip_arity(name))
}
