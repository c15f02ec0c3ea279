//! DDL templates
//!
//! Every generated statement is a compound string: a context switch
//! (`USE ROLE ...`) followed by the action, joined by [`STATEMENT_SEPARATOR`].
//! The sequencer splits them back apart with [`split_statement`] because the
//! executor runs one command per call.

use crate::kind::ObjectKind;
use crate::object::{ManagedObject, ParamValue};

/// Separator between the context-switch clause and the action clause
pub const STATEMENT_SEPARATOR: &str = "; ";

/// Attributes whose values are always string literals
const QUOTED_PARAMS: &[&str] = &[
    "comment",
    "password",
    "login_name",
    "display_name",
    "first_name",
    "middle_name",
    "last_name",
    "email",
    "rsa_public_key",
    "rsa_public_key_2",
];

/// Render an attribute value as a SQL literal
pub fn render_value(key: &str, value: &ParamValue) -> String {
    match value {
        ParamValue::Text(s) if !QUOTED_PARAMS.contains(&key) && is_bare_literal(s) => {
            s.to_lowercase()
        }
        ParamValue::Text(s) => quote(s),
        ParamValue::List(items) => {
            let rendered: Vec<String> = items.iter().map(String::as_str).map(quote).collect();
            format!("({})", rendered.join(", "))
        }
    }
}

fn is_bare_literal(s: &str) -> bool {
    if s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false") {
        return true;
    }
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.chars().filter(|c| *c == '.').count() <= 1
        && !digits.starts_with('.')
        && !digits.ends_with('.')
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Render an object name, double-quoting any part that is not a plain identifier
pub fn render_name(name: &str) -> String {
    name.split('.')
        .map(|part| {
            if is_plain_identifier(part) {
                part.to_string()
            } else {
                format!("\"{}\"", part.replace('"', "\"\""))
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn is_plain_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '$')
}

/// Prefix an action with its context switch
pub fn compose(role: &str, action: &str) -> String {
    format!("USE ROLE {role}{STATEMENT_SEPARATOR}{action}")
}

/// CREATE statement with every attribute of the object
pub fn create(object: &ManagedObject, role: &str) -> String {
    let kind = object.kind();
    let mut action = format!("CREATE {} {}", kind.keyword(), render_name(object.name()));
    if kind.accepts_params() {
        for (key, value) in object.params() {
            action.push_str(&format!(" {} = {}", key, render_value(key, value)));
        }
    }
    compose(role, &action)
}

pub fn drop(kind: ObjectKind, name: &str, role: &str) -> String {
    compose(role, &format!("DROP {} {}", kind.keyword(), render_name(name)))
}

/// ALTER ... SET for a single attribute
pub fn alter_set(kind: ObjectKind, name: &str, key: &str, value: &ParamValue, role: &str) -> String {
    compose(
        role,
        &format!(
            "ALTER {} {} SET {} = {}",
            kind.keyword(),
            render_name(name),
            key,
            render_value(key, value)
        ),
    )
}

/// ALTER ... UNSET for a single attribute
pub fn alter_unset(kind: ObjectKind, name: &str, key: &str, role: &str) -> String {
    compose(
        role,
        &format!("ALTER {} {} UNSET {}", kind.keyword(), render_name(name), key),
    )
}

/// Split a compound statement into its atomic pieces.
///
/// Only the first separator is significant: the action clause may contain
/// `; ` inside a quoted value.
pub fn split_statement(statement: &str) -> Vec<String> {
    match statement.split_once(STATEMENT_SEPARATOR) {
        Some((context, action)) => vec![context.trim().to_string(), action.trim().to_string()],
        None => vec![statement.trim().to_string()],
    }
}

/// Attributes whose values never leave floe except inside executed statements
const SECRET_PARAMS: &[&str] = &["password"];

const REDACTED: &str = "'***'";

/// Copy of a statement safe to print or log, with secret literals masked.
///
/// Only display paths use this; the runner always receives the original.
pub fn redact(statement: &str) -> String {
    let mut out = statement.to_string();
    for key in SECRET_PARAMS {
        let marker = format!(" {key} = '");
        let mut from = 0;
        while let Some(pos) = out[from..].find(&marker) {
            let start = from + pos + marker.len() - 1;
            let end = quoted_literal_end(&out, start);
            out.replace_range(start..end, REDACTED);
            from = start + REDACTED.len();
        }
    }
    out
}

/// Byte index just past the single-quoted literal opening at `start`
fn quoted_literal_end(s: &str, start: usize) -> usize {
    let bytes = s.as_bytes();
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}
