//! @ai:module:intent Canonicalize signatures and doc fields before comparison
//! @ai:module:layer domain
//! @ai:module:public_api normalize_type, TypeExpr, expected_parameters, resolve_subject, is_identifier_like
//! @ai:module:depends_on signature
//! @ai:module:stateless true

use crate::signature::{FunctionSignature, Parameter};
use regex::Regex;
use std::sync::OnceLock;

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\*{0,2}[^\W\d]\w*$").expect("Invalid regex pattern"))
}

fn rest_role_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r":(?:[a-z]+:)?[a-z]+:").expect("Invalid regex pattern"))
}

/// @ai:intent A type reduced to its base plus whether `None` is admitted
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeExpr {
    pub base: String,
    pub nullable: bool,
}

impl TypeExpr {
    /// @ai:intent Parse annotation or documented type text into a comparable form
    /// @ai:example ("Optional[int]") -> TypeExpr { base: "int", nullable: true }
    /// @ai:example ("None | int") -> TypeExpr { base: "int", nullable: true }
    /// @ai:example ("Union[int, str]") -> TypeExpr { base: "int | str", nullable: false }
    /// @ai:effects pure
    pub fn parse(text: &str) -> Self {
        Self::from_normalized(&normalize_type(text))
    }

    fn from_normalized(text: &str) -> Self {
        let members = split_top_level(text, '|');
        if members.len() > 1 {
            return Self::from_union(&members);
        }

        for prefix in ["Optional[", "typing.Optional["] {
            if let Some(inner) = strip_generic(text, prefix) {
                let inner = Self::from_normalized(inner);
                return Self {
                    base: inner.base,
                    nullable: true,
                };
            }
        }

        for prefix in ["Union[", "typing.Union["] {
            if let Some(inner) = strip_generic(text, prefix) {
                return Self::from_union(&split_top_level(inner, ','));
            }
        }

        Self {
            base: text.to_string(),
            nullable: false,
        }
    }

    fn from_union(members: &[&str]) -> Self {
        let nullable = members.iter().any(|m| *m == "None");
        let rest: Vec<&str> = members.iter().copied().filter(|m| *m != "None").collect();

        if rest.is_empty() {
            return Self {
                base: "None".to_string(),
                nullable: false,
            };
        }

        Self {
            base: rest.join(" | "),
            nullable,
        }
    }

    /// @ai:intent Check if this is exactly the `None` type
    pub fn is_none(&self) -> bool {
        self.base == "None" && !self.nullable
    }
}

/// @ai:intent Canonicalize type text: roles, quotes and spacing
/// @ai:example ("List[ int ]") -> "List[int]"
/// @ai:example ("Dict[str,int]") -> "Dict[str, int]"
/// @ai:example (":class:`~pkg.Model`") -> "pkg.Model"
/// @ai:effects pure
pub fn normalize_type(text: &str) -> String {
    let without_roles = rest_role_re().replace_all(text, "");
    let cleaned: String = without_roles
        .chars()
        .filter(|c| *c != '`' && *c != '~')
        .collect();
    let unquoted = strip_quotes(cleaned.trim());

    let mut out = String::with_capacity(unquoted.len());
    let mut pending_space = false;

    for ch in unquoted.chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }

        match ch {
            '[' | ']' | '(' | ')' | '.' => {
                trim_trailing_spaces(&mut out);
                out.push(ch);
            }
            ',' => {
                trim_trailing_spaces(&mut out);
                out.push_str(", ");
            }
            '|' => {
                trim_trailing_spaces(&mut out);
                out.push_str(" | ");
            }
            _ => {
                if pending_space && !out.is_empty() && !out.ends_with([' ', '[', '(', '.']) {
                    out.push(' ');
                }
                out.push(ch);
            }
        }
        pending_space = false;
    }

    out.trim().to_string()
}

/// @ai:intent Check if a return annotation means "returns nothing"
/// @ai:effects pure
pub fn is_none_annotation(return_type: Option<&str>) -> bool {
    match return_type {
        None => true,
        Some(text) => TypeExpr::parse(text).is_none(),
    }
}

fn strip_quotes(text: &str) -> &str {
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}

fn trim_trailing_spaces(out: &mut String) {
    while out.ends_with(' ') {
        out.pop();
    }
}

/// @ai:intent Return the argument text of `Name[...]` when the brackets span the whole text
/// @ai:effects pure
fn strip_generic<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    if !text.starts_with(prefix) || !text.ends_with(']') {
        return None;
    }

    let open = prefix.len() - 1;
    let mut depth = 0usize;
    for (idx, ch) in text.char_indices().skip(open) {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return (idx == text.len() - 1).then(|| &text[prefix.len()..idx]);
                }
            }
            _ => {}
        }
    }
    None
}

/// @ai:intent Split on a separator that is not nested inside brackets
/// @ai:effects pure
fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (idx, ch) in text.char_indices() {
        match ch {
            '[' | '(' => depth += 1,
            ']' | ')' => depth -= 1,
            c if c == separator && depth == 0 => {
                parts.push(text[start..idx].trim());
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(text[start..].trim());
    parts
}

/// @ai:intent Check if a parameter is the implicit receiver of a method
/// @ai:effects pure
pub fn is_implicit_receiver(signature: &FunctionSignature, parameter: &Parameter) -> bool {
    signature.is_method
        && parameter.position == 0
        && (parameter.name == "self" || parameter.name == "cls")
}

/// @ai:intent Parameters that must be documented, in declaration order
/// @ai:post `self`/`cls` of a method is never included
/// @ai:effects pure
pub fn expected_parameters(signature: &FunctionSignature) -> Vec<&Parameter> {
    signature
        .parameters
        .iter()
        .filter(|p| !is_implicit_receiver(signature, p))
        .collect()
}

/// @ai:intent Find the expected parameter a documented subject refers to
/// @ai:example ("*args") matches a variadic-positional `args`
/// @ai:example ("args") matches a variadic-positional `args`
/// @ai:example ("*x") matches nothing when `x` is a plain parameter
/// @ai:effects pure
pub fn resolve_subject<'a>(expected: &[&'a Parameter], subject: &str) -> Option<&'a Parameter> {
    let bare = subject.trim_start_matches('*');
    let stars = &subject[..subject.len() - bare.len()];

    expected
        .iter()
        .copied()
        .find(|p| p.name == bare && (stars.is_empty() || p.kind.star_prefix() == stars))
}

/// @ai:intent Check if a subject looks like a (possibly starred) identifier
/// @ai:effects pure
pub fn is_identifier_like(subject: &str) -> bool {
    identifier_re().is_match(subject)
}
