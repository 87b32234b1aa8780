//! @ai:module:intent Parse docstring text into reST field-list entries
//! @ai:module:layer application
//! @ai:module:public_api parse_docstring
//! @ai:module:depends_on docfield
//! @ai:module:stateless true

use crate::docfield::{DocField, DocFields, FieldKind};
use regex::Regex;
use std::sync::OnceLock;

fn field_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^:([^:]*):(.*)$").expect("Invalid regex pattern"))
}

/// @ai:intent A field whose continuation lines are still being collected
struct PendingField {
    kind: FieldKind,
    subject: Option<String>,
    inline_type: Option<String>,
    body_lines: Vec<String>,
}

impl PendingField {
    fn finish(self, out: &mut Vec<DocField>) {
        let body = self
            .body_lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let subject = self.subject;
        out.push(DocField::new(self.kind, subject.as_deref(), &body));

        // `:param int x:` documents the type inline
        if let (Some(type_text), Some(name)) = (self.inline_type, subject.as_deref()) {
            out.push(DocField::inline_type_of(name, &type_text));
        }
    }
}

/// @ai:intent Parse a cleaned docstring into its field list
/// @ai:pre text is already dedented
/// @ai:post a field starts only at a line beginning with `:` in column 0
/// @ai:post every line that opens a field but cannot be split yields a ParseError field
/// @ai:effects pure
pub fn parse_docstring(text: &str) -> DocFields {
    let mut fields = Vec::new();
    let mut current: Option<PendingField> = None;

    for line in text.lines() {
        // Only an unindented `:` opens a field; indented roles continue the body
        if line.starts_with(':') {
            if let Some(pending) = current.take() {
                pending.finish(&mut fields);
            }

            match parse_field_header(line) {
                Some(pending) => current = Some(pending),
                None => fields.push(DocField::new(FieldKind::ParseError, None, line.trim_end())),
            }
            continue;
        }

        // Description text before the first field carries no fields
        if let Some(pending) = current.as_mut() {
            pending.body_lines.push(line.to_string());
        }
    }

    if let Some(pending) = current {
        pending.finish(&mut fields);
    }

    DocFields::new(fields)
}

/// @ai:intent Split `:name args: body` into a pending field
/// @ai:effects pure
fn parse_field_header(line: &str) -> Option<PendingField> {
    let captures = field_header_re().captures(line)?;
    let marker = captures.get(1)?.as_str();
    let body = captures.get(2).map_or("", |m| m.as_str());

    let mut tokens = marker.split_whitespace();
    let name = tokens.next()?;
    let args: Vec<&str> = tokens.collect();
    let kind = FieldKind::from_field_name(name);

    let (subject, inline_type) = match kind {
        FieldKind::Param => match args.split_last() {
            Some((last, [])) => (Some(unescape(last)), None),
            Some((last, type_tokens)) => (Some(unescape(last)), Some(type_tokens.join(" "))),
            None => (None, None),
        },
        FieldKind::Returns | FieldKind::Rtype => (None, None),
        _ if args.is_empty() => (None, None),
        _ => (Some(unescape(&args.join(" "))), None),
    };

    Some(PendingField {
        kind,
        subject,
        inline_type,
        body_lines: vec![body.to_string()],
    })
}

/// @ai:intent Drop reST backslash escapes (`\*args` -> `*args`)
/// @ai:effects pure
fn unescape(text: &str) -> String {
    text.replace('\\', "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_basic_fields() {
        let text = "Add two numbers.\n\n:param x: First integer.\n:param y: Second integer.\n:return: Sum of integers.\n:rtype: int";
        let fields = parse_docstring(text);

        assert_eq!(
            fields.fields,
            vec![
                DocField::param("x", "First integer."),
                DocField::param("y", "Second integer."),
                DocField::returns("Sum of integers."),
                DocField::rtype("int"),
            ]
        );
    }

    #[test]
    fn test_continuation_lines_join_body() {
        let text = ":param flag: If True, forces all functions and methods to\nhave docstrings.\n    Really.\n:raises ValueError: when bad";
        let fields = parse_docstring(text);

        assert_eq!(fields.len(), 2);
        assert_eq!(
            fields.fields[0].body,
            "If True, forces all functions and methods to have docstrings. Really."
        );
        assert_eq!(fields.fields[1], DocField::raises("ValueError", "when bad"));
    }

    #[test]
    fn test_description_only_has_no_fields() {
        let fields = parse_docstring("Just prose.\n\nMore prose: with a colon.");
        assert!(fields.is_empty());
    }

    #[test]
    fn test_inline_param_type_synthesizes_type_field() {
        let fields = parse_docstring(":param Dict[str, int] mapping: Lookup table.");

        assert_eq!(
            fields.fields,
            vec![
                DocField::param("mapping", "Lookup table."),
                DocField::inline_type_of("mapping", "Dict[str, int]"),
            ]
        );
    }

    #[test]
    fn test_escaped_variadics() {
        let fields = parse_docstring(":param \\*args: Extra.\n:param **kwargs: Options.");
        let subjects: Vec<_> = fields.iter().filter_map(|f| f.subject.clone()).collect();
        assert_eq!(subjects, vec!["*args".to_string(), "**kwargs".to_string()]);
    }

    #[test]
    fn test_unclosed_field_is_parse_error() {
        let fields = parse_docstring(":param x First integer.\n:param y: Second.");

        assert_eq!(fields.fields[0].kind, FieldKind::ParseError);
        assert_eq!(fields.fields[1], DocField::param("y", "Second."));
    }

    #[test]
    fn test_param_without_subject() {
        let fields = parse_docstring(":param: nothing named");
        assert_eq!(fields.fields, vec![DocField::new(FieldKind::Param, None, "nothing named")]);
    }

    #[test]
    fn test_unknown_field_is_other() {
        let fields = parse_docstring(":ivar count: Number of items.");
        assert_eq!(fields.fields[0].kind, FieldKind::Other);
        assert_eq!(fields.fields[0].subject.as_deref(), Some("count"));
    }

    #[test]
    fn test_indented_role_continues_field() {
        let text = ":param x: See\n    :func:`other` for details.\n:type x:\n    :class:`int`\n:rtype: int";
        let fields = parse_docstring(text);

        assert_eq!(
            fields.fields,
            vec![
                DocField::param("x", "See :func:`other` for details."),
                DocField::type_of("x", ":class:`int`"),
                DocField::rtype("int"),
            ]
        );
    }

    #[test]
    fn test_indented_role_before_fields_is_description() {
        let fields = parse_docstring("Summary that wraps\n    :class:`Model` instances.\n\n:param x: X.");
        assert_eq!(fields.fields, vec![DocField::param("x", "X.")]);
    }

    #[test]
    fn test_non_ascii_bodies() {
        let fields = parse_docstring(":param größe: Größe in µm.\n    Zweite Zeile, weiter.\n:raises ValueError: Ungültig.");

        assert_eq!(
            fields.fields,
            vec![
                DocField::param("größe", "Größe in µm. Zweite Zeile, weiter."),
                DocField::raises("ValueError", "Ungültig."),
            ]
        );
    }
}
