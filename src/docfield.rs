//! @ai:module:intent Define the parsed reST field-list model for one docstring
//! @ai:module:layer domain
//! @ai:module:public_api FieldKind, DocField, DocFields
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};
use std::fmt;

/// @ai:intent Classifies a reST field-list entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    Param,
    Type,
    Returns,
    Rtype,
    Raises,
    Other,
    ParseError,
}

impl FieldKind {
    /// @ai:intent Map a field name as written (`:returns:`, `:arg x:`) to its kind
    /// @ai:example ("parameter") -> Param
    /// @ai:example ("return") -> Returns
    /// @ai:example ("ivar") -> Other
    /// @ai:effects pure
    pub fn from_field_name(name: &str) -> Self {
        match name {
            "param" | "parameter" | "arg" | "argument" => FieldKind::Param,
            "type" => FieldKind::Type,
            "returns" | "return" => FieldKind::Returns,
            "rtype" => FieldKind::Rtype,
            "raises" | "raise" | "except" | "exception" => FieldKind::Raises,
            _ => FieldKind::Other,
        }
    }

    /// @ai:intent Check if this kind must name a parameter as its subject
    /// @ai:effects pure
    pub fn requires_subject(&self) -> bool {
        matches!(self, FieldKind::Param | FieldKind::Type)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Param => "param",
            FieldKind::Type => "type",
            FieldKind::Returns => "returns",
            FieldKind::Rtype => "rtype",
            FieldKind::Raises => "raises",
            FieldKind::Other => "other",
            FieldKind::ParseError => "parse-error",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// @ai:intent One reST field-list entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocField {
    pub kind: FieldKind,
    pub subject: Option<String>,
    pub body: String,
    /// Derived from another field (`:param int x:`) rather than written out
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub inline: bool,
}

impl DocField {
    pub fn new(kind: FieldKind, subject: Option<&str>, body: &str) -> Self {
        Self {
            kind,
            subject: subject.map(str::to_string),
            body: body.to_string(),
            inline: false,
        }
    }

    pub fn param(name: &str, body: &str) -> Self {
        Self::new(FieldKind::Param, Some(name), body)
    }

    pub fn type_of(name: &str, type_text: &str) -> Self {
        Self::new(FieldKind::Type, Some(name), type_text)
    }

    /// @ai:intent Type field carried inline by a `:param <type> <name>:` header
    pub fn inline_type_of(name: &str, type_text: &str) -> Self {
        Self {
            inline: true,
            ..Self::type_of(name, type_text)
        }
    }

    pub fn returns(body: &str) -> Self {
        Self::new(FieldKind::Returns, None, body)
    }

    pub fn rtype(type_text: &str) -> Self {
        Self::new(FieldKind::Rtype, None, type_text)
    }

    pub fn raises(exception: &str, body: &str) -> Self {
        Self::new(FieldKind::Raises, Some(exception), body)
    }
}

/// @ai:intent Fields of one docstring in textual order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DocFields {
    pub fields: Vec<DocField>,
}

impl DocFields {
    pub fn new(fields: Vec<DocField>) -> Self {
        Self { fields }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DocField> {
        self.fields.iter()
    }

    /// @ai:intent Iterate over fields of one kind, preserving textual order
    /// @ai:effects pure
    pub fn of_kind(&self, kind: FieldKind) -> impl Iterator<Item = &DocField> {
        self.fields.iter().filter(move |f| f.kind == kind)
    }

    pub fn has_kind(&self, kind: FieldKind) -> bool {
        self.of_kind(kind).next().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

impl FromIterator<DocField> for DocFields {
    fn from_iter<I: IntoIterator<Item = DocField>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a DocFields {
    type Item = &'a DocField;
    type IntoIter = std::slice::Iter<'a, DocField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_name_aliases() {
        assert_eq!(FieldKind::from_field_name("arg"), FieldKind::Param);
        assert_eq!(FieldKind::from_field_name("return"), FieldKind::Returns);
        assert_eq!(FieldKind::from_field_name("exception"), FieldKind::Raises);
        assert_eq!(FieldKind::from_field_name("keyword"), FieldKind::Other);
        assert_eq!(FieldKind::from_field_name("Param"), FieldKind::Other);
    }

    #[test]
    fn test_of_kind_preserves_order() {
        let fields: DocFields = vec![
            DocField::param("b", "second"),
            DocField::returns("result"),
            DocField::param("a", "first"),
        ]
        .into_iter()
        .collect();

        let names: Vec<_> = fields
            .of_kind(FieldKind::Param)
            .filter_map(|f| f.subject.as_deref())
            .collect();

        assert_eq!(names, vec!["b", "a"]);
        assert!(fields.has_kind(FieldKind::Returns));
        assert!(!fields.has_kind(FieldKind::Rtype));
    }
}
