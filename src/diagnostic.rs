//! @ai:module:intent Define diagnostic categories, severities and their message contracts
//! @ai:module:layer domain
//! @ai:module:public_api Category, CategoryGroup, Severity, DiagnosticKind, Diagnostic
//! @ai:module:depends_on docfield, signature
//! @ai:module:stateless true

use crate::docfield::FieldKind;
use crate::signature::Location;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// @ai:intent Severity level for diagnostics
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

/// @ai:intent Ordering groups: missing > mismatch > unknown > order > duplicate > structural
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CategoryGroup {
    Missing,
    Mismatch,
    Unknown,
    Order,
    Duplicate,
    Structural,
}

/// @ai:intent Enumerated kind of a reported inconsistency
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    MissingDocstring,
    MissingParamDoc,
    TypeDocMissing,
    MissingReturnDoc,
    MissingRtypeDoc,
    TypeMismatch,
    RtypeMismatch,
    UnknownParamDoc,
    ParamOrderMismatch,
    DuplicateFieldDoc,
    MalformedFieldDoc,
    InvalidRest,
    InvalidSource,
}

impl Category {
    pub const ALL: [Category; 13] = [
        Category::MissingDocstring,
        Category::MissingParamDoc,
        Category::TypeDocMissing,
        Category::MissingReturnDoc,
        Category::MissingRtypeDoc,
        Category::TypeMismatch,
        Category::RtypeMismatch,
        Category::UnknownParamDoc,
        Category::ParamOrderMismatch,
        Category::DuplicateFieldDoc,
        Category::MalformedFieldDoc,
        Category::InvalidRest,
        Category::InvalidSource,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::MissingDocstring => "missing-docstring",
            Category::MissingParamDoc => "missing-param-doc",
            Category::TypeDocMissing => "type-doc-missing",
            Category::MissingReturnDoc => "missing-return-doc",
            Category::MissingRtypeDoc => "missing-rtype-doc",
            Category::TypeMismatch => "type-mismatch",
            Category::RtypeMismatch => "rtype-mismatch",
            Category::UnknownParamDoc => "unknown-param-doc",
            Category::ParamOrderMismatch => "param-order-mismatch",
            Category::DuplicateFieldDoc => "duplicate-field-doc",
            Category::MalformedFieldDoc => "malformed-field-doc",
            Category::InvalidRest => "invalid-rest",
            Category::InvalidSource => "invalid-source",
        }
    }

    /// @ai:intent Rank group used as the primary sort key
    /// @ai:effects pure
    pub fn group(&self) -> CategoryGroup {
        match self {
            Category::MissingDocstring
            | Category::MissingParamDoc
            | Category::TypeDocMissing
            | Category::MissingReturnDoc
            | Category::MissingRtypeDoc => CategoryGroup::Missing,
            Category::TypeMismatch | Category::RtypeMismatch => CategoryGroup::Mismatch,
            Category::UnknownParamDoc => CategoryGroup::Unknown,
            Category::ParamOrderMismatch => CategoryGroup::Order,
            Category::DuplicateFieldDoc => CategoryGroup::Duplicate,
            Category::MalformedFieldDoc | Category::InvalidRest | Category::InvalidSource => {
                CategoryGroup::Structural
            }
        }
    }

    /// @ai:intent Severity used unless configuration overrides it
    /// @ai:effects pure
    pub fn default_severity(&self) -> Severity {
        match self {
            Category::TypeDocMissing | Category::ParamOrderMismatch => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown diagnostic category `{}`", s))
    }
}

/// @ai:intent Category plus the data its message is derived from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "category", rename_all = "kebab-case")]
pub enum DiagnosticKind {
    MissingDocstring,
    MissingParamDoc {
        name: String,
    },
    /// Only one of annotation and `:type:` field gives the type
    TypeDocMissing {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        declared: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        documented: Option<String>,
    },
    MissingReturnDoc,
    MissingRtypeDoc,
    TypeMismatch {
        name: String,
        declared: String,
        documented: String,
    },
    RtypeMismatch {
        declared: String,
        documented: String,
    },
    UnknownParamDoc {
        name: String,
    },
    ParamOrderMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },
    DuplicateFieldDoc {
        field: FieldKind,
        subject: Option<String>,
    },
    MalformedFieldDoc {
        field: FieldKind,
        subject: Option<String>,
        reason: String,
    },
    InvalidRest {
        line: String,
    },
    InvalidSource {
        reason: String,
    },
}

impl DiagnosticKind {
    pub fn category(&self) -> Category {
        match self {
            DiagnosticKind::MissingDocstring => Category::MissingDocstring,
            DiagnosticKind::MissingParamDoc { .. } => Category::MissingParamDoc,
            DiagnosticKind::TypeDocMissing { .. } => Category::TypeDocMissing,
            DiagnosticKind::MissingReturnDoc => Category::MissingReturnDoc,
            DiagnosticKind::MissingRtypeDoc => Category::MissingRtypeDoc,
            DiagnosticKind::TypeMismatch { .. } => Category::TypeMismatch,
            DiagnosticKind::RtypeMismatch { .. } => Category::RtypeMismatch,
            DiagnosticKind::UnknownParamDoc { .. } => Category::UnknownParamDoc,
            DiagnosticKind::ParamOrderMismatch { .. } => Category::ParamOrderMismatch,
            DiagnosticKind::DuplicateFieldDoc { .. } => Category::DuplicateFieldDoc,
            DiagnosticKind::MalformedFieldDoc { .. } => Category::MalformedFieldDoc,
            DiagnosticKind::InvalidRest { .. } => Category::InvalidRest,
            DiagnosticKind::InvalidSource { .. } => Category::InvalidSource,
        }
    }

    /// @ai:intent Parameter, return or field name the diagnostic is about
    /// @ai:effects pure
    pub fn subject(&self) -> Option<&str> {
        match self {
            DiagnosticKind::MissingParamDoc { name }
            | DiagnosticKind::TypeDocMissing { name, .. }
            | DiagnosticKind::TypeMismatch { name, .. }
            | DiagnosticKind::UnknownParamDoc { name } => Some(name),
            DiagnosticKind::DuplicateFieldDoc { subject, .. }
            | DiagnosticKind::MalformedFieldDoc { subject, .. } => subject.as_deref(),
            _ => None,
        }
    }

    /// @ai:intent Field kind for field-level categories, absent otherwise
    pub fn field(&self) -> Option<FieldKind> {
        match self {
            DiagnosticKind::DuplicateFieldDoc { field, .. }
            | DiagnosticKind::MalformedFieldDoc { field, .. } => Some(*field),
            _ => None,
        }
    }

    /// @ai:intent Derive the human-readable explanation
    /// @ai:effects pure
    pub fn message(&self, function: &str) -> String {
        match self {
            DiagnosticKind::MissingDocstring => {
                format!("No docstring found in function `{}`", function)
            }
            DiagnosticKind::MissingParamDoc { name } => {
                format!("Parameter `{}` of `{}` is not documented", name, function)
            }
            DiagnosticKind::TypeDocMissing {
                name,
                declared: Some(declared),
                ..
            } => format!(
                "Parameter `{}` of `{}` is annotated as `{}` but has no `:type {}:` field",
                name, function, declared, name
            ),
            DiagnosticKind::TypeDocMissing {
                name,
                documented: Some(documented),
                ..
            } => format!(
                "Parameter `{}` of `{}` is documented as `{}` but has no type annotation",
                name, function, documented
            ),
            DiagnosticKind::TypeDocMissing { name, .. } => format!(
                "Type of parameter `{}` of `{}` is given on one side only",
                name, function
            ),
            DiagnosticKind::MissingReturnDoc => {
                format!("Return value of `{}` is not documented with `:returns:`", function)
            }
            DiagnosticKind::MissingRtypeDoc => {
                format!("Return type of `{}` is not documented with `:rtype:`", function)
            }
            DiagnosticKind::TypeMismatch {
                name,
                declared,
                documented,
            } => format!(
                "Parameter `{}` of `{}` is annotated as `{}` but documented as `{}`",
                name, function, declared, documented
            ),
            DiagnosticKind::RtypeMismatch {
                declared,
                documented,
            } => format!(
                "Return type of `{}` is annotated as `{}` but documented as `{}`",
                function, declared, documented
            ),
            DiagnosticKind::UnknownParamDoc { name } => format!(
                "Documented parameter `{}` does not exist in the signature of `{}`",
                name, function
            ),
            DiagnosticKind::ParamOrderMismatch { expected, actual } => format!(
                "Parameters of `{}` are documented in order ({}) but declared in order ({})",
                function,
                actual.join(", "),
                expected.join(", ")
            ),
            DiagnosticKind::DuplicateFieldDoc { field, subject } => match subject {
                Some(subject) => format!(
                    "Field `:{} {}:` is documented more than once in `{}`",
                    field, subject, function
                ),
                None => format!(
                    "Field `:{}:` is documented more than once in `{}`",
                    field, function
                ),
            },
            DiagnosticKind::MalformedFieldDoc {
                field,
                subject,
                reason,
            } => format!(
                "Malformed `:{}{}:` field in `{}`: {}",
                field,
                subject.as_deref().map(|s| format!(" {}", s)).unwrap_or_default(),
                function,
                reason
            ),
            DiagnosticKind::InvalidRest { line } => format!(
                "Docstring of `{}` is not a valid reST field list near `{}`",
                function, line
            ),
            DiagnosticKind::InvalidSource { reason } => {
                format!("File could not be analyzed: {}", reason)
            }
        }
    }
}

/// @ai:intent One reported inconsistency, anchored at its function
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: Category,
    pub severity: Severity,
    pub function: String,
    pub location: Location,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    /// @ai:intent Build a diagnostic whose message and category follow from its kind
    /// @ai:post message == kind.message(function)
    pub fn new(kind: DiagnosticKind, function: &str, location: Location) -> Self {
        let category = kind.category();
        Self {
            category,
            severity: category.default_severity(),
            function: function.to_string(),
            location,
            message: kind.message(function),
            position: None,
            kind,
        }
    }

    pub fn at_position(mut self, position: Option<usize>) -> Self {
        self.position = position;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn subject(&self) -> Option<&str> {
        self.kind.subject()
    }

    /// @ai:intent Identity used to collapse repeated reports
    pub fn dedup_key(&self) -> (Category, Option<FieldKind>, Option<&str>) {
        (self.category, self.kind.field(), self.subject())
    }

    /// @ai:intent Order within one function: group, then position, then subject
    /// @ai:effects pure
    pub fn cmp_within_function(&self, other: &Self) -> Ordering {
        self.category
            .group()
            .cmp(&other.category.group())
            .then_with(|| cmp_position(self.position, other.position))
            .then_with(|| self.subject().cmp(&other.subject()))
            .then_with(|| self.category.cmp(&other.category))
            .then_with(|| self.kind.field().cmp(&other.kind.field()))
    }
}

/// Positioned diagnostics come before unpositioned ones.
fn cmp_position(a: Option<usize>, b: Option<usize>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
