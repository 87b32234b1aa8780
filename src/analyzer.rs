//! @ai:module:intent Compare a function signature with its docstring field list
//! @ai:module:layer application
//! @ai:module:public_api analyze
//! @ai:module:depends_on signature, docfield, normalize, diagnostic, config
//! @ai:module:stateless true

use crate::config::CheckConfig;
use crate::diagnostic::{Category, Diagnostic, DiagnosticKind};
use crate::docfield::{DocField, DocFields, FieldKind};
use crate::normalize::{
    expected_parameters, is_identifier_like, is_none_annotation, normalize_type, resolve_subject,
    TypeExpr,
};
use crate::signature::{FunctionSignature, Parameter};
use std::collections::{BTreeMap, HashMap, HashSet};

/// @ai:intent Collects diagnostics for one function before filtering and ordering
struct Findings<'a> {
    signature: &'a FunctionSignature,
    config: &'a CheckConfig,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Findings<'a> {
    fn new(signature: &'a FunctionSignature, config: &'a CheckConfig) -> Self {
        Self {
            signature,
            config,
            diagnostics: Vec::new(),
        }
    }

    fn push(&mut self, kind: DiagnosticKind, position: Option<usize>) {
        let mut diagnostic = Diagnostic::new(
            kind,
            &self.signature.qualified_name,
            self.signature.location.clone(),
        )
        .at_position(position);

        if diagnostic.category == Category::MissingRtypeDoc {
            diagnostic = diagnostic.with_severity(self.config.missing_rtype_severity);
        }

        self.diagnostics.push(diagnostic);
    }

    /// @ai:intent Drop ignored categories, order deterministically, collapse repeats
    /// @ai:post no two diagnostics share (category, field, subject)
    fn finish(self) -> Vec<Diagnostic> {
        let config = self.config;
        let mut diagnostics = self.diagnostics;

        diagnostics.retain(|d| config.reports(d.category));
        diagnostics.sort_by(Diagnostic::cmp_within_function);

        let mut seen = HashSet::new();
        diagnostics.retain(|d| {
            let (category, field, subject) = d.dedup_key();
            seen.insert((category, field, subject.map(str::to_string)))
        });

        diagnostics
    }
}

/// @ai:intent Report every discrepancy between a signature and its docstring fields
/// @ai:pre `docstring` is None only when the function has no docstring at all
/// @ai:post output is sorted by category group, parameter position, then subject
/// @ai:post identical inputs yield identical output
/// @ai:effects pure
pub fn analyze(
    signature: &FunctionSignature,
    docstring: Option<&DocFields>,
    config: &CheckConfig,
) -> Vec<Diagnostic> {
    let mut findings = Findings::new(signature, config);

    let Some(fields) = docstring else {
        findings.push(DiagnosticKind::MissingDocstring, None);
        return findings.finish();
    };

    let expected = expected_parameters(signature);
    let usable = check_field_shapes(fields, &mut findings);

    check_duplicates(&usable, &expected, &mut findings);
    let documented = check_documented_params(&usable, &expected, &mut findings);
    let documented_types = collect_documented_types(&usable, &expected, &mut findings);
    check_expected_params(&expected, &documented, &documented_types, &mut findings);
    check_param_order(&expected, &documented, &mut findings);
    check_returns(signature, fields, config, &mut findings);

    findings.finish()
}

/// @ai:intent Report malformed fields and keep those usable for matching
/// @ai:post param/type fields without an identifier-like subject are excluded
/// @ai:effects pure
fn check_field_shapes<'f>(fields: &'f DocFields, findings: &mut Findings) -> Vec<&'f DocField> {
    let mut usable = Vec::new();

    for field in fields {
        match field.kind {
            FieldKind::Other | FieldKind::ParseError => continue,
            kind if kind.requires_subject() => {
                let subject = field.subject.as_deref().unwrap_or("");
                if !is_identifier_like(subject) {
                    findings.push(
                        DiagnosticKind::MalformedFieldDoc {
                            field: kind,
                            subject: field.subject.clone().filter(|s| !s.is_empty()),
                            reason: "expected a parameter name".to_string(),
                        },
                        None,
                    );
                    continue;
                }
            }
            _ => {}
        }

        if field.body.trim().is_empty() && field.kind != FieldKind::Raises {
            findings.push(
                DiagnosticKind::MalformedFieldDoc {
                    field: field.kind,
                    subject: field.subject.clone(),
                    reason: "field body is empty".to_string(),
                },
                None,
            );
        }

        usable.push(field);
    }

    usable
}

/// @ai:intent Name a field's subject by the parameter it resolves to, if any
fn canonical_subject(field: &DocField, expected: &[&Parameter]) -> Option<String> {
    let subject = field.subject.as_deref()?;
    if field.kind.requires_subject() {
        if let Some(param) = resolve_subject(expected, subject) {
            return Some(param.name.clone());
        }
    }
    Some(subject.to_string())
}

/// @ai:intent Report repeated (kind, subject) pairs
/// @ai:post inline types from `:param <type> <name>:` never count as repeats
/// @ai:effects pure
fn check_duplicates(usable: &[&DocField], expected: &[&Parameter], findings: &mut Findings) {
    let mut counts: BTreeMap<(FieldKind, Option<String>), usize> = BTreeMap::new();

    for field in usable.iter().filter(|f| !f.inline) {
        *counts
            .entry((field.kind, canonical_subject(field, expected)))
            .or_default() += 1;
    }

    for ((kind, subject), count) in counts {
        if count > 1 {
            let position = subject
                .as_deref()
                .filter(|_| kind.requires_subject())
                .and_then(|s| resolve_subject(expected, s))
                .map(|p| p.position);

            findings.push(
                DiagnosticKind::DuplicateFieldDoc {
                    field: kind,
                    subject,
                },
                position,
            );
        }
    }
}

/// @ai:intent Resolve `:param:` fields, reporting names the signature lacks
/// @ai:post result lists each documented parameter once, in first-mention order
/// @ai:effects pure
fn check_documented_params<'p>(
    usable: &[&DocField],
    expected: &[&'p Parameter],
    findings: &mut Findings,
) -> Vec<&'p Parameter> {
    let mut documented: Vec<&Parameter> = Vec::new();

    for field in usable.iter().copied().filter(|f| f.kind == FieldKind::Param) {
        let Some(subject) = field.subject.as_deref() else {
            continue;
        };

        match resolve_subject(expected, subject) {
            Some(param) => {
                if !documented.iter().any(|p| p.position == param.position) {
                    documented.push(param);
                }
            }
            None => findings.push(
                DiagnosticKind::UnknownParamDoc {
                    name: subject.to_string(),
                },
                None,
            ),
        }
    }

    documented
}

/// @ai:intent Map parameter names to their first non-empty `:type:` text
/// @ai:effects pure
fn collect_documented_types<'f>(
    usable: &[&'f DocField],
    expected: &[&Parameter],
    findings: &mut Findings,
) -> HashMap<String, &'f str> {
    let mut types = HashMap::new();

    for field in usable.iter().copied().filter(|f| f.kind == FieldKind::Type) {
        let Some(subject) = field.subject.as_deref() else {
            continue;
        };

        match resolve_subject(expected, subject) {
            Some(param) => {
                if !field.body.trim().is_empty() {
                    types.entry(param.name.clone()).or_insert(field.body.as_str());
                }
            }
            None => findings.push(
                DiagnosticKind::UnknownParamDoc {
                    name: subject.to_string(),
                },
                None,
            ),
        }
    }

    types
}

/// @ai:intent Report undocumented parameters and annotation/doc type drift
/// @ai:effects pure
fn check_expected_params(
    expected: &[&Parameter],
    documented: &[&Parameter],
    documented_types: &HashMap<String, &str>,
    findings: &mut Findings,
) {
    for param in expected {
        if !documented.iter().any(|p| p.position == param.position) {
            findings.push(
                DiagnosticKind::MissingParamDoc {
                    name: param.name.clone(),
                },
                Some(param.position),
            );
            continue;
        }

        let declared = param.declared_type.as_deref();
        let documented_type = documented_types.get(&param.name).copied();

        let kind = match (declared, documented_type) {
            (Some(declared), Some(doc_type)) => {
                if TypeExpr::parse(declared) == TypeExpr::parse(doc_type) {
                    continue;
                }
                DiagnosticKind::TypeMismatch {
                    name: param.name.clone(),
                    declared: normalize_type(declared),
                    documented: normalize_type(doc_type),
                }
            }
            (Some(declared), None) => DiagnosticKind::TypeDocMissing {
                name: param.name.clone(),
                declared: Some(normalize_type(declared)),
                documented: None,
            },
            (None, Some(doc_type)) => DiagnosticKind::TypeDocMissing {
                name: param.name.clone(),
                declared: None,
                documented: Some(normalize_type(doc_type)),
            },
            (None, None) => continue,
        };

        findings.push(kind, Some(param.position));
    }
}

/// @ai:intent Report once when documented order differs from declaration order
/// @ai:effects pure
fn check_param_order(expected: &[&Parameter], documented: &[&Parameter], findings: &mut Findings) {
    let actual: Vec<usize> = documented.iter().map(|p| p.position).collect();
    let mut declared = actual.clone();
    declared.sort_unstable();

    if actual == declared {
        return;
    }

    let name_at = |position: &usize| {
        expected
            .iter()
            .find(|p| p.position == *position)
            .map(|p| p.name.clone())
            .unwrap_or_default()
    };

    findings.push(
        DiagnosticKind::ParamOrderMismatch {
            expected: declared.iter().map(name_at).collect(),
            actual: actual.iter().map(name_at).collect(),
        },
        None,
    );
}

/// @ai:intent Require `:returns:`/`:rtype:` for functions that return a value
/// @ai:effects pure
fn check_returns(
    signature: &FunctionSignature,
    fields: &DocFields,
    config: &CheckConfig,
    findings: &mut Findings,
) {
    let return_type = signature.return_type.as_deref();
    let documented_rtype = fields
        .of_kind(FieldKind::Rtype)
        .map(|f| f.body.trim())
        .find(|body| !body.is_empty());
    let has_rtype = fields.has_kind(FieldKind::Rtype);

    if !is_none_annotation(return_type) {
        if !fields.has_kind(FieldKind::Returns) {
            findings.push(DiagnosticKind::MissingReturnDoc, None);
        }
        if !has_rtype {
            findings.push(DiagnosticKind::MissingRtypeDoc, None);
        }
    } else if return_type.is_some() && config.require_rtype_for_none && !has_rtype {
        findings.push(DiagnosticKind::MissingRtypeDoc, None);
    }

    if let (Some(declared), Some(documented)) = (return_type, documented_rtype) {
        if TypeExpr::parse(declared) != TypeExpr::parse(documented) {
            findings.push(
                DiagnosticKind::RtypeMismatch {
                    declared: normalize_type(declared),
                    documented: normalize_type(documented),
                },
                None,
            );
        }
    }
}
