//! @ai:module:intent Extract function signatures and docstrings from Python source
//! @ai:module:layer application
//! @ai:module:public_api extract_file, extract_source, ExtractedFunction
//! @ai:module:depends_on signature, config, error
//! @ai:module:stateless true

use crate::config::CheckConfig;
use crate::error::{Error, Result};
use crate::signature::{FunctionSignature, Location, ParamKind, Parameter};
use std::collections::HashSet;
use std::path::Path;
use tree_sitter::{Node, Parser};

/// @ai:intent A function found in source, ready for analysis
#[derive(Debug, Clone)]
pub struct ExtractedFunction {
    pub signature: FunctionSignature,
    pub docstring: Option<String>,
    pub suppressed: bool,
}

/// @ai:intent Extract all analyzable functions from a Python file
/// @ai:pre path exists and is readable
/// @ai:effects fs:read
pub fn extract_file(path: &Path, config: &CheckConfig) -> Result<Vec<ExtractedFunction>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    extract_source(&content, path, config)
}

/// @ai:intent Extract all analyzable functions from Python source text
/// @ai:post functions are in source order
/// @ai:effects pure
pub fn extract_source(
    source: &str,
    path: &Path,
    config: &CheckConfig,
) -> Result<Vec<ExtractedFunction>> {
    let mut parser = Parser::new();
    parser.set_language(&tree_sitter_python::LANGUAGE.into())?;

    let tree = parser.parse(source, None).ok_or_else(|| Error::Parse {
        file: path.to_path_buf(),
        line: 0,
        message: "parser produced no syntax tree".to_string(),
    })?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(Error::Parse {
            file: path.to_path_buf(),
            line: first_error_line(root),
            message: "invalid Python syntax".to_string(),
        });
    }

    let mut suppressed_rows = HashSet::new();
    collect_suppressed_rows(root, source, &config.suppression_marker, &mut suppressed_rows);

    let mut walker = Walker {
        source,
        path,
        config,
        suppressed_rows,
        scope: Vec::new(),
        functions: Vec::new(),
    };
    walker.visit_body(root, false);

    Ok(walker.functions)
}

/// @ai:intent Depth-first walk over module and class bodies
struct Walker<'s> {
    source: &'s str,
    path: &'s Path,
    config: &'s CheckConfig,
    suppressed_rows: HashSet<usize>,
    scope: Vec<String>,
    functions: Vec<ExtractedFunction>,
}

impl<'s> Walker<'s> {
    fn text(&self, node: Node) -> &'s str {
        &self.source[node.byte_range()]
    }

    fn visit_body(&mut self, body: Node, in_class: bool) {
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            match child.kind() {
                "function_definition" => self.visit_function(child, in_class, &[]),
                "class_definition" => self.visit_class(child),
                "decorated_definition" => {
                    let decorators = self.decorator_names(child);
                    if let Some(definition) = child.child_by_field_name("definition") {
                        match definition.kind() {
                            "function_definition" => {
                                self.visit_function(definition, in_class, &decorators)
                            }
                            "class_definition" => self.visit_class(definition),
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn visit_class(&mut self, class: Node) {
        if !self.config.include_methods {
            return;
        }

        let (Some(name), Some(body)) = (
            class.child_by_field_name("name"),
            class.child_by_field_name("body"),
        ) else {
            return;
        };

        self.scope.push(self.text(name).to_string());
        self.visit_body(body, true);
        self.scope.pop();
    }

    fn visit_function(&mut self, function: Node, in_class: bool, decorators: &[String]) {
        let Some(name) = function.child_by_field_name("name") else {
            return;
        };

        let mut qualified_name = self.scope.join(".");
        if !qualified_name.is_empty() {
            qualified_name.push('.');
        }
        qualified_name.push_str(self.text(name));

        let row = function.start_position().row;
        let mut signature =
            FunctionSignature::new(qualified_name, Location::new(self.path.to_path_buf(), row + 1));
        signature.is_method = in_class && !decorators.iter().any(|d| d == "staticmethod");

        if let Some(parameters) = function.child_by_field_name("parameters") {
            signature.parameters = self.parameters(parameters);
        }

        if let Some(return_type) = function.child_by_field_name("return_type") {
            signature.return_type = Some(self.text(return_type).to_string());
        }

        let docstring = function
            .child_by_field_name("body")
            .and_then(|body| self.docstring(body));

        tracing::trace!("Extracted `{}` at line {}", signature.qualified_name, row + 1);

        self.functions.push(ExtractedFunction {
            signature,
            docstring,
            suppressed: self.suppressed_rows.contains(&row),
        });
    }

    fn decorator_names(&self, decorated: Node) -> Vec<String> {
        let mut cursor = decorated.walk();
        decorated
            .named_children(&mut cursor)
            .filter(|n| n.kind() == "decorator")
            .map(|n| self.text(n).trim_start_matches('@').trim().to_string())
            .collect()
    }

    /// @ai:intent Map a `parameters` node to declared parameters in order
    /// @ai:post separators (`/`, bare `*`) produce no parameter
    fn parameters(&self, parameters: Node) -> Vec<Parameter> {
        let mut result = Vec::new();
        let mut keyword_only = false;
        let mut cursor = parameters.walk();

        for child in parameters.named_children(&mut cursor) {
            let plain_kind = if keyword_only {
                ParamKind::KeywordOnly
            } else {
                ParamKind::Positional
            };

            let parsed = match child.kind() {
                "identifier" => Some((self.text(child).to_string(), plain_kind, None, false)),
                "default_parameter" => child
                    .child_by_field_name("name")
                    .map(|n| (self.text(n).to_string(), plain_kind, None, true)),
                "typed_parameter" => child.named_child(0).map(|target| {
                    let declared = child
                        .child_by_field_name("type")
                        .map(|t| self.text(t).to_string());
                    let (name, kind) = self.splat_target(target, plain_kind);
                    (name, kind, declared, false)
                }),
                "typed_default_parameter" => child.child_by_field_name("name").map(|n| {
                    let declared = child
                        .child_by_field_name("type")
                        .map(|t| self.text(t).to_string());
                    (self.text(n).to_string(), plain_kind, declared, true)
                }),
                "list_splat_pattern" | "dictionary_splat_pattern" => {
                    let (name, kind) = self.splat_target(child, plain_kind);
                    Some((name, kind, None, false))
                }
                "keyword_separator" => {
                    keyword_only = true;
                    None
                }
                _ => None,
            };

            if let Some((name, kind, declared_type, has_default)) = parsed {
                if kind == ParamKind::VariadicPositional {
                    keyword_only = true;
                }
                result.push(Parameter {
                    name,
                    position: result.len(),
                    kind,
                    declared_type,
                    has_default,
                });
            }
        }

        result
    }

    fn splat_target(&self, node: Node, plain_kind: ParamKind) -> (String, ParamKind) {
        let kind = match node.kind() {
            "list_splat_pattern" => ParamKind::VariadicPositional,
            "dictionary_splat_pattern" => ParamKind::VariadicKeyword,
            _ => return (self.text(node).to_string(), plain_kind),
        };
        let name = node
            .named_child(0)
            .map(|n| self.text(n))
            .unwrap_or_else(|| self.text(node).trim_start_matches('*'));
        (name.to_string(), kind)
    }

    /// @ai:intent Docstring text of a function body, cleaned and non-empty
    fn docstring(&self, body: Node) -> Option<String> {
        let mut cursor = body.walk();
        let first = body
            .named_children(&mut cursor)
            .find(|n| n.kind() != "comment")?;

        if first.kind() != "expression_statement" {
            return None;
        }

        let literal = first.named_child(0)?;
        let raw = match literal.kind() {
            "string" => string_literal_value(self.text(literal))?,
            "concatenated_string" => {
                let mut parts_cursor = literal.walk();
                let parts: Option<Vec<String>> = literal
                    .named_children(&mut parts_cursor)
                    .filter(|n| n.kind() == "string")
                    .map(|n| string_literal_value(self.text(n)))
                    .collect();
                parts?.concat()
            }
            _ => return None,
        };

        let cleaned = clean_docstring(&raw);
        (!cleaned.is_empty()).then_some(cleaned)
    }
}

/// @ai:intent Strip prefix and quotes from a string literal; bytes and f-strings are not docstrings
/// @ai:example ("r'''text'''") -> Some("text")
/// @ai:example ("b'text'") -> None
/// @ai:effects pure
fn string_literal_value(literal: &str) -> Option<String> {
    let prefix_len = literal
        .find(|c: char| c == '"' || c == '\'')
        .unwrap_or(literal.len());
    let prefix = literal[..prefix_len].to_ascii_lowercase();
    if prefix.contains('b') || prefix.contains('f') {
        return None;
    }

    let quoted = &literal[prefix_len..];
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if quoted.len() >= 2 * quote.len() && quoted.starts_with(quote) && quoted.ends_with(quote) {
            return Some(quoted[quote.len()..quoted.len() - quote.len()].to_string());
        }
    }
    None
}

/// @ai:intent Dedent docstring text the way Python's `inspect.cleandoc` does
/// @ai:effects pure
fn clean_docstring(raw: &str) -> String {
    let expanded = raw.replace('\t', "        ");
    let lines: Vec<&str> = expanded.lines().collect();

    let margin = lines
        .iter()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|l| indentation(l))
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<&str> = Vec::with_capacity(lines.len());
    for (idx, line) in lines.iter().enumerate() {
        if idx == 0 {
            cleaned.push(line.trim_start());
        } else {
            cleaned.push(skip_chars(line, margin).trim_end());
        }
    }

    while cleaned.first().is_some_and(|l| l.trim().is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().is_some_and(|l| l.trim().is_empty()) {
        cleaned.pop();
    }

    cleaned.join("\n")
}

/// Leading whitespace width in chars, not bytes.
fn indentation(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

fn skip_chars(line: &str, count: usize) -> &str {
    match line.char_indices().nth(count) {
        Some((idx, _)) => &line[idx..],
        None => "",
    }
}

fn first_error_line(node: Node) -> usize {
    if node.is_error() || node.is_missing() {
        return node.start_position().row + 1;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() {
            return first_error_line(child);
        }
    }

    node.start_position().row + 1
}

/// @ai:intent Rows holding a comment that contains the suppression marker
fn collect_suppressed_rows(node: Node, source: &str, marker: &str, rows: &mut HashSet<usize>) {
    if node.kind() == "comment" {
        if !marker.is_empty() && source[node.byte_range()].contains(marker) {
            rows.insert(node.end_position().row);
        }
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_suppressed_rows(child, source, marker, rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn extract(source: &str) -> Vec<ExtractedFunction> {
        extract_source(source, Path::new("module.py"), &CheckConfig::default()).unwrap()
    }

    #[test]
    fn test_extract_typed_function() {
        let functions = extract(
            r#"
def add(x: int, y: List[ int ] = None) -> int:
    """Add numbers.

    :param x: First integer.
    """
    return x
"#,
        );

        assert_eq!(functions.len(), 1);
        let sig = &functions[0].signature;
        assert_eq!(sig.qualified_name, "add");
        assert_eq!(sig.location, Location::new(PathBuf::from("module.py"), 2));
        assert_eq!(sig.return_type.as_deref(), Some("int"));
        assert!(!sig.is_method);

        assert_eq!(sig.parameters.len(), 2);
        assert_eq!(sig.parameters[0].declared_type.as_deref(), Some("int"));
        assert!(!sig.parameters[0].has_default);
        assert_eq!(sig.parameters[1].name, "y");
        assert_eq!(sig.parameters[1].declared_type.as_deref(), Some("List[ int ]"));
        assert!(sig.parameters[1].has_default);

        assert_eq!(
            functions[0].docstring.as_deref(),
            Some("Add numbers.\n\n:param x: First integer.")
        );
    }

    #[test]
    fn test_parameter_kinds() {
        let functions = extract("def f(a, /, b=1, *args, c, d: int = 2, **kwargs): pass\n");
        let kinds: Vec<_> = functions[0]
            .signature
            .parameters
            .iter()
            .map(|p| (p.name.as_str(), p.kind, p.position))
            .collect();

        assert_eq!(
            kinds,
            vec![
                ("a", ParamKind::Positional, 0),
                ("b", ParamKind::Positional, 1),
                ("args", ParamKind::VariadicPositional, 2),
                ("c", ParamKind::KeywordOnly, 3),
                ("d", ParamKind::KeywordOnly, 4),
                ("kwargs", ParamKind::VariadicKeyword, 5),
            ]
        );
    }

    #[test]
    fn test_bare_star_makes_keyword_only() {
        let functions = extract("def f(a, *, b: str, **opts: Any): pass\n");
        let params = &functions[0].signature.parameters;

        assert_eq!(params.len(), 3);
        assert_eq!(params[1].kind, ParamKind::KeywordOnly);
        assert_eq!(params[2].kind, ParamKind::VariadicKeyword);
        assert_eq!(params[2].name, "opts");
        assert_eq!(params[2].declared_type.as_deref(), Some("Any"));
    }

    #[test]
    fn test_methods_are_qualified() {
        let functions = extract(
            r#"
class Outer:
    def method(self, x):
        """Doc."""

    @staticmethod
    def helper(x):
        pass

    class Inner:
        @classmethod
        def build(cls):
            """Build."""

def top():
    def nested():
        pass
"#,
        );

        let names: Vec<_> = functions
            .iter()
            .map(|f| (f.signature.qualified_name.as_str(), f.signature.is_method))
            .collect();

        assert_eq!(
            names,
            vec![
                ("Outer.method", true),
                ("Outer.helper", false),
                ("Outer.Inner.build", true),
                ("top", false),
            ]
        );
    }

    #[test]
    fn test_methods_skipped_when_disabled() {
        let config = CheckConfig {
            include_methods: false,
            ..Default::default()
        };
        let functions = extract_source(
            "class A:\n    def m(self): pass\n\ndef f(): pass\n",
            Path::new("module.py"),
            &config,
        )
        .unwrap();

        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].signature.qualified_name, "f");
    }

    #[test]
    fn test_async_and_decorated_functions() {
        let functions = extract(
            "@decorator\nasync def fetch(url: str) -> bytes:\n    'Fetch.'\n    return b''\n",
        );

        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].signature.qualified_name, "fetch");
        assert_eq!(functions[0].signature.location.line, 2);
        assert_eq!(functions[0].docstring.as_deref(), Some("Fetch."));
    }

    #[test]
    fn test_missing_and_empty_docstrings() {
        let functions = extract(
            "def a():\n    return 1\n\ndef b():\n    \"\"\"   \"\"\"\n\ndef c():\n    b\"bytes\"\n\ndef d():\n    # leading comment\n    \"\"\"Doc.\"\"\"\n",
        );

        let docs: Vec<_> = functions.iter().map(|f| f.docstring.as_deref()).collect();
        assert_eq!(docs, vec![None, None, None, Some("Doc.")]);
    }

    #[test]
    fn test_suppression_marker_on_def_line() {
        let functions = extract(
            "def skipped(x):  # noqa_doc\n    pass\n\ndef checked(x):\n    pass  # noqa_doc\n",
        );

        assert!(functions[0].suppressed);
        assert!(!functions[1].suppressed);
    }

    #[test]
    fn test_syntax_error_reports_line() {
        let result = extract_source("def ok():\n    pass\n\ndef broken(:\n", Path::new("bad.py"), &CheckConfig::default());

        match result {
            Err(Error::Parse { line, .. }) => assert_eq!(line, 4),
            other => panic!("expected parse error, got {:?}", other.map(|f| f.len())),
        }
    }

    #[test]
    fn test_extract_file_reads_disk() {
        let mut file = tempfile::Builder::new().suffix(".py").tempfile().unwrap();
        writeln!(file, "def f(x):\n    \"\"\"Doc.\n\n    :param x: X.\n    \"\"\"").unwrap();

        let functions = extract_file(file.path(), &CheckConfig::default()).unwrap();

        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].docstring.as_deref(), Some("Doc.\n\n:param x: X."));
    }

    #[test]
    fn test_clean_docstring_dedents() {
        assert_eq!(
            clean_docstring("Summary.\n\n        :param x: X.\n            more\n    "),
            "Summary.\n\n:param x: X.\n    more"
        );
        assert_eq!(clean_docstring("\n    Body first.\n    "), "Body first.");
    }

    #[test]
    fn test_clean_docstring_unicode_indentation() {
        assert_eq!(
            clean_docstring("Doc.\n\n    :param x: X.\n   \u{a0}\n    \u{3000}wide\n    "),
            "Doc.\n\n:param x: X.\n\n\u{3000}wide"
        );
        assert_eq!(
            clean_docstring("Résumé.\n\u{a0}\u{a0}:param é: É.\n\u{a0}\u{a0}"),
            "Résumé.\n:param é: É."
        );
    }

    #[test]
    fn test_non_ascii_docstring_is_extracted() {
        let functions = extract(
            "def f(x):\n    \"\"\"Café.\n\n    :param x: Naïve größe.\n   \u{a0}\n    \"\"\"\n",
        );

        assert_eq!(
            functions[0].docstring.as_deref(),
            Some("Café.\n\n:param x: Naïve größe.")
        );
    }

    #[test]
    fn test_string_literal_value() {
        assert_eq!(string_literal_value("r'''raw'''").as_deref(), Some("raw"));
        assert_eq!(string_literal_value("\"x\"").as_deref(), Some("x"));
        assert_eq!(string_literal_value("f\"x\""), None);
        assert_eq!(string_literal_value("B'x'"), None);
    }
}
