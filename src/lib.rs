//! @ai:module:intent rstdoc library: keep reST docstring field lists consistent with signatures
//! @ai:module:layer infrastructure
//! @ai:module:public_api analyzer, checker, config, diagnostic, docfield, extractor, fieldlist, normalize, output, signature, error
//! @ai:module:stateless true
//!
//! # rstdoc
//!
//! Compares each Python function's signature with the `:param:`, `:type:`,
//! `:returns:`, `:rtype:` and `:raises:` fields of its docstring and reports
//! every place where the two have drifted apart.
//!
//! ## Example
//!
//! ```rust,no_run
//! use rstdoc::{checker, output, CheckConfig};
//! use std::path::PathBuf;
//!
//! let config = CheckConfig::default();
//! let result = checker::check_paths(&[PathBuf::from("src")], &config).unwrap();
//! println!("{}", output::format_check_result(&result, output::OutputFormat::Text));
//! ```
//!
//! The analyzer can also be driven directly with hand-built values:
//!
//! ```rust
//! use rstdoc::{analyze, CheckConfig, DocField, DocFields, FunctionSignature, Location, Parameter};
//!
//! let signature = FunctionSignature::new("f", Location::default())
//!     .with_param(Parameter::new("a", 0))
//!     .with_param(Parameter::new("b", 1));
//! let fields = DocFields::new(vec![DocField::param("a", "First.")]);
//!
//! let diagnostics = analyze(&signature, Some(&fields), &CheckConfig::default());
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].subject(), Some("b"));
//! ```

pub mod analyzer;
pub mod checker;
pub mod config;
pub mod diagnostic;
pub mod docfield;
pub mod error;
pub mod extractor;
pub mod fieldlist;
pub mod normalize;
pub mod output;
pub mod signature;

pub use analyzer::analyze;
pub use checker::{check_file, check_paths, check_paths_with_cancel, check_source, CheckResult};
pub use config::CheckConfig;
pub use diagnostic::{Category, Diagnostic, DiagnosticKind, Severity};
pub use docfield::{DocField, DocFields, FieldKind};
pub use error::{Error, Result};
pub use extractor::{extract_file, extract_source, ExtractedFunction};
pub use fieldlist::parse_docstring;
pub use output::OutputFormat;
pub use signature::{FunctionSignature, Location, ParamKind, Parameter};
