//! @ai:module:intent Define the function signature model the analyzer checks against
//! @ai:module:layer domain
//! @ai:module:public_api Location, ParamKind, Parameter, FunctionSignature
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// @ai:intent Represents a source code location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub file: PathBuf,
    pub line: usize,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            file: PathBuf::new(),
            line: 0,
        }
    }
}

impl Location {
    /// @ai:intent Create a new Location
    pub fn new(file: PathBuf, line: usize) -> Self {
        Self { file, line }
    }
}

/// @ai:intent How a parameter binds arguments at the call site
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Positional,
    KeywordOnly,
    VariadicPositional,
    VariadicKeyword,
}

impl ParamKind {
    /// @ai:intent Star prefix used when the parameter is written out in source
    /// @ai:effects pure
    pub fn star_prefix(&self) -> &'static str {
        match self {
            ParamKind::VariadicPositional => "*",
            ParamKind::VariadicKeyword => "**",
            ParamKind::Positional | ParamKind::KeywordOnly => "",
        }
    }
}

/// @ai:intent One formal parameter of a function
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub position: usize,
    pub kind: ParamKind,
    pub declared_type: Option<String>,
    pub has_default: bool,
}

impl Parameter {
    /// @ai:intent Create an unannotated positional parameter without a default
    pub fn new(name: impl Into<String>, position: usize) -> Self {
        Self {
            name: name.into(),
            position,
            kind: ParamKind::Positional,
            declared_type: None,
            has_default: false,
        }
    }

    pub fn with_kind(mut self, kind: ParamKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_type(mut self, declared_type: impl Into<String>) -> Self {
        self.declared_type = Some(declared_type.into());
        self
    }
}

/// @ai:intent One analyzed function or method, as declared in source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunctionSignature {
    pub qualified_name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    pub is_method: bool,
    pub location: Location,
}

impl FunctionSignature {
    /// @ai:intent Create a signature with no parameters and no return annotation
    pub fn new(qualified_name: impl Into<String>, location: Location) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            parameters: Vec::new(),
            return_type: None,
            is_method: false,
            location,
        }
    }

    /// @ai:intent Append a parameter, assigning it the next position
    /// @ai:post parameter.position == previous parameter count
    pub fn with_param(mut self, mut parameter: Parameter) -> Self {
        parameter.position = self.parameters.len();
        self.parameters.push(parameter);
        self
    }

    pub fn with_return_type(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = Some(return_type.into());
        self
    }

    pub fn as_method(mut self) -> Self {
        self.is_method = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_param_assigns_positions() {
        let sig = FunctionSignature::new("f", Location::default())
            .with_param(Parameter::new("a", 99))
            .with_param(Parameter::new("b", 0).with_kind(ParamKind::VariadicPositional));

        assert_eq!(sig.parameters[0].position, 0);
        assert_eq!(sig.parameters[1].position, 1);
        assert_eq!(sig.parameters[1].kind, ParamKind::VariadicPositional);
    }

    #[test]
    fn test_star_prefix() {
        assert_eq!(ParamKind::VariadicKeyword.star_prefix(), "**");
        assert_eq!(ParamKind::KeywordOnly.star_prefix(), "");
        assert_eq!(ParamKind::VariadicPositional.star_prefix(), "*");
    }
}
