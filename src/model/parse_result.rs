use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Structural facts extracted from one source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseResult {
    pub path: PathBuf,
    pub fidelity: Fidelity,
    pub lines: usize,
    pub imports: Vec<Import>,
    pub classes: Vec<ClassDefinition>,
    pub functions: Vec<FunctionDefinition>,
    /// Numeric literals outside constant definitions, in source order.
    pub numeric_literals: Vec<NumericLiteral>,
    /// Identifiers referenced anywhere outside import statements.
    pub referenced_names: BTreeSet<String>,
}

/// How much of a file's structure the producing parser actually understood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fidelity {
    /// Built from a full syntax tree; spans and bodies are exact.
    Structural,
    /// Recovered with pattern matching; end lines and bodies may be unknown.
    BestEffort,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Import {
    /// Module identifier as written. Relative imports keep their dotted
    /// prefix (`..models`) or path prefix (`./models`).
    pub module: String,
    pub symbol: Option<String>,
    pub alias: Option<String>,
    pub is_relative: bool,
    pub line: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDefinition {
    pub name: String,
    pub bases: Vec<String>,
    pub methods: Vec<FunctionDefinition>,
    pub fields: Vec<String>,
    pub start_line: usize,
    pub end_line: Option<usize>,
    pub docstring: Option<String>,
    pub is_abstract: bool,
    /// Holds an `_instance` slot, overrides `__new__`, or exposes `getInstance`.
    pub is_singleton_shaped: bool,
    /// Fields initialised to a list, dict, set, array or map.
    pub mutable_fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub parameters: Vec<String>,
    pub return_type: Option<String>,
    pub start_line: usize,
    /// `None` when the parser could not locate the end of the body.
    pub end_line: Option<usize>,
    pub is_async: bool,
    pub is_static: bool,
    pub decorators: Vec<String>,
    pub docstring: Option<String>,
    pub body: Option<FunctionBody>,
}

/// Facts about a function body. Only present when the body span is known.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionBody {
    pub complexity: u32,
    /// Instance attributes read or written through `self` / `this`.
    pub attribute_refs: BTreeSet<String>,
    pub raises_not_implemented: bool,
    pub is_stub: bool,
    pub instantiations: Vec<Instantiation>,
    pub type_dispatch_chains: Vec<TypeDispatchChain>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instantiation {
    pub type_name: String,
    pub arg_count: usize,
    pub line: usize,
}

/// An if / else-if chain whose conditions inspect runtime types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDispatchChain {
    pub line: usize,
    pub branches: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericLiteral {
    pub text: String,
    pub value: f64,
    pub line: usize,
}

impl ParseResult {
    pub fn new(path: PathBuf, fidelity: Fidelity) -> Self {
        Self {
            path,
            fidelity,
            lines: 0,
            imports: Vec::new(),
            classes: Vec::new(),
            functions: Vec::new(),
            numeric_literals: Vec::new(),
            referenced_names: BTreeSet::new(),
        }
    }
}

impl Import {
    /// Name the import binds in the importing file, if any.
    pub fn bound_name(&self) -> Option<&str> {
        if let Some(alias) = &self.alias {
            return Some(alias);
        }
        match self.symbol.as_deref() {
            Some("*") => None,
            Some(symbol) => Some(symbol),
            None if self.is_relative => None,
            None => self.module.split(['.', '/']).find(|s| !s.is_empty()),
        }
    }
}

impl ClassDefinition {
    pub fn new(name: String, start_line: usize) -> Self {
        Self {
            name,
            bases: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            start_line,
            end_line: None,
            docstring: None,
            is_abstract: false,
            is_singleton_shaped: false,
            mutable_fields: Vec::new(),
        }
    }

    pub fn line_count(&self) -> Option<usize> {
        self.end_line.map(|end| end + 1 - self.start_line.min(end))
    }

    /// Abstract classes, protocols and `*Interface` / `*Base` shaped types.
    pub fn is_interface_like(&self) -> bool {
        self.is_abstract
            || self.name.ends_with("Interface")
            || self.name.ends_with("Base")
            || self.name.ends_with("Protocol")
            || self
                .bases
                .iter()
                .any(|b| matches!(b.as_str(), "ABC" | "abc.ABC" | "Protocol" | "typing.Protocol"))
    }

    pub fn method(&self, name: &str) -> Option<&FunctionDefinition> {
        self.methods.iter().find(|m| m.name == name)
    }
}

impl FunctionDefinition {
    pub fn new(name: String, start_line: usize) -> Self {
        Self {
            name,
            parameters: Vec::new(),
            return_type: None,
            start_line,
            end_line: None,
            is_async: false,
            is_static: false,
            decorators: Vec::new(),
            docstring: None,
            body: None,
        }
    }

    pub fn line_count(&self) -> Option<usize> {
        self.end_line.map(|end| end + 1 - self.start_line.min(end))
    }

    /// `@abstractmethod` in Python, the `abstract` modifier in TypeScript.
    pub fn is_abstract(&self) -> bool {
        self.decorators.iter().any(|d| {
            d == "abstractmethod" || d.ends_with(".abstractmethod") || d == "abstract"
        })
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "__init__" || self.name == "constructor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn import(module: &str, symbol: Option<&str>, alias: Option<&str>) -> Import {
        Import {
            module: module.to_string(),
            symbol: symbol.map(str::to_string),
            alias: alias.map(str::to_string),
            is_relative: module.starts_with('.'),
            line: 1,
        }
    }

    #[test]
    fn test_bound_name() {
        assert_eq!(import("os.path", None, None).bound_name(), Some("os"));
        assert_eq!(import("numpy", None, Some("np")).bound_name(), Some("np"));
        assert_eq!(import("typing", Some("List"), None).bound_name(), Some("List"));
        assert_eq!(import("typing", Some("*"), None).bound_name(), None);
        assert_eq!(import("@scope/pkg", None, None).bound_name(), Some("@scope"));
    }

    #[test]
    fn test_line_counts() {
        let mut f = FunctionDefinition::new("f".into(), 10);
        assert_eq!(f.line_count(), None);
        f.end_line = Some(19);
        assert_eq!(f.line_count(), Some(10));
    }

    #[test]
    fn test_interface_like() {
        let mut c = ClassDefinition::new("Repository".into(), 1);
        assert!(!c.is_interface_like());
        c.bases.push("ABC".into());
        assert!(c.is_interface_like());
        assert!(ClassDefinition::new("StorageInterface".into(), 1).is_interface_like());
    }
}
