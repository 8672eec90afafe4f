//! Declaration Extraction
//!
//! Turns one Python source unit into module facts: top-level and
//! class-level declarations, their signatures and decorators, and the
//! unit's import list. Also yields the raw call sites the call-graph
//! builder attributes to declarations.
//!
//! Declarations nested inside function bodies are not captured.
//!
//! @module extract

pub mod treesitter;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

// =============================================================================
// SOURCE UNIT
// =============================================================================

/// One source file handed to the engine: qualified module name, path, text.
///
/// Identity is the path. Units are never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub module: String,
    pub path: String,
    pub text: String,
}

impl SourceUnit {
    pub fn new(module: impl Into<String>, path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            path: path.into(),
            text: text.into(),
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Malformed source text for a single unit
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Failed to parse {path}{}: {message}", line_suffix(.line))]
pub struct ParseError {
    pub path: String,
    pub line: Option<u32>,
    pub message: String,
}

fn line_suffix(line: &Option<u32>) -> String {
    line.map(|l| format!(" (line {})", l)).unwrap_or_default()
}

// =============================================================================
// EXTRACTED TYPES
// =============================================================================

/// Kind of declaration extracted from source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Function,
    Method,
    Class,
}

impl DeclarationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Method => "method",
            Self::Class => "class",
        }
    }

    /// Functions and methods can enclose call sites; classes cannot.
    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Function | Self::Method)
    }
}

/// A function or method as reported in module facts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    pub signature: String,
    #[serde(default)]
    pub decorators: Vec<String>,
    #[serde(default)]
    pub is_async: bool,
    pub start_line: u32,
    pub end_line: u32,
}

/// A class with its bases, decorators and directly declared methods
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub name: String,
    #[serde(default)]
    pub bases: Vec<String>,
    #[serde(default)]
    pub decorators: Vec<String>,
    #[serde(default)]
    pub methods: Vec<FunctionInfo>,
    pub start_line: u32,
    pub end_line: u32,
}

/// Everything extracted from one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleFacts {
    pub module: String,
    pub path: String,
    /// Sorted, deduplicated qualified import names
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub classes: Vec<ClassInfo>,
    #[serde(default)]
    pub functions: Vec<FunctionInfo>,
}

/// A flat declaration: function, method (`Class.method`) or class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclarationKind,
    /// Parameter signature; `None` for classes
    pub signature: Option<String>,
    pub decorators: Vec<String>,
    pub unit: String,
    pub path: String,
    pub start_line: u32,
    pub end_line: u32,
}

impl Declaration {
    /// Number of lines covered, minus one
    pub fn span(&self) -> u32 {
        self.end_line.saturating_sub(self.start_line)
    }

    pub fn contains_line(&self, line: u32) -> bool {
        self.start_line <= line && line <= self.end_line
    }
}

impl ModuleFacts {
    /// Flatten classes, methods and functions into source order.
    ///
    /// A class precedes its methods; methods are named `Class.method`.
    pub fn declarations(&self) -> Vec<Declaration> {
        let mut decls = Vec::with_capacity(self.declaration_count());

        for class in &self.classes {
            decls.push(Declaration {
                name: class.name.clone(),
                kind: DeclarationKind::Class,
                signature: None,
                decorators: class.decorators.clone(),
                unit: self.module.clone(),
                path: self.path.clone(),
                start_line: class.start_line,
                end_line: class.end_line,
            });
            for method in &class.methods {
                decls.push(self.function_declaration(
                    method,
                    format!("{}.{}", class.name, method.name),
                    DeclarationKind::Method,
                ));
            }
        }

        for function in &self.functions {
            decls.push(self.function_declaration(
                function,
                function.name.clone(),
                DeclarationKind::Function,
            ));
        }

        // Stable: a class keeps its place ahead of its own methods
        decls.sort_by_key(|d| d.start_line);
        decls
    }

    fn function_declaration(
        &self,
        info: &FunctionInfo,
        name: String,
        kind: DeclarationKind,
    ) -> Declaration {
        Declaration {
            name,
            kind,
            signature: Some(info.signature.clone()),
            decorators: info.decorators.clone(),
            unit: self.module.clone(),
            path: self.path.clone(),
            start_line: info.start_line,
            end_line: info.end_line,
        }
    }

    /// Classes + methods + functions
    pub fn declaration_count(&self) -> usize {
        self.classes.len()
            + self.classes.iter().map(|c| c.methods.len()).sum::<usize>()
            + self.functions.len()
    }
}

/// Module facts and call sites of one unit, from a single parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedUnit {
    pub facts: ModuleFacts,
    pub call_sites: Vec<CallSite>,
}

/// A call expression reduced to the bare callee name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub callee: String,
    pub line: u32,
    /// `receiver.callee(...)` rather than `callee(...)`
    pub is_method_call: bool,
}

// =============================================================================
// PUBLIC API
// =============================================================================

/// Extract module facts from one unit.
///
/// Fails with [`ParseError`] when the text is not valid Python.
pub fn extract_unit(unit: &SourceUnit) -> Result<ModuleFacts, ParseError> {
    let facts = treesitter::extract_module(&unit.module, &unit.path, &unit.text)?;

    debug!(
        module = %facts.module,
        classes = facts.classes.len(),
        functions = facts.functions.len(),
        imports = facts.imports.len(),
        "Extracted"
    );

    Ok(facts)
}

/// Extract module facts together with every call site in the unit.
pub fn extract_unit_with_calls(unit: &SourceUnit) -> Result<ExtractedUnit, ParseError> {
    let (facts, call_sites) =
        treesitter::extract_module_with_calls(&unit.module, &unit.path, &unit.text)?;

    debug!(
        module = %facts.module,
        declarations = facts.declaration_count(),
        call_sites = call_sites.len(),
        "Extracted with call sites"
    );

    Ok(ExtractedUnit { facts, call_sites })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(code: &str) -> ModuleFacts {
        extract_unit(&SourceUnit::new("pkg.m", "pkg/m.py", code)).unwrap()
    }

    #[test]
    fn test_declarations_are_in_source_order() {
        let f = facts(
            "def first():\n    pass\n\nclass Box:\n    def open(self):\n        pass\n\n    def close(self):\n        pass\n\ndef last():\n    pass\n",
        );

        let names: Vec<_> = f.declarations().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["first", "Box", "Box.open", "Box.close", "last"]);
    }

    #[test]
    fn test_method_spans_nest_in_class() {
        let f = facts(
            "class Box:\n    def open(self):\n        return 1\n\n    @property\n    def size(self):\n        return 2\n",
        );

        let decls = f.declarations();
        let class = decls.iter().find(|d| d.kind == DeclarationKind::Class).unwrap();
        for method in decls.iter().filter(|d| d.kind == DeclarationKind::Method) {
            assert!(method.name.starts_with("Box."));
            assert!(method.start_line >= class.start_line);
            assert!(method.end_line <= class.end_line);
            assert!(method.end_line >= method.start_line);
        }
    }

    #[test]
    fn test_class_has_no_signature() {
        let f = facts("class A:\n    pass\n\ndef f(x):\n    pass\n");
        let decls = f.declarations();
        assert_eq!(decls[0].signature, None);
        assert_eq!(decls[1].signature.as_deref(), Some("(x)"));
        assert_eq!(decls[1].unit, "pkg.m");
    }

    #[test]
    fn test_parse_error_carries_path() {
        let err = extract_unit(&SourceUnit::new("bad", "bad.py", "def broken(:\n    pass\n"))
            .unwrap_err();
        assert_eq!(err.path, "bad.py");
        assert!(err.to_string().contains("bad.py"));
    }

    #[test]
    fn test_call_sites_reduce_to_bare_names() {
        let unit = SourceUnit::new("m", "m.py", "def a():\n    helper()\n    obj.method(1)\n");
        let extracted = extract_unit_with_calls(&unit).unwrap();
        assert_eq!(extracted.facts.functions[0].name, "a");

        let sites = &extracted.call_sites;
        let names: Vec<_> = sites.iter().map(|s| s.callee.as_str()).collect();
        assert_eq!(names, vec!["helper", "method"]);
        assert!(!sites[0].is_method_call);
        assert!(sites[1].is_method_call);
        assert_eq!(sites[1].line, 3);
    }
}
