//! Tree-sitter Based Extraction
//!
//! AST-based extraction of Python declarations, imports and call sites.
//! Uses a walk over the module's direct children (and class bodies) for
//! declarations, and a tree-sitter query for call expressions.
//!
//! @module extract/treesitter

use std::collections::BTreeSet;

use once_cell::sync::OnceCell;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor, QueryError, Tree};

use super::{CallSite, ClassInfo, FunctionInfo, ModuleFacts, ParseError};

// =============================================================================
// PARSER
// =============================================================================

fn python_language() -> Language {
    tree_sitter_python::LANGUAGE.into()
}

/// Parse Python text, rejecting trees that contain syntax errors.
///
/// Besides `ERROR`/`MISSING` nodes this rejects what the grammar accepts
/// but Python 3 does not: Python 2 statements and operators, and
/// statements whose indentation disagrees with their block.
pub fn parse_source(path: &str, text: &str) -> Result<Tree, ParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(&python_language())
        .map_err(|e| ParseError {
            path: path.to_string(),
            line: None,
            message: e.to_string(),
        })?;

    let tree = parser.parse(text, None).ok_or_else(|| ParseError {
        path: path.to_string(),
        line: None,
        message: "Parser returned None".to_string(),
    })?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(ParseError {
            path: path.to_string(),
            line: first_error_line(root),
            message: "invalid syntax".to_string(),
        });
    }

    if let Some((line, message)) = find_invalid_syntax(root) {
        return Err(ParseError {
            path: path.to_string(),
            line: Some(line),
            message: message.to_string(),
        });
    }

    Ok(tree)
}

/// 1-based line of the first ERROR or MISSING node
fn first_error_line(node: Node) -> Option<u32> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row as u32 + 1);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() {
            if let Some(line) = first_error_line(child) {
                return Some(line);
            }
        }
    }
    None
}

// =============================================================================
// PYTHON 3 VALIDATION
// =============================================================================

/// First construct, in source order, that Python 3 rejects
fn find_invalid_syntax(root: Node) -> Option<(u32, &'static str)> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if let Some(message) = python2_construct(node) {
            return Some((start_line(node), message));
        }
        if let Some(found) = misindented_statement(node) {
            return Some(found);
        }

        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}

fn python2_construct(node: Node) -> Option<&'static str> {
    match node.kind() {
        "print_statement" => Some("Missing parentheses in call to 'print'"),
        "exec_statement" => Some("Missing parentheses in call to 'exec'"),
        "<>" if !node.is_named() => Some("invalid comparison operator '<>'"),
        "except_clause" if has_comma_alias(node) => {
            Some("multiple exception types must be parenthesized")
        }
        _ => None,
    }
}

/// `except X, e:`
fn has_comma_alias(clause: Node) -> bool {
    let mut cursor = clause.walk();
    let found = clause
        .children(&mut cursor)
        .any(|child| child.kind() == "," || child.kind() == "expression_list");
    found
}

/// Checks the statements of a `module` or `block`.
///
/// Statements starting a line share one column: 0 at module level, deeper
/// than the enclosing statement inside a block. A block opened on its
/// header line (`def f(): pass`) takes no further lines. Statements after
/// `;` on the same line are skipped.
fn misindented_statement(container: Node) -> Option<(u32, &'static str)> {
    let (mut column, header_row, outer_column) = match container.kind() {
        "module" => (Some(0), None, None),
        "block" => (
            None,
            container.prev_sibling().map(|n| n.end_position().row),
            container.parent().map(|n| n.start_position().column),
        ),
        _ => return None,
    };

    let mut cursor = container.walk();
    let mut prev_end_row: Option<usize> = None;
    let mut on_header = false;
    for child in container.named_children(&mut cursor) {
        if child.is_extra() {
            continue;
        }
        let start = child.start_position();
        let same_line = prev_end_row == Some(start.row);
        prev_end_row = Some(child.end_position().row);
        if same_line {
            continue;
        }

        let line = start.row as u32 + 1;
        if header_row == Some(start.row) {
            on_header = true;
            continue;
        }
        if on_header {
            return Some((line, "unexpected indent"));
        }

        match column {
            None => {
                if outer_column.is_some_and(|outer| start.column <= outer) {
                    return Some((line, "expected an indented block"));
                }
                column = Some(start.column);
            }
            Some(expected) if start.column > expected => {
                return Some((line, "unexpected indent"));
            }
            Some(expected) if start.column < expected => {
                return Some((line, "unindent does not match any outer indentation level"));
            }
            Some(_) => {}
        }
    }
    None
}

// =============================================================================
// QUERIES
// =============================================================================

/// Direct calls and calls through an attribute access
const CALL_QUERY: &str = "(call function: (identifier) @callee) @call
(call function: (attribute attribute: (identifier) @callee)) @method_call";

static CALL_QUERY_CELL: OnceCell<Query> = OnceCell::new();

/// The call query, compiled on first use
fn call_query() -> Result<&'static Query, QueryError> {
    CALL_QUERY_CELL.get_or_try_init(|| Query::new(&python_language(), CALL_QUERY))
}

// =============================================================================
// MODULE EXTRACTION
// =============================================================================

/// Extract declarations and imports from a module's top level.
pub fn extract_module(module: &str, path: &str, text: &str) -> Result<ModuleFacts, ParseError> {
    let tree = parse_source(path, text)?;
    Ok(module_facts(&tree, module, path, text.as_bytes()))
}

/// Module facts and call sites from a single parse
pub fn extract_module_with_calls(
    module: &str,
    path: &str,
    text: &str,
) -> Result<(ModuleFacts, Vec<CallSite>), ParseError> {
    let tree = parse_source(path, text)?;
    let facts = module_facts(&tree, module, path, text.as_bytes());
    let sites = call_sites(&tree, path, text.as_bytes())?;
    Ok((facts, sites))
}

fn module_facts(tree: &Tree, module: &str, path: &str, source: &[u8]) -> ModuleFacts {
    let root = tree.root_node();

    let mut imports = BTreeSet::new();
    let mut classes = Vec::new();
    let mut functions = Vec::new();

    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        match child.kind() {
            "import_statement" | "import_from_statement" | "future_import_statement" => {
                collect_imports(child, source, &mut imports);
            }
            "class_definition" => classes.extend(class_info(child, Vec::new(), source)),
            "function_definition" => functions.extend(function_info(child, Vec::new(), source)),
            "decorated_definition" => {
                let decorators = decorator_names(child, source);
                let Some(definition) = child.child_by_field_name("definition") else {
                    continue;
                };
                match definition.kind() {
                    "class_definition" => classes.extend(class_info(definition, decorators, source)),
                    "function_definition" => {
                        functions.extend(function_info(definition, decorators, source))
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    ModuleFacts {
        module: module.to_string(),
        path: path.to_string(),
        imports: imports.into_iter().collect(),
        classes,
        functions,
    }
}

fn class_info(node: Node, decorators: Vec<String>, source: &[u8]) -> Option<ClassInfo> {
    let name = node_text(node.child_by_field_name("name")?, source);

    let bases = node
        .child_by_field_name("superclasses")
        .map(|args| {
            let mut cursor = args.walk();
            let bases: Vec<String> = args
                .named_children(&mut cursor)
                .filter(|arg| !matches!(arg.kind(), "keyword_argument" | "comment"))
                .map(|arg| node_text(arg, source))
                .collect();
            bases
        })
        .unwrap_or_default();

    let methods = node
        .child_by_field_name("body")
        .map(|body| class_methods(body, source))
        .unwrap_or_default();

    Some(ClassInfo {
        name,
        bases,
        decorators,
        methods,
        start_line: start_line(node),
        end_line: end_line(node),
    })
}

/// Methods declared directly in a class body
fn class_methods(body: Node, source: &[u8]) -> Vec<FunctionInfo> {
    let mut methods = Vec::new();
    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        match child.kind() {
            "function_definition" => methods.extend(function_info(child, Vec::new(), source)),
            "decorated_definition" => {
                if let Some(definition) = child.child_by_field_name("definition") {
                    if definition.kind() == "function_definition" {
                        let decorators = decorator_names(child, source);
                        methods.extend(function_info(definition, decorators, source));
                    }
                }
            }
            _ => {}
        }
    }
    methods
}

fn function_info(node: Node, decorators: Vec<String>, source: &[u8]) -> Option<FunctionInfo> {
    let name = node_text(node.child_by_field_name("name")?, source);
    let is_async = node.child(0).is_some_and(|first| first.kind() == "async");

    Some(FunctionInfo {
        name,
        signature: format_parameters(node.child_by_field_name("parameters"), source),
        decorators,
        is_async,
        start_line: start_line(node),
        end_line: end_line(node),
    })
}

// =============================================================================
// SIGNATURES
// =============================================================================

/// Render parameter names only: `(a, /, b, *args, c, **kw)`
fn format_parameters(parameters: Option<Node>, source: &[u8]) -> String {
    let mut parts = Vec::new();
    if let Some(parameters) = parameters {
        let mut cursor = parameters.walk();
        for param in parameters.named_children(&mut cursor) {
            if let Some(part) = parameter_name(param, source) {
                parts.push(part);
            }
        }
    }
    format!("({})", parts.join(", "))
}

fn parameter_name(node: Node, source: &[u8]) -> Option<String> {
    match node.kind() {
        "identifier" | "tuple_pattern" => Some(node_text(node, source)),
        // name: annotation, where name may itself be *args / **kwargs
        "typed_parameter" => node
            .named_child(0)
            .and_then(|inner| parameter_name(inner, source)),
        "default_parameter" | "typed_default_parameter" => node
            .child_by_field_name("name")
            .map(|name| node_text(name, source)),
        "list_splat_pattern" => Some(format!("*{}", splat_target(node, source))),
        "dictionary_splat_pattern" => Some(format!("**{}", splat_target(node, source))),
        "keyword_separator" => Some("*".to_string()),
        "positional_separator" => Some("/".to_string()),
        _ => None,
    }
}

fn splat_target(node: Node, source: &[u8]) -> String {
    node.named_child(0)
        .map(|target| node_text(target, source))
        .unwrap_or_default()
}

// =============================================================================
// DECORATORS
// =============================================================================

fn decorator_names(decorated: Node, source: &[u8]) -> Vec<String> {
    let mut cursor = decorated.walk();
    let names = decorated
        .named_children(&mut cursor)
        .filter(|child| child.kind() == "decorator")
        .filter_map(|decorator| decorator.named_child(0))
        .map(|expr| decorator_name(expr, source))
        .collect();
    names
}

/// Bare name, reconstructed dotted name, or the expression's text
fn decorator_name(expr: Node, source: &[u8]) -> String {
    match expr.kind() {
        "identifier" => node_text(expr, source),
        "attribute" => dotted_name(expr, source).unwrap_or_else(|| node_text(expr, source)),
        _ => node_text(expr, source),
    }
}

/// `a.b.c` from a chain of attribute accesses rooted at an identifier
fn dotted_name(node: Node, source: &[u8]) -> Option<String> {
    let mut parts = Vec::new();
    let mut current = node;
    while current.kind() == "attribute" {
        parts.push(node_text(current.child_by_field_name("attribute")?, source));
        current = current.child_by_field_name("object")?;
    }
    if current.kind() != "identifier" {
        return None;
    }
    parts.push(node_text(current, source));
    parts.reverse();
    Some(parts.join("."))
}

// =============================================================================
// IMPORTS
// =============================================================================

fn collect_imports(node: Node, source: &[u8], imports: &mut BTreeSet<String>) {
    let module = match node.kind() {
        "import_statement" => {
            let mut cursor = node.walk();
            for name in node.children_by_field_name("name", &mut cursor) {
                imports.insert(imported_name(name, source));
            }
            return;
        }
        "future_import_statement" => "__future__".to_string(),
        _ => node
            .child_by_field_name("module_name")
            .map(|m| module_path(m, source))
            .unwrap_or_default(),
    };

    let mut cursor = node.walk();
    let mut members: Vec<String> = node
        .children_by_field_name("name", &mut cursor)
        .map(|name| imported_name(name, source))
        .collect();

    let has_wildcard = node
        .named_children(&mut cursor)
        .any(|child| child.kind() == "wildcard_import");
    if has_wildcard {
        members.push("*".to_string());
    }

    for member in members {
        if module.is_empty() {
            imports.insert(member);
        } else {
            imports.insert(format!("{}.{}", module, member));
        }
    }
}

/// The imported name, ignoring any `as` alias
fn imported_name(node: Node, source: &[u8]) -> String {
    if node.kind() == "aliased_import" {
        if let Some(name) = node.child_by_field_name("name") {
            return node_text(name, source);
        }
    }
    node_text(node, source)
}

/// Module path of a from-import; relative dots are dropped
fn module_path(node: Node, source: &[u8]) -> String {
    if node.kind() != "relative_import" {
        return node_text(node, source);
    }
    let mut cursor = node.walk();
    let dotted = node
        .named_children(&mut cursor)
        .find(|child| child.kind() == "dotted_name")
        .map(|name| node_text(name, source))
        .unwrap_or_default();
    dotted
}

// =============================================================================
// CALL SITES
// =============================================================================

/// Every call whose callee reduces to a bare name, in match order.
pub fn call_sites(tree: &Tree, path: &str, source: &[u8]) -> Result<Vec<CallSite>, ParseError> {
    let query = call_query().map_err(|e| ParseError {
        path: path.to_string(),
        line: None,
        message: format!("Invalid call query: {}", e),
    })?;

    let mut sites = Vec::new();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), source);

    while let Some(m) = matches.next() {
        let mut callee: Option<String> = None;
        let mut line = 0u32;
        let mut is_method_call = false;

        for capture in m.captures {
            let node = capture.node;
            match query.capture_names()[capture.index as usize] {
                "callee" => callee = Some(node_text(node, source)),
                "call" => line = start_line(node),
                "method_call" => {
                    line = start_line(node);
                    is_method_call = true;
                }
                _ => {}
            }
        }

        if let Some(callee) = callee {
            sites.push(CallSite {
                callee,
                line,
                is_method_call,
            });
        }
    }

    Ok(sites)
}

// =============================================================================
// HELPERS
// =============================================================================

fn node_text(node: Node, source: &[u8]) -> String {
    node.utf8_text(source).unwrap_or("").to_string()
}

fn start_line(node: Node) -> u32 {
    node.start_position().row as u32 + 1
}

/// Inclusive 1-based end line. A node ending at column 0 ends on the
/// previous line (its trailing newline belongs to it).
fn end_line(node: Node) -> u32 {
    let end = node.end_position();
    if end.column == 0 && end.row > node.start_position().row {
        end.row as u32
    } else {
        end.row as u32 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(code: &str) -> ModuleFacts {
        extract_module("pkg.m", "pkg/m.py", code).unwrap()
    }

    #[test]
    fn test_extract_simple_module() {
        let code = "import os\nclass A(Base):\n def m(self, x, *, y=1, **kw): return x\ndef f(a, b=2, *args, **kwargs): return a+b";
        let facts = extract(code);

        assert_eq!(facts.imports, vec!["os"]);

        assert_eq!(facts.classes.len(), 1);
        let class = &facts.classes[0];
        assert_eq!(class.name, "A");
        assert_eq!(class.bases, vec!["Base"]);
        assert_eq!(class.methods.len(), 1);
        assert_eq!(class.methods[0].name, "m");
        assert_eq!(class.methods[0].signature, "(self, x, *, y, **kw)");

        assert_eq!(facts.functions.len(), 1);
        assert_eq!(facts.functions[0].name, "f");
        assert_eq!(facts.functions[0].signature, "(a, b, *args, **kwargs)");
    }

    #[test]
    fn test_imports_are_sorted_and_unique() {
        let code = r#"
import sys
import os
import os.path as osp
from sys import path as sys_path
from collections import OrderedDict, defaultdict
from . import sibling
from .pkg import thing
from __future__ import annotations
from typing import *
import sys
"#;
        let facts = extract(code);

        assert_eq!(
            facts.imports,
            vec![
                "__future__.annotations",
                "collections.OrderedDict",
                "collections.defaultdict",
                "os",
                "os.path",
                "pkg.thing",
                "sibling",
                "sys",
                "sys.path",
                "typing.*",
            ]
        );
    }

    #[test]
    fn test_nested_imports_are_ignored() {
        let facts = extract("def f():\n    import json\n    return json\n");
        assert!(facts.imports.is_empty());
    }

    #[test]
    fn test_signature_variants() {
        let code = r#"
def posonly(a, b, /, c):
    pass

def typed(x: int, *args: str, key: bool = False, **kw: dict) -> None:
    pass

def kwonly(*, flag):
    pass

def empty():
    pass
"#;
        let facts = extract(code);
        let sigs: Vec<_> = facts
            .functions
            .iter()
            .map(|f| (f.name.as_str(), f.signature.as_str()))
            .collect();

        assert_eq!(
            sigs,
            vec![
                ("posonly", "(a, b, /, c)"),
                ("typed", "(x, *args, key, **kw)"),
                ("kwonly", "(*, flag)"),
                ("empty", "()"),
            ]
        );
    }

    #[test]
    fn test_decorator_names() {
        let code = r#"
@dataclass
class User:
    @property
    def name(self):
        return self._name

    @functools.lru_cache
    def cached(self):
        pass

@app.route("/users")
def users():
    pass

@module.sub.decorator
async def handler():
    pass
"#;
        let facts = extract(code);

        assert_eq!(facts.classes[0].decorators, vec!["dataclass"]);
        assert_eq!(facts.classes[0].methods[0].decorators, vec!["property"]);
        assert_eq!(
            facts.classes[0].methods[1].decorators,
            vec!["functools.lru_cache"]
        );
        assert_eq!(facts.functions[0].decorators, vec![r#"app.route("/users")"#]);
        assert_eq!(facts.functions[1].decorators, vec!["module.sub.decorator"]);
        assert!(facts.functions[1].is_async);
        assert!(!facts.functions[0].is_async);
    }

    #[test]
    fn test_bases_skip_keyword_arguments() {
        let facts = extract("class Meta(Base, mixins.Loggable, metaclass=ABCMeta):\n    pass\n");
        assert_eq!(facts.classes[0].bases, vec!["Base", "mixins.Loggable"]);
    }

    #[test]
    fn test_nested_definitions_not_captured() {
        let code = r#"
def outer():
    def inner():
        pass
    class Local:
        pass
    return inner

class Outer:
    class Inner:
        def hidden(self):
            pass

    def visible(self):
        pass
"#;
        let facts = extract(code);

        let functions: Vec<_> = facts.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(functions, vec!["outer"]);
        assert_eq!(facts.classes.len(), 1);
        let methods: Vec<_> = facts.classes[0]
            .methods
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(methods, vec!["visible"]);
    }

    #[test]
    fn test_line_spans() {
        let code = "def a():\n    x = 1\n    return x\n\n\ndef b():\n    pass\n";
        let facts = extract(code);

        assert_eq!(facts.functions[0].start_line, 1);
        assert_eq!(facts.functions[0].end_line, 3);
        assert_eq!(facts.functions[1].start_line, 6);
        assert_eq!(facts.functions[1].end_line, 7);
    }

    #[test]
    fn test_decorated_span_starts_at_def() {
        let code = "@decorator\ndef f():\n    pass\n";
        let facts = extract(code);
        assert_eq!(facts.functions[0].start_line, 2);
    }

    #[test]
    fn test_syntax_error_reports_line() {
        let err = extract_module("m", "m.py", "x = 1\ndef f(:\n    pass\n").unwrap_err();
        assert_eq!(err.path, "m.py");
        assert!(err.line.is_some());
    }

    fn rejected_line(code: &str) -> Option<u32> {
        extract_module("m", "m.py", code).unwrap_err().line
    }

    #[test]
    fn test_python2_print_rejected() {
        assert_eq!(rejected_line("x = 1\nprint 'hi'\n"), Some(2));
    }

    #[test]
    fn test_python2_exec_rejected() {
        assert_eq!(rejected_line("exec 'x = 1'\n"), Some(1));
    }

    #[test]
    fn test_python2_not_equal_rejected() {
        assert_eq!(rejected_line("def f(a, b):\n    return a <> b\n"), Some(2));
    }

    #[test]
    fn test_python2_except_comma_rejected() {
        let code = "try:\n    pass\nexcept ValueError, e:\n    pass\n";
        assert_eq!(rejected_line(code), Some(3));
    }

    #[test]
    fn test_indented_module_rejected() {
        assert_eq!(rejected_line("  x = 1\n"), Some(1));
    }

    #[test]
    fn test_unexpected_indent_rejected() {
        assert_eq!(rejected_line("def f():\n    a = 1\n        b = 2\n"), Some(3));
    }

    #[test]
    fn test_mismatched_dedent_rejected() {
        assert_eq!(rejected_line("def f():\n        a = 1\n    b = 2\n"), Some(3));
    }

    #[test]
    fn test_python3_forms_accepted() {
        let code = r#"# leading comment
import os

def one_liner(): return os.sep
if True: a = 1; b = 2

class Box:
    # comment at any column
        # and another
    def open(self):
        try:
            print("opening", end="")
        except (ValueError, KeyError) as e:
            raise e
        return self != None

def wrapped(
        a,
    b):
    return a + b
"#;
        let facts = extract(code);
        let functions: Vec<_> = facts.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(functions, vec!["one_liner", "wrapped"]);
        assert_eq!(facts.classes[0].methods[0].name, "open");
    }

    #[test]
    fn test_call_sites_ignore_complex_callees() {
        let tree = parse_source("m.py", "factory()()\nitems[0]()\nrun()\n").unwrap();
        let sites = call_sites(&tree, "m.py", "factory()()\nitems[0]()\nrun()\n".as_bytes()).unwrap();
        let names: Vec<_> = sites.iter().map(|s| s.callee.as_str()).collect();
        assert_eq!(names, vec!["factory", "run"]);
    }
}
