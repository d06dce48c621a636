use crate::define_parser;
use crate::model::{
    ClassDefinition, Fidelity, FunctionBody, FunctionDefinition, Import, Instantiation,
    NumericLiteral, ParseResult, TypeDispatchChain,
};
use crate::parser::common::parse_number;
use crate::parser::{ParseError, SourceParser};
use std::path::Path;
use tree_sitter::Node;

define_parser!(PYTHON_PARSER, tree_sitter_python::LANGUAGE);

const SINGLETON_SLOTS: &[&str] = &["_instance", "__instance", "_instances", "__instances"];
const COLLECTION_FACTORIES: &[&str] = &[
    "list",
    "dict",
    "set",
    "defaultdict",
    "OrderedDict",
    "deque",
    "collections.defaultdict",
    "collections.OrderedDict",
    "collections.deque",
];

/// Structural parser for Python built on tree-sitter.
///
/// Syntax errors do not abort parsing: tree-sitter recovers with error
/// nodes and whatever structure survives is reported.
pub struct PythonParser;

impl PythonParser {
    pub fn new() -> Self {
        Self
    }
}

impl SourceParser for PythonParser {
    fn name(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &[&str] {
        &["py", "pyi"]
    }

    fn fidelity(&self) -> Fidelity {
        Fidelity::Structural
    }

    fn parse(&self, path: &Path, source: &str) -> Result<ParseResult, ParseError> {
        let mut result = ParseResult::new(path.to_path_buf(), Fidelity::Structural);
        result.lines = source.lines().count();

        let tree = PYTHON_PARSER
            .with(|parser| parser.borrow_mut().parse(source, None))
            .ok_or_else(|| ParseError::Parse("Failed to parse file".to_string()))?;

        let root = tree.root_node();
        let src = source.as_bytes();

        collect_definitions(&root, src, &mut result);
        walk_file(&root, src, &mut result);

        Ok(result)
    }
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Top-level classes and functions. Error-recovery nodes are searched too,
/// so definitions after a syntax error are still found.
fn collect_definitions(parent: &Node, src: &[u8], result: &mut ParseResult) {
    let mut cursor = parent.walk();
    for node in parent.named_children(&mut cursor) {
        match node.kind() {
            "function_definition" => {
                result.functions.push(function_definition(&node, Vec::new(), src))
            }
            "class_definition" => result.classes.push(class_definition(&node, Vec::new(), src)),
            "decorated_definition" => {
                let decorators = decorators_of(&node, src);
                if let Some(def) = node.child_by_field_name("definition") {
                    match def.kind() {
                        "function_definition" => {
                            result.functions.push(function_definition(&def, decorators, src))
                        }
                        "class_definition" => {
                            result.classes.push(class_definition(&def, decorators, src))
                        }
                        _ => {}
                    }
                }
            }
            "ERROR" => collect_definitions(&node, src, result),
            _ => {}
        }
    }
}

fn text<'a>(node: &Node, src: &'a [u8]) -> &'a str {
    node.utf8_text(src).unwrap_or("")
}

fn line(node: &Node) -> usize {
    node.start_position().row + 1
}

fn end_line(node: &Node) -> usize {
    node.end_position().row + 1
}

/// Collect imports, identifiers and numeric literals from the whole tree,
/// including imports nested in functions and `try` blocks.
fn walk_file(node: &Node, src: &[u8], result: &mut ParseResult) {
    match node.kind() {
        "import_statement" => {
            extract_import(node, src, &mut result.imports);
            return;
        }
        "import_from_statement" => {
            extract_from_import(node, src, &mut result.imports);
            return;
        }
        "identifier" => {
            result.referenced_names.insert(text(node, src).to_string());
        }
        "integer" | "float" => {
            if !is_constant_definition(node, src) {
                if let Some(literal) = numeric_literal(node, src) {
                    result.numeric_literals.push(literal);
                }
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        walk_file(&child, src, result);
    }
}

fn extract_import(node: &Node, src: &[u8], imports: &mut Vec<Import>) {
    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        let (module, alias) = match name.kind() {
            "aliased_import" => (
                name.child_by_field_name("name").map(|n| text(&n, src)),
                name.child_by_field_name("alias").map(|n| text(&n, src).to_string()),
            ),
            _ => (Some(text(&name, src)), None),
        };

        if let Some(module) = module.filter(|m| !m.is_empty()) {
            imports.push(Import {
                module: module.to_string(),
                symbol: None,
                alias,
                is_relative: false,
                line: line(node),
            });
        }
    }
}

fn extract_from_import(node: &Node, src: &[u8], imports: &mut Vec<Import>) {
    let Some(module_node) = node.child_by_field_name("module_name") else {
        return;
    };
    let module = text(&module_node, src).to_string();
    let is_relative = module_node.kind() == "relative_import";

    let mut symbols: Vec<(String, Option<String>)> = Vec::new();
    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        match name.kind() {
            "aliased_import" => {
                if let Some(symbol) = name.child_by_field_name("name") {
                    let alias = name.child_by_field_name("alias").map(|n| text(&n, src).to_string());
                    symbols.push((text(&symbol, src).to_string(), alias));
                }
            }
            _ => symbols.push((text(&name, src).to_string(), None)),
        }
    }

    let mut cursor = node.walk();
    if node
        .named_children(&mut cursor)
        .any(|child| child.kind() == "wildcard_import")
    {
        symbols.push(("*".to_string(), None));
    }

    if symbols.is_empty() {
        imports.push(Import {
            module,
            symbol: None,
            alias: None,
            is_relative,
            line: line(node),
        });
        return;
    }

    for (symbol, alias) in symbols {
        imports.push(Import {
            module: module.clone(),
            symbol: Some(symbol),
            alias,
            is_relative,
            line: line(node),
        });
    }
}

fn decorators_of(node: &Node, src: &[u8]) -> Vec<String> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() == "decorator")
        .filter_map(|decorator| decorator_name(&decorator, src))
        .collect()
}

/// `@name`, `@pkg.name` and `@name(args)` all resolve to the dotted name.
fn decorator_name(decorator: &Node, src: &[u8]) -> Option<String> {
    let expr = decorator.named_child(0)?;
    let target = match expr.kind() {
        "call" => expr.child_by_field_name("function")?,
        _ => expr,
    };
    Some(text(&target, src).to_string())
}

fn class_definition(node: &Node, decorators: Vec<String>, src: &[u8]) -> ClassDefinition {
    let name = node
        .child_by_field_name("name")
        .map(|n| text(&n, src).to_string())
        .unwrap_or_default();
    let mut class = ClassDefinition::new(name, line(node));
    class.end_line = Some(end_line(node));

    if let Some(superclasses) = node.child_by_field_name("superclasses") {
        let mut cursor = superclasses.walk();
        for arg in superclasses.named_children(&mut cursor) {
            match arg.kind() {
                "keyword_argument" => {
                    let is_metaclass = arg
                        .child_by_field_name("name")
                        .is_some_and(|n| text(&n, src) == "metaclass");
                    let value = arg.child_by_field_name("value").map(|v| text(&v, src));
                    if is_metaclass && value.is_some_and(|v| v.ends_with("ABCMeta")) {
                        class.is_abstract = true;
                    }
                }
                "comment" => {}
                _ => class.bases.push(text(&arg, src).to_string()),
            }
        }
    }

    if class
        .bases
        .iter()
        .any(|b| b == "ABC" || b == "abc.ABC")
    {
        class.is_abstract = true;
    }

    let Some(body) = node.child_by_field_name("body") else {
        return class;
    };
    class.docstring = docstring_of(&body, src);

    let mut cursor = body.walk();
    for stmt in body.named_children(&mut cursor) {
        match stmt.kind() {
            "function_definition" => class.methods.push(function_definition(&stmt, Vec::new(), src)),
            "decorated_definition" => {
                let method_decorators = decorators_of(&stmt, src);
                if let Some(def) = stmt.child_by_field_name("definition") {
                    if def.kind() == "function_definition" {
                        class.methods.push(function_definition(&def, method_decorators, src));
                    }
                }
            }
            "expression_statement" => {
                if let Some(assignment) = stmt.named_child(0).filter(|n| n.kind() == "assignment") {
                    record_class_attribute(&assignment, src, &mut class);
                }
            }
            _ => {}
        }
    }

    if let Some(init) = body_of_method(&body, "__init__", src) {
        collect_self_fields(&init, src, &mut class);
    }

    if class.methods.iter().any(|m| m.is_abstract()) {
        class.is_abstract = true;
    }

    class.is_singleton_shaped = class.fields.iter().any(|f| SINGLETON_SLOTS.contains(&f.as_str()))
        || class
            .methods
            .iter()
            .any(|m| m.name == "__new__" || m.name == "get_instance" || m.name == "instance");

    // Decorated singletons (`@singleton`) are the same shape.
    if decorators.iter().any(|d| d.ends_with("singleton")) {
        class.is_singleton_shaped = true;
    }

    class
}

fn record_class_attribute(assignment: &Node, src: &[u8], class: &mut ClassDefinition) {
    let Some(left) = assignment.child_by_field_name("left") else {
        return;
    };
    if left.kind() != "identifier" {
        return;
    }
    let name = text(&left, src).to_string();
    if assignment
        .child_by_field_name("right")
        .is_some_and(|right| is_mutable_collection(&right, src))
    {
        class.mutable_fields.push(name.clone());
    }
    if !class.fields.contains(&name) {
        class.fields.push(name);
    }
}

fn body_of_method<'t>(class_body: &Node<'t>, method: &str, src: &[u8]) -> Option<Node<'t>> {
    let mut cursor = class_body.walk();
    class_body
        .named_children(&mut cursor)
        .map(|stmt| match stmt.kind() {
            "decorated_definition" => stmt.child_by_field_name("definition").unwrap_or(stmt),
            _ => stmt,
        })
        .find(|def| {
            def.kind() == "function_definition"
                && def
                    .child_by_field_name("name")
                    .is_some_and(|n| text(&n, src) == method)
        })
        .and_then(|def| def.child_by_field_name("body"))
}

/// Record `self.x = ...` assignments in a constructor body as fields.
fn collect_self_fields(node: &Node, src: &[u8], class: &mut ClassDefinition) {
    if node.kind() == "assignment" {
        if let Some(left) = node.child_by_field_name("left") {
            if let Some(field) = self_attribute(&left, src) {
                let field = field.to_string();
                if node
                    .child_by_field_name("right")
                    .is_some_and(|right| is_mutable_collection(&right, src))
                    && !class.mutable_fields.contains(&field)
                {
                    class.mutable_fields.push(field.clone());
                }
                if !class.fields.contains(&field) {
                    class.fields.push(field);
                }
            }
        }
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if !matches!(child.kind(), "function_definition" | "class_definition") {
            collect_self_fields(&child, src, class);
        }
    }
}

fn self_attribute<'a>(node: &Node, src: &'a [u8]) -> Option<&'a str> {
    if node.kind() != "attribute" {
        return None;
    }
    let object = node.child_by_field_name("object")?;
    if object.kind() != "identifier" || text(&object, src) != "self" {
        return None;
    }
    node.child_by_field_name("attribute").map(|a| text(&a, src))
}

fn is_mutable_collection(node: &Node, src: &[u8]) -> bool {
    match node.kind() {
        "list" | "dictionary" | "set" | "list_comprehension" | "dictionary_comprehension"
        | "set_comprehension" => true,
        "call" => node
            .child_by_field_name("function")
            .is_some_and(|f| COLLECTION_FACTORIES.contains(&text(&f, src))),
        _ => false,
    }
}

fn function_definition(node: &Node, decorators: Vec<String>, src: &[u8]) -> FunctionDefinition {
    let name = node
        .child_by_field_name("name")
        .map(|n| text(&n, src).to_string())
        .unwrap_or_default();
    let mut function = FunctionDefinition::new(name, line(node));
    function.end_line = Some(end_line(node));
    function.is_async = node.child(0).is_some_and(|c| c.kind() == "async");
    function.is_static = decorators.iter().any(|d| d == "staticmethod");
    function.decorators = decorators;
    function.return_type = node
        .child_by_field_name("return_type")
        .map(|n| text(&n, src).to_string());

    if let Some(params) = node.child_by_field_name("parameters") {
        let mut cursor = params.walk();
        function.parameters = params
            .named_children(&mut cursor)
            .filter_map(|p| parameter_name(&p, src))
            .collect();
    }

    if let Some(body) = node.child_by_field_name("body") {
        function.docstring = docstring_of(&body, src);
        function.body = Some(body_facts(&body, src));
    }

    function
}

fn parameter_name(node: &Node, src: &[u8]) -> Option<String> {
    let name = match node.kind() {
        "identifier" | "list_splat_pattern" | "dictionary_splat_pattern" => text(node, src),
        "default_parameter" | "typed_default_parameter" => {
            text(&node.child_by_field_name("name")?, src)
        }
        "typed_parameter" => text(&node.named_child(0)?, src),
        _ => return None,
    };
    Some(name.trim_start_matches('*').to_string())
}

fn docstring_of(body: &Node, src: &[u8]) -> Option<String> {
    let first = first_statement(body)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let string = first.named_child(0).filter(|n| n.kind() == "string")?;
    Some(clean_string_literal(text(&string, src)))
}

fn first_statement<'t>(body: &Node<'t>) -> Option<Node<'t>> {
    let mut cursor = body.walk();
    body.named_children(&mut cursor).find(|n| n.kind() != "comment")
}

fn clean_string_literal(raw: &str) -> String {
    let unprefixed = raw.trim_start_matches(['r', 'R', 'u', 'U', 'b', 'B', 'f', 'F']);
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(inner) = unprefixed
            .strip_prefix(quote)
            .and_then(|s| s.strip_suffix(quote))
        {
            return inner.trim().to_string();
        }
    }
    unprefixed.trim().to_string()
}

fn body_facts(body: &Node, src: &[u8]) -> FunctionBody {
    let mut facts = FunctionBody {
        complexity: 1,
        ..Default::default()
    };

    let mut cursor = body.walk();
    let statements: Vec<Node> = body
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect();

    let is_docstring = |n: &Node| {
        n.kind() == "expression_statement"
            && n.named_child(0).is_some_and(|c| c.kind() == "string")
    };
    let executable: Vec<&Node> = statements
        .iter()
        .enumerate()
        .filter(|(i, n)| !(*i == 0 && is_docstring(n)))
        .map(|(_, n)| n)
        .collect();

    facts.is_stub = executable.iter().all(|n| {
        n.kind() == "pass_statement"
            || (n.kind() == "expression_statement"
                && n.named_child(0).is_some_and(|c| c.kind() == "ellipsis"))
    });

    facts.raises_not_implemented = executable.iter().any(|n| {
        n.kind() == "raise_statement" && text(n, src).contains("NotImplemented")
    });

    for statement in &statements {
        walk_body(statement, src, &mut facts);
    }

    facts
}

fn walk_body(node: &Node, src: &[u8], facts: &mut FunctionBody) {
    match node.kind() {
        // Nested scopes carry their own metrics.
        "function_definition" | "class_definition" | "decorated_definition" => return,
        "if_statement" => {
            facts.complexity += 1;
            if let Some(chain) = type_dispatch_chain(node, src) {
                facts.type_dispatch_chains.push(chain);
            }
        }
        "elif_clause" | "for_statement" | "while_statement" | "except_clause"
        | "conditional_expression" | "for_in_clause" | "if_clause" | "case_clause"
        | "boolean_operator" => facts.complexity += 1,
        "attribute" => {
            if let Some(attr) = self_attribute(node, src) {
                facts.attribute_refs.insert(attr.to_string());
            }
        }
        "call" => {
            if let Some(instantiation) = instantiation(node, src) {
                facts.instantiations.push(instantiation);
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        walk_body(&child, src, facts);
    }
}

fn instantiation(call: &Node, src: &[u8]) -> Option<Instantiation> {
    let function = call.child_by_field_name("function")?;
    let type_name = match function.kind() {
        "identifier" => text(&function, src),
        "attribute" => {
            let attr = function.child_by_field_name("attribute")?;
            if !looks_like_type(text(&attr, src)) {
                return None;
            }
            text(&function, src)
        }
        _ => return None,
    };

    let short_name = type_name.rsplit('.').next().unwrap_or(type_name);
    if !looks_like_type(short_name) {
        return None;
    }

    let arg_count = call
        .child_by_field_name("arguments")
        .map(|args| {
            let mut cursor = args.walk();
            args.named_children(&mut cursor)
                .filter(|a| a.kind() != "comment")
                .count()
        })
        .unwrap_or(0);

    Some(Instantiation {
        type_name: type_name.to_string(),
        arg_count,
        line: line(call),
    })
}

/// CamelCase names, excluding ALL_CAPS constants.
fn looks_like_type(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && name.chars().any(|c| c.is_ascii_lowercase())
}

fn is_type_check(condition: &str) -> bool {
    condition.contains("isinstance(")
        || condition.contains("issubclass(")
        || condition.contains("__class__")
        || condition.contains(".type ==")
        || condition.contains(".kind ==")
        || (condition.contains("type(") && (condition.contains("==") || condition.contains(" is ")))
}

fn type_dispatch_chain(if_node: &Node, src: &[u8]) -> Option<TypeDispatchChain> {
    let condition = if_node.child_by_field_name("condition")?;
    if !is_type_check(text(&condition, src)) {
        return None;
    }

    let mut branches = 1;
    let mut cursor = if_node.walk();
    for alternative in if_node.children_by_field_name("alternative", &mut cursor) {
        if alternative.kind() != "elif_clause" {
            continue;
        }
        let is_check = alternative
            .child_by_field_name("condition")
            .is_some_and(|c| is_type_check(text(&c, src)));
        if is_check {
            branches += 1;
        }
    }

    (branches > 1).then(|| TypeDispatchChain {
        line: line(if_node),
        branches,
    })
}

fn numeric_literal(node: &Node, src: &[u8]) -> Option<NumericLiteral> {
    let raw = text(node, src);
    let mut value = parse_number(raw)?;
    let mut literal_text = raw.to_string();

    if let Some(parent) = node.parent() {
        if parent.kind() == "unary_operator" && text(&parent, src).starts_with('-') {
            value = -value;
            literal_text = format!("-{}", raw);
        }
    }

    Some(NumericLiteral {
        text: literal_text,
        value,
        line: line(node),
    })
}

/// Literals on the right of `UPPER_CASE = ...` are named constants.
fn is_constant_definition(node: &Node, src: &[u8]) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        match parent.kind() {
            "assignment" => {
                return parent.child_by_field_name("left").is_some_and(|left| {
                    let name = text(&left, src);
                    left.kind() == "identifier"
                        && name.chars().any(|c| c.is_ascii_uppercase())
                        && !name.chars().any(|c| c.is_ascii_lowercase())
                });
            }
            "expression_statement" | "block" | "module" | "function_definition"
            | "class_definition" => return false,
            _ => current = parent.parent(),
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn parse(source: &str) -> ParseResult {
        PythonParser::new()
            .parse(Path::new("pkg/mod.py"), source)
            .unwrap()
    }

    #[test]
    fn test_imports() {
        let result = parse(indoc! {"
            import os
            import numpy as np, sys
            from typing import List, Dict as D
            from . import sibling
            from ..core.models import User
            from pkg.util import *
        "});

        let imports: Vec<_> = result
            .imports
            .iter()
            .map(|i| (i.module.as_str(), i.symbol.as_deref(), i.alias.as_deref(), i.is_relative))
            .collect();

        assert_eq!(
            imports,
            vec![
                ("os", None, None, false),
                ("numpy", None, Some("np"), false),
                ("sys", None, None, false),
                ("typing", Some("List"), None, false),
                ("typing", Some("Dict"), Some("D"), false),
                (".", Some("sibling"), None, true),
                ("..core.models", Some("User"), None, true),
                ("pkg.util", Some("*"), None, false),
            ]
        );
        assert_eq!(result.imports[4].line, 3);
    }

    #[test]
    fn test_nested_imports_are_collected() {
        let result = parse(indoc! {"
            try:
                import ujson as json
            except ImportError:
                import json

            def lazy():
                from pkg import heavy
                return heavy
        "});
        let modules: Vec<_> = result.imports.iter().map(|i| i.module.as_str()).collect();
        assert_eq!(modules, vec!["ujson", "json", "pkg"]);
    }

    #[test]
    fn test_class_and_methods() {
        let result = parse(indoc! {r#"
            class Service(Base, metaclass=ABCMeta):
                """Handles things."""
                registry = {}

                def __init__(self, repo):
                    self.repo = repo
                    self.cache = []

                @staticmethod
                def helper(x: int, *args, flag=False, **kwargs) -> int:
                    return x

                @abc.abstractmethod
                async def run(self):
                    ...
        "#});

        assert_eq!(result.classes.len(), 1);
        let class = &result.classes[0];
        assert_eq!(class.name, "Service");
        assert_eq!(class.bases, vec!["Base"]);
        assert!(class.is_abstract);
        assert_eq!(class.docstring.as_deref(), Some("Handles things."));
        assert_eq!(class.start_line, 1);
        assert_eq!(class.end_line, Some(15));
        assert_eq!(class.fields, vec!["registry", "repo", "cache"]);
        assert_eq!(class.mutable_fields, vec!["registry", "cache"]);

        let names: Vec<_> = class.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["__init__", "helper", "run"]);

        let helper = &class.methods[1];
        assert!(helper.is_static);
        assert_eq!(helper.parameters, vec!["x", "args", "flag", "kwargs"]);
        assert_eq!(helper.return_type.as_deref(), Some("int"));

        let run = &class.methods[2];
        assert!(run.is_async);
        assert_eq!(run.decorators, vec!["abc.abstractmethod"]);
        assert!(run.body.as_ref().unwrap().is_stub);
    }

    #[test]
    fn test_decorator_forms() {
        let result = parse(indoc! {"
            @app.route('/x', methods=['GET'])
            @cached
            def handler():
                pass
        "});
        assert_eq!(result.functions[0].decorators, vec!["app.route", "cached"]);
        assert_eq!(result.functions[0].start_line, 3);
        assert_eq!(result.functions[0].end_line, Some(4));
    }

    #[test]
    fn test_complexity() {
        let result = parse(indoc! {"
            def decide(a, b, c):
                if a and b and c:
                    return 1
                elif b or c:
                    return 2
                for x in range(3):
                    while x:
                        x -= 1
                try:
                    pass
                except ValueError:
                    pass
                return 3 if a else 4
        "});
        // 1 + if + 2 `and` + elif + `or` + for + while + except + ternary
        assert_eq!(result.functions[0].body.as_ref().unwrap().complexity, 10);
    }

    #[test]
    fn test_body_facts() {
        let result = parse(indoc! {"
            class Shape:
                def area(self):
                    raise NotImplementedError()

                def describe(self, other):
                    if isinstance(other, Circle):
                        return self.radius
                    elif isinstance(other, Square):
                        return self.side
                    elif type(other) == Triangle:
                        return Path(self.base, self.height, other)
                    return None
        "});

        let class = &result.classes[0];
        let area = class.method("area").unwrap().body.as_ref().unwrap();
        assert!(area.raises_not_implemented);
        assert!(!area.is_stub);

        let describe = class.method("describe").unwrap().body.as_ref().unwrap();
        assert_eq!(
            describe.type_dispatch_chains,
            vec![TypeDispatchChain { line: 6, branches: 3 }]
        );
        let attrs: Vec<_> = describe.attribute_refs.iter().map(String::as_str).collect();
        assert_eq!(attrs, vec!["base", "height", "radius", "side"]);
        assert_eq!(
            describe.instantiations,
            vec![Instantiation {
                type_name: "Path".to_string(),
                arg_count: 3,
                line: 11
            }]
        );
    }

    #[test]
    fn test_numeric_literals_skip_constants() {
        let result = parse(indoc! {"
            MAX_RETRIES = 5
            def f(x):
                return x * 42 + 3.5 - 0x10 + (-7)
        "});
        let values: Vec<f64> = result.numeric_literals.iter().map(|n| n.value).collect();
        assert_eq!(values, vec![42.0, 3.5, 16.0, -7.0]);
        assert!(result.numeric_literals.iter().all(|n| n.line == 3));
    }

    #[test]
    fn test_referenced_names_exclude_imports() {
        let result = parse(indoc! {"
            import os
            import json
            print(os.path.join('a', 'b'))
        "});
        assert!(result.referenced_names.contains("os"));
        assert!(!result.referenced_names.contains("json"));
    }

    #[test]
    fn test_singleton_shape() {
        let result = parse(indoc! {"
            class Config:
                _instance = None
                settings = {}

                def __new__(cls):
                    if cls._instance is None:
                        cls._instance = super().__new__(cls)
                    return cls._instance
        "});
        let class = &result.classes[0];
        assert!(class.is_singleton_shaped);
        assert_eq!(class.mutable_fields, vec!["settings"]);
    }

    #[test]
    fn test_syntax_errors_are_tolerated() {
        let result = parse(indoc! {"
            import os
            def broken(:
                pass
            class Fine:
                pass
        "});
        assert_eq!(result.imports.len(), 1);
        assert_eq!(result.imports[0].module, "os");
        assert_eq!(result.lines, 5);
    }
}
