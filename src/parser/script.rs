use crate::model::{
    ClassDefinition, Fidelity, FunctionBody, FunctionDefinition, Import, Instantiation,
    NumericLiteral, ParseResult, TypeDispatchChain,
};
use crate::parser::common::{
    LineIndex, MaskedSource, count_arguments, find_matching, mask_source, parse_number,
};
use crate::parser::{ParseError, SourceParser};
use regex::{Captures, Match, Regex};
use std::collections::BTreeSet;
use std::ops::Range;
use std::path::Path;
use std::sync::LazyLock;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("Invalid regex")
}

static ES_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r#"(?m)^[ \t]*import\s+(?:type\s+)?(?P<clause>[\w$*{}\s,]+?)\s*from\s*['"](?P<src>[^'"\n]+)['"]"#,
    )
});
static SIDE_EFFECT_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"(?m)^[ \t]*import\s*['"](?P<src>[^'"\n]+)['"]"#));
static EXPORT_FROM: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r#"(?m)^[ \t]*export\s+(?:type\s+)?(?:\*(?:\s+as\s+[\w$]+)?|\{[^}]*\})\s*from\s*['"](?P<src>[^'"\n]+)['"]"#,
    )
});
static REQUIRE: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r#"(?:\b(?:const|let|var)\s+(?P<bind>[\w$]+|\{[^}]*\})\s*=\s*)?\brequire\s*\(\s*['"](?P<src>[^'"\n]+)['"]\s*\)"#,
    )
});
static DYNAMIC_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"\bimport\s*\(\s*['"](?P<src>[^'"\n]+)['"]\s*\)"#));

static CLASS: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?m)^[ \t]*(?:export\s+)?(?:default\s+)?(?:declare\s+)?(?P<abstract>abstract\s+)?class\s+(?P<name>[A-Za-z_$][\w$]*)(?:\s*<[^{]*?>)?(?:\s+extends\s+(?P<base>[A-Za-z_$][\w$.]*)(?:\s*<[^{]*?>)?)?(?:\s+implements\s+(?P<implements>[^{]+?))?\s*\{",
    )
});
static METHOD: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?m)^[ \t]*(?P<mods>(?:(?:public|private|protected|static|async|readonly|abstract|override|get|set)\s+)*)(?:\*[ \t]*)?(?P<name>#?[A-Za-z_$][\w$]*)\s*(?:<[^>()]*>)?\s*\((?P<params>[^)]*)\)\s*(?::\s*(?P<ret>[^{;]+?))?\s*(?P<term>[{;])",
    )
});
static FIELD: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?m)^[ \t]*(?P<mods>(?:(?:public|private|protected|static|readonly|declare|override|abstract)\s+)*)(?P<name>#?[A-Za-z_$][\w$]*)[ \t]*[?!]?[ \t]*(?::[^=;\n]+)?(?:=[ \t]*(?P<value>[^;\n]*))?;?[ \t]*$",
    )
});
static THIS_ASSIGN: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"\bthis\.(?P<attr>#?[A-Za-z_$][\w$]*)\s*=(?P<value>[^=][^;\n]*)")
});
static FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?m)^[ \t]*(?:export\s+)?(?:default\s+)?(?P<async>async\s+)?function\s*\*?\s*(?P<name>[A-Za-z_$][\w$]*)\s*(?:<[^>(]*>)?\s*\((?P<params>[^)]*)\)\s*(?::\s*(?P<ret>[^{;]+?))?\s*\{",
    )
});
static FUNCTION_EXPRESSION: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?m)^[ \t]*(?:export\s+)?(?:const|let|var)\s+(?P<name>[A-Za-z_$][\w$]*)\s*(?::[^=\n]+)?=\s*(?P<async>async\s+)?function\b\s*\*?\s*[\w$]*\s*\((?P<params>[^)]*)\)\s*(?::\s*(?P<ret>[^{;]+?))?\s*\{",
    )
});
static ARROW_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?m)^[ \t]*(?:export\s+)?(?:const|let|var)\s+(?P<name>[A-Za-z_$][\w$]*)\s*(?::[^=\n]+)?=\s*(?P<async>async\s+)?(?:\((?P<params>[^)]*)\)|(?P<param>[A-Za-z_$][\w$]*))\s*(?::\s*(?P<ret>[^=\n{]+?))?\s*=>\s*(?P<brace>\{)?",
    )
});

static BRANCH: LazyLock<Regex> = LazyLock::new(|| compile(r"\b(?:if|for|while|case|catch)\b"));
static LOGICAL: LazyLock<Regex> = LazyLock::new(|| compile(r"&&|\|\||\?\?"));
static TERNARY: LazyLock<Regex> = LazyLock::new(|| compile(r"(?:^|[^?])\?(?:[^.?:]|$)"));
static THIS_ATTR: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\bthis\.(?P<attr>#?[A-Za-z_$][\w$]*)"));
static NEW_INSTANCE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"\bnew\s+(?P<name>[A-Za-z_$][\w$.]*)\s*(?:<[^>()]*>)?\s*\(")
});
static IF_LINE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"^(?P<indent>[ \t]*)(?:\}[ \t]*)?(?P<else>else[ \t]+)?if[ \t]*\(")
});

static CONSTANT_DEF: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?m)^[ \t]*(?:export\s+)?(?:(?:public|private|protected)\s+)?(?:const|static\s+readonly|readonly)\s+[A-Z][A-Z0-9_]*\s*(?::[^=\n]+)?=",
    )
});
static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?:^|[^\w$.])(?P<num>-?(?:0[xXoObB][0-9a-fA-F_]+|\d[\d_]*(?:\.\d+)?(?:[eE][+-]?\d+)?)n?)\b",
    )
});
static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| compile(r"[A-Za-z_$][\w$]*"));

const RESERVED: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "function", "with", "else",
];
const PARAMETER_MODIFIERS: &[&str] = &["public", "private", "protected", "readonly", "override"];
const SINGLETON_SLOTS: &[&str] = &["instance", "_instance", "#instance"];
const MUTABLE_INITIALIZERS: &[&str] = &[
    "[",
    "{",
    "new Map",
    "new Set",
    "new Array",
    "new WeakMap",
    "new WeakSet",
];

/// Pattern-based parser for JavaScript and TypeScript.
///
/// Works on a masked copy of the source where comments and string contents
/// are blanked, so offsets and line numbers stay exact. Only top-level
/// functions and classes are recognised. Expression-bodied arrow functions
/// get no end line and no body facts.
pub struct ScriptParser;

impl ScriptParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ScriptParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceParser for ScriptParser {
    fn name(&self) -> &'static str {
        "script"
    }

    fn extensions(&self) -> &[&str] {
        &["js", "jsx", "ts", "tsx", "mjs", "cjs"]
    }

    fn fidelity(&self) -> Fidelity {
        Fidelity::BestEffort
    }

    fn parse(&self, path: &Path, source: &str) -> Result<ParseResult, ParseError> {
        let mut result = ParseResult::new(path.to_path_buf(), Fidelity::BestEffort);
        result.lines = source.lines().count();

        let file = ScriptFile::new(source);
        let import_spans = file.collect_imports(&mut result.imports);
        file.collect_classes(&mut result.classes);
        file.collect_functions(&mut result.functions);
        file.collect_literals(&mut result.numeric_literals);
        file.collect_names(&import_spans, &mut result.referenced_names);

        Ok(result)
    }
}

struct ScriptFile<'a> {
    source: &'a str,
    masked: MaskedSource,
    index: LineIndex,
    /// Brace depth before each byte of the structure view.
    depths: Vec<i32>,
}

type Binding = (Option<String>, Option<String>);

impl<'a> ScriptFile<'a> {
    fn new(source: &'a str) -> Self {
        let masked = mask_source(source);
        let mut depths = Vec::with_capacity(masked.structure.len() + 1);
        let mut depth = 0i32;
        for b in masked.structure.bytes() {
            depths.push(depth);
            match b {
                b'{' => depth += 1,
                b'}' => depth -= 1,
                _ => {}
            }
        }
        depths.push(depth);

        Self {
            source,
            index: LineIndex::new(source),
            masked,
            depths,
        }
    }

    fn line(&self, offset: usize) -> usize {
        self.index.line_of(offset)
    }

    fn depth(&self, offset: usize) -> i32 {
        self.depths.get(offset).copied().unwrap_or(0)
    }

    /// False when the match begins inside a string or template literal.
    fn is_code(&self, m: &Match) -> bool {
        let offset = m.start() + (m.as_str().len() - m.as_str().trim_start().len());
        self.masked.structure.as_bytes().get(offset) == self.masked.code.as_bytes().get(offset)
    }

    fn collect_imports(&self, imports: &mut Vec<Import>) -> Vec<Range<usize>> {
        let code = &self.masked.code;
        let mut found: Vec<(usize, Import)> = Vec::new();
        let mut spans = Vec::new();

        let mut record = |m: Match, module: &str, bindings: Vec<Binding>| {
            for (symbol, alias) in bindings {
                found.push((
                    m.start(),
                    Import {
                        module: module.to_string(),
                        symbol,
                        alias,
                        is_relative: module.starts_with('.'),
                        line: self.line(m.start()),
                    },
                ));
            }
            spans.push(m.range());
        };

        for caps in ES_IMPORT.captures_iter(code) {
            let Some(whole) = caps.get(0).filter(|m| self.is_code(m)) else {
                continue;
            };
            let mut bindings = parse_import_clause(&caps["clause"]);
            if bindings.is_empty() {
                bindings.push((None, None));
            }
            record(whole, &caps["src"], bindings);
        }
        for caps in SIDE_EFFECT_IMPORT.captures_iter(code) {
            if let Some(whole) = caps.get(0).filter(|m| self.is_code(m)) {
                record(whole, &caps["src"], vec![(None, None)]);
            }
        }
        for caps in EXPORT_FROM.captures_iter(code) {
            if let Some(whole) = caps.get(0).filter(|m| self.is_code(m)) {
                record(whole, &caps["src"], vec![(Some("*".to_string()), None)]);
            }
        }
        for caps in REQUIRE.captures_iter(code) {
            let Some(whole) = caps.get(0).filter(|m| self.is_code(m)) else {
                continue;
            };
            let bindings = match caps.name("bind").map(|b| b.as_str()) {
                Some(bind) if bind.starts_with('{') => {
                    parse_named_bindings(bind.trim_matches(['{', '}']), ":")
                }
                Some(bind) => vec![(None, Some(bind.to_string()))],
                None => vec![(None, None)],
            };
            record(whole, &caps["src"], bindings);
        }
        for caps in DYNAMIC_IMPORT.captures_iter(code) {
            if let Some(whole) = caps.get(0).filter(|m| self.is_code(m)) {
                record(whole, &caps["src"], vec![(None, None)]);
            }
        }

        found.sort_by_key(|(offset, _)| *offset);
        imports.extend(found.into_iter().map(|(_, import)| import));
        spans
    }

    fn collect_classes(&self, classes: &mut Vec<ClassDefinition>) {
        let structure = &self.masked.structure;

        for caps in CLASS.captures_iter(structure) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.name("name")) else {
                continue;
            };
            if self.depth(whole.start()) != 0 {
                continue;
            }

            let mut class = ClassDefinition::new(name.as_str().to_string(), self.line(name.start()));
            class.is_abstract = caps.name("abstract").is_some();
            if let Some(base) = caps.name("base") {
                class.bases.push(base.as_str().to_string());
            }
            if let Some(implements) = caps.name("implements") {
                class.bases.extend(split_type_list(implements.as_str()));
            }
            class.docstring = self.doc_comment_before(whole.start());

            let open = whole.end() - 1;
            match find_matching(structure, open) {
                Some(close) => {
                    class.end_line = Some(self.line(close));
                    self.collect_members(&mut class, open, close);
                }
                None => tracing::debug!(class = %class.name, "class body is never closed"),
            }

            classes.push(class);
        }
    }

    fn collect_members(&self, class: &mut ClassDefinition, open: usize, close: usize) {
        let body = &self.masked.structure[open + 1..close];
        let member_depth = self.depth(open) + 1;

        for caps in FIELD.captures_iter(body) {
            if !caps
                .get(0)
                .is_some_and(|m| self.depth(open + 1 + m.start()) == member_depth)
            {
                continue;
            }
            let name = &caps["name"];
            let modifiers = caps.name("mods").map_or("", |m| m.as_str());
            if has_modifier(modifiers, "static") && SINGLETON_SLOTS.contains(&name) {
                class.is_singleton_shaped = true;
            }
            let value = caps.name("value").map_or("", |v| v.as_str());
            record_field(class, name, value);
        }

        for caps in METHOD.captures_iter(body) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.name("name")) else {
                continue;
            };
            if self.depth(open + 1 + whole.start()) != member_depth {
                continue;
            }
            if RESERVED.contains(&name.as_str()) {
                continue;
            }

            let start = open + 1 + whole.start();
            let mut method =
                FunctionDefinition::new(name.as_str().to_string(), self.line(open + 1 + name.start()));
            let modifiers = caps.name("mods").map_or("", |m| m.as_str());
            method.is_static = has_modifier(modifiers, "static");
            method.is_async = has_modifier(modifiers, "async");
            if has_modifier(modifiers, "abstract") {
                method.decorators.push("abstract".to_string());
            }
            method.parameters = split_parameters(&caps["params"]);
            method.return_type = trimmed(caps.name("ret"));
            method.docstring = self.doc_comment_before(start);

            if &caps["term"] == "{" {
                let body_open = open + whole.end();
                self.attach_body(&mut method, body_open);

                if method.is_constructor() {
                    for field in parameter_properties(&caps["params"]) {
                        record_field(class, &field, "");
                    }
                    if let Some(body_close) = find_matching(&self.masked.structure, body_open) {
                        let ctor = &self.masked.structure[body_open + 1..body_close];
                        for assign in THIS_ASSIGN.captures_iter(ctor) {
                            record_field(class, &assign["attr"], &assign["value"]);
                        }
                    }
                }
            } else {
                method.end_line = Some(method.start_line);
            }

            class.methods.push(method);
        }

        if class.method("getInstance").is_some() {
            class.is_singleton_shaped = true;
        }
    }

    fn collect_functions(&self, functions: &mut Vec<FunctionDefinition>) {
        let structure = &self.masked.structure;

        for caps in FUNCTION
            .captures_iter(structure)
            .chain(FUNCTION_EXPRESSION.captures_iter(structure))
        {
            let body_open = caps.get(0).map(|m| m.end() - 1);
            functions.extend(self.top_level_function(&caps, body_open));
        }
        for caps in ARROW_FUNCTION.captures_iter(structure) {
            let body_open = caps.name("brace").map(|b| b.start());
            functions.extend(self.top_level_function(&caps, body_open));
        }

        functions.sort_by_key(|f| f.start_line);
    }

    fn top_level_function(
        &self,
        caps: &Captures,
        body_open: Option<usize>,
    ) -> Option<FunctionDefinition> {
        let whole = caps.get(0)?;
        if self.depth(whole.start()) != 0 {
            return None;
        }
        let name = caps.name("name")?;

        let mut func = FunctionDefinition::new(name.as_str().to_string(), self.line(name.start()));
        func.is_async = caps.name("async").is_some();
        func.parameters = caps
            .name("params")
            .or_else(|| caps.name("param"))
            .map(|p| split_parameters(p.as_str()))
            .unwrap_or_default();
        func.return_type = trimmed(caps.name("ret"));
        func.docstring = self.doc_comment_before(whole.start());

        if let Some(open) = body_open {
            self.attach_body(&mut func, open);
        }
        Some(func)
    }

    fn attach_body(&self, func: &mut FunctionDefinition, open: usize) {
        match find_matching(&self.masked.structure, open) {
            Some(close) => {
                func.end_line = Some(self.line(close));
                func.body = Some(self.body_facts(open, close));
            }
            None => tracing::debug!(function = %func.name, "function body is never closed"),
        }
    }

    fn body_facts(&self, open: usize, close: usize) -> FunctionBody {
        let base = open + 1;
        let structure = &self.masked.structure[base..close];
        let code = &self.masked.code[base..close];

        let mut body = FunctionBody {
            complexity: 1 + decision_points(structure),
            attribute_refs: THIS_ATTR
                .captures_iter(structure)
                .map(|c| c["attr"].to_string())
                .collect(),
            is_stub: structure.trim().is_empty(),
            ..Default::default()
        };

        let first = code.trim_start().split(';').next().unwrap_or("").to_lowercase();
        body.raises_not_implemented = first.starts_with("throw")
            && (first.contains("not implemented") || first.contains("notimplemented"));

        for caps in NEW_INSTANCE.captures_iter(structure) {
            let Some(whole) = caps.get(0) else { continue };
            let type_name = &caps["name"];
            if !looks_like_type(type_name) {
                continue;
            }
            let paren = base + whole.end() - 1;
            let arg_count = find_matching(&self.masked.structure, paren)
                .map_or(0, |end| count_arguments(&self.masked.structure, paren, end));
            body.instantiations.push(Instantiation {
                type_name: type_name.to_string(),
                arg_count,
                line: self.line(base + whole.start()),
            });
        }

        body.type_dispatch_chains = self.dispatch_chains(base, structure);
        body
    }

    /// `if` / `else if` chains at one indentation level whose conditions
    /// inspect `instanceof`, `typeof` or a discriminant field.
    fn dispatch_chains(&self, base: usize, structure: &str) -> Vec<TypeDispatchChain> {
        let mut chains = Vec::new();
        let mut current: Option<(usize, TypeDispatchChain)> = None;
        let mut offset = base;

        for line in structure.split_inclusive('\n') {
            if let Some(caps) = IF_LINE.captures(line) {
                let indent = caps["indent"].len();
                let type_check = is_type_check(line);

                if caps.name("else").is_some() {
                    if let Some((chain_indent, chain)) = current.as_mut() {
                        if *chain_indent == indent && type_check {
                            chain.branches += 1;
                        }
                    }
                } else if current.as_ref().is_none_or(|(chain_indent, _)| indent <= *chain_indent) {
                    chains.extend(current.take().map(|(_, chain)| chain));
                    if type_check {
                        let chain = TypeDispatchChain {
                            line: self.line(offset + indent),
                            branches: 1,
                        };
                        current = Some((indent, chain));
                    }
                }
            }
            offset += line.len();
        }

        chains.extend(current.map(|(_, chain)| chain));
        chains.retain(|chain| chain.branches > 1);
        chains
    }

    fn collect_literals(&self, literals: &mut Vec<NumericLiteral>) {
        let structure = &self.masked.structure;
        let constant_lines: BTreeSet<usize> = CONSTANT_DEF
            .find_iter(structure)
            .map(|m| self.line(m.end()))
            .collect();

        for caps in NUMBER.captures_iter(structure) {
            let Some(num) = caps.name("num") else { continue };
            let line = self.line(num.start());
            if constant_lines.contains(&line) {
                continue;
            }
            if let Some(value) = parse_number(num.as_str()) {
                literals.push(NumericLiteral {
                    text: num.as_str().to_string(),
                    value,
                    line,
                });
            }
        }
    }

    fn collect_names(&self, import_spans: &[Range<usize>], names: &mut BTreeSet<String>) {
        let mut text = self.masked.structure.clone();
        for span in import_spans {
            text.replace_range(span.clone(), &" ".repeat(span.len()));
        }
        names.extend(IDENTIFIER.find_iter(&text).map(|m| m.as_str().to_string()));
    }

    /// Text of a `/** ... */` block ending on the line above `offset`.
    fn doc_comment_before(&self, offset: usize) -> Option<String> {
        let line_start = self.source[..offset].rfind('\n').map_or(0, |i| i + 1);
        let before = self.source[..line_start].trim_end().strip_suffix("*/")?;
        let open = before.rfind("/**")?;

        let text = before[open + 3..]
            .lines()
            .map(|l| l.trim().trim_start_matches('*').trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        (!text.is_empty()).then_some(text)
    }
}

fn parse_import_clause(clause: &str) -> Vec<Binding> {
    let (head, named) = match (clause.find('{'), clause.rfind('}')) {
        (Some(open), Some(close)) if open < close => {
            (&clause[..open], Some(&clause[open + 1..close]))
        }
        _ => (clause, None),
    };

    let mut bindings = Vec::new();
    for part in head.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.strip_prefix('*') {
            Some(rest) => {
                let alias = rest
                    .trim()
                    .strip_prefix("as")
                    .map(|a| a.trim().to_string())
                    .filter(|a| !a.is_empty());
                bindings.push((Some("*".to_string()), alias));
            }
            None => bindings.push((Some("default".to_string()), Some(part.to_string()))),
        }
    }
    if let Some(named) = named {
        bindings.extend(parse_named_bindings(named, " as "));
    }
    bindings
}

/// `{ a, b as c }` for ES imports, `{ a, b: c }` for destructured requires.
fn parse_named_bindings(list: &str, rename: &str) -> Vec<Binding> {
    list.split(',')
        .map(str::trim)
        .map(|item| item.strip_prefix("type ").unwrap_or(item).trim())
        .filter(|item| !item.is_empty())
        .map(|item| match item.split_once(rename) {
            Some((name, alias)) => (Some(name.trim().to_string()), Some(alias.trim().to_string())),
            None => (Some(item.to_string()), None),
        })
        .collect()
}

fn split_top_level(list: &str) -> Vec<&str> {
    let bytes = list.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'>' if i > 0 && bytes[i - 1] == b'=' => {}
            b'(' | b'[' | b'{' | b'<' => depth += 1,
            b')' | b']' | b'}' | b'>' => depth -= 1,
            b',' if depth == 0 => {
                parts.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);

    parts.into_iter().map(str::trim).filter(|p| !p.is_empty()).collect()
}

fn strip_modifiers(piece: &str) -> (&str, bool) {
    let mut rest = piece.trim();
    let mut stripped = false;
    while let Some(word) = rest.split_whitespace().next() {
        if !PARAMETER_MODIFIERS.contains(&word) || rest.len() == word.len() {
            break;
        }
        rest = rest[word.len()..].trim_start();
        stripped = true;
    }
    (rest, stripped)
}

fn parameter_name(piece: &str) -> Option<String> {
    let (rest, _) = strip_modifiers(piece);
    let rest = rest.trim_start_matches("...");
    let name = if rest.starts_with(['{', '[']) {
        find_matching(rest, 0).map_or(rest, |close| &rest[..=close])
    } else {
        rest.split([':', '=', '?']).next().unwrap_or(rest)
    };
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn split_parameters(params: &str) -> Vec<String> {
    split_top_level(params)
        .into_iter()
        .filter_map(parameter_name)
        .collect()
}

/// TypeScript constructor parameters declared with an access modifier
/// become fields.
fn parameter_properties(params: &str) -> Vec<String> {
    split_top_level(params)
        .into_iter()
        .filter(|p| strip_modifiers(p).1)
        .filter_map(parameter_name)
        .collect()
}

fn split_type_list(list: &str) -> Vec<String> {
    split_top_level(list)
        .into_iter()
        .filter_map(|t| t.split('<').next())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn has_modifier(modifiers: &str, word: &str) -> bool {
    modifiers.split_whitespace().any(|m| m == word)
}

fn trimmed(m: Option<Match>) -> Option<String> {
    m.map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn record_field(class: &mut ClassDefinition, name: &str, value: &str) {
    if !class.fields.iter().any(|f| f == name) {
        class.fields.push(name.to_string());
    }
    let value = value.trim();
    if MUTABLE_INITIALIZERS.iter().any(|p| value.starts_with(p))
        && !class.mutable_fields.iter().any(|f| f == name)
    {
        class.mutable_fields.push(name.to_string());
    }
}

fn decision_points(structure: &str) -> u32 {
    let count = BRANCH.find_iter(structure).count()
        + LOGICAL.find_iter(structure).count()
        + TERNARY.find_iter(structure).count();
    count as u32
}

fn is_type_check(condition: &str) -> bool {
    ["instanceof", "typeof", ".type ==", ".kind ==", ".constructor =="]
        .iter()
        .any(|needle| condition.contains(needle))
}

fn looks_like_type(name: &str) -> bool {
    let last = name.rsplit('.').next().unwrap_or(name);
    last.starts_with(|c: char| c.is_ascii_uppercase()) && last.chars().any(|c| c.is_lowercase())
}
