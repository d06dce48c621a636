/// Macro to define a thread-local parser with a given language.
/// Usage: `define_parser!(PARSER_NAME, language_fn)`
#[macro_export]
macro_rules! define_parser {
    ($name:ident, $language:expr) => {
        thread_local! {
            static $name: std::cell::RefCell<tree_sitter::Parser> = std::cell::RefCell::new({
                let mut parser = tree_sitter::Parser::new();
                parser.set_language(&$language.into()).expect(concat!("Failed to set ", stringify!($name), " language"));
                parser
            });
        }
    };
}

/// Byte offset to 1-based line number lookup.
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    pub fn line_of(&self, offset: usize) -> usize {
        self.starts.partition_point(|&start| start <= offset)
    }
}

/// Two views of a C-family source with identical byte offsets.
pub struct MaskedSource {
    /// Comments replaced by whitespace; string literals intact.
    pub code: String,
    /// Comments and string literal contents replaced by whitespace.
    pub structure: String,
}

#[derive(Clone, Copy, PartialEq)]
enum State {
    Code,
    LineComment,
    BlockComment,
    Str(char),
}

/// Blank out comments (and, in `structure`, string contents) while keeping
/// every newline and byte offset in place, so line numbers survive.
///
/// Regex literals and `${}` expressions inside template strings are not
/// recognised.
pub fn mask_source(source: &str) -> MaskedSource {
    let mut code = String::with_capacity(source.len());
    let mut structure = String::with_capacity(source.len());
    let mut state = State::Code;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    blank_into(&mut code, "//");
                    blank_into(&mut structure, "//");
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    blank_into(&mut code, "/*");
                    blank_into(&mut structure, "/*");
                    state = State::BlockComment;
                }
                '\'' | '"' | '`' => {
                    code.push(c);
                    structure.push(c);
                    state = State::Str(c);
                }
                _ => {
                    code.push(c);
                    structure.push(c);
                }
            },
            State::LineComment => {
                if c == '\n' {
                    code.push(c);
                    structure.push(c);
                    state = State::Code;
                } else {
                    blank_char(&mut code, c);
                    blank_char(&mut structure, c);
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    blank_into(&mut code, "*/");
                    blank_into(&mut structure, "*/");
                    state = State::Code;
                } else {
                    blank_char(&mut code, c);
                    blank_char(&mut structure, c);
                }
            }
            State::Str(quote) => {
                if c == '\\' {
                    code.push(c);
                    blank_char(&mut structure, c);
                    if let Some(next) = chars.next() {
                        code.push(next);
                        blank_char(&mut structure, next);
                    }
                } else if c == quote {
                    code.push(c);
                    structure.push(c);
                    state = State::Code;
                } else if c == '\n' && quote != '`' {
                    // Unterminated literal; resynchronise at end of line.
                    code.push(c);
                    structure.push(c);
                    state = State::Code;
                } else {
                    code.push(c);
                    blank_char(&mut structure, c);
                }
            }
        }
    }

    MaskedSource { code, structure }
}

fn blank_char(out: &mut String, c: char) {
    if c == '\n' {
        out.push('\n');
    } else {
        out.extend(std::iter::repeat_n(' ', c.len_utf8()));
    }
}

fn blank_into(out: &mut String, s: &str) {
    for c in s.chars() {
        blank_char(out, c);
    }
}

/// Offset of the bracket closing the one at `open`, counting nesting.
/// Expects a masked `structure` view so brackets inside strings are gone.
pub fn find_matching(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let (open_byte, close_byte) = match bytes.get(open)? {
        b'{' => (b'{', b'}'),
        b'(' => (b'(', b')'),
        b'[' => (b'[', b']'),
        _ => return None,
    };

    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if b == open_byte {
            depth += 1;
        } else if b == close_byte {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Count comma-separated arguments between a matched pair of parentheses.
pub fn count_arguments(structure: &str, open: usize, close: usize) -> usize {
    let inner = &structure[open + 1..close];
    if inner.trim().is_empty() {
        return 0;
    }

    let mut depth = 0i32;
    let mut count = 1;
    for b in inner.bytes() {
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            b',' if depth == 0 => count += 1,
            _ => {}
        }
    }
    // Trailing comma
    if inner.trim_end().ends_with(',') {
        count -= 1;
    }
    count
}

/// Numeric value of an integer or float literal in Python or JS syntax.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = raw
        .replace('_', "")
        .trim_end_matches(['j', 'J', 'l', 'L', 'n'])
        .to_lowercase();

    let radix = |prefix: &str, radix: u32| {
        cleaned
            .strip_prefix(prefix)
            .and_then(|digits| i64::from_str_radix(digits, radix).ok())
            .map(|v| v as f64)
    };

    radix("0x", 16)
        .or_else(|| radix("0o", 8))
        .or_else(|| radix("0b", 2))
        .or_else(|| cleaned.parse::<f64>().ok())
}
