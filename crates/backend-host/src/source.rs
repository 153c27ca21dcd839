//! Program source checks
//!
//! The host backend does not compile OpenCL C. It only scans the source for
//! kernel declarations and for the mistakes a compiler would reject first,
//! and turns the build options into defines visible to host kernels. The
//! preprocessor is not evaluated, so `#error` fails the build even inside a
//! conditional block.

use rustc_hash::FxHashMap;

/// A `__kernel void name(...)` declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KernelDecl {
    pub name: String,
    pub params: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Punct(char),
}

/// Replace comments and the contents of string and char literals with
/// spaces, keeping line breaks so line numbers stay valid
pub(crate) fn strip(source: &str) -> String {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Code,
        LineComment,
        BlockComment,
        Literal(char),
    }

    let mut out = String::with_capacity(source.len());
    let mut state = State::Code;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    out.push_str("  ");
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    out.push_str("  ");
                    state = State::BlockComment;
                }
                '"' | '\'' => {
                    out.push(c);
                    state = State::Literal(c);
                }
                _ => out.push(c),
            },
            State::LineComment => {
                if c == '\n' {
                    out.push('\n');
                    state = State::Code;
                } else {
                    out.push(' ');
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("  ");
                    state = State::Code;
                } else {
                    out.push(if c == '\n' { '\n' } else { ' ' });
                }
            }
            State::Literal(quote) => {
                if c == '\\' {
                    chars.next();
                    out.push_str("  ");
                } else if c == quote {
                    out.push(c);
                    state = State::Code;
                } else {
                    out.push(if c == '\n' { '\n' } else { ' ' });
                }
            }
        }
    }

    out
}

/// Report unmatched brackets of stripped source as build log lines
pub(crate) fn check_delimiters(stripped: &str) -> Vec<String> {
    let mut errors = Vec::new();
    let mut open: Vec<(char, usize)> = Vec::new();

    for (line_idx, line) in stripped.lines().enumerate() {
        let line_no = line_idx + 1;
        for c in line.chars() {
            match c {
                '(' | '[' | '{' => open.push((c, line_no)),
                ')' | ']' | '}' => {
                    let expected = match c {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    match open.pop() {
                        Some((opened, _)) if opened == expected => {}
                        Some((opened, opened_line)) => errors.push(format!(
                            "line {}: error: expected closing for `{}` opened at line {}, found `{}`",
                            line_no, opened, opened_line, c
                        )),
                        None => errors.push(format!("line {}: error: unmatched `{}`", line_no, c)),
                    }
                }
                _ => {}
            }
        }
    }

    for (opened, line_no) in open {
        errors.push(format!("line {}: error: unclosed `{}`", line_no, opened));
    }
    errors
}

/// Collect `#error` directives of stripped source as build log lines
pub(crate) fn error_directives(stripped: &str) -> Vec<String> {
    stripped
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let directive = line.trim_start().strip_prefix('#')?.trim_start();
            let message = directive.strip_prefix("error")?;
            if message.starts_with(|c: char| c.is_alphanumeric() || c == '_') {
                return None;
            }
            Some(format!("line {}: error: #error{}", idx + 1, message.trim_end()))
        })
        .collect()
}

fn tokenize(stripped: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = stripped.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_alphanumeric() || c == '_' {
            let mut ident = String::new();
            while let Some(&c) = chars.peek() {
                if !(c.is_alphanumeric() || c == '_') {
                    break;
                }
                ident.push(c);
                chars.next();
            }
            tokens.push(Token::Ident(ident));
        } else {
            tokens.push(Token::Punct(c));
            chars.next();
        }
    }

    tokens
}

fn is_ident(token: Option<&Token>, name: &str) -> bool {
    matches!(token, Some(Token::Ident(ident)) if ident == name)
}

/// Index just past the parenthesized group starting at `start`
fn skip_group(tokens: &[Token], start: usize) -> usize {
    let mut depth = 0usize;
    for (offset, token) in tokens[start..].iter().enumerate() {
        match token {
            Token::Punct('(') => depth += 1,
            Token::Punct(')') => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return start + offset + 1;
                }
            }
            _ => {}
        }
    }
    tokens.len()
}

/// Find kernel entry points and their parameter counts in stripped source
pub(crate) fn kernel_declarations(stripped: &str) -> Vec<KernelDecl> {
    let tokens = tokenize(stripped);
    let mut decls = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        if !(is_ident(tokens.get(i), "__kernel") || is_ident(tokens.get(i), "kernel")) {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while is_ident(tokens.get(j), "__attribute__") {
            j = skip_group(&tokens, j + 1);
        }
        if !is_ident(tokens.get(j), "void") {
            i += 1;
            continue;
        }

        let (Some(Token::Ident(name)), Some(Token::Punct('('))) = (tokens.get(j + 1), tokens.get(j + 2))
        else {
            i += 1;
            continue;
        };

        let end = skip_group(&tokens, j + 2);
        let inner = &tokens[(j + 3).min(end)..end.saturating_sub(1).max(j + 3)];
        let params = if inner.is_empty() || (inner.len() == 1 && is_ident(inner.first(), "void")) {
            0
        } else {
            let mut depth = 0usize;
            let mut commas = 0;
            for token in inner {
                match token {
                    Token::Punct('(') => depth += 1,
                    Token::Punct(')') => depth = depth.saturating_sub(1),
                    Token::Punct(',') if depth == 0 => commas += 1,
                    _ => {}
                }
            }
            commas + 1
        };

        decls.push(KernelDecl {
            name: name.clone(),
            params,
        });
        i = end;
    }

    decls
}

/// Turn build options into defines
///
/// Accepts `-D NAME`, `-D NAME=VALUE`, `-DNAME[=VALUE]` and ignores `-cl-*`
/// optimization flags. Anything else is reported as a build log line.
pub(crate) fn parse_options(options: &str) -> Result<FxHashMap<String, String>, Vec<String>> {
    let mut defines = FxHashMap::default();
    let mut errors = Vec::new();
    let mut words = options.split_whitespace();

    while let Some(word) = words.next() {
        let definition = if word == "-D" {
            match words.next() {
                Some(definition) => definition,
                None => {
                    errors.push("error: missing macro name after `-D`".to_string());
                    break;
                }
            }
        } else if let Some(definition) = word.strip_prefix("-D") {
            definition
        } else if word.starts_with("-cl-") {
            continue;
        } else {
            errors.push(format!("error: unsupported build option `{}`", word));
            continue;
        };

        let (name, value) = definition.split_once('=').unwrap_or((definition, "1"));
        if name.is_empty() {
            errors.push(format!("error: empty macro name in `{}`", word));
            continue;
        }
        defines.insert(name.to_string(), value.to_string());
    }

    if errors.is_empty() {
        Ok(defines)
    } else {
        Err(errors)
    }
}
