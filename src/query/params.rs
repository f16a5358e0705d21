//! Named placeholder rewriting and statement splitting.
//!
//! Turns `@name` placeholders into positional `?` markers and lines up the
//! bound values in the order the markers appear. Quoted text, comments and
//! `@@system` variables pass through untouched. Text holding several
//! statements is split at top-level `;` so each one can be prepared on its
//! own.

use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

use crate::db::{BoundValue, ParamValue, Parameters};
use crate::error::{ExecutorError, Result};

/// SQL ready for the driver: positional markers plus their values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PreparedStatement {
    pub sql: String,
    pub binds: Vec<BoundValue>,
}

/// Accumulates one statement while scanning.
#[derive(Default)]
struct Pending {
    statement: PreparedStatement,
    has_code: bool,
}

impl Pending {
    fn code(&mut self, text: &str) {
        self.statement.sql.push_str(text);
        self.has_code = true;
    }

    fn finish(&mut self, statements: &mut Vec<PreparedStatement>) {
        let mut pending = std::mem::take(self);
        if pending.has_code {
            pending.statement.sql = pending.statement.sql.trim().to_string();
            statements.push(pending.statement);
        }
    }
}

/// Rewrites `query` against `params` and splits it into statements.
///
/// Without a parameter mapping each statement's text is passed through
/// verbatim, `@name` included. Parameter names match case-insensitively,
/// with or without a leading `@`. Text with no statement in it comes back
/// as a single statement so the server reports the problem.
pub fn prepare(query: &str, params: Option<&Parameters>) -> Result<Vec<PreparedStatement>> {
    let lookup = params.map(normalize_names).transpose()?;
    let mut statements = Vec::new();
    let mut pending = Pending::default();
    let mut chars = query.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' | '`' => {
                pending.code(c.encode_utf8(&mut [0; 4]));
                copy_quoted(&mut chars, &mut pending.statement.sql, c);
            }
            '-' if chars.peek() == Some(&'-') => {
                chars.next();
                // MySQL only treats "--" as a comment when followed by whitespace
                if chars
                    .peek()
                    .map_or(true, |n| n.is_whitespace() || n.is_control())
                {
                    pending.statement.sql.push_str("--");
                    copy_line_comment(&mut chars, &mut pending.statement.sql);
                } else {
                    pending.code("--");
                }
            }
            '#' => {
                pending.statement.sql.push(c);
                copy_line_comment(&mut chars, &mut pending.statement.sql);
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                // /*! ... */ is executed by MySQL
                if chars.peek() == Some(&'!') {
                    pending.has_code = true;
                }
                pending.statement.sql.push_str("/*");
                copy_block_comment(&mut chars, &mut pending.statement.sql);
            }
            ';' => pending.finish(&mut statements),
            '@' if chars.peek() == Some(&'@') => {
                chars.next();
                pending.code("@@");
            }
            '@' => {
                let Some(lookup) = &lookup else {
                    pending.code("@");
                    continue;
                };

                let raw = collect_name(&mut chars);
                // a trailing dot belongs to the surrounding SQL, not the name
                let name = raw.trim_end_matches('.');
                if name.is_empty() {
                    pending.code("@");
                    pending.statement.sql.push_str(&raw);
                    continue;
                }

                let value = lookup.get(&name.to_lowercase()).ok_or_else(|| {
                    ExecutorError::query(format!("Parameter '@{name}' must be defined"))
                })?;
                pending.code("?");
                pending.statement.sql.push_str(&raw[name.len()..]);
                pending.statement.binds.push(value.to_bound());
            }
            c if c.is_whitespace() => pending.statement.sql.push(c),
            _ => pending.code(c.encode_utf8(&mut [0; 4])),
        }
    }
    pending.finish(&mut statements);

    if statements.is_empty() {
        statements.push(PreparedStatement {
            sql: query.to_string(),
            binds: Vec::new(),
        });
    }
    Ok(statements)
}

fn normalize_names(params: &Parameters) -> Result<HashMap<String, &ParamValue>> {
    let mut lookup = HashMap::with_capacity(params.len());
    for (key, value) in params {
        let name = key.trim().trim_start_matches('@').to_lowercase();
        if name.is_empty() {
            return Err(ExecutorError::query(format!(
                "Invalid parameter name '{key}'"
            )));
        }
        if lookup.insert(name, value).is_some() {
            return Err(ExecutorError::query(format!(
                "Parameter '{key}' has already been defined"
            )));
        }
    }
    Ok(lookup)
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '.'
}

fn collect_name(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if !is_name_char(c) {
            break;
        }
        name.push(c);
        chars.next();
    }
    name
}

/// Copies the rest of a quoted run, including the closing quote.
fn copy_quoted(chars: &mut Peekable<Chars<'_>>, sql: &mut String, quote: char) {
    while let Some(c) = chars.next() {
        sql.push(c);
        if c == '\\' && quote != '`' {
            if let Some(escaped) = chars.next() {
                sql.push(escaped);
            }
        } else if c == quote {
            if chars.peek() == Some(&quote) {
                sql.push(quote);
                chars.next();
            } else {
                return;
            }
        }
    }
}

fn copy_line_comment(chars: &mut Peekable<Chars<'_>>, sql: &mut String) {
    for c in chars.by_ref() {
        sql.push(c);
        if c == '\n' {
            return;
        }
    }
}

fn copy_block_comment(chars: &mut Peekable<Chars<'_>>, sql: &mut String) {
    while let Some(c) = chars.next() {
        sql.push(c);
        if c == '*' && chars.peek() == Some(&'/') {
            sql.push('/');
            chars.next();
            return;
        }
    }
}
