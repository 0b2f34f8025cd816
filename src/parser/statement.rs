//! Statement extraction around a cursor position.
//!
//! The completion engine needs three things from the surrounding line: the
//! innermost command substitution containing the cursor, the smallest plain
//! statement containing it, and that statement's decoration. Everything else
//! about the line is the host shell's business.

use super::tokenizer::{self, Token};

/// Keyword preceding a command that restricts which command sources apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoration {
    /// No decoration: commands, functions and builtins all apply
    None,
    /// `command` or `exec`: external commands only
    Command,
    /// `builtin`: builtins only
    Builtin,
}

/// Reserved words that head non-plain statements (loop headers, conditionals
/// and the like). Completion falls back to plain path expansion inside these.
const RESERVED_WORDS: &[&str] = &[
    "for", "while", "if", "else", "elif", "then", "fi", "do", "done", "case", "esac", "function",
];

/// A plain statement: a command word plus its arguments.
#[derive(Debug, Clone)]
pub struct PlainStatement {
    /// Tokens of the statement, spans relative to the original source
    pub tokens: Vec<Token>,
    /// Decoration stripped from the front, if any
    pub decoration: Decoration,
    /// Byte offset of the statement in the original source
    pub start: usize,
}

impl PlainStatement {
    /// The command word. `None` when the statement is nothing but a
    /// decoration so far (`builtin <cursor>`).
    pub fn command(&self) -> Option<&Token> {
        self.tokens.first()
    }

    /// The argument tokens following the command word.
    pub fn arguments(&self) -> &[Token] {
        if self.tokens.is_empty() {
            &[]
        } else {
            &self.tokens[1..]
        }
    }
}

/// Narrow `src` to the innermost `$(...)` command substitution containing
/// `pos`. Returns the byte range of the substitution body; the whole string
/// when the cursor is not inside any substitution.
pub fn cmdsubst_extent(src: &str, pos: usize) -> (usize, usize) {
    let mut stack: Vec<usize> = Vec::new();
    let mut best = (0, src.len());
    let mut quote: Option<char> = None;
    let mut iter = src.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\\' => {
                    iter.next();
                }
                '\'' => quote = Some('\''),
                '$' => {
                    if let Some(&(_, '(')) = iter.peek() {
                        iter.next();
                        stack.push(i + 2);
                    }
                }
                ')' => {
                    if let Some(start) = stack.pop() {
                        // Ranges close inner-to-outer; keep the narrowest
                        if start <= pos && pos <= i && start >= best.0 && i <= best.1 {
                            best = (start, i);
                        }
                    }
                }
                _ => {}
            },
        }
    }

    // Unterminated substitutions still open at the cursor
    for &start in &stack {
        if start <= pos && start >= best.0 {
            best = (start, best.1.min(src.len()));
        }
    }

    best
}

/// Find the smallest plain statement containing `pos`.
///
/// Statements are separated by unquoted `;`, `|`, `&`, and newlines. Returns
/// `None` when the statement at the cursor is headed by a reserved word
/// (loop headers and similar), where argument rules do not apply.
pub fn plain_statement_at(src: &str, pos: usize) -> Option<PlainStatement> {
    let (start, end) = statement_extent(src, pos);
    let segment = &src[start..end];

    let mut tokens = tokenizer::tokenize(segment);
    for t in &mut tokens {
        t.start += start;
        t.end += start;
    }

    let mut decoration = Decoration::None;
    if let Some(first) = tokens.first().map(|t| t.text.clone()) {
        if RESERVED_WORDS.contains(&first.as_str()) {
            return None;
        }
        match first.as_str() {
            "command" | "exec" => {
                decoration = Decoration::Command;
                tokens.remove(0);
            }
            "builtin" => {
                decoration = Decoration::Builtin;
                tokens.remove(0);
            }
            _ => {}
        }
    }

    Some(PlainStatement {
        tokens,
        decoration,
        start,
    })
}

/// Byte range of the statement containing `pos`, quote-aware.
fn statement_extent(src: &str, pos: usize) -> (usize, usize) {
    let mut start = 0;
    let mut end = src.len();
    let mut quote: Option<char> = None;
    let mut iter = src.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\\' => {
                    iter.next();
                }
                '\'' | '"' => quote = Some(c),
                ';' | '|' | '&' | '\n' => {
                    if i < pos {
                        start = i + 1;
                    } else {
                        end = i;
                        break;
                    }
                }
                _ => {}
            },
        }
    }

    (start, end)
}
