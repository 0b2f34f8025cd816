//! Quote-aware word splitting with source spans.
//!
//! Tokens keep their raw source text; [`unescape`] turns raw text into the
//! literal value, and [`escape_string`] goes the other way for display and
//! serialization.

/// A single word of a command line, with its byte span in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Raw source text, quotes and escapes included
    pub text: String,
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
}

impl Token {
    /// An empty token positioned at `pos`. Used for the cursor resting on
    /// whitespace, where there is no word to complete yet.
    pub fn empty_at(pos: usize) -> Self {
        Self {
            text: String::new(),
            start: pos,
            end: pos,
        }
    }

    /// Whether the cursor position lies inside or at the end of this token.
    pub fn contains_or_ends_at(&self, pos: usize) -> bool {
        pos >= self.start && pos <= self.end
    }
}

/// Split `src` into word tokens.
///
/// Words are separated by unquoted whitespace. Single quotes, double quotes
/// and backslash escapes are honored; an unterminated quote consumes the rest
/// of the input (completion must tolerate half-typed lines).
pub fn tokenize(src: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let bytes: Vec<char> = src.chars().collect();
    // Byte offsets per char index, so spans survive multibyte input
    let mut offsets = Vec::with_capacity(bytes.len() + 1);
    let mut off = 0;
    for c in &bytes {
        offsets.push(off);
        off += c.len_utf8();
    }
    offsets.push(off);

    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_whitespace() {
            i += 1;
            continue;
        }

        let start = i;
        let mut quote: Option<char> = None;
        while i < bytes.len() {
            let c = bytes[i];
            match quote {
                Some(q) => {
                    if c == '\\' && q == '"' {
                        i += 1; // skip the escaped character
                    } else if c == q {
                        quote = None;
                    }
                }
                None => {
                    if c == '\\' {
                        i += 1;
                    } else if c == '\'' || c == '"' {
                        quote = Some(c);
                    } else if c.is_whitespace() {
                        break;
                    }
                }
            }
            i += 1;
        }
        let end = i.min(bytes.len());
        tokens.push(Token {
            text: bytes[start..end].iter().collect(),
            start: offsets[start],
            end: offsets[end],
        });
    }

    tokens
}

/// Locate the token under the cursor and the token before it.
///
/// The engine always works on input truncated at the cursor, so the current
/// token is the trailing word, or an empty token at the cursor when the
/// cursor rests on whitespace.
pub fn token_extent(src: &str) -> (Token, Option<Token>) {
    let tokens = tokenize(src);
    let pos = src.len();
    match tokens.last() {
        Some(last) if last.end == pos => {
            let prev = if tokens.len() >= 2 {
                Some(tokens[tokens.len() - 2].clone())
            } else {
                None
            };
            (last.clone(), prev)
        }
        _ => (Token::empty_at(pos), tokens.last().cloned()),
    }
}

/// Remove quotes and escapes from raw token text.
///
/// With `incomplete` set, an unterminated quote or trailing backslash is
/// tolerated (the still-being-typed token under the cursor); otherwise they
/// yield `None`.
pub fn unescape(raw: &str, incomplete: bool) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                } else if c == '\\' && q == '"' {
                    match chars.next() {
                        Some(n) if n == '"' || n == '\\' || n == '$' => out.push(n),
                        Some(n) => {
                            out.push('\\');
                            out.push(n);
                        }
                        None if incomplete => break,
                        None => return None,
                    }
                } else {
                    out.push(c);
                }
            }
            None => match c {
                '\'' | '"' => quote = Some(c),
                '\\' => match chars.next() {
                    Some(n) => out.push(n),
                    None if incomplete => break,
                    None => return None,
                },
                _ => out.push(c),
            },
        }
    }

    if quote.is_some() && !incomplete {
        return None;
    }
    Some(out)
}

/// Quote a string so it survives re-tokenization unchanged.
///
/// Plain words pass through; anything else is single-quoted with embedded
/// single quotes escaped.
pub fn escape_string(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }
    let plain = s
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '@' | '%' | '+' | ','));
    if plain {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}

/// Whether `c` may appear in a variable name.
pub fn is_variable_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Whether raw token text contains an unquoted wildcard (`*` or `?`).
pub fn has_wildcard(raw: &str) -> bool {
    let mut quote: Option<char> = None;
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\\' => {
                    chars.next();
                }
                '\'' | '"' => quote = Some(c),
                '*' | '?' => return true,
                _ => {}
            },
        }
    }
    false
}
