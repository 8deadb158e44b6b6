use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Structural tokens
    Dot,
    Comma,
    LeftParen,
    RightParen,

    // Logical operators
    Not,    // !
    AndAnd, // &&
    OrOr,   // ||

    // Comparison operators
    Equal,        // ==
    NotEqual,     // !=
    GreaterThan,  // >
    GreaterEqual, // >=
    LessThan,     // <
    LessEqual,    // <=

    // Identifiers and literals
    Identifier(String),
    String(String),
    Integer(i64),
    Number(f64),
    Guid(Uuid),
    DateTime(DateTime<Utc>),
    True,
    False,
    Null,

    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocatedToken {
    pub token: Token,
    /// Byte offset into the source
    pub offset: usize,
}

/// Tokenize a predicate, keeping the byte offset of each token
///
/// The returned vector always ends with [`Token::Eof`].
pub fn tokenize(input: &str) -> Result<Vec<LocatedToken>> {
    let mut tokens = Vec::new();
    let bytes = input.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        let ch = bytes[pos] as char;
        let start = pos;

        let (token, consumed) = match ch {
            ' ' | '\t' | '\r' | '\n' => {
                pos += 1;
                continue;
            }
            '.' => (Token::Dot, 1),
            ',' => (Token::Comma, 1),
            '(' => (Token::LeftParen, 1),
            ')' => (Token::RightParen, 1),
            '\'' | '"' => {
                let (value, consumed) = parse_string_literal(input, start)?;
                (Token::String(value), consumed)
            }
            '0'..='9' => parse_number(input, start)?,
            '-' if bytes.get(pos + 1).is_some_and(|b| b.is_ascii_digit()) => {
                parse_number(input, start)?
            }
            c if is_identifier_start(c) => parse_identifier(input, start)?,
            _ => parse_operator(input, start)?,
        };

        tokens.push(LocatedToken { token, offset: start });
        pos += consumed;
    }

    tokens.push(LocatedToken {
        token: Token::Eof,
        offset: input.len(),
    });
    Ok(tokens)
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_identifier_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Quoted string; a doubled quote or a backslash escapes the quote character
fn parse_string_literal(input: &str, start: usize) -> Result<(String, usize)> {
    let mut chars = input[start..].char_indices();
    let Some((_, quote)) = chars.next() else {
        return Err(anyhow!("Expected string literal at offset {}", start));
    };
    let mut result = String::new();

    while let Some((index, ch)) = chars.next() {
        if ch == quote {
            if input[start + index + 1..].starts_with(quote) {
                chars.next();
                result.push(quote);
                continue;
            }
            return Ok((result, index + 1));
        }
        if ch == '\\' {
            match chars.next() {
                Some((_, 'n')) => result.push('\n'),
                Some((_, 't')) => result.push('\t'),
                Some((_, escaped)) => result.push(escaped),
                None => break,
            }
            continue;
        }
        result.push(ch);
    }

    Err(anyhow!("Unterminated string literal at offset {}", start))
}

fn parse_number(input: &str, start: usize) -> Result<(Token, usize)> {
    let rest = &input[start..];
    let mut len = usize::from(rest.starts_with('-'));
    let mut has_dot = false;

    for ch in rest[len..].chars() {
        if ch.is_ascii_digit() {
            len += 1;
        } else if ch == '.'
            && !has_dot
            && rest[len + 1..].starts_with(|c: char| c.is_ascii_digit())
        {
            has_dot = true;
            len += 1;
        } else {
            break;
        }
    }

    let number = &rest[..len];
    if has_dot {
        number
            .parse::<f64>()
            .map(|value| (Token::Number(value), len))
            .map_err(|_| anyhow!("Invalid number '{}' at offset {}", number, start))
    } else {
        number
            .parse::<i64>()
            .map(|value| (Token::Integer(value), len))
            .map_err(|_| anyhow!("Invalid integer '{}' at offset {}", number, start))
    }
}

/// Keywords, identifiers and the typed literals `guid'..'` and `datetime'..'`
fn parse_identifier(input: &str, start: usize) -> Result<(Token, usize)> {
    let rest = &input[start..];
    let len = rest.find(|c: char| !is_identifier_continue(c)).unwrap_or(rest.len());
    let word = &rest[..len];

    if rest[len..].starts_with('\'') {
        let (literal, consumed) = parse_string_literal(input, start + len)?;
        let token = match word.to_ascii_lowercase().as_str() {
            "guid" => Token::Guid(Uuid::parse_str(&literal).map_err(|e| {
                anyhow!("Invalid guid '{}' at offset {}: {}", literal, start, e)
            })?),
            "datetime" => Token::DateTime(
                DateTime::parse_from_rfc3339(&literal)
                    .map_err(|e| {
                        anyhow!("Invalid datetime '{}' at offset {}: {}", literal, start, e)
                    })?
                    .with_timezone(&Utc),
            ),
            _ => return Err(anyhow!("Unknown literal prefix '{}' at offset {}", word, start)),
        };
        return Ok((token, len + consumed));
    }

    let token = match word.to_ascii_lowercase().as_str() {
        "true" => Token::True,
        "false" => Token::False,
        "null" => Token::Null,
        _ => Token::Identifier(word.to_string()),
    };
    Ok((token, len))
}

fn parse_operator(input: &str, start: usize) -> Result<(Token, usize)> {
    let rest = &input[start..];
    let operators = [
        ("&&", Token::AndAnd),
        ("||", Token::OrOr),
        ("==", Token::Equal),
        ("!=", Token::NotEqual),
        (">=", Token::GreaterEqual),
        ("<=", Token::LessEqual),
        ("!", Token::Not),
        (">", Token::GreaterThan),
        ("<", Token::LessThan),
    ];

    operators
        .into_iter()
        .find(|(symbol, _)| rest.starts_with(symbol))
        .map(|(symbol, token)| (token, symbol.len()))
        .ok_or_else(|| {
            let found = rest.chars().next().unwrap_or(' ');
            anyhow!("Unexpected character '{}' at offset {}", found, start)
        })
}
