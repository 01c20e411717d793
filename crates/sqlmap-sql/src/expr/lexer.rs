use sqlmap_core::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Token {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    True,
    False,
    Null,
    And,
    Or,
    Not,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Dot,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
}

pub(super) fn tokenize(src: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = vec![];
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() {
            let start = i;
            let mut is_float = false;
            while i < chars.len()
                && (chars[i].is_ascii_digit()
                    || (chars[i] == '.'
                        && !is_float
                        && chars.get(i + 1).is_some_and(char::is_ascii_digit)))
            {
                is_float |= chars[i] == '.';
                i += 1;
            }

            let text: String = chars[start..i].iter().collect();
            // Numeric suffixes such as `10L` or `1.5d`
            if i < chars.len() && matches!(chars[i], 'l' | 'L' | 'd' | 'D' | 'f' | 'F') {
                i += 1;
            }

            tokens.push(if is_float {
                Token::Float(text.parse().map_err(|_| invalid(src, &text))?)
            } else {
                Token::Int(text.parse().map_err(|_| invalid(src, &text))?)
            });
            continue;
        }

        if c.is_alphabetic() || c == '_' || c == '$' {
            let start = i;
            while i < chars.len()
                && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$')
            {
                i += 1;
            }

            let word: String = chars[start..i].iter().collect();
            tokens.push(match word.as_str() {
                "true" => Token::True,
                "false" => Token::False,
                "null" => Token::Null,
                "and" => Token::And,
                "or" => Token::Or,
                "not" => Token::Not,
                "eq" => Token::Eq,
                "neq" => Token::Ne,
                "lt" => Token::Lt,
                "lte" => Token::Le,
                "gt" => Token::Gt,
                "gte" => Token::Ge,
                _ => Token::Ident(word),
            });
            continue;
        }

        if c == '\'' || c == '"' {
            let quote = c;
            let mut text = String::new();
            i += 1;

            loop {
                match chars.get(i) {
                    None => {
                        return Err(Error::parse(format!(
                            "unterminated string literal in expression '{src}'"
                        )))
                    }
                    Some('\\') if i + 1 < chars.len() => {
                        text.push(chars[i + 1]);
                        i += 2;
                    }
                    Some(&ch) if ch == quote => {
                        i += 1;
                        break;
                    }
                    Some(&ch) => {
                        text.push(ch);
                        i += 1;
                    }
                }
            }

            tokens.push(Token::Str(text));
            continue;
        }

        let next = chars.get(i + 1).copied();
        let (token, width) = match (c, next) {
            ('=', Some('=')) => (Token::Eq, 2),
            ('!', Some('=')) => (Token::Ne, 2),
            ('<', Some('=')) => (Token::Le, 2),
            ('>', Some('=')) => (Token::Ge, 2),
            ('&', Some('&')) => (Token::And, 2),
            ('|', Some('|')) => (Token::Or, 2),
            ('<', _) => (Token::Lt, 1),
            ('>', _) => (Token::Gt, 1),
            ('!', _) => (Token::Not, 1),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('%', _) => (Token::Percent, 1),
            ('.', _) => (Token::Dot, 1),
            (',', _) => (Token::Comma, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            ('[', _) => (Token::LBracket, 1),
            (']', _) => (Token::RBracket, 1),
            _ => {
                return Err(Error::parse(format!(
                    "unexpected character '{c}' at position {i} in expression '{src}'"
                )))
            }
        };

        tokens.push(token);
        i += width;
    }

    Ok(tokens)
}

fn invalid(src: &str, literal: &str) -> Error {
    Error::parse(format!(
        "invalid numeric literal '{literal}' in expression '{src}'"
    ))
}
