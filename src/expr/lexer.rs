//! Tokenizer for filter expressions

use super::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Int(i64),
    Str(String),
    Ident(String),
    True,
    False,
    And,
    Or,
    Not,
    In,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Match,
    NotMatch,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
}

impl Token {
    /// Spelling used in diagnostics
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Int(i) => i.to_string(),
            Self::Str(s) => format!("{s:?}"),
            Self::Ident(name) => name.clone(),
            other => other.symbol().to_string(),
        }
    }

    const fn symbol(&self) -> &'static str {
        match self {
            Self::True => "true",
            Self::False => "false",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::In => "in",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Match => "~",
            Self::NotMatch => "!~",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Comma => ",",
            Self::Int(_) | Self::Str(_) | Self::Ident(_) => "",
        }
    }
}

/// A token and the 1-based column it starts at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub column: usize,
}

/// Split `source` into tokens
///
/// Scanning continues past bad characters so that every problem in the
/// input is reported at once.
///
/// # Errors
///
/// Returns every lexical problem found, in source order.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, Vec<ParseError>> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        let column = pos + 1;

        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        let next = chars.get(pos + 1).copied();
        let (token, width) = match (c, next) {
            ('&', Some('&')) => (Token::And, 2),
            ('|', Some('|')) => (Token::Or, 2),
            ('=', Some('=')) => (Token::Eq, 2),
            ('!', Some('=')) => (Token::Ne, 2),
            ('!', Some('~')) => (Token::NotMatch, 2),
            ('<', Some('=')) => (Token::Le, 2),
            ('>', Some('=')) => (Token::Ge, 2),
            ('!', _) => (Token::Not, 1),
            ('<', _) => (Token::Lt, 1),
            ('>', _) => (Token::Gt, 1),
            ('~', _) => (Token::Match, 1),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            ('[', _) => (Token::LBracket, 1),
            (']', _) => (Token::RBracket, 1),
            (',', _) => (Token::Comma, 1),
            ('"' | '\'', _) => {
                match read_string(&chars, pos) {
                    Ok((text, end)) => {
                        tokens.push(Spanned {
                            token: Token::Str(text),
                            column,
                        });
                        pos = end;
                    }
                    Err(e) => {
                        errors.push(e);
                        pos = chars.len();
                    }
                }
                continue;
            }
            (d, _) if d.is_ascii_digit() => {
                let end = scan(&chars, pos, |c| c.is_ascii_digit() || c == '_');
                let digits: String = chars[pos..end].iter().filter(|&&c| c != '_').collect();
                match digits.parse() {
                    Ok(n) => tokens.push(Spanned {
                        token: Token::Int(n),
                        column,
                    }),
                    Err(_) => errors.push(ParseError::new(column, format!("integer '{digits}' is too large"))),
                }
                pos = end;
                continue;
            }
            (a, _) if a.is_alphabetic() || a == '_' => {
                let end = scan(&chars, pos, |c| c.is_alphanumeric() || c == '_');
                let word: String = chars[pos..end].iter().collect();
                let token = match word.as_str() {
                    "true" => Token::True,
                    "false" => Token::False,
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "in" => Token::In,
                    _ => Token::Ident(word),
                };
                tokens.push(Spanned { token, column });
                pos = end;
                continue;
            }
            (other, _) => {
                errors.push(ParseError::new(column, format!("unexpected character '{other}'")));
                pos += 1;
                continue;
            }
        };

        tokens.push(Spanned { token, column });
        pos += width;
    }

    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}

fn scan(chars: &[char], start: usize, accept: impl Fn(char) -> bool) -> usize {
    chars[start..]
        .iter()
        .position(|&c| !accept(c))
        .map_or(chars.len(), |offset| start + offset)
}

/// Read a quoted string starting at the opening quote
///
/// `\\`, `\n`, `\t` and an escaped quote are translated; any other escape
/// is kept verbatim so regex classes like `\d` survive.
fn read_string(chars: &[char], start: usize) -> Result<(String, usize), ParseError> {
    let quote = chars[start];
    let mut text = String::new();
    let mut pos = start + 1;

    while let Some(&c) = chars.get(pos) {
        match c {
            c if c == quote => return Ok((text, pos + 1)),
            '\\' => {
                match chars.get(pos + 1) {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('\\') => text.push('\\'),
                    Some(&q) if q == quote => text.push(q),
                    Some(&other) => {
                        text.push('\\');
                        text.push(other);
                    }
                    None => break,
                }
                pos += 2;
            }
            c => {
                text.push(c);
                pos += 1;
            }
        }
    }

    Err(ParseError::new(start + 1, "unterminated string"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("a == 1 && !b || c != 2"),
            vec![
                Token::Ident("a".into()),
                Token::Eq,
                Token::Int(1),
                Token::And,
                Token::Not,
                Token::Ident("b".into()),
                Token::Or,
                Token::Ident("c".into()),
                Token::Ne,
                Token::Int(2),
            ]
        );
        assert_eq!(kinds("x !~ y"), vec![Token::Ident("x".into()), Token::NotMatch, Token::Ident("y".into())]);
    }

    #[test]
    fn test_keywords_and_literals() {
        assert_eq!(
            kinds("not true and size >= 1_000"),
            vec![
                Token::Not,
                Token::True,
                Token::And,
                Token::Ident("size".into()),
                Token::Ge,
                Token::Int(1000),
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(kinds(r#""a\"b""#), vec![Token::Str("a\"b".into())]);
        assert_eq!(kinds(r"'it\'s'"), vec![Token::Str("it's".into())]);
        assert_eq!(kinds(r#""foo\.org\\""#), vec![Token::Str(r"foo\.org\".into())]);
    }

    #[test]
    fn test_columns() {
        let tokens = tokenize("ab  >  3").unwrap();
        let columns: Vec<usize> = tokens.iter().map(|t| t.column).collect();
        assert_eq!(columns, vec![1, 5, 8]);
    }

    #[test]
    fn test_reports_every_bad_character() {
        let errors = tokenize("a $ b # c").unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].column, 3);
        assert_eq!(errors[1].column, 7);
    }

    #[test]
    fn test_unterminated_string() {
        let errors = tokenize(r#"name == "abc"#).unwrap_err();
        assert_eq!(errors, vec![ParseError::new(9, "unterminated string")]);
    }
}
