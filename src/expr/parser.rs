//! Recursive-descent parser producing the expression tree
//!
//! Precedence, loosest first:
//!
//! | level | operators |
//! |---|---|
//! | or | `or`, `\|\|` |
//! | and | `and`, `&&` |
//! | not | `not`, `!` |
//! | comparison | `==` `!=` `<` `<=` `>` `>=` `~` `!~` `in` |
//! | sum | `+` `-` |
//! | product | `*` `/` |
//! | unary | `-` |
//! | postfix | `[index]` |
//!
//! Comparisons do not chain: `a < b < c` is a syntax error.

use regex::Regex;

use super::error::ParseError;
use super::lexer::{Spanned, Token};
use super::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::In => "in",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }
}

/// Right-hand side of `~`
#[derive(Debug, Clone)]
pub enum Pattern {
    /// A string literal, compiled once at parse time
    Compiled(Regex),
    /// Anything else, compiled at each evaluation
    Dynamic(Box<Expr>),
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Value),
    Var(String),
    List(Vec<Expr>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Match {
        negated: bool,
        subject: Box<Expr>,
        pattern: Pattern,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
}

impl Expr {
    /// Every variable name referenced, in first-use order, without repeats
    #[must_use]
    pub fn variables(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables(&self, names: &mut Vec<String>) {
        match self {
            Self::Literal(_) => {}
            Self::Var(name) => {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
            Self::List(items) => items.iter().for_each(|item| item.collect_variables(names)),
            Self::Unary { operand, .. } => operand.collect_variables(names),
            Self::Binary { left, right, .. } => {
                left.collect_variables(names);
                right.collect_variables(names);
            }
            Self::Match { subject, pattern, .. } => {
                subject.collect_variables(names);
                if let Pattern::Dynamic(expr) = pattern {
                    expr.collect_variables(names);
                }
            }
            Self::Index { target, index } => {
                target.collect_variables(names);
                index.collect_variables(names);
            }
        }
    }
}

/// Parse a token stream into one expression
///
/// # Errors
///
/// Returns the first syntax error, plus any invalid regex literals found
/// before it.
pub fn parse(tokens: &[Spanned], source_len: usize) -> Result<Expr, Vec<ParseError>> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        end_column: source_len + 1,
        errors: Vec::new(),
    };

    let result = parser.expression().and_then(|expr| {
        if parser.pos < tokens.len() {
            Err(parser.unexpected())
        } else {
            Ok(expr)
        }
    });

    match result {
        Ok(expr) if parser.errors.is_empty() => Ok(expr),
        Ok(_) => Err(parser.errors),
        Err(e) => {
            parser.errors.push(e);
            Err(parser.errors)
        }
    }
}

struct Parser<'t> {
    tokens: &'t [Spanned],
    pos: usize,
    end_column: usize,
    /// Non-fatal problems (bad regex literals) collected along the way
    errors: Vec<ParseError>,
}

type Parsed = Result<Expr, ParseError>;

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn column(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end_column, |s| s.column)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<(), ParseError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(format!("expected {what}")))
        }
    }

    fn error(&self, message: String) -> ParseError {
        let found = self
            .peek()
            .map_or_else(|| "end of input".to_string(), |t| format!("'{}'", t.describe()));
        ParseError::new(self.column(), format!("{message}, found {found}"))
    }

    fn unexpected(&self) -> ParseError {
        self.error("expected an operator".to_string())
    }

    fn expression(&mut self) -> Parsed {
        self.or()
    }

    fn or(&mut self) -> Parsed {
        let mut left = self.and()?;
        while self.eat(&Token::Or) {
            let right = self.and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn and(&mut self) -> Parsed {
        let mut left = self.not()?;
        while self.eat(&Token::And) {
            let right = self.not()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn not(&mut self) -> Parsed {
        if self.eat(&Token::Not) {
            let operand = self.not()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Parsed {
        let left = self.sum()?;
        let op = match self.peek() {
            Some(Token::Eq) => BinaryOp::Eq,
            Some(Token::Ne) => BinaryOp::Ne,
            Some(Token::Lt) => BinaryOp::Lt,
            Some(Token::Le) => BinaryOp::Le,
            Some(Token::Gt) => BinaryOp::Gt,
            Some(Token::Ge) => BinaryOp::Ge,
            Some(Token::In) => BinaryOp::In,
            Some(Token::Match | Token::NotMatch) => return self.pattern_match(left),
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.sum()?;
        Ok(binary(op, left, right))
    }

    fn pattern_match(&mut self, subject: Expr) -> Parsed {
        let negated = self.peek() == Some(&Token::NotMatch);
        self.pos += 1;
        let column = self.column();
        let right = self.sum()?;

        let pattern = match right {
            Expr::Literal(Value::Str(source)) => match Regex::new(&source) {
                Ok(regex) => Pattern::Compiled(regex),
                Err(e) => {
                    self.errors
                        .push(ParseError::new(column, format!("invalid regex {source:?}: {e}")));
                    Pattern::Dynamic(Box::new(Expr::Literal(Value::Str(source))))
                }
            },
            other => Pattern::Dynamic(Box::new(other)),
        };

        Ok(Expr::Match {
            negated,
            subject: Box::new(subject),
            pattern,
        })
    }

    fn sum(&mut self) -> Parsed {
        let mut left = self.product()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.product()?;
            left = binary(op, left, right);
        }
    }

    fn product(&mut self) -> Parsed {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.unary()?;
            left = binary(op, left, right);
        }
    }

    fn unary(&mut self) -> Parsed {
        if self.eat(&Token::Minus) {
            let operand = self.unary()?;
            return Ok(match operand {
                Expr::Literal(Value::Int(n)) => Expr::Literal(Value::Int(-n)),
                other => Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(other),
                },
            });
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Parsed {
        let mut target = self.primary()?;
        while self.eat(&Token::LBracket) {
            let index = self.expression()?;
            self.expect(&Token::RBracket, "']'")?;
            target = Expr::Index {
                target: Box::new(target),
                index: Box::new(index),
            };
        }
        Ok(target)
    }

    fn primary(&mut self) -> Parsed {
        let Some(token) = self.peek().cloned() else {
            return Err(self.error("expected a value".to_string()));
        };

        let expr = match token {
            Token::Int(n) => Expr::Literal(Value::Int(n)),
            Token::Str(s) => Expr::Literal(Value::Str(s)),
            Token::True => Expr::Literal(Value::Bool(true)),
            Token::False => Expr::Literal(Value::Bool(false)),
            Token::Ident(name) => Expr::Var(name),
            Token::LParen => {
                self.pos += 1;
                let inner = self.expression()?;
                self.expect(&Token::RParen, "')'")?;
                return Ok(inner);
            }
            Token::LBracket => {
                self.pos += 1;
                return self.list();
            }
            _ => return Err(self.error("expected a value".to_string())),
        };
        self.pos += 1;
        Ok(expr)
    }

    fn list(&mut self) -> Parsed {
        let mut items = Vec::new();
        if self.eat(&Token::RBracket) {
            return Ok(Expr::List(items));
        }
        loop {
            items.push(self.expression()?);
            if self.eat(&Token::RBracket) {
                return Ok(Expr::List(items));
            }
            self.expect(&Token::Comma, "',' or ']'")?;
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::lexer::tokenize;

    fn parse_str(source: &str) -> Result<Expr, Vec<ParseError>> {
        parse(&tokenize(source).unwrap(), source.chars().count())
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let expr = parse_str("a or b and c").unwrap();
        let Expr::Binary { op, right, .. } = expr else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Or);
        assert!(matches!(*right, Expr::Binary { op: BinaryOp::And, .. }));
    }

    #[test]
    fn test_not_applies_to_comparison() {
        let expr = parse_str("not size > 5").unwrap();
        let Expr::Unary { op, operand } = expr else {
            panic!("expected unary");
        };
        assert_eq!(op, UnaryOp::Not);
        assert!(matches!(*operand, Expr::Binary { op: BinaryOp::Gt, .. }));
    }

    #[test]
    fn test_literal_regex_is_compiled() {
        let expr = parse_str(r#"tracker ~ "^foo""#).unwrap();
        assert!(matches!(
            expr,
            Expr::Match {
                negated: false,
                pattern: Pattern::Compiled(_),
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_regex_is_reported() {
        let errors = parse_str(r#"name ~ "(" and size > 1"#).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].column, 8);
        assert!(errors[0].message.contains("invalid regex"));
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let errors = parse_str("size 5").unwrap_err();
        assert_eq!(errors[0].column, 6);
    }

    #[test]
    fn test_comparisons_do_not_chain() {
        assert!(parse_str("1 < 2 < 3").is_err());
    }

    #[test]
    fn test_unclosed_paren() {
        let errors = parse_str("(a and b").unwrap_err();
        assert_eq!(errors[0].column, 9);
        assert!(errors[0].message.contains("end of input"));
    }

    #[test]
    fn test_variables_in_first_use_order() {
        let expr = parse_str(r#"size > 1 and (name ~ tracker or size < 9) and "x" in trackers"#).unwrap();
        assert_eq!(expr.variables(), vec!["size", "name", "tracker", "trackers"]);
    }

    #[test]
    fn test_lists_and_indexing() {
        let expr = parse_str("[1, 2, 3][0]").unwrap();
        assert!(matches!(expr, Expr::Index { .. }));
        assert!(matches!(parse_str("[]").unwrap(), Expr::List(items) if items.is_empty()));
    }

    #[test]
    fn test_negative_literal_folds() {
        assert!(matches!(
            parse_str("-5").unwrap(),
            Expr::Literal(Value::Int(-5))
        ));
    }
}
