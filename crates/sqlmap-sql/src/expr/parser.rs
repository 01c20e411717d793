use super::lexer::{tokenize, Token};
use sqlmap_core::{Error, Result, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Not,
    Neg,
}

/// Parsed guard expression.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Literal(Value),

    /// A root name, looked up in the scope.
    Ident(String),

    Member {
        target: Box<Expr>,
        name: String,
    },

    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },

    Call {
        target: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },

    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

pub(crate) fn parse(src: &str) -> Result<Expr> {
    let tokens = tokenize(src)?;
    let mut parser = Parser {
        src,
        tokens: &tokens,
        pos: 0,
    };

    let expr = parser.or()?;
    if let Some(token) = parser.peek() {
        return Err(parser.unexpected(token));
    }
    Ok(expr)
}

struct Parser<'a> {
    src: &'a str,
    tokens: &'a [Token],
    pos: usize,
}

impl Parser<'_> {
    fn or(&mut self) -> Result<Expr> {
        let mut lhs = self.and()?;
        while self.eat(&Token::Or) {
            let rhs = self.and()?;
            lhs = binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr> {
        let mut lhs = self.equality()?;
        while self.eat(&Token::And) {
            let rhs = self.equality()?;
            lhs = binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn equality(&mut self) -> Result<Expr> {
        let mut lhs = self.relational()?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => BinaryOp::Eq,
                Some(Token::Ne) => BinaryOp::Ne,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.relational()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn relational(&mut self) -> Result<Expr> {
        let mut lhs = self.additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Le) => BinaryOp::Le,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Ge) => BinaryOp::Ge,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.additive()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn additive(&mut self) -> Result<Expr> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.multiplicative()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn multiplicative(&mut self) -> Result<Expr> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn unary(&mut self) -> Result<Expr> {
        let op = match self.peek() {
            Some(Token::Not) => UnaryOp::Not,
            Some(Token::Minus) => UnaryOp::Neg,
            _ => return self.postfix(),
        };
        self.pos += 1;
        Ok(Expr::Unary {
            op,
            operand: Box::new(self.unary()?),
        })
    }

    fn postfix(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;

        loop {
            if self.eat(&Token::Dot) {
                let name = self.ident()?;
                if self.eat(&Token::LParen) {
                    let args = self.args()?;
                    expr = Expr::Call {
                        target: Box::new(expr),
                        method: name,
                        args,
                    };
                } else {
                    expr = Expr::Member {
                        target: Box::new(expr),
                        name,
                    };
                }
            } else if self.eat(&Token::LBracket) {
                let index = self.or()?;
                self.expect(&Token::RBracket)?;
                expr = Expr::Index {
                    target: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn args(&mut self) -> Result<Vec<Expr>> {
        let mut args = vec![];
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.or()?);
            if self.eat(&Token::RParen) {
                return Ok(args);
            }
            self.expect(&Token::Comma)?;
        }
    }

    fn primary(&mut self) -> Result<Expr> {
        let Some(token) = self.tokens.get(self.pos) else {
            return Err(Error::parse(format!(
                "unexpected end of expression '{}'",
                self.src
            )));
        };
        self.pos += 1;

        Ok(match token {
            Token::Int(v) => Expr::Literal(match i32::try_from(*v) {
                Ok(v) => Value::I32(v),
                Err(_) => Value::I64(*v),
            }),
            Token::Float(v) => Expr::Literal(Value::F64(*v)),
            Token::Str(v) => Expr::Literal(Value::String(v.clone())),
            Token::True => Expr::Literal(Value::Bool(true)),
            Token::False => Expr::Literal(Value::Bool(false)),
            Token::Null => Expr::Literal(Value::Null),
            Token::Ident(name) => Expr::Ident(name.clone()),
            Token::LParen => {
                let expr = self.or()?;
                self.expect(&Token::RParen)?;
                expr
            }
            other => return Err(self.unexpected(other)),
        })
    }

    fn ident(&mut self) -> Result<String> {
        match self.tokens.get(self.pos) {
            Some(Token::Ident(name)) => {
                self.pos += 1;
                Ok(name.clone())
            }
            Some(other) => Err(self.unexpected(other)),
            None => Err(Error::parse(format!(
                "expected a name at the end of expression '{}'",
                self.src
            ))),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        match self.peek() {
            Some(found) if found == token => {
                self.pos += 1;
                Ok(())
            }
            Some(found) => Err(self.unexpected(found)),
            None => Err(Error::parse(format!(
                "expected {:?} at the end of expression '{}'",
                token, self.src
            ))),
        }
    }

    fn unexpected(&self, token: &Token) -> Error {
        Error::parse(format!(
            "unexpected token {:?} in expression '{}'",
            token, self.src
        ))
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Box<Expr> {
        Box::new(Expr::Ident(name.to_string()))
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let expr = parse("a or b and c").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Or,
                lhs: ident("a"),
                rhs: Box::new(Expr::Binary {
                    op: BinaryOp::And,
                    lhs: ident("b"),
                    rhs: ident("c"),
                }),
            }
        );
    }

    #[test]
    fn postfix_chains() {
        let expr = parse("user.roles[0].name.trim()").unwrap();
        let Expr::Call { target, method, args } = expr else {
            panic!("expected a call");
        };
        assert_eq!(method, "trim");
        assert!(args.is_empty());
        assert!(matches!(*target, Expr::Member { ref name, .. } if name == "name"));
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        assert!(parse("a b").unwrap_err().is_parse());
        assert!(parse("(a").unwrap_err().is_parse());
        assert!(parse("").unwrap_err().is_parse());
    }
}
