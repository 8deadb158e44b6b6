use crate::api::expression::{value, BinaryOp, Expr, Field, Member, Method};
use crate::api::query::FilterValue;
use crate::predicate::lexer::{LocatedToken, Token};
use anyhow::{anyhow, Result};
use std::marker::PhantomData;

/// Parse tokens into an expression over the members of `F`
pub fn parse<F: Field>(tokens: Vec<LocatedToken>) -> Result<Expr<F>> {
    let mut parser = Parser::<F>::new(tokens);
    let expr = parser.parse_or()?;
    if !parser.is_at_end() {
        return Err(parser.error("end of predicate"));
    }
    Ok(expr)
}

#[derive(Debug)]
struct Parser<F> {
    tokens: Vec<LocatedToken>,
    current: usize,
    _field: PhantomData<F>,
}

impl<F: Field> Parser<F> {
    fn new(tokens: Vec<LocatedToken>) -> Self {
        Self {
            tokens,
            current: 0,
            _field: PhantomData,
        }
    }

    fn parse_or(&mut self) -> Result<Expr<F>> {
        let mut expr = self.parse_and()?;
        while self.peek() == Some(&Token::OrOr) {
            self.advance();
            expr = expr.or(self.parse_and()?);
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expr<F>> {
        let mut expr = self.parse_unary()?;
        while self.peek() == Some(&Token::AndAnd) {
            self.advance();
            expr = expr.and(self.parse_unary()?);
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr<F>> {
        if self.peek() == Some(&Token::Not) {
            self.advance();
            return Ok(!self.parse_unary()?);
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr<F>> {
        let left = self.parse_postfix()?;
        let op = match self.peek() {
            Some(Token::Equal) => BinaryOp::Equal,
            Some(Token::NotEqual) => BinaryOp::NotEqual,
            Some(Token::LessThan) => BinaryOp::LessThan,
            Some(Token::GreaterThan) => BinaryOp::GreaterThan,
            Some(Token::LessEqual) => BinaryOp::LessOrEqual,
            Some(Token::GreaterEqual) => BinaryOp::GreaterOrEqual,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_postfix()?;
        Ok(Expr::binary(op, left, right))
    }

    /// Member accesses and method calls chained onto a primary
    fn parse_postfix(&mut self) -> Result<Expr<F>> {
        let mut expr = self.parse_primary()?;

        while self.peek() == Some(&Token::Dot) {
            self.advance();
            let name = self.expect_identifier()?;

            if self.peek() == Some(&Token::LeftParen) {
                self.advance();
                let args = self.parse_arguments()?;
                expr = expr.call(method_named(&name), args);
            } else {
                expr = expr.property(name);
            }
        }

        Ok(expr)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr<F>>> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RightParen) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_or()?);
            match self.peek() {
                Some(Token::Comma) => {
                    self.advance();
                }
                Some(Token::RightParen) => {
                    self.advance();
                    return Ok(args);
                }
                _ => return Err(self.error("',' or ')'")),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr<F>> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.error("an expression"));
        };

        let constant = match token {
            Token::String(s) => FilterValue::String(s),
            Token::Integer(i) => FilterValue::Integer(i),
            Token::Number(n) => FilterValue::Number(n),
            Token::Guid(g) => FilterValue::Guid(g),
            Token::DateTime(dt) => FilterValue::DateTime(dt),
            Token::True => FilterValue::Boolean(true),
            Token::False => FilterValue::Boolean(false),
            Token::Null => FilterValue::Null,
            Token::LeftParen => {
                self.advance();
                let expr = self.parse_or()?;
                self.expect(Token::RightParen)?;
                return Ok(expr);
            }
            Token::Identifier(name) => return self.parse_identifier(name),
            _ => return Err(self.error("an expression")),
        };

        self.advance();
        Ok(Expr::Constant(constant))
    }

    /// A member of `F`, or the `value('Key')` accessor
    fn parse_identifier(&mut self, name: String) -> Result<Expr<F>> {
        let offset = self.offset();
        self.advance();

        if name.eq_ignore_ascii_case("value") && self.peek() == Some(&Token::LeftParen) {
            self.advance();
            let key = match self.advance().map(|t| t.token.clone()) {
                Some(Token::String(key)) => key,
                _ => return Err(anyhow!("value() takes a string key at offset {}", offset)),
            };
            self.expect(Token::RightParen)?;
            return Ok(value(key));
        }

        F::all()
            .iter()
            .copied()
            .find(|field| field.name().eq_ignore_ascii_case(&name))
            .map(|field| Expr::Member {
                target: Box::new(Expr::Parameter),
                member: Member::Field(field),
            })
            .ok_or_else(|| {
                let known: Vec<&str> = F::all().iter().map(|f| f.name()).collect();
                anyhow!(
                    "Unknown member '{}' at offset {}; expected one of {}",
                    name,
                    offset,
                    known.join(", ")
                )
            })
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        if self.peek() == Some(&expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(&format!("{:?}", expected)))
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        match self.peek().cloned() {
            Some(Token::Identifier(name)) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.error("an identifier")),
        }
    }

    fn error(&self, expected: &str) -> anyhow::Error {
        match self.peek() {
            Some(Token::Eof) | None => anyhow!(
                "Expected {}, found end of input at offset {}",
                expected,
                self.offset()
            ),
            Some(token) => {
                anyhow!("Expected {}, found {:?} at offset {}", expected, token, self.offset())
            }
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current).map(|t| &t.token)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.current)
            .or_else(|| self.tokens.last())
            .map_or(0, |t| t.offset)
    }

    fn advance(&mut self) -> Option<&LocatedToken> {
        if self.current < self.tokens.len() {
            self.current += 1;
            self.tokens.get(self.current - 1)
        } else {
            None
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek(), Some(Token::Eof) | None)
    }
}

fn method_named(name: &str) -> Method {
    match name.to_ascii_lowercase().as_str() {
        "contains" => Method::Contains,
        "startswith" | "starts_with" => Method::StartsWith,
        "value" => Method::FieldValue,
        _ => Method::Other(name.to_string()),
    }
}
