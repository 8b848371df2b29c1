// ABOUTME: Precedence-correct infix expression parser (§4.2)

use crate::ast::{BinaryOp, Expression, UnaryOp};
use crate::error::ParseError;

/// Parses a standalone expression. The entire remainder of `text` after the
/// expression must be whitespace (§4.2 "Contract").
pub fn parse_expression(text: &str) -> Result<Expression, ParseError> {
    let mut p = Parser::new(text);
    let expr = p.parse_binary_chain()?;
    p.skip_ws();
    if !p.at_end() {
        return Err(p.error("Syntax error"));
    }
    Ok(expr)
}

pub(crate) struct Parser {
    chars: Vec<char>,
    pos: usize,
    original: String,
}

impl Parser {
    pub(crate) fn new(text: &str) -> Self {
        Parser {
            chars: text.chars().collect(),
            pos: 0,
            original: text.to_string(),
        }
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    pub(crate) fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    pub(crate) fn error(&self, message: &str) -> ParseError {
        ParseError::new(message, self.original.clone(), self.pos, None)
    }

    pub(crate) fn parse_binary_chain(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            self.skip_ws();
            let save = self.pos;
            match self.try_consume_binary_op() {
                Some(op) => {
                    self.skip_ws();
                    let right = self.parse_unary()?;
                    left = combine(op, left, right);
                }
                None => {
                    self.pos = save;
                    break;
                }
            }
        }
        Ok(left)
    }

    fn try_consume_binary_op(&mut self) -> Option<BinaryOp> {
        const TWO_CHAR: &[&str] = &["**", "<=", ">=", "==", "!=", "&&", "||"];
        for tok in TWO_CHAR {
            if self.starts_with(tok) {
                self.pos += tok.chars().count();
                return BinaryOp::from_token(tok);
            }
        }
        const ONE_CHAR: &[char] = &['*', '/', '%', '+', '-', '<', '>'];
        if let Some(c) = self.peek() {
            if ONE_CHAR.contains(&c) {
                self.pos += 1;
                return BinaryOp::from_token(&c.to_string());
            }
        }
        None
    }

    fn starts_with(&self, tok: &str) -> bool {
        tok.chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c))
    }

    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        self.skip_ws();
        match self.peek() {
            Some('!') => {
                self.advance();
                let inner = self.parse_unary()?;
                Ok(Expression::Unary {
                    op: UnaryOp::Not,
                    expr: Box::new(inner),
                })
            }
            Some('-') => {
                self.advance();
                let inner = self.parse_unary()?;
                Ok(Expression::Unary {
                    op: UnaryOp::Neg,
                    expr: Box::new(inner),
                })
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        self.skip_ws();
        match self.peek() {
            Some('(') => {
                self.advance();
                let inner = self.parse_binary_chain()?;
                self.skip_ws();
                if self.peek() != Some(')') {
                    return Err(self.error("Unmatched parenthesis"));
                }
                self.advance();
                Ok(Expression::Group {
                    expr: Box::new(inner),
                })
            }
            Some('[') => self.parse_bracketed_variable(),
            Some(c) if c == '\'' || c == '"' => self.parse_string(),
            Some(c) if c.is_ascii_digit() => self.parse_number(),
            Some(c) if is_ident_start(c) => self.parse_identifier_or_call(),
            _ => Err(self.error("Syntax error")),
        }
    }

    fn parse_bracketed_variable(&mut self) -> Result<Expression, ParseError> {
        self.advance(); // consume '['
        let mut name = String::new();
        loop {
            match self.advance() {
                Some('\\') => match self.advance() {
                    Some(']') => name.push(']'),
                    Some('\\') => name.push('\\'),
                    Some(other) => {
                        name.push('\\');
                        name.push(other);
                    }
                    None => return Err(self.error("Unterminated bracketed variable")),
                },
                Some(']') => return Ok(Expression::Variable { name }),
                Some(c) => name.push(c),
                None => return Err(self.error("Unterminated bracketed variable")),
            }
        }
    }

    fn parse_string(&mut self) -> Result<Expression, ParseError> {
        let quote = self.advance().unwrap();
        let mut value = String::new();
        loop {
            match self.advance() {
                Some('\\') => match self.advance() {
                    Some('\\') => value.push('\\'),
                    Some(c) if c == quote => value.push(c),
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => return Err(self.error("Unterminated string literal")),
                },
                Some(c) if c == quote => return Ok(Expression::Str { value }),
                Some(c) => value.push(c),
                None => return Err(self.error("Unterminated string literal")),
            }
        }
    }

    fn parse_number(&mut self) -> Result<Expression, ParseError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.peek() == Some('.') && matches!(self.peek_at(1), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let mark = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.pos += 1;
            }
            if matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.pos += 1;
                }
            } else {
                self.pos = mark;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<f64>()
            .map(|value| Expression::Number { value })
            .map_err(|_| self.error("Invalid number literal"))
    }

    fn parse_identifier_or_call(&mut self) -> Result<Expression, ParseError> {
        let start = self.pos;
        self.pos += 1;
        while matches!(self.peek(), Some(c) if is_ident_continue(c)) {
            self.pos += 1;
        }
        let name: String = self.chars[start..self.pos].iter().collect();
        self.skip_ws();
        if self.peek() == Some('(') {
            self.advance();
            let mut args = Vec::new();
            self.skip_ws();
            if self.peek() != Some(')') {
                loop {
                    args.push(self.parse_binary_chain()?);
                    self.skip_ws();
                    match self.peek() {
                        Some(',') => {
                            self.advance();
                        }
                        Some(')') => break,
                        _ => return Err(self.error("Syntax error")),
                    }
                }
            }
            self.skip_ws();
            if self.peek() != Some(')') {
                return Err(self.error("Unmatched parenthesis"));
            }
            self.advance();
            Ok(Expression::Function { name, args })
        } else {
            Ok(Expression::Variable { name })
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Rotates the newly-formed binary node down the right spine of `left` when
/// `op` binds tighter than `left`'s own operator, per §4.2's re-ordering
/// rule. `**` is special-cased to rotate against itself too, since its
/// "binds tighter than" set includes everything but `**` — without this, a
/// chain of `**` would stay left-associative like the other equal-precedence
/// operator chains.
fn combine(op: BinaryOp, left: Expression, right: Expression) -> Expression {
    match left {
        Expression::Binary {
            op: lop,
            left: ll,
            right: lr,
        } if binds_tighter(op, lop) => {
            let new_right = combine(op, *lr, right);
            Expression::Binary {
                op: lop,
                left: ll,
                right: Box::new(new_right),
            }
        }
        other => Expression::Binary {
            op,
            left: Box::new(other),
            right: Box::new(right),
        },
    }
}

fn binds_tighter(op: BinaryOp, lop: BinaryOp) -> bool {
    if op == BinaryOp::Pow && lop == BinaryOp::Pow {
        true
    } else {
        op.precedence() > lop.precedence()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binop<'a>(e: &'a Expression) -> (&'a BinaryOp, &'a Expression, &'a Expression) {
        match e {
            Expression::Binary { op, left, right } => (op, left, right),
            _ => panic!("expected Binary"),
        }
    }

    #[test]
    fn precedence_nests_multiplication_inside_addition() {
        let e = parse_expression("1 + 2 * 3").unwrap();
        let (op, _left, right) = binop(&e);
        assert_eq!(*op, BinaryOp::Add);
        let (rop, _, _) = binop(right);
        assert_eq!(*rop, BinaryOp::Mul);
    }

    #[test]
    fn pow_is_right_associative() {
        let e = parse_expression("2 ** 3 ** 2").unwrap();
        let (op, left, right) = binop(&e);
        assert_eq!(*op, BinaryOp::Pow);
        assert!(matches!(**left, Expression::Number { value } if value == 2.0));
        let (rop, _, _) = binop(right);
        assert_eq!(*rop, BinaryOp::Pow);
    }

    #[test]
    fn equal_precedence_chain_stays_left_associative() {
        let e = parse_expression("1 - 2 - 3").unwrap();
        let (op, left, _right) = binop(&e);
        assert_eq!(*op, BinaryOp::Sub);
        assert!(matches!(**left, Expression::Binary { op: BinaryOp::Sub, .. }));
    }

    #[test]
    fn function_call_parses_args() {
        let e = parse_expression("max(1, 2, 3)").unwrap();
        match e {
            Expression::Function { name, args } => {
                assert_eq!(name, "max");
                assert_eq!(args.len(), 3);
            }
            _ => panic!("expected Function"),
        }
    }

    #[test]
    fn trailing_text_is_an_error() {
        assert!(parse_expression("1 + 2 foo").is_err());
    }

    #[test]
    fn unmatched_paren_is_an_error() {
        assert!(parse_expression("(1 + 2").is_err());
    }

    #[test]
    fn string_escapes() {
        let e = parse_expression(r#"'it\'s'"#).unwrap();
        assert!(matches!(e, Expression::Str { value } if value == "it's"));
    }
}
