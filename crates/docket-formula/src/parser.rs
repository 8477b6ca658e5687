//! Arithmetic parser
//!
//! A recursive descent parser over numbers, parentheses and the
//! `+ - * / < <= > >= == != ! && ||` operators, with conventional precedence.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};

/// Default bound on how deeply an expression may nest
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 256;

/// Parse arithmetic text into an AST
///
/// # Example
/// ```rust
/// use docket_formula::parse_arithmetic;
///
/// let ast = parse_arithmetic("2+3*4").unwrap();
/// let ast = parse_arithmetic("(1 + 2) >= 3 && !0").unwrap();
/// ```
pub fn parse_arithmetic(text: &str) -> FormulaResult<FormulaExpr> {
    parse_arithmetic_with_depth(text, DEFAULT_MAX_NESTING_DEPTH)
}

/// Parse arithmetic text, rejecting parentheses, unary operators or operator
/// chains nested deeper than `max_depth`
pub fn parse_arithmetic_with_depth(text: &str, max_depth: usize) -> FormulaResult<FormulaExpr> {
    let mut parser = ArithmeticParser::new(text.trim(), max_depth)?;
    let expr = parser.parse_expression()?.expr;

    if parser.current_token() != &Token::Eof {
        return Err(FormulaError::Parse(format!(
            "Unexpected {:?} after expression in '{}'",
            parser.current_token(),
            text
        )));
    }

    Ok(expr)
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),

    Plus,
    Minus,
    Star,
    Slash,
    Bang,
    AndAnd,
    OrOr,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    LeftParen,
    RightParen,

    Eof,
}

/// Parsed expression with the height of its tree
struct Subtree {
    expr: FormulaExpr,
    height: usize,
}

impl Subtree {
    fn leaf(expr: FormulaExpr) -> Self {
        Self { expr, height: 1 }
    }
}

struct ArithmeticParser<'a> {
    input: &'a str,
    pos: usize,
    current_token: Token,
    depth: usize,
    max_depth: usize,
}

impl<'a> ArithmeticParser<'a> {
    fn new(input: &'a str, max_depth: usize) -> FormulaResult<Self> {
        let mut parser = Self {
            input,
            pos: 0,
            current_token: Token::Eof,
            depth: 0,
            max_depth,
        };
        parser.advance_token()?;
        Ok(parser)
    }

    // === Token scanning ===

    fn advance_token(&mut self) -> FormulaResult<()> {
        self.current_token = self.scan_token()?;
        Ok(())
    }

    fn scan_token(&mut self) -> FormulaResult<Token> {
        self.skip_whitespace();

        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        let leading_point = c == '.' && self.peek_char_at(1).is_some_and(|c| c.is_ascii_digit());
        if c.is_ascii_digit() || leading_point {
            return Ok(self.scan_number());
        }

        self.advance();
        let token = match c {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            '&' if self.eat('&') => Token::AndAnd,
            '|' if self.eat('|') => Token::OrOr,
            '=' if self.eat('=') => {
                // `===` compares the same way as `==` here
                self.eat('=');
                Token::Equal
            }
            '!' if self.eat('=') => {
                self.eat('=');
                Token::NotEqual
            }
            '!' => Token::Bang,
            '<' if self.eat('=') => Token::LessEqual,
            '<' => Token::LessThan,
            '>' if self.eat('=') => Token::GreaterEqual,
            '>' => Token::GreaterThan,
            other => {
                return Err(FormulaError::Parse(format!(
                    "Unexpected character '{}' at {} in '{}'",
                    other,
                    self.pos - other.len_utf8(),
                    self.input
                )))
            }
        };
        Ok(token)
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;

        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        if matches!(self.peek_char(), Some('e' | 'E')) {
            let digits_at = match self.peek_char_at(1) {
                Some('+' | '-') => 2,
                _ => 1,
            };
            if self.peek_char_at(digits_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digits_at {
                    self.advance();
                }
                while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let num_str = &self.input[start..self.pos];
        Token::Number(num_str.parse().unwrap_or(0.0))
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn current_token(&self) -> &Token {
        &self.current_token
    }

    fn consume(&mut self) -> FormulaResult<Token> {
        let token = std::mem::replace(&mut self.current_token, Token::Eof);
        self.advance_token()?;
        Ok(token)
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current_token() == expected {
            self.consume()?;
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "Expected {:?}, got {:?}",
                expected,
                self.current_token()
            )))
        }
    }

    // === Nesting bounds ===

    fn enter(&mut self) -> FormulaResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(FormulaError::NestingTooDeep(self.max_depth));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn node(&self, expr: FormulaExpr, height: usize) -> FormulaResult<Subtree> {
        if height > self.max_depth {
            return Err(FormulaError::NestingTooDeep(self.max_depth));
        }
        Ok(Subtree { expr, height })
    }

    fn binary_node(
        &self,
        op: BinaryOperator,
        left: Subtree,
        right: Subtree,
    ) -> FormulaResult<Subtree> {
        let height = left.height.max(right.height) + 1;
        self.node(binary(op, left.expr, right.expr), height)
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Logical or: ||
    // 2. Logical and: &&
    // 3. Equality: ==, !=
    // 4. Relational: <, <=, >, >=
    // 5. Addition/Subtraction: +, -
    // 6. Multiplication/Division: *, /
    // 7. Unary: -, +, !
    // 8. Primary: numbers, parentheses

    fn parse_expression(&mut self) -> FormulaResult<Subtree> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> FormulaResult<Subtree> {
        let mut left = self.parse_and()?;

        while matches!(self.current_token(), Token::OrOr) {
            self.consume()?;
            let right = self.parse_and()?;
            left = self.binary_node(BinaryOperator::Or, left, right)?;
        }

        Ok(left)
    }

    fn parse_and(&mut self) -> FormulaResult<Subtree> {
        let mut left = self.parse_equality()?;

        while matches!(self.current_token(), Token::AndAnd) {
            self.consume()?;
            let right = self.parse_equality()?;
            left = self.binary_node(BinaryOperator::And, left, right)?;
        }

        Ok(left)
    }

    fn parse_equality(&mut self) -> FormulaResult<Subtree> {
        let mut left = self.parse_relational()?;

        loop {
            let op = match self.current_token() {
                Token::Equal => BinaryOperator::Equal,
                Token::NotEqual => BinaryOperator::NotEqual,
                _ => break,
            };

            self.consume()?;
            let right = self.parse_relational()?;
            left = self.binary_node(op, left, right)?;
        }

        Ok(left)
    }

    fn parse_relational(&mut self) -> FormulaResult<Subtree> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.current_token() {
                Token::LessThan => BinaryOperator::LessThan,
                Token::LessEqual => BinaryOperator::LessEqual,
                Token::GreaterThan => BinaryOperator::GreaterThan,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };

            self.consume()?;
            let right = self.parse_additive()?;
            left = self.binary_node(op, left, right)?;
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> FormulaResult<Subtree> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume()?;
            let right = self.parse_multiplicative()?;
            left = self.binary_node(op, left, right)?;
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<Subtree> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.consume()?;
            let right = self.parse_unary()?;
            left = self.binary_node(op, left, right)?;
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<Subtree> {
        let op = match self.current_token() {
            Token::Minus => UnaryOperator::Negate,
            Token::Plus => UnaryOperator::Plus,
            Token::Bang => UnaryOperator::Not,
            _ => return self.parse_primary(),
        };

        self.consume()?;
        self.enter()?;
        let operand = self.parse_unary()?;
        self.leave();

        let height = operand.height + 1;
        self.node(
            FormulaExpr::UnaryOp {
                op,
                operand: Box::new(operand.expr),
            },
            height,
        )
    }

    fn parse_primary(&mut self) -> FormulaResult<Subtree> {
        match self.current_token().clone() {
            Token::Number(n) => {
                self.consume()?;
                Ok(Subtree::leaf(FormulaExpr::Number(n)))
            }
            Token::LeftParen => {
                self.consume()?;
                self.enter()?;
                let inner = self.parse_expression()?;
                self.leave();
                self.expect(&Token::RightParen)?;
                Ok(inner)
            }
            token => Err(FormulaError::Parse(format!(
                "Unexpected {:?} in '{}'",
                token, self.input
            ))),
        }
    }
}

fn binary(op: BinaryOperator, left: FormulaExpr, right: FormulaExpr) -> FormulaExpr {
    FormulaExpr::BinaryOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}
