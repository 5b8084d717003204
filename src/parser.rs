// I found https://matklad.github.io/2020/04/13/simple-but-powerful-pratt-parsing.html
// to be a very helpful guide to writing a Pratt parser in Rust.

use thiserror::Error;

use crate::ast::{BlockStatement, Expression, InfixOperator, PrefixOperator, Program, Statement};
use crate::token::{Token, TokenKind};

/// The first thing that went wrong while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A specific token kind was required.
    #[error("expected {expected}, found {found} {literal:?}")]
    Expected {
        /// What the grammar needed here.
        expected: TokenKind,
        /// What was there instead.
        found: TokenKind,
        /// Its text.
        literal: String,
    },
    /// The token can't start an expression.
    #[error("no expression starts with {found} {literal:?}")]
    NoPrefix {
        /// What was there.
        found: TokenKind,
        /// Its text.
        literal: String,
    },
    /// An integer literal that doesn't fit in 64 bits.
    #[error("could not parse {0:?} as integer")]
    InvalidInteger(String),
    /// The scanner produced an illegal token.
    #[error("illegal token {0:?}")]
    Illegal(String),
    /// Expressions nest deeper than the parser is willing to recurse.
    #[error("expression nested deeper than {0} levels")]
    TooDeep(usize),
}

/// How many expressions may enclose one another.
pub const MAX_DEPTH: usize = 256;

mod precedence {
    // Comparable binding powers, lowest first; deriving Ord gives us the ordering.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    pub enum Precedence {
        Bottom,
        Or,
        And,
        Equality,
        Comparison,
        Sum,
        Product,
        Prefix,
        Call,
        Index,
        Top,
    }
    use Precedence::*;

    impl Precedence {
        pub fn next(&self) -> Precedence {
            match self {
                Bottom => Or,
                Or => And,
                And => Equality,
                Equality => Comparison,
                Comparison => Sum,
                Sum => Product,
                Product => Prefix,
                Prefix => Call,
                Call => Index,
                Index => Top,
                Top => Top,
            }
        }
    }

    use crate::token::TokenKind;

    pub fn infix_precedence(kind: TokenKind) -> Option<Precedence> {
        match kind {
            TokenKind::Or => Some(Or),
            TokenKind::And => Some(And),
            TokenKind::Eq | TokenKind::NotEq => Some(Equality),
            TokenKind::Lt | TokenKind::LtEq | TokenKind::Gt | TokenKind::GtEq => Some(Comparison),
            TokenKind::Plus | TokenKind::Minus => Some(Sum),
            TokenKind::Asterisk | TokenKind::Slash => Some(Product),
            TokenKind::LParen => Some(Call),
            TokenKind::LBracket => Some(Index),
            _ => None,
        }
    }
}

use precedence::*;

fn infix_operator(kind: TokenKind) -> Option<InfixOperator> {
    let operator = match kind {
        TokenKind::Plus => InfixOperator::Plus,
        TokenKind::Minus => InfixOperator::Minus,
        TokenKind::Asterisk => InfixOperator::Multiply,
        TokenKind::Slash => InfixOperator::Divide,
        TokenKind::Eq => InfixOperator::Equal,
        TokenKind::NotEq => InfixOperator::NotEqual,
        TokenKind::Lt => InfixOperator::Less,
        TokenKind::LtEq => InfixOperator::LessEqual,
        TokenKind::Gt => InfixOperator::Greater,
        TokenKind::GtEq => InfixOperator::GreaterEqual,
        TokenKind::And => InfixOperator::And,
        TokenKind::Or => InfixOperator::Or,
        _ => return None,
    };
    Some(operator)
}

/// Parser takes a source of tokens and builds the syntax tree.
#[derive(Debug)]
pub struct Parser<'a, T> {
    tokens: T,
    current_token: Token<'a>,
    depth: usize,
}

impl<'a, T> Parser<'a, T>
where
    T: Iterator<Item = Token<'a>>,
{
    /// A parser positioned at the first token.
    pub fn new(mut tokens: T) -> Self {
        let current_token = next_or_eof(&mut tokens);
        Parser {
            tokens,
            current_token,
            depth: 0,
        }
    }

    /// Parse statements until EOF.
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut program = Program::default();
        while !self.at(TokenKind::Eof) {
            program.statements.push(self.statement()?);
        }
        Ok(program)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current_token.kind == kind
    }

    fn advance(&mut self) -> Token<'a> {
        let next = next_or_eof(&mut self.tokens);
        std::mem::replace(&mut self.current_token, next)
    }

    fn consume(&mut self, expected: TokenKind) -> Result<Token<'a>, ParseError> {
        if self.at(expected) {
            Ok(self.advance())
        } else {
            Err(ParseError::Expected {
                expected,
                found: self.current_token.kind,
                literal: self.current_token.literal.to_string(),
            })
        }
    }

    fn skip_semicolon(&mut self) {
        if self.at(TokenKind::Semicolon) {
            self.advance();
        }
    }

    fn statement(&mut self) -> Result<Statement, ParseError> {
        let statement = match self.current_token.kind {
            TokenKind::Let => {
                self.advance();
                let name = self.consume(TokenKind::Ident)?.literal.into_owned();
                self.consume(TokenKind::Assign)?;
                let value = self.expression()?;
                Statement::Let { name, value }
            }
            TokenKind::Return => {
                self.advance();
                Statement::Return(self.expression()?)
            }
            _ => Statement::Expression(self.expression()?),
        };
        self.skip_semicolon();
        Ok(statement)
    }

    fn block(&mut self) -> Result<BlockStatement, ParseError> {
        self.consume(TokenKind::LBrace)?;
        let mut block = BlockStatement::default();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            block.statements.push(self.statement()?);
        }
        self.consume(TokenKind::RBrace)?;
        Ok(block)
    }

    fn expression(&mut self) -> Result<Expression, ParseError> {
        self.expression_with_min_prec(Precedence::Bottom)
    }

    // Every nested expression passes through here, so this is where depth is counted.
    fn expression_with_min_prec(
        &mut self,
        min_precedence: Precedence,
    ) -> Result<Expression, ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let result = self.infix_loop(min_precedence);
        self.depth -= 1;
        result
    }

    // Consume one expression whose infix operators all bind at least as tightly as
    // `min_precedence`; operators of equal precedence associate to the left.
    fn infix_loop(&mut self, min_precedence: Precedence) -> Result<Expression, ParseError> {
        let mut left = self.prefix()?;

        loop {
            let next_kind = self.current_token.kind;
            let prec = match infix_precedence(next_kind) {
                Some(prec) => prec,
                None => break,
            };
            if prec < min_precedence {
                break;
            }
            self.advance();

            left = match next_kind {
                TokenKind::LParen => Expression::Call {
                    function: Box::new(left),
                    arguments: self.expression_list(TokenKind::RParen)?,
                },
                TokenKind::LBracket => {
                    let index = self.expression()?;
                    self.consume(TokenKind::RBracket)?;
                    Expression::Index {
                        left: Box::new(left),
                        index: Box::new(index),
                    }
                }
                _ => {
                    let right = self.expression_with_min_prec(prec.next())?;
                    // infix_precedence only knows operator tokens and the two above.
                    let operator = infix_operator(next_kind).ok_or(ParseError::NoPrefix {
                        found: next_kind,
                        literal: next_kind.literal().unwrap_or_default().to_string(),
                    })?;
                    Expression::Infix {
                        left: Box::new(left),
                        operator,
                        right: Box::new(right),
                    }
                }
            };
        }
        Ok(left)
    }

    fn prefix(&mut self) -> Result<Expression, ParseError> {
        let token = self.advance();
        let expression = match token.kind {
            TokenKind::Ident => Expression::Identifier(token.literal.into_owned()),
            TokenKind::Int => {
                let value = token
                    .literal
                    .parse()
                    .map_err(|_| ParseError::InvalidInteger(token.literal.to_string()))?;
                Expression::IntegerLiteral(value)
            }
            TokenKind::String => {
                let text = token.literal.trim_start_matches('"').trim_end_matches('"');
                Expression::StringLiteral(text.to_string())
            }
            TokenKind::True => Expression::BooleanLiteral(true),
            TokenKind::False => Expression::BooleanLiteral(false),
            TokenKind::Bang | TokenKind::Minus => {
                let operator = if token.kind == TokenKind::Bang {
                    PrefixOperator::Bang
                } else {
                    PrefixOperator::Minus
                };
                let right = self.expression_with_min_prec(Precedence::Prefix)?;
                Expression::Prefix {
                    operator,
                    right: Box::new(right),
                }
            }
            TokenKind::LParen => {
                // parens reset the precedence
                let inner = self.expression()?;
                self.consume(TokenKind::RParen)?;
                inner
            }
            TokenKind::If => self.if_expression()?,
            TokenKind::Function => self.function_literal()?,
            TokenKind::LBracket => {
                Expression::ArrayLiteral(self.expression_list(TokenKind::RBracket)?)
            }
            TokenKind::LBrace => self.map_literal()?,
            TokenKind::Illegal => return Err(ParseError::Illegal(token.literal.into_owned())),
            kind => {
                return Err(ParseError::NoPrefix {
                    found: kind,
                    literal: token.literal.into_owned(),
                })
            }
        };
        Ok(expression)
    }

    // Comma-separated expressions up to `end`; the opening token is already consumed.
    fn expression_list(&mut self, end: TokenKind) -> Result<Vec<Expression>, ParseError> {
        let mut items = Vec::new();
        if self.at(end) {
            self.advance();
            return Ok(items);
        }
        loop {
            items.push(self.expression()?);
            if self.at(TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.consume(end)?;
        Ok(items)
    }

    fn if_expression(&mut self) -> Result<Expression, ParseError> {
        self.consume(TokenKind::LParen)?;
        let condition = self.expression()?;
        self.consume(TokenKind::RParen)?;
        let consequence = self.block()?;
        let alternative = if self.at(TokenKind::Else) {
            self.advance();
            Some(self.block()?)
        } else {
            None
        };
        Ok(Expression::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn function_literal(&mut self) -> Result<Expression, ParseError> {
        self.consume(TokenKind::LParen)?;
        let mut parameters = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                parameters.push(self.consume(TokenKind::Ident)?.literal.into_owned());
                if self.at(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.consume(TokenKind::RParen)?;
        let body = self.block()?;
        Ok(Expression::FunctionLiteral { parameters, body })
    }

    fn map_literal(&mut self) -> Result<Expression, ParseError> {
        let mut pairs = Vec::new();
        while !self.at(TokenKind::RBrace) {
            let key = self.expression()?;
            self.consume(TokenKind::Colon)?;
            let value = self.expression()?;
            pairs.push((key, value));
            if self.at(TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.consume(TokenKind::RBrace)?;
        Ok(Expression::MapLiteral(pairs))
    }
}

fn next_or_eof<'a, T: Iterator<Item = Token<'a>>>(tokens: &mut T) -> Token<'a> {
    tokens
        .next()
        .unwrap_or_else(|| Token::new(TokenKind::Eof, ""))
}

/// Take a source of tokens and parse it into a program, stopping at the first error.
pub fn parse<'a, T>(tokens: T) -> Result<Program, ParseError>
where
    T: Iterator<Item = Token<'a>>,
{
    Parser::new(tokens).parse_program()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scanner::Scanner;

    fn parse_str(text: &str) -> Program {
        parse(Scanner::new(text)).expect("parsing succeeds")
    }

    fn parse_err(text: &str) -> ParseError {
        parse(Scanner::new(text)).unwrap_err()
    }

    #[test]
    fn test_let_and_return() {
        let program = parse_str("let x = 5; let y = x; return y");
        assert_eq!(
            program.statements,
            vec![
                Statement::Let {
                    name: "x".to_string(),
                    value: Expression::IntegerLiteral(5)
                },
                Statement::Let {
                    name: "y".to_string(),
                    value: Expression::Identifier("x".to_string())
                },
                Statement::Return(Expression::Identifier("y".to_string())),
            ]
        );
    }

    #[test]
    fn test_operator_precedence() {
        let cases = [
            ("-a * b", "((-a) * b)"),
            ("!-a", "(!(-a))"),
            ("a + b - c", "((a + b) - c)"),
            ("a + b * c + d / e - f", "(((a + (b * c)) + (d / e)) - f)"),
            ("5 > 4 == 3 < 4", "((5 > 4) == (3 < 4))"),
            ("3 + 4 * 5 == 3 * 1 + 4 * 5", "((3 + (4 * 5)) == ((3 * 1) + (4 * 5)))"),
            ("1 + (2 + 3) + 4", "((1 + (2 + 3)) + 4)"),
            ("a || b && c", "(a || (b && c))"),
            ("a <= b != true", "((a <= b) != true)"),
            ("a * [1, 2, 3, 4][b * c] * d", "((a * ([1, 2, 3, 4][(b * c)])) * d)"),
            ("add(a + b, c * d)", "add((a + b), (c * d))"),
            ("-f(x)[0]", "(-(f(x)[0]))"),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_str(input).to_string(), expected, "parsing {:?}", input);
        }
    }

    #[test]
    fn test_if_and_function() {
        let program = parse_str("if (x < y) { x } else { y; }");
        assert_eq!(program.to_string(), "if (x < y) { x } else { y }");
        let program = parse_str("fn(x, y) { x + y; }");
        assert_eq!(program.to_string(), "fn(x, y) { (x + y) }");
        let program = parse_str("fn() { 1 }()");
        assert_eq!(program.to_string(), "fn() { 1 }()");
    }

    #[test]
    fn test_literals() {
        let program = parse_str(r#""hello world"; true; false; [1, "two"]; {"a": 1, 2: true}; {}"#);
        assert_eq!(program.statements.len(), 6);
        assert_eq!(
            program.statements[0],
            Statement::Expression(Expression::StringLiteral("hello world".to_string()))
        );
        assert_eq!(
            program.to_string(),
            r#""hello world"truefalse[1, "two"]{"a": 1, 2: true}{}"#
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            parse_err("let = 5;"),
            ParseError::Expected {
                expected: TokenKind::Ident,
                found: TokenKind::Assign,
                literal: "=".to_string()
            }
        );
        assert_eq!(
            parse_err("(1 + 2"),
            ParseError::Expected {
                expected: TokenKind::RParen,
                found: TokenKind::Eof,
                literal: "".to_string()
            }
        );
        assert_eq!(
            parse_err("1 + ;"),
            ParseError::NoPrefix {
                found: TokenKind::Semicolon,
                literal: ";".to_string()
            }
        );
        assert_eq!(parse_err("1 @ 2"), ParseError::Illegal("@".to_string()));
        assert_eq!(
            parse_err("99999999999999999999"),
            ParseError::InvalidInteger("99999999999999999999".to_string())
        );
        assert_eq!(
            parse_err("if (true) { 1 ").to_string(),
            r#"expected RBRACE, found EOF """#
        );
    }

    fn nested(depth: usize, open: &str, inner: &str, close: &str) -> String {
        format!("{}{}{}", open.repeat(depth), inner, close.repeat(depth))
    }

    #[test]
    fn test_nesting_depth() {
        let program = parse_str(&nested(100, "(", "1", ")"));
        assert_eq!(
            program.statements,
            vec![Statement::Expression(Expression::IntegerLiteral(1))]
        );
        parse_str(&nested(100, "-", "1", ""));
        parse_str(&nested(50, "[", "1", "]"));

        assert_eq!(
            parse_err(&nested(10_000, "(", "1", ")")),
            ParseError::TooDeep(MAX_DEPTH)
        );
        assert_eq!(
            parse_err(&nested(10_000, "!", "true", "")),
            ParseError::TooDeep(MAX_DEPTH)
        );
        assert_eq!(
            parse_err(&nested(10_000, "if (true) { ", "1", " }")).to_string(),
            "expression nested deeper than 256 levels"
        );
        // Long flat chains don't nest.
        let chain = vec!["1"; 1_000].join(" + ");
        assert_eq!(parse_str(&chain).statements.len(), 1);
    }
}
