use crate::expr::{LispExpr, MAX_LIST_DEPTH};
use lexers::{LexError, LispToken, Token};
use std::iter::Peekable;
use std::vec::IntoIter;

/// Deepest list nesting accepted, the parser recurses once per level.
pub const MAX_PARSE_DEPTH: usize = MAX_LIST_DEPTH;

#[derive(thiserror::Error, Clone, PartialEq, Debug)]
#[error("Parse error at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    fn at(token: &Token, message: &str) -> Self {
        ParseError{line: token.line, column: token.column, message: message.to_string()}
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError{line: err.line, column: err.column, message: err.message}
    }
}

/* Grammar:
 *
 *  program    := expression* EOF ;
 *  expression := atom | list ;
 *  list       := "(" expression* ")" ;
 *  atom       := NUMBER | STRING | SYMBOL ;
 */
pub struct Parser {
    tokens: Peekable<IntoIter<Token>>,
    // where to blame a missing EOF token
    last: Token,
    depth: usize,
}

impl Parser {
    pub fn parse_str(source: &str) -> Result<Vec<LispExpr>, ParseError> {
        Self::parse(lexers::tokenize(source)?)
    }

    pub fn parse(tokens: Vec<Token>) -> Result<Vec<LispExpr>, ParseError> {
        let last = tokens.last().cloned()
            .unwrap_or(Token{token: LispToken::EOF, line: 1, column: 1});
        let mut parser = Parser{tokens: tokens.into_iter().peekable(), last, depth: 0};
        let mut program = Vec::new();
        while !parser.at_eof() {
            program.push(parser.expression()?);
        }
        Ok(program)
    }

    fn at_eof(&mut self) -> bool {
        matches!(self.tokens.peek(), None | Some(Token{token: LispToken::EOF, ..}))
    }

    fn next(&mut self) -> Token {
        self.tokens.next().unwrap_or_else(|| Token{token: LispToken::EOF, ..self.last.clone()})
    }

    fn expression(&mut self) -> Result<LispExpr, ParseError> {
        let token = self.next();
        match token.token {
            LispToken::EOF => Err(ParseError::at(&token, "Unexpected end of input")),
            LispToken::CParen => Err(ParseError::at(&token, "Unexpected )")),
            LispToken::Number(n) => Ok(LispExpr::Number(n)),
            LispToken::String(ref s) => Ok(LispExpr::String(s.clone())),
            LispToken::Symbol(ref s) => Ok(LispExpr::Symbol(s.clone())),
            LispToken::OParen => self.list(&token),
        }
    }

    fn list(&mut self, open: &Token) -> Result<LispExpr, ParseError> {
        if self.depth >= MAX_PARSE_DEPTH {
            return Err(ParseError::at(open, "Expression nested too deeply"));
        }
        self.depth += 1;
        let mut list = Vec::new();
        loop {
            if self.at_eof() {
                return Err(ParseError::at(open, "Unexpected end of input, expected )"));
            }
            if let Some(Token{token: LispToken::CParen, ..}) = self.tokens.peek() {
                self.tokens.next(); // get over that CParen
                break;
            }
            list.push(self.expression()?);
        }
        self.depth -= 1;
        Ok(LispExpr::list(list))
    }
}
