use crate::scanner::{Position, Scanner};

static WHITE: &[char] = &[' ', '\n', '\r', '\t'];
static DIGITS: &[char] = &['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];
// chars that end a symbol
static DELIMS: &[char] = &[' ', '\n', '\r', '\t', '(', ')', '"', ';'];

#[derive(Clone, PartialEq, Debug)]
pub enum LispToken {
    OParen, CParen,
    Symbol(String),
    Number(f64),
    String(String),
    EOF,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Token {
    pub token: LispToken,
    pub line: usize,
    pub column: usize,
}

#[derive(thiserror::Error, Clone, PartialEq, Debug)]
#[error("line {line}, column {column}: {message}")]
pub struct LexError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

pub struct LispTokenizer<I: Iterator<Item=char>> {
    src: Scanner<I>,
    done: bool,
}

impl<'a> LispTokenizer<std::str::Chars<'a>> {
    pub fn from_str(source: &'a str) -> Self {
        LispTokenizer{src: Scanner::from_str(source), done: false}
    }
}

/// Split `source` into tokens. The result always ends in a single `EOF`.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    LispTokenizer::from_str(source).collect()
}

impl<I: Iterator<Item=char>> LispTokenizer<I> {
    // whitespace and ';' comments up to the end of line
    fn skip_blanks(&mut self) {
        loop {
            self.src.skip_all(WHITE);
            if !self.src.accept(';') { break; }
            self.src.until_any(&['\n']);
        }
        self.src.ignore();
    }

    fn starts_number(&mut self) -> bool {
        let backtrack = self.src.pos();
        self.src.accept('-');
        let digit = self.src.peek().map_or(false, |c| DIGITS.contains(&c));
        self.src.set_pos(backtrack);
        digit
    }

    // digits with at most one '.', the sign was already checked
    fn scan_number(&mut self) -> LispToken {
        self.src.accept('-');
        self.src.skip_all(DIGITS);
        if self.src.accept('.') {
            self.src.skip_all(DIGITS);
        }
        let lexeme = self.src.extract_string();
        match lexeme.parse::<f64>() {
            Ok(n) => LispToken::Number(n),
            Err(_) => LispToken::Symbol(lexeme),
        }
    }

    fn scan_string(&mut self, start: Position) -> Result<LispToken, LexError> {
        let unterminated = || LexError{
            line: start.line, column: start.column,
            message: "Unterminated string literal".to_string(),
        };
        self.src.accept('"');
        let mut value = String::new();
        loop {
            match self.src.next() {
                None => return Err(unterminated()),
                Some('"') => break,
                Some('\\') => match self.src.next() {
                    None => return Err(unterminated()),
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some(other) => value.push(other),
                },
                Some(c) => value.push(c),
            }
        }
        self.src.ignore();
        Ok(LispToken::String(value))
    }

    fn scan_token(&mut self) -> Result<Token, LexError> {
        self.skip_blanks();
        let start = self.src.lexeme_start();
        let token = match self.src.peek() {
            None => {
                self.done = true;
                LispToken::EOF
            },
            Some('(') => {
                self.src.next();
                self.src.ignore();
                LispToken::OParen
            },
            Some(')') => {
                self.src.next();
                self.src.ignore();
                LispToken::CParen
            },
            Some('"') => self.scan_string(start)?,
            Some(_) if self.starts_number() => self.scan_number(),
            Some(_) => {
                self.src.until_any(DELIMS);
                LispToken::Symbol(self.src.extract_string())
            },
        };
        Ok(Token{token, line: start.line, column: start.column})
    }
}

impl<I: Iterator<Item=char>> Iterator for LispTokenizer<I> {
    type Item = Result<Token, LexError>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let token = self.scan_token();
        if token.is_err() {
            self.done = true;
        }
        Some(token)
    }
}

///////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{tokenize, LexError, LispToken, Token};

    fn kinds(source: &str) -> Vec<LispToken> {
        tokenize(source).unwrap().into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn lisp_tokens() {
        assert_eq!(kinds("(+ 3 4.5 -5)"), vec![
            LispToken::OParen, LispToken::Symbol("+".into()),
            LispToken::Number(3.0), LispToken::Number(4.5),
            LispToken::Number(-5.0), LispToken::CParen, LispToken::EOF,
        ]);
        assert_eq!(kinds("(null? x) (<= a b)"), vec![
            LispToken::OParen, LispToken::Symbol("null?".into()),
            LispToken::Symbol("x".into()), LispToken::CParen,
            LispToken::OParen, LispToken::Symbol("<=".into()),
            LispToken::Symbol("a".into()), LispToken::Symbol("b".into()),
            LispToken::CParen, LispToken::EOF,
        ]);
    }

    #[test]
    fn minus_is_a_symbol_unless_a_digit_follows() {
        assert_eq!(kinds("- -x -1"), vec![
            LispToken::Symbol("-".into()), LispToken::Symbol("-x".into()),
            LispToken::Number(-1.0), LispToken::EOF,
        ]);
    }

    #[test]
    fn numbers_are_read_greedily() {
        assert_eq!(kinds("1.2.3 12abc"), vec![
            LispToken::Number(1.2), LispToken::Symbol(".3".into()),
            LispToken::Number(12.0), LispToken::Symbol("abc".into()),
            LispToken::EOF,
        ]);
    }

    #[test]
    fn comments_and_positions() {
        let tokens = tokenize("; header\n  (x ; trailing\n y)").unwrap();
        assert_eq!(tokens, vec![
            Token{token: LispToken::OParen, line: 2, column: 3},
            Token{token: LispToken::Symbol("x".into()), line: 2, column: 4},
            Token{token: LispToken::Symbol("y".into()), line: 3, column: 2},
            Token{token: LispToken::CParen, line: 3, column: 3},
            Token{token: LispToken::EOF, line: 3, column: 4},
        ]);
    }

    #[test]
    fn string_escapes() {
        assert_eq!(kinds(r#""a\n\t\"q\"\\ \z""#), vec![
            LispToken::String("a\n\t\"q\"\\ z".into()), LispToken::EOF,
        ]);
    }

    #[test]
    fn unterminated_string_points_at_opening_quote() {
        assert_eq!(tokenize("(def x\n  \"abc"), Err(LexError{
            line: 2, column: 3,
            message: "Unterminated string literal".into(),
        }));
    }

    #[test]
    fn empty_source_is_just_eof() {
        assert_eq!(tokenize("  ; nothing\n").unwrap(),
                   vec![Token{token: LispToken::EOF, line: 2, column: 1}]);
    }
}
