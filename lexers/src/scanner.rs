/// Where a character sits in the source, both 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn start() -> Self {
        Position{line: 1, column: 1}
    }

    fn after(self, c: char) -> Self {
        match c {
            '\n' => Position{line: self.line + 1, column: 1},
            _ => Position{line: self.line, column: self.column + 1},
        }
    }
}

/// A backtracking character scanner that remembers the position of every
/// character it has buffered. Characters between the last `ignore` and
/// the current position form the lexeme being scanned.
pub struct Scanner<I: Iterator<Item=char>> {
    src: I,
    buf: Vec<(char, Position)>,
    pos: isize,
    // position the next character pulled from src will carry
    upcoming: Position,
}

impl<I: Iterator<Item=char>> Iterator for Scanner<I> {
    type Item = char;
    fn next(&mut self) -> Option<char> {
        self.pos += 1;
        self.prep_buffer();
        let blen = self.buf.len() as isize;
        if self.pos >= blen {
            self.pos = blen;
        }
        self.curr()
    }
}

impl<'a> Scanner<std::str::Chars<'a>> {
    pub fn from_str(source: &'a str) -> Self {
        Scanner::new(source.chars())
    }
}

impl<I: Iterator<Item=char>> Scanner<I> {
    pub fn new(source: I) -> Scanner<I> {
        Scanner{src: source, buf: Vec::new(), pos: -1, upcoming: Position::start()}
    }

    pub fn pos(&self) -> isize { self.pos }

    pub fn set_pos(&mut self, pos: isize) -> bool {
        if pos < -1 || pos > (self.buf.len() as isize) {
            return false;
        }
        self.pos = pos;
        true
    }

    pub fn curr(&self) -> Option<char> {
        let pos = self.pos as usize;
        if self.pos < 0 || pos >= self.buf.len() {
            return None;
        }
        Some(self.buf[pos].0)
    }

    // try to get enough elements in the buffer for self.pos
    fn prep_buffer(&mut self) {
        while self.pos >= (self.buf.len() as isize) {
            match self.src.next() {
                Some(c) => {
                    self.buf.push((c, self.upcoming));
                    self.upcoming = self.upcoming.after(c);
                },
                None => break,
            }
        }
    }

    pub fn peek(&mut self) -> Option<char> {
        let backtrack = self.pos;
        let peeked = self.next();
        self.pos = backtrack;
        peeked
    }

    /// Position of the first character of the lexeme being scanned, or of
    /// the next character if nothing has been consumed since `ignore`.
    pub fn lexeme_start(&mut self) -> Position {
        if self.buf.is_empty() {
            self.prep_buffer_one();
        }
        self.buf.first().map(|&(_, p)| p).unwrap_or(self.upcoming)
    }

    fn prep_buffer_one(&mut self) {
        let backtrack = self.pos;
        self.pos = 0;
        self.prep_buffer();
        self.pos = backtrack;
    }

    /// Drop everything up to and including the current character.
    pub fn ignore(&mut self) {
        if self.pos >= 0 {
            let n = ((self.pos + 1) as usize).min(self.buf.len());
            self.buf.drain(..n);
        }
        self.pos = -1;
    }

    pub fn extract_string(&mut self) -> String {
        let n = ((self.pos + 1).max(0) as usize).min(self.buf.len());
        let lexeme = self.buf[..n].iter().map(|&(c, _)| c).collect();
        self.ignore();
        lexeme
    }

    pub fn accept(&mut self, what: char) -> bool {
        let backtrack = self.pos();
        if self.next() == Some(what) { return true; }
        self.set_pos(backtrack);
        false
    }

    // Advance the scanner only if the next char is in the 'any' set,
    // self.curr() will return the matched char if accept matched any
    pub fn accept_any(&mut self, any: &[char]) -> Option<char> {
        let backtrack = self.pos();
        if let Some(next) = self.next() {
            if any.contains(&next) { return Some(next); }
        }
        self.set_pos(backtrack);
        None
    }

    // Skip over the 'over' set, result is if the scanner was advanced
    pub fn skip_all(&mut self, over: &[char]) -> bool {
        let mut advanced = false;
        while self.accept_any(over).is_some() { advanced = true; }
        advanced
    }

    // Advance until an element in the 'any' set or EOF is next,
    // return if the scanner advanced
    pub fn until_any(&mut self, any: &[char]) -> bool {
        let mut advanced = false;
        while let Some(next) = self.peek() {
            if any.contains(&next) { break; }
            self.next();
            advanced = true;
        }
        advanced
    }
}

///////////////////////////////////////////////////////////////////////////////
