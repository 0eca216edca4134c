mod scanner;
mod lisp_tokenizer;

pub use scanner::{Position, Scanner};
pub use lisp_tokenizer::{tokenize, LexError, LispToken, LispTokenizer, Token};
