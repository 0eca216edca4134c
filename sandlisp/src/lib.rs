extern crate lexers;

mod bridge;
mod builtin;
mod config;
mod env;
mod eval;
mod expr;
mod guard;
mod interpreter;
mod parser;
mod procedure;

pub use bridge::{BridgeError, BridgeRegistry, HostFn, HostModule};
pub use builtin::builtins;
pub use config::Config;
pub use env::Environment;
pub use eval::{EvalErr, Evaluator, SPECIAL_FORMS};
pub use expr::{LispExpr, List, MAX_LIST_DEPTH};
pub use guard::ExecutionGuard;
pub use interpreter::Interpreter;
pub use parser::{ParseError, Parser, MAX_PARSE_DEPTH};
pub use procedure::{BridgeCall, Fp, Procedure};
