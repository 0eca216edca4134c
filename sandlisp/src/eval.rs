use crate::bridge::{BridgeError, BridgeRegistry};
use crate::env::Environment;
use crate::expr::LispExpr;
use crate::guard::ExecutionGuard;
use crate::parser::{ParseError, Parser};
use crate::procedure::{BridgeCall, Procedure};
use log::{debug, trace, warn};
use std::rc::Rc;
use std::time::Duration;

macro_rules! check {
    ($argcheck:expr, $err:expr) => {
        if ! $argcheck { return Err(EvalErr::Syntax($err.to_string())); }
    }
}

#[derive(thiserror::Error, Clone, PartialEq, Debug)]
pub enum EvalErr {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Undefined variable: {0}")]
    UndefinedVariable(String),
    #[error("Syntax error: {0}")]
    Syntax(String),
    #[error("Arity error: {0}")]
    Arity(String),
    #[error("Type error: {0}")]
    Type(String),
    #[error("Execution limit exceeded: {0}")]
    ExecutionLimitExceeded(String),
    #[error("Execution timeout: evaluation ran longer than {0:?}")]
    ExecutionTimeout(Duration),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl EvalErr {
    fn is_guard_failure(&self) -> bool {
        matches!(self, EvalErr::ExecutionLimitExceeded(_) | EvalErr::ExecutionTimeout(_))
    }
}

pub const SPECIAL_FORMS: &[&str] = &["def", "lambda", "if", "let", "set!", "begin", "quote"];

/// Walks expression trees. Every visited node is accounted for by the guard,
/// the bridge is only consulted by `call-js` and `call-wasm`.
pub struct Evaluator<'a> {
    guard: &'a mut ExecutionGuard,
    bridge: &'a BridgeRegistry,
}

impl<'a> Evaluator<'a> {
    pub fn new(guard: &'a mut ExecutionGuard, bridge: &'a BridgeRegistry) -> Self {
        Evaluator{guard, bridge}
    }

    /// Parse `source` and evaluate each top-level form in order, yielding
    /// the last value. Stops at the first failure, earlier definitions stay.
    pub fn eval_top_level(&mut self, source: &str,
                          env: &Rc<Environment>) -> Result<LispExpr, EvalErr> {
        self.guard.reset();
        let program = Parser::parse_str(source)?;
        debug!("evaluating {} top-level form(s)", program.len());
        let mut last = LispExpr::Nil;
        for expr in program.iter() {
            last = self.eval(expr, env).inspect_err(|err| {
                if err.is_guard_failure() {
                    warn!("evaluation aborted after {} operations ({:?}): {}",
                          self.guard.operations(), self.guard.elapsed(), err);
                }
            })?;
        }
        Ok(last)
    }

    pub fn eval(&mut self, expr: &LispExpr, env: &Rc<Environment>) -> Result<LispExpr, EvalErr> {
        self.guard.enter()?;
        let result = self.eval_step(expr, env);
        self.guard.leave();
        result
    }

    fn eval_step(&mut self, expr: &LispExpr, env: &Rc<Environment>) -> Result<LispExpr, EvalErr> {
        match expr {
            LispExpr::Symbol(sym) => env.get(sym),
            LispExpr::List(list) => match list.split_first() {
                None => Ok(expr.clone()),
                Some((LispExpr::Symbol(head), rest)) if SPECIAL_FORMS.contains(&head.as_str()) => {
                    trace!("special form {}", head);
                    self.special_form(head, rest, env)
                },
                Some((head, rest)) => {
                    let op = self.eval(head, env)?;
                    let args = rest.iter()
                        .map(|arg| self.eval(arg, env))
                        .collect::<Result<Vec<_>, _>>()?;
                    self.apply(&op, args)
                },
            },
            other => Ok(other.clone()),
        }
    }

    fn special_form(&mut self, form: &str, rest: &[LispExpr],
                    env: &Rc<Environment>) -> Result<LispExpr, EvalErr> {
        match form {
            "quote" => {
                check!(rest.len() == 1, "quote expects exactly one expression");
                Ok(rest[0].clone())
            },
            "if" => {
                check!(rest.len() == 2 || rest.len() == 3, "if expects a condition, a consequent and an optional alternative");
                if self.eval(&rest[0], env)?.is_truthy() {
                    self.eval(&rest[1], env)
                } else if let Some(alt) = rest.get(2) {
                    self.eval(alt, env)
                } else {
                    Ok(LispExpr::Nil)
                }
            },
            "def" => {
                check!(rest.len() == 2, "def expects a name and a value");
                let LispExpr::Symbol(var) = &rest[0] else {
                    return Err(EvalErr::Syntax(format!("def name must be a symbol, got {}", rest[0])));
                };
                let value = self.eval(&rest[1], env)?;
                env.define(var.clone(), value.clone());
                Ok(value)
            },
            "set!" => {
                check!(rest.len() == 2, "set! expects a name and a value");
                let LispExpr::Symbol(var) = &rest[0] else {
                    return Err(EvalErr::Syntax(format!("set! name must be a symbol, got {}", rest[0])));
                };
                let value = self.eval(&rest[1], env)?;
                env.set(var, value.clone())?;
                Ok(value)
            },
            "lambda" => {
                check!(rest.len() == 2, "lambda expects a parameter list and a body");
                let LispExpr::List(varlist) = &rest[0] else {
                    return Err(EvalErr::Syntax(format!("lambda parameters must be a list, got {}", rest[0])));
                };
                let mut vars = Vec::new();
                for var in varlist.iter() {
                    match var {
                        LispExpr::Symbol(v) => vars.push(v.clone()),
                        other => return Err(EvalErr::Syntax(
                            format!("lambda parameter must be a symbol, got {}", other))),
                    }
                }
                Ok(Procedure::new(vars, rest[1].clone(), env.clone()).into_expr())
            },
            "let" => {
                check!(rest.len() == 2, "let expects a binding list and a body");
                let bindings = let_bindings(&rest[0])?;
                // values see the outer scope only
                let mut frame = Vec::with_capacity(bindings.len());
                for (name, init) in bindings {
                    frame.push((name.to_string(), self.eval(init, env)?));
                }
                self.eval(&rest[1], &env.extend(frame))
            },
            "begin" => {
                check!(!rest.is_empty(), "begin expects at least one expression");
                let mut last = LispExpr::Nil;
                for expr in rest {
                    last = self.eval(expr, env)?;
                }
                Ok(last)
            },
            other => unreachable!("not a special form: {}", other),
        }
    }

    pub fn apply(&mut self, op: &LispExpr, args: Vec<LispExpr>) -> Result<LispExpr, EvalErr> {
        let LispExpr::Proc(proc) = op else {
            return Err(EvalErr::Type(format!("{} {} is not callable", op.type_name(), op)));
        };
        match proc.as_ref() {
            Procedure::Builtin { fp, .. } => fp(args.as_slice()),
            Procedure::Lambda { params, body, env } => {
                if params.len() != args.len() {
                    return Err(EvalErr::Arity(format!(
                        "{} expects {} argument(s), got {}", proc, params.len(), args.len())));
                }
                let frame = env.extend(params.iter().cloned().zip(args));
                self.eval(body, &frame)
            },
            Procedure::Bridge(call) => self.call_bridge(*call, &args),
        }
    }

    fn call_bridge(&self, call: BridgeCall, args: &[LispExpr]) -> Result<LispExpr, EvalErr> {
        match call {
            BridgeCall::Js => {
                let name = string_arg(call, args, 0, "function name")?;
                Ok(self.bridge.call_function(name, &args[1..])?)
            },
            BridgeCall::Wasm => {
                let module = string_arg(call, args, 0, "module name")?;
                let function = string_arg(call, args, 1, "function name")?;
                Ok(self.bridge.call_module(module, function, &args[2..])?)
            },
        }
    }
}

fn string_arg<'x>(call: BridgeCall, args: &'x [LispExpr],
                  idx: usize, what: &str) -> Result<&'x str, EvalErr> {
    match args.get(idx) {
        Some(LispExpr::String(s)) => Ok(s.as_str()),
        Some(other) => Err(EvalErr::Type(format!(
            "{} expects a {} string, got {} {}", call.name(), what, other.type_name(), other))),
        None => Err(EvalErr::Arity(format!("{} expects a {} string", call.name(), what))),
    }
}

// ((name value) ...) with every name a symbol, checked before anything runs
fn let_bindings(bindings: &LispExpr) -> Result<Vec<(&str, &LispExpr)>, EvalErr> {
    let LispExpr::List(bindings) = bindings else {
        return Err(EvalErr::Syntax(format!("let bindings must be a list, got {}", bindings)));
    };
    bindings.iter()
        .map(|binding| match binding {
            LispExpr::List(pair) => match pair.as_slice() {
                [LispExpr::Symbol(name), init] => Ok((name.as_str(), init)),
                _ => Err(EvalErr::Syntax(format!("let binding must be (name value), got {}", binding))),
            },
            other => Err(EvalErr::Syntax(format!("let binding must be (name value), got {}", other))),
        })
        .collect()
}
