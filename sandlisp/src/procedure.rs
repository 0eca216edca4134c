use crate::env::Environment;
use crate::eval::EvalErr;
use crate::expr::LispExpr;
use std::{fmt, ptr};
use std::rc::Rc;

pub type Fp = Rc<dyn Fn(&[LispExpr]) -> Result<LispExpr, EvalErr>>;

/// The two primitives that reach out to the host through the bridge.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BridgeCall {
    Js,
    Wasm,
}

impl BridgeCall {
    pub fn name(&self) -> &'static str {
        match self {
            BridgeCall::Js => "call-js",
            BridgeCall::Wasm => "call-wasm",
        }
    }
}

pub enum Procedure {
    Builtin { name: String, fp: Fp },
    Lambda { params: Vec<String>, body: LispExpr, env: Rc<Environment> },
    Bridge(BridgeCall),
}

// procedures are only equal to themselves
impl PartialEq for Procedure {
    fn eq(&self, other: &Procedure) -> bool { ptr::eq(self, other) }
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Procedure::Builtin { name, .. } => write!(f, "Builtin({})", name),
            Procedure::Lambda { params, body, .. } =>
                write!(f, "Lambda({:?}, {})", params, body),
            Procedure::Bridge(call) => write!(f, "Bridge({:?})", call),
        }
    }
}

impl fmt::Display for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Procedure::Builtin { name, .. } => write!(f, "#<builtin {}>", name),
            Procedure::Lambda { params, .. } =>
                write!(f, "#<lambda ({})>", params.join(" ")),
            Procedure::Bridge(call) => write!(f, "#<builtin {}>", call.name()),
        }
    }
}

impl Procedure {
    pub fn new(params: Vec<String>, body: LispExpr, env: Rc<Environment>) -> Procedure {
        Procedure::Lambda { params, body, env }
    }

    pub fn builtin<S, F>(name: S, fp: F) -> Procedure
    where S: Into<String>,
          F: Fn(&[LispExpr]) -> Result<LispExpr, EvalErr> + 'static {
        Procedure::Builtin { name: name.into(), fp: Rc::new(fp) }
    }

    /// Wrap into a value that can be bound in an environment.
    pub fn into_expr(self) -> LispExpr {
        LispExpr::Proc(Rc::new(self))
    }
}
