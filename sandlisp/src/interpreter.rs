use crate::bridge::{BridgeRegistry, HostModule};
use crate::builtin::builtins;
use crate::config::Config;
use crate::env::Environment;
use crate::eval::{EvalErr, Evaluator};
use crate::expr::LispExpr;
use crate::guard::ExecutionGuard;
use log::debug;
use std::rc::Rc;

/// An embeddable interpreter instance. Each one owns its global frame, its
/// guard and its bridge, nothing is shared between instances.
pub struct Interpreter {
    global: Rc<Environment>,
    guard: ExecutionGuard,
    bridge: BridgeRegistry,
    config: Config,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Interpreter{
            global: Environment::root(builtins()),
            guard: ExecutionGuard::new(&config),
            bridge: BridgeRegistry::new(),
            config,
        }
    }

    /// Evaluate every form in `source` in the global frame, returning the
    /// value of the last one. Limits are reset on each call.
    pub fn eval(&mut self, source: &str) -> Result<LispExpr, EvalErr> {
        Evaluator::new(&mut self.guard, &self.bridge).eval_top_level(source, &self.global)
    }

    pub fn register_host_function<S, F>(&mut self, name: S, f: F)
    where S: Into<String>,
          F: Fn(&[LispExpr]) -> Result<LispExpr, String> + 'static {
        self.bridge.register_function(name, f);
    }

    pub fn register_host_module<S: Into<String>>(&mut self, name: S, module: HostModule) {
        self.bridge.register_module(name, module);
    }

    /// Bind a value in the global frame without going through `eval`.
    pub fn define<S: Into<String>>(&self, name: S, value: LispExpr) {
        self.global.define(name, value);
    }

    /// Forget every user binding, only the builtins remain. Host
    /// registrations are kept.
    pub fn reset(&mut self) {
        debug!("resetting global environment");
        self.global.clear();
        self.global = Environment::root(builtins());
    }

    pub fn global(&self) -> &Rc<Environment> {
        &self.global
    }

    pub fn bridge_mut(&mut self) -> &mut BridgeRegistry {
        &mut self.bridge
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        self.global.clear();
    }
}
