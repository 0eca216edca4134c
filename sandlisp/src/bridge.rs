use crate::expr::LispExpr;
use log::debug;
use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

/// A capability provided by the embedding host. It receives already
/// evaluated arguments and reports failure as a plain message.
pub type HostFn = Rc<dyn Fn(&[LispExpr]) -> Result<LispExpr, String>>;

#[derive(thiserror::Error, Clone, PartialEq, Debug)]
pub enum BridgeError {
    #[error("Bridge error: '{0}' is not in the allow-list")]
    NotAllowed(String),
    #[error("Bridge error: no host function registered as '{0}'")]
    NotRegistered(String),
    #[error("Bridge error: no host module registered as '{0}'")]
    UnknownModule(String),
    #[error("Bridge error: host module '{module}' has no function '{function}'")]
    UnknownMember { module: String, function: String },
    #[error("Bridge error: '{name}' failed: {message}")]
    HostFailure { name: String, message: String },
}

/// A namespace of host callables reachable through `call-wasm`.
#[derive(Clone, Default)]
pub struct HostModule {
    functions: HashMap<String, HostFn>,
}

impl HostModule {
    pub fn new() -> Self {
        HostModule::default()
    }

    pub fn insert<S, F>(&mut self, name: S, f: F)
    where S: Into<String>,
          F: Fn(&[LispExpr]) -> Result<LispExpr, String> + 'static {
        self.functions.insert(name.into(), Rc::new(f));
    }

    pub fn with_function<S, F>(mut self, name: S, f: F) -> Self
    where S: Into<String>,
          F: Fn(&[LispExpr]) -> Result<LispExpr, String> + 'static {
        self.insert(name, f);
        self
    }

    pub fn get(&self, name: &str) -> Option<&HostFn> {
        self.functions.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.functions.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Capability table populated by the host only. Sandboxed code can invoke
/// entries by name but never add, remove or inspect them.
#[derive(Default)]
pub struct BridgeRegistry {
    functions: HashMap<String, HostFn>,
    modules: HashMap<String, HostModule>,
    allowed: HashSet<String>,
}

impl BridgeRegistry {
    pub fn new() -> Self {
        BridgeRegistry::default()
    }

    /// Registering a function also allow-lists it.
    pub fn register_function<S, F>(&mut self, name: S, f: F)
    where S: Into<String>,
          F: Fn(&[LispExpr]) -> Result<LispExpr, String> + 'static {
        let name = name.into();
        debug!("bridge: registering host function '{}'", name);
        self.allowed.insert(name.clone());
        self.functions.insert(name, Rc::new(f));
    }

    pub fn register_module<S: Into<String>>(&mut self, name: S, module: HostModule) {
        let name = name.into();
        debug!("bridge: registering host module '{}' {:?}", name, module.names());
        self.modules.insert(name, module);
    }

    pub fn allow<S: Into<String>>(&mut self, name: S) {
        self.allowed.insert(name.into());
    }

    /// Take `name` off the allow-list, its registration stays in place.
    pub fn revoke(&mut self, name: &str) -> bool {
        self.allowed.remove(name)
    }

    pub fn is_allowed(&self, name: &str) -> bool {
        self.allowed.contains(name)
    }

    pub fn call_function(&self, name: &str, args: &[LispExpr]) -> Result<LispExpr, BridgeError> {
        if !self.allowed.contains(name) {
            return Err(BridgeError::NotAllowed(name.to_string()));
        }
        let f = self.functions.get(name)
            .ok_or_else(|| BridgeError::NotRegistered(name.to_string()))?;
        debug!("bridge: call-js '{}' with {} argument(s)", name, args.len());
        invoke(name, f, args)
    }

    pub fn call_module(&self, module: &str, function: &str,
                       args: &[LispExpr]) -> Result<LispExpr, BridgeError> {
        let m = self.modules.get(module)
            .ok_or_else(|| BridgeError::UnknownModule(module.to_string()))?;
        let f = m.get(function).ok_or_else(|| BridgeError::UnknownMember{
            module: module.to_string(), function: function.to_string(),
        })?;
        debug!("bridge: call-wasm '{}.{}' with {} argument(s)", module, function, args.len());
        invoke(&format!("{}.{}", module, function), f, args)
    }
}

// Host failures, including panics, come back as a message and nothing else
fn invoke(name: &str, f: &HostFn, args: &[LispExpr]) -> Result<LispExpr, BridgeError> {
    let failure = |message: String| BridgeError::HostFailure{name: name.to_string(), message};
    match panic::catch_unwind(AssertUnwindSafe(|| f(args))) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(message)) => Err(failure(message)),
        Err(payload) => {
            let message = payload.downcast_ref::<&str>().map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "host function panicked".to_string());
            Err(failure(message))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{BridgeError, BridgeRegistry, HostModule};
    use crate::expr::LispExpr;

    fn registry() -> BridgeRegistry {
        let mut bridge = BridgeRegistry::new();
        bridge.register_function("echo", |args| Ok(LispExpr::list(args.to_vec())));
        bridge.register_function("fail", |_| Err("sensor offline".to_string()));
        bridge.register_function("boom", |_| panic!("host blew up"));
        bridge.register_module("organism", HostModule::new()
            .with_function("energy", |_| Ok(LispExpr::Number(1000.0))));
        bridge
    }

    #[test]
    fn registered_functions_are_allowed() {
        let bridge = registry();
        assert!(bridge.is_allowed("echo"));
        assert_eq!(bridge.call_function("echo", &[LispExpr::Number(1.0)]),
                   Ok(LispExpr::list(vec![LispExpr::Number(1.0)])));
    }

    #[test]
    fn allow_list_and_registration_are_distinct() {
        let mut bridge = registry();
        assert_eq!(bridge.call_function("ghost", &[]),
                   Err(BridgeError::NotAllowed("ghost".into())));
        bridge.allow("ghost");
        assert_eq!(bridge.call_function("ghost", &[]),
                   Err(BridgeError::NotRegistered("ghost".into())));
        assert!(bridge.revoke("echo"));
        assert_eq!(bridge.call_function("echo", &[]),
                   Err(BridgeError::NotAllowed("echo".into())));
    }

    #[test]
    fn host_failures_are_wrapped() {
        let bridge = registry();
        assert_eq!(bridge.call_function("fail", &[]), Err(BridgeError::HostFailure{
            name: "fail".into(), message: "sensor offline".into(),
        }));
        assert_eq!(bridge.call_function("boom", &[]), Err(BridgeError::HostFailure{
            name: "boom".into(), message: "host blew up".into(),
        }));
    }

    #[test]
    fn modules() {
        let bridge = registry();
        assert_eq!(bridge.call_module("organism", "energy", &[]), Ok(LispExpr::Number(1000.0)));
        assert_eq!(bridge.call_module("organism", "age", &[]), Err(BridgeError::UnknownMember{
            module: "organism".into(), function: "age".into(),
        }));
        assert_eq!(bridge.call_module("neural", "step", &[]),
                   Err(BridgeError::UnknownModule("neural".into())));
    }
}
