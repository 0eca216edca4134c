use crate::eval::EvalErr;
use crate::expr::LispExpr;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One frame of the scope chain. Children keep their parent alive, parents
/// never see their children, so the chain itself can't form a cycle.
pub struct Environment {
    syms: RefCell<HashMap<String, LispExpr>>,
    outer: Option<Rc<Environment>>,
}

impl Environment {
    pub fn new() -> Rc<Environment> {
        Self::root(HashMap::new())
    }

    pub fn root(bindings: HashMap<String, LispExpr>) -> Rc<Environment> {
        Rc::new(Environment{syms: RefCell::new(bindings), outer: None})
    }

    /// A new frame holding `bindings` whose parent is this one.
    pub fn extend<B>(self: &Rc<Self>, bindings: B) -> Rc<Environment>
    where B: IntoIterator<Item=(String, LispExpr)> {
        Rc::new(Environment{
            syms: RefCell::new(bindings.into_iter().collect()),
            outer: Some(self.clone()),
        })
    }

    fn lookup(&self, sym: &str) -> Option<&Environment> {
        if self.syms.borrow().contains_key(sym) {
            Some(self)
        } else if let Some(ref otx) = self.outer {
            otx.lookup(sym)
        } else {
            None
        }
    }

    pub fn get(&self, sym: &str) -> Result<LispExpr, EvalErr> {
        self.lookup(sym)
            .and_then(|cx| cx.syms.borrow().get(sym).cloned())
            .ok_or_else(|| EvalErr::UndefinedVariable(sym.to_string()))
    }

    /// Bind in this frame, shadowing whatever the parents hold.
    pub fn define<S: Into<String>>(&self, sym: S, value: LispExpr) {
        self.syms.borrow_mut().insert(sym.into(), value);
    }

    /// Overwrite the nearest existing binding, which may live in a parent.
    pub fn set(&self, sym: &str, value: LispExpr) -> Result<(), EvalErr> {
        match self.lookup(sym) {
            Some(cx) => {
                cx.syms.borrow_mut().insert(sym.to_string(), value);
                Ok(())
            },
            None => Err(EvalErr::UndefinedVariable(sym.to_string())),
        }
    }

    pub fn contains(&self, sym: &str) -> bool {
        self.lookup(sym).is_some()
    }

    /// Names bound directly in this frame.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.syms.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    // Closures stored here may hold this very frame, emptying it breaks that cycle
    pub fn clear(&self) {
        let bindings = std::mem::take(&mut *self.syms.borrow_mut());
        drop(bindings);
    }
}

#[cfg(test)]
mod tests {
    use super::Environment;
    use crate::eval::EvalErr;
    use crate::expr::LispExpr;

    #[test]
    fn define_shadows_set_reaches_through() -> Result<(), EvalErr> {
        let outer = Environment::new();
        outer.define("x", LispExpr::Number(1.0));
        let inner = outer.extend(vec![("y".to_string(), LispExpr::Number(2.0))]);

        inner.set("x", LispExpr::Number(10.0))?;
        assert_eq!(outer.get("x")?, LispExpr::Number(10.0));

        inner.define("x", LispExpr::Number(20.0));
        assert_eq!(inner.get("x")?, LispExpr::Number(20.0));
        assert_eq!(outer.get("x")?, LispExpr::Number(10.0));
        assert_eq!(inner.names(), vec!["x".to_string(), "y".to_string()]);
        Ok(())
    }

    #[test]
    fn unbound_names() {
        let env = Environment::new().extend(Vec::new());
        assert_eq!(env.get("nope"), Err(EvalErr::UndefinedVariable("nope".into())));
        assert_eq!(env.set("nope", LispExpr::Nil),
                   Err(EvalErr::UndefinedVariable("nope".into())));
        assert!(!env.contains("nope"));
    }

    #[test]
    fn clear_drops_bindings() {
        let env = Environment::new();
        env.define("a", LispExpr::Nil);
        env.clear();
        assert!(env.names().is_empty());
    }
}
