use crate::procedure::Procedure;
use std::collections::HashSet;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

/// Deepest list nesting a value may reach, the same bound the parser puts
/// on source text.
pub const MAX_LIST_DEPTH: usize = 512;

/// Both the syntax tree and the runtime values. The parser only produces
/// `Number`, `String`, `Symbol` and `List`; a quoted list and a list of
/// code are the same thing.
#[derive(Clone, Debug)]
pub enum LispExpr {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Symbol(String),
    List(List),
    Proc(Rc<Procedure>),
}

/// Immutable shared list. Cloning only bumps a count and the nesting depth
/// is computed once, when the list is built.
#[derive(Clone)]
pub struct List {
    items: Rc<[LispExpr]>,
    depth: usize,
}

impl List {
    pub fn new(items: Vec<LispExpr>) -> Self {
        let depth = 1 + items.iter().map(LispExpr::depth).max().unwrap_or(0);
        List{items: items.into(), depth}
    }

    /// Levels of nesting, `()` has depth 1.
    pub fn depth(&self) -> usize { self.depth }

    pub fn as_slice(&self) -> &[LispExpr] { &self.items }

    fn addr(&self) -> *const LispExpr {
        Rc::as_ptr(&self.items) as *const LispExpr
    }
}

impl Deref for List {
    type Target = [LispExpr];
    fn deref(&self) -> &[LispExpr] { &self.items }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl From<Vec<LispExpr>> for List {
    fn from(items: Vec<LispExpr>) -> Self { List::new(items) }
}

impl LispExpr {
    pub fn list(items: Vec<LispExpr>) -> Self {
        LispExpr::List(List::new(items))
    }

    /// Everything but `false` and `nil` counts as true.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, LispExpr::Nil | LispExpr::Bool(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            LispExpr::Nil => "nil",
            LispExpr::Bool(_) => "boolean",
            LispExpr::Number(_) => "number",
            LispExpr::String(_) => "string",
            LispExpr::Symbol(_) => "symbol",
            LispExpr::List(_) => "list",
            LispExpr::Proc(_) => "procedure",
        }
    }

    pub fn symbol<S: Into<String>>(name: S) -> Self {
        LispExpr::Symbol(name.into())
    }

    /// List nesting of this value, atoms are 0.
    pub fn depth(&self) -> usize {
        match self {
            LispExpr::List(list) => list.depth,
            _ => 0,
        }
    }
}

// Shared sublists are compared once per pair of allocations, so values
// built by repeated self-reference don't blow up exponentially.
fn equal(a: &LispExpr, b: &LispExpr,
         seen: &mut HashSet<(*const LispExpr, *const LispExpr)>) -> bool {
    match (a, b) {
        (LispExpr::List(x), LispExpr::List(y)) => {
            if Rc::ptr_eq(&x.items, &y.items) {
                return true;
            }
            if x.depth != y.depth || x.len() != y.len() {
                return false;
            }
            let key = (x.addr(), y.addr());
            if seen.contains(&key) {
                return true;
            }
            let same = x.iter().zip(y.iter()).all(|(l, r)| equal(l, r, seen));
            if same {
                seen.insert(key);
            }
            same
        },
        (LispExpr::Nil, LispExpr::Nil) => true,
        (LispExpr::Bool(l), LispExpr::Bool(r)) => l == r,
        (LispExpr::Number(l), LispExpr::Number(r)) => l == r,
        (LispExpr::String(l), LispExpr::String(r)) => l == r,
        (LispExpr::Symbol(l), LispExpr::Symbol(r)) => l == r,
        (LispExpr::Proc(l), LispExpr::Proc(r)) => l == r,
        _ => false,
    }
}

impl PartialEq for LispExpr {
    fn eq(&self, other: &LispExpr) -> bool {
        equal(self, other, &mut HashSet::new())
    }
}

impl PartialEq for List {
    fn eq(&self, other: &List) -> bool {
        equal(&LispExpr::List(self.clone()), &LispExpr::List(other.clone()), &mut HashSet::new())
    }
}

impl From<f64> for LispExpr {
    fn from(n: f64) -> Self { LispExpr::Number(n) }
}

impl From<bool> for LispExpr {
    fn from(b: bool) -> Self { LispExpr::Bool(b) }
}

impl From<&str> for LispExpr {
    fn from(s: &str) -> Self { LispExpr::String(s.to_string()) }
}

impl From<String> for LispExpr {
    fn from(s: String) -> Self { LispExpr::String(s) }
}

impl From<Vec<LispExpr>> for LispExpr {
    fn from(items: Vec<LispExpr>) -> Self { LispExpr::list(items) }
}

impl fmt::Display for LispExpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LispExpr::Nil => write!(f, "nil"),
            LispExpr::Bool(b) => write!(f, "{}", b),
            LispExpr::Number(n) => write!(f, "{}", n),
            LispExpr::String(s) => write!(f, "{:?}", s),
            LispExpr::Symbol(s) => write!(f, "{}", s),
            LispExpr::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 { write!(f, " ")?; }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            },
            LispExpr::Proc(p) => write!(f, "{}", p),
        }
    }
}
