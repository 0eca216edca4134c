use crate::eval::EvalErr;
use crate::expr::{LispExpr, MAX_LIST_DEPTH};
use crate::procedure::{BridgeCall, Procedure};
use std::collections::HashMap;

fn arity(name: &str, args: &[LispExpr], expected: usize) -> Result<(), EvalErr> {
    if args.len() != expected {
        return Err(EvalErr::Arity(format!(
            "{} expects {} argument(s), got {}", name, expected, args.len())));
    }
    Ok(())
}

fn numbers(name: &str, args: &[LispExpr]) -> Result<Vec<f64>, EvalErr> {
    args.iter()
        .map(|a| match a {
            LispExpr::Number(n) => Ok(*n),
            other => Err(EvalErr::Type(format!(
                "{} expects numbers, got {} {}", name, other.type_name(), other))),
        })
        .collect()
}

// Values built at runtime get the same nesting bound as parsed source
fn bounded(list: LispExpr) -> Result<LispExpr, EvalErr> {
    if list.depth() > MAX_LIST_DEPTH {
        return Err(EvalErr::ExecutionLimitExceeded(format!(
            "list nested deeper than {} levels", MAX_LIST_DEPTH)));
    }
    Ok(list)
}

fn list_arg<'a>(name: &str, arg: &'a LispExpr) -> Result<&'a [LispExpr], EvalErr> {
    match arg {
        LispExpr::List(items) => Ok(items.as_slice()),
        other => Err(EvalErr::Type(format!(
            "{} expects a list, got {} {}", name, other.type_name(), other))),
    }
}

// Left fold starting at the identity, unary minus negates
fn eval_arith(name: &str, args: &[LispExpr]) -> Result<LispExpr, EvalErr> {
    let nums = numbers(name, args)?;
    let reduce_op: fn(f64, f64) -> f64 = match name {
        "+" => |acc: f64, x: f64| acc + x,
        "-" => |acc: f64, x: f64| acc - x,
        "*" => |acc: f64, x: f64| acc * x,
        "/" => |acc: f64, x: f64| acc / x,
        _ => unreachable!("not an arithmetic op: {}", name),
    };
    let result = match (name, nums.split_first()) {
        ("+", _) => nums.iter().fold(0.0, |acc, &x| reduce_op(acc, x)),
        ("*", _) => nums.iter().fold(1.0, |acc, &x| reduce_op(acc, x)),
        ("-", Some((&first, []))) => -first,
        (_, Some((&first, rest))) => rest.iter().fold(first, |acc, &x| reduce_op(acc, x)),
        (_, None) => return Err(EvalErr::Arity(
            format!("{} expects at least 1 argument", name))),
    };
    Ok(LispExpr::Number(result))
}

fn eval_compare(name: &str, args: &[LispExpr]) -> Result<LispExpr, EvalErr> {
    arity(name, args, 2)?;
    if name == "=" {
        return Ok(LispExpr::Bool(args[0] == args[1]));
    }
    let nums = numbers(name, args)?;
    let (lhs, rhs) = (nums[0], nums[1]);
    Ok(LispExpr::Bool(match name {
        "<" => lhs < rhs,
        ">" => lhs > rhs,
        "<=" => lhs <= rhs,
        ">=" => lhs >= rhs,
        _ => unreachable!("not a comparison: {}", name),
    }))
}

fn eval_car(args: &[LispExpr]) -> Result<LispExpr, EvalErr> {
    arity("car", args, 1)?;
    let items = list_arg("car", &args[0])?;
    Ok(items.first().cloned().unwrap_or(LispExpr::Nil))
}

fn eval_cdr(args: &[LispExpr]) -> Result<LispExpr, EvalErr> {
    arity("cdr", args, 1)?;
    let items = list_arg("cdr", &args[0])?;
    Ok(LispExpr::list(items.iter().skip(1).cloned().collect()))
}

fn eval_cons(args: &[LispExpr]) -> Result<LispExpr, EvalErr> {
    arity("cons", args, 2)?;
    let tail = list_arg("cons", &args[1])?;
    let mut list = Vec::with_capacity(tail.len() + 1);
    list.push(args[0].clone());
    list.extend(tail.iter().cloned());
    bounded(LispExpr::list(list))
}

fn eval_length(args: &[LispExpr]) -> Result<LispExpr, EvalErr> {
    arity("length", args, 1)?;
    Ok(LispExpr::Number(list_arg("length", &args[0])?.len() as f64))
}

fn eval_predicate(name: &str, args: &[LispExpr]) -> Result<LispExpr, EvalErr> {
    arity(name, args, 1)?;
    Ok(LispExpr::Bool(match (name, &args[0]) {
        ("null?", LispExpr::Nil) => true,
        ("null?", LispExpr::List(items)) => items.is_empty(),
        ("number?", LispExpr::Number(_)) => true,
        ("string?", LispExpr::String(_)) => true,
        ("list?", LispExpr::List(_)) => true,
        ("procedure?", LispExpr::Proc(_)) => true,
        ("not", arg) => !arg.is_truthy(),
        _ => false,
    }))
}

// Strict reductions, every argument has already been evaluated
fn eval_and(args: &[LispExpr]) -> Result<LispExpr, EvalErr> {
    Ok(args.iter().fold(LispExpr::Bool(true), |acc, x| {
        if acc.is_truthy() { x.clone() } else { acc }
    }))
}

fn eval_or(args: &[LispExpr]) -> Result<LispExpr, EvalErr> {
    Ok(args.iter().fold(LispExpr::Bool(false), |acc, x| {
        if acc.is_truthy() { acc } else { x.clone() }
    }))
}

/// Bindings every fresh global frame starts with.
pub fn builtins() -> HashMap<String, LispExpr> {
    let mut syms = HashMap::new();
    let mut add = |name: &'static str, proc: Procedure| {
        syms.insert(name.to_string(), proc.into_expr());
    };

    for op in ["+", "-", "*", "/"] {
        add(op, Procedure::builtin(op, move |args| eval_arith(op, args)));
    }
    for op in ["<", ">", "=", "<=", ">="] {
        add(op, Procedure::builtin(op, move |args| eval_compare(op, args)));
    }
    for pred in ["null?", "number?", "string?", "list?", "procedure?", "not"] {
        add(pred, Procedure::builtin(pred, move |args| eval_predicate(pred, args)));
    }
    add("car", Procedure::builtin("car", eval_car));
    add("cdr", Procedure::builtin("cdr", eval_cdr));
    add("cons", Procedure::builtin("cons", eval_cons));
    add("list", Procedure::builtin("list", |args| bounded(LispExpr::list(args.to_vec()))));
    add("length", Procedure::builtin("length", eval_length));
    add("and", Procedure::builtin("and", eval_and));
    add("or", Procedure::builtin("or", eval_or));
    add("call-js", Procedure::Bridge(BridgeCall::Js));
    add("call-wasm", Procedure::Bridge(BridgeCall::Wasm));

    syms.insert("nil".to_string(), LispExpr::Nil);
    syms.insert("true".to_string(), LispExpr::Bool(true));
    syms.insert("false".to_string(), LispExpr::Bool(false));
    syms
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: Vec<LispExpr>) -> Result<LispExpr, EvalErr> {
        match builtins().get(name) {
            Some(LispExpr::Proc(p)) => match p.as_ref() {
                Procedure::Builtin { fp, .. } => fp(args.as_slice()),
                other => panic!("{} is not a builtin: {:?}", name, other),
            },
            other => panic!("{} is not a procedure: {:?}", name, other),
        }
    }

    fn nums(ns: &[f64]) -> Vec<LispExpr> {
        ns.iter().map(|&n| LispExpr::Number(n)).collect()
    }

    #[test]
    fn arith_ops() -> Result<(), EvalErr> {
        assert_eq!(call("+", nums(&[1.0, 2.0, 3.0]))?, LispExpr::Number(6.0));
        assert_eq!(call("+", vec![])?, LispExpr::Number(0.0));
        assert_eq!(call("*", vec![])?, LispExpr::Number(1.0));
        assert_eq!(call("-", nums(&[4.0]))?, LispExpr::Number(-4.0));
        assert_eq!(call("-", nums(&[10.0, 2.0, 3.0]))?, LispExpr::Number(5.0));
        assert_eq!(call("/", nums(&[3.0, 2.0, 4.0]))?, LispExpr::Number(0.375));
        assert_eq!(call("/", nums(&[8.0]))?, LispExpr::Number(8.0));
        assert!(matches!(call("-", vec![]), Err(EvalErr::Arity(_))));
        assert!(matches!(call("+", vec![LispExpr::Nil]), Err(EvalErr::Type(_))));
        Ok(())
    }

    #[test]
    fn comparisons() -> Result<(), EvalErr> {
        assert_eq!(call("<", nums(&[1.0, 2.0]))?, LispExpr::Bool(true));
        assert_eq!(call(">=", nums(&[1.0, 2.0]))?, LispExpr::Bool(false));
        assert_eq!(call("=", vec!["a".into(), "a".into()])?, LispExpr::Bool(true));
        assert_eq!(call("=", vec![LispExpr::Number(1.0), "1".into()])?, LispExpr::Bool(false));
        assert!(matches!(call("<", nums(&[1.0])), Err(EvalErr::Arity(_))));
        assert!(matches!(call("<", vec!["a".into(), "b".into()]), Err(EvalErr::Type(_))));
        Ok(())
    }

    #[test]
    fn list_ops() -> Result<(), EvalErr> {
        let l = LispExpr::list(nums(&[1.0, 2.0, 3.0]));
        assert_eq!(call("car", vec![l.clone()])?, LispExpr::Number(1.0));
        assert_eq!(call("cdr", vec![l.clone()])?, LispExpr::list(nums(&[2.0, 3.0])));
        assert_eq!(call("length", vec![l.clone()])?, LispExpr::Number(3.0));
        assert_eq!(call("cons", vec![LispExpr::Number(0.0), l])?,
                   LispExpr::list(nums(&[0.0, 1.0, 2.0, 3.0])));
        assert_eq!(call("car", vec![LispExpr::list(vec![])])?, LispExpr::Nil);
        assert_eq!(call("cdr", vec![LispExpr::list(vec![])])?, LispExpr::list(vec![]));
        assert!(matches!(call("car", nums(&[1.0])), Err(EvalErr::Type(_))));
        assert!(matches!(call("length", vec!["abc".into()]), Err(EvalErr::Type(_))));
        assert!(matches!(call("cons", nums(&[1.0, 2.0])), Err(EvalErr::Type(_))));
        Ok(())
    }

    #[test]
    fn predicates() -> Result<(), EvalErr> {
        assert_eq!(call("null?", vec![LispExpr::list(vec![])])?, LispExpr::Bool(true));
        assert_eq!(call("null?", vec![LispExpr::Nil])?, LispExpr::Bool(true));
        assert_eq!(call("null?", vec![LispExpr::list(nums(&[1.0]))])?, LispExpr::Bool(false));
        assert_eq!(call("number?", nums(&[1.0]))?, LispExpr::Bool(true));
        assert_eq!(call("string?", nums(&[1.0]))?, LispExpr::Bool(false));
        assert_eq!(call("list?", vec![LispExpr::list(vec![])])?, LispExpr::Bool(true));
        assert_eq!(call("not", vec![LispExpr::Nil])?, LispExpr::Bool(true));
        assert_eq!(call("not", nums(&[0.0]))?, LispExpr::Bool(false));
        Ok(())
    }

    #[test]
    fn strict_boolean_reductions() -> Result<(), EvalErr> {
        assert_eq!(call("and", vec![])?, LispExpr::Bool(true));
        assert_eq!(call("and", nums(&[1.0, 2.0]))?, LispExpr::Number(2.0));
        assert_eq!(call("and", vec![LispExpr::Number(1.0), LispExpr::Nil, LispExpr::Number(2.0)])?,
                   LispExpr::Nil);
        assert_eq!(call("or", vec![])?, LispExpr::Bool(false));
        assert_eq!(call("or", vec![LispExpr::Bool(false), LispExpr::Number(3.0)])?,
                   LispExpr::Number(3.0));
        Ok(())
    }
}
