//! Tree-walking interpreter for query expressions.
//!
//! The interpreter evaluates a parsed [`Expr`] against a document. The only
//! data identifier it resolves is the root symbol; the only callables are
//! the allowlisted builtins and lambdas written inside the query itself.
//! There is no path from here to the host process: every operation is a
//! pure function over [`Value`]s.

use std::cmp::Ordering;
use std::rc::Rc;

use super::ast::*;
use super::builtins::Builtin;
use super::value::{LambdaValue, RangeValue, SliceValue, Value};
use crate::document::DocumentValue;
use crate::document::path::ROOT_SYMBOL;
use crate::error::QueryError;

/// Evaluates expressions against one document.
pub struct Interpreter<'a> {
    root: &'a DocumentValue,
}

/// Lambda parameter bindings active during evaluation.
#[derive(Debug, Clone, Default)]
struct Scope {
    bindings: Vec<(String, Value)>,
}

impl Scope {
    fn lookup(&self, name: &str) -> Option<&Value> {
        // innermost binding wins
        self.bindings.iter().rev().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

impl<'a> Interpreter<'a> {
    pub fn new(root: &'a DocumentValue) -> Self {
        Self { root }
    }

    /// Evaluate a full expression with no bindings in scope.
    pub fn eval(&self, expr: &Expr) -> Result<Value, QueryError> {
        self.eval_in(expr, &Scope::default())
    }

    fn eval_in(&self, expr: &Expr, scope: &Scope) -> Result<Value, QueryError> {
        match expr {
            Expr::Null => Ok(Value::Null),
            Expr::Boolean(b) => Ok(Value::Bool(*b)),
            Expr::Integer(i) => Ok(Value::Int(*i)),
            Expr::Float(f) => Ok(Value::Float(*f)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Ident(ident) => self.resolve(&ident.name, scope),
            Expr::List(items) => Ok(Value::List(
                items
                    .iter()
                    .map(|e| self.eval_in(e, scope))
                    .collect::<Result<_, _>>()?,
            )),
            Expr::Tuple(items) => Ok(Value::Tuple(
                items
                    .iter()
                    .map(|e| self.eval_in(e, scope))
                    .collect::<Result<_, _>>()?,
            )),
            Expr::Mapping(entries) => {
                let mut out: Vec<(String, Value)> = Vec::with_capacity(entries.len());
                for (key_expr, value_expr) in entries {
                    let key = match self.eval_in(key_expr, scope)? {
                        Value::Str(s) => s,
                        other => {
                            return Err(QueryError::mismatch(format!(
                                "mapping keys must be strings, got '{}'",
                                other.kind()
                            )));
                        }
                    };
                    let value = self.eval_in(value_expr, scope)?;
                    match out.iter_mut().find(|(k, _)| *k == key) {
                        Some(entry) => entry.1 = value,
                        None => out.push((key, value)),
                    }
                }
                Ok(Value::Mapping(out))
            }
            Expr::Index(index) => {
                let object = self.eval_in(&index.object, scope)?;
                let key = self.eval_in(&index.index, scope)?;
                index_value(&object, &key)
            }
            Expr::Slice(slice) => {
                let object = self.eval_in(&slice.object, scope)?;
                let spec = SliceValue {
                    start: self.eval_slice_part(slice.start.as_ref(), scope)?,
                    stop: self.eval_slice_part(slice.stop.as_ref(), scope)?,
                    step: self.eval_slice_part(slice.step.as_ref(), scope)?,
                };
                slice_value(&object, &spec)
            }
            Expr::Attribute(attr) => {
                // evaluate the object first so deeper errors surface with
                // their own kind, then reject the access itself
                self.eval_in(&attr.object, scope)?;
                Err(QueryError::InvalidAttributeAccess {
                    name: attr.name.clone(),
                })
            }
            Expr::Call(call) => {
                let callee = self.eval_in(&call.callee, scope)?;
                let args = call
                    .args
                    .iter()
                    .map(|e| self.eval_in(e, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call_value(&callee, args)
            }
            Expr::Unary(unary) => {
                let operand = self.eval_in(&unary.operand, scope)?;
                eval_unary(unary.op, operand)
            }
            Expr::Binary(binary) => self.eval_binary(binary, scope),
            Expr::Lambda(lambda) => Ok(Value::Lambda(LambdaValue {
                params: lambda.params.clone(),
                body: Rc::new(lambda.body.clone()),
                captured: scope.bindings.clone(),
            })),
        }
    }

    fn eval_slice_part(
        &self,
        part: Option<&Expr>,
        scope: &Scope,
    ) -> Result<Option<i64>, QueryError> {
        match part {
            None => Ok(None),
            Some(expr) => match self.eval_in(expr, scope)? {
                Value::Int(i) => Ok(Some(i)),
                Value::Null => Ok(None),
                other => Err(QueryError::mismatch(format!(
                    "slice indices must be integers or null, got '{}'",
                    other.kind()
                ))),
            },
        }
    }

    /// Resolve an identifier: lambda parameters, then the root symbol,
    /// then the builtin allowlist. Anything else does not exist.
    fn resolve(&self, name: &str, scope: &Scope) -> Result<Value, QueryError> {
        if let Some(value) = scope.lookup(name) {
            return Ok(value.clone());
        }
        if name == ROOT_SYMBOL {
            return Ok(Value::from_document(self.root));
        }
        if let Some(builtin) = Builtin::lookup(name) {
            return Ok(Value::Builtin(builtin));
        }
        Err(QueryError::UnknownName {
            name: name.to_string(),
        })
    }

    fn eval_binary(&self, binary: &BinaryExpr, scope: &Scope) -> Result<Value, QueryError> {
        // and/or short-circuit and yield the deciding operand
        match binary.op {
            BinaryOp::And => {
                let lhs = self.eval_in(&binary.lhs, scope)?;
                if !lhs.truthy() {
                    return Ok(lhs);
                }
                return self.eval_in(&binary.rhs, scope);
            }
            BinaryOp::Or => {
                let lhs = self.eval_in(&binary.lhs, scope)?;
                if lhs.truthy() {
                    return Ok(lhs);
                }
                return self.eval_in(&binary.rhs, scope);
            }
            _ => {}
        }

        let lhs = self.eval_in(&binary.lhs, scope)?;
        let rhs = self.eval_in(&binary.rhs, scope)?;

        match binary.op {
            BinaryOp::Add => add_values(&lhs, &rhs),
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                numeric_op(binary.op, &lhs, &rhs)
            }
            BinaryOp::Eq => Ok(Value::Bool(values_equal(&lhs, &rhs))),
            BinaryOp::Ne => Ok(Value::Bool(!values_equal(&lhs, &rhs))),
            BinaryOp::Lt => Ok(Value::Bool(compare_values(&lhs, &rhs)? == Ordering::Less)),
            BinaryOp::Le => Ok(Value::Bool(compare_values(&lhs, &rhs)? != Ordering::Greater)),
            BinaryOp::Gt => Ok(Value::Bool(compare_values(&lhs, &rhs)? == Ordering::Greater)),
            BinaryOp::Ge => Ok(Value::Bool(compare_values(&lhs, &rhs)? != Ordering::Less)),
            BinaryOp::In => contains_value(&lhs, &rhs).map(Value::Bool),
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        }
    }

    /// Call a lambda or builtin value with already-evaluated arguments.
    fn call_value(&self, callee: &Value, args: Vec<Value>) -> Result<Value, QueryError> {
        match callee {
            Value::Builtin(builtin) => self.apply_builtin(*builtin, args),
            Value::Lambda(lambda) => self.call_lambda(lambda, args),
            other => Err(QueryError::mismatch(format!(
                "'{}' object is not callable",
                other.kind()
            ))),
        }
    }

    fn call_lambda(&self, lambda: &LambdaValue, args: Vec<Value>) -> Result<Value, QueryError> {
        if args.len() != lambda.params.len() {
            return Err(QueryError::mismatch(format!(
                "lambda takes {} argument(s), got {}",
                lambda.params.len(),
                args.len()
            )));
        }
        let mut scope = Scope {
            bindings: lambda.captured.clone(),
        };
        scope
            .bindings
            .extend(lambda.params.iter().cloned().zip(args));
        self.eval_in(&lambda.body, &scope)
    }

    /// Apply one allowlisted builtin.
    fn apply_builtin(&self, builtin: Builtin, args: Vec<Value>) -> Result<Value, QueryError> {
        match builtin {
            Builtin::Len => {
                let [value] = expect_args::<1>(builtin, args)?;
                let len = match &value {
                    Value::Str(s) => s.chars().count(),
                    Value::List(v) | Value::Tuple(v) | Value::Set(v) => v.len(),
                    Value::Mapping(m) => m.len(),
                    Value::Range(r) => r.len(),
                    other => {
                        return Err(QueryError::mismatch(format!(
                            "object of type '{}' has no length",
                            other.kind()
                        )));
                    }
                };
                Ok(Value::Int(len as i64))
            }
            Builtin::Sum => {
                if args.is_empty() || args.len() > 2 {
                    return Err(arity_error(builtin, "1 or 2", args.len()));
                }
                let mut iter = args.into_iter();
                let elements = iter.next().expect("checked").iter_values()?;
                let mut total = iter.next().unwrap_or(Value::Int(0));
                for element in elements {
                    total = add_numbers(&total, &element).ok_or_else(|| {
                        QueryError::mismatch(format!(
                            "sum() expects numbers, got '{}'",
                            element.kind()
                        ))
                    })?;
                }
                Ok(total)
            }
            Builtin::Min => self.min_max(builtin, args, Ordering::Less),
            Builtin::Max => self.min_max(builtin, args, Ordering::Greater),
            Builtin::Sorted => {
                if args.is_empty() || args.len() > 2 {
                    return Err(arity_error(builtin, "1 or 2", args.len()));
                }
                let mut iter = args.into_iter();
                let elements = iter.next().expect("checked").iter_values()?;
                let key_fn = iter.next();

                let mut decorated: Vec<(Value, Value)> = Vec::with_capacity(elements.len());
                for element in elements {
                    let key = match &key_fn {
                        Some(f) => self.call_value(f, vec![element.clone()])?,
                        None => element.clone(),
                    };
                    decorated.push((key, element));
                }

                let mut failure: Option<QueryError> = None;
                decorated.sort_by(|a, b| match compare_values(&a.0, &b.0) {
                    Ok(ordering) => ordering,
                    Err(e) => {
                        failure.get_or_insert(e);
                        Ordering::Equal
                    }
                });
                if let Some(e) = failure {
                    return Err(e);
                }
                Ok(Value::List(decorated.into_iter().map(|(_, v)| v).collect()))
            }
            Builtin::Filter => {
                let [predicate, sequence] = expect_args::<2>(builtin, args)?;
                let mut kept = Vec::new();
                for element in sequence.iter_values()? {
                    let keep = match &predicate {
                        Value::Null => element.truthy(),
                        f => self.call_value(f, vec![element.clone()])?.truthy(),
                    };
                    if keep {
                        kept.push(element);
                    }
                }
                Ok(Value::List(kept))
            }
            Builtin::Map => {
                if args.len() < 2 {
                    return Err(arity_error(builtin, "at least 2", args.len()));
                }
                let mut iter = args.into_iter();
                let function = iter.next().expect("checked");
                let sequences: Vec<Vec<Value>> = iter
                    .map(|s| s.iter_values())
                    .collect::<Result<_, _>>()?;
                let shortest = sequences.iter().map(Vec::len).min().unwrap_or(0);
                let mut out = Vec::with_capacity(shortest);
                for i in 0..shortest {
                    let call_args: Vec<Value> =
                        sequences.iter().map(|s| s[i].clone()).collect();
                    out.push(self.call_value(&function, call_args)?);
                }
                Ok(Value::List(out))
            }
            Builtin::List => {
                let arg = expect_optional_arg(builtin, args)?;
                match arg {
                    None => Ok(Value::List(Vec::new())),
                    Some(value) => Ok(Value::List(value.iter_values()?)),
                }
            }
            Builtin::Tuple => {
                let arg = expect_optional_arg(builtin, args)?;
                match arg {
                    None => Ok(Value::Tuple(Vec::new())),
                    Some(value) => Ok(Value::Tuple(value.iter_values()?)),
                }
            }
            Builtin::Set => {
                let arg = expect_optional_arg(builtin, args)?;
                match arg {
                    None => Ok(Value::Set(Vec::new())),
                    Some(value) => {
                        let mut out: Vec<Value> = Vec::new();
                        for element in value.iter_values()? {
                            if !out.iter().any(|v| values_equal(v, &element)) {
                                out.push(element);
                            }
                        }
                        Ok(Value::Set(out))
                    }
                }
            }
            Builtin::Dict => {
                let arg = expect_optional_arg(builtin, args)?;
                match arg {
                    None => Ok(Value::Mapping(Vec::new())),
                    Some(Value::Mapping(entries)) => Ok(Value::Mapping(entries)),
                    Some(value) => {
                        let mut out: Vec<(String, Value)> = Vec::new();
                        for pair in value.iter_values()? {
                            let items = match &pair {
                                Value::List(v) | Value::Tuple(v) if v.len() == 2 => v.clone(),
                                other => {
                                    return Err(QueryError::mismatch(format!(
                                        "dict() expects (key, value) pairs, got '{}'",
                                        other.kind()
                                    )));
                                }
                            };
                            let key = match &items[0] {
                                Value::Str(s) => s.clone(),
                                other => {
                                    return Err(QueryError::mismatch(format!(
                                        "dict keys must be strings, got '{}'",
                                        other.kind()
                                    )));
                                }
                            };
                            match out.iter_mut().find(|(k, _)| *k == key) {
                                Some(entry) => entry.1 = items[1].clone(),
                                None => out.push((key, items[1].clone())),
                            }
                        }
                        Ok(Value::Mapping(out))
                    }
                }
            }
            Builtin::Str => {
                let arg = expect_optional_arg(builtin, args)?;
                Ok(Value::Str(match arg {
                    None => String::new(),
                    Some(Value::Str(s)) => s,
                    Some(other) => super::value::repr(&other),
                }))
            }
            Builtin::Int => {
                let [value] = expect_args::<1>(builtin, args)?;
                match value {
                    Value::Int(i) => Ok(Value::Int(i)),
                    Value::Float(f) => Ok(Value::Int(f.trunc() as i64)),
                    Value::Bool(b) => Ok(Value::Int(b as i64)),
                    Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
                        QueryError::InvalidValue {
                            message: format!("invalid literal for int(): '{s}'"),
                        }
                    }),
                    other => Err(QueryError::mismatch(format!(
                        "int() argument must be a string or a number, not '{}'",
                        other.kind()
                    ))),
                }
            }
            Builtin::Float => {
                let [value] = expect_args::<1>(builtin, args)?;
                match value {
                    Value::Int(i) => Ok(Value::Float(i as f64)),
                    Value::Float(f) => Ok(Value::Float(f)),
                    Value::Bool(b) => Ok(Value::Float(if b { 1.0 } else { 0.0 })),
                    Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
                        QueryError::InvalidValue {
                            message: format!("could not convert string to float: '{s}'"),
                        }
                    }),
                    other => Err(QueryError::mismatch(format!(
                        "float() argument must be a string or a number, not '{}'",
                        other.kind()
                    ))),
                }
            }
            Builtin::Bool => {
                let arg = expect_optional_arg(builtin, args)?;
                Ok(Value::Bool(arg.map(|v| v.truthy()).unwrap_or(false)))
            }
            Builtin::Type => {
                let [value] = expect_args::<1>(builtin, args)?;
                Ok(match Builtin::for_value(&value) {
                    Some(constructor) => Value::Builtin(constructor),
                    None => Value::Str(value.kind().to_string()),
                })
            }
            Builtin::Isinstance => {
                let [value, spec] = expect_args::<2>(builtin, args)?;
                Ok(Value::Bool(isinstance(&value, &spec)?))
            }
            Builtin::Range => {
                if args.is_empty() || args.len() > 3 {
                    return Err(arity_error(builtin, "1 to 3", args.len()));
                }
                let mut bounds = Vec::with_capacity(args.len());
                for arg in &args {
                    match arg {
                        Value::Int(i) => bounds.push(*i),
                        other => {
                            return Err(QueryError::mismatch(format!(
                                "range() arguments must be integers, got '{}'",
                                other.kind()
                            )));
                        }
                    }
                }
                let (start, stop, step) = match bounds.as_slice() {
                    [stop] => (0, *stop, 1),
                    [start, stop] => (*start, *stop, 1),
                    [start, stop, step] => (*start, *stop, *step),
                    _ => unreachable!("length checked"),
                };
                if step == 0 {
                    return Err(QueryError::InvalidValue {
                        message: "range() step must not be zero".to_string(),
                    });
                }
                Ok(Value::Range(RangeValue { start, stop, step }))
            }
            Builtin::Zip => {
                let sequences: Vec<Vec<Value>> = args
                    .into_iter()
                    .map(|s| s.iter_values())
                    .collect::<Result<_, _>>()?;
                let shortest = sequences.iter().map(Vec::len).min().unwrap_or(0);
                let out = (0..shortest)
                    .map(|i| Value::Tuple(sequences.iter().map(|s| s[i].clone()).collect()))
                    .collect();
                Ok(Value::List(out))
            }
            Builtin::Enumerate => {
                if args.is_empty() || args.len() > 2 {
                    return Err(arity_error(builtin, "1 or 2", args.len()));
                }
                let mut iter = args.into_iter();
                let elements = iter.next().expect("checked").iter_values()?;
                let start = match iter.next() {
                    None => 0,
                    Some(Value::Int(i)) => i,
                    Some(other) => {
                        return Err(QueryError::mismatch(format!(
                            "enumerate() start must be an integer, got '{}'",
                            other.kind()
                        )));
                    }
                };
                Ok(Value::List(
                    elements
                        .into_iter()
                        .enumerate()
                        .map(|(i, v)| Value::Tuple(vec![Value::Int(start + i as i64), v]))
                        .collect(),
                ))
            }
            Builtin::Any => {
                let [value] = expect_args::<1>(builtin, args)?;
                Ok(Value::Bool(value.iter_values()?.iter().any(Value::truthy)))
            }
            Builtin::All => {
                let [value] = expect_args::<1>(builtin, args)?;
                Ok(Value::Bool(value.iter_values()?.iter().all(Value::truthy)))
            }
            Builtin::Abs => {
                let [value] = expect_args::<1>(builtin, args)?;
                match value {
                    Value::Int(i) => Ok(i
                        .checked_abs()
                        .map(Value::Int)
                        .unwrap_or(Value::Float(-(i as f64)))),
                    Value::Float(f) => Ok(Value::Float(f.abs())),
                    other => Err(QueryError::mismatch(format!(
                        "abs() argument must be a number, not '{}'",
                        other.kind()
                    ))),
                }
            }
            Builtin::Round => {
                if args.is_empty() || args.len() > 2 {
                    return Err(arity_error(builtin, "1 or 2", args.len()));
                }
                let mut iter = args.into_iter();
                let value = iter.next().expect("checked");
                let digits = match iter.next() {
                    None => None,
                    Some(Value::Int(n)) => Some(n),
                    Some(Value::Null) => None,
                    Some(other) => {
                        return Err(QueryError::mismatch(format!(
                            "round() digits must be an integer, got '{}'",
                            other.kind()
                        )));
                    }
                };
                match (value, digits) {
                    (Value::Int(i), _) => Ok(Value::Int(i)),
                    (Value::Float(f), None) => Ok(Value::Int(f.round() as i64)),
                    (Value::Float(f), Some(n)) => {
                        let factor = 10f64.powi(n.clamp(-300, 300) as i32);
                        Ok(Value::Float((f * factor).round() / factor))
                    }
                    (other, _) => Err(QueryError::mismatch(format!(
                        "round() argument must be a number, not '{}'",
                        other.kind()
                    ))),
                }
            }
            Builtin::Slice => {
                if args.is_empty() || args.len() > 3 {
                    return Err(arity_error(builtin, "1 to 3", args.len()));
                }
                let mut parts = Vec::with_capacity(args.len());
                for arg in &args {
                    match arg {
                        Value::Int(i) => parts.push(Some(*i)),
                        Value::Null => parts.push(None),
                        other => {
                            return Err(QueryError::mismatch(format!(
                                "slice() arguments must be integers or null, got '{}'",
                                other.kind()
                            )));
                        }
                    }
                }
                let spec = match parts.as_slice() {
                    [stop] => SliceValue {
                        start: None,
                        stop: *stop,
                        step: None,
                    },
                    [start, stop] => SliceValue {
                        start: *start,
                        stop: *stop,
                        step: None,
                    },
                    [start, stop, step] => SliceValue {
                        start: *start,
                        stop: *stop,
                        step: *step,
                    },
                    _ => unreachable!("length checked"),
                };
                Ok(Value::Slice(spec))
            }
        }
    }

    fn min_max(
        &self,
        builtin: Builtin,
        args: Vec<Value>,
        keep: Ordering,
    ) -> Result<Value, QueryError> {
        if args.is_empty() {
            return Err(arity_error(builtin, "at least 1", 0));
        }
        let elements = if args.len() == 1 {
            args.into_iter().next().expect("checked").iter_values()?
        } else {
            args
        };
        let mut iter = elements.into_iter();
        let Some(mut best) = iter.next() else {
            return Err(QueryError::InvalidValue {
                message: format!("{}() arg is an empty sequence", builtin.name()),
            });
        };
        for candidate in iter {
            if compare_values(&candidate, &best)? == keep {
                best = candidate;
            }
        }
        Ok(best)
    }
}

/* ========================= Value operations ========================= */

/// Bracket indexing over the closed value union.
fn index_value(object: &Value, key: &Value) -> Result<Value, QueryError> {
    match object {
        Value::Mapping(entries) => match key {
            Value::Str(k) => entries
                .iter()
                .find(|(name, _)| name == k)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| QueryError::KeyNotFound { key: k.clone() }),
            other => Err(QueryError::mismatch(format!(
                "mapping keys are strings, got '{}'",
                other.kind()
            ))),
        },
        Value::List(items) => sequence_index(items, key, object.kind()),
        Value::Tuple(items) => sequence_index(items, key, object.kind()),
        Value::Str(s) => match key {
            Value::Int(i) => {
                let chars: Vec<char> = s.chars().collect();
                let idx = wrap_index(*i, chars.len())
                    .ok_or(QueryError::IndexOutOfRange {
                        index: *i,
                        len: chars.len(),
                    })?;
                Ok(Value::Str(chars[idx].to_string()))
            }
            Value::Slice(spec) => slice_value(&Value::Str(s.clone()), spec),
            other => Err(QueryError::mismatch(format!(
                "string indices must be integers or slices, got '{}'",
                other.kind()
            ))),
        },
        Value::Range(r) => match key {
            Value::Int(i) => {
                let idx = wrap_index(*i, r.len()).ok_or(QueryError::IndexOutOfRange {
                    index: *i,
                    len: r.len(),
                })?;
                Ok(Value::Int(r.at(idx).expect("index checked")))
            }
            Value::Slice(spec) => slice_value(&Value::Range(*r), spec),
            other => Err(QueryError::mismatch(format!(
                "range indices must be integers or slices, got '{}'",
                other.kind()
            ))),
        },
        other => Err(QueryError::not_indexable(other.kind())),
    }
}

fn sequence_index(items: &[Value], key: &Value, kind: &str) -> Result<Value, QueryError> {
    match key {
        Value::Int(i) => {
            let idx = wrap_index(*i, items.len()).ok_or(QueryError::IndexOutOfRange {
                index: *i,
                len: items.len(),
            })?;
            Ok(items[idx].clone())
        }
        Value::Slice(spec) => {
            let positions = resolve_slice(spec, items.len())?;
            Ok(Value::List(
                positions.into_iter().map(|i| items[i].clone()).collect(),
            ))
        }
        other => Err(QueryError::mismatch(format!(
            "{kind} indices must be integers or slices, got '{}'",
            other.kind()
        ))),
    }
}

/// Apply a slice to a sliceable value.
fn slice_value(object: &Value, spec: &SliceValue) -> Result<Value, QueryError> {
    match object {
        Value::List(items) => {
            let positions = resolve_slice(spec, items.len())?;
            Ok(Value::List(
                positions.into_iter().map(|i| items[i].clone()).collect(),
            ))
        }
        Value::Tuple(items) => {
            let positions = resolve_slice(spec, items.len())?;
            Ok(Value::Tuple(
                positions.into_iter().map(|i| items[i].clone()).collect(),
            ))
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let positions = resolve_slice(spec, chars.len())?;
            Ok(Value::Str(positions.into_iter().map(|i| chars[i]).collect()))
        }
        Value::Range(r) => {
            let positions = resolve_slice(spec, r.len())?;
            let step = spec.step.unwrap_or(1) * r.step;
            let start = positions
                .first()
                .map(|&i| r.at(i).expect("position in range"))
                .unwrap_or(0);
            let stop = start + step * positions.len() as i64;
            Ok(Value::Range(RangeValue { start, stop, step }))
        }
        other => Err(QueryError::mismatch(format!(
            "value of type '{}' cannot be sliced",
            other.kind()
        ))),
    }
}

/// Resolve a slice spec against a sequence length into concrete positions.
fn resolve_slice(spec: &SliceValue, len: usize) -> Result<Vec<usize>, QueryError> {
    let step = spec.step.unwrap_or(1);
    if step == 0 {
        return Err(QueryError::InvalidValue {
            message: "slice step cannot be zero".to_string(),
        });
    }
    let n = len as i64;
    let clamp = |value: i64, low: i64, high: i64| {
        let v = if value < 0 { value + n } else { value };
        v.clamp(low, high)
    };

    let mut positions = Vec::new();
    if step > 0 {
        let start = clamp(spec.start.unwrap_or(0), 0, n);
        let stop = clamp(spec.stop.unwrap_or(n), 0, n);
        let mut i = start;
        while i < stop {
            positions.push(i as usize);
            i += step;
        }
    } else {
        let start = clamp(spec.start.unwrap_or(n - 1), -1, n - 1);
        let stop = match spec.stop {
            None => -1,
            Some(s) => clamp(s, -1, n - 1),
        };
        let mut i = start;
        while i > stop {
            positions.push(i as usize);
            i += step;
        }
    }
    Ok(positions)
}

/// Python-style negative index resolution.
fn wrap_index(index: i64, len: usize) -> Option<usize> {
    let n = len as i64;
    let idx = if index < 0 { index + n } else { index };
    if idx >= 0 && idx < n { Some(idx as usize) } else { None }
}

fn eval_unary(op: UnaryOp, operand: Value) -> Result<Value, QueryError> {
    match (op, operand) {
        (UnaryOp::Not, v) => Ok(Value::Bool(!v.truthy())),
        (UnaryOp::Neg, Value::Int(i)) => Ok(i
            .checked_neg()
            .map(Value::Int)
            .unwrap_or(Value::Float(-(i as f64)))),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Pos, v @ (Value::Int(_) | Value::Float(_))) => Ok(v),
        (op, other) => Err(QueryError::mismatch(format!(
            "unary '{}' requires a number, got '{}'",
            match op {
                UnaryOp::Neg => "-",
                UnaryOp::Pos => "+",
                UnaryOp::Not => "not",
            },
            other.kind()
        ))),
    }
}

/// Numeric addition, or None when either side is not a number.
fn add_numbers(lhs: &Value, rhs: &Value) -> Option<Value> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Some(
            a.checked_add(*b)
                .map(Value::Int)
                .unwrap_or(Value::Float(*a as f64 + *b as f64)),
        ),
        (Value::Int(a), Value::Float(b)) => Some(Value::Float(*a as f64 + b)),
        (Value::Float(a), Value::Int(b)) => Some(Value::Float(a + *b as f64)),
        (Value::Float(a), Value::Float(b)) => Some(Value::Float(a + b)),
        _ => None,
    }
}

/// `+` over numbers and concatenatable sequences.
fn add_values(lhs: &Value, rhs: &Value) -> Result<Value, QueryError> {
    if let Some(number) = add_numbers(lhs, rhs) {
        return Ok(number);
    }
    match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (Value::List(a), Value::List(b)) => {
            let mut out = a.clone();
            out.extend(b.iter().cloned());
            Ok(Value::List(out))
        }
        (Value::Tuple(a), Value::Tuple(b)) => {
            let mut out = a.clone();
            out.extend(b.iter().cloned());
            Ok(Value::Tuple(out))
        }
        _ => Err(QueryError::mismatch(format!(
            "unsupported operand type(s) for +: '{}' and '{}'",
            lhs.kind(),
            rhs.kind()
        ))),
    }
}

/// `-`, `*`, `/`, `%` over numbers.
fn numeric_op(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, QueryError> {
    let pair = match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Some((*a as f64, *b as f64, Some((*a, *b)))),
        (Value::Int(a), Value::Float(b)) => Some((*a as f64, *b, None)),
        (Value::Float(a), Value::Int(b)) => Some((*a, *b as f64, None)),
        (Value::Float(a), Value::Float(b)) => Some((*a, *b, None)),
        _ => None,
    };
    let Some((a, b, ints)) = pair else {
        return Err(QueryError::mismatch(format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            op.symbol(),
            lhs.kind(),
            rhs.kind()
        )));
    };

    match op {
        BinaryOp::Sub => Ok(match ints {
            Some((x, y)) => x
                .checked_sub(y)
                .map(Value::Int)
                .unwrap_or(Value::Float(a - b)),
            None => Value::Float(a - b),
        }),
        BinaryOp::Mul => Ok(match ints {
            Some((x, y)) => x
                .checked_mul(y)
                .map(Value::Int)
                .unwrap_or(Value::Float(a * b)),
            None => Value::Float(a * b),
        }),
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(QueryError::Other {
                    message: "division by zero".to_string(),
                });
            }
            // true division always yields a float
            Ok(Value::Float(a / b))
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                return Err(QueryError::Other {
                    message: "modulo by zero".to_string(),
                });
            }
            Ok(match ints {
                // sign follows the divisor
                Some((x, y)) => {
                    let r = x.wrapping_rem(y);
                    Value::Int(if r != 0 && (r < 0) != (y < 0) { r + y } else { r })
                }
                None => Value::Float(((a % b) + b) % b),
            })
        }
        _ => unreachable!("only arithmetic ops reach numeric_op"),
    }
}

/// Structural equality; ints and floats compare numerically, mappings and
/// sets compare order-insensitively.
pub(super) fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
        (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Set(a), Value::Set(b)) => {
            a.len() == b.len()
                && a.iter().all(|x| b.iter().any(|y| values_equal(x, y)))
        }
        (Value::Mapping(a), Value::Mapping(b)) => {
            a.len() == b.len()
                && a.iter().all(|(k, v)| {
                    b.iter().any(|(k2, v2)| k == k2 && values_equal(v, v2))
                })
        }
        _ => lhs == rhs,
    }
}

/// Ordering for `<`/`<=`/`>`/`>=`, `sorted`, `min`, and `max`.
fn compare_values(lhs: &Value, rhs: &Value) -> Result<Ordering, QueryError> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (Value::Int(a), Value::Float(b)) => Ok((*a as f64).partial_cmp(b).unwrap_or(Ordering::Equal)),
        (Value::Float(a), Value::Int(b)) => Ok(a.partial_cmp(&(*b as f64)).unwrap_or(Ordering::Equal)),
        (Value::Float(a), Value::Float(b)) => Ok(a.partial_cmp(b).unwrap_or(Ordering::Equal)),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
        (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
            for (x, y) in a.iter().zip(b.iter()) {
                match compare_values(x, y)? {
                    Ordering::Equal => continue,
                    other => return Ok(other),
                }
            }
            Ok(a.len().cmp(&b.len()))
        }
        _ => Err(QueryError::mismatch(format!(
            "'<' not supported between values of type '{}' and '{}'",
            lhs.kind(),
            rhs.kind()
        ))),
    }
}

/// The `in` operator: `needle in haystack`.
fn contains_value(needle: &Value, haystack: &Value) -> Result<bool, QueryError> {
    match haystack {
        Value::Mapping(entries) => Ok(match needle {
            Value::Str(key) => entries.iter().any(|(k, _)| k == key),
            _ => false,
        }),
        Value::List(items) | Value::Tuple(items) | Value::Set(items) => {
            Ok(items.iter().any(|v| values_equal(v, needle)))
        }
        Value::Str(s) => match needle {
            Value::Str(sub) => Ok(s.contains(sub.as_str())),
            other => Err(QueryError::mismatch(format!(
                "'in <string>' requires a string as left operand, not '{}'",
                other.kind()
            ))),
        },
        Value::Range(r) => Ok(match needle {
            Value::Int(i) => r.values().iter().any(|v| matches!(v, Value::Int(x) if x == i)),
            _ => false,
        }),
        other => Err(QueryError::not_iterable(other.kind())),
    }
}

/// `isinstance(value, spec)`: spec is a constructor builtin, a type-name
/// string, or a tuple of either.
fn isinstance(value: &Value, spec: &Value) -> Result<bool, QueryError> {
    match spec {
        Value::Builtin(b) => match b.type_name() {
            Some(name) => Ok(value.kind() == name),
            None => Err(QueryError::mismatch(format!(
                "isinstance() arg 2 must be a type, got builtin '{}'",
                b.name()
            ))),
        },
        Value::Str(name) => Ok(value.kind() == name),
        Value::Tuple(specs) => {
            for s in specs {
                if isinstance(value, s)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        other => Err(QueryError::mismatch(format!(
            "isinstance() arg 2 must be a type or tuple of types, got '{}'",
            other.kind()
        ))),
    }
}

/// Fixed-arity argument unpacking with a uniform error message.
fn expect_args<const N: usize>(
    builtin: Builtin,
    args: Vec<Value>,
) -> Result<[Value; N], QueryError> {
    let got = args.len();
    args.try_into()
        .map_err(|_| arity_error(builtin, &N.to_string(), got))
}

/// Zero-or-one argument unpacking.
fn expect_optional_arg(builtin: Builtin, args: Vec<Value>) -> Result<Option<Value>, QueryError> {
    let got = args.len();
    if got > 1 {
        return Err(arity_error(builtin, "0 or 1", got));
    }
    Ok(args.into_iter().next())
}

fn arity_error(builtin: Builtin, expected: &str, got: usize) -> QueryError {
    QueryError::mismatch(format!(
        "{}() takes {expected} argument(s) ({got} given)",
        builtin.name()
    ))
}
