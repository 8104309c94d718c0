//! The evaluator's callable allowlist.
//!
//! These are the only names callable from a query, mirroring the fixed set
//! of operations the tool exposes: inspection (`len`, `type`,
//! `isinstance`), aggregation (`sum`, `min`, `max`, `any`, `all`),
//! transformation (`sorted`, `filter`, `map`, `zip`, `enumerate`),
//! construction (`list`, `dict`, `set`, `tuple`, `range`, `slice`),
//! coercion (`str`, `int`, `float`, `bool`), and numerics (`abs`,
//! `round`). Nothing here can reach the process, the filesystem, or the
//! network; each builtin is a pure function over [`Value`]s.
//!
//! The application logic for each builtin lives in the interpreter, which
//! owns lambda invocation.

use super::value::Value;

/// A builtin function from the fixed allowlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Len,
    Sum,
    Min,
    Max,
    Sorted,
    Filter,
    Map,
    List,
    Dict,
    Set,
    Tuple,
    Str,
    Int,
    Float,
    Bool,
    Type,
    Isinstance,
    Range,
    Zip,
    Enumerate,
    Any,
    All,
    Abs,
    Round,
    Slice,
}

impl Builtin {
    /// Every allowlisted builtin, in allowlist order.
    pub const ALL: [Builtin; 25] = [
        Builtin::Len,
        Builtin::Sum,
        Builtin::Min,
        Builtin::Max,
        Builtin::Sorted,
        Builtin::Filter,
        Builtin::Map,
        Builtin::List,
        Builtin::Dict,
        Builtin::Set,
        Builtin::Tuple,
        Builtin::Str,
        Builtin::Int,
        Builtin::Float,
        Builtin::Bool,
        Builtin::Type,
        Builtin::Isinstance,
        Builtin::Range,
        Builtin::Zip,
        Builtin::Enumerate,
        Builtin::Any,
        Builtin::All,
        Builtin::Abs,
        Builtin::Round,
        Builtin::Slice,
    ];

    /// The callable name of this builtin.
    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Len => "len",
            Builtin::Sum => "sum",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Sorted => "sorted",
            Builtin::Filter => "filter",
            Builtin::Map => "map",
            Builtin::List => "list",
            Builtin::Dict => "dict",
            Builtin::Set => "set",
            Builtin::Tuple => "tuple",
            Builtin::Str => "str",
            Builtin::Int => "int",
            Builtin::Float => "float",
            Builtin::Bool => "bool",
            Builtin::Type => "type",
            Builtin::Isinstance => "isinstance",
            Builtin::Range => "range",
            Builtin::Zip => "zip",
            Builtin::Enumerate => "enumerate",
            Builtin::Any => "any",
            Builtin::All => "all",
            Builtin::Abs => "abs",
            Builtin::Round => "round",
            Builtin::Slice => "slice",
        }
    }

    /// Resolve an identifier against the allowlist.
    pub fn lookup(name: &str) -> Option<Builtin> {
        Builtin::ALL.iter().copied().find(|b| b.name() == name)
    }

    /// The type name a constructor builtin produces, used by `type` and
    /// `isinstance`. Non-constructor builtins return `None`.
    pub fn type_name(&self) -> Option<&'static str> {
        match self {
            Builtin::List => Some("list"),
            Builtin::Dict => Some("dict"),
            Builtin::Set => Some("set"),
            Builtin::Tuple => Some("tuple"),
            Builtin::Str => Some("str"),
            Builtin::Int => Some("int"),
            Builtin::Float => Some("float"),
            Builtin::Bool => Some("bool"),
            Builtin::Range => Some("range"),
            Builtin::Slice => Some("slice"),
            _ => None,
        }
    }

    /// The constructor builtin for a runtime value's type, when one exists.
    pub fn for_value(value: &Value) -> Option<Builtin> {
        match value {
            Value::Bool(_) => Some(Builtin::Bool),
            Value::Int(_) => Some(Builtin::Int),
            Value::Float(_) => Some(Builtin::Float),
            Value::Str(_) => Some(Builtin::Str),
            Value::List(_) => Some(Builtin::List),
            Value::Mapping(_) => Some(Builtin::Dict),
            Value::Tuple(_) => Some(Builtin::Tuple),
            Value::Set(_) => Some(Builtin::Set),
            Value::Range(_) => Some(Builtin::Range),
            Value::Slice(_) => Some(Builtin::Slice),
            Value::Null | Value::Lambda(_) | Value::Builtin(_) => None,
        }
    }
}

/// Allowlist names in sorted order, for the `UnknownName` error message.
pub fn allowlist() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Builtin::ALL.iter().map(|b| b.name()).collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_covers_every_name() {
        for builtin in Builtin::ALL {
            assert_eq!(Builtin::lookup(builtin.name()), Some(builtin));
        }
        assert_eq!(Builtin::lookup("open"), None);
        assert_eq!(Builtin::lookup("eval"), None);
        assert_eq!(Builtin::lookup("__import__"), None);
        assert_eq!(Builtin::lookup("getattr"), None);
    }

    #[test]
    fn test_allowlist_is_sorted_and_complete() {
        let names = allowlist();
        assert_eq!(names.len(), Builtin::ALL.len());
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert!(names.contains(&"len"));
        assert!(names.contains(&"isinstance"));
    }

    #[test]
    fn test_type_name_round_trip() {
        assert_eq!(Builtin::for_value(&Value::Int(1)), Some(Builtin::Int));
        assert_eq!(Builtin::Int.type_name(), Some("int"));
        assert_eq!(Builtin::for_value(&Value::Null), None);
        assert_eq!(Builtin::Len.type_name(), None);
    }
}
