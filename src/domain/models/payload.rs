//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Values carried by an emit call and the shape in which listeners receive them.
//
// | Name          | Description                                                       |
// |---------------|-------------------------------------------------------------------|
// | Arg           | One emitted value: a JSON value or an error instance              |
// | Payload       | Arity-aware delivery shape: Empty / Single / Multi                |
// | Listener      | Shared callback invoked with a payload                            |
//--------------------------------------------------------------------------------------------------

use serde_json::Value;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Shared error instance carried through an emit call.
pub type SharedError = Arc<dyn StdError + Send + Sync>;

/// A listener attached to a channel or a legacy emitter.
///
/// Listeners are shared by pointer, so the same callback can be moved from a
/// legacy emitter onto a mediator and still be recognised as the same listener.
pub type Listener = Arc<dyn Fn(&Payload) -> anyhow::Result<()> + Send + Sync>;

/// Wraps a closure as a [`Listener`].
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&Payload) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A single value passed to `emit`.
#[derive(Clone)]
pub enum Arg {
    /// Plain data
    Value(Value),
    /// An error instance, compared by identity
    Error(SharedError),
}

impl Arg {
    /// Wraps an error instance.
    pub fn error<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Arg::Error(Arc::new(err))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Arg::Value(value) => Some(value),
            Arg::Error(_) => None,
        }
    }

    pub fn as_error(&self) -> Option<&SharedError> {
        match self {
            Arg::Value(_) => None,
            Arg::Error(err) => Some(err),
        }
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Arg::Error(err) => f.debug_tuple("Error").field(&err.to_string()).finish(),
        }
    }
}

/// Strings render without quotes, everything else as JSON.
impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Value(Value::String(s)) => write!(f, "{}", s),
            Arg::Value(value) => write!(f, "{}", value),
            Arg::Error(err) => write!(f, "{}", err),
        }
    }
}

impl PartialEq for Arg {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Arg::Value(a), Arg::Value(b)) => a == b,
            (Arg::Error(a), Arg::Error(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

impl From<SharedError> for Arg {
    fn from(err: SharedError) -> Self {
        Arg::Error(err)
    }
}

macro_rules! arg_from_json {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Arg::Value(Value::from(value))
                }
            }
        )*
    };
}

arg_from_json!(&str, String, bool, i32, i64, u32, u64, f64);

/// What a listener receives for one emit call.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    /// No values were emitted
    #[default]
    Empty,
    /// Exactly one value was emitted
    Single(Arg),
    /// Two or more values, delivered together in emit order
    Multi(Vec<Arg>),
}

impl Payload {
    /// Applies the arity rule: zero values give `Empty`, one gives `Single`,
    /// anything more is kept together as `Multi`.
    pub fn from_args(mut args: Vec<Arg>) -> Self {
        match args.len() {
            0 => Payload::Empty,
            1 => Payload::Single(args.remove(0)),
            _ => Payload::Multi(args),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }

    /// Number of emitted values behind this payload.
    pub fn arity(&self) -> usize {
        match self {
            Payload::Empty => 0,
            Payload::Single(_) => 1,
            Payload::Multi(args) => args.len(),
        }
    }

    /// The emitted values in order.
    pub fn args(&self) -> &[Arg] {
        match self {
            Payload::Empty => &[],
            Payload::Single(arg) => std::slice::from_ref(arg),
            Payload::Multi(args) => args,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, thiserror::Error)]
    #[error("disk full")]
    struct DiskFull;

    #[test]
    fn test_from_args_applies_arity_rule() {
        assert_eq!(Payload::from_args(vec![]), Payload::Empty);
        assert!(Payload::from_args(vec![]).is_empty());
        assert_eq!(Payload::from_args(vec![Arg::from(7)]), Payload::Single(Arg::from(7)));
        assert!(!Payload::from_args(vec![Arg::from(7)]).is_empty());

        let multi = Payload::from_args(vec![Arg::from("a"), Arg::from(json!({"k": 1}))]);
        assert_eq!(multi.arity(), 2);
        assert_eq!(multi.args()[1].as_value(), Some(&json!({"k": 1})));
        assert!(matches!(multi, Payload::Multi(_)));
    }

    #[test]
    fn test_error_args_compare_by_identity() {
        let err: SharedError = Arc::new(DiskFull);
        let a = Arg::Error(Arc::clone(&err));
        let other = Arg::error(DiskFull);
        assert!(a.as_error().is_some_and(|raised| Arc::ptr_eq(raised, &err)));
        assert!(a.as_value().is_none());
        assert!(Arg::from("disk full").as_error().is_none());
        let b = Arg::Error(err);

        assert_eq!(a, b);
        assert_ne!(a, other);
        assert_ne!(a, Arg::from("disk full"));
    }

    #[test]
    fn test_display_leaves_strings_unquoted() {
        assert_eq!(Arg::from("boom").to_string(), "boom");
        assert_eq!(Arg::from(json!([1, 2])).to_string(), "[1,2]");
        assert_eq!(Arg::from(Value::Null).to_string(), "null");
        assert_eq!(Arg::error(DiskFull).to_string(), "disk full");
    }
}
