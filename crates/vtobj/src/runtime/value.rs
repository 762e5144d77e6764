//! Field values and construction arguments.
//!
//! Every instance field holds a [`Value`]. Constructors receive their
//! arguments as an [`Args`] cursor and take them in order with the typed
//! `next_*` readers; a reader that finds the wrong kind of value reports
//! [`Error::ArgumentTypeMismatch`] and leaves the value in place.

use crate::error::{Error, Result};
use crate::runtime::{Class, ObjRef};
use std::any::Any;
use std::collections::VecDeque;
use std::fmt;

/// One field word.
#[derive(Default)]
pub enum Value {
    /// Unset. Fresh instances start with every field `Nil`.
    #[default]
    Nil,
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Owned text.
    Str(String),
    /// Reference to another object. Whether it is owned is up to the class.
    Obj(ObjRef),
    /// A class descriptor.
    Class(Class),
    /// Class-private native storage.
    Native(Box<dyn Any>),
}

impl Value {
    /// Boxes `value` as native storage.
    pub fn native<T: Any>(value: T) -> Self {
        Value::Native(Box::new(value))
    }

    /// Stores an index or count as an integer, saturating at `i64::MAX`.
    #[must_use]
    pub fn index(value: usize) -> Self {
        Value::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }

    /// Returns the value kind, as used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Obj(_) => "object",
            Value::Class(_) => "class",
            Value::Native(_) => "native",
        }
    }

    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_obj(&self) -> Option<ObjRef> {
        match self {
            Value::Obj(obj) => Some(*obj),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_class(&self) -> Option<Class> {
        match self {
            Value::Class(class) => Some(*class),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Int(value) => write!(f, "Int({value})"),
            Value::Float(value) => write!(f, "Float({value})"),
            Value::Str(value) => write!(f, "Str({value:?})"),
            Value::Obj(obj) => write!(f, "Obj({obj})"),
            Value::Class(class) => write!(f, "Class({})", class.name()),
            Value::Native(_) => write!(f, "Native(..)"),
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::index(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<ObjRef> for Value {
    fn from(obj: ObjRef) -> Self {
        Value::Obj(obj)
    }
}

impl From<Class> for Value {
    fn from(class: Class) -> Self {
        Value::Class(class)
    }
}

/// Construction arguments, consumed front to back.
///
/// Each constructor in a chain takes the arguments it needs and passes the
/// rest on; whatever is left when construction finishes is reported as a
/// warning.
///
/// # Example
///
/// ```rust
/// use vtobj::args;
///
/// let mut args = args![7, "seven"];
/// assert_eq!(args.next_int().unwrap(), 7);
/// assert!(args.next_int().is_err());
/// assert_eq!(args.next_str().unwrap(), "seven");
/// assert!(args.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct Args {
    values: VecDeque<Value>,
    consumed: usize,
}

impl Args {
    /// Creates an empty argument list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an argument.
    #[must_use]
    pub fn with(mut self, value: impl Into<Value>) -> Self {
        self.values.push_back(value.into());
        self
    }

    /// Number of arguments not yet taken.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if every argument has been taken.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of arguments taken so far.
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    fn take<T>(
        &mut self,
        expected: &'static str,
        pick: impl FnOnce(Value) -> std::result::Result<T, Value>,
    ) -> Result<T> {
        let index = self.consumed;
        let value = self
            .values
            .pop_front()
            .ok_or(Error::MissingArgument { index })?;

        match pick(value) {
            Ok(taken) => {
                self.consumed += 1;
                Ok(taken)
            }
            Err(value) => {
                let got = value.kind();
                self.values.push_front(value);
                Err(Error::ArgumentTypeMismatch {
                    expected,
                    got,
                    index,
                })
            }
        }
    }

    /// Takes the next argument whatever its kind.
    pub fn next_value(&mut self) -> Result<Value> {
        self.take("value", Ok)
    }

    /// Takes the next argument as an integer.
    pub fn next_int(&mut self) -> Result<i64> {
        self.take("int", |value| match value {
            Value::Int(n) => Ok(n),
            other => Err(other),
        })
    }

    /// Takes the next argument as an integer, or returns `default` if none is
    /// left.
    pub fn next_int_or(&mut self, default: i64) -> Result<i64> {
        if self.is_empty() {
            return Ok(default);
        }
        self.next_int()
    }

    /// Takes the next argument as a float. Integers are widened.
    pub fn next_float(&mut self) -> Result<f64> {
        self.take("float", |value| match value {
            Value::Float(x) => Ok(x),
            #[allow(clippy::cast_precision_loss)]
            Value::Int(n) => Ok(n as f64),
            other => Err(other),
        })
    }

    /// Takes the next argument as text.
    pub fn next_str(&mut self) -> Result<String> {
        self.take("str", |value| match value {
            Value::Str(text) => Ok(text),
            other => Err(other),
        })
    }

    /// Takes the next argument as an object handle.
    pub fn next_obj(&mut self) -> Result<ObjRef> {
        self.take("object", |value| match value {
            Value::Obj(obj) => Ok(obj),
            other => Err(other),
        })
    }

    /// Takes the next argument as a class descriptor.
    pub fn next_class(&mut self) -> Result<Class> {
        self.take("class", |value| match value {
            Value::Class(class) => Ok(class),
            other => Err(other),
        })
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Args {
            values: values.into(),
            consumed: 0,
        }
    }
}

impl FromIterator<Value> for Args {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Args {
            values: iter.into_iter().collect(),
            consumed: 0,
        }
    }
}

/// Builds an [`Args`] list, converting each expression with `Value::from`.
///
/// ```rust
/// use vtobj::args;
///
/// let args = args![1, 2.5, "three"];
/// assert_eq!(args.remaining(), 3);
/// assert!(args![].is_empty());
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Args::from(vec![$($crate::Value::from($value)),+])
    };
}
