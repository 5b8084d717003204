use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use super::code::Instructions;

/// Signature of a host function callable from the VM. Errors are plain messages;
/// the VM wraps them with the builtin's name.
pub type BuiltinFn = fn(&[Value]) -> Result<Value, String>;

/// VM-internal representation of a value.
///
/// Integers, booleans and null live inline. Everything else is an immutable
/// [`Object`] behind an `Rc`, so cloning a value never copies a string or array.
#[derive(Debug, Clone)]
pub enum Value {
    /// Signed 64-bit integer; arithmetic wraps.
    Integer(i64),
    /// Boolean.
    Boolean(bool),
    /// Null is a type and a value.
    Null,
    /// Reference-counted heap object.
    Object(Rc<Object>),
}

/// Heap-allocated values. Once built they are never mutated.
#[derive(Debug)]
pub enum Object {
    #[allow(missing_docs)]
    String(String),
    /// Ordered elements.
    Array(Vec<Value>),
    /// Values stored under the canonical hash of their key.
    Map(BTreeMap<HashKey, MapEntry>),
    #[allow(missing_docs)]
    CompiledFunction(CompiledFunction),
    #[allow(missing_docs)]
    Builtin(Builtin),
}

/// A map slot keeps the original key next to its value so it can be displayed.
#[derive(Debug, Clone)]
pub struct MapEntry {
    #[allow(missing_docs)]
    pub key: Value,
    #[allow(missing_docs)]
    pub value: Value,
}

/// Canonical key of a hashable value, e.g. `INTEGER:5`. Two values share a key
/// exactly when they are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HashKey(String);

/// A unit of compiled code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledFunction {
    #[allow(missing_docs)]
    pub instructions: Instructions,
}

/// A named host function.
#[derive(Clone, Copy)]
pub struct Builtin {
    /// Name the function is registered under.
    pub name: &'static str,
    /// The host function.
    pub func: BuiltinFn,
}

impl std::fmt::Debug for Builtin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builtin").field("name", &self.name).finish()
    }
}

impl Value {
    /// Wrap a string.
    pub fn string(s: impl Into<String>) -> Value {
        Value::Object(Rc::new(Object::String(s.into())))
    }

    /// Wrap an array.
    pub fn array(elements: Vec<Value>) -> Value {
        Value::Object(Rc::new(Object::Array(elements)))
    }

    /// Build a map from key/value pairs; a later pair replaces an earlier one with
    /// an equal key. Fails on the first unhashable key, returning it.
    pub fn map(pairs: impl IntoIterator<Item = (Value, Value)>) -> Result<Value, Value> {
        let mut entries = BTreeMap::new();
        for (key, value) in pairs {
            let hash = key.hash_key().ok_or_else(|| key.clone())?;
            entries.insert(hash, MapEntry { key, value });
        }
        Ok(Value::Object(Rc::new(Object::Map(entries))))
    }

    /// Upper-case type label used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Boolean(_) => "BOOLEAN",
            Value::Null => "NULL",
            Value::Object(o) => match &**o {
                Object::String(_) => "STRING",
                Object::Array(_) => "ARRAY",
                Object::Map(_) => "MAP",
                Object::CompiledFunction(_) => "COMPILED_FUNCTION",
                Object::Builtin(_) => "BUILTIN",
            },
        }
    }

    /// Only integers, booleans and strings are hashable.
    pub fn hash_key(&self) -> Option<HashKey> {
        let key = match self {
            Value::Integer(i) => format!("INTEGER:{}", i),
            Value::Boolean(b) => format!("BOOLEAN:{}", b),
            Value::Object(o) => match &**o {
                Object::String(s) => format!("STRING:{}", s),
                _ => return None,
            },
            Value::Null => return None,
        };
        Some(HashKey(key))
    }

    /// Equality as the `==` operator sees it: integers, booleans and strings by
    /// value, null equals null, other objects by identity.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Object(a), Value::Object(b)) => match (&**a, &**b) {
                (Object::String(a), Object::String(b)) => a == b,
                _ => Rc::ptr_eq(a, b),
            },
            _ => false,
        }
    }

    /// The string contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Object(o) => match &**o {
                Object::String(s) => Some(s),
                _ => None,
            },
            _ => None,
        }
    }

    /// The elements, if this is an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Object(o) => match &**o {
                Object::Array(elements) => Some(elements),
                _ => None,
            },
            _ => None,
        }
    }

    // Strings nested in arrays and maps are quoted.
    fn fmt_nested(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.as_str() {
            Some(s) => write!(f, "\"{}\"", s),
            None => write!(f, "{}", self),
        }
    }
}

/// Structural equality, for comparing results in tests and at the API surface.
/// The `==` operator uses [`Value::same`] instead.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b) || **a == **b,
            _ => false,
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::String(a), Object::String(b)) => a == b,
            (Object::Array(a), Object::Array(b)) => a == b,
            (Object::Map(a), Object::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|((ka, ea), (kb, eb))| ka == kb && ea.value == eb.value)
            }
            (Object::CompiledFunction(a), Object::CompiledFunction(b)) => a == b,
            (Object::Builtin(a), Object::Builtin(b)) => a.name == b.name,
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{}", i),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Null => write!(f, "null"),
            Self::Object(o) => write!(f, "{}", o),
        }
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Object::String(s) => f.write_str(s),
            Object::Array(elements) => {
                f.write_str("[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    element.fmt_nested(f)?;
                }
                f.write_str("]")
            }
            Object::Map(entries) => {
                f.write_str("{")?;
                for (i, entry) in entries.values().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    entry.key.fmt_nested(f)?;
                    f.write_str(": ")?;
                    entry.value.fmt_nested(f)?;
                }
                f.write_str("}")
            }
            Object::CompiledFunction(function) => {
                write!(f, "<compiled fn, {} bytes>", function.instructions.len())
            }
            Object::Builtin(builtin) => write!(f, "<builtin {}>", builtin.name),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<Builtin> for Value {
    fn from(builtin: Builtin) -> Self {
        Value::Object(Rc::new(Object::Builtin(builtin)))
    }
}

impl From<CompiledFunction> for Value {
    fn from(function: CompiledFunction) -> Self {
        Value::Object(Rc::new(Object::CompiledFunction(function)))
    }
}
