use std::collections::BTreeMap;

use super::value::{Builtin, BuiltinFn, Object, Value};

/// Registry of host functions, looked up by name. The VM is handed one at
/// construction instead of consulting global state.
#[derive(Debug, Clone, Default)]
pub struct Builtins {
    functions: BTreeMap<&'static str, Builtin>,
}

impl Builtins {
    /// An empty registry.
    pub fn new() -> Self {
        Builtins {
            functions: BTreeMap::new(),
        }
    }

    /// `len`, `push`, `isEmpty`, `first`, `last`, `rest` and `puts`.
    pub fn standard() -> Self {
        let mut builtins = Builtins::new();
        builtins.register("len", len);
        builtins.register("push", push);
        builtins.register("isEmpty", is_empty);
        builtins.register("first", first);
        builtins.register("last", last);
        builtins.register("rest", rest);
        builtins.register("puts", puts);
        builtins
    }

    /// Add or replace a function.
    pub fn register(&mut self, name: &'static str, func: BuiltinFn) {
        self.functions.insert(name, Builtin { name, func });
    }

    /// Look a function up by name.
    pub fn get(&self, name: &str) -> Option<&Builtin> {
        self.functions.get(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.functions.keys().copied()
    }
}

fn check_arity(args: &[Value], want: usize) -> Result<(), String> {
    if args.len() != want {
        return Err(format!(
            "wrong number of arguments. got={}, want={}",
            args.len(),
            want
        ));
    }
    Ok(())
}

fn array_arg<'a>(name: &str, arg: &'a Value) -> Result<&'a [Value], String> {
    arg.as_array().ok_or_else(|| {
        format!(
            "argument to `{}` must be ARRAY, got {}",
            name,
            arg.type_name()
        )
    })
}

fn length_of(name: &str, arg: &Value) -> Result<usize, String> {
    if let Value::Object(o) = arg {
        match &**o {
            Object::String(s) => return Ok(s.len()),
            Object::Array(elements) => return Ok(elements.len()),
            Object::Map(entries) => return Ok(entries.len()),
            _ => {}
        }
    }
    Err(format!(
        "argument to `{}` not supported, got {}",
        name,
        arg.type_name()
    ))
}

fn len(args: &[Value]) -> Result<Value, String> {
    check_arity(args, 1)?;
    let length = length_of("len", &args[0])?;
    i64::try_from(length)
        .map(Value::Integer)
        .map_err(|_| String::from("length does not fit in an integer"))
}

fn is_empty(args: &[Value]) -> Result<Value, String> {
    check_arity(args, 1)?;
    Ok(Value::Boolean(length_of("isEmpty", &args[0])? == 0))
}

// Returns a new array; the argument is left untouched.
fn push(args: &[Value]) -> Result<Value, String> {
    check_arity(args, 2)?;
    let mut elements = array_arg("push", &args[0])?.to_vec();
    elements.push(args[1].clone());
    Ok(Value::array(elements))
}

fn first(args: &[Value]) -> Result<Value, String> {
    check_arity(args, 1)?;
    let elements = array_arg("first", &args[0])?;
    Ok(elements.first().cloned().unwrap_or(Value::Null))
}

fn last(args: &[Value]) -> Result<Value, String> {
    check_arity(args, 1)?;
    let elements = array_arg("last", &args[0])?;
    Ok(elements.last().cloned().unwrap_or(Value::Null))
}

// Everything but the first element, or null for an empty array.
fn rest(args: &[Value]) -> Result<Value, String> {
    check_arity(args, 1)?;
    match array_arg("rest", &args[0])? {
        [] => Ok(Value::Null),
        [_, tail @ ..] => Ok(Value::array(tail.to_vec())),
    }
}

fn puts(args: &[Value]) -> Result<Value, String> {
    for arg in args {
        println!("{}", arg);
    }
    Ok(Value::Null)
}

#[cfg(test)]
mod test {
    use super::*;

    fn call(name: &str, args: &[Value]) -> Result<Value, String> {
        let builtins = Builtins::standard();
        let builtin = builtins.get(name).expect("registered");
        (builtin.func)(args)
    }

    #[test]
    fn test_len() {
        assert_eq!(call("len", &["four".into()]), Ok(4.into()));
        assert_eq!(call("len", &[Value::array(vec![1.into(), 2.into()])]), Ok(2.into()));
        assert_eq!(
            call("len", &[1.into()]),
            Err(String::from("argument to `len` not supported, got INTEGER"))
        );
        assert_eq!(
            call("len", &["a".into(), "b".into()]),
            Err(String::from("wrong number of arguments. got=2, want=1"))
        );
    }

    #[test]
    fn test_push_returns_new_array() {
        let original = Value::array(vec![1.into()]);
        let pushed = call("push", &[original.clone(), 2.into()]).expect("valid push");
        assert_eq!(pushed, Value::array(vec![1.into(), 2.into()]));
        assert_eq!(original, Value::array(vec![1.into()]));
        assert!(call("push", &[1.into(), 2.into()]).is_err());
    }

    #[test]
    fn test_array_accessors() {
        let array = Value::array(vec![1.into(), 2.into(), 3.into()]);
        let empty = Value::array(vec![]);
        assert_eq!(call("first", &[array.clone()]), Ok(1.into()));
        assert_eq!(call("last", &[array.clone()]), Ok(3.into()));
        assert_eq!(
            call("rest", &[array]),
            Ok(Value::array(vec![2.into(), 3.into()]))
        );
        assert_eq!(call("first", &[empty.clone()]), Ok(Value::Null));
        assert_eq!(call("rest", &[empty.clone()]), Ok(Value::Null));
        assert_eq!(call("isEmpty", &[empty]), Ok(true.into()));
        assert_eq!(call("isEmpty", &["x".into()]), Ok(false.into()));
    }

    #[test]
    fn test_registry() {
        let mut builtins = Builtins::new();
        assert!(builtins.get("len").is_none());
        builtins.register("answer", |_| Ok(Value::Integer(42)));
        let answer = builtins.get("answer").expect("just registered");
        assert_eq!((answer.func)(&[]), Ok(42.into()));
        let names: Vec<_> = Builtins::standard().names().collect();
        assert_eq!(
            names,
            vec!["first", "isEmpty", "last", "len", "push", "puts", "rest"]
        );
    }
}
