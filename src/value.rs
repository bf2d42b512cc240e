use crate::members::{Member, TypeDescriptor};
use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Nesting below which objects are still rendered with their members.
const RENDER_DEPTH: usize = 2;

#[derive(Debug, Clone)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Str(String),
}

impl Scalar {
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Bool(_) => "bool",
            Scalar::Int(_) => "int",
            Scalar::Float(_) => "float",
            Scalar::Char(_) => "char",
            Scalar::Str(_) => "string",
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Int(a), Scalar::Int(b)) => a == b,
            // NaN matches NaN.
            (Scalar::Float(a), Scalar::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Scalar::Char(a), Scalar::Char(b)) => a == b,
            (Scalar::Str(a), Scalar::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x:?}"),
            Scalar::Char(c) => write!(f, "'{c}'"),
            Scalar::Str(s) => write!(f, "{s:?}"),
        }
    }
}

/// A symbolic enum member together with its numeric value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub type_name: String,
    pub name: String,
    pub value: i64,
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} {{value: {}}}", self.type_name, self.name, self.value)
    }
}

pub struct Object {
    ty: Arc<TypeDescriptor>,
    values: HashMap<String, Value>,
}

/// Shared handle to an object instance.
///
/// Identity is the allocation: two handles are the same object iff
/// [`ObjectRef::ptr_eq`] holds. Member values can be replaced after
/// construction, which is how self-referential graphs are built.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Object>>);

impl ObjectRef {
    pub fn new(ty: &Arc<TypeDescriptor>) -> Self {
        ObjectRef(Rc::new(RefCell::new(Object {
            ty: Arc::clone(ty),
            values: HashMap::new(),
        })))
    }

    pub fn with(self, member: &str, value: impl Into<Value>) -> Self {
        self.set(member, value);
        self
    }

    pub fn set(&self, member: &str, value: impl Into<Value>) {
        self.0
            .borrow_mut()
            .values
            .insert(member.to_string(), value.into());
    }

    /// Current value of a member; `None` when it was never assigned.
    pub fn get(&self, member: &str) -> Option<Ref<'_, Value>> {
        Ref::filter_map(self.0.borrow(), |obj| obj.values.get(member)).ok()
    }

    pub fn type_descriptor(&self) -> Arc<TypeDescriptor> {
        Arc::clone(&self.0.borrow().ty)
    }

    pub fn type_name(&self) -> String {
        self.0.borrow().ty.name().to_string()
    }

    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({}@{:#x})", self.type_name(), self.id())
    }
}

/// A node in a compared graph.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Scalar(Scalar),
    Enum(EnumValue),
    Sequence(Vec<Value>),
    /// Entries in insertion order.
    Map(Vec<(Value, Value)>),
    Object(ObjectRef),
}

impl Value {
    pub fn seq<I, T>(items: I) -> Value
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }

    pub fn map<I, K, V>(entries: I) -> Value
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn enumeration(type_name: &str, name: &str, value: i64) -> Value {
        Value::Enum(EnumValue {
            type_name: type_name.to_string(),
            name: name.to_string(),
            value,
        })
    }

    /// An object of an ad-hoc type whose members are public properties named
    /// after the given entries.
    pub fn anonymous<I, K, V>(members: I) -> Value
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::anonymous_owned(members.into_iter().map(|(k, v)| (k.into(), v.into())))
    }

    fn anonymous_owned(members: impl Iterator<Item = (String, Value)>) -> Value {
        let members: Vec<(String, Value)> = members.collect();
        let ty = members
            .iter()
            .fold(TypeDescriptor::builder("anonymous"), |b, (name, _)| {
                b.member(Member::property(name.clone()))
            })
            .build();
        let obj = ObjectRef::new(&ty);
        for (name, value) in members {
            obj.set(&name, value);
        }
        Value::Object(obj)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Scalar(s) => s.type_name().to_string(),
            Value::Enum(e) => e.type_name.clone(),
            Value::Sequence(_) => "sequence".to_string(),
            Value::Map(_) => "dictionary".to_string(),
            Value::Object(obj) => obj.type_name(),
        }
    }

    /// Equality used to pair dictionary keys: values for leaves, identity for
    /// objects.
    pub fn key_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Scalar(a), Value::Scalar(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Text of a dictionary key as it appears in a path segment.
    pub fn key_text(&self) -> String {
        match self {
            Value::Scalar(Scalar::Str(s)) => s.clone(),
            Value::Scalar(Scalar::Char(c)) => c.to_string(),
            Value::Enum(e) => e.name.clone(),
            other => other.to_string(),
        }
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        match self {
            Value::Null => write!(f, "<null>"),
            Value::Scalar(s) => write!(f, "{s}"),
            Value::Enum(e) => write!(f, "{e}"),
            Value::Sequence(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.render(f, depth + 1)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    k.render(f, depth + 1)?;
                    write!(f, ": ")?;
                    v.render(f, depth + 1)?;
                }
                write!(f, "}}")
            }
            Value::Object(obj) => {
                let ty = obj.type_descriptor();
                if depth >= RENDER_DEPTH || ty.members().is_empty() {
                    return write!(f, "{} {{...}}", ty.name());
                }
                write!(f, "{} {{ ", ty.name())?;
                for (i, member) in ty.members().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} = ", member.name())?;
                    match obj.get(member.name()) {
                        Some(v) => v.render(f, depth + 1)?,
                        None => write!(f, "<null>")?,
                    }
                }
                write!(f, " }}")
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, 0)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Scalar(Scalar::Int(i))
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Scalar(Scalar::Int(i64::from(i)))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Scalar(Scalar::Int(i64::from(i)))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Scalar(Scalar::Float(x))
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Scalar(Scalar::Char(c))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(Scalar::Str(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(Scalar::Str(s))
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

impl From<&ObjectRef> for Value {
    fn from(obj: &ObjectRef) -> Self {
        Value::Object(obj.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => b.into(),
            serde_json::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => i.into(),
                (None, Some(x)) => x.into(),
                (None, None) => n.to_string().into(),
            },
            serde_json::Value::String(s) => s.into(),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::anonymous_owned(map.into_iter().map(|(k, v)| (k, Value::from(v))))
            }
        }
    }
}
