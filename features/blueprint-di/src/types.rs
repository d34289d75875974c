use std::{
    any::{Any, TypeId},
    fmt::{self, Debug, Display},
    sync::Arc,
};

/// Opaque error produced by collaborators and user factories
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Anything stored in the repository may be handed to other threads by the surrounding
/// container, so instances need to be Send + Sync + 'static
pub trait Injectable: Send + Sync + 'static {}
impl<T: Send + Sync + 'static> Injectable for T {}

/// A type erased object produced by a factory
#[derive(Clone)]
pub struct Instance {
    pub info: TypeInfo,
    pub instance: Arc<dyn Any + Send + Sync + 'static>,
}

impl Instance {
    pub fn new<ExistingInstance: Injectable>(instance: ExistingInstance) -> Self {
        Self::from_arc(Arc::new(instance))
    }

    /// Wraps an already shared object without copying it
    pub fn from_arc<ExistingInstance: Injectable>(instance: Arc<ExistingInstance>) -> Self {
        Instance {
            info: TypeInfo::of::<ExistingInstance>(),
            instance,
        }
    }

    pub fn downcast<T: Injectable>(&self) -> Result<Arc<T>, &'static str> {
        match Arc::downcast::<T>(self.instance.clone()) {
            Ok(downcasted) => Ok(downcasted),
            Err(_) => Err(self.info.type_name),
        }
    }

    /// Both handles point at the same object
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.instance, &other.instance)
    }
}
impl Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Instance").field(&self.info.type_name).finish()
    }
}

/// Type Name and Type Id
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct TypeInfo {
    pub type_name: &'static str,
    pub type_id: TypeId,
}
impl Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}
impl TypeInfo {
    pub fn of<T: 'static + ?Sized>() -> TypeInfo {
        TypeInfo {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }
}

/// Describes the type a value has, or the type a value should be converted to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// Matches every value
    Any,
    Null,
    Bool,
    Int,
    Str,
    List(Box<TypeDescriptor>),
    Object(TypeInfo),
}
impl Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Any => f.write_str("any"),
            TypeDescriptor::Null => f.write_str("null"),
            TypeDescriptor::Bool => f.write_str("bool"),
            TypeDescriptor::Int => f.write_str("int"),
            TypeDescriptor::Str => f.write_str("string"),
            TypeDescriptor::List(inner) => write!(f, "list<{inner}>"),
            TypeDescriptor::Object(info) => write!(f, "{info}"),
        }
    }
}
impl TypeDescriptor {
    pub fn object<T: 'static>() -> Self {
        TypeDescriptor::Object(TypeInfo::of::<T>())
    }
}

/// Everything a recipe can produce
///
/// Plain data is kept inline so conversions can inspect it, anything else travels as a
/// type erased [Instance].
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<Value>),
    Object(Instance),
}

impl Value {
    /// The descriptor of this value
    ///
    /// Lists only describe their element type when all elements agree.
    pub fn descriptor(&self) -> TypeDescriptor {
        match self {
            Value::Null => TypeDescriptor::Null,
            Value::Bool(_) => TypeDescriptor::Bool,
            Value::Int(_) => TypeDescriptor::Int,
            Value::Str(_) => TypeDescriptor::Str,
            Value::Object(instance) => TypeDescriptor::Object(instance.info),
            Value::List(items) => {
                let mut descriptors = items.iter().map(Value::descriptor);
                let element = match descriptors.next() {
                    Some(first) if descriptors.all(|other| other == first) => first,
                    _ => TypeDescriptor::Any,
                };
                TypeDescriptor::List(Box::new(element))
            }
        }
    }

    /// Whether the value can be used where `target` is expected without any conversion
    pub fn is_instance_of(&self, target: &TypeDescriptor) -> bool {
        match (self, target) {
            (_, TypeDescriptor::Any) => true,
            (Value::List(items), TypeDescriptor::List(element)) => {
                items.iter().all(|item| item.is_instance_of(element))
            }
            (value, target) => value.descriptor() == *target,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Downcasts an object value, returns None for plain data or a different type
    pub fn downcast<T: Injectable>(&self) -> Option<Arc<T>> {
        match self {
            Value::Object(instance) => instance.downcast().ok(),
            _ => None,
        }
    }
}

// Objects compare by identity, everything else by value
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Str(value) => write!(f, "{value:?}"),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Object(instance) => write!(f, "<{}>", instance.info),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}
impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}
impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_owned())
    }
}
impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}
impl From<Instance> for Value {
    fn from(value: Instance) -> Self {
        Value::Object(value)
    }
}
impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}
