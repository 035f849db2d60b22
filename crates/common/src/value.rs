//! Runtime value representation for the Slate VM.
//!
//! Integers and booleans are stored inline. Strings and arrays live on the
//! heap behind an [`Rc`]: cloning a [`Value`] takes a reference, dropping it
//! releases one, and the backing storage is freed when the last reference
//! goes away. Every stack entry, locals slot, and constant-pool entry that
//! holds a heap value owns exactly one reference to it.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::types::{BaseType, VarType};

/// Runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i32),
    Bool(bool),
    Str(Rc<StringValue>),
    Array(Rc<ArrayValue>),
}

/// Heap string shared between values.
#[derive(Debug, PartialEq, Eq)]
pub struct StringValue {
    text: String,
}

impl StringValue {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Heap array shared between values.
///
/// Elements are homogeneously typed. The element type is recorded at
/// construction and stays [`BaseType::Unknown`] for empty literals.
#[derive(Debug)]
pub struct ArrayValue {
    elem_type: VarType,
    elements: RefCell<Vec<Value>>,
}

impl ArrayValue {
    pub fn new(elem_type: VarType, elements: Vec<Value>) -> Self {
        Self {
            elem_type,
            elements: RefCell::new(elements),
        }
    }

    /// Build an array from values in source order, inferring the element
    /// type from the first element.
    pub fn from_elements(elements: Vec<Value>) -> Self {
        let elem_type = elements
            .first()
            .map(Value::value_type)
            .unwrap_or(VarType::UNKNOWN);
        Self::new(elem_type, elements)
    }

    pub fn elem_type(&self) -> VarType {
        self.elem_type
    }

    pub fn len(&self) -> usize {
        self.elements.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.borrow().is_empty()
    }

    /// Clone out the element at `index` (taking a new reference to it).
    pub fn get(&self, index: usize) -> Option<Value> {
        self.elements.borrow().get(index).cloned()
    }

    /// Replace the element at `index`, returning the displaced value.
    ///
    /// Returns `Err(value)` without modifying the array when `index` is out
    /// of range.
    pub fn set(&self, index: usize, value: Value) -> Result<Value, Value> {
        let mut elements = self.elements.borrow_mut();
        match elements.get_mut(index) {
            Some(slot) => Ok(std::mem::replace(slot, value)),
            None => Err(value),
        }
    }

    pub fn elements(&self) -> Ref<'_, Vec<Value>> {
        self.elements.borrow()
    }
}

// Nested arrays are released with an explicit worklist instead of native
// recursion, so arbitrarily deep nesting cannot overflow the call stack.
// Child arrays are released before this array's own backing storage.
impl Drop for ArrayValue {
    fn drop(&mut self) {
        let mut storage = std::mem::take(self.elements.get_mut());
        let mut pending: Vec<Rc<ArrayValue>> = Vec::new();
        take_arrays(&mut storage, &mut pending);

        while let Some(array) = pending.pop() {
            if let Ok(inner) = Rc::try_unwrap(array) {
                let mut children = std::mem::take(&mut *inner.elements.borrow_mut());
                take_arrays(&mut children, &mut pending);
            }
        }

        drop(storage);
    }
}

/// Move array elements into `pending` and release everything else.
fn take_arrays(values: &mut Vec<Value>, pending: &mut Vec<Rc<ArrayValue>>) {
    for value in values.drain(..) {
        if let Value::Array(array) = value {
            pending.push(array);
        }
    }
}

impl Value {
    /// Allocate a new string with a single reference.
    pub fn string(text: impl Into<String>) -> Self {
        Value::Str(Rc::new(StringValue::new(text)))
    }

    /// Allocate a new array with a single reference.
    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(Rc::new(ArrayValue::from_elements(elements)))
    }

    /// The runtime type of this value.
    pub fn value_type(&self) -> VarType {
        match self {
            Value::Int(_) => VarType::INT,
            Value::Bool(_) => VarType::BOOL,
            Value::Str(_) => VarType::STRING,
            Value::Array(array) => array.elem_type.array_of(),
        }
    }

    pub fn base_type(&self) -> BaseType {
        self.value_type().base
    }

    /// Number of live references to the heap object behind this value, or
    /// `None` for inline scalars.
    pub fn ref_count(&self) -> Option<usize> {
        match self {
            Value::Int(_) | Value::Bool(_) => None,
            Value::Str(s) => Some(Rc::strong_count(s)),
            Value::Array(a) => Some(Rc::strong_count(a)),
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", s.as_str()),
            other => write!(f, "{other}"),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Int(0)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => Rc::ptr_eq(a, b) || a == b,
            (Value::Array(a), Value::Array(b)) => {
                Rc::ptr_eq(a, b) || *a.elements.borrow() == *b.elements.borrow()
            }
            _ => false,
        }
    }
}

impl Eq for Value {}

// Recurses once per array level. Compiled programs cannot nest deeper than
// the parser's nesting limit (`slate_frontend::parser::MAX_NESTING`).
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => f.write_str(s.as_str()),
            Value::Array(array) => {
                f.write_str("[")?;
                for (i, element) in array.elements.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    element.fmt_nested(f)?;
                }
                f.write_str("]")
            }
        }
    }
}
