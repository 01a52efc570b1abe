use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// The closed set of value types a socket, variable or event slot can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Bool,
    Int,
    Float,
    Float2,
    Float3,
    Float4,
    Float4x4,
}

impl ValueType {
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Float2 => "float2",
            ValueType::Float3 => "float3",
            ValueType::Float4 => "float4",
            ValueType::Float4x4 => "float4x4",
        }
    }

    /// Number of scalar components, `1` for scalars.
    pub fn component_count(&self) -> usize {
        match self {
            ValueType::Bool | ValueType::Int | ValueType::Float => 1,
            ValueType::Float2 => 2,
            ValueType::Float3 => 3,
            ValueType::Float4 => 4,
            ValueType::Float4x4 => 16,
        }
    }

    /// The zero value used for uninitialized storage and switch defaults.
    pub fn default_literal(&self) -> Literal {
        match self {
            ValueType::Bool => Literal::Bool(false),
            ValueType::Int => Literal::Int(0),
            ValueType::Float => Literal::Float(0.0),
            ValueType::Float2 => Literal::Float2([0.0; 2]),
            ValueType::Float3 => Literal::Float3([0.0; 3]),
            ValueType::Float4 => Literal::Float4([0.0; 4]),
            ValueType::Float4x4 => Literal::Float4x4(IDENTITY_4X4),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

const IDENTITY_4X4: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
];

/// A typed compile-time constant stored directly on a value input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Bool(bool),
    Int(i32),
    Float(f32),
    Float2([f32; 2]),
    Float3([f32; 3]),
    Float4([f32; 4]),
    Float4x4([f32; 16]),
}

impl Literal {
    pub fn value_type(&self) -> ValueType {
        match self {
            Literal::Bool(_) => ValueType::Bool,
            Literal::Int(_) => ValueType::Int,
            Literal::Float(_) => ValueType::Float,
            Literal::Float2(_) => ValueType::Float2,
            Literal::Float3(_) => ValueType::Float3,
            Literal::Float4(_) => ValueType::Float4,
            Literal::Float4x4(_) => ValueType::Float4x4,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Literal::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Literal::Float(v) => Some(*v),
            Literal::Int(i) => Some(*i as f32),
            _ => None,
        }
    }

    /// Builds a vector literal of the requested type from its scalar components.
    pub fn from_components(value_type: ValueType, components: &[f32]) -> Option<Literal> {
        if components.len() != value_type.component_count() {
            return None;
        }
        match value_type {
            ValueType::Float => Some(Literal::Float(components[0])),
            ValueType::Float2 => Some(Literal::Float2([components[0], components[1]])),
            ValueType::Float3 => Some(Literal::Float3([
                components[0],
                components[1],
                components[2],
            ])),
            ValueType::Float4 => Some(Literal::Float4([
                components[0],
                components[1],
                components[2],
                components[3],
            ])),
            ValueType::Float4x4 => {
                let mut m = [0.0; 16];
                m.copy_from_slice(components);
                Some(Literal::Float4x4(m))
            }
            ValueType::Bool | ValueType::Int => None,
        }
    }

    fn components(&self) -> &[f32] {
        match self {
            Literal::Float(v) => std::slice::from_ref(v),
            Literal::Float2(v) => v,
            Literal::Float3(v) => v,
            Literal::Float4(v) => v,
            Literal::Float4x4(v) => v,
            Literal::Bool(_) | Literal::Int(_) => &[],
        }
    }
}

// Manual implementation to handle f32 components
impl Eq for Literal {}

// Hash float components by their bits
impl Hash for Literal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Literal::Bool(b) => b.hash(state),
            Literal::Int(i) => i.hash(state),
            other => {
                for c in other.components() {
                    c.to_bits().hash(state);
                }
            }
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(v) => write!(f, "{:?}", v),
            other => {
                write!(f, "(")?;
                for (i, c) in other.components().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}", c)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A static node parameter. Absent entries are stored as `None` on the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConfigValue {
    Int(i32),
    IntList(Vec<i32>),
    Bool(bool),
    Float(f32),
    Text(String),
}

impl ConfigValue {
    pub fn as_int(&self) -> Option<i32> {
        match self {
            ConfigValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_int_list(&self) -> Option<&[i32]> {
        match self {
            ConfigValue::IntList(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ConfigValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Int(i) => write!(f, "{}", i),
            ConfigValue::IntList(list) => write!(f, "{:?}", list),
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Float(v) => write!(f, "{:?}", v),
            ConfigValue::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// Declared type of a value output. May be assigned after the node exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpectedType {
    Exact(ValueType),
    /// Same type as the named value input of the same node.
    FromInput(String),
}

/// Narrowest set of types a value input accepts. Advisory, checked by validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeRestriction {
    Only(ValueType),
    OneOf(Vec<ValueType>),
    SameAsInput(String),
}
