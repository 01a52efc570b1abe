//! The closed table of host methods and members the walker lowers directly.
//!
//! Recognition is keyed on the declaring type's simple name plus the member name, so the
//! reflected producer's namespace layout does not matter.

use super::ast::{MemberRef, MethodRef, TypeRef};
use crate::graph::{Op, ValueType};

/// Severity configured on a `debug/log` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSeverity {
    Info = 0,
    Warning = 1,
    Error = 2,
}

/// A host method with a dedicated lowering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// `Task.Delay(ms)`.
    Delay,
    /// `GameObject.SetActive(bool)`.
    SetActive,
    /// `Debug.Log*`, one message slot per argument.
    Log(LogSeverity),
    Translate,
    Rotate,
    LookAt,
    SetPositionAndRotation,
    /// `Quaternion.Euler(x, y, z)` or `Quaternion.Euler(v)`, in degrees.
    QuaternionEuler,
    QuaternionInverse,
    /// `Vector3.Distance(a, b)`.
    Distance,
    /// A static math function that maps onto exactly one node, arguments in order.
    Math(Op),
    ListAdd,
    ListInsert,
    ListRemoveAt,
    ListClear,
}

impl Builtin {
    pub fn recognize(method: &MethodRef) -> Option<Builtin> {
        let builtin = match (method.declaring_type.name.as_str(), method.name.as_str()) {
            ("Task", "Delay") => Builtin::Delay,
            ("GameObject", "SetActive") => Builtin::SetActive,
            ("Debug", "Log") => Builtin::Log(LogSeverity::Info),
            ("Debug", "LogWarning") => Builtin::Log(LogSeverity::Warning),
            ("Debug", "LogError") => Builtin::Log(LogSeverity::Error),
            ("Transform", "Translate") => Builtin::Translate,
            ("Transform", "Rotate") => Builtin::Rotate,
            ("Transform", "LookAt") => Builtin::LookAt,
            ("Transform", "SetPositionAndRotation") => Builtin::SetPositionAndRotation,
            ("Quaternion", "Euler") => Builtin::QuaternionEuler,
            ("Quaternion", "Inverse") => Builtin::QuaternionInverse,
            ("Vector3" | "Vector2" | "Vector4", "Distance") => Builtin::Distance,
            ("Vector3" | "Vector2" | "Vector4", name) => Builtin::Math(vector_op(name)?),
            ("Mathf", name) => Builtin::Math(scalar_op(name)?),
            ("List", "Add") => Builtin::ListAdd,
            ("List", "Insert") => Builtin::ListInsert,
            ("List", "RemoveAt") => Builtin::ListRemoveAt,
            ("List", "Clear") => Builtin::ListClear,
            _ => return None,
        };
        Some(builtin)
    }

    /// Builtins that need a flow input and produce a continuation.
    pub fn has_flow_effect(&self) -> bool {
        !matches!(
            self,
            Builtin::QuaternionEuler
                | Builtin::QuaternionInverse
                | Builtin::Distance
                | Builtin::Math(_)
        )
    }
}

fn vector_op(name: &str) -> Option<Op> {
    let op = match name {
        "Normalize" => Op::MathNormalize,
        "Dot" => Op::MathDot,
        "Cross" => Op::MathCross,
        "Lerp" | "LerpUnclamped" => Op::MathMix,
        "Min" => Op::MathMin,
        "Max" => Op::MathMax,
        _ => return None,
    };
    Some(op)
}

fn scalar_op(name: &str) -> Option<Op> {
    let op = match name {
        "Sin" => Op::MathSin,
        "Cos" => Op::MathCos,
        "Tan" => Op::MathTan,
        "Asin" => Op::MathAsin,
        "Acos" => Op::MathAcos,
        "Atan" => Op::MathAtan,
        "Atan2" => Op::MathAtan2,
        "Sqrt" => Op::MathSqrt,
        "Abs" => Op::MathAbs,
        "Min" => Op::MathMin,
        "Max" => Op::MathMax,
        "Floor" => Op::MathFloor,
        "Clamp" => Op::MathClamp,
        "Lerp" | "LerpUnclamped" => Op::MathMix,
        _ => return None,
    };
    Some(op)
}

/// A host member with a dedicated lowering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinProperty {
    /// World-space `transform.position`.
    Position,
    LocalPosition,
    Rotation,
    LocalRotation,
    LocalScale,
    /// World-space scale (`lossyScale`).
    LossyScale,
    /// Vector component `x`/`y`/`z`/`w`, by index.
    Component(usize),
    Normalized,
    Magnitude,
    ListCount,
    DeltaTime,
    Time,
    /// `component.transform`: the same target as the receiver.
    Transform,
    /// `component.gameObject`: the same target as the receiver.
    GameObject,
}

impl BuiltinProperty {
    pub fn recognize(member: &MemberRef) -> Option<BuiltinProperty> {
        let declaring = member.declaring_type.name.as_str();
        let property = match (declaring, member.name.as_str()) {
            ("Transform", "position") => BuiltinProperty::Position,
            ("Transform", "localPosition") => BuiltinProperty::LocalPosition,
            ("Transform", "rotation") => BuiltinProperty::Rotation,
            ("Transform", "localRotation") => BuiltinProperty::LocalRotation,
            ("Transform", "localScale") => BuiltinProperty::LocalScale,
            ("Transform", "lossyScale") => BuiltinProperty::LossyScale,
            ("Vector2" | "Vector3" | "Vector4" | "Quaternion", component) => match component {
                "x" => BuiltinProperty::Component(0),
                "y" => BuiltinProperty::Component(1),
                "z" => BuiltinProperty::Component(2),
                "w" => BuiltinProperty::Component(3),
                "normalized" => BuiltinProperty::Normalized,
                "magnitude" => BuiltinProperty::Magnitude,
                _ => return None,
            },
            ("List", "Count") => BuiltinProperty::ListCount,
            ("Time", "deltaTime") => BuiltinProperty::DeltaTime,
            ("Time", "time") => BuiltinProperty::Time,
            (_, "transform") => BuiltinProperty::Transform,
            (_, "gameObject") => BuiltinProperty::GameObject,
            _ => return None,
        };
        Some(property)
    }

    /// Transform properties that can be assigned.
    pub fn is_writable(&self) -> bool {
        matches!(
            self,
            BuiltinProperty::Position
                | BuiltinProperty::LocalPosition
                | BuiltinProperty::Rotation
                | BuiltinProperty::LocalRotation
                | BuiltinProperty::LocalScale
        )
    }
}

/// Maps a host type onto a graph value type.
pub fn value_type_of(ty: &TypeRef) -> Option<ValueType> {
    let value_type = match ty.name.as_str() {
        "Boolean" | "bool" => ValueType::Bool,
        "Int32" | "int" | "Int16" | "short" | "Byte" | "byte" => ValueType::Int,
        "Single" | "float" | "Double" | "double" => ValueType::Float,
        "Vector2" => ValueType::Float2,
        "Vector3" => ValueType::Float3,
        "Vector4" | "Quaternion" | "Color" => ValueType::Float4,
        "Matrix4x4" => ValueType::Float4x4,
        _ => return None,
    };
    Some(value_type)
}

/// Host types whose values are object references resolved to target ids.
pub fn is_object_type(ty: &TypeRef) -> bool {
    matches!(ty.name.as_str(), "GameObject" | "Transform")
}
