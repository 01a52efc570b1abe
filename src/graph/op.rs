use super::value::ValueType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the type of a value output is determined when the node is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    Exact(ValueType),
    SameAsInput(&'static str),
    /// Assigned by the builder once the concrete type is known.
    Assigned,
}

/// Sockets a kind accepts beyond its static declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicSockets {
    None,
    NumberedFlowOutputs,
    NumberedFlowInputs,
    NumberedValueInputs,
    /// One value input per `{name}` token in the `pointer` configuration.
    TemplateValueInputs,
    /// One value input per `{name}` token in the `message` configuration.
    MessageValueInputs,
    EventValueOutputs,
    EventValueInputs,
}

/// Static socket declaration of an operation kind.
#[derive(Debug, Clone, Copy)]
pub struct OpSchema {
    pub config: &'static [&'static str],
    pub values_in: &'static [&'static str],
    pub values_out: &'static [(&'static str, OutputType)],
    pub flows_in: &'static [&'static str],
    pub flows_out: &'static [&'static str],
    pub dynamic: DynamicSockets,
}

const PURE: OpSchema = OpSchema {
    config: &[],
    values_in: &[],
    values_out: &[],
    flows_in: &[],
    flows_out: &[],
    dynamic: DynamicSockets::None,
};

const UNARY_SAME: OpSchema = OpSchema {
    values_in: &["a"],
    values_out: &[("value", OutputType::SameAsInput("a"))],
    ..PURE
};

const UNARY_FLOAT: OpSchema = OpSchema {
    values_in: &["a"],
    values_out: &[("value", OutputType::Exact(ValueType::Float))],
    ..PURE
};

const BINARY_SAME: OpSchema = OpSchema {
    values_in: &["a", "b"],
    values_out: &[("value", OutputType::SameAsInput("a"))],
    ..PURE
};

const BINARY_BOOL: OpSchema = OpSchema {
    values_in: &["a", "b"],
    values_out: &[("value", OutputType::Exact(ValueType::Bool))],
    ..PURE
};

const TERNARY_SAME: OpSchema = OpSchema {
    values_in: &["a", "b", "c"],
    values_out: &[("value", OutputType::SameAsInput("a"))],
    ..PURE
};

const FLOW_THROUGH: OpSchema = OpSchema {
    flows_in: &["in"],
    flows_out: &["out"],
    ..PURE
};

macro_rules! define_ops {
    ( $( $variant:ident => $name:literal ),* $(,)? ) => {
        /// Operation kind of a node. Serialized as its string identifier.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum Op {
            $( #[serde(rename = $name)] $variant, )*
        }

        impl Op {
            pub const ALL: &'static [Op] = &[ $( Op::$variant ),* ];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Op::$variant => $name, )*
                }
            }
        }
    };
}

define_ops! {
    EventOnStart => "event/onStart",
    EventOnTick => "event/onTick",
    EventReceive => "event/receive",
    EventSend => "event/send",
    FlowBranch => "flow/branch",
    FlowSequence => "flow/sequence",
    FlowFor => "flow/for",
    FlowWhile => "flow/while",
    FlowSwitch => "flow/switch",
    FlowWaitAll => "flow/waitAll",
    FlowSetDelay => "flow/setDelay",
    VariableGet => "variable/get",
    VariableSet => "variable/set",
    PointerGet => "pointer/get",
    PointerSet => "pointer/set",
    DebugLog => "debug/log",
    MathAdd => "math/add",
    MathSub => "math/sub",
    MathMul => "math/mul",
    MathDiv => "math/div",
    MathRem => "math/rem",
    MathNeg => "math/neg",
    MathAbs => "math/abs",
    MathFloor => "math/floor",
    MathMin => "math/min",
    MathMax => "math/max",
    MathClamp => "math/clamp",
    MathMix => "math/mix",
    MathSqrt => "math/sqrt",
    MathSin => "math/sin",
    MathCos => "math/cos",
    MathTan => "math/tan",
    MathAsin => "math/asin",
    MathAcos => "math/acos",
    MathAtan => "math/atan",
    MathAtan2 => "math/atan2",
    MathRad => "math/rad",
    MathDeg => "math/deg",
    MathLt => "math/lt",
    MathLe => "math/le",
    MathGt => "math/gt",
    MathGe => "math/ge",
    MathEq => "math/eq",
    MathAnd => "math/and",
    MathOr => "math/or",
    MathNot => "math/not",
    MathSelect => "math/select",
    MathSwitch => "math/switch",
    MathCombine2 => "math/combine2",
    MathCombine3 => "math/combine3",
    MathCombine4 => "math/combine4",
    MathExtract2 => "math/extract2",
    MathExtract3 => "math/extract3",
    MathExtract4 => "math/extract4",
    MathDot => "math/dot",
    MathCross => "math/cross",
    MathLength => "math/length",
    MathNormalize => "math/normalize",
    MathMatMul => "math/matMul",
    MathInverse => "math/inverse",
    MathTransform => "math/transform",
    MathMatDecompose => "math/matDecompose",
    MathQuatMul => "math/quatMul",
    TypeFloatToInt => "type/floatToInt",
    TypeIntToFloat => "type/intToFloat",
}

impl Op {
    /// Socket and configuration declaration of this kind.
    pub fn schema(&self) -> OpSchema {
        use OutputType::*;
        use ValueType::*;
        match self {
            Op::EventOnStart => OpSchema {
                flows_out: &["out"],
                ..PURE
            },
            Op::EventOnTick => OpSchema {
                flows_out: &["out"],
                values_out: &[
                    ("timeSinceStart", Exact(Float)),
                    ("timeSinceLastTick", Exact(Float)),
                ],
                ..PURE
            },
            Op::EventReceive => OpSchema {
                config: &["event"],
                flows_out: &["out"],
                dynamic: DynamicSockets::EventValueOutputs,
                ..PURE
            },
            Op::EventSend => OpSchema {
                config: &["event"],
                dynamic: DynamicSockets::EventValueInputs,
                ..FLOW_THROUGH
            },
            Op::FlowBranch => OpSchema {
                values_in: &["condition"],
                flows_in: &["in"],
                flows_out: &["true", "false"],
                ..PURE
            },
            Op::FlowSequence => OpSchema {
                flows_in: &["in"],
                dynamic: DynamicSockets::NumberedFlowOutputs,
                ..PURE
            },
            Op::FlowFor => OpSchema {
                config: &["initialIndex"],
                values_in: &["startIndex", "endIndex"],
                values_out: &[("index", Exact(Int))],
                flows_in: &["in"],
                flows_out: &["loopBody", "completed"],
                ..PURE
            },
            Op::FlowWhile => OpSchema {
                values_in: &["condition"],
                flows_in: &["in"],
                flows_out: &["loopBody", "completed"],
                ..PURE
            },
            Op::FlowSwitch => OpSchema {
                config: &["cases"],
                values_in: &["selection"],
                flows_in: &["in"],
                flows_out: &["default"],
                dynamic: DynamicSockets::NumberedFlowOutputs,
                ..PURE
            },
            Op::FlowWaitAll => OpSchema {
                config: &["inputFlows"],
                values_out: &[("remainingInputs", Exact(Int))],
                flows_in: &["reset"],
                flows_out: &["out", "completed"],
                dynamic: DynamicSockets::NumberedFlowInputs,
                ..PURE
            },
            Op::FlowSetDelay => OpSchema {
                values_in: &["duration"],
                values_out: &[("lastDelayIndex", Exact(Int))],
                flows_in: &["in", "cancel"],
                flows_out: &["out", "err", "done"],
                ..PURE
            },
            Op::VariableGet => OpSchema {
                config: &["variable"],
                values_out: &[("value", Assigned)],
                ..PURE
            },
            Op::VariableSet => OpSchema {
                config: &["variable"],
                values_in: &["value"],
                ..FLOW_THROUGH
            },
            Op::PointerGet => OpSchema {
                config: &["pointer", "type"],
                values_out: &[("value", Assigned), ("isValid", Exact(Bool))],
                dynamic: DynamicSockets::TemplateValueInputs,
                ..PURE
            },
            Op::PointerSet => OpSchema {
                config: &["pointer", "type"],
                values_in: &["value"],
                flows_in: &["in"],
                flows_out: &["out", "err"],
                dynamic: DynamicSockets::TemplateValueInputs,
                ..PURE
            },
            Op::DebugLog => OpSchema {
                config: &["severity", "message"],
                dynamic: DynamicSockets::MessageValueInputs,
                ..FLOW_THROUGH
            },
            Op::MathAdd
            | Op::MathSub
            | Op::MathMul
            | Op::MathDiv
            | Op::MathRem
            | Op::MathMin
            | Op::MathMax
            | Op::MathAtan2
            | Op::MathAnd
            | Op::MathOr
            | Op::MathMatMul
            | Op::MathCross => BINARY_SAME,
            Op::MathNeg
            | Op::MathAbs
            | Op::MathFloor
            | Op::MathSqrt
            | Op::MathSin
            | Op::MathCos
            | Op::MathTan
            | Op::MathAsin
            | Op::MathAcos
            | Op::MathAtan
            | Op::MathRad
            | Op::MathDeg
            | Op::MathNot
            | Op::MathNormalize
            | Op::MathInverse => UNARY_SAME,
            Op::MathLt | Op::MathLe | Op::MathGt | Op::MathGe | Op::MathEq => BINARY_BOOL,
            Op::MathClamp | Op::MathMix => TERNARY_SAME,
            Op::MathSelect => OpSchema {
                values_in: &["condition", "a", "b"],
                values_out: &[("value", SameAsInput("a"))],
                ..PURE
            },
            Op::MathSwitch => OpSchema {
                config: &["cases"],
                values_in: &["selection", "default"],
                values_out: &[("value", SameAsInput("default"))],
                dynamic: DynamicSockets::NumberedValueInputs,
                ..PURE
            },
            Op::MathCombine2 => OpSchema {
                values_in: &["a", "b"],
                values_out: &[("value", Exact(Float2))],
                ..PURE
            },
            Op::MathCombine3 => OpSchema {
                values_in: &["a", "b", "c"],
                values_out: &[("value", Exact(Float3))],
                ..PURE
            },
            Op::MathCombine4 => OpSchema {
                values_in: &["a", "b", "c", "d"],
                values_out: &[("value", Exact(Float4))],
                ..PURE
            },
            Op::MathExtract2 => OpSchema {
                values_in: &["a"],
                values_out: &[("0", Exact(Float)), ("1", Exact(Float))],
                ..PURE
            },
            Op::MathExtract3 => OpSchema {
                values_in: &["a"],
                values_out: &[("0", Exact(Float)), ("1", Exact(Float)), ("2", Exact(Float))],
                ..PURE
            },
            Op::MathExtract4 => OpSchema {
                values_in: &["a"],
                values_out: &[
                    ("0", Exact(Float)),
                    ("1", Exact(Float)),
                    ("2", Exact(Float)),
                    ("3", Exact(Float)),
                ],
                ..PURE
            },
            Op::MathDot => OpSchema {
                values_in: &["a", "b"],
                values_out: &[("value", Exact(Float))],
                ..PURE
            },
            Op::MathLength => UNARY_FLOAT,
            Op::MathTransform => OpSchema {
                values_in: &["a", "b"],
                values_out: &[("value", Exact(Float4))],
                ..PURE
            },
            Op::MathMatDecompose => OpSchema {
                values_in: &["a"],
                values_out: &[
                    ("translation", Exact(Float3)),
                    ("rotation", Exact(Float4)),
                    ("scale", Exact(Float3)),
                    ("isValid", Exact(Bool)),
                ],
                ..PURE
            },
            Op::MathQuatMul => OpSchema {
                values_in: &["a", "b"],
                values_out: &[("value", Exact(Float4))],
                ..PURE
            },
            Op::TypeFloatToInt => OpSchema {
                values_in: &["a"],
                values_out: &[("value", Exact(Int))],
                ..PURE
            },
            Op::TypeIntToFloat => UNARY_FLOAT,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Extracts the `{name}` tokens of a pointer path or log message, in order of appearance.
pub fn template_placeholders(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                if !name.is_empty() && !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
                rest = &after[close + 1..];
            }
            None => break,
        }
    }
    names
}
