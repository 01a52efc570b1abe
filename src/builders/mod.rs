//! Reusable node patterns for operations the target has no single node for.
//!
//! Every builder takes the export context, creates a small fixed pattern and hands back the
//! ports it left unconnected. Callers wire those ports; builders never look at the AST.

pub mod flow;
pub mod list;
pub mod math;
pub mod pointers;
pub mod quaternion;
pub mod space;
pub mod transform;
pub mod variables;

pub use flow::{ConditionalWait, CustomForLoop, Delay, ForLoop, SteppedWhile, TickChain};
pub use list::{ListAddItem, ListRemoveItem, ListSetItem, VariableBasedList};
pub use pointers::{PointerGet, PointerSet};
pub use transform::{PropertyGet, PropertySet, TransformAction};
pub use variables::VariableSet;
