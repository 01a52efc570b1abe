use crate::error::CompileError;
use serde::{Deserialize, Serialize};

/// Tunables for one compilation. Every field has a default, so partial JSON files are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompilerOptions {
    /// Pipe positions and rotations through the host/exchange space conversion.
    pub space_conversion: bool,
    /// Capacity of list fields that do not declare one.
    pub default_list_capacity: usize,
    /// Nesting limit for same-unit call inlining.
    pub max_inline_depth: usize,
    /// Methods wired to events, in order. `Start` and `Update` map to the built-in start and
    /// tick events; any other name becomes a custom event receiver.
    pub entry_points: Vec<String>,
    /// Run the validation pass after lowering.
    pub validate: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            space_conversion: true,
            default_list_capacity: 8,
            max_inline_depth: 8,
            entry_points: vec!["Start".to_string(), "Update".to_string()],
            validate: true,
        }
    }
}

impl CompilerOptions {
    pub fn check(&self) -> Result<(), CompileError> {
        if self.default_list_capacity == 0 {
            return Err(CompileError::InvalidOptions(
                "default list capacity must be at least 1".to_string(),
            ));
        }
        if self.entry_points.is_empty() {
            return Err(CompileError::InvalidOptions(
                "at least one entry point is required".to_string(),
            ));
        }
        Ok(())
    }
}
