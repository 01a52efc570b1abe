use thiserror::Error;

/// Errors that stop the compilation of a unit.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Invalid compiler options: {0}")]
    InvalidOptions(String),

    #[error("Class '{class}' defines none of the entry points {entry_points:?}")]
    NoEntryPoints {
        class: String,
        entry_points: Vec<String>,
    },
}

/// Errors raised by compile-time operations on a variable-based list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListError {
    #[error("List '{list}' is full (capacity {capacity})")]
    ListFull { list: String, capacity: usize },

    #[error("Index {index} is out of range for list '{list}' with {count} items")]
    IndexOutOfRange {
        list: String,
        index: usize,
        count: usize,
    },
}

/// Errors raised when a reflected literal has no graph representation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LiteralError {
    #[error("Literal {value} does not fit in a 32-bit {target}")]
    OutOfRange { value: String, target: &'static str },

    #[error("Text literal has no numeric or boolean value")]
    Text,
}

/// Errors that can occur while saving or loading a compiled graph.
#[derive(Error, Debug, Clone)]
pub enum ArtifactError {
    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Deserialization failed: {0}")]
    Deserialization(String),

    #[error("Could not access file '{path}': {message}")]
    Io { path: String, message: String },
}

/// Errors that can occur when reading a reflected class from JSON.
#[derive(Error, Debug, Clone)]
pub enum AstLoadError {
    #[error("Failed to parse reflected class JSON: {0}")]
    JsonParseError(String),
}
