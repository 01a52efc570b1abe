use crate::compiler::CompilationArtifacts;
use crate::error::ArtifactError;
use crate::graph::Graph;
use crate::passes::ValidationReport;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};

/// A compiled graph together with its validation report, ready to be stored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CompiledGraph {
    pub name: String,
    pub graph: Graph,
    pub validation: ValidationReport,
}

impl CompiledGraph {
    pub fn new(name: &str, graph: Graph, validation: ValidationReport) -> Self {
        Self {
            name: name.to_string(),
            graph,
            validation,
        }
    }

    /// Saves the compiled graph to a file using the bincode format.
    pub fn save(&self, path: &str) -> Result<(), ArtifactError> {
        let bytes = self.to_bytes()?;
        let mut file = fs::File::create(path).map_err(|e| ArtifactError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        file.write_all(&bytes).map_err(|e| ArtifactError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Loads a compiled graph from a file.
    pub fn from_file(path: &str) -> Result<Self, ArtifactError> {
        let mut file = fs::File::open(path).map_err(|e| ArtifactError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| ArtifactError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        encode_to_vec(self, standard()).map_err(|e| ArtifactError::Serialization(e.to_string()))
    }

    /// Deserializes a compiled graph from a byte slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArtifactError> {
        decode_from_slice(bytes, standard())
            .map(|(compiled, _)| compiled)
            .map_err(|e| ArtifactError::Deserialization(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, ArtifactError> {
        serde_json::to_string_pretty(self).map_err(|e| ArtifactError::Serialization(e.to_string()))
    }
}

impl From<CompilationArtifacts> for CompiledGraph {
    fn from(artifacts: CompilationArtifacts) -> Self {
        Self {
            name: artifacts.name,
            graph: artifacts.graph,
            validation: artifacts.validation,
        }
    }
}
