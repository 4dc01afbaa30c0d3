use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A single field failed its own constraint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{entity} {field} must not be empty")]
    EmptyField {
        entity: &'static str,
        field: &'static str,
    },
}

impl ValidationError {
    pub(crate) fn empty(entity: &'static str, field: &'static str) -> Self {
        Self::EmptyField { entity, field }
    }
}

/// A cross-entity invariant of the roadmap does not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    #[error("roadmap declares no clusters")]
    NoClusters,
    #[error("roadmap declares no nodes")]
    NoNodes,
    #[error("duplicate cluster id: {0}")]
    DuplicateCluster(String),
    #[error("duplicate node id: {0}")]
    DuplicateNode(String),
    #[error("edge references an unknown node: {from} -> {to}")]
    DanglingEdge { from: String, to: String },
    #[error("node {node} belongs to undeclared cluster {cluster}")]
    UnknownCluster { node: String, cluster: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),
}

/// Failure of an upstream collaborator (text or structure extraction).
///
/// The pipeline answers every variant by substituting the fallback roadmap.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("extracted text is empty")]
    EmptyText,
    #[error("no JSON object found in structure response")]
    NoJson,
    #[error("malformed roadmap JSON: {0}")]
    Json(String),
    #[error("extracted roadmap is invalid: {0}")]
    InvalidGraph(#[from] GraphError),
    #[error("structure extraction unavailable: {0}")]
    Unavailable(String),
}

/// The external renderer could not produce the artifact. Never retried.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("renderer `{binary}` could not be started: {source}")]
    MissingBinary {
        binary: String,
        #[source]
        source: io::Error,
    },
    #[error("renderer `{binary}` exited with {status}: {stderr}")]
    Failed {
        binary: String,
        status: String,
        stderr: String,
    },
    #[error("renderer `{binary}` timed out after {seconds}s")]
    Timeout { binary: String, seconds: u64 },
    #[error("failed to talk to the renderer: {0}")]
    Pipe(#[source] io::Error),
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("rasterization failed: {0}")]
    Raster(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_offending_ids() {
        let err = ConsistencyError::DanglingEdge {
            from: "t1".to_string(),
            to: "ghost".to_string(),
        };
        assert_eq!(err.to_string(), "edge references an unknown node: t1 -> ghost");

        let err: GraphError = ValidationError::empty("node", "label").into();
        assert_eq!(err.to_string(), "node label must not be empty");
    }

    #[test]
    fn render_failure_keeps_stderr_verbatim() {
        let err = RenderError::Failed {
            binary: "dot".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "Error: syntax error in line 3".to_string(),
        };
        assert!(err.to_string().ends_with("Error: syntax error in line 3"));
    }
}
