//! Errors raised while building or executing a script.

use thiserror::Error;

/// A failed node evaluation. Propagated unchanged by every composite.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecuteError {
    #[error("It must be in a cache context, check your together script (no store under {name:?})")]
    MissingCacheContext { name: String },

    #[error("Can not find object, id={key}")]
    ObjectNotFound { key: String },

    #[error("Store {id:?} is not registered in this session")]
    StoreNotRegistered { id: String },

    #[error("Nothing bound under {name:?}")]
    MissingBinding { name: String },

    #[error("{code}: {message}")]
    Thrown { code: String, message: String },
}

impl ExecuteError {
    /// Stable error code reported to script callers.
    pub fn code(&self) -> &str {
        match self {
            ExecuteError::MissingCacheContext { .. } => "core.e1001",
            ExecuteError::StoreNotRegistered { .. } => "core.e1002",
            ExecuteError::MissingBinding { .. } => "core.e1003",
            ExecuteError::ObjectNotFound { .. } => "clnt.e2007",
            ExecuteError::Thrown { code, .. } => code,
        }
    }
}

/// A script definition that could not be turned into a node tree.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("unknown node tag {0:?}")]
    UnknownTag(String),

    #[error("node {tag:?} requires attribute {name:?}")]
    MissingAttribute { tag: String, name: String },

    #[error("node {0:?} cannot have children")]
    UnexpectedChildren(String),

    #[error("invalid script definition: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot read script: {0}")]
    Io(#[from] std::io::Error),
}
