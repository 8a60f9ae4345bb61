use crate::graph::NodeId;

/// Structural errors from scene-tree edits.
///
/// Structural edits are fail-fast: when an operation returns an error the
/// tree is exactly as it was before the call.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("adding {node:?} under {group:?} would create a cycle")]
    CyclicParent { group: NodeId, node: NodeId },

    #[error("sibling {0:?} is not a child of the target group")]
    SiblingNotFound(NodeId),

    #[error("node {0:?} is not a group")]
    NotAGroup(NodeId),

    #[error("node {0:?} no longer exists")]
    DeadNode(NodeId),

    #[error("node {0:?} is already a child of this group")]
    DuplicateChild(NodeId),
}

/// Errors from the resource subsystem.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("resource load failed: {0}")]
    Load(String),

    #[error("resource was already completed")]
    AlreadyCompleted,

    #[error("no font registered under name {0:?}")]
    UnknownFont(String),
}

pub type Result<T> = std::result::Result<T, SceneError>;
