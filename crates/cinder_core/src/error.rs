use thiserror::Error;

/// Errors raised by scene graph operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("cannot attach '{child}' under '{parent}': it would create a cycle")]
    CyclicHierarchy { parent: String, child: String },

    #[error("scene '{0}' is already write-locked")]
    WriteLocked(String),
}
