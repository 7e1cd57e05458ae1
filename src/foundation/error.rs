/// Convenience result type used across scenecast.
pub type SceneResult<T> = Result<T, SceneError>;

/// Top-level error taxonomy used by engine APIs.
///
/// The render pipeline distinguishes two propagation classes: fatal errors
/// bubble up and reject the whole render, transient ones are caught at the
/// narrowest scope and logged. See [`SceneError::is_fatal`].
#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    /// Invalid user-provided timeline, element, or option data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while validating or sampling animations.
    #[error("animation error: {0}")]
    Animation(String),

    /// A required resource is missing or corrupt. Fatal: aborts the render.
    #[error("resource error: {0}")]
    Resource(String),

    /// One element failed to produce a frame. Transient: the compositor logs
    /// it and skips that element's contribution for the frame.
    #[error("draw error: {0}")]
    Draw(String),

    /// The encoder subprocess failed or exited nonzero.
    #[error("encode failure (exit status {status}): {stderr}")]
    Encode {
        /// Exit status reported by the encoder process, or -1 when it was
        /// killed before reporting one.
        status: i32,
        /// Captured (trimmed) stderr from the encoder.
        stderr: String,
    },

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SceneError {
    /// Build a [`SceneError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`SceneError::Animation`] value.
    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    /// Build a [`SceneError::Resource`] value.
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// Build a [`SceneError::Draw`] value.
    pub fn draw(msg: impl Into<String>) -> Self {
        Self::Draw(msg.into())
    }

    /// Build a [`SceneError::Encode`] value from a process exit status and
    /// captured stderr bytes.
    pub fn encode(status: i32, stderr: impl Into<String>) -> Self {
        Self::Encode {
            status,
            stderr: stderr.into(),
        }
    }

    /// Return `true` when this error aborts the whole render.
    ///
    /// Only [`SceneError::Draw`] is transient; everything else is fatal.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Draw(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
