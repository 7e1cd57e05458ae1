use std::path::{Path, PathBuf};

use crate::foundation::error::{SceneError, SceneResult};

/// Bounded retries for scratch removal when the OS still holds a handle.
const CLEANUP_RETRIES: usize = 3;

/// One process-scoped scratch directory per render.
///
/// Holds the mixed audio file, per-segment videos, and the concat manifest.
/// Removal on drop is best-effort. Failures are logged, never errors: a
/// render that already produced its output does not fail over a locked temp
/// file.
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    /// Create a fresh scratch directory under the system temp dir.
    pub fn create() -> SceneResult<Self> {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let root = std::env::temp_dir().join(format!("scenecast_{}_{nanos}", std::process::id()));
        std::fs::create_dir_all(&root).map_err(|e| {
            SceneError::resource(format!(
                "failed to create scratch directory '{}': {e}",
                root.display()
            ))
        })?;
        Ok(Self { root })
    }

    /// The scratch root path.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Path of the mixed audio track.
    pub fn audio_path(&self) -> PathBuf {
        self.root.join("audio_mix.m4a")
    }

    /// Path of segment `index`'s video file.
    pub fn segment_path(&self, index: usize) -> PathBuf {
        self.root.join(format!("segment_{index:05}.mp4"))
    }

    /// Path of the concat manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join("concat.txt")
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        for attempt in 1..=CLEANUP_RETRIES {
            match std::fs::remove_dir_all(&self.root) {
                Ok(()) => return,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
                Err(e) if attempt < CLEANUP_RETRIES => {
                    std::thread::sleep(std::time::Duration::from_millis(50 * attempt as u64));
                    tracing::debug!(
                        path = %self.root.display(),
                        attempt,
                        error = %e,
                        "scratch cleanup retry"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        path = %self.root.display(),
                        error = %e,
                        "failed to remove scratch directory"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/scratch.rs"]
mod tests;
