//! Audio mixing by ffmpeg filter graph.
//!
//! This module performs no DSP: it only constructs the delay/volume/amix
//! filter-graph argument list merging N element streams into one track and
//! delegates the work to the external `ffmpeg` binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::composition::element::AudioStream;
use crate::foundation::error::{SceneError, SceneResult};

/// Build the complete ffmpeg argument list mixing `streams` into `out_path`.
///
/// Single stream: only a start-delay (`adelay`) filter, plus `volume` when
/// the weight is not 1. Multiple streams: one delay(+volume) chain per input
/// and a final N-way `amix` with explicit per-stream weights,
/// `duration=longest`, and `normalize=0`. There is no automatic loudness
/// normalization by stream count, so adding a stream never quiets the rest.
pub fn build_mix_args(streams: &[AudioStream], out_path: &Path) -> SceneResult<Vec<String>> {
    if streams.is_empty() {
        return Err(SceneError::validation("audio mix needs at least one stream"));
    }
    for stream in streams {
        if !stream.start_offset.is_finite() || stream.start_offset < 0.0 {
            return Err(SceneError::validation(
                "audio stream start_offset must be finite and >= 0",
            ));
        }
        if !stream.volume.is_finite() || stream.volume < 0.0 {
            return Err(SceneError::validation(
                "audio stream volume must be finite and >= 0",
            ));
        }
    }

    let mut args: Vec<String> = vec!["-y".into(), "-loglevel".into(), "error".into()];

    for stream in streams {
        if stream.looped {
            args.push("-stream_loop".into());
            args.push("-1".into());
        }
        args.push("-i".into());
        args.push(stream.path.to_string_lossy().into_owned());
    }

    if streams.len() == 1 {
        let stream = &streams[0];
        let mut chain = delay_filter(stream.start_offset);
        if (stream.volume - 1.0).abs() > f64::EPSILON {
            chain.push_str(&format!(",volume={}", fmt_f64(stream.volume)));
        }
        args.push("-af".into());
        args.push(chain);
    } else {
        let mut graph = String::new();
        for (i, stream) in streams.iter().enumerate() {
            let mut chain = delay_filter(stream.start_offset);
            if (stream.volume - 1.0).abs() > f64::EPSILON {
                chain.push_str(&format!(",volume={}", fmt_f64(stream.volume)));
            }
            graph.push_str(&format!("[{i}:a]{chain}[a{i}];"));
        }
        for i in 0..streams.len() {
            graph.push_str(&format!("[a{i}]"));
        }
        let weights: Vec<String> = streams.iter().map(|s| fmt_f64(s.volume)).collect();
        graph.push_str(&format!(
            "amix=inputs={}:duration=longest:weights='{}':normalize=0[aout]",
            streams.len(),
            weights.join(" ")
        ));
        args.push("-filter_complex".into());
        args.push(graph);
        args.push("-map".into());
        args.push("[aout]".into());
    }

    args.push("-c:a".into());
    args.push("aac".into());
    args.push(out_path.to_string_lossy().into_owned());
    Ok(args)
}

/// Mix `streams` into one `.m4a` track at `out_path` by invoking `ffmpeg`.
///
/// Returns `None` without touching the encoder when there are no streams.
pub fn mix_streams(streams: &[AudioStream], out_path: &Path) -> SceneResult<Option<PathBuf>> {
    if streams.is_empty() {
        return Ok(None);
    }
    for stream in streams {
        if !stream.path.exists() {
            return Err(SceneError::resource(format!(
                "audio source '{}' does not exist",
                stream.path.display()
            )));
        }
    }

    let args = build_mix_args(streams, out_path)?;
    tracing::debug!(streams = streams.len(), out = %out_path.display(), "mixing audio");

    let output = Command::new("ffmpeg")
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| {
            SceneError::resource(format!(
                "failed to run ffmpeg for audio mix (is it on PATH?): {e}"
            ))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SceneError::encode(
            output.status.code().unwrap_or(-1),
            stderr.trim().to_string(),
        ));
    }
    Ok(Some(out_path.to_path_buf()))
}

/// `adelay` wants milliseconds, one value per channel.
fn delay_filter(start_offset_secs: f64) -> String {
    let ms = (start_offset_secs * 1000.0).round().max(0.0) as u64;
    format!("adelay={ms}|{ms}")
}

fn fmt_f64(v: f64) -> String {
    if v == v.trunc() {
        format!("{v:.0}")
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
