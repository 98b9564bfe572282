//! Threshold-based scene-cut detection via FFmpeg's `select` filter.
//!
//! FFmpeg's `scene` metric is a per-frame score in `[0, 1]` estimating
//! how different a frame is from the previous one. Running
//! `select='gt(scene,threshold)',showinfo` emits one `showinfo` line
//! per selected frame with a `pts_time:` field — those timestamps are
//! our scene-cut boundaries. This needs no model and no dependency
//! beyond the `ffmpeg` binary already required for every other stage.

use std::process::Stdio;

use std::path::Path;
use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// Default sensitivity for scene-cut detection: a frame is a cut if its
/// `scene` score exceeds this threshold.
pub const DEFAULT_SCENE_THRESHOLD: f64 = 0.35;

/// Minimum scene length, in seconds. Cuts closer together than this are
/// merged forward into the following scene.
pub const MIN_SCENE_LEN_S: f64 = 1.0;

/// Detect scene-cut timestamps (seconds) in `input`, given the clip's
/// total `duration_s`.
///
/// Returns the sorted, de-duplicated cut points strictly inside
/// `(0, duration_s)`. Callers turn these into `[start, end)` intervals
/// by bracketing with `0.0` and `duration_s`.
pub async fn detect_scene_cuts(
    input: impl AsRef<Path>,
    duration_s: f64,
    threshold: f64,
) -> MediaResult<Vec<f64>> {
    let input = input.as_ref();
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

    let filter = format!("select='gt(scene,{threshold})',showinfo");
    let output = Command::new("ffmpeg")
        .args(["-v", "info", "-i"])
        .arg(input)
        .args(["-vf", &filter, "-f", "null", "-"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    let mut cuts: Vec<f64> = stderr
        .lines()
        .filter_map(parse_pts_time)
        .filter(|&t| t > 0.0 && t < duration_s)
        .collect();

    cuts.sort_by(|a, b| a.partial_cmp(b).unwrap());
    cuts.dedup_by(|a, b| (*a - *b).abs() < 1e-6);

    Ok(merge_short_scenes(cuts, duration_s))
}

/// Drop cut points that would create a scene shorter than [`MIN_SCENE_LEN_S`],
/// merging it forward into the following scene.
fn merge_short_scenes(cuts: Vec<f64>, duration_s: f64) -> Vec<f64> {
    let mut boundaries = Vec::with_capacity(cuts.len() + 2);
    boundaries.push(0.0);
    boundaries.extend(cuts);
    boundaries.push(duration_s);

    let mut merged = vec![boundaries[0]];
    for &b in &boundaries[1..] {
        let last = *merged.last().unwrap();
        if b - last >= MIN_SCENE_LEN_S {
            merged.push(b);
        }
    }

    // Drop the synthetic 0.0/duration_s brackets; keep only interior cuts.
    merged
        .into_iter()
        .filter(|&b| b > 0.0 && b < duration_s)
        .collect()
}

fn parse_pts_time(line: &str) -> Option<f64> {
    if !line.contains("Parsed_showinfo") {
        return None;
    }
    let idx = line.find("pts_time:")?;
    let rest = &line[idx + "pts_time:".len()..];
    let value = rest.split_whitespace().next()?;
    value.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pts_time_from_showinfo_line() {
        let line = "[Parsed_showinfo_1 @ 0x5577] n:12 pts:48000 pts_time:2.000000 duration:1 pos:12345";
        assert_eq!(parse_pts_time(line), Some(2.0));
    }

    #[test]
    fn ignores_unrelated_lines() {
        let line = "frame=  120 fps=30 q=-1.0 size=N/A time=00:00:04.00 bitrate=N/A speed=1.2x";
        assert_eq!(parse_pts_time(line), None);
    }

    #[test]
    fn merges_scenes_shorter_than_minimum() {
        // [0, 0.3) is shorter than MIN_SCENE_LEN_S, so it merges forward
        // into [0.3, 5.0), dropping the 0.3 boundary. The resulting
        // [5.0, 5.4) is itself short and merges forward into [5.4, 10.0),
        // dropping 5.4 too: only the 5.0 boundary survives.
        let merged = merge_short_scenes(vec![0.3, 5.0, 5.4], 10.0);
        assert_eq!(merged, vec![5.0]);
    }

    #[test]
    fn keeps_well_separated_cuts() {
        let merged = merge_short_scenes(vec![2.0, 5.0, 8.0], 10.0);
        assert_eq!(merged, vec![2.0, 5.0, 8.0]);
    }
}
