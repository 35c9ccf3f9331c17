//! Source media inspection through ffprobe.

use std::path::Path;
use std::process::Command;

use serde::Deserialize;

use qtov_common::error::{QtovError, QtovResult};

/// What the render pipeline needs to know about a source video.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    /// Natural duration in seconds.
    pub duration_secs: f64,

    /// Displayed frame size of the first video stream, after rotation
    /// metadata is applied (ffmpeg autorotates when decoding).
    pub width: u32,
    pub height: u32,

    /// Frame rate exactly as ffprobe reports it (e.g. `30000/1001`).
    /// Passed back to ffmpeg verbatim so NTSC rates survive.
    pub frame_rate: String,

    /// `frame_rate` as a number.
    pub fps: f64,

    /// Codec of the first video stream.
    pub video_codec: String,

    /// Whether the file carries at least one audio stream.
    pub has_audio: bool,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
    #[serde(default)]
    side_data_list: Vec<FfprobeSideData>,
    #[serde(default)]
    tags: FfprobeTags,
}

#[derive(Debug, Deserialize)]
struct FfprobeSideData {
    side_data_type: Option<String>,
    rotation: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeTags {
    rotate: Option<String>,
}

impl FfprobeStream {
    /// Rotation in degrees from the display matrix, else the legacy `rotate` tag.
    fn rotation(&self) -> f64 {
        self.side_data_list
            .iter()
            .filter(|sd| sd.side_data_type.as_deref() == Some("Display Matrix"))
            .find_map(|sd| sd.rotation)
            .or_else(|| {
                self.tags
                    .rotate
                    .as_deref()
                    .and_then(|r| r.trim().parse::<f64>().ok())
            })
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

impl MediaInfo {
    /// Build from `ffprobe -print_format json -show_format -show_streams` output.
    pub fn from_ffprobe_json(json: &str) -> QtovResult<Self> {
        let output: FfprobeOutput = serde_json::from_str(json)
            .map_err(|e| QtovError::probe(format!("Unreadable ffprobe output: {e}")))?;

        let video = output
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .ok_or_else(|| QtovError::probe("No video stream found"))?;

        let has_audio = output
            .streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some("audio"));

        let coded_width = video.width.unwrap_or(0);
        let coded_height = video.height.unwrap_or(0);
        if coded_width == 0 || coded_height == 0 {
            return Err(QtovError::probe(format!(
                "Video stream has no usable frame size ({coded_width}x{coded_height})"
            )));
        }
        let (width, height) = if is_quarter_turn(video.rotation()) {
            (coded_height, coded_width)
        } else {
            (coded_width, coded_height)
        };

        let duration_secs = output
            .format
            .as_ref()
            .and_then(|f| f.duration.as_deref())
            .and_then(|d| d.parse::<f64>().ok())
            .or_else(|| video.duration.as_deref().and_then(|d| d.parse::<f64>().ok()))
            .filter(|d| d.is_finite() && *d > 0.0)
            .ok_or_else(|| QtovError::probe("Could not determine video duration"))?;

        // avg_frame_rate matches what players report; r_frame_rate can be a
        // timebase artefact (90000/1) on phone footage.
        let (frame_rate, fps) = [video.avg_frame_rate.as_deref(), video.r_frame_rate.as_deref()]
            .into_iter()
            .flatten()
            .find_map(|rate| parse_rational(rate).map(|fps| (rate.to_string(), fps)))
            .ok_or_else(|| QtovError::probe("Could not determine video frame rate"))?;

        Ok(Self {
            duration_secs,
            width,
            height,
            frame_rate,
            fps,
            video_codec: video.codec_name.clone().unwrap_or_default(),
            has_audio,
        })
    }
}

/// Inspect `path` with the given ffprobe binary.
pub fn probe_media(ffprobe: &Path, path: &Path) -> QtovResult<MediaInfo> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                QtovError::unsupported(format!("ffprobe not found at {}", ffprobe.display()))
            } else {
                QtovError::probe(format!("Failed to start ffprobe: {e}"))
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(QtovError::probe(format!(
            "ffprobe failed on {} (status {}): {}",
            path.display(),
            output.status,
            stderr.trim()
        )));
    }

    let json = String::from_utf8_lossy(&output.stdout);
    let info = MediaInfo::from_ffprobe_json(&json)?;
    tracing::debug!(
        path = %path.display(),
        width = info.width,
        height = info.height,
        duration_secs = info.duration_secs,
        frame_rate = %info.frame_rate,
        codec = %info.video_codec,
        has_audio = info.has_audio,
        "Probed source video"
    );
    Ok(info)
}

/// True for +-90 and +-270 degrees, where width and height trade places.
fn is_quarter_turn(degrees: f64) -> bool {
    let turn = degrees.rem_euclid(360.0).round() as i64;
    turn == 90 || turn == 270
}

/// Parse `num/den` (or a plain number) into a positive rate.
fn parse_rational(value: &str) -> Option<f64> {
    let rate = match value.split_once('/') {
        Some((num, den)) => {
            let num = num.trim().parse::<f64>().ok()?;
            let den = den.trim().parse::<f64>().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => value.trim().parse::<f64>().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}
