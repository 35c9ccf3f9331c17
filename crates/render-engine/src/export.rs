//! Render job execution.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use qtov_common::config::RenderDefaults;
use qtov_common::error::{QtovError, QtovResult};
use qtov_job_model::job::JobConfig;

use crate::audio::{AudioPlan, AUDIO_OUT_LABEL};
use crate::caption::{CaptionFont, CaptionLayout};
use crate::probe::{probe_media, MediaInfo};

/// File name of the intermediate soundtrack inside the staging directory.
pub const TEMP_AUDIO_FILE: &str = "temp-audio.m4a";

pub const VIDEO_CODEC: &str = "libx264";
pub const AUDIO_CODEC: &str = "aac";

const VIDEO_OUT_LABEL: &str = "[vout]";

/// A render job ready to be executed.
#[derive(Debug, Clone)]
pub struct RenderJob {
    /// What to render.
    pub config: JobConfig,

    /// Toolchain and encoder settings.
    pub settings: RenderDefaults,
}

impl RenderJob {
    pub fn new(config: JobConfig, settings: RenderDefaults) -> Self {
        Self { config, settings }
    }

    /// Font for the caption: configured file, then style family, then default family.
    pub fn caption_font(&self) -> CaptionFont {
        if let Some(file) = &self.settings.font_file {
            return CaptionFont::File(file.clone());
        }
        CaptionFont::Family(
            self.config
                .style
                .font_family
                .clone()
                .unwrap_or_else(|| self.settings.font_family.clone()),
        )
    }
}

/// Progress callback for rendering.
pub type ProgressCallback = Box<dyn Fn(RenderProgress) + Send>;

/// Render progress report.
#[derive(Debug, Clone)]
pub struct RenderProgress {
    /// Progress of the current stage [0.0, 1.0].
    pub progress: f64,

    /// Frames rendered so far.
    pub frames_rendered: u64,

    /// Total frames to render.
    pub total_frames: u64,

    /// Estimated time remaining for the current stage in seconds.
    pub eta_secs: f64,

    /// Current stage.
    pub stage: RenderStage,
}

/// Stages of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    Preparing,
    MixingAudio,
    Encoding,
    Finalizing,
    Complete,
}

/// What a finished render produced.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub output_path: PathBuf,
    pub duration_secs: f64,
    pub truncated: bool,
    pub audio: AudioPlan,
    pub caption_lines: usize,
    pub elapsed_secs: f64,
}

/// Trait for render backends.
pub trait RenderBackend: Send {
    /// Execute the render job.
    fn render(
        &mut self,
        job: &RenderJob,
        progress: Option<ProgressCallback>,
    ) -> QtovResult<RenderOutcome>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Render a job with the ffmpeg backend.
///
/// This is the main entry point. Blocks until the output file is written.
pub fn process_video(
    job: &RenderJob,
    progress: Option<ProgressCallback>,
) -> QtovResult<RenderOutcome> {
    let mut backend = FfmpegBackend::from_settings(&job.settings);
    process_video_with(&mut backend, job, progress)
}

/// Render a job with an explicit backend.
pub fn process_video_with(
    backend: &mut dyn RenderBackend,
    job: &RenderJob,
    progress: Option<ProgressCallback>,
) -> QtovResult<RenderOutcome> {
    tracing::info!(
        video = %job.config.video_path.display(),
        output = %job.config.output_path.display(),
        music = ?job.config.music_path,
        max_duration = ?job.config.max_duration,
        "Starting render"
    );

    job.config.validate()?;

    if !job.config.video_path.is_file() {
        return Err(QtovError::FileNotFound {
            path: job.config.video_path.clone(),
        });
    }
    if let Some(music) = &job.config.music_path {
        if !music.is_file() {
            return Err(QtovError::FileNotFound {
                path: music.clone(),
            });
        }
    }

    if let Some(parent) = job.config.output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    if let Some(cb) = &progress {
        cb(RenderProgress {
            progress: 0.0,
            frames_rendered: 0,
            total_frames: 0,
            eta_secs: 0.0,
            stage: RenderStage::Preparing,
        });
    }

    if !backend.is_available() {
        return Err(QtovError::unsupported(format!(
            "Render backend '{}' is not available (is ffmpeg installed?)",
            backend.name()
        )));
    }

    tracing::info!(backend = backend.name(), "Using render backend");
    backend.render(job, progress)
}

/// Output length after applying the optional cap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trim {
    pub natural_secs: f64,
    pub output_secs: f64,
    pub truncated: bool,
}

impl Trim {
    /// Truncate only when a positive cap is shorter than the source.
    pub fn resolve(natural_secs: f64, limit: Option<f64>) -> Self {
        match limit {
            Some(max) if max > 0.0 && max < natural_secs => Self {
                natural_secs,
                output_secs: max,
                truncated: true,
            },
            _ => Self {
                natural_secs,
                output_secs: natural_secs,
                truncated: false,
            },
        }
    }
}

/// Everything needed to run a render, computed without touching the disk.
#[derive(Debug, Clone)]
pub struct RenderPlan {
    pub trim: Trim,
    pub audio: AudioPlan,
    pub caption: CaptionLayout,

    /// Caption line files to write before any stage runs: `(path, contents)`.
    pub caption_files: Vec<(PathBuf, String)>,

    /// ffmpeg arguments for the soundtrack stage, if there is a soundtrack.
    pub audio_stage_args: Option<Vec<String>>,

    /// Intermediate soundtrack written by the audio stage.
    pub temp_audio_path: Option<PathBuf>,

    /// ffmpeg arguments for the composite-and-encode stage.
    pub video_stage_args: Vec<String>,

    pub total_frames: u64,
    pub debug_report: String,
}

/// Build the render plan for `job` against probed `media`.
pub fn build_plan(
    job: &RenderJob,
    media: &MediaInfo,
    staging_dir: &Path,
) -> QtovResult<RenderPlan> {
    let config = &job.config;
    let trim = Trim::resolve(media.duration_secs, config.duration_limit());
    if trim.output_secs <= 0.0 {
        return Err(QtovError::render("Render duration resolved to zero seconds"));
    }

    let total_frames = (trim.output_secs * media.fps).ceil() as u64;
    let audio = AudioPlan::resolve(media.has_audio, config.music_path.is_some());

    let caption = CaptionLayout::new(&config.quote, &config.style, media.width, media.height);
    let caption_files = caption.line_files(staging_dir);
    let font = job.caption_font();
    let drawtexts = caption.drawtext_filters(&config.style, &font, staging_dir);
    let video_filter = if drawtexts.is_empty() {
        format!("[0:v]null{VIDEO_OUT_LABEL}")
    } else {
        format!("[0:v]{}{VIDEO_OUT_LABEL}", drawtexts.join(","))
    };

    let temp_audio_path = audio
        .has_output()
        .then(|| staging_dir.join(TEMP_AUDIO_FILE));

    let audio_stage_args = match (audio.filter_graph(), &temp_audio_path) {
        (Some(graph), Some(temp_audio)) => {
            let mut args = ffmpeg_preamble();
            args.push("-i".to_string());
            args.push(config.video_path.display().to_string());
            if audio.uses_music() {
                if let Some(music) = &config.music_path {
                    args.push("-i".to_string());
                    args.push(music.display().to_string());
                }
            }
            args.extend([
                "-filter_complex".to_string(),
                graph,
                "-map".to_string(),
                AUDIO_OUT_LABEL.to_string(),
                "-vn".to_string(),
                "-t".to_string(),
                format!("{:.6}", trim.output_secs),
                "-c:a".to_string(),
                AUDIO_CODEC.to_string(),
                "-b:a".to_string(),
                format!("{}k", job.settings.audio_bitrate_kbps.max(64)),
            ]);
            args.push(temp_audio.display().to_string());
            Some(args)
        }
        _ => None,
    };

    let mut video_stage_args = ffmpeg_preamble();
    video_stage_args.push("-i".to_string());
    video_stage_args.push(config.video_path.display().to_string());
    if let Some(temp_audio) = &temp_audio_path {
        video_stage_args.push("-i".to_string());
        video_stage_args.push(temp_audio.display().to_string());
    }
    video_stage_args.extend([
        "-filter_complex".to_string(),
        video_filter.clone(),
        "-map".to_string(),
        VIDEO_OUT_LABEL.to_string(),
    ]);
    if temp_audio_path.is_some() {
        video_stage_args.extend([
            "-map".to_string(),
            "1:a:0".to_string(),
            "-c:a".to_string(),
            "copy".to_string(),
        ]);
    } else {
        video_stage_args.push("-an".to_string());
    }
    if trim.truncated {
        video_stage_args.push("-t".to_string());
        video_stage_args.push(format!("{:.6}", trim.output_secs));
    }
    video_stage_args.push("-r".to_string());
    video_stage_args.push(media.frame_rate.clone());
    video_stage_args.append(&mut video_codec_args(&job.settings));
    video_stage_args.push(config.output_path.display().to_string());

    let debug_report = format!(
        "generated_at={}\nsource={}\nsource_size={}x{}\nsource_codec={}\nframe_rate={}\nnatural_secs={:.3}\noutput_secs={:.3}\ntruncated={}\nframes={}\naudio_plan={}\nfont={:?}\ncaption_lines={}\nline_em={:.2}\ncaption_origin_y={}\nvideo_filter={}\naudio_stage_args={}\nvideo_stage_args={}\n",
        chrono::Utc::now().to_rfc3339(),
        config.video_path.display(),
        media.width,
        media.height,
        media.video_codec,
        media.frame_rate,
        trim.natural_secs,
        trim.output_secs,
        trim.truncated,
        total_frames,
        audio.as_str(),
        font,
        caption.lines.len(),
        caption.max_line_em,
        caption.origin_y,
        video_filter,
        audio_stage_args
            .as_ref()
            .map(|args| args.join(" "))
            .unwrap_or_else(|| "-".to_string()),
        video_stage_args.join(" "),
    );

    tracing::info!(
        output_secs = trim.output_secs,
        truncated = trim.truncated,
        frames = total_frames,
        audio_plan = audio.as_str(),
        caption_lines = caption.lines.len(),
        caption_position = config.style.position.as_str(),
        "Render plan built"
    );

    Ok(RenderPlan {
        trim,
        audio,
        caption,
        caption_files,
        audio_stage_args,
        temp_audio_path,
        video_stage_args,
        total_frames,
        debug_report,
    })
}

fn ffmpeg_preamble() -> Vec<String> {
    [
        "-y",
        "-hide_banner",
        "-loglevel",
        "error",
        "-nostats",
        "-progress",
        "pipe:1",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn video_codec_args(settings: &RenderDefaults) -> Vec<String> {
    vec![
        "-c:v".to_string(),
        VIDEO_CODEC.to_string(),
        "-preset".to_string(),
        settings.preset.clone(),
        "-crf".to_string(),
        settings.crf.min(51).to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
    ]
}

/// Render backend that shells out to ffmpeg and ffprobe.
pub struct FfmpegBackend {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegBackend {
    pub fn from_settings(settings: &RenderDefaults) -> Self {
        Self {
            ffmpeg: settings.ffmpeg_path.clone(),
            ffprobe: settings.ffprobe_path.clone(),
        }
    }

    /// Run one ffmpeg stage to completion, forwarding `-progress` blocks.
    fn run_ffmpeg(
        &self,
        args: &[String],
        mut tracker: StageProgress,
        progress: Option<&ProgressCallback>,
    ) -> QtovResult<()> {
        let stage = tracker.stage;
        tracing::debug!(args = ?args, stage = ?stage, "Running ffmpeg");

        let start = std::time::Instant::now();
        let mut child = Command::new(&self.ffmpeg)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| QtovError::render(format!("Failed to start ffmpeg: {e}")))?;
        tracing::debug!(pid = child.id(), stage = ?stage, "ffmpeg process started");

        let (Some(stdout), Some(mut stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(QtovError::render("ffmpeg pipes were not captured"));
        };

        // ffmpeg stalls if nobody empties its stderr pipe.
        let stderr_reader = std::thread::spawn(move || {
            let mut text = String::new();
            if let Err(err) = stderr.read_to_string(&mut text) {
                text.push_str(&format!("\n<stderr unreadable: {err}>"));
            }
            text
        });

        for line in BufReader::new(stdout).lines() {
            let line =
                line.map_err(|e| QtovError::render(format!("Failed reading ffmpeg progress: {e}")))?;
            if tracker.ingest(&line) {
                if let Some(cb) = progress {
                    cb(tracker.snapshot(start.elapsed().as_secs_f64()));
                }
            }
        }

        let status = child
            .wait()
            .map_err(|e| QtovError::render(format!("Failed to wait on ffmpeg: {e}")))?;
        let stderr_text = stderr_reader
            .join()
            .unwrap_or_else(|_| "<stderr reader panicked>".to_string());

        if !status.success() {
            return Err(QtovError::render(format!(
                "ffmpeg {stage:?} stage failed ({status}): {}",
                stderr_text.trim()
            )));
        }

        tracing::debug!(
            stage = ?stage,
            elapsed_secs = start.elapsed().as_secs_f64(),
            "ffmpeg stage finished"
        );
        Ok(())
    }
}

impl RenderBackend for FfmpegBackend {
    fn render(
        &mut self,
        job: &RenderJob,
        progress: Option<ProgressCallback>,
    ) -> QtovResult<RenderOutcome> {
        let started = std::time::Instant::now();
        let media = probe_media(&self.ffprobe, &job.config.video_path)?;

        // Caption files and the temporary soundtrack live here; the directory
        // is removed when `staging` drops, whichever way this function exits.
        let staging = tempfile::Builder::new().prefix("qtov-").tempdir()?;
        let plan = build_plan(job, &media, staging.path())?;

        for (path, contents) in &plan.caption_files {
            std::fs::write(path, contents).map_err(|e| {
                QtovError::render(format!(
                    "Failed to write caption file {}: {e}",
                    path.display()
                ))
            })?;
        }

        if job.settings.write_debug_report {
            let debug_path = debug_report_path(&job.config.output_path);
            if let Err(err) = std::fs::write(&debug_path, &plan.debug_report) {
                tracing::warn!(error = %err, path = %debug_path.display(), "Failed to write ffmpeg debug report");
            } else {
                tracing::info!(path = %debug_path.display(), "Wrote ffmpeg debug report");
            }
        }

        if let Some(args) = &plan.audio_stage_args {
            self.run_ffmpeg(
                args,
                StageProgress::new(RenderStage::MixingAudio, &plan),
                progress.as_ref(),
            )?;
        }

        self.run_ffmpeg(
            &plan.video_stage_args,
            StageProgress::new(RenderStage::Encoding, &plan),
            progress.as_ref(),
        )?;

        if let Some(cb) = &progress {
            cb(RenderProgress {
                progress: 1.0,
                frames_rendered: plan.total_frames,
                total_frames: plan.total_frames,
                eta_secs: 0.0,
                stage: RenderStage::Finalizing,
            });
        }

        if let Some(temp_audio) = &plan.temp_audio_path {
            if let Err(err) = std::fs::remove_file(temp_audio) {
                tracing::warn!(error = %err, path = %temp_audio.display(), "Failed to remove temporary audio");
            }
        }
        let staging_path = staging.path().to_path_buf();
        if let Err(err) = staging.close() {
            tracing::warn!(error = %err, path = %staging_path.display(), "Failed to remove staging directory");
        }

        if let Some(cb) = &progress {
            cb(RenderProgress {
                progress: 1.0,
                frames_rendered: plan.total_frames,
                total_frames: plan.total_frames,
                eta_secs: 0.0,
                stage: RenderStage::Complete,
            });
        }

        let elapsed_secs = started.elapsed().as_secs_f64();
        tracing::info!(
            output = %job.config.output_path.display(),
            elapsed_secs,
            "Render finished"
        );

        Ok(RenderOutcome {
            output_path: job.config.output_path.clone(),
            duration_secs: plan.trim.output_secs,
            truncated: plan.trim.truncated,
            audio: plan.audio,
            caption_lines: plan.caption.lines.len(),
            elapsed_secs,
        })
    }

    fn is_available(&self) -> bool {
        Command::new(&self.ffmpeg)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Where the debug report for `output` goes: the output file name plus
/// `.ffmpeg-debug.txt`.
pub fn debug_report_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".ffmpeg-debug.txt");
    PathBuf::from(name)
}

/// Folds ffmpeg `-progress` key/value lines into stage progress reports.
#[derive(Debug)]
struct StageProgress {
    stage: RenderStage,
    expected_secs: f64,
    total_frames: u64,
    encoded_secs: f64,
    finished: bool,
}

impl StageProgress {
    fn new(stage: RenderStage, plan: &RenderPlan) -> Self {
        Self {
            stage,
            expected_secs: plan.trim.output_secs,
            total_frames: plan.total_frames,
            encoded_secs: 0.0,
            finished: false,
        }
    }

    /// Take one line; true when it closes a progress block.
    fn ingest(&mut self, line: &str) -> bool {
        let Some((key, value)) = line.trim().split_once('=') else {
            return false;
        };
        match key {
            // Microseconds, whichever of the two names this ffmpeg build uses.
            "out_time_us" | "out_time_ms" => {
                if let Ok(micros) = value.parse::<f64>() {
                    self.encoded_secs = micros / 1e6;
                }
                false
            }
            "progress" => {
                self.finished = value == "end";
                true
            }
            _ => false,
        }
    }

    fn fraction(&self) -> f64 {
        if self.finished {
            1.0
        } else if self.expected_secs > 0.0 {
            (self.encoded_secs / self.expected_secs).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    fn snapshot(&self, elapsed_secs: f64) -> RenderProgress {
        let progress = self.fraction();
        let eta_secs = if progress > 0.0 {
            (elapsed_secs * (1.0 - progress) / progress).max(0.0)
        } else {
            0.0
        };
        RenderProgress {
            progress,
            frames_rendered: (progress * self.total_frames as f64).round() as u64,
            total_frames: self.total_frames,
            eta_secs,
            stage: self.stage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qtov_job_model::style::TextStyle;

    fn media(duration_secs: f64, has_audio: bool) -> MediaInfo {
        MediaInfo {
            duration_secs,
            width: 1080,
            height: 1920,
            frame_rate: "30000/1001".to_string(),
            fps: 30000.0 / 1001.0,
            video_codec: "h264".to_string(),
            has_audio,
        }
    }

    fn job(music: Option<&str>, max_duration: Option<f64>) -> RenderJob {
        RenderJob::new(
            JobConfig {
                video_path: PathBuf::from("in/clip.mp4"),
                quote: "Whatever you are, be a good one.".to_string(),
                style: TextStyle::default(),
                output_path: PathBuf::from("out/final.mp4"),
                music_path: music.map(PathBuf::from),
                max_duration,
            },
            RenderDefaults::default(),
        )
    }

    fn arg_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_trim_only_when_cap_is_shorter() {
        assert!(!Trim::resolve(10.0, None).truncated);
        assert!(!Trim::resolve(10.0, Some(15.0)).truncated);
        assert!(!Trim::resolve(10.0, Some(10.0)).truncated);
        assert!(!Trim::resolve(10.0, Some(0.0)).truncated);

        let trim = Trim::resolve(10.0, Some(4.5));
        assert!(trim.truncated);
        assert_eq!(trim.output_secs, 4.5);
    }

    #[test]
    fn test_untruncated_plan_has_no_duration_flag() {
        let plan = build_plan(&job(None, Some(60.0)), &media(12.0, true), Path::new("/s")).unwrap();
        assert!(!plan.trim.truncated);
        assert!(!plan.video_stage_args.contains(&"-t".to_string()));
    }

    #[test]
    fn test_truncated_plan_caps_both_stages() {
        let plan = build_plan(&job(None, Some(5.0)), &media(12.0, true), Path::new("/s")).unwrap();
        assert!(plan.trim.truncated);
        assert_eq!(arg_after(&plan.video_stage_args, "-t"), Some("5.000000"));
        let audio = plan.audio_stage_args.as_ref().unwrap();
        assert_eq!(arg_after(audio, "-t"), Some("5.000000"));
        assert_eq!(plan.total_frames, 150);
    }

    #[test]
    fn test_encode_uses_fixed_codecs_and_source_rate() {
        let plan = build_plan(&job(None, None), &media(3.0, false), Path::new("/s")).unwrap();
        let args = &plan.video_stage_args;
        assert_eq!(arg_after(args, "-c:v"), Some("libx264"));
        assert_eq!(arg_after(args, "-r"), Some("30000/1001"));
        assert_eq!(args.last().map(String::as_str), Some("out/final.mp4"));
    }

    #[test]
    fn test_silent_source_without_music_has_no_audio_stage() {
        let plan = build_plan(&job(None, None), &media(3.0, false), Path::new("/s")).unwrap();
        assert_eq!(plan.audio, AudioPlan::None);
        assert!(plan.audio_stage_args.is_none());
        assert!(plan.temp_audio_path.is_none());
        assert!(plan.video_stage_args.contains(&"-an".to_string()));
    }

    #[test]
    fn test_music_mix_goes_through_temp_audio() {
        let staging = Path::new("/stage");
        let plan = build_plan(&job(Some("music/bed.mp3"), None), &media(8.0, true), staging).unwrap();
        assert_eq!(plan.audio, AudioPlan::SourceWithMusic);

        let temp_audio = staging.join(TEMP_AUDIO_FILE);
        assert_eq!(plan.temp_audio_path.as_deref(), Some(temp_audio.as_path()));

        let audio = plan.audio_stage_args.as_ref().unwrap();
        assert!(audio.contains(&"music/bed.mp3".to_string()));
        assert_eq!(arg_after(audio, "-c:a"), Some("aac"));
        assert_eq!(audio.last(), Some(&temp_audio.display().to_string()));

        let video = &plan.video_stage_args;
        assert!(video.contains(&temp_audio.display().to_string()));
        assert_eq!(arg_after(video, "-c:a"), Some("copy"));
    }

    #[test]
    fn test_music_is_sole_track_for_silent_source() {
        let plan = build_plan(&job(Some("bed.mp3"), None), &media(8.0, false), Path::new("/s")).unwrap();
        assert_eq!(plan.audio, AudioPlan::Music);
        let graph = arg_after(plan.audio_stage_args.as_ref().unwrap(), "-filter_complex").unwrap();
        assert!(!graph.contains("amix"));
    }

    #[test]
    fn test_caption_files_live_in_staging_dir() {
        let staging = Path::new("/stage");
        let plan = build_plan(&job(None, None), &media(3.0, false), staging).unwrap();
        assert!(!plan.caption_files.is_empty());
        for (path, _) in &plan.caption_files {
            assert!(path.starts_with(staging));
        }
        let graph = arg_after(&plan.video_stage_args, "-filter_complex").unwrap();
        assert!(graph.starts_with("[0:v]drawtext="));
        assert!(graph.ends_with("[vout]"));
    }

    #[test]
    fn test_caption_font_precedence() {
        let mut job = job(None, None);
        assert_eq!(
            job.caption_font(),
            CaptionFont::Family("DejaVu Sans".to_string())
        );

        job.config.style.font_family = Some("Liberation Serif".to_string());
        assert_eq!(
            job.caption_font(),
            CaptionFont::Family("Liberation Serif".to_string())
        );

        job.settings.font_file = Some(PathBuf::from("/fonts/Inter.ttf"));
        assert_eq!(
            job.caption_font(),
            CaptionFont::File(PathBuf::from("/fonts/Inter.ttf"))
        );
    }

    #[test]
    fn test_stage_progress_tracks_out_time() {
        let plan = build_plan(&job(None, None), &media(10.0, false), Path::new("/s")).unwrap();
        let mut tracker = StageProgress::new(RenderStage::Encoding, &plan);

        assert!(!tracker.ingest("frame=75"));
        assert!(!tracker.ingest("out_time_us=2500000"));
        assert!(tracker.ingest("progress=continue"));
        let report = tracker.snapshot(1.0);
        assert!((report.progress - 0.25).abs() < 1e-9);
        assert_eq!(report.frames_rendered, (plan.total_frames as f64 * 0.25).round() as u64);
        assert!((report.eta_secs - 3.0).abs() < 1e-9);
        assert_eq!(report.stage, RenderStage::Encoding);

        assert!(tracker.ingest("progress=end"));
        assert_eq!(tracker.snapshot(4.0).progress, 1.0);
    }

    #[test]
    fn test_debug_report_sits_next_to_output() {
        assert_eq!(
            debug_report_path(Path::new("renders/out.mp4")),
            PathBuf::from("renders/out.mp4.ffmpeg-debug.txt")
        );
    }
}
