//! qtov Render Engine
//!
//! Turns a validated job into a captioned video by driving ffmpeg.
//! No frames are touched in-process; every stage is an ffmpeg invocation.
//!
//! # Pipeline Architecture
//!
//! ```text
//! video.mp4 ── ffprobe ──► MediaInfo (size, duration, fps, audio?)
//!                               │
//!                   Trim (max_duration)
//!                               │
//! quote + style ──► CaptionLayout (80% width, wrapped, outlined)
//!                               │
//! music.mp3 ──┐                 │
//! video audio ┴─► AudioPlan ─► temp-audio.m4a (staging dir)
//!                               │
//!                               ▼
//!                 drawtext composite + encode (libx264 / aac)
//!                               │
//!                               ▼
//!                          output.mp4
//! ```

pub mod audio;
pub mod caption;
pub mod export;
pub mod probe;

pub use audio::AudioPlan;
pub use caption::{CaptionFont, CaptionLayout};
pub use export::*;
pub use probe::{probe_media, MediaInfo};
