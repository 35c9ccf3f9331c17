//! Soundtrack decisions: keep, replace, mix, or drop.

/// Gain applied to background music in every branch.
pub const MUSIC_VOLUME: f64 = 0.3;

/// Label of the audio filter graph output.
pub const AUDIO_OUT_LABEL: &str = "[aout]";

/// How the output soundtrack is assembled.
///
/// Input 0 is always the source video; input 1 is the music file when present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioPlan {
    /// Silent source, no music: the output has no audio stream.
    None,
    /// Source audio passes through unchanged.
    Source,
    /// Silent source: music is the only track.
    Music,
    /// Source audio with music added underneath.
    SourceWithMusic,
}

impl AudioPlan {
    pub fn resolve(source_has_audio: bool, has_music: bool) -> Self {
        match (source_has_audio, has_music) {
            (false, false) => Self::None,
            (true, false) => Self::Source,
            (false, true) => Self::Music,
            (true, true) => Self::SourceWithMusic,
        }
    }

    pub fn has_output(self) -> bool {
        self != Self::None
    }

    pub fn uses_music(self) -> bool {
        matches!(self, Self::Music | Self::SourceWithMusic)
    }

    /// Filter graph producing `[aout]`, or `None` when there is no soundtrack.
    ///
    /// Music is padded with silence so a short track still spans the video;
    /// the stage's `-t` bounds the padded stream. The mix is additive
    /// (`normalize=0`): the source keeps its level and music sits on top.
    pub fn filter_graph(self) -> Option<String> {
        let music = format!("[1:a:0]volume={MUSIC_VOLUME},apad");
        match self {
            Self::None => None,
            Self::Source => Some(format!("[0:a:0]anull{AUDIO_OUT_LABEL}")),
            Self::Music => Some(format!("{music}{AUDIO_OUT_LABEL}")),
            Self::SourceWithMusic => Some(format!(
                "{music}[music];[0:a:0][music]amix=inputs=2:duration=longest:dropout_transition=0:normalize=0{AUDIO_OUT_LABEL}"
            )),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Source => "source",
            Self::Music => "music",
            Self::SourceWithMusic => "source+music",
        }
    }
}
