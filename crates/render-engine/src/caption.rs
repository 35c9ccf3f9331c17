//! Caption layout: wrapping, placement, and the drawtext filters that draw it.
//!
//! ffmpeg's drawtext does not wrap, so lines are broken here using estimated
//! glyph advances and each line becomes its own centred drawtext. Line text is
//! read from staging files with `expansion=none`, which keeps quotes, colons
//! and `%` in the caption out of the filter syntax entirely.

use std::path::{Path, PathBuf};

use qtov_job_model::style::{TextPosition, TextStyle};

/// Caption box width relative to the frame width.
pub const CAPTION_WIDTH_RATIO: f64 = 0.8;

/// Gap between the caption block and the top or bottom edge.
pub const EDGE_MARGIN_PX: f64 = 50.0;

pub const OUTLINE_WIDTH_PX: u32 = 2;
pub const OUTLINE_COLOR: &str = "black";

/// Padding of the optional background box.
pub const BOX_BORDER_PX: u32 = 10;

/// Advance of an average lowercase sans-serif glyph, in ems.
const GLYPH_ADVANCE_EM: f64 = 0.55;

/// Capitals, digits and other wide Latin glyphs.
const WIDE_GLYPH_ADVANCE_EM: f64 = 0.72;

/// `m`, `w`, `M` and `W`.
const EXTRA_WIDE_GLYPH_ADVANCE_EM: f64 = 0.9;

/// `i`, `l`, punctuation and the like.
const NARROW_GLYPH_ADVANCE_EM: f64 = 0.3;

/// CJK, Hangul, fullwidth forms and emoji.
const FULLWIDTH_GLYPH_ADVANCE_EM: f64 = 1.0;

const LINE_HEIGHT_RATIO: f64 = 1.2;

/// Font selection for drawtext.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptionFont {
    /// Fontconfig family name.
    Family(String),
    /// Explicit font file.
    File(PathBuf),
}

impl CaptionFont {
    fn filter_option(&self) -> String {
        match self {
            Self::Family(family) => format!("font={}", escape_filter_value(family)),
            Self::File(path) => format!(
                "fontfile={}",
                escape_filter_value(&path.display().to_string())
            ),
        }
    }
}

/// Resolved placement of a wrapped caption inside a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionLayout {
    /// Wrapped lines, top to bottom. Blank lines keep their vertical space.
    pub lines: Vec<String>,

    pub font_size: f64,
    pub line_height: f64,

    /// Width available to the text (80% of the frame).
    pub box_width: f64,

    /// Widest a line may be, in ems of `font_size`.
    pub max_line_em: f64,

    /// Top edge of the first line, in pixels.
    pub origin_y: f64,
}

impl CaptionLayout {
    pub fn new(quote: &str, style: &TextStyle, frame_width: u32, frame_height: u32) -> Self {
        let font_size = style.font_size;
        let line_height = (font_size * LINE_HEIGHT_RATIO).round();
        let box_width = (frame_width as f64 * CAPTION_WIDTH_RATIO).floor();
        let max_line_em = box_width / font_size;

        let lines = wrap_text(quote, max_line_em);
        let block_height = line_height * lines.len() as f64;

        let origin_y = match style.position {
            TextPosition::Top => EDGE_MARGIN_PX,
            TextPosition::Bottom => frame_height as f64 - block_height - EDGE_MARGIN_PX,
            TextPosition::Center => (frame_height as f64 - block_height) / 2.0,
        }
        .round();

        Self {
            lines,
            font_size,
            line_height,
            box_width,
            max_line_em,
            origin_y,
        }
    }

    pub fn block_height(&self) -> f64 {
        self.line_height * self.lines.len() as f64
    }

    /// Top edge of line `index`.
    pub fn line_y(&self, index: usize) -> f64 {
        self.origin_y + self.line_height * index as f64
    }

    /// Staging file name for line `index`.
    pub fn line_file_name(index: usize) -> String {
        format!("caption-{index:02}.txt")
    }

    /// Staging files to write before rendering: `(path, contents)`.
    /// Blank lines get no file.
    pub fn line_files(&self, staging_dir: &Path) -> Vec<(PathBuf, String)> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, line)| !line.is_empty())
            .map(|(idx, line)| (staging_dir.join(Self::line_file_name(idx)), line.clone()))
            .collect()
    }

    /// One drawtext filter per non-blank line, in order.
    pub fn drawtext_filters(
        &self,
        style: &TextStyle,
        font: &CaptionFont,
        staging_dir: &Path,
    ) -> Vec<String> {
        let font_option = font.filter_option();
        let box_options = style
            .background_color
            .as_ref()
            .map(|color| format!(":box=1:boxcolor={color}:boxborderw={BOX_BORDER_PX}"))
            .unwrap_or_default();

        self.lines
            .iter()
            .enumerate()
            .filter(|(_, line)| !line.is_empty())
            .map(|(idx, _)| {
                let text_file = staging_dir.join(Self::line_file_name(idx));
                format!(
                    "drawtext={font_option}:textfile={file}:expansion=none:fontsize={size}:fontcolor={color}:borderw={OUTLINE_WIDTH_PX}:bordercolor={OUTLINE_COLOR}:x=(w-text_w)/2:y={y}{box_options}",
                    file = escape_filter_value(&text_file.display().to_string()),
                    size = self.font_size.round() as u32,
                    color = style.font_color,
                    y = self.line_y(idx) as i64,
                )
            })
            .collect()
    }
}

/// Estimated advance of `c` in ems.
pub fn glyph_advance_em(c: char) -> f64 {
    match c {
        ' ' | 'i' | 'j' | 'l' | 'f' | 't' | 'r' | 'I' | '.' | ',' | ':' | ';' | '!' | '|'
        | '\'' | '"' | '(' | ')' | '[' | ']' => NARROW_GLYPH_ADVANCE_EM,
        'm' | 'w' | 'M' | 'W' => EXTRA_WIDE_GLYPH_ADVANCE_EM,
        'A'..='Z' | '0'..='9' | '@' | '%' | '&' | '#' => WIDE_GLYPH_ADVANCE_EM,
        c if c.is_ascii() => GLYPH_ADVANCE_EM,
        c if is_fullwidth(c) => FULLWIDTH_GLYPH_ADVANCE_EM,
        c if c.is_uppercase() => WIDE_GLYPH_ADVANCE_EM,
        _ => GLYPH_ADVANCE_EM,
    }
}

/// Estimated width of `text` in ems.
pub fn text_width_em(text: &str) -> f64 {
    text.chars().map(glyph_advance_em).sum()
}

fn is_fullwidth(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x115F
        | 0x2E80..=0x303E
        | 0x3041..=0x33FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xA000..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x1F300..=0x1FAFF
        | 0x20000..=0x3FFFD)
}

/// Greedy word wrap so that no line is wider than `max_em` ems.
///
/// Explicit newlines start a new line. Words wider than a line are split
/// between characters; a single glyph wider than `max_em` still gets a line.
pub fn wrap_text(text: &str, max_em: f64) -> Vec<String> {
    let space = glyph_advance_em(' ');
    let mut lines = Vec::new();

    for paragraph in text.trim().lines() {
        let mut current = String::new();
        let mut current_em = 0.0;

        for word in paragraph.split_whitespace() {
            for chunk in split_word(word, max_em) {
                let chunk_em = text_width_em(&chunk);
                if !current.is_empty() && current_em + space + chunk_em > max_em {
                    lines.push(std::mem::take(&mut current));
                    current_em = 0.0;
                }
                if !current.is_empty() {
                    current.push(' ');
                    current_em += space;
                }
                current.push_str(&chunk);
                current_em += chunk_em;
            }
        }

        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Break `word` into pieces no wider than `max_em`, at least one glyph each.
fn split_word(word: &str, max_em: f64) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut piece_em = 0.0;
    for c in word.chars() {
        let advance = glyph_advance_em(c);
        if !piece.is_empty() && piece_em + advance > max_em {
            pieces.push(std::mem::take(&mut piece));
            piece_em = 0.0;
        }
        piece.push(c);
        piece_em += advance;
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Escape a value for use as a filter option inside `-filter_complex`.
///
/// Two passes: the option-value level (`\`, `'`, `:`) and then the
/// filtergraph level (`\`, `'`, `[`, `]`, `,`, `;`).
pub fn escape_filter_value(value: &str) -> String {
    let escape = |input: &str, special: &[char]| {
        let mut out = String::with_capacity(input.len());
        for c in input.chars() {
            if special.contains(&c) {
                out.push('\\');
            }
            out.push(c);
        }
        out
    };

    let option_level = escape(value, &['\\', '\'', ':']);
    escape(&option_level, &['\\', '\'', '[', ']', ',', ';'])
}
