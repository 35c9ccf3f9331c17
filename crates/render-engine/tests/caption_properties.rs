use proptest::prelude::*;

use qtov_job_model::style::{TextPosition, TextStyle};
use qtov_render_engine::caption::{text_width_em, wrap_text, CaptionLayout, EDGE_MARGIN_PX};

proptest! {
    #[test]
    fn wrapped_lines_never_exceed_limit(text in "[a-zA-Z0-9 ]{1,200}", max in 1.0f64..30.0) {
        for line in wrap_text(&text, max) {
            prop_assert!(text_width_em(&line) <= max + 1e-9);
        }
    }

    #[test]
    fn wrapping_keeps_every_letter(text in "[a-z]{1,12}( [a-z]{1,12}){0,20}", max in 1.0f64..20.0) {
        let original: String = text.split_whitespace().collect();
        let wrapped: String = wrap_text(&text, max).concat().split_whitespace().collect();
        prop_assert_eq!(original, wrapped);
    }

    #[test]
    fn top_caption_starts_at_margin(
        width in 320u32..4000,
        height in 320u32..4000,
        size in 10.0f64..200.0,
    ) {
        let style = TextStyle { font_size: size, position: TextPosition::Top, ..TextStyle::default() };
        let layout = CaptionLayout::new("Keep going.", &style, width, height);
        prop_assert_eq!(layout.origin_y, EDGE_MARGIN_PX);
        prop_assert!(layout.box_width <= width as f64 * 0.8);
    }

    #[test]
    fn caption_lines_fit_box(
        quote in "[A-Za-z\u{4E00}-\u{4E80}]{1,10}( [A-Za-z\u{4E00}-\u{4E80}]{1,10}){0,15}",
        width in 320u32..2000,
    ) {
        let layout = CaptionLayout::new(&quote, &TextStyle::default(), width, 1080);
        for line in &layout.lines {
            prop_assert!(text_width_em(line) * layout.font_size <= layout.box_width + 1e-6);
        }
    }
}
