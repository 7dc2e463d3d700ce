use panaroia::{FrameBuffer, DISPLAY_WIDTH};

const LIT: char = '█';
const DARK: char = ' ';

/// Renders a single Chip-8 FrameBuffer as text, one line per display row.
pub fn render(frame: &FrameBuffer) -> String {
    frame
        .chunks(DISPLAY_WIDTH)
        .map(|row| {
            row.iter()
                .map(|&pixel| if pixel == 1 { LIT } else { DARK })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
