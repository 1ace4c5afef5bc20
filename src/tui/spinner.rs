use crate::app::SPINNER_FRAME_COUNT;

const DOT_FRAMES: [char; SPINNER_FRAME_COUNT] = ['⣾', '⣽', '⣻', '⢿', '⡿', '⣟', '⣯', '⣷'];

pub fn frame(idx: usize) -> char {
    DOT_FRAMES[idx % DOT_FRAMES.len()]
}
