use std::time::Instant;

const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const FRAME_MS: u128 = 80;

/// Braille spinner frame for the time elapsed since `start`.
pub fn spinner_frame(start: Option<Instant>) -> &'static str {
    let elapsed = start.map_or(0, |s| s.elapsed().as_millis());
    let index = (elapsed / FRAME_MS) as usize % FRAMES.len();
    FRAMES[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_starts_at_first_frame() {
        assert_eq!(spinner_frame(None), "⠋");
        assert!(FRAMES.contains(&spinner_frame(Some(Instant::now()))));
    }
}
