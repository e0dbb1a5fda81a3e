use dmgb_core::{FrameBuffer, Frontend, FrontendAction, JoypadState};
use std::convert::Infallible;

/// Frontend with no display or input that asks to quit after a fixed number of frames.
///
/// The frame budget is restored once the quit request is made, so a later free run on the same
/// frontend runs the full number of frames again.
pub struct HeadlessFrontend {
    frames_per_run: u64,
    frames_remaining: u64,
    frames_rendered: u64,
    last_frame_checksum: u64,
}

impl HeadlessFrontend {
    pub fn new(frames: u64) -> Self {
        Self {
            frames_per_run: frames,
            frames_remaining: frames,
            frames_rendered: 0,
            last_frame_checksum: 0,
        }
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Sum of all shades in the most recent frame.
    pub fn last_frame_checksum(&self) -> u64 {
        self.last_frame_checksum
    }
}

impl Frontend for HeadlessFrontend {
    type Error = Infallible;

    fn poll_events(&mut self, _joypad_state: &mut JoypadState) -> FrontendAction {
        if self.frames_remaining == 0 {
            self.frames_remaining = self.frames_per_run;
            FrontendAction::Quit
        } else {
            FrontendAction::Continue
        }
    }

    fn render_frame(&mut self, frame_buffer: &FrameBuffer) -> Result<(), Self::Error> {
        self.frames_remaining = self.frames_remaining.saturating_sub(1);
        self.frames_rendered += 1;
        self.last_frame_checksum = frame_buffer
            .iter()
            .flatten()
            .map(|&shade| u64::from(shade))
            .sum();

        log::debug!("Headless frame {} rendered", self.frames_rendered);

        Ok(())
    }
}
