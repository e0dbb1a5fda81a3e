use crate::input::JoypadState;
use crate::ppu::FrameBuffer;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontendAction {
    Continue,
    Quit,
}

/// The host side of the emulator: supplies joypad input and displays completed frames.
pub trait Frontend {
    type Error: Display;

    /// Process pending host events, updating the joypad state in place.
    fn poll_events(&mut self, joypad_state: &mut JoypadState) -> FrontendAction;

    /// Display a completed frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be presented.
    fn render_frame(&mut self, frame_buffer: &FrameBuffer) -> Result<(), Self::Error>;
}

/// Map a 2-bit shade (0 = lightest, 3 = darkest) to an 8-bit gray level.
pub fn shade_to_gray(shade: u8) -> u8 {
    // Shades range from 0-3 with 0 being white and 3 being black, so map [0,3] to [255,0]
    255 - (f64::from(shade.min(3)) / 3.0 * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_levels() {
        assert_eq!(255, shade_to_gray(0));
        assert_eq!(170, shade_to_gray(1));
        assert_eq!(85, shade_to_gray(2));
        assert_eq!(0, shade_to_gray(3));
    }
}
