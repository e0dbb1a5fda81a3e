use dmgb_proc_macros::{EnumDisplay, EnumFromStr, StrDeserialize, StrSerialize};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumDisplay,
    EnumFromStr,
    StrSerialize,
    StrDeserialize,
)]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
    Start,
    Select,
}

impl Button {
    pub const ALL: [Self; 8] = [
        Self::Up,
        Self::Down,
        Self::Left,
        Self::Right,
        Self::A,
        Self::B,
        Self::Start,
        Self::Select,
    ];
}

/// Which buttons are currently held down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoypadState {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
    a: bool,
    b: bool,
    start: bool,
    select: bool,
}

impl JoypadState {
    pub fn new() -> Self {
        Self::default()
    }

    fn field_mut(&mut self, button: Button) -> &mut bool {
        match button {
            Button::Up => &mut self.up,
            Button::Down => &mut self.down,
            Button::Left => &mut self.left,
            Button::Right => &mut self.right,
            Button::A => &mut self.a,
            Button::B => &mut self.b,
            Button::Start => &mut self.start,
            Button::Select => &mut self.select,
        }
    }

    pub fn set(&mut self, button: Button, pressed: bool) {
        *self.field_mut(button) = pressed;
    }

    pub fn pressed(&self, button: Button) -> bool {
        match button {
            Button::Up => self.up,
            Button::Down => self.down,
            Button::Left => self.left,
            Button::Right => self.right,
            Button::A => self.a,
            Button::B => self.b,
            Button::Start => self.start,
            Button::Select => self.select,
        }
    }

    /// Compute JOYP bits 0-3 for the given select bits (4-5). Both the select bits and the
    /// returned input lines are active-low.
    pub fn input_lines(&self, select_bits: u8) -> u8 {
        let mut lines = 0x0F;

        if select_bits & 0x10 == 0 {
            for (pressed, bit) in [
                (self.right, 0x01),
                (self.left, 0x02),
                (self.up, 0x04),
                (self.down, 0x08),
            ] {
                if pressed {
                    lines &= !bit;
                }
            }
        }

        if select_bits & 0x20 == 0 {
            for (pressed, bit) in [
                (self.a, 0x01),
                (self.b, 0x02),
                (self.select, 0x04),
                (self.start, 0x08),
            ] {
                if pressed {
                    lines &= !bit;
                }
            }
        }

        lines
    }
}
