use crate::cpu::InterruptType;
use crate::memory::ioregisters::{IoRegister, IoRegisters, Lcdc};
use crate::memory::{address, AddressSpace};
use dmgb_proc_macros::EnumDisplay;
use tinyvec::ArrayVec;

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

/// One 2-bit shade (0 = lightest, 3 = darkest) per pixel, indexed `[row][column]`.
pub type FrameBuffer = [[u8; SCREEN_WIDTH]; SCREEN_HEIGHT];

pub const DOTS_PER_LINE: u32 = 456;
pub const LINES_PER_FRAME: u8 = 154;
pub const DOTS_PER_FRAME: u32 = DOTS_PER_LINE * LINES_PER_FRAME as u32;

const OAM_SEARCH_DOTS: u32 = 80;
const DRAWING_DOTS: u32 = 172;
const HBLANK_START_DOT: u32 = OAM_SEARCH_DOTS + DRAWING_DOTS;

const VBLANK_START_LINE: u8 = SCREEN_HEIGHT as u8;

const OAM_ENTRIES: u8 = 40;
const MAX_SPRITES_PER_LINE: usize = 10;

// STAT interrupt enable bits
const STAT_HBLANK_SOURCE: u8 = 0x08;
const STAT_VBLANK_SOURCE: u8 = 0x10;
const STAT_OAM_SOURCE: u8 = 0x20;
const STAT_LYC_SOURCE: u8 = 0x40;

const STAT_LYC_MATCH: u8 = 0x04;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumDisplay)]
pub enum Mode {
    HBlank,
    VBlank,
    OamSearch,
    Drawing,
}

impl Mode {
    /// The value of STAT bits 0-1 while in this mode.
    pub fn stat_bits(self) -> u8 {
        match self {
            Self::HBlank => 0,
            Self::VBlank => 1,
            Self::OamSearch => 2,
            Self::Drawing => 3,
        }
    }

    fn stat_interrupt_source(self) -> Option<u8> {
        match self {
            Self::HBlank => Some(STAT_HBLANK_SOURCE),
            Self::VBlank => Some(STAT_VBLANK_SOURCE),
            Self::OamSearch => Some(STAT_OAM_SOURCE),
            Self::Drawing => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Sprite {
    oam_index: u8,
    y: u8,
    x: u8,
    tile_index: u8,
    attributes: u8,
}

impl Sprite {
    fn from_oam(address_space: &AddressSpace, oam_index: u8) -> Self {
        let base = address::OAM_START + 4 * u16::from(oam_index);
        Self {
            oam_index,
            y: address_space.read_address_u8(base),
            x: address_space.read_address_u8(base + 1),
            tile_index: address_space.read_address_u8(base + 2),
            attributes: address_space.read_address_u8(base + 3),
        }
    }

    fn bg_over_obj(self) -> bool {
        self.attributes & 0x80 != 0
    }

    fn y_flip(self) -> bool {
        self.attributes & 0x40 != 0
    }

    fn x_flip(self) -> bool {
        self.attributes & 0x20 != 0
    }

    fn palette_register(self) -> IoRegister {
        if self.attributes & 0x10 != 0 {
            IoRegister::OBP1
        } else {
            IoRegister::OBP0
        }
    }

    // Screen line of the sprite's top row; OAM Y is offset by 16
    fn top(self) -> i16 {
        i16::from(self.y) - 16
    }
}

/// Pixel processing unit state: the scanline mode state machine plus the frame being drawn.
#[derive(Debug, Clone)]
pub struct PpuState {
    mode: Mode,
    scanline: u8,
    dot: u32,
    lcd_enabled: bool,
    frames_completed: u64,
    frame_buffer: FrameBuffer,
    // Raw background/window color indices for the current line, before palette mapping
    bg_indices: [u8; SCREEN_WIDTH],
}

impl PpuState {
    pub fn new() -> Self {
        Self {
            mode: Mode::HBlank,
            scanline: 0,
            dot: 0,
            lcd_enabled: false,
            frames_completed: 0,
            frame_buffer: [[0; SCREEN_WIDTH]; SCREEN_HEIGHT],
            bg_indices: [0; SCREEN_WIDTH],
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn scanline(&self) -> u8 {
        self.scanline
    }

    /// Number of dots elapsed in the current scanline, 0-455.
    pub fn dot(&self) -> u32 {
        self.dot
    }

    /// Number of times the PPU has entered VBlank.
    pub fn frames_completed(&self) -> u64 {
        self.frames_completed
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.frame_buffer
    }

    /// Advance the PPU by one dot (T-cycle).
    pub fn tick_dot(&mut self, address_space: &mut AddressSpace) {
        let lcdc = address_space.io_registers().lcdc();

        if !lcdc.lcd_enabled() {
            if self.lcd_enabled {
                log::debug!("LCD disabled on line {}", self.scanline);
                self.disable_lcd(address_space.io_registers_mut());
            }
            return;
        }

        if !self.lcd_enabled {
            log::debug!("LCD enabled");
            self.enable_lcd(address_space.io_registers_mut());
        }

        self.dot += 1;

        if self.dot == DOTS_PER_LINE {
            self.dot = 0;
            self.next_line(address_space.io_registers_mut());
            return;
        }

        if self.scanline >= VBLANK_START_LINE {
            return;
        }

        match self.dot {
            OAM_SEARCH_DOTS => {
                self.set_mode(Mode::Drawing, address_space.io_registers_mut());
            }
            HBLANK_START_DOT => {
                self.render_scanline(address_space, lcdc);
                self.set_mode(Mode::HBlank, address_space.io_registers_mut());
            }
            _ => {}
        }
    }

    fn disable_lcd(&mut self, io_registers: &mut IoRegisters) {
        self.lcd_enabled = false;
        self.scanline = 0;
        self.dot = 0;
        self.mode = Mode::HBlank;

        io_registers.privileged_set_ly(0);
        let stat = io_registers.privileged_read_stat();
        io_registers.privileged_set_stat(stat & !(STAT_LYC_MATCH | 0x03));
    }

    fn enable_lcd(&mut self, io_registers: &mut IoRegisters) {
        self.lcd_enabled = true;
        self.scanline = 0;
        self.dot = 0;
        self.mode = Mode::OamSearch;

        io_registers.privileged_set_ly(0);
        let stat = io_registers.privileged_read_stat();
        io_registers.privileged_set_stat((stat & !0x03) | Mode::OamSearch.stat_bits());
        self.update_lyc_match(io_registers, false);
    }

    fn next_line(&mut self, io_registers: &mut IoRegisters) {
        self.scanline = (self.scanline + 1) % LINES_PER_FRAME;
        io_registers.privileged_set_ly(self.scanline);

        self.update_lyc_match(io_registers, true);

        if self.scanline == VBLANK_START_LINE {
            self.frames_completed += 1;
            log::debug!("Frame {} completed", self.frames_completed);

            io_registers.interrupt_flags().set(InterruptType::VBlank);
            self.set_mode(Mode::VBlank, io_registers);
        } else if self.scanline < VBLANK_START_LINE {
            self.set_mode(Mode::OamSearch, io_registers);
        }
    }

    fn set_mode(&mut self, mode: Mode, io_registers: &mut IoRegisters) {
        log::trace!("PPU mode {} -> {mode} on line {}", self.mode, self.scanline);
        self.mode = mode;

        let stat = io_registers.privileged_read_stat();
        io_registers.privileged_set_stat((stat & !0x03) | mode.stat_bits());

        if let Some(source) = mode.stat_interrupt_source() {
            if stat & source != 0 {
                io_registers.interrupt_flags().set(InterruptType::LcdStatus);
            }
        }
    }

    fn update_lyc_match(&self, io_registers: &mut IoRegisters, interrupts_enabled: bool) {
        let lyc = io_registers.read_register(IoRegister::LYC);
        let stat = io_registers.privileged_read_stat();

        if self.scanline == lyc {
            io_registers.privileged_set_stat(stat | STAT_LYC_MATCH);
            if interrupts_enabled && stat & STAT_LYC_SOURCE != 0 {
                log::trace!("LY=LYC={lyc}, requesting STAT interrupt");
                io_registers.interrupt_flags().set(InterruptType::LcdStatus);
            }
        } else {
            io_registers.privileged_set_stat(stat & !STAT_LYC_MATCH);
        }
    }

    fn render_scanline(&mut self, address_space: &AddressSpace, lcdc: Lcdc) {
        let io_registers = address_space.io_registers();
        let mut line = [0; SCREEN_WIDTH];
        self.bg_indices = [0; SCREEN_WIDTH];

        if lcdc.bg_enabled() {
            let bgp = io_registers.read_register(IoRegister::BGP);
            let scx = io_registers.read_register(IoRegister::SCX);
            let scy = io_registers.read_register(IoRegister::SCY);

            let bg_y = self.scanline.wrapping_add(scy);
            for (x, pixel) in line.iter_mut().enumerate() {
                let bg_x = scx.wrapping_add(x as u8);
                let color_index =
                    tile_map_color_index(address_space, lcdc, lcdc.bg_tile_map_area(), bg_x, bg_y);
                self.bg_indices[x] = color_index;
                *pixel = palette_shade(bgp, color_index);
            }
        }

        if lcdc.window_enabled() {
            self.render_window_line(address_space, lcdc, &mut line);
        }

        if lcdc.sprites_enabled() {
            self.render_sprite_line(address_space, lcdc, &mut line);
        }

        self.frame_buffer[usize::from(self.scanline)] = line;
    }

    fn render_window_line(
        &mut self,
        address_space: &AddressSpace,
        lcdc: Lcdc,
        line: &mut [u8; SCREEN_WIDTH],
    ) {
        let io_registers = address_space.io_registers();
        let wy = io_registers.read_register(IoRegister::WY);
        let wx = io_registers.read_register(IoRegister::WX);

        if self.scanline < wy || !(7..=166).contains(&wx) {
            return;
        }

        let bgp = io_registers.read_register(IoRegister::BGP);
        let window_y = self.scanline - wy;
        let start_x = usize::from(wx - 7);

        for x in start_x..SCREEN_WIDTH {
            let window_x = (x - start_x) as u8;
            let color_index = tile_map_color_index(
                address_space,
                lcdc,
                lcdc.window_tile_map_area(),
                window_x,
                window_y,
            );
            self.bg_indices[x] = color_index;
            line[x] = palette_shade(bgp, color_index);
        }
    }

    fn render_sprite_line(
        &self,
        address_space: &AddressSpace,
        lcdc: Lcdc,
        line: &mut [u8; SCREEN_WIDTH],
    ) {
        let sprite_height = lcdc.sprite_height();
        let scanline = i16::from(self.scanline);

        let mut sprites: ArrayVec<[Sprite; MAX_SPRITES_PER_LINE]> = ArrayVec::new();
        for oam_index in 0..OAM_ENTRIES {
            let sprite = Sprite::from_oam(address_space, oam_index);
            let top = sprite.top();
            if (top..top + i16::from(sprite_height)).contains(&scanline) {
                sprites.push(sprite);
                if sprites.len() == MAX_SPRITES_PER_LINE {
                    break;
                }
            }
        }

        // Lower X wins, then lower OAM index; draw the winners last
        sprites.sort_by_key(|sprite| (sprite.x, sprite.oam_index));

        let io_registers = address_space.io_registers();
        for sprite in sprites.iter().rev() {
            let mut row = (scanline - sprite.top()) as u8;
            if sprite.y_flip() {
                row = sprite_height - 1 - row;
            }

            let tile_index = if sprite_height == 16 {
                sprite.tile_index & 0xFE
            } else {
                sprite.tile_index
            };
            let row_address =
                address::TILE_DATA_UNSIGNED_BASE + 16 * u16::from(tile_index) + 2 * u16::from(row);
            let palette = io_registers.read_register(sprite.palette_register());

            for col in 0..8_u8 {
                let screen_x = i16::from(sprite.x) - 8 + i16::from(col);
                if !(0..SCREEN_WIDTH as i16).contains(&screen_x) {
                    continue;
                }
                let screen_x = screen_x as usize;

                let bit = if sprite.x_flip() { col } else { 7 - col };
                let color_index = tile_row_color_index(address_space, row_address, bit);
                if color_index == 0 {
                    continue;
                }

                if sprite.bg_over_obj() && self.bg_indices[screen_x] != 0 {
                    continue;
                }

                line[screen_x] = palette_shade(palette, color_index);
            }
        }
    }
}

impl Default for PpuState {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a 2-bit color index through a BGP/OBP palette register.
pub fn palette_shade(palette: u8, color_index: u8) -> u8 {
    (palette >> (2 * color_index)) & 0x03
}

// Combine the two bitplanes of a tile row, most significant bit = leftmost pixel
fn tile_row_color_index(address_space: &AddressSpace, row_address: u16, bit: u8) -> u8 {
    let lsb = address_space.read_address_u8(row_address);
    let msb = address_space.read_address_u8(row_address + 1);
    (((msb >> bit) & 0x01) << 1) | ((lsb >> bit) & 0x01)
}

fn tile_map_color_index(
    address_space: &AddressSpace,
    lcdc: Lcdc,
    tile_map: u16,
    x: u8,
    y: u8,
) -> u8 {
    let map_address = tile_map + 32 * u16::from(y / 8) + u16::from(x / 8);
    let tile_index = address_space.read_address_u8(map_address);
    let tile_address = lcdc.tile_data_addressing().tile_address(tile_index);
    let row_address = tile_address + 2 * u16::from(y % 8);
    tile_row_color_index(address_space, row_address, 7 - x % 8)
}
