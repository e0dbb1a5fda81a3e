use dmgb_core::{
    Button, EmulationError, Emulator, FrameBuffer, Frontend, FrontendAction, JoypadState,
    ParseError, M_CYCLES_PER_FRAME,
};

const LY: u16 = 0xFF44;
const LYC: u16 = 0xFF45;
const STAT: u16 = 0xFF41;
const IF: u16 = 0xFF0F;
const IE: u16 = 0xFFFF;

/// Build a 32KB ROM with `program` at the entry point and `handlers` at their given addresses.
fn build_rom(program: &[u8], handlers: &[(u16, &[u8])]) -> Vec<u8> {
    let mut rom = vec![0x00; 0x8000];
    rom[0x0100..0x0100 + program.len()].copy_from_slice(program);
    for &(address, code) in handlers {
        let address = usize::from(address);
        rom[address..address + code.len()].copy_from_slice(code);
    }
    rom
}

// JR -2
const SPIN: &[u8] = &[0x18, 0xFE];

fn expected_mode(ly: u8, dot: u32) -> u8 {
    match (ly, dot) {
        (144..=u8::MAX, _) => 1,
        (_, 0..=79) => 2,
        (_, 80..=251) => 3,
        _ => 0,
    }
}

#[test]
fn full_frame_scanline_timing() {
    let mut emulator = Emulator::from_rom_bytes(&build_rom(SPIN, &[]));

    let mut m_cycles_per_line = [0_u32; 154];
    let mut line_order = vec![emulator.peek(LY)];

    for _ in 0..M_CYCLES_PER_FRAME {
        emulator.run_m_cycle().unwrap();

        let ly = emulator.peek(LY);
        assert!(ly < 154, "LY out of range: {ly}");
        m_cycles_per_line[usize::from(ly)] += 1;
        if line_order.last() != Some(&ly) {
            line_order.push(ly);
        }

        let dot = emulator.ppu_state().dot();
        let stat = emulator.peek(STAT);
        assert_eq!(expected_mode(ly, dot), stat & 0x03, "LY={ly} dot={dot}");
        assert_eq!(0x80, stat & 0x80);
    }

    // Every line lasts 456 dots
    assert!(m_cycles_per_line.iter().all(|&count| count == 114), "{m_cycles_per_line:?}");

    let mut expected_order: Vec<u8> = (0..154).collect();
    expected_order.push(0);
    assert_eq!(expected_order, line_order);

    assert_eq!(1, emulator.ppu_state().frames_completed());
}

#[test]
fn vblank_interrupt_requested_once_per_frame() {
    let mut emulator = Emulator::from_rom_bytes(&build_rom(SPIN, &[]));
    emulator.address_space_mut().write_address_u8(IF, 0x00);

    let mut requests = Vec::new();
    for _ in 0..2 * M_CYCLES_PER_FRAME {
        emulator.run_m_cycle().unwrap();

        if emulator.peek(IF) & 0x01 != 0 {
            requests.push(emulator.peek(LY));
            emulator.address_space_mut().write_address_u8(IF, 0x00);
        }
    }

    assert_eq!(vec![144, 144], requests);
}

#[test]
fn lyc_interrupt_fires_once_per_match() {
    let mut emulator = Emulator::from_rom_bytes(&build_rom(SPIN, &[]));
    {
        let address_space = emulator.address_space_mut();
        address_space.write_address_u8(LYC, 80);
        address_space.write_address_u8(STAT, 0x40);
        address_space.write_address_u8(IF, 0x00);
    }

    let mut matches = Vec::new();
    for _ in 0..2 * M_CYCLES_PER_FRAME {
        emulator.run_m_cycle().unwrap();

        let ly = emulator.peek(LY);
        let coincidence = emulator.peek(STAT) & 0x04 != 0;
        assert_eq!(ly == 80, coincidence, "LY={ly}");

        if emulator.peek(IF) & 0x02 != 0 {
            matches.push(ly);
            emulator.address_space_mut().write_address_u8(IF, 0x00);
        }
    }

    assert_eq!(vec![80, 80], matches);
}

#[test]
fn lcd_off_holds_ly_at_zero() {
    let mut emulator = Emulator::from_rom_bytes(&build_rom(SPIN, &[]));
    emulator.run_cycles(20 * 114).unwrap();
    assert_eq!(20, emulator.peek(LY));

    emulator.address_space_mut().write_address_u8(0xFF40, 0x11);
    emulator.address_space_mut().write_address_u8(IF, 0x00);
    emulator.run_cycles(u64::from(M_CYCLES_PER_FRAME)).unwrap();

    assert_eq!(0, emulator.peek(LY));
    assert_eq!(0, emulator.peek(STAT) & 0x03);
    assert_eq!(0xE0, emulator.peek(IF));

    emulator.address_space_mut().write_address_u8(0xFF40, 0x91);
    emulator.run_cycles(114).unwrap();
    assert_eq!(1, emulator.peek(LY));
}

#[test]
fn divider_and_timer() {
    let mut emulator = Emulator::from_rom_bytes(&build_rom(SPIN, &[]));

    emulator.address_space_mut().write_address_u8(0xFF04, 0x12);
    assert_eq!(0, emulator.peek(0xFF04));
    assert_eq!(0, emulator.address_space().timer().divider_counter());

    emulator.run_cycles(63).unwrap();
    assert_eq!(0, emulator.peek(0xFF04));
    emulator.run_cycles(1).unwrap();
    assert_eq!(1, emulator.peek(0xFF04));
    emulator.run_cycles(128).unwrap();
    assert_eq!(3, emulator.peek(0xFF04));
    assert_eq!(
        emulator.address_space().timer().divider_counter() >> 8,
        u16::from(emulator.peek(0xFF04))
    );

    // TIMA every 16 T-cycles
    {
        let address_space = emulator.address_space_mut();
        address_space.write_address_u8(0xFF04, 0x00);
        address_space.write_address_u8(0xFF05, 0xFE);
        address_space.write_address_u8(0xFF06, 0xF0);
        address_space.write_address_u8(0xFF07, 0x05);
        address_space.write_address_u8(IF, 0x00);
    }

    emulator.run_cycles(4).unwrap();
    assert_eq!(0xFF, emulator.peek(0xFF05));
    emulator.run_cycles(3).unwrap();
    assert_eq!(0xE0, emulator.peek(IF));

    emulator.run_cycles(1).unwrap();
    assert_eq!(0xF0, emulator.peek(0xFF05));
    assert_eq!(0xE4, emulator.peek(IF));
}

#[test]
fn disabled_timer_does_not_count() {
    let mut emulator = Emulator::from_rom_bytes(&build_rom(SPIN, &[]));
    {
        let address_space = emulator.address_space_mut();
        address_space.write_address_u8(0xFF05, 0xFF);
        address_space.write_address_u8(0xFF07, 0x01);
        address_space.write_address_u8(IF, 0x00);
    }

    emulator.run_cycles(1000).unwrap();

    assert_eq!(0xFF, emulator.peek(0xFF05));
    assert_eq!(0xE0, emulator.peek(IF));
}

#[test]
fn timer_interrupt_wakes_halt() {
    let program = [
        0x3E, 0x04, // LD A, 0x04
        0xE0, 0xFF, // LDH (IE), A
        0x3E, 0x05, // LD A, 0x05
        0xE0, 0x07, // LDH (TAC), A
        0xAF, // XOR A
        0xE0, 0x0F, // LDH (IF), A
        0xFB, // EI
        0x76, // HALT
        0x18, 0xFD, // JR -3
    ];
    // INC B; RETI
    let handler: &[u8] = &[0x04, 0xD9];
    let mut emulator = Emulator::from_rom_bytes(&build_rom(&program, &[(0x0050, handler)]));

    assert!(emulator.run_until_pc(0x0050, 2000).unwrap());
    assert_eq!(0x04, emulator.peek(IE));
    assert!(!emulator.registers().ime);
    assert_eq!(0xE0, emulator.peek(IF));
    assert_eq!(0x010D, emulator.address_space().read_address_u16(emulator.registers().sp));

    emulator.run_cycles(2 * 1024 + 100).unwrap();
    assert_eq!(3, emulator.registers().b);
    assert!(emulator.registers().halted);
}

#[test]
fn background_tile_rendered_after_frame() {
    let mut emulator = Emulator::from_rom_bytes(&build_rom(SPIN, &[]));
    {
        let address_space = emulator.address_space_mut();
        // Tile 1: solid color 3
        for address in 0x8010..0x8020 {
            address_space.write_address_u8(address, 0xFF);
        }
        address_space.write_address_u8(0x9800, 0x01);
        address_space.write_address_u8(0xFF40, 0x91);
    }

    emulator.run_frame().unwrap();
    assert_eq!(144, emulator.peek(LY));

    let frame_buffer = emulator.frame_buffer();
    for (y, row) in frame_buffer.iter().enumerate() {
        for (x, &shade) in row.iter().enumerate() {
            let expected = if x < 8 && y < 8 { 3 } else { 0 };
            assert_eq!(expected, shade, "pixel ({x}, {y})");
        }
    }
}

#[test]
fn invalid_opcode_stops_emulation() {
    let mut emulator = Emulator::from_rom_bytes(&build_rom(&[0x00, 0x00, 0xDD], &[]));

    let result = emulator.run_cycles(10);
    assert!(matches!(
        result,
        Err(EmulationError::InstructionParse {
            source: ParseError::InvalidOpcode {
                opcode: 0xDD,
                pc: 0x0102
            }
        })
    ));
    assert!(!emulator.is_running());
    assert_eq!(0x0102, emulator.registers().pc);
    assert_eq!(0xDD, emulator.peek(0x0102));
}

#[test]
fn flags_view() {
    // LD A, 0xFF; INC A
    let mut emulator = Emulator::from_rom_bytes(&build_rom(&[0x3E, 0xFF, 0x3C, 0x18, 0xFE], &[]));

    assert!(emulator.run_until_pc(0x0103, 10).unwrap());

    let flags = emulator.flags();
    assert!(flags.zero);
    assert!(!flags.subtract);
    assert!(flags.half_carry);
    assert_eq!(0x00, emulator.registers().accumulator);
}

struct CountingFrontend {
    frames_rendered: u32,
    quit_after: u32,
    last_frame: Option<Box<FrameBuffer>>,
}

impl Frontend for CountingFrontend {
    type Error = String;

    fn poll_events(&mut self, joypad_state: &mut JoypadState) -> FrontendAction {
        if self.frames_rendered == self.quit_after {
            return FrontendAction::Quit;
        }
        joypad_state.set(Button::Start, self.frames_rendered >= 2);
        FrontendAction::Continue
    }

    fn render_frame(&mut self, frame_buffer: &FrameBuffer) -> Result<(), Self::Error> {
        self.frames_rendered += 1;
        self.last_frame = Some(Box::new(*frame_buffer));
        Ok(())
    }
}

#[test]
fn free_run_until_frontend_quits() {
    let mut emulator = Emulator::from_rom_bytes(&build_rom(SPIN, &[]));
    let mut frontend = CountingFrontend {
        frames_rendered: 0,
        quit_after: 3,
        last_frame: None,
    };

    emulator.free_run(&mut frontend).unwrap();

    assert_eq!(3, frontend.frames_rendered);
    assert!(frontend.last_frame.is_some());
    assert_eq!(3, emulator.ppu_state().frames_completed());
    assert!(emulator.is_running());
    assert!(emulator.address_space().joypad_state().pressed(Button::Start));
}

struct FailingFrontend;

impl Frontend for FailingFrontend {
    type Error = String;

    fn poll_events(&mut self, _joypad_state: &mut JoypadState) -> FrontendAction {
        FrontendAction::Continue
    }

    fn render_frame(&mut self, _frame_buffer: &FrameBuffer) -> Result<(), Self::Error> {
        Err("display lost".into())
    }
}

#[test]
fn frontend_error_stops_emulation() {
    let mut emulator = Emulator::from_rom_bytes(&build_rom(SPIN, &[]));

    let result = emulator.free_run(&mut FailingFrontend);

    assert!(matches!(result, Err(EmulationError::Frontend { msg }) if msg == "display lost"));
    assert!(!emulator.is_running());
    assert!(matches!(emulator.run_m_cycle(), Err(EmulationError::Stopped)));
}
