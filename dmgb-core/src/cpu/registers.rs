use std::fmt::Formatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuRegister {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
}

impl CpuRegister {
    /// Return the 3-bit operand encoding for this register (B=0 .. L=5, A=7; 6 is (HL)).
    pub fn to_opcode_bits(self) -> u8 {
        match self {
            Self::B => 0x00,
            Self::C => 0x01,
            Self::D => 0x02,
            Self::E => 0x03,
            Self::H => 0x04,
            Self::L => 0x05,
            Self::A => 0x07,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuRegisterPair {
    AF,
    BC,
    DE,
    HL,
    SP,
}

// Z, N, H, C
const ZERO_FLAG: u8 = 0x80;
const SUBTRACT_FLAG: u8 = 0x40;
const HALF_CARRY_FLAG: u8 = 0x20;
const CARRY_FLAG: u8 = 0x10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuRegisters {
    pub accumulator: u8,
    pub flags: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
    pub ime: bool,
    pub interrupt_delay: bool,
    pub halted: bool,
}

impl CpuRegisters {
    /// Create a register file with every register zeroed and PC at the start of the boot ROM.
    pub fn new() -> Self {
        Self {
            accumulator: 0,
            flags: 0,
            b: 0,
            c: 0,
            d: 0,
            e: 0,
            h: 0,
            l: 0,
            sp: 0,
            pc: 0,
            ime: false,
            interrupt_delay: false,
            halted: false,
        }
    }

    /// Create a register file holding the values the DMG boot ROM leaves behind when it jumps to
    /// the cartridge entry point.
    pub fn new_post_boot() -> Self {
        Self {
            accumulator: 0x01,
            flags: 0xB0,
            b: 0x00,
            c: 0x13,
            d: 0x00,
            e: 0xD8,
            h: 0x01,
            l: 0x4D,
            sp: 0xFFFE,
            pc: 0x0100,
            ime: false,
            interrupt_delay: false,
            halted: false,
        }
    }

    pub fn af(&self) -> u16 {
        u16::from_be_bytes([self.accumulator, self.flags])
    }

    pub fn bc(&self) -> u16 {
        u16::from_be_bytes([self.b, self.c])
    }

    pub fn de(&self) -> u16 {
        u16::from_be_bytes([self.d, self.e])
    }

    pub fn hl(&self) -> u16 {
        u16::from_be_bytes([self.h, self.l])
    }

    pub fn set_hl(&mut self, hl: u16) {
        let [h, l] = hl.to_be_bytes();
        self.h = h;
        self.l = l;
    }

    pub fn read_register(&self, register: CpuRegister) -> u8 {
        match register {
            CpuRegister::A => self.accumulator,
            CpuRegister::B => self.b,
            CpuRegister::C => self.c,
            CpuRegister::D => self.d,
            CpuRegister::E => self.e,
            CpuRegister::H => self.h,
            CpuRegister::L => self.l,
        }
    }

    pub fn set_register(&mut self, register: CpuRegister, value: u8) {
        let register_ref = match register {
            CpuRegister::A => &mut self.accumulator,
            CpuRegister::B => &mut self.b,
            CpuRegister::C => &mut self.c,
            CpuRegister::D => &mut self.d,
            CpuRegister::E => &mut self.e,
            CpuRegister::H => &mut self.h,
            CpuRegister::L => &mut self.l,
        };
        *register_ref = value;
    }

    pub fn read_register_pair(&self, register_pair: CpuRegisterPair) -> u16 {
        match register_pair {
            CpuRegisterPair::AF => self.af(),
            CpuRegisterPair::BC => self.bc(),
            CpuRegisterPair::DE => self.de(),
            CpuRegisterPair::HL => self.hl(),
            CpuRegisterPair::SP => self.sp,
        }
    }

    pub fn set_register_pair(&mut self, register_pair: CpuRegisterPair, value: u16) {
        let [high, low] = value.to_be_bytes();
        match register_pair {
            CpuRegisterPair::AF => {
                // Low nibble of F is hardwired to 0
                self.accumulator = high;
                self.flags = low & 0xF0;
            }
            CpuRegisterPair::BC => {
                self.b = high;
                self.c = low;
            }
            CpuRegisterPair::DE => {
                self.d = high;
                self.e = low;
            }
            CpuRegisterPair::HL => {
                self.set_hl(value);
            }
            CpuRegisterPair::SP => {
                self.sp = value;
            }
        }
    }

    pub fn set_flags(&mut self, z: bool, n: bool, h: bool, c: bool) {
        self.flags =
            (u8::from(z) << 7) | (u8::from(n) << 6) | (u8::from(h) << 5) | (u8::from(c) << 4);
    }

    /// Update only the flags that are `Some`, leaving the rest untouched.
    pub fn set_some_flags(
        &mut self,
        z: Option<bool>,
        n: Option<bool>,
        h: Option<bool>,
        c: Option<bool>,
    ) {
        for (flag, mask) in [
            (z, ZERO_FLAG),
            (n, SUBTRACT_FLAG),
            (h, HALF_CARRY_FLAG),
            (c, CARRY_FLAG),
        ] {
            match flag {
                Some(true) => self.flags |= mask,
                Some(false) => self.flags &= !mask,
                None => {}
            }
        }
    }

    pub fn zero_flag(&self) -> bool {
        self.flags & ZERO_FLAG != 0
    }

    pub fn subtract_flag(&self) -> bool {
        self.flags & SUBTRACT_FLAG != 0
    }

    pub fn half_carry_flag(&self) -> bool {
        self.flags & HALF_CARRY_FLAG != 0
    }

    pub fn carry_flag(&self) -> bool {
        self.flags & CARRY_FLAG != 0
    }

    pub fn cpu_flags(&self) -> CpuFlags {
        CpuFlags {
            zero: self.zero_flag(),
            subtract: self.subtract_flag(),
            half_carry: self.half_carry_flag(),
            carry: self.carry_flag(),
        }
    }
}

impl Default for CpuRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CpuRegisters {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "AF={:04X} BC={:04X} DE={:04X} HL={:04X}",
            self.af(),
            self.bc(),
            self.de(),
            self.hl()
        )?;
        write!(
            f,
            "SP={:04X} PC={:04X} IME={} HALT={}",
            self.sp,
            self.pc,
            u8::from(self.ime),
            u8::from(self.halted)
        )
    }
}

/// Decoded view of the F register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuFlags {
    pub zero: bool,
    pub subtract: bool,
    pub half_carry: bool,
    pub carry: bool,
}

impl std::fmt::Display for CpuFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Z={} N={} H={} C={}",
            u8::from(self.zero),
            u8::from(self.subtract),
            u8::from(self.half_carry),
            u8::from(self.carry)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_af_clears_low_nibble() {
        let mut registers = CpuRegisters::new();
        registers.set_register_pair(CpuRegisterPair::AF, 0x12FF);

        assert_eq!(0x12, registers.accumulator);
        assert_eq!(0xF0, registers.flags);
    }

    #[test]
    fn set_some_flags_leaves_unset_flags() {
        let mut registers = CpuRegisters::new();
        registers.set_flags(true, false, true, false);

        registers.set_some_flags(None, Some(true), Some(false), Some(true));
        assert_eq!(
            CpuFlags {
                zero: true,
                subtract: true,
                half_carry: false,
                carry: true
            },
            registers.cpu_flags()
        );
        assert_eq!("Z=1 N=1 H=0 C=1", registers.cpu_flags().to_string());
    }

    #[test]
    fn post_boot_values() {
        let registers = CpuRegisters::new_post_boot();

        assert_eq!(0x01B0, registers.af());
        assert_eq!(0x0013, registers.bc());
        assert_eq!(0x00D8, registers.de());
        assert_eq!(0x014D, registers.hl());
        assert_eq!(0xFFFE, registers.sp);
        assert_eq!(0x0100, registers.pc);
    }
}
