//! `nop`, `bkpt`, the OS-dispatched `breakpoint`, and the register-indirect
//! branch/call forms (`bx`/`blx`).

use crate::registers::Register;
use crate::target::TargetOs;
use crate::writer::Writer;

/// `NOP` (`MOV R8, R8` encoded as the dedicated hint instruction).
pub(crate) const NOP: u16 = 0x46C0;

/// The Linux/Android undefined-instruction trap `udf #1`, used by
/// `put_breakpoint` on those OSes in place of `BKPT`.
const LINUX_ANDROID_TRAP: u16 = 0xDE01;

impl<'a> Writer<'a> {
    /// `NOP`.
    pub fn put_nop(&mut self) {
        self.put_instruction(NOP);
    }

    /// `BKPT #imm8`.
    pub fn put_bkpt_imm(&mut self, imm: u8) {
        self.put_instruction(0xBE00 | imm as u16);
    }

    /// OS-dispatched breakpoint: the Linux/Android undefined-instruction
    /// trap on those OSes, otherwise `BKPT #0` followed by `BX LR` so
    /// stepping past the trap on a debugger that doesn't know the OS
    /// convention still returns to the caller.
    pub fn put_breakpoint(&mut self) {
        match self.target_os() {
            TargetOs::Linux | TargetOs::Android => self.put_instruction(LINUX_ANDROID_TRAP),
            TargetOs::Other => {
                self.put_bkpt_imm(0);
                self.put_bx_reg(Register::Lr);
            }
        }
    }

    /// `BX Rn`.
    pub fn put_bx_reg(&mut self, reg: Register) {
        self.put_instruction(0x4700 | (reg.index() as u16) << 3);
    }

    /// `BLX Rn`.
    pub fn put_blx_reg(&mut self, reg: Register) {
        self.put_instruction(0x4780 | (reg.index() as u16) << 3);
    }
}
