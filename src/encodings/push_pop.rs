//! `push`/`pop` register-list selectors, narrow (9-bit mask) vs. wide
//! (16-bit mask).
//!
//! Takes a plain slice rather than the C original's variadic-plus-explicit-
//! array pair (see DESIGN.md, Open Question 5) — a slice already covers
//! both calling shapes.

use crate::error::EncodeError;
use crate::registers::Register;
use crate::writer::Writer;

impl<'a> Writer<'a> {
    /// `PUSH {regs...}`. `Lr` may additionally appear in `regs`; it occupies
    /// the narrow form's dedicated bit 8 when every other register is low.
    pub fn put_push_regs(&mut self, regs: &[Register]) -> Result<(), EncodeError> {
        self.put_reg_list(regs, Register::Lr, 0xB400, 0xE92D)
    }

    /// `POP {regs...}`. `Pc` may additionally appear in `regs`, occupying
    /// the narrow form's bit 8.
    pub fn put_pop_regs(&mut self, regs: &[Register]) -> Result<(), EncodeError> {
        self.put_reg_list(regs, Register::Pc, 0xBC00, 0xE8BD)
    }

    fn put_reg_list(
        &mut self,
        regs: &[Register],
        special: Register,
        narrow_op: u16,
        wide_op: u16,
    ) -> Result<(), EncodeError> {
        if regs.is_empty() {
            return Err(EncodeError::EmptyRegisterList);
        }
        let narrow_eligible = regs.iter().all(|r| r.is_low() || *r == special);
        if narrow_eligible {
            let mut mask: u16 = 0;
            for r in regs {
                if *r == special {
                    mask |= 1 << 8;
                } else {
                    mask |= 1 << r.index();
                }
            }
            self.put_instruction(narrow_op | mask);
        } else {
            let mut mask: u16 = 0;
            for r in regs {
                mask |= 1 << r.index();
            }
            self.put_instruction(wide_op);
            self.put_instruction(mask);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_narrow_form() {
        let mut buf = [0u8; 4];
        let mut w = Writer::new(&mut buf, 0);
        w.put_push_regs(&[Register::R4, Register::R5, Register::Lr])
            .unwrap();
        assert_eq!(buf[..2], 0xB530u16.to_le_bytes());
    }

    #[test]
    fn push_wide_form_when_high_register_present() {
        let mut buf = [0u8; 4];
        let mut w = Writer::new(&mut buf, 0);
        w.put_push_regs(&[Register::R4, Register::R8, Register::Lr])
            .unwrap();
        assert_eq!(buf, [0x2D, 0xE9, 0x10, 0x41]);
    }

    #[test]
    fn empty_list_is_rejected() {
        let mut buf = [0u8; 4];
        let mut w = Writer::new(&mut buf, 0);
        assert_eq!(
            w.put_push_regs(&[]),
            Err(EncodeError::EmptyRegisterList)
        );
    }

    #[test]
    fn pop_narrow_form_uses_pc_special_bit() {
        let mut buf = [0u8; 4];
        let mut w = Writer::new(&mut buf, 0);
        w.put_pop_regs(&[Register::R0, Register::Pc]).unwrap();
        assert_eq!(buf[..2], (0xBC00 | 1 | (1 << 8)).to_le_bytes());
    }
}
