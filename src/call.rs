//! AAPCS call-argument marshaller: lowers an abstract argument list to the
//! register moves and stack pushes a call requires, then emits the call
//! itself (`BLX Rn` for a register target, or a literal-loaded `BLX R12`
//! for an immediate address).
//!
//! Per DESIGN.md (Open Question 5), the C original's variadic-plus-
//! explicit-array pair collapses to a single `&[Argument]`-taking method;
//! a Rust slice already covers both calling shapes.

use crate::argument::Argument;
use crate::error::EncodeError;
use crate::registers::Register;
use crate::writer::Writer;

/// `R0`-`R3`, the AAPCS integer argument registers.
const ARG_REGS: [Register; 4] = [Register::R0, Register::R1, Register::R2, Register::R3];

/// Caller-saved scratch used to materialize address arguments before a
/// register move or stack push; never one of [`ARG_REGS`].
const SCRATCH: Register = Register::R12;

impl<'a> Writer<'a> {
    /// Marshals `args` per AAPCS and calls `target`.
    pub fn put_call_reg_with_arguments(
        &mut self,
        target: Register,
        args: &[Argument],
    ) -> Result<(), EncodeError> {
        self.marshal_arguments(args)?;
        self.put_blx_reg(target);
        Ok(())
    }

    /// Marshals `args` per AAPCS, materializes `target` into the scratch
    /// register via a literal load, and calls it.
    pub fn put_call_address_with_arguments(
        &mut self,
        target: u64,
        args: &[Argument],
    ) -> Result<(), EncodeError> {
        self.marshal_arguments(args)?;
        self.put_ldr_reg_address(SCRATCH, target);
        self.put_blx_reg(SCRATCH);
        Ok(())
    }

    /// Pushes stack arguments (index 4 and beyond) in reverse order, so the
    /// first stack argument ends up at the lowest address after all pushes,
    /// then fills `R0`-`R3` from the first four entries.
    fn marshal_arguments(&mut self, args: &[Argument]) -> Result<(), EncodeError> {
        let stack_args = args.len().saturating_sub(ARG_REGS.len());
        for arg in args[ARG_REGS.len()..].iter().rev().take(stack_args) {
            self.materialize_into(SCRATCH, *arg);
            self.put_push_regs(&[SCRATCH])?;
        }
        for (reg, arg) in ARG_REGS.iter().zip(args.iter()) {
            self.materialize_into(*reg, *arg);
        }
        Ok(())
    }

    fn materialize_into(&mut self, reg: Register, arg: Argument) {
        match arg {
            Argument::Register(src) if src == reg => {}
            Argument::Register(src) => self.put_mov_reg_reg(reg, src),
            Argument::Address(value) => self.put_ldr_reg_u32(reg, value as u32),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_already_in_place_emits_no_move() {
        let mut buf = [0u8; 4];
        let mut w = Writer::new(&mut buf, 0);
        w.put_call_reg_with_arguments(Register::Lr, &[Argument::Register(Register::R0)])
            .unwrap();
        assert_eq!(buf[..2], (0x4780 | (14 << 3)).to_le_bytes());
    }

    #[test]
    fn register_argument_in_wrong_slot_is_moved() {
        let mut buf = [0u8; 4];
        let mut w = Writer::new(&mut buf, 0);
        w.put_call_reg_with_arguments(Register::Lr, &[Argument::Register(Register::R1)])
            .unwrap();
        assert_eq!(buf[..2], 0x1C08u16.to_le_bytes());
    }

    #[test]
    fn address_argument_queues_a_literal_load() {
        let mut buf = [0u8; 8];
        let mut w = Writer::new(&mut buf, 0x1000);
        w.put_call_reg_with_arguments(Register::Lr, &[Argument::Address(0x2000)])
            .unwrap();
        assert_eq!(buf[..2], 0x4800u16.to_le_bytes());
        assert_eq!(w.literal_pool_pressure(), 1);
    }

    #[test]
    fn fifth_argument_is_pushed_to_the_stack() {
        let mut buf = [0u8; 16];
        let mut w = Writer::new(&mut buf, 0);
        w.put_call_reg_with_arguments(
            Register::Lr,
            &[
                Argument::Register(Register::R0),
                Argument::Register(Register::R1),
                Argument::Register(Register::R2),
                Argument::Register(Register::R3),
                Argument::Register(Register::R4),
            ],
        )
        .unwrap();
        // mov r12, r4 then push {r12} (r12 is high, so push takes the wide form).
        assert_eq!(buf[..2], (0x4600 | (4 << 3) | 4 | 0x80).to_le_bytes());
        assert_eq!(buf[2..4], 0xE92Du16.to_le_bytes());
        assert_eq!(buf[4..6], (1u16 << 12).to_le_bytes());
    }

    #[test]
    fn address_call_loads_target_into_scratch_then_calls_it() {
        let mut buf = [0u8; 8];
        let mut w = Writer::new(&mut buf, 0x1000);
        w.put_call_address_with_arguments(0xDEAD_0000, &[]).unwrap();
        assert_eq!(buf[..2], (0xF85F).to_le_bytes());
        assert_eq!(buf[2..4], ((12u16) << 12).to_le_bytes());
        assert_eq!(buf[4..6], (0x4780 | (12 << 3)).to_le_bytes());
    }
}
