//! `ldr`/`str` selectors: register+offset forms (narrow register-base,
//! narrow SP-base, and wide 12-bit-offset) plus the PC-relative literal
//! load that feeds the literal pool.

use crate::error::EncodeError;
use crate::registers::Register;
use crate::writer::Writer;

impl<'a> Writer<'a> {
    /// Queues `Rd = value` via the literal pool, appending a placeholder
    /// `ldr Rd, [pc, #_]` patched at `flush`. Never fails: the pool is a
    /// growable table (see DESIGN.md Open Question 1).
    pub fn put_ldr_reg_u32(&mut self, dst: Register, value: u32) {
        let insn_addr = self.pc();
        if dst.is_low() {
            self.put_instruction(0x4800 | (dst.index() as u16) << 8);
        } else {
            self.put_instruction(0xF85F);
            self.put_instruction((dst.index() as u16) << 12);
        }
        self.add_literal_ref(value, insn_addr);
    }

    /// Convenience over [`Writer::put_ldr_reg_u32`] for a 32-bit host
    /// address (Thumb-2/AAPCS32 pointers are 32-bit).
    pub fn put_ldr_reg_address(&mut self, dst: Register, address: u64) {
        self.put_ldr_reg_u32(dst, address as u32);
    }

    pub fn put_ldr_reg_reg(&mut self, dst: Register, base: Register) -> Result<(), EncodeError> {
        self.put_ldr_reg_reg_offset(dst, base, 0)
    }

    pub fn put_ldr_reg_reg_offset(
        &mut self,
        dst: Register,
        base: Register,
        offset: i32,
    ) -> Result<(), EncodeError> {
        self.encode_load_store(dst, base, offset, true)
    }

    pub fn put_str_reg_reg(&mut self, dst: Register, base: Register) -> Result<(), EncodeError> {
        self.put_str_reg_reg_offset(dst, base, 0)
    }

    pub fn put_str_reg_reg_offset(
        &mut self,
        dst: Register,
        base: Register,
        offset: i32,
    ) -> Result<(), EncodeError> {
        self.encode_load_store(dst, base, offset, false)
    }

    fn encode_load_store(
        &mut self,
        dst: Register,
        base: Register,
        offset: i32,
        is_load: bool,
    ) -> Result<(), EncodeError> {
        if offset < 0 {
            return Err(EncodeError::OffsetOutOfRange {
                value: offset as i64,
                max: 4095,
            });
        }
        let narrow_eligible =
            dst.is_low() && (base.is_low() || base == Register::Sp) && offset % 4 == 0;
        if narrow_eligible {
            let load_bit = if is_load { 0x0800 } else { 0 };
            if base == Register::Sp {
                if offset <= 1020 {
                    let scaled = (offset / 4) as u16;
                    self.put_instruction(0x9000 | load_bit | (dst.index() as u16) << 8 | scaled);
                    return Ok(());
                }
            } else if offset <= 124 {
                let scaled = (offset / 4) as u16;
                self.put_instruction(
                    0x6000 | load_bit | (scaled << 6) | (base.index() as u16) << 3 | dst.index() as u16,
                );
                return Ok(());
            }
        }

        if offset > 4095 {
            return Err(EncodeError::OffsetOutOfRange {
                value: offset as i64,
                max: 4095,
            });
        }
        let load_bit = if is_load { 0x0010 } else { 0 };
        self.put_instruction(0xF8C0 | load_bit | base.index() as u16);
        self.put_instruction((dst.index() as u16) << 12 | (offset as u16 & 0x0FFF));
        Ok(())
    }
}
