//! `add`/`sub` selectors: immediate-8 (including the SP-adjust form),
//! two- and three-register forms, and the SP/PC-relative three-operand
//! immediate form.

use crate::bits::fits_in_unsigned;
use crate::error::EncodeError;
use crate::registers::Register;
use crate::writer::Writer;

impl<'a> Writer<'a> {
    /// `ADD Rd, #imm` / `ADD SP, #imm`. `sub_reg_imm` is this with a
    /// negated immediate.
    pub fn put_add_reg_imm(&mut self, dst: Register, imm: i32) -> Result<(), EncodeError> {
        if dst == Register::Sp {
            if imm % 4 != 0 {
                return Err(EncodeError::Misaligned(imm as i64));
            }
            let scaled = imm.unsigned_abs() / 4;
            if !fits_in_unsigned(scaled, 7) {
                return Err(EncodeError::ImmediateOutOfRange {
                    value: imm as i64,
                    bits: 7,
                });
            }
            let sign = if imm < 0 { 0x0080 } else { 0 };
            self.put_instruction(0xB000 | sign | scaled as u16);
            return Ok(());
        }

        if !dst.is_low() {
            return Err(EncodeError::UnsupportedRegisterClass);
        }
        let magnitude = imm.unsigned_abs();
        if !fits_in_unsigned(magnitude, 8) {
            return Err(EncodeError::ImmediateOutOfRange {
                value: imm as i64,
                bits: 8,
            });
        }
        let sign = if imm < 0 { 0x0800 } else { 0 };
        self.put_instruction(0x3000 | sign | (dst.index() as u16) << 8 | magnitude as u16);
        Ok(())
    }

    pub fn put_sub_reg_imm(&mut self, dst: Register, imm: i32) -> Result<(), EncodeError> {
        self.put_add_reg_imm(dst, -imm)
    }

    /// Two-register in-place `ADD Rdn, Rm`. Always representable (the
    /// 0x4400 family accepts any register combination).
    pub fn put_add_reg_reg(&mut self, dst: Register, src: Register) -> Result<(), EncodeError> {
        self.encode_add_sub_three(dst, dst, src, false)
    }

    /// Two-register `SUB Rdn, Rn, Rm`, routed through the three-register
    /// form (`SUB` has no high-register-capable in-place encoding, so both
    /// operands must be low).
    pub fn put_sub_reg_reg(&mut self, dst: Register, src: Register) -> Result<(), EncodeError> {
        self.encode_add_sub_three(dst, dst, src, true)
    }

    pub fn put_add_reg_reg_reg(
        &mut self,
        dst: Register,
        left: Register,
        right: Register,
    ) -> Result<(), EncodeError> {
        self.encode_add_sub_three(dst, left, right, false)
    }

    pub fn put_sub_reg_reg_reg(
        &mut self,
        dst: Register,
        left: Register,
        right: Register,
    ) -> Result<(), EncodeError> {
        self.encode_add_sub_three(dst, left, right, true)
    }

    /// Three-operand `ADD Rd, base, #imm`. `base` being `Sp`/`Pc` selects
    /// the scaled SP/PC-relative form (0xA000); any other base uses the
    /// 3-bit immediate form (0x1C00).
    pub fn put_add_reg_reg_imm(
        &mut self,
        dst: Register,
        base: Register,
        imm: i32,
    ) -> Result<(), EncodeError> {
        if matches!(base, Register::Sp | Register::Pc) {
            if !dst.is_low() {
                return Err(EncodeError::UnsupportedRegisterClass);
            }
            if imm < 0 || imm % 4 != 0 {
                return Err(EncodeError::Misaligned(imm as i64));
            }
            let scaled = (imm / 4) as u32;
            if !fits_in_unsigned(scaled, 8) {
                return Err(EncodeError::ImmediateOutOfRange {
                    value: imm as i64,
                    bits: 8,
                });
            }
            let base_bit = if base == Register::Sp { 0x0800 } else { 0 };
            self.put_instruction(
                0xA000 | base_bit | (dst.index() as u16) << 8 | scaled as u16,
            );
            return Ok(());
        }

        if !(dst.is_low() && base.is_low()) {
            return Err(EncodeError::UnsupportedRegisterClass);
        }
        let magnitude = imm.unsigned_abs();
        if !fits_in_unsigned(magnitude, 3) {
            return Err(EncodeError::ImmediateOutOfRange {
                value: imm as i64,
                bits: 3,
            });
        }
        let sign = if imm < 0 { 0x0200 } else { 0 };
        let magnitude = magnitude as u16;
        self.put_instruction(
            0x1C00 | sign | (magnitude << 6) | (base.index() as u16) << 3 | dst.index() as u16,
        );
        Ok(())
    }

    pub fn put_sub_reg_reg_imm(
        &mut self,
        dst: Register,
        base: Register,
        imm: i32,
    ) -> Result<(), EncodeError> {
        self.put_add_reg_reg_imm(dst, base, -imm)
    }

    fn encode_add_sub_three(
        &mut self,
        dst: Register,
        left: Register,
        right: Register,
        is_sub: bool,
    ) -> Result<(), EncodeError> {
        if !is_sub && dst == left {
            let d = (dst.index() >> 3) & 1;
            self.put_instruction(
                0x4400 | ((right.index() as u16) << 3) | (dst.index() as u16 & 0x7) | ((d as u16) << 7),
            );
            return Ok(());
        }
        if !(dst.is_low() && left.is_low() && right.is_low()) {
            return Err(EncodeError::UnsupportedRegisterClass);
        }
        let base = if is_sub { 0x1A00 } else { 0x1800 };
        self.put_instruction(
            base | ((right.index() as u16) << 6) | ((left.index() as u16) << 3) | dst.index() as u16,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(f: impl FnOnce(&mut Writer) -> Result<(), EncodeError>) -> Vec<u8> {
        let mut buf = [0u8; 16];
        let mut w = Writer::new(&mut buf, 0);
        f(&mut w).unwrap();
        buf[..w.offset()].to_vec()
    }

    #[test]
    fn add_sp_imm_requires_alignment() {
        let mut buf = [0u8; 4];
        let mut w = Writer::new(&mut buf, 0);
        assert_eq!(
            w.put_add_reg_imm(Register::Sp, 3),
            Err(EncodeError::Misaligned(3))
        );
    }

    #[test]
    fn add_sp_imm_encodes_scaled() {
        let b = bytes(|w| w.put_add_reg_imm(Register::Sp, 16));
        assert_eq!(b, (0xB000 | 4u16).to_le_bytes());
    }

    #[test]
    fn sub_reg_imm_sets_sign_bit() {
        let b = bytes(|w| w.put_sub_reg_imm(Register::R2, 5));
        assert_eq!(b, (0x3000 | 0x0800 | (2 << 8) | 5u16).to_le_bytes());
    }

    #[test]
    fn add_reg_reg_in_place_uses_0x4400() {
        let b = bytes(|w| w.put_add_reg_reg(Register::R8, Register::R2));
        assert_eq!(u16::from_le_bytes([b[0], b[1]]) & 0xFF80, 0x4400);
    }

    #[test]
    fn add_three_register_form_requires_low() {
        let mut buf = [0u8; 4];
        let mut w = Writer::new(&mut buf, 0);
        assert_eq!(
            w.put_add_reg_reg_reg(Register::R0, Register::R8, Register::R1),
            Err(EncodeError::UnsupportedRegisterClass)
        );
    }

    #[test]
    fn add_three_register_form_packs_fields() {
        let b = bytes(|w| w.put_add_reg_reg_reg(Register::R0, Register::R1, Register::R2));
        assert_eq!(b, (0x1800 | (2 << 6) | (1 << 3)).to_le_bytes());
    }

    #[test]
    fn add_reg_reg_imm_sp_relative() {
        let b = bytes(|w| w.put_add_reg_reg_imm(Register::R1, Register::Sp, 8));
        assert_eq!(b, (0xA000 | 0x0800 | (1 << 8) | 2u16).to_le_bytes());
    }

    #[test]
    fn add_reg_reg_imm_rejects_large_general_offset() {
        let mut buf = [0u8; 4];
        let mut w = Writer::new(&mut buf, 0);
        assert_eq!(
            w.put_add_reg_reg_imm(Register::R0, Register::R1, 8),
            Err(EncodeError::ImmediateOutOfRange { value: 8, bits: 3 })
        );
    }

    #[test]
    fn add_reg_reg_imm_accepts_full_magnitude_seven_on_general_base() {
        let b = bytes(|w| w.put_add_reg_reg_imm(Register::R0, Register::R1, 7));
        assert_eq!(b, (0x1C00 | (7 << 6) | (1 << 3)).to_le_bytes());
    }

    #[test]
    fn sub_reg_reg_imm_accepts_magnitude_seven() {
        let b = bytes(|w| w.put_sub_reg_reg_imm(Register::R0, Register::R1, 7));
        assert_eq!(b, (0x1C00 | 0x0200 | (7 << 6) | (1 << 3)).to_le_bytes());
    }
}
