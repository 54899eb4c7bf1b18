//! The `Writer` cursor: label/literal fixup tables, cursor utilities, and
//! `flush`.

use log::{debug, trace};

use crate::bits::{fits_in_int8, fits_in_int11, fits_in_unsigned};
use crate::encodings::misc::NOP;
use crate::error::FlushError;
use crate::target::TargetOs;

/// Opaque, caller-chosen token identifying a label. Identity is by value
/// equality, not by any structure the Writer interprets — a counter, an
/// interned string's hash, or a pointer cast to `u64` all work equally well.
pub type LabelId = u64;

#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolvedLabel {
    pub(crate) id: LabelId,
    pub(crate) address: usize,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct LabelRef {
    pub(crate) id: LabelId,
    pub(crate) insn_addr: usize,
    pub(crate) ref_pc: usize,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct LiteralRef {
    pub(crate) value: u32,
    pub(crate) insn_addr: usize,
}

/// Minimum table capacities matching observed instrumentation workloads,
/// used only as `Vec::with_capacity` hints — the tables themselves grow.
const LABEL_CAPACITY_HINT: usize = 100;
const LABEL_REF_CAPACITY_HINT: usize = 300;
const LITERAL_REF_CAPACITY_HINT: usize = 100;

/// A streaming Thumb/Thumb-2 machine-code encoder writing into a caller-owned
/// buffer.
///
/// Not `Sync`: nothing stops two threads from holding references to the same
/// `Writer`, but emitting from more than one at a time is a logic error the
/// type does not prevent, exactly as a raw cursor would be. Wrap it in an
/// `Rc<RefCell<_>>` or `Arc<Mutex<_>>` if shared ownership is needed — the
/// crate does not reinvent either.
pub struct Writer<'a> {
    buf: &'a mut [u8],
    base: usize,
    code: usize,
    pc: usize,
    target_os: TargetOs,
    pub(crate) labels: Vec<ResolvedLabel>,
    pub(crate) label_refs: Vec<LabelRef>,
    pub(crate) literal_refs: Vec<LiteralRef>,
}

impl<'a> Writer<'a> {
    /// Creates a writer bound to `buf`, whose first byte will execute at
    /// address `base`.
    pub fn new(buf: &'a mut [u8], base: usize) -> Self {
        Writer {
            buf,
            base,
            code: base,
            pc: base,
            target_os: TargetOs::default(),
            labels: Vec::with_capacity(LABEL_CAPACITY_HINT),
            label_refs: Vec::with_capacity(LABEL_REF_CAPACITY_HINT),
            literal_refs: Vec::with_capacity(LITERAL_REF_CAPACITY_HINT),
        }
    }

    /// Rebinds this writer to a new buffer and base address, discarding all
    /// pending and resolved state.
    pub fn reset(&mut self, buf: &'a mut [u8], base: usize) {
        self.buf = buf;
        self.base = base;
        self.code = base;
        self.pc = base;
        self.labels.clear();
        self.label_refs.clear();
        self.literal_refs.clear();
    }

    /// Discards pending label/literal fixups without touching the cursor or
    /// buffer contents already emitted. Used to abandon in-progress
    /// emission (spec's cancellation model: the caller discards outstanding
    /// work rather than unwinding it).
    pub fn clear(&mut self) {
        self.labels.clear();
        self.label_refs.clear();
        self.literal_refs.clear();
    }

    pub fn set_target_os(&mut self, os: TargetOs) {
        self.target_os = os;
    }

    pub fn target_os(&self) -> TargetOs {
        self.target_os
    }

    /// The current emission address.
    pub fn current(&self) -> usize {
        self.code
    }

    /// The current program-counter value the processor will see.
    pub(crate) fn pc(&self) -> usize {
        self.pc
    }

    /// Bytes emitted since `base`.
    pub fn offset(&self) -> usize {
        self.code - self.base
    }

    /// Advances the cursor by `n` bytes without writing anything, leaving
    /// room the caller fills in by other means.
    pub fn skip(&mut self, n: usize) {
        self.code += n;
        self.pc += n;
    }

    /// Number of distinct literal values still pending a pool flush. A
    /// read-only gauge, not a partial-flush trigger (see DESIGN.md for why
    /// eager draining isn't offered as a separate operation).
    pub fn literal_pool_pressure(&self) -> usize {
        dedup_values(&self.literal_refs).len()
    }

    /// Appends one halfword in little-endian order and advances the cursor.
    pub fn put_instruction(&mut self, insn: u16) {
        let off = self.offset();
        self.buf[off..off + 2].copy_from_slice(&insn.to_le_bytes());
        self.code += 2;
        self.pc += 2;
    }

    /// Appends a raw byte sequence. Fails if `bytes.len()` is odd — Thumb
    /// instructions are halfword-aligned.
    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<(), crate::error::EncodeError> {
        if bytes.len() % 2 != 0 {
            return Err(crate::error::EncodeError::OddLength(bytes.len()));
        }
        let off = self.offset();
        self.buf[off..off + bytes.len()].copy_from_slice(bytes);
        self.code += bytes.len();
        self.pc += bytes.len();
        Ok(())
    }

    /// Records the current `pc` as the resolved address for `id`. Fails if
    /// `id` is already resolved — each label is single-assignment.
    pub fn put_label(&mut self, id: LabelId) -> Result<(), crate::error::EncodeError> {
        if self.labels.iter().any(|label| label.id == id) {
            return Err(crate::error::EncodeError::DuplicateLabel);
        }
        self.labels.push(ResolvedLabel {
            id,
            address: self.pc,
        });
        Ok(())
    }

    /// Used by branch-to-label selectors: records a pending fixup at the
    /// placeholder just emitted.
    pub(crate) fn add_label_ref(&mut self, id: LabelId, insn_addr: usize) {
        self.label_refs.push(LabelRef {
            id,
            insn_addr,
            ref_pc: insn_addr + 4,
        });
    }

    /// Used by the literal-load selectors: records a pending literal slot.
    pub(crate) fn add_literal_ref(&mut self, value: u32, insn_addr: usize) {
        self.literal_refs.push(LiteralRef { value, insn_addr });
    }

    fn read_halfword(&self, addr: usize) -> u16 {
        let off = addr - self.base;
        u16::from_le_bytes([self.buf[off], self.buf[off + 1]])
    }

    fn write_halfword(&mut self, addr: usize, value: u16) {
        let off = addr - self.base;
        self.buf[off..off + 2].copy_from_slice(&value.to_le_bytes());
    }

    /// Resolves every pending label reference and appends the literal pool.
    /// On any failure, both pending tables are emptied so a later `flush`
    /// on the same writer is a no-op.
    pub fn flush(&mut self) -> Result<(), FlushError> {
        if let Err(err) = self.resolve_labels() {
            self.label_refs.clear();
            self.literal_refs.clear();
            return Err(err);
        }
        self.lay_literal_pool();
        self.label_refs.clear();
        self.literal_refs.clear();
        debug!("flush complete at pc={:#x}", self.pc);
        Ok(())
    }

    fn resolve_labels(&mut self) -> Result<(), FlushError> {
        let refs = std::mem::take(&mut self.label_refs);
        for label_ref in &refs {
            let address = self
                .labels
                .iter()
                .find(|label| label.id == label_ref.id)
                .map(|label| label.address)
                .ok_or(FlushError::UnresolvedLabel)?;
            let distance = (address as i64 - label_ref.ref_pc as i64) / 2;
            let insn = self.read_halfword(label_ref.insn_addr);
            let patched = if (insn & 0xF000) == 0xD000 {
                if !fits_in_int8(distance as i32) {
                    return Err(FlushError::BranchRangeOverflow { distance, bits: 8 });
                }
                insn | (distance as u16 & 0xFF)
            } else if (insn & 0xF800) == 0xE000 {
                if !fits_in_int11(distance as i32) {
                    return Err(FlushError::BranchRangeOverflow { distance, bits: 11 });
                }
                insn | (distance as u16 & 0x7FF)
            } else {
                if !fits_in_unsigned(distance as u32, 6) {
                    return Err(FlushError::BranchRangeOverflow { distance, bits: 6 });
                }
                let distance = distance as u16;
                let i_bit = (distance >> 5) & 1;
                let imm5 = distance & 0x1F;
                insn | (i_bit << 9) | (imm5 << 3)
            };
            self.write_halfword(label_ref.insn_addr, patched);
        }
        self.label_refs = refs;
        Ok(())
    }

    fn lay_literal_pool(&mut self) {
        let refs = std::mem::take(&mut self.literal_refs);
        if refs.is_empty() {
            return;
        }

        let needs_narrow_alignment = refs
            .iter()
            .any(|r| (self.read_halfword(r.insn_addr) & 0xF800) == 0x4800);
        if needs_narrow_alignment && self.pc % 4 != 0 {
            trace!("inserting alignment nop before literal pool at pc={:#x}", self.pc);
            self.put_instruction(NOP);
        }

        let slots = dedup_values(&refs);
        let pool_start = self.pc;
        for (i, value) in slots.iter().enumerate() {
            let off = self.offset() + i * 4;
            self.buf[off..off + 4].copy_from_slice(&value.to_le_bytes());
        }
        self.code += slots.len() * 4;
        self.pc += slots.len() * 4;
        trace!(
            "laid {} literal slot(s) at pc={:#x}",
            slots.len(),
            pool_start
        );

        for literal_ref in &refs {
            let slot_index = slots
                .iter()
                .position(|v| *v == literal_ref.value)
                .expect("value was just deduplicated from this same list");
            let slot_pc = pool_start + slot_index * 4;
            let aligned_insn_addr = literal_ref.insn_addr & !3;
            let distance = (slot_pc - aligned_insn_addr) as u32;
            let insn = self.read_halfword(literal_ref.insn_addr);
            if (insn & 0xF800) == 0x4800 {
                let patched = insn | ((distance / 4) as u16 & 0xFF);
                self.write_halfword(literal_ref.insn_addr, patched);
            } else {
                let second_addr = literal_ref.insn_addr + 2;
                let second = self.read_halfword(second_addr);
                let patched = second | (distance as u16 & 0x0FFF);
                self.write_halfword(second_addr, patched);
            }
        }

        self.literal_refs = refs;
    }

    pub(crate) fn buf_mut(&mut self, addr: usize, len: usize) -> &mut [u8] {
        let off = addr - self.base;
        &mut self.buf[off..off + len]
    }
}

fn dedup_values(refs: &[LiteralRef]) -> Vec<u32> {
    let mut values = Vec::with_capacity(refs.len());
    for r in refs {
        if !values.contains(&r.value) {
            values.push(r.value);
        }
    }
    values
}
