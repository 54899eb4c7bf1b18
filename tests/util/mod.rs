use thumb_writer::writer::Writer;

/// Runs `f` against a fresh [`Writer`] bound to `buf` and returns the bytes
/// emitted up to `flush`. Mirrors spec.md §8's own concrete-scenario format
/// (exact byte sequences) rather than asserting on disassembly text, since
/// this crate carries no disassembler.
pub(crate) fn flushed_bytes(buf_len: usize, base: usize, f: impl FnOnce(&mut Writer)) -> Vec<u8> {
    let mut buf = vec![0u8; buf_len];
    let mut w = Writer::new(&mut buf, base);
    f(&mut w);
    w.flush().expect("flush should succeed in this scenario");
    let offset = w.offset();
    buf[..offset].to_vec()
}
