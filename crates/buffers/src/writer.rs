//! Deferred binary writer.
//!
//! Instead of growing a byte buffer as it goes, the writer records a list of
//! pending write operations and materializes them into a single exactly-sized
//! allocation at the end. Multi-byte values are kept in native form until
//! materialization, so recording a fragment is just a `Vec` push.

/// One pending write operation.
///
/// The length of every variant is known without encoding it, which is what
/// lets [`Writer::materialize`] size its output buffer up front.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Bytes copied verbatim.
    Raw(Vec<u8>),
    /// A single byte.
    U8(u8),
    /// Big-endian 16-bit unsigned integer.
    U16(u16),
    /// Big-endian 32-bit unsigned integer.
    U32(u32),
    /// Big-endian IEEE 754 double.
    F64(f64),
    /// UTF-8 bytes of a string.
    Utf8(String),
}

impl WriteOp {
    /// Encoded byte length of this operation.
    pub fn len(&self) -> usize {
        match self {
            WriteOp::Raw(bytes) => bytes.len(),
            WriteOp::U8(_) => 1,
            WriteOp::U16(_) => 2,
            WriteOp::U32(_) => 4,
            WriteOp::F64(_) => 8,
            WriteOp::Utf8(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write_into(&self, out: &mut Vec<u8>) {
        match self {
            WriteOp::Raw(bytes) => out.extend_from_slice(bytes),
            WriteOp::U8(v) => out.push(*v),
            WriteOp::U16(v) => out.extend_from_slice(&v.to_be_bytes()),
            WriteOp::U32(v) => out.extend_from_slice(&v.to_be_bytes()),
            WriteOp::F64(v) => out.extend_from_slice(&v.to_be_bytes()),
            WriteOp::Utf8(s) => out.extend_from_slice(s.as_bytes()),
        }
    }
}

/// A deferred binary writer.
///
/// # Example
///
/// ```
/// use cbor_graph_buffers::Writer;
///
/// let mut writer = Writer::new();
/// writer.u8(0x19);
/// writer.u16(0x0102);
/// assert_eq!(writer.byte_size(), 3);
/// assert_eq!(writer.materialize(), vec![0x19, 0x01, 0x02]);
/// ```
///
/// In streaming mode (see [`Writer::with_sink`]) every recorded operation is
/// materialized immediately and handed to the sink, and nothing accumulates.
pub struct Writer {
    ops: Vec<WriteOp>,
    size: usize,
    sink: Option<Box<dyn FnMut(&[u8])>>,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            size: 0,
            sink: None,
        }
    }

    /// Creates a streaming writer. Every recorded operation is flushed to
    /// `sink` synchronously.
    pub fn with_sink(sink: Box<dyn FnMut(&[u8])>) -> Self {
        Self {
            ops: Vec::new(),
            size: 0,
            sink: Some(sink),
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.sink.is_some()
    }

    /// Records one operation. An empty [`WriteOp::Raw`] is skipped.
    pub fn push(&mut self, op: WriteOp) {
        if let WriteOp::Raw(bytes) = &op {
            if bytes.is_empty() {
                return;
            }
        }
        self.size += op.len();
        self.ops.push(op);
        if self.sink.is_some() {
            let out = self.take_bytes();
            if let Some(sink) = self.sink.as_mut() {
                sink(&out);
            }
        }
    }

    pub fn u8(&mut self, v: u8) {
        self.push(WriteOp::U8(v));
    }

    pub fn u16(&mut self, v: u16) {
        self.push(WriteOp::U16(v));
    }

    pub fn u32(&mut self, v: u32) {
        self.push(WriteOp::U32(v));
    }

    pub fn f64(&mut self, v: f64) {
        self.push(WriteOp::F64(v));
    }

    pub fn raw(&mut self, bytes: &[u8]) {
        self.push(WriteOp::Raw(bytes.to_vec()));
    }

    pub fn utf8(&mut self, s: &str) {
        self.push(WriteOp::Utf8(s.to_owned()));
    }

    /// Total byte length of the recorded operations. Always equals the
    /// length of the buffer [`Writer::materialize`] would produce.
    pub fn byte_size(&self) -> usize {
        self.size
    }

    /// Writes all recorded operations, in order, into one allocation and
    /// resets the writer for reuse.
    pub fn materialize(&mut self) -> Vec<u8> {
        self.take_bytes()
    }

    /// Discards all recorded operations.
    pub fn reset(&mut self) {
        self.ops.clear();
        self.size = 0;
    }

    fn take_bytes(&mut self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size);
        for op in &self.ops {
            op.write_into(&mut out);
        }
        self.ops.clear();
        self.size = 0;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_op_lengths() {
        assert_eq!(WriteOp::U8(0).len(), 1);
        assert_eq!(WriteOp::U16(0).len(), 2);
        assert_eq!(WriteOp::U32(0).len(), 4);
        assert_eq!(WriteOp::F64(0.0).len(), 8);
        assert_eq!(WriteOp::Raw(vec![1, 2, 3]).len(), 3);
        assert_eq!(WriteOp::Utf8("héllo".into()).len(), 6);
    }

    #[test]
    fn test_fragments_in_order() {
        let mut w = Writer::new();
        w.u8(0x01);
        w.u16(0x0203);
        w.u32(0x04050607);
        w.raw(&[0xaa]);
        assert_eq!(
            w.materialize(),
            vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0xaa]
        );
    }

    #[test]
    fn test_byte_size_matches_output() {
        let mut w = Writer::new();
        w.u8(1);
        w.f64(1.5);
        w.utf8("abc");
        let size = w.byte_size();
        assert_eq!(w.materialize().len(), size);
    }

    #[test]
    fn test_materialize_resets() {
        let mut w = Writer::new();
        w.u8(0xff);
        assert_eq!(w.materialize(), vec![0xff]);
        assert_eq!(w.byte_size(), 0);
        assert_eq!(w.materialize(), Vec::<u8>::new());
        w.u8(0x01);
        assert_eq!(w.materialize(), vec![0x01]);
    }

    #[test]
    fn test_empty_raw_skipped() {
        let mut w = Writer::new();
        w.raw(&[]);
        assert_eq!(w.byte_size(), 0);
        assert!(w.materialize().is_empty());
    }

    #[test]
    fn test_f64_big_endian() {
        let mut w = Writer::new();
        w.f64(1.0);
        assert_eq!(w.materialize(), 1.0f64.to_be_bytes().to_vec());
    }

    #[test]
    fn test_utf8_bytes() {
        let mut w = Writer::new();
        w.utf8("hi");
        assert_eq!(w.materialize(), b"hi".to_vec());
    }

    #[test]
    fn test_reset_discards() {
        let mut w = Writer::new();
        w.u32(42);
        w.reset();
        assert_eq!(w.byte_size(), 0);
        assert!(w.materialize().is_empty());
    }

    #[test]
    fn test_streaming_sink_gets_every_push() {
        let chunks: Rc<RefCell<Vec<Vec<u8>>>> = Rc::new(RefCell::new(Vec::new()));
        let c = chunks.clone();
        let mut w = Writer::with_sink(Box::new(move |bytes| {
            c.borrow_mut().push(bytes.to_vec());
        }));
        assert!(w.is_streaming());
        w.u8(0x82);
        w.u16(0x0102);
        assert_eq!(w.byte_size(), 0);
        assert_eq!(
            *chunks.borrow(),
            vec![vec![0x82], vec![0x01, 0x02]]
        );
    }

    #[test]
    fn test_streaming_skips_empty_raw() {
        let count: Rc<RefCell<usize>> = Rc::new(RefCell::new(0));
        let c = count.clone();
        let mut w = Writer::with_sink(Box::new(move |_| {
            *c.borrow_mut() += 1;
        }));
        w.raw(&[]);
        assert_eq!(*count.borrow(), 0);
    }
}
