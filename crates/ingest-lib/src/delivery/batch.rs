//! In-memory record batch with flush-decision bookkeeping

/// Default maximum records per batch
pub const DEFAULT_COUNT_LIMIT: usize = 500;

/// Default maximum aggregate batch size in bytes
pub const DEFAULT_SIZE_LIMIT: usize = 4_000_000;

/// Ordered batch of serialized records plus running aggregate byte size
///
/// The batch itself never flushes; it only answers whether the engine must
/// flush before appending the next record. The check runs before the append,
/// so the triggering record always lands in the next batch. A record larger
/// than the size limit on its own is still appended to an empty batch and
/// sent alone — the size limit is a flush trigger, not a hard cap.
#[derive(Debug)]
pub struct RecordBatch {
    records: Vec<Vec<u8>>,
    byte_size: usize,
    count_limit: usize,
    size_limit: usize,
}

impl RecordBatch {
    pub fn new(count_limit: usize, size_limit: usize) -> Self {
        Self {
            records: Vec::new(),
            byte_size: 0,
            count_limit,
            size_limit,
        }
    }

    /// Whether the current batch must be flushed before a record of
    /// `incoming_size` bytes is appended
    ///
    /// Count check leaves one record of headroom below the limit; size check
    /// flushes as soon as the incoming record would push past the limit.
    pub fn should_flush_before(&self, incoming_size: usize) -> bool {
        self.records.len() + 1 >= self.count_limit - 1
            || self.byte_size + incoming_size > self.size_limit
    }

    pub fn push(&mut self, blob: Vec<u8>) {
        self.byte_size += blob.len();
        self.records.push(blob);
    }

    /// Take all buffered records, leaving the batch empty
    pub fn take(&mut self) -> Vec<Vec<u8>> {
        self.byte_size = 0;
        std::mem::take(&mut self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn byte_size(&self) -> usize {
        self.byte_size
    }
}

impl Default for RecordBatch {
    fn default() -> Self {
        Self::new(DEFAULT_COUNT_LIMIT, DEFAULT_SIZE_LIMIT)
    }
}
