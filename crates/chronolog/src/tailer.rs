use chronolog_core::{LogCodec, LogEvent, RecordRead, Result, StoreError};

/// Walks a record store in index order, decoding each record
///
/// Reaching the end is not terminal: a later [`next_event`](Self::next_event)
/// picks up records appended in the meantime.
pub struct LogTailer<R, C> {
    reader: R,
    codec: C,
    next: u64,
    // Set when a read failed without consuming a record; ends iteration.
    stalled: bool,
}

impl<R: RecordRead, C: LogCodec> LogTailer<R, C> {
    /// Start at the first record
    pub fn new(reader: R, codec: C) -> Self {
        Self::from_index(reader, codec, 0)
    }

    /// Start at record `index`
    pub fn from_index(reader: R, codec: C, index: u64) -> Self {
        Self {
            reader,
            codec,
            next: index,
            stalled: false,
        }
    }

    /// Index of the record the next call will read
    pub fn index(&self) -> u64 {
        self.next
    }

    pub fn seek(&mut self, index: u64) {
        self.next = index;
        self.stalled = false;
    }

    pub fn to_start(&mut self) {
        self.seek(0);
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Decode the next record, or `None` at the current end of the store
    ///
    /// A record that fails to decode, or that the store reports as corrupt,
    /// is skipped past, so the caller can log the error and carry on. Any
    /// other store error leaves the position unchanged so the read can be
    /// retried.
    pub fn next_event(&mut self) -> Result<Option<LogEvent>> {
        let record = match self.reader.read_at(self.next) {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(None),
            Err(e @ StoreError::Corrupt(_)) => {
                self.next += 1;
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };
        self.next += 1;
        self.codec.decode(&record).map(Some)
    }
}

/// Yields every readable record once. An error that does not consume a
/// record is yielded once and then ends iteration, until the next `seek`.
impl<R: RecordRead, C: LogCodec> Iterator for LogTailer<R, C> {
    type Item = Result<LogEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stalled {
            return None;
        }
        let before = self.next;
        let item = self.next_event().transpose();
        if matches!(item, Some(Err(_))) && self.next == before {
            self.stalled = true;
        }
        item
    }
}
