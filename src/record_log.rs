//! Append-only log of BFS queue entries.
//!
//! Only the two newest BFS generations stay in memory; older ones are appended here and
//! read back by index when a solution path is reconstructed.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// One slot of the BFS queue.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct Entry {
    pub config: u64,
    /// Distance back from this entry to its predecessor, counted over all generations.
    pub pred: u64,
    pub moved_box: u32,
}

pub const RECORD_LEN: usize = 8 + 8 + 4;

impl Entry {
    #[inline]
    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.config.to_le_bytes());
        buf.extend_from_slice(&self.pred.to_le_bytes());
        buf.extend_from_slice(&self.moved_box.to_le_bytes());
    }

    #[inline]
    pub fn decode(bytes: &[u8; RECORD_LEN]) -> Self {
        let mut config = [0u8; 8];
        let mut pred = [0u8; 8];
        let mut moved_box = [0u8; 4];
        config.copy_from_slice(&bytes[0..8]);
        pred.copy_from_slice(&bytes[8..16]);
        moved_box.copy_from_slice(&bytes[16..20]);
        Entry {
            config: u64::from_le_bytes(config),
            pred: u64::from_le_bytes(pred),
            moved_box: u32::from_le_bytes(moved_box),
        }
    }
}

/// Sequential writer plus random-access reader by record index.
pub trait RecordLog {
    fn append(&mut self, entries: &[Entry]) -> io::Result<()>;

    /// Reads record `index`, counted from the first record ever appended.
    fn read(&mut self, index: u64) -> io::Result<Entry>;

    /// Number of records appended so far.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes the records occupy in their on-disk encoding.
    fn size_bytes(&self) -> u64 {
        self.len() * RECORD_LEN as u64
    }
}

/// Log kept in an anonymous temporary file. The file is unlinked on creation, so it
/// disappears when the log is dropped or the process exits.
#[derive(Debug)]
pub struct FileRecordLog {
    file: File,
    len: u64,
    buf: Vec<u8>,
}

impl FileRecordLog {
    pub fn new() -> io::Result<Self> {
        Ok(FileRecordLog { file: tempfile::tempfile()?, len: 0, buf: Vec::new() })
    }
}

impl RecordLog for FileRecordLog {
    fn append(&mut self, entries: &[Entry]) -> io::Result<()> {
        self.buf.clear();
        self.buf.reserve(entries.len() * RECORD_LEN);
        for e in entries {
            e.encode(&mut self.buf);
        }
        self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(&self.buf)?;
        self.len += entries.len() as u64;
        Ok(())
    }

    fn read(&mut self, index: u64) -> io::Result<Entry> {
        if index >= self.len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("record {index} beyond end of log ({} records)", self.len),
            ));
        }
        let mut bytes = [0u8; RECORD_LEN];
        self.file.seek(SeekFrom::Start(index * RECORD_LEN as u64))?;
        self.file.read_exact(&mut bytes)?;
        Ok(Entry::decode(&bytes))
    }

    fn len(&self) -> u64 {
        self.len
    }
}

/// In-memory log, for small searches and tests.
#[derive(Debug, Default)]
pub struct MemoryRecordLog {
    entries: Vec<Entry>,
}

impl MemoryRecordLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordLog for MemoryRecordLog {
    fn append(&mut self, entries: &[Entry]) -> io::Result<()> {
        self.entries.extend_from_slice(entries);
        Ok(())
    }

    fn read(&mut self, index: u64) -> io::Result<Entry> {
        self.entries.get(index as usize).copied().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, format!("record {index} beyond end of log"))
        })
    }

    fn len(&self) -> u64 {
        self.entries.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(range: std::ops::Range<u64>) -> Vec<Entry> {
        range
            .map(|i| Entry { config: i * 1_000_003, pred: i % 7, moved_box: (i % 5) as u32 })
            .collect()
    }

    #[test]
    fn file_log_reads_back_any_record() {
        let mut log = FileRecordLog::new().unwrap();
        assert!(log.is_empty());
        log.append(&entries(0..100)).unwrap();
        log.append(&entries(100..250)).unwrap();
        assert_eq!(log.len(), 250);
        assert_eq!(log.size_bytes(), 250 * RECORD_LEN as u64);

        let all = entries(0..250);
        for i in [249, 0, 100, 99, 17, 180] {
            assert_eq!(log.read(i).unwrap(), all[i as usize]);
        }
        // Appending after random reads still goes to the end.
        log.append(&entries(250..251)).unwrap();
        assert_eq!(log.read(250).unwrap(), entries(250..251)[0]);
        assert_eq!(log.read(3).unwrap(), all[3]);
    }

    #[test]
    fn reading_past_the_end_fails() {
        let mut log = FileRecordLog::new().unwrap();
        log.append(&entries(0..3)).unwrap();
        assert_eq!(log.read(3).unwrap_err().kind(), io::ErrorKind::UnexpectedEof);

        let mut mem = MemoryRecordLog::new();
        mem.append(&entries(0..3)).unwrap();
        assert_eq!(mem.read(2).unwrap(), entries(0..3)[2]);
        assert!(mem.read(3).is_err());
    }

    #[test]
    fn encoding_is_fixed_width_little_endian() {
        let e = Entry { config: u64::MAX - 1, pred: 0x0102, moved_box: 7 };
        let mut buf = Vec::new();
        e.encode(&mut buf);
        assert_eq!(buf.len(), RECORD_LEN);
        assert_eq!(&buf[8..10], &[0x02, 0x01]);
        let bytes: [u8; RECORD_LEN] = buf.try_into().unwrap();
        assert_eq!(Entry::decode(&bytes), e);
    }
}
