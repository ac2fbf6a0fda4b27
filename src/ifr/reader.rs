// Mon Oct 19 2026 - Alex

use crate::ifr::IfrOpcode;
use crate::scan::{ByteScanner, ScanError};

pub const HEADER_SIZE: usize = 2;
pub const SCOPE_FLAG: u8 = 0x80;
pub const LENGTH_MASK: u8 = 0x7F;

/// Header + GUID + title + help + flags.
pub const FORM_SET_BASE_LENGTH: usize = 23;
pub const FORM_SET_MAX_CLASS_GUIDS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub opcode_id: u8,
    pub length: u8,
    pub scope: bool,
}

impl RecordHeader {
    /// Reads the header at `offset`, or `None` when the declared length does
    /// not fit in `[HEADER_SIZE, remaining]`.
    pub fn parse(data: &[u8], offset: usize) -> Option<Self> {
        let remaining = data.len().checked_sub(offset)?;
        if remaining < HEADER_SIZE {
            return None;
        }

        let raw = data[offset + 1];
        let length = raw & LENGTH_MASK;
        if (length as usize) < HEADER_SIZE || length as usize > remaining {
            return None;
        }

        Some(Self {
            opcode_id: data[offset],
            length,
            scope: raw & SCOPE_FLAG != 0,
        })
    }

    pub fn opcode(&self) -> IfrOpcode {
        IfrOpcode::from_byte(self.opcode_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    pub offset: usize,
    pub header: RecordHeader,
    pub payload_offset: usize,
}

impl Record {
    pub fn opcode(&self) -> IfrOpcode {
        self.header.opcode()
    }

    pub fn next_offset(&self) -> usize {
        self.offset + self.header.length as usize
    }

    pub fn payload_len(&self) -> usize {
        self.header.length as usize - HEADER_SIZE
    }
}

pub struct FormReader<'a> {
    data: &'a [u8],
}

impl<'a> FormReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn records(&self) -> Records<'a> {
        self.records_from(0)
    }

    pub fn records_from(&self, start: usize) -> Records<'a> {
        Records {
            data: self.data,
            start,
            next: start,
            done: false,
        }
    }

    pub fn record_at(&self, offset: usize) -> Option<Record> {
        RecordHeader::parse(self.data, offset).map(|header| Record {
            offset,
            header,
            payload_offset: offset + HEADER_SIZE,
        })
    }

    pub fn payload(&self, record: &Record) -> &'a [u8] {
        &self.data[record.payload_offset..record.next_offset()]
    }

    /// Offsets of records that look like the opening `FormSet` of an IFR
    /// package: scoped, and sized as a form set with zero to three class GUIDs.
    pub fn locate_form_sets(&self) -> Result<Vec<usize>, ScanError> {
        let form_set = IfrOpcode::FormSet.to_byte();
        let data = self.data;

        let starts = ByteScanner::new()
            .scan(data, HEADER_SIZE, |w| w[0] == form_set && w[1] & SCOPE_FLAG != 0)?
            .filter(|&offset| {
                RecordHeader::parse(data, offset).is_some_and(|h| is_form_set_length(h.length as usize))
            })
            .collect();

        Ok(starts)
    }
}

fn is_form_set_length(length: usize) -> bool {
    length >= FORM_SET_BASE_LENGTH
        && (length - FORM_SET_BASE_LENGTH) % 16 == 0
        && (length - FORM_SET_BASE_LENGTH) / 16 <= FORM_SET_MAX_CLASS_GUIDS
}

/// Walks records strictly by declared length. Ends quietly on the first
/// header that is short, zero-length, or longer than what is left.
#[derive(Debug, Clone)]
pub struct Records<'a> {
    data: &'a [u8],
    start: usize,
    next: usize,
    done: bool,
}

impl<'a> Records<'a> {
    pub fn rewind(&mut self) {
        self.next = self.start;
        self.done = false;
    }

    pub fn position(&self) -> usize {
        self.next
    }

    /// True when the walk ended on a header that did not fit.
    pub fn truncated(&self) -> bool {
        self.done && self.next < self.data.len()
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        if self.done {
            return None;
        }

        let Some(header) = RecordHeader::parse(self.data, self.next) else {
            self.done = true;
            return None;
        };

        let record = Record {
            offset: self.next,
            header,
            payload_offset: self.next + HEADER_SIZE,
        };
        self.next = record.next_offset();

        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walks_by_declared_length() {
        // SuppressIf(scope), True, unknown 4-byte record, End, End
        let data = [0x0A, 0x82, 0x46, 0x02, 0x5F, 0x04, 0xDE, 0xAD, 0x29, 0x02, 0x29, 0x02];
        let reader = FormReader::new(&data);
        let records: Vec<_> = reader.records().collect();

        let offsets: Vec<_> = records.iter().map(|r| r.offset).collect();
        assert_eq!(offsets, vec![0, 2, 4, 8, 10]);
        assert!(records[0].header.scope);
        assert_eq!(records[0].header.length, 2);
        assert_eq!(records[2].opcode(), IfrOpcode::Unknown(0x5F));
        assert_eq!(reader.payload(&records[2]), &[0xDE, 0xAD]);
    }

    #[test]
    fn test_stops_on_truncated_tail() {
        let data = [0x46, 0x02, 0x12, 0x08, 0x00, 0x00];
        let mut records = FormReader::new(&data).records();

        assert_eq!(records.next().map(|r| r.offset), Some(0));
        assert_eq!(records.next(), None);
        assert!(records.truncated());
        assert_eq!(records.position(), 2);
    }

    #[test]
    fn test_stops_on_zero_length() {
        let data = [0x46, 0x02, 0x12, 0x00, 0x46, 0x02];
        let count = FormReader::new(&data).records().count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_single_trailing_byte_ends_sequence() {
        let data = [0x46, 0x02, 0x29];
        let mut records = FormReader::new(&data).records();
        assert!(records.next().is_some());
        assert!(records.next().is_none());
    }

    #[test]
    fn test_never_yields_past_end() {
        for seed in 0u8..=255 {
            let data: Vec<u8> = (0..37u8).map(|i| i.wrapping_mul(seed).wrapping_add(seed ^ 0x5A)).collect();
            let mut last = None;
            for record in FormReader::new(&data).records() {
                assert!(record.header.length as usize >= HEADER_SIZE);
                assert!(record.next_offset() <= data.len());
                if let Some(prev) = last {
                    assert!(record.offset > prev);
                }
                last = Some(record.offset);
            }
        }
    }

    #[test]
    fn test_rewind_restarts_walk() {
        let data = [0x46, 0x02, 0x47, 0x02];
        let mut records = FormReader::new(&data).records_from(2);
        assert_eq!(records.next().map(|r| r.opcode()), Some(IfrOpcode::False));
        assert!(records.next().is_none());

        records.rewind();
        assert_eq!(records.count(), 1);
    }

    #[test]
    fn test_locate_form_sets() {
        let mut data = vec![0xFF; 3];
        data.push(0x0E);
        data.push(0x80 | 23);
        data.extend_from_slice(&[0x11; 21]);
        // unscoped form set opcode is not a package start
        data.extend_from_slice(&[0x0E, 23]);
        data.extend_from_slice(&[0x22; 21]);

        let reader = FormReader::new(&data);
        assert_eq!(reader.locate_form_sets().unwrap(), vec![3]);
    }
}
