//! Fixed-width posting entries: 4 bytes big-endian document id followed by
//! 2 bytes big-endian term frequency.

use crate::{DocId, Error, Result};
use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use std::io::{self, Write};

pub const TUPLE_SIZE: usize = 6;
/// Low 16 bits of a frequency; anything above is dropped on encode.
pub const TF_MASK: u32 = (1 << 16) - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostingEntry {
    pub doc_id: DocId,
    pub tf: u16,
}

/// Decode `count` entries from `buf`, which must hold exactly `count * 6` bytes.
pub fn decode(buf: &[u8], count: usize) -> Result<Vec<PostingEntry>> {
    if buf.len() % TUPLE_SIZE != 0 {
        return Err(Error::MisalignedBuffer { len: buf.len() });
    }
    let expected = count * TUPLE_SIZE;
    if buf.len() != expected {
        return Err(Error::LengthMismatch { expected, actual: buf.len() });
    }
    Ok(buf
        .chunks_exact(TUPLE_SIZE)
        .map(|w| PostingEntry {
            doc_id: BigEndian::read_u32(&w[..4]),
            tf: (BigEndian::read_u16(&w[4..]) as u32 & TF_MASK) as u16,
        })
        .collect())
}

pub fn encode_entry<W: Write>(w: &mut W, doc_id: DocId, tf: u32) -> io::Result<()> {
    w.write_u32::<BigEndian>(doc_id)?;
    w.write_u16::<BigEndian>((tf & TF_MASK) as u16)
}

/// Only fixtures and tooling write postings; the serving path never does.
pub fn encode(postings: &[(DocId, u32)]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(postings.len() * TUPLE_SIZE);
    for &(doc_id, tf) in postings {
        // writing into a Vec cannot fail
        let _ = encode_entry(&mut buf, doc_id, tf);
    }
    buf
}
