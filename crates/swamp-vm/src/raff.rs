//! RAFF container reading: the outer header and the four chunk tags a
//! Swamp package nests inside it.
//!
//! A RAFF file is a magic header followed by a sequence of tagged,
//! length-prefixed chunks. Swamp packages always nest chunks in one fixed
//! order: an outer `spk5` chunk containing a `sti0` (type info), a `dme0`
//! (dynamic/static memory), and an `ldg0` (ledger) chunk, each individually
//! tagged with both a 4-byte ASCII name and a 4-byte icon (an emoji's UTF-8
//! encoding, used as a second, harder-to-typo check on top of the name).

use crate::error::LoadError;

pub const MAGIC: [u8; 4] = *b"RAFF";
/// Header length in bytes: 4-byte magic, major/minor version, 3 reserved.
pub const HEADER_LEN: usize = 9;

/// A chunk's two-part tag: a human-readable 4-byte name and an emoji icon
/// used as a sanity check against cross-wired chunk readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkTag {
    pub icon: [u8; 4],
    pub name: [u8; 4],
}

pub const OUTER_PACKAGE: ChunkTag = ChunkTag {
    icon: [0xF0, 0x9F, 0x93, 0xA6],
    name: *b"spk5",
};
pub const TYPE_INFO: ChunkTag = ChunkTag {
    icon: [0xF0, 0x9F, 0x93, 0x9C],
    name: *b"sti0",
};
pub const DYNAMIC_MEMORY: ChunkTag = ChunkTag {
    icon: [0xF0, 0x9F, 0x92, 0xBB],
    name: *b"dme0",
};
pub const LEDGER: ChunkTag = ChunkTag {
    icon: [0xF0, 0x9F, 0x97, 0x92],
    name: *b"ldg0",
};

/// A cursor over a package's raw bytes, tracking how much has been
/// consumed. Every read advances `position` only after it succeeds, so a
/// failed read leaves the stream exactly where it was for error reporting.
pub struct OctetStream<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> OctetStream<'a> {
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        OctetStream { bytes, position: 0 }
    }

    fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.position..]
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], LoadError> {
        let rest = self.remaining();
        if rest.len() < len {
            return Err(LoadError::Truncated);
        }
        let (head, _) = rest.split_at(len);
        self.position += len;
        Ok(head)
    }

    /// Reads and verifies the outer RAFF file header.
    pub fn read_header(&mut self) -> Result<(), LoadError> {
        let header = self.take(HEADER_LEN)?;
        if header[0..4] != MAGIC {
            return Err(LoadError::BadMagic);
        }
        Ok(())
    }

    /// Reads a chunk header, verifies it matches `expected`, and returns
    /// the chunk body's byte length.
    pub fn read_chunk_header(&mut self, expected: ChunkTag, expected_name: &'static str) -> Result<usize, LoadError> {
        let icon: [u8; 4] = self.take(4)?.try_into().unwrap();
        let name: [u8; 4] = self.take(4)?.try_into().unwrap();
        let size_bytes: [u8; 4] = self.take(4)?.try_into().unwrap();
        let size = u32::from_le_bytes(size_bytes) as usize;

        if icon != expected.icon || name != expected.name {
            return Err(LoadError::BadChunkTag { expected: expected_name });
        }

        Ok(size)
    }

    /// Reads exactly `len` bytes as the next chunk's body.
    pub fn read_chunk_body(&mut self, len: usize) -> Result<&'a [u8], LoadError> {
        self.take(len)
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(tag: ChunkTag, body: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&tag.icon);
        out.extend_from_slice(&tag.name);
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn reads_header_and_chunk() {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&[1, 0, 0, 0, 0]); // version + reserved, pad to HEADER_LEN
        bytes.extend_from_slice(&chunk(TYPE_INFO, b"hello"));

        let mut stream = OctetStream::new(&bytes);
        stream.read_header().unwrap();
        let len = stream.read_chunk_header(TYPE_INFO, "type info").unwrap();
        assert_eq!(len, 5);
        assert_eq!(stream.read_chunk_body(len).unwrap(), b"hello");
    }

    #[test]
    fn rejects_bad_magic() {
        let bytes = [0u8; HEADER_LEN];
        let mut stream = OctetStream::new(&bytes);
        assert_eq!(stream.read_header(), Err(LoadError::BadMagic));
    }

    #[test]
    fn rejects_wrong_chunk_tag() {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&[1, 0, 0, 0, 0]);
        bytes.extend_from_slice(&chunk(LEDGER, b"x"));

        let mut stream = OctetStream::new(&bytes);
        stream.read_header().unwrap();
        assert!(matches!(
            stream.read_chunk_header(TYPE_INFO, "type info"),
            Err(LoadError::BadChunkTag { .. })
        ));
    }

    #[test]
    fn truncated_body_is_an_error() {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&[1, 0, 0, 0, 0]);
        bytes.extend_from_slice(&TYPE_INFO.icon);
        bytes.extend_from_slice(&TYPE_INFO.name);
        bytes.extend_from_slice(&100u32.to_le_bytes()); // claims 100 bytes, has none

        let mut stream = OctetStream::new(&bytes);
        stream.read_header().unwrap();
        let len = stream.read_chunk_header(TYPE_INFO, "type info").unwrap();
        assert_eq!(stream.read_chunk_body(len), Err(LoadError::Truncated));
    }
}
