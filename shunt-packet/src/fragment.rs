//! IPv6 Fragment extension header (RFC 8200 §4.5)

use std::fmt;

use bytes::{BufMut, BytesMut};
use shunt_core::Result;

use crate::proto::IpProtocol;
use crate::wire;

/// Fragment extension header
///
/// Fixed 8-byte layout: next header, reserved octet, offset/flags word,
/// identification. The offset is measured in 8-octet units and occupies 13
/// bits on the wire; values are masked at encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentHeader {
    /// Protocol of the following header
    pub next_header: IpProtocol,
    /// Fragment identification
    pub identification: u32,
    /// Fragment offset in 8-octet units (13 bits on the wire)
    pub offset: u16,
    /// More-fragments flag
    pub more_fragments: bool,
}

impl FragmentHeader {
    /// Fixed header size (8 bytes)
    pub const HEADER_LEN: usize = 8;

    /// Create a fragment header; the caller wires the next-header code
    pub fn new(identification: u32, offset: u16, more_fragments: bool) -> Self {
        FragmentHeader {
            next_header: IpProtocol::NoNextHeader,
            identification,
            offset,
            more_fragments,
        }
    }

    /// Serialize the header into `buf`
    pub fn put_wire(&self, buf: &mut BytesMut) {
        buf.put_u8(self.next_header.to_u8());
        buf.put_u8(0);
        let mut word = (self.offset & 0x1FFF) << 3;
        if self.more_fragments {
            word |= 0x0001;
        }
        buf.put_u16(word);
        buf.put_u32(self.identification);
    }

    /// Parse the header, returning it and the bytes consumed
    pub fn from_wire(buf: &[u8]) -> Result<(Self, usize)> {
        let (code, rest) = wire::read_u8(buf, "fragment header")?;
        let next_header = IpProtocol::from_wire(code)?;
        let (_, rest) = wire::read_u8(rest, "fragment header")?;
        let (word, rest) = wire::read_u16(rest, "fragment header")?;
        let (identification, _) = wire::read_u32(rest, "fragment header")?;
        Ok((
            FragmentHeader {
                next_header,
                identification,
                offset: word >> 3,
                more_fragments: word & 0x0001 != 0,
            },
            Self::HEADER_LEN,
        ))
    }
}

impl fmt::Display for FragmentHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Fragment id={} offset={} mf={} next={}",
            self.identification, self.offset, self.more_fragments, self.next_header
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let mut frag = FragmentHeader::new(42, 1000, false);
        frag.next_header = IpProtocol::Icmpv6;

        let mut buf = BytesMut::new();
        frag.put_wire(&mut buf);
        assert_eq!(buf.len(), 8);

        let (parsed, used) = FragmentHeader::from_wire(&buf).unwrap();
        assert_eq!(used, 8);
        assert_eq!(parsed, frag);
        assert_eq!(parsed.identification, 42);
        assert_eq!(parsed.offset, 1000);
        assert!(!parsed.more_fragments);
    }

    #[test]
    fn test_offset_masked_to_13_bits() {
        let mut frag = FragmentHeader::new(1, 0xFFFF, true);
        frag.next_header = IpProtocol::Tcp;

        let mut buf = BytesMut::new();
        frag.put_wire(&mut buf);
        let (parsed, _) = FragmentHeader::from_wire(&buf).unwrap();
        assert_eq!(parsed.offset, 0x1FFF);
        assert!(parsed.more_fragments);
    }

    #[test]
    fn test_truncated() {
        assert!(FragmentHeader::from_wire(&[58, 0, 0]).is_err());
    }
}
