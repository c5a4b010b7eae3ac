//! IPv6 Mobility extension header (RFC 6275 §6.1)

use std::fmt;

use bytes::{BufMut, BytesMut};
use shunt_core::{Error, Result};

use crate::proto::IpProtocol;
use crate::wire;

/// Mobility extension header, minimal 8-byte form.
///
/// Carries the MH type and checksum field as data; the checksum is never
/// computed or verified here; the header is a structural chain member, not
/// a Mobile IPv6 implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MobilityHeader {
    /// Protocol of the following header
    pub next_header: IpProtocol,
    /// Mobility header type (0 = binding refresh request)
    pub mh_type: u8,
    /// Checksum field, carried verbatim
    pub checksum: u16,
}

impl MobilityHeader {
    /// Fixed header size (8 bytes)
    pub const HEADER_LEN: usize = 8;

    /// Create a binding-refresh-request header; the caller wires the
    /// next-header code
    pub fn new() -> Self {
        MobilityHeader {
            next_header: IpProtocol::NoNextHeader,
            mh_type: 0,
            checksum: 0,
        }
    }

    /// Serialize the header into `buf`
    pub fn put_wire(&self, buf: &mut BytesMut) {
        buf.put_u8(self.next_header.to_u8());
        buf.put_u8(0); // no octets beyond the first 8
        buf.put_u8(self.mh_type);
        buf.put_u8(0);
        buf.put_u16(self.checksum);
        buf.put_u16(0); // message data pad
    }

    /// Parse the header, returning it and the bytes consumed
    pub fn from_wire(buf: &[u8]) -> Result<(Self, usize)> {
        wire::ensure(buf, Self::HEADER_LEN, "mobility header")?;
        let next_header = IpProtocol::from_wire(buf[0])?;
        let declared = (buf[1] as usize + 1) * 8;
        if declared != Self::HEADER_LEN {
            return Err(Error::format(format!(
                "mobility header: declared {declared} bytes, only the minimal 8-byte form is supported"
            )));
        }
        Ok((
            MobilityHeader {
                next_header,
                mh_type: buf[2],
                checksum: u16::from_be_bytes([buf[4], buf[5]]),
            },
            Self::HEADER_LEN,
        ))
    }
}

impl Default for MobilityHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MobilityHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Mobility mh_type={} next={}",
            self.mh_type, self.next_header
        )
    }
}
