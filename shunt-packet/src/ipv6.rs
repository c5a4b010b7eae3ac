//! IPv6 base header (RFC 8200)
//!
//! The header is an owned value: mutate fields, then re-serialize. The
//! payload-length word is not stored: the stack encoder writes it from the
//! byte count of everything that follows the header, and decode validates it
//! against the remaining buffer. Serialization therefore never mutates the
//! header and a decoded stack compares equal to the one that produced it.

use std::fmt;
use std::net::{IpAddr, Ipv6Addr};

use bytes::{BufMut, BytesMut};
use shunt_core::{Error, Result};

use crate::proto::IpProtocol;
use crate::wire;

/// IPv6 base header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv6Header {
    /// Traffic class (8 bits)
    pub traffic_class: u8,
    /// Flow label (lower 20 bits used on the wire)
    pub flow_label: u32,
    /// Protocol of the following header
    pub next_header: IpProtocol,
    /// Hop limit
    pub hop_limit: u8,
    /// Source address
    pub source: Ipv6Addr,
    /// Destination address
    pub destination: Ipv6Addr,
}

impl Ipv6Header {
    /// Fixed header size (40 bytes)
    pub const HEADER_LEN: usize = 40;

    /// Create a header with default field values.
    ///
    /// Both addresses start as the unspecified address (`::`), the chain
    /// terminates (no next header) until the caller wires it.
    pub fn new() -> Self {
        Ipv6Header {
            traffic_class: 0,
            flow_label: 0,
            next_header: IpProtocol::NoNextHeader,
            hop_limit: 64,
            source: Ipv6Addr::UNSPECIFIED,
            destination: Ipv6Addr::UNSPECIFIED,
        }
    }

    /// Assign the source address, rejecting non-IPv6 families
    pub fn set_source(&mut self, addr: impl Into<IpAddr>) -> Result<()> {
        self.source = wire::ipv6_field(addr, "IPv6 source")?;
        Ok(())
    }

    /// Assign the destination address, rejecting non-IPv6 families
    pub fn set_destination(&mut self, addr: impl Into<IpAddr>) -> Result<()> {
        self.destination = wire::ipv6_field(addr, "IPv6 destination")?;
        Ok(())
    }

    /// Assign the next-header field from a raw protocol number.
    ///
    /// Fails with an enum-value error for codes outside the defined
    /// protocol-number space.
    pub fn set_next_header(&mut self, code: u8) -> Result<()> {
        self.next_header = IpProtocol::try_from_u8(code)?;
        Ok(())
    }

    /// Serialize the header into `buf`.
    ///
    /// `payload_len` is the byte count of everything following this header;
    /// it lands in the payload-length word. Counts beyond the 16-bit field
    /// are written as zero (jumbogram discipline, RFC 2675).
    pub fn put_wire(&self, buf: &mut BytesMut, payload_len: usize) {
        let flow = self.flow_label & 0x000F_FFFF;
        buf.put_u8(0x60 | (self.traffic_class >> 4));
        buf.put_u8(((self.traffic_class & 0x0F) << 4) | ((flow >> 16) as u8));
        buf.put_u16((flow & 0xFFFF) as u16);
        buf.put_u16(u16::try_from(payload_len).unwrap_or(0));
        buf.put_u8(self.next_header.to_u8());
        buf.put_u8(self.hop_limit);
        buf.put_slice(&self.source.octets());
        buf.put_slice(&self.destination.octets());
    }

    /// Parse a header, returning it and the bytes consumed.
    ///
    /// Fails atomically when the version nibble is not 6, the buffer is
    /// shorter than 40 bytes, or the declared payload length exceeds the
    /// bytes actually present.
    pub fn from_wire(buf: &[u8]) -> Result<(Self, usize)> {
        wire::ensure(buf, Self::HEADER_LEN, "IPv6 header")?;
        let version = buf[0] >> 4;
        if version != 6 {
            return Err(Error::format(format!(
                "IPv6 header: version {version}, expected 6"
            )));
        }

        let traffic_class = ((buf[0] & 0x0F) << 4) | (buf[1] >> 4);
        let flow_label = (u32::from(buf[1] & 0x0F) << 16)
            | (u32::from(buf[2]) << 8)
            | u32::from(buf[3]);
        let payload_len = u16::from_be_bytes([buf[4], buf[5]]) as usize;
        let next_header = IpProtocol::from_wire(buf[6])?;
        let hop_limit = buf[7];
        let (source, rest) = wire::read_addr(&buf[8..], "IPv6 source")?;
        let (destination, _) = wire::read_addr(rest, "IPv6 destination")?;

        if buf.len() - Self::HEADER_LEN < payload_len {
            return Err(Error::truncated(
                "IPv6 payload",
                payload_len,
                buf.len() - Self::HEADER_LEN,
            ));
        }

        Ok((
            Ipv6Header {
                traffic_class,
                flow_label,
                next_header,
                hop_limit,
                source,
                destination,
            },
            Self::HEADER_LEN,
        ))
    }
}

impl Default for Ipv6Header {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Ipv6Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IPv6 {} -> {} next={} hop={}",
            self.source, self.destination, self.next_header, self.hop_limit
        )?;
        if self.flow_label != 0 {
            write!(f, " flow=0x{:05x}", self.flow_label)?;
        }
        Ok(())
    }
}
