//! IPv6 Routing extension header (type 0, one intermediate address)

use std::fmt;
use std::net::{IpAddr, Ipv6Addr};

use bytes::{BufMut, BytesMut};
use shunt_core::{Error, Result};

use crate::proto::IpProtocol;
use crate::wire;

/// Routing extension header carrying a single intermediate address.
///
/// 24 bytes on the wire: next header, length, routing type, segments left,
/// 4 reserved octets, one 16-byte address. Decode rejects other lengths;
/// multi-address routing headers are not modelled here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingHeader {
    /// Protocol of the following header
    pub next_header: IpProtocol,
    /// Routing type octet
    pub routing_type: u8,
    /// Segments-left counter
    pub segments_left: u8,
    /// The intermediate address
    pub address: Ipv6Addr,
}

impl RoutingHeader {
    /// Fixed header size (24 bytes)
    pub const HEADER_LEN: usize = 24;

    /// Create a type-0 routing header for `address`; the caller wires the
    /// next-header code
    pub fn new(address: Ipv6Addr) -> Self {
        RoutingHeader {
            next_header: IpProtocol::NoNextHeader,
            routing_type: 0,
            segments_left: 1,
            address,
        }
    }

    /// Assign the intermediate address, rejecting non-IPv6 families
    pub fn set_address(&mut self, addr: impl Into<IpAddr>) -> Result<()> {
        self.address = wire::ipv6_field(addr, "routing header address")?;
        Ok(())
    }

    /// Serialize the header into `buf`
    pub fn put_wire(&self, buf: &mut BytesMut) {
        buf.put_u8(self.next_header.to_u8());
        buf.put_u8(2); // two 8-octet units beyond the first
        buf.put_u8(self.routing_type);
        buf.put_u8(self.segments_left);
        buf.put_u32(0);
        buf.put_slice(&self.address.octets());
    }

    /// Parse the header, returning it and the bytes consumed
    pub fn from_wire(buf: &[u8]) -> Result<(Self, usize)> {
        wire::ensure(buf, Self::HEADER_LEN, "routing header")?;
        let next_header = IpProtocol::from_wire(buf[0])?;
        let declared = (buf[1] as usize + 1) * 8;
        if declared != Self::HEADER_LEN {
            return Err(Error::format(format!(
                "routing header: declared {declared} bytes, only the one-address form ({} bytes) is supported",
                Self::HEADER_LEN
            )));
        }
        let routing_type = buf[2];
        let segments_left = buf[3];
        let (address, _) = wire::read_addr(&buf[8..], "routing header address")?;
        Ok((
            RoutingHeader {
                next_header,
                routing_type,
                segments_left,
                address,
            },
            Self::HEADER_LEN,
        ))
    }
}

impl fmt::Display for RoutingHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Routing type={} segs={} via {} next={}",
            self.routing_type, self.segments_left, self.address, self.next_header
        )
    }
}
