//! The header stack: an ordered, mutable sequence of decoded headers
//!
//! A `Packet` owns its headers in wire order. Serialization walks the stack
//! and concatenates each header's bytes, writing whatever next-header codes
//! the headers currently carry; parsing walks raw bytes, using each decoded
//! header's code to pick the next decoder until the chain reaches an opaque
//! payload or the no-next-header sentinel.
//!
//! Chaining is explicit: inserting or removing a header does not touch its
//! neighbours' next-header fields. A stack whose codes disagree with its
//! actual layout still serializes; it just won't survive a round-trip.

use std::fmt;

use bytes::{BufMut, BytesMut};
use shunt_core::{Error, Query, Result};

use crate::ethernet::{EtherType, EthernetFrame};
use crate::fragment::FragmentHeader;
use crate::icmpv6::Icmpv6;
use crate::ipv6::Ipv6Header;
use crate::mobility::MobilityHeader;
use crate::options::{DestinationOptions, HopByHopOptions};
use crate::proto::IpProtocol;
use crate::routing::RoutingHeader;

/// One member of a header stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    /// Ethernet II link-layer header
    Ethernet(EthernetFrame),
    /// IPv6 base header
    Ipv6(Ipv6Header),
    /// Hop-by-hop options extension header
    HopByHop(HopByHopOptions),
    /// Destination options extension header
    DestinationOptions(DestinationOptions),
    /// Routing extension header
    Routing(RoutingHeader),
    /// Fragment extension header
    Fragment(FragmentHeader),
    /// Mobility extension header
    Mobility(MobilityHeader),
    /// Explicit chain terminator; encodes to nothing
    NoNextHeader,
    /// ICMPv6 message (opaque leaf)
    Icmpv6(Icmpv6),
    /// Raw bytes this crate does not decode further (opaque leaf)
    Raw(Vec<u8>),
}

/// Discriminant used for type-indexed lookup in a stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderKind {
    /// Ethernet II frame
    Ethernet,
    /// IPv6 base header
    Ipv6,
    /// Hop-by-hop options
    HopByHop,
    /// Destination options
    DestinationOptions,
    /// Routing header
    Routing,
    /// Fragment header
    Fragment,
    /// Mobility header
    Mobility,
    /// No-next-header sentinel
    NoNextHeader,
    /// ICMPv6 message
    Icmpv6,
    /// Raw payload
    Raw,
}

impl Header {
    /// The kind discriminant of this header
    pub fn kind(&self) -> HeaderKind {
        match self {
            Header::Ethernet(_) => HeaderKind::Ethernet,
            Header::Ipv6(_) => HeaderKind::Ipv6,
            Header::HopByHop(_) => HeaderKind::HopByHop,
            Header::DestinationOptions(_) => HeaderKind::DestinationOptions,
            Header::Routing(_) => HeaderKind::Routing,
            Header::Fragment(_) => HeaderKind::Fragment,
            Header::Mobility(_) => HeaderKind::Mobility,
            Header::NoNextHeader => HeaderKind::NoNextHeader,
            Header::Icmpv6(_) => HeaderKind::Icmpv6,
            Header::Raw(_) => HeaderKind::Raw,
        }
    }

    /// The protocol number identifying this header to its predecessor, if it
    /// has one in the IP protocol space
    pub fn protocol_code(&self) -> Option<IpProtocol> {
        match self {
            Header::HopByHop(_) => Some(IpProtocol::HopByHopOptions),
            Header::DestinationOptions(_) => Some(IpProtocol::DestinationOptions),
            Header::Routing(_) => Some(IpProtocol::Routing),
            Header::Fragment(_) => Some(IpProtocol::Fragment),
            Header::Mobility(_) => Some(IpProtocol::Mobility),
            Header::NoNextHeader => Some(IpProtocol::NoNextHeader),
            Header::Icmpv6(_) => Some(IpProtocol::Icmpv6),
            Header::Ethernet(_) | Header::Ipv6(_) | Header::Raw(_) => None,
        }
    }

    /// The next-header code this header currently records, when it chains
    fn chained_protocol(&self) -> Option<IpProtocol> {
        match self {
            Header::Ipv6(h) => Some(h.next_header),
            Header::HopByHop(h) => Some(h.next_header),
            Header::DestinationOptions(h) => Some(h.next_header),
            Header::Routing(h) => Some(h.next_header),
            Header::Fragment(h) => Some(h.next_header),
            Header::Mobility(h) => Some(h.next_header),
            Header::Ethernet(_) | Header::NoNextHeader | Header::Icmpv6(_) | Header::Raw(_) => {
                None
            }
        }
    }

    /// Serialize this header. `trailing_len` is the byte count of everything
    /// that follows it in the stack (length fields that cover the payload
    /// are derived from it).
    fn put_wire(&self, buf: &mut BytesMut, trailing_len: usize) {
        match self {
            Header::Ethernet(h) => h.put_wire(buf),
            Header::Ipv6(h) => h.put_wire(buf, trailing_len),
            Header::HopByHop(h) => h.put_wire(buf),
            Header::DestinationOptions(h) => h.put_wire(buf),
            Header::Routing(h) => h.put_wire(buf),
            Header::Fragment(h) => h.put_wire(buf),
            Header::Mobility(h) => h.put_wire(buf),
            Header::NoNextHeader => {}
            Header::Icmpv6(h) => h.put_wire(buf),
            Header::Raw(data) => buf.put_slice(data),
        }
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Header::Ethernet(h) => write!(f, "{h}"),
            Header::Ipv6(h) => write!(f, "{h}"),
            Header::HopByHop(h) => write!(f, "{h}"),
            Header::DestinationOptions(h) => write!(f, "{h}"),
            Header::Routing(h) => write!(f, "{h}"),
            Header::Fragment(h) => write!(f, "{h}"),
            Header::Mobility(h) => write!(f, "{h}"),
            Header::NoNextHeader => write!(f, "NoNextHeader"),
            Header::Icmpv6(h) => write!(f, "{h}"),
            Header::Raw(data) => write!(f, "Raw({} bytes)", data.len()),
        }
    }
}

/// Resolve a next-header code to the decoder for the following bytes.
///
/// Known extension codes decode their variant; ICMPv6 decodes as an opaque
/// leaf; every other code falls through to a raw leaf that swallows the
/// remaining bytes verbatim. The no-next-header halt is handled by the
/// caller before this table is consulted.
fn decode_chained(proto: IpProtocol, buf: &[u8]) -> Result<(Header, usize)> {
    match proto {
        IpProtocol::HopByHopOptions => {
            HopByHopOptions::from_wire(buf).map(|(h, used)| (Header::HopByHop(h), used))
        }
        IpProtocol::DestinationOptions => {
            DestinationOptions::from_wire(buf).map(|(h, used)| (Header::DestinationOptions(h), used))
        }
        IpProtocol::Routing => {
            RoutingHeader::from_wire(buf).map(|(h, used)| (Header::Routing(h), used))
        }
        IpProtocol::Fragment => {
            FragmentHeader::from_wire(buf).map(|(h, used)| (Header::Fragment(h), used))
        }
        IpProtocol::Mobility => {
            MobilityHeader::from_wire(buf).map(|(h, used)| (Header::Mobility(h), used))
        }
        IpProtocol::Icmpv6 => Icmpv6::from_wire(buf).map(|(h, used)| (Header::Icmpv6(h), used)),
        _ => Ok((Header::Raw(buf.to_vec()), buf.len())),
    }
}

/// An ordered, mutable header stack
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Packet {
    headers: Vec<Header>,
}

impl Packet {
    /// Create an empty stack
    pub fn new() -> Self {
        Packet {
            headers: Vec::new(),
        }
    }

    /// Current header count
    pub fn num_headers(&self) -> usize {
        self.headers.len()
    }

    /// Whether the stack has no headers
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Append a header at the end of the stack
    pub fn push_header(&mut self, header: Header) {
        self.headers.push(header);
    }

    /// Insert `header` before the current occupant of `index`, shifting
    /// later headers up by one. `index == num_headers()` appends.
    pub fn insert_header(&mut self, index: usize, header: Header) -> Result<()> {
        if index > self.headers.len() {
            return Err(Error::IndexOutOfRange {
                index: index as isize,
                len: self.headers.len(),
            });
        }
        self.headers.insert(index, header);
        Ok(())
    }

    /// First position holding a header of `kind`, if any
    pub fn get_header_index(&self, kind: HeaderKind) -> Option<usize> {
        self.headers.iter().position(|h| h.kind() == kind)
    }

    /// Look up a header by scalar index
    pub fn header(&self, query: impl Into<Query>) -> Result<&Header> {
        let at = query.into().resolve(self.headers.len(), "header stack")?;
        Ok(&self.headers[at])
    }

    /// Look up a header by scalar index, mutably
    pub fn header_mut(&mut self, query: impl Into<Query>) -> Result<&mut Header> {
        let at = query.into().resolve(self.headers.len(), "header stack")?;
        Ok(&mut self.headers[at])
    }

    /// Replace the header at `index`
    pub fn set_header(&mut self, index: usize, header: Header) -> Result<()> {
        let at = Query::from(index).resolve(self.headers.len(), "header stack")?;
        self.headers[at] = header;
        Ok(())
    }

    /// Remove and return the header at `index`
    pub fn remove_header(&mut self, index: usize) -> Result<Header> {
        let at = Query::from(index).resolve(self.headers.len(), "header stack")?;
        Ok(self.headers.remove(at))
    }

    /// Iterate over the headers in wire order
    pub fn iter(&self) -> std::slice::Iter<'_, Header> {
        self.headers.iter()
    }

    /// Serialize the stack front-to-back.
    ///
    /// Headers are accumulated back-to-front so length fields covering the
    /// payload (the IPv6 payload-length word) see the bytes that follow
    /// them. Next-header codes are written exactly as the headers carry
    /// them. Misaligned options headers warn and serialize anyway.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut tail: Vec<u8> = Vec::new();
        for header in self.headers.iter().rev() {
            let mut buf = BytesMut::with_capacity(64 + tail.len());
            header.put_wire(&mut buf, tail.len());
            buf.put_slice(&tail);
            tail = buf.to_vec();
        }
        tail
    }

    /// Parse a raw byte buffer into a stack.
    ///
    /// Decoding starts at the Ethernet header and follows the chain: an
    /// IPv6 ethertype continues into the IPv6 header and its extension
    /// chain; anything else becomes a raw payload. The chain stops at the
    /// no-next-header sentinel, at an opaque leaf, or when the bytes run
    /// out. Failures are atomic: no partial stack is returned.
    pub fn from_bytes(raw: &[u8]) -> Result<Packet> {
        let (frame, used) = EthernetFrame::from_wire(raw)?;
        let ethertype = frame.ethertype;
        let mut headers = vec![Header::Ethernet(frame)];
        let rest = &raw[used..];

        if ethertype == EtherType::IPv6 {
            let (ip, used) = Ipv6Header::from_wire(rest)?;
            let mut proto = ip.next_header;
            headers.push(Header::Ipv6(ip));
            let mut cursor = &rest[used..];

            while proto != IpProtocol::NoNextHeader && !cursor.is_empty() {
                let (header, used) = decode_chained(proto, cursor)?;
                let next = header.chained_protocol();
                headers.push(header);
                cursor = &cursor[used..];
                match next {
                    Some(p) => proto = p,
                    None => break,
                }
            }
        } else if !rest.is_empty() {
            headers.push(Header::Raw(rest.to_vec()));
        }

        Ok(Packet { headers })
    }
}

impl From<Vec<Header>> for Packet {
    fn from(headers: Vec<Header>) -> Self {
        Packet { headers }
    }
}

impl<'a> IntoIterator for &'a Packet {
    type Item = &'a Header;
    type IntoIter = std::slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.headers.iter()
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, header) in self.headers.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{header}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ethernet::MacAddress;

    fn two_header_stack() -> Packet {
        let mut pkt = Packet::new();
        pkt.push_header(Header::Ethernet(EthernetFrame::new(
            MacAddress::BROADCAST,
            MacAddress::ZERO,
            EtherType::IPv6,
        )));
        pkt.push_header(Header::Ipv6(Ipv6Header::new()));
        pkt
    }

    #[test]
    fn test_insert_shifts_indices() {
        let mut pkt = two_header_stack();
        pkt.insert_header(1, Header::NoNextHeader).unwrap();
        assert_eq!(pkt.num_headers(), 3);
        assert_eq!(pkt.header(1usize).unwrap().kind(), HeaderKind::NoNextHeader);
        assert_eq!(pkt.header(2usize).unwrap().kind(), HeaderKind::Ipv6);
    }

    #[test]
    fn test_insert_past_end_fails() {
        let mut pkt = two_header_stack();
        let err = pkt.insert_header(5, Header::NoNextHeader).unwrap_err();
        assert_eq!(err, Error::IndexOutOfRange { index: 5, len: 2 });
    }

    #[test]
    fn test_kind_lookup() {
        let pkt = two_header_stack();
        assert_eq!(pkt.get_header_index(HeaderKind::Ipv6), Some(1));
        assert_eq!(pkt.get_header_index(HeaderKind::Fragment), None);
    }

    #[test]
    fn test_stack_index_boundaries() {
        let pkt = two_header_stack();
        assert!(pkt.header(1usize).is_ok());
        assert!(matches!(
            pkt.header(2usize).unwrap_err(),
            Error::IndexOutOfRange { .. }
        ));
        assert!(matches!(
            pkt.header(-1).unwrap_err(),
            Error::IndexOutOfRange { .. }
        ));
        assert!(matches!(pkt.header(0..2).unwrap_err(), Error::Shape(_)));
    }

    #[test]
    fn test_set_and_remove() {
        let mut pkt = two_header_stack();
        pkt.set_header(1, Header::NoNextHeader).unwrap();
        assert_eq!(pkt.header(1usize).unwrap().kind(), HeaderKind::NoNextHeader);

        let removed = pkt.remove_header(1).unwrap();
        assert_eq!(removed.kind(), HeaderKind::NoNextHeader);
        assert_eq!(pkt.num_headers(), 1);

        assert!(pkt.remove_header(1).is_err());
    }

    #[test]
    fn test_non_ipv6_ethertype_is_raw_payload() {
        let mut pkt = Packet::new();
        pkt.push_header(Header::Ethernet(EthernetFrame::new(
            MacAddress::BROADCAST,
            MacAddress::ZERO,
            EtherType::Arp,
        )));
        pkt.push_header(Header::Raw(vec![1, 2, 3, 4]));

        let raw = pkt.to_bytes();
        let parsed = Packet::from_bytes(&raw).unwrap();
        assert_eq!(parsed, pkt);
    }

    #[test]
    fn test_unknown_chained_protocol_is_raw_leaf() {
        let mut pkt = two_header_stack();
        if let Header::Ipv6(ip) = pkt.header_mut(1usize).unwrap() {
            ip.next_header = IpProtocol::Udp;
        }
        pkt.push_header(Header::Raw(vec![0xDE, 0xAD]));

        let raw = pkt.to_bytes();
        let parsed = Packet::from_bytes(&raw).unwrap();
        assert_eq!(parsed, pkt);
        assert_eq!(parsed.header(2usize).unwrap().kind(), HeaderKind::Raw);
    }

    #[test]
    fn test_no_next_header_variant_encodes_to_nothing() {
        let mut pkt = two_header_stack();
        pkt.push_header(Header::NoNextHeader);
        let with_sentinel = pkt.to_bytes();

        pkt.remove_header(2).unwrap();
        assert_eq!(with_sentinel, pkt.to_bytes());
    }

    #[test]
    fn test_protocol_codes() {
        assert_eq!(
            Header::Fragment(FragmentHeader::new(1, 0, false)).protocol_code(),
            Some(IpProtocol::Fragment)
        );
        assert_eq!(
            Header::Icmpv6(Icmpv6::new()).protocol_code(),
            Some(IpProtocol::Icmpv6)
        );
        assert_eq!(Header::Raw(vec![]).protocol_code(), None);
    }
}
