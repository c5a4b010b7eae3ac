//! Fluent construction of header stacks
//!
//! The builder is the one convenience layer that wires chaining for you: at
//! `build()` time the ethertype and every next-header code are set from the
//! header that actually follows. Stacks assembled by hand through
//! [`Packet`] keep chaining fully explicit instead.

use std::net::Ipv6Addr;

use shunt_core::{Error, Result};

use crate::ethernet::{EtherType, EthernetFrame, MacAddress};
use crate::fragment::FragmentHeader;
use crate::icmpv6::Icmpv6;
use crate::ipv6::Ipv6Header;
use crate::mobility::MobilityHeader;
use crate::options::{DestinationOptions, HopByHopOptions, Ipv6Option};
use crate::routing::RoutingHeader;
use crate::stack::{Header, Packet};

/// Stack builder with a fluent API
///
/// # Examples
///
/// ```
/// use shunt_packet::builder::StackBuilder;
/// use shunt_packet::ethernet::MacAddress;
/// use shunt_packet::options::Ipv6Option;
///
/// let pkt = StackBuilder::new()
///     .ethernet(
///         MacAddress([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]),
///         MacAddress([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]),
///     )
///     .ipv6("fc00::a".parse().unwrap(), "fc00::b".parse().unwrap())
///     .hop_by_hop([Ipv6Option::RouterAlert(0), Ipv6Option::PadN(2)])
///     .icmpv6()
///     .build()
///     .unwrap();
///
/// assert_eq!(pkt.num_headers(), 4);
/// ```
#[derive(Debug, Default)]
pub struct StackBuilder {
    headers: Vec<Header>,
}

impl StackBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        StackBuilder {
            headers: Vec::new(),
        }
    }

    /// Add the Ethernet layer. The ethertype is wired at build time.
    pub fn ethernet(mut self, src: MacAddress, dst: MacAddress) -> Self {
        self.headers
            .push(Header::Ethernet(EthernetFrame::new(dst, src, EtherType::IPv6)));
        self
    }

    /// Add an IPv6 layer
    pub fn ipv6(mut self, src: Ipv6Addr, dst: Ipv6Addr) -> Self {
        let mut hdr = Ipv6Header::new();
        hdr.source = src;
        hdr.destination = dst;
        self.headers.push(Header::Ipv6(hdr));
        self
    }

    /// Set the hop limit of the most recent IPv6 layer
    ///
    /// Must be called after `ipv6()`.
    pub fn hop_limit(mut self, hop_limit: u8) -> Self {
        if let Some(Header::Ipv6(hdr)) = self
            .headers
            .iter_mut()
            .rev()
            .find(|h| matches!(h, Header::Ipv6(_)))
        {
            hdr.hop_limit = hop_limit;
        }
        self
    }

    /// Add a hop-by-hop options extension header
    pub fn hop_by_hop(mut self, options: impl IntoIterator<Item = Ipv6Option>) -> Self {
        let mut hdr = HopByHopOptions::new();
        for opt in options {
            hdr.add_option(opt);
        }
        self.headers.push(Header::HopByHop(hdr));
        self
    }

    /// Add a destination options extension header
    pub fn destination_options(mut self, options: impl IntoIterator<Item = Ipv6Option>) -> Self {
        let mut hdr = DestinationOptions::new();
        for opt in options {
            hdr.add_option(opt);
        }
        self.headers.push(Header::DestinationOptions(hdr));
        self
    }

    /// Add a routing extension header
    pub fn routing(mut self, address: Ipv6Addr) -> Self {
        self.headers.push(Header::Routing(RoutingHeader::new(address)));
        self
    }

    /// Add a fragment extension header
    pub fn fragment(mut self, identification: u32, offset: u16, more_fragments: bool) -> Self {
        self.headers.push(Header::Fragment(FragmentHeader::new(
            identification,
            offset,
            more_fragments,
        )));
        self
    }

    /// Add a mobility extension header
    pub fn mobility(mut self) -> Self {
        self.headers.push(Header::Mobility(MobilityHeader::new()));
        self
    }

    /// Add a default ICMPv6 echo request payload
    pub fn icmpv6(mut self) -> Self {
        self.headers.push(Header::Icmpv6(Icmpv6::new()));
        self
    }

    /// Add a raw byte payload
    pub fn payload(mut self, data: Vec<u8>) -> Self {
        self.headers.push(Header::Raw(data));
        self
    }

    /// Assemble the stack, wiring the ethertype and next-header codes.
    ///
    /// # Errors
    ///
    /// Returns a construction error if the stack does not start with an
    /// Ethernet header, or if an IPv6 extension header or ICMPv6 payload
    /// appears before any IPv6 layer.
    pub fn build(mut self) -> Result<Packet> {
        if !matches!(self.headers.first(), Some(Header::Ethernet(_))) {
            return Err(Error::construction("stack must start with an Ethernet header"));
        }

        let mut seen_ipv6 = false;
        for header in &self.headers {
            match header {
                Header::Ipv6(_) => seen_ipv6 = true,
                Header::HopByHop(_)
                | Header::DestinationOptions(_)
                | Header::Routing(_)
                | Header::Fragment(_)
                | Header::Mobility(_)
                | Header::Icmpv6(_) => {
                    if !seen_ipv6 {
                        return Err(Error::construction(format!(
                            "{:?} requires a preceding IPv6 layer",
                            header.kind()
                        )));
                    }
                }
                _ => {}
            }
        }

        // Each link records the code of the header that follows it.
        let next_codes: Vec<_> = (0..self.headers.len())
            .map(|i| self.headers.get(i + 1).and_then(Header::protocol_code))
            .collect();
        let next_is_ipv6: Vec<_> = (0..self.headers.len())
            .map(|i| matches!(self.headers.get(i + 1), Some(Header::Ipv6(_))))
            .collect();

        for (i, header) in self.headers.iter_mut().enumerate() {
            match header {
                Header::Ethernet(frame) => {
                    if next_is_ipv6[i] {
                        frame.ethertype = EtherType::IPv6;
                    }
                }
                Header::Ipv6(hdr) => {
                    if let Some(code) = next_codes[i] {
                        hdr.next_header = code;
                    }
                }
                Header::HopByHop(hdr) => {
                    if let Some(code) = next_codes[i] {
                        hdr.next_header = code;
                    }
                }
                Header::DestinationOptions(hdr) => {
                    if let Some(code) = next_codes[i] {
                        hdr.next_header = code;
                    }
                }
                Header::Routing(hdr) => {
                    if let Some(code) = next_codes[i] {
                        hdr.next_header = code;
                    }
                }
                Header::Fragment(hdr) => {
                    if let Some(code) = next_codes[i] {
                        hdr.next_header = code;
                    }
                }
                Header::Mobility(hdr) => {
                    if let Some(code) = next_codes[i] {
                        hdr.next_header = code;
                    }
                }
                _ => {}
            }
        }

        Ok(Packet::from(self.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::IpProtocol;
    use crate::stack::HeaderKind;

    fn macs() -> (MacAddress, MacAddress) {
        (
            MacAddress([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]),
            MacAddress([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]),
        )
    }

    #[test]
    fn test_builder_wires_chain() {
        let (src, dst) = macs();
        let pkt = StackBuilder::new()
            .ethernet(src, dst)
            .ipv6("fc00::a".parse().unwrap(), "fc00::b".parse().unwrap())
            .fragment(7, 0, true)
            .icmpv6()
            .build()
            .unwrap();

        assert_eq!(pkt.num_headers(), 4);
        match pkt.header(1usize).unwrap() {
            Header::Ipv6(ip) => assert_eq!(ip.next_header, IpProtocol::Fragment),
            other => panic!("expected IPv6, got {other}"),
        }
        match pkt.header(2usize).unwrap() {
            Header::Fragment(frag) => assert_eq!(frag.next_header, IpProtocol::Icmpv6),
            other => panic!("expected fragment, got {other}"),
        }
    }

    #[test]
    fn test_built_stack_roundtrips() {
        let (src, dst) = macs();
        let pkt = StackBuilder::new()
            .ethernet(src, dst)
            .ipv6("fc00::a".parse().unwrap(), "fc00::b".parse().unwrap())
            .hop_limit(255)
            .hop_by_hop([Ipv6Option::RouterAlert(0), Ipv6Option::PadN(2)])
            .icmpv6()
            .build()
            .unwrap();

        let parsed = Packet::from_bytes(&pkt.to_bytes()).unwrap();
        assert_eq!(parsed, pkt);
    }

    #[test]
    fn test_missing_link_layer() {
        let err = StackBuilder::new()
            .ipv6("::1".parse().unwrap(), "::2".parse().unwrap())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Construction(_)));
    }

    #[test]
    fn test_extension_without_ipv6() {
        let (src, dst) = macs();
        let err = StackBuilder::new()
            .ethernet(src, dst)
            .fragment(1, 0, false)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Construction(_)));
    }

    #[test]
    fn test_terminal_ipv6_defaults_to_no_next() {
        let (src, dst) = macs();
        let pkt = StackBuilder::new()
            .ethernet(src, dst)
            .ipv6("fc00::a".parse().unwrap(), "fc00::b".parse().unwrap())
            .build()
            .unwrap();

        assert_eq!(pkt.get_header_index(HeaderKind::Ipv6), Some(1));
        match pkt.header(1usize).unwrap() {
            Header::Ipv6(ip) => assert_eq!(ip.next_header, IpProtocol::NoNextHeader),
            other => panic!("expected IPv6, got {other}"),
        }
    }
}
