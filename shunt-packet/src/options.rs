//! TLV options and the options-bearing extension headers
//!
//! Hop-by-hop and destination options share one wire format: a 2-byte fixed
//! prefix (next header, length in 8-octet units minus one) followed by a run
//! of type-length-value records. The total must be a multiple of 8 octets;
//! encode validates and warns but never inserts padding itself; the caller
//! appends `Pad1`/`PadN` records until the header lines up.

use std::fmt;
use std::net::{IpAddr, Ipv6Addr};

use bytes::{BufMut, BytesMut};
use shunt_core::{Error, Query, Result};
use tracing::warn;

use crate::proto::IpProtocol;
use crate::wire;

/// Pad1 option type
pub const OPT_PAD1: u8 = 0x00;
/// PadN option type
pub const OPT_PADN: u8 = 0x01;
/// Tunnel Encapsulation Limit option type (RFC 2473)
pub const OPT_TUNNEL_ENCAP_LIMIT: u8 = 0x04;
/// Router Alert option type (RFC 2711)
pub const OPT_ROUTER_ALERT: u8 = 0x05;
/// Jumbo Payload option type (RFC 2675)
pub const OPT_JUMBO_PAYLOAD: u8 = 0xC2;
/// Home Address option type (RFC 6275)
pub const OPT_HOME_ADDRESS: u8 = 0xC9;

/// A single type-length-value option record.
///
/// Unknown option types survive decode as [`Ipv6Option::Unknown`] so a
/// re-encode reproduces the original bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ipv6Option {
    /// One octet of padding (no length or value on the wire)
    Pad1,
    /// `n` octets of padding in one record, `n >= 2`
    PadN(u8),
    /// Router alert value (2 bytes)
    RouterAlert(u16),
    /// Tunnel encapsulation limit (1 byte)
    TunnelEncapsulationLimit(u8),
    /// Home address (16 bytes)
    HomeAddress(Ipv6Addr),
    /// Jumbo payload length (4 bytes, payloads up to 2^32 - 1)
    JumboPayload(u32),
    /// Any option type this crate does not interpret
    Unknown {
        /// Option type octet
        kind: u8,
        /// Raw value bytes
        data: Vec<u8>,
    },
}

impl Ipv6Option {
    /// Build a home-address option, rejecting non-IPv6 families
    pub fn home_address(addr: impl Into<IpAddr>) -> Result<Self> {
        Ok(Ipv6Option::HomeAddress(wire::ipv6_field(
            addr,
            "home address option",
        )?))
    }

    /// The option type octet
    pub fn kind(&self) -> u8 {
        match self {
            Ipv6Option::Pad1 => OPT_PAD1,
            Ipv6Option::PadN(_) => OPT_PADN,
            Ipv6Option::RouterAlert(_) => OPT_ROUTER_ALERT,
            Ipv6Option::TunnelEncapsulationLimit(_) => OPT_TUNNEL_ENCAP_LIMIT,
            Ipv6Option::HomeAddress(_) => OPT_HOME_ADDRESS,
            Ipv6Option::JumboPayload(_) => OPT_JUMBO_PAYLOAD,
            Ipv6Option::Unknown { kind, .. } => *kind,
        }
    }

    /// Full footprint of the record on the wire, type and length octets
    /// included
    pub fn wire_len(&self) -> usize {
        match self {
            Ipv6Option::Pad1 => 1,
            Ipv6Option::PadN(n) => (*n).max(2) as usize,
            Ipv6Option::RouterAlert(_) => 4,
            Ipv6Option::TunnelEncapsulationLimit(_) => 3,
            Ipv6Option::HomeAddress(_) => 18,
            Ipv6Option::JumboPayload(_) => 6,
            Ipv6Option::Unknown { data, .. } => 2 + data.len(),
        }
    }

    /// Serialize the record into `buf`
    pub fn put_wire(&self, buf: &mut BytesMut) {
        match self {
            Ipv6Option::Pad1 => buf.put_u8(OPT_PAD1),
            Ipv6Option::PadN(n) => {
                let value_len = (*n).max(2) - 2;
                buf.put_u8(OPT_PADN);
                buf.put_u8(value_len);
                buf.put_bytes(0, value_len as usize);
            }
            Ipv6Option::RouterAlert(value) => {
                buf.put_u8(OPT_ROUTER_ALERT);
                buf.put_u8(2);
                buf.put_u16(*value);
            }
            Ipv6Option::TunnelEncapsulationLimit(limit) => {
                buf.put_u8(OPT_TUNNEL_ENCAP_LIMIT);
                buf.put_u8(1);
                buf.put_u8(*limit);
            }
            Ipv6Option::HomeAddress(addr) => {
                buf.put_u8(OPT_HOME_ADDRESS);
                buf.put_u8(16);
                buf.put_slice(&addr.octets());
            }
            Ipv6Option::JumboPayload(len) => {
                buf.put_u8(OPT_JUMBO_PAYLOAD);
                buf.put_u8(4);
                buf.put_u32(*len);
            }
            Ipv6Option::Unknown { kind, data } => {
                buf.put_u8(*kind);
                buf.put_u8(data.len() as u8);
                buf.put_slice(data);
            }
        }
    }

    /// Parse one record, returning it and the bytes consumed.
    ///
    /// Known option types are checked against their fixed value widths;
    /// a mismatch is a format error, not a silently reinterpreted record.
    pub fn from_wire(buf: &[u8]) -> Result<(Self, usize)> {
        let (kind, rest) = wire::read_u8(buf, "option type")?;
        if kind == OPT_PAD1 {
            return Ok((Ipv6Option::Pad1, 1));
        }
        let (len, rest) = wire::read_u8(rest, "option length")?;
        let len = len as usize;
        wire::ensure(rest, len, "option value")?;
        let value = &rest[..len];
        let consumed = 2 + len;

        let opt = match kind {
            // total footprint must fit the u8; oversize pads survive as raw
            OPT_PADN if len <= 253 => Ipv6Option::PadN((2 + len) as u8),
            OPT_ROUTER_ALERT => {
                Self::expect_len(kind, len, 2)?;
                Ipv6Option::RouterAlert(u16::from_be_bytes([value[0], value[1]]))
            }
            OPT_TUNNEL_ENCAP_LIMIT => {
                Self::expect_len(kind, len, 1)?;
                Ipv6Option::TunnelEncapsulationLimit(value[0])
            }
            OPT_HOME_ADDRESS => {
                Self::expect_len(kind, len, 16)?;
                let (addr, _) = wire::read_addr(value, "home address option")?;
                Ipv6Option::HomeAddress(addr)
            }
            OPT_JUMBO_PAYLOAD => {
                Self::expect_len(kind, len, 4)?;
                Ipv6Option::JumboPayload(u32::from_be_bytes([
                    value[0], value[1], value[2], value[3],
                ]))
            }
            _ => Ipv6Option::Unknown {
                kind,
                data: value.to_vec(),
            },
        };
        Ok((opt, consumed))
    }

    fn expect_len(kind: u8, got: usize, want: usize) -> Result<()> {
        if got != want {
            Err(Error::format(format!(
                "option 0x{kind:02x}: declared length {got}, expected {want}"
            )))
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for Ipv6Option {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ipv6Option::Pad1 => write!(f, "Pad1"),
            Ipv6Option::PadN(n) => write!(f, "PadN({n})"),
            Ipv6Option::RouterAlert(v) => write!(f, "RouterAlert(0x{v:04x})"),
            Ipv6Option::TunnelEncapsulationLimit(v) => write!(f, "TunnelEncapLimit({v})"),
            Ipv6Option::HomeAddress(a) => write!(f, "HomeAddress({a})"),
            Ipv6Option::JumboPayload(v) => write!(f, "JumboPayload({v})"),
            Ipv6Option::Unknown { kind, data } => {
                write!(f, "Unknown(0x{kind:02x}, {} bytes)", data.len())
            }
        }
    }
}

/// Ordered option list owned by one extension header.
///
/// `len()` counts records, not bytes. Indexed access is fallible: scalar
/// indexes past the end (or negative) are a range error, span queries a
/// shape error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionList {
    items: Vec<Ipv6Option>,
}

impl OptionList {
    /// Create an empty list
    pub fn new() -> Self {
        OptionList { items: Vec::new() }
    }

    /// Append an option
    pub fn push(&mut self, option: Ipv6Option) {
        self.items.push(option);
    }

    /// Number of options in the list
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list has no options
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up an option by scalar index
    pub fn get(&self, query: impl Into<Query>) -> Result<&Ipv6Option> {
        let at = query.into().resolve(self.items.len(), "option list")?;
        Ok(&self.items[at])
    }

    /// Look up an option by scalar index, mutably
    pub fn get_mut(&mut self, query: impl Into<Query>) -> Result<&mut Ipv6Option> {
        let at = query.into().resolve(self.items.len(), "option list")?;
        Ok(&mut self.items[at])
    }

    /// Iterate over the options in order
    pub fn iter(&self) -> std::slice::Iter<'_, Ipv6Option> {
        self.items.iter()
    }

    /// Total wire footprint of all records
    pub fn wire_len(&self) -> usize {
        self.items.iter().map(Ipv6Option::wire_len).sum()
    }

    fn put_wire(&self, buf: &mut BytesMut) {
        for option in &self.items {
            option.put_wire(buf);
        }
    }

    /// Parse records until `buf` is exhausted
    fn from_wire(mut buf: &[u8]) -> Result<Self> {
        let mut items = Vec::new();
        while !buf.is_empty() {
            let (option, used) = Ipv6Option::from_wire(buf)?;
            items.push(option);
            buf = &buf[used..];
        }
        Ok(OptionList { items })
    }
}

impl<'a> IntoIterator for &'a OptionList {
    type Item = &'a Ipv6Option;
    type IntoIter = std::slice::Iter<'a, Ipv6Option>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Encoded size of an options header: fixed prefix plus records
fn option_header_len(options: &OptionList) -> usize {
    2 + options.wire_len()
}

/// Serialize an options header.
///
/// When the total is not a multiple of 8 octets a single warning is emitted
/// and the misaligned bytes are returned anyway; the caller owns padding.
fn put_option_header(
    label: &str,
    next_header: IpProtocol,
    options: &OptionList,
    buf: &mut BytesMut,
) {
    let total = option_header_len(options);
    if total % 8 != 0 {
        warn!(
            header = label,
            length = total,
            "{label} header length {total} is not an even multiple of 8"
        );
    }
    let ext_len = total.div_ceil(8).saturating_sub(1);
    buf.put_u8(next_header.to_u8());
    buf.put_u8(ext_len as u8);
    options.put_wire(buf);
}

/// Parse an options header, returning the next-header code, the option list
/// and the bytes consumed
fn read_option_header(buf: &[u8], label: &str) -> Result<(IpProtocol, OptionList, usize)> {
    wire::ensure(buf, 2, label)?;
    let next_header = IpProtocol::from_wire(buf[0])?;
    let total = (buf[1] as usize + 1) * 8;
    wire::ensure(buf, total, label)?;
    let options = OptionList::from_wire(&buf[2..total])?;
    Ok((next_header, options, total))
}

/// Hop-by-Hop Options extension header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopByHopOptions {
    /// Protocol of the following header
    pub next_header: IpProtocol,
    /// Options carried by this header
    pub options: OptionList,
}

/// Destination Options extension header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationOptions {
    /// Protocol of the following header
    pub next_header: IpProtocol,
    /// Options carried by this header
    pub options: OptionList,
}

macro_rules! option_header_impl {
    ($name:ident, $label:literal) => {
        impl $name {
            /// Create an empty header; the caller appends options and wires
            /// the next-header code
            pub fn new() -> Self {
                $name {
                    next_header: IpProtocol::NoNextHeader,
                    options: OptionList::new(),
                }
            }

            /// Append an option
            pub fn add_option(&mut self, option: Ipv6Option) {
                self.options.push(option);
            }

            /// Look up an option by scalar index
            pub fn option(&self, query: impl Into<Query>) -> Result<&Ipv6Option> {
                self.options.get(query)
            }

            /// Number of options carried (not bytes)
            pub fn num_options(&self) -> usize {
                self.options.len()
            }

            /// Encoded size including the fixed prefix
            pub fn wire_len(&self) -> usize {
                option_header_len(&self.options)
            }

            /// Serialize the header into `buf`
            pub fn put_wire(&self, buf: &mut BytesMut) {
                put_option_header($label, self.next_header, &self.options, buf);
            }

            /// Parse the header, returning it and the bytes consumed
            pub fn from_wire(buf: &[u8]) -> Result<(Self, usize)> {
                let (next_header, options, used) = read_option_header(buf, $label)?;
                Ok((
                    $name {
                        next_header,
                        options,
                    },
                    used,
                ))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} next={} [", $label, self.next_header)?;
                for (i, opt) in self.options.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{opt}")?;
                }
                write!(f, "]")
            }
        }
    };
}

option_header_impl!(HopByHopOptions, "hop-by-hop options");
option_header_impl!(DestinationOptions, "destination options");

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(opt: &Ipv6Option) -> Vec<u8> {
        let mut buf = BytesMut::new();
        opt.put_wire(&mut buf);
        buf.to_vec()
    }

    #[test]
    fn test_pad1_single_octet() {
        assert_eq!(encode(&Ipv6Option::Pad1), vec![0x00]);
    }

    #[test]
    fn test_padn_footprint() {
        let raw = encode(&Ipv6Option::PadN(5));
        assert_eq!(raw, vec![0x01, 0x03, 0x00, 0x00, 0x00]);
        assert_eq!(Ipv6Option::PadN(5).wire_len(), 5);

        let (parsed, used) = Ipv6Option::from_wire(&raw).unwrap();
        assert_eq!(parsed, Ipv6Option::PadN(5));
        assert_eq!(used, 5);
    }

    #[test]
    fn test_router_alert_layout() {
        let raw = encode(&Ipv6Option::RouterAlert(0x13));
        assert_eq!(raw, vec![0x05, 0x02, 0x00, 0x13]);
    }

    #[test]
    fn test_jumbo_payload_roundtrip() {
        let raw = encode(&Ipv6Option::JumboPayload(100_000));
        let (parsed, used) = Ipv6Option::from_wire(&raw).unwrap();
        assert_eq!(parsed, Ipv6Option::JumboPayload(100_000));
        assert_eq!(used, 6);
    }

    #[test]
    fn test_home_address_family_check() {
        use std::net::Ipv4Addr;
        let err = Ipv6Option::home_address(Ipv4Addr::new(10, 0, 0, 1)).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(_)));
    }

    #[test]
    fn test_unknown_option_preserved() {
        let raw = [0x7B, 0x03, 0xDE, 0xAD, 0xBE];
        let (parsed, used) = Ipv6Option::from_wire(&raw).unwrap();
        assert_eq!(used, 5);
        assert_eq!(
            parsed,
            Ipv6Option::Unknown {
                kind: 0x7B,
                data: vec![0xDE, 0xAD, 0xBE],
            }
        );
        assert_eq!(encode(&parsed), raw.to_vec());
    }

    #[test]
    fn test_truncated_option_value() {
        let err = Ipv6Option::from_wire(&[0x05, 0x02, 0x00]).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_bad_declared_width() {
        // router alert with a 3-byte value is malformed
        let err = Ipv6Option::from_wire(&[0x05, 0x03, 0x00, 0x13, 0x00]).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_list_counts_options_not_bytes() {
        let mut list = OptionList::new();
        list.push(Ipv6Option::home_address("fc00::2".parse::<Ipv6Addr>().unwrap()).unwrap());
        list.push(Ipv6Option::PadN(4));
        assert_eq!(list.len(), 2);
        assert_eq!(list.wire_len(), 22);
    }

    #[test]
    fn test_list_index_boundaries() {
        let mut list = OptionList::new();
        list.push(Ipv6Option::Pad1);
        assert!(list.get(0usize).is_ok());
        assert!(matches!(
            list.get(1usize).unwrap_err(),
            Error::IndexOutOfRange { .. }
        ));
        assert!(matches!(
            list.get(-1).unwrap_err(),
            Error::IndexOutOfRange { .. }
        ));
        assert!(matches!(list.get(0..1).unwrap_err(), Error::Shape(_)));
    }

    #[test]
    fn test_option_header_roundtrip() {
        let mut hdr = HopByHopOptions::new();
        hdr.next_header = IpProtocol::Icmpv6;
        hdr.add_option(Ipv6Option::RouterAlert(0x13));
        hdr.add_option(Ipv6Option::PadN(2));
        assert_eq!(hdr.wire_len(), 8);

        let mut buf = BytesMut::new();
        hdr.put_wire(&mut buf);
        assert_eq!(buf.len(), 8);
        assert_eq!(buf[1], 0); // one 8-octet unit

        let (parsed, used) = HopByHopOptions::from_wire(&buf).unwrap();
        assert_eq!(used, 8);
        assert_eq!(parsed, hdr);
    }

    #[test]
    fn test_option_header_declared_longer_than_buffer() {
        // ext-len claims 16 octets, only 8 present
        let raw = [58, 1, 0x01, 0x04, 0, 0, 0, 0];
        let err = DestinationOptions::from_wire(&raw).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }
}
