//! IP protocol numbers used for next-header chaining

use std::fmt;

use shunt_core::{Error, Result};

/// IP protocol numbers (IANA assigned)
///
/// This is the enumerated space accepted for a next-header field. The set is
/// closed: a code outside it fails `try_from_u8`, so an undefined number can
/// never be assigned into a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpProtocol {
    /// IPv6 Hop-by-Hop Options (0)
    HopByHopOptions,
    /// ICMP (1)
    Icmp,
    /// IGMP (2)
    Igmp,
    /// IPv4 encapsulation (4)
    Ipv4,
    /// TCP (6)
    Tcp,
    /// UDP (17)
    Udp,
    /// IPv6 encapsulation (41)
    Ipv6,
    /// IPv6 Routing Header (43)
    Routing,
    /// IPv6 Fragment Header (44)
    Fragment,
    /// GRE (47)
    Gre,
    /// ESP (50)
    Esp,
    /// AH (51)
    Ah,
    /// ICMPv6 (58)
    Icmpv6,
    /// IPv6 No Next Header (59)
    NoNextHeader,
    /// IPv6 Destination Options (60)
    DestinationOptions,
    /// EIGRP (88)
    Eigrp,
    /// OSPF (89)
    Ospf,
    /// SCTP (132)
    Sctp,
    /// IPv6 Mobility Header (135)
    Mobility,
}

impl IpProtocol {
    /// Convert to the wire octet
    pub fn to_u8(self) -> u8 {
        match self {
            IpProtocol::HopByHopOptions => 0,
            IpProtocol::Icmp => 1,
            IpProtocol::Igmp => 2,
            IpProtocol::Ipv4 => 4,
            IpProtocol::Tcp => 6,
            IpProtocol::Udp => 17,
            IpProtocol::Ipv6 => 41,
            IpProtocol::Routing => 43,
            IpProtocol::Fragment => 44,
            IpProtocol::Gre => 47,
            IpProtocol::Esp => 50,
            IpProtocol::Ah => 51,
            IpProtocol::Icmpv6 => 58,
            IpProtocol::NoNextHeader => 59,
            IpProtocol::DestinationOptions => 60,
            IpProtocol::Eigrp => 88,
            IpProtocol::Ospf => 89,
            IpProtocol::Sctp => 132,
            IpProtocol::Mobility => 135,
        }
    }

    /// Look up a protocol number assigned by the caller.
    ///
    /// Fails with an enum-value error for codes outside the defined space,
    /// so bad assignments surface immediately rather than at encode time.
    pub fn try_from_u8(value: u8) -> Result<Self> {
        Self::lookup(value).ok_or(Error::EnumValue {
            field: "IP protocol number",
            value,
        })
    }

    /// Decode a protocol number read from the wire.
    ///
    /// Same table as [`try_from_u8`](Self::try_from_u8) but fails with a
    /// format error, since a bad octet here means malformed input bytes.
    pub fn from_wire(value: u8) -> Result<Self> {
        Self::lookup(value)
            .ok_or_else(|| Error::format(format!("unknown IP protocol number 0x{value:02x}")))
    }

    fn lookup(value: u8) -> Option<Self> {
        match value {
            0 => Some(IpProtocol::HopByHopOptions),
            1 => Some(IpProtocol::Icmp),
            2 => Some(IpProtocol::Igmp),
            4 => Some(IpProtocol::Ipv4),
            6 => Some(IpProtocol::Tcp),
            17 => Some(IpProtocol::Udp),
            41 => Some(IpProtocol::Ipv6),
            43 => Some(IpProtocol::Routing),
            44 => Some(IpProtocol::Fragment),
            47 => Some(IpProtocol::Gre),
            50 => Some(IpProtocol::Esp),
            51 => Some(IpProtocol::Ah),
            58 => Some(IpProtocol::Icmpv6),
            59 => Some(IpProtocol::NoNextHeader),
            60 => Some(IpProtocol::DestinationOptions),
            88 => Some(IpProtocol::Eigrp),
            89 => Some(IpProtocol::Ospf),
            132 => Some(IpProtocol::Sctp),
            135 => Some(IpProtocol::Mobility),
            _ => None,
        }
    }

    /// Whether this code names an IPv6 extension header the chain resolver
    /// decodes further
    pub fn is_extension(self) -> bool {
        matches!(
            self,
            IpProtocol::HopByHopOptions
                | IpProtocol::Routing
                | IpProtocol::Fragment
                | IpProtocol::DestinationOptions
                | IpProtocol::Mobility
        )
    }
}

impl fmt::Display for IpProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IpProtocol::HopByHopOptions => "HopByHop",
            IpProtocol::Icmp => "ICMP",
            IpProtocol::Igmp => "IGMP",
            IpProtocol::Ipv4 => "IPv4",
            IpProtocol::Tcp => "TCP",
            IpProtocol::Udp => "UDP",
            IpProtocol::Ipv6 => "IPv6",
            IpProtocol::Routing => "Routing",
            IpProtocol::Fragment => "Fragment",
            IpProtocol::Gre => "GRE",
            IpProtocol::Esp => "ESP",
            IpProtocol::Ah => "AH",
            IpProtocol::Icmpv6 => "ICMPv6",
            IpProtocol::NoNextHeader => "NoNextHeader",
            IpProtocol::DestinationOptions => "DestOptions",
            IpProtocol::Eigrp => "EIGRP",
            IpProtocol::Ospf => "OSPF",
            IpProtocol::Sctp => "SCTP",
            IpProtocol::Mobility => "Mobility",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_roundtrip() {
        for proto in [
            IpProtocol::HopByHopOptions,
            IpProtocol::Tcp,
            IpProtocol::Udp,
            IpProtocol::Routing,
            IpProtocol::Fragment,
            IpProtocol::Icmpv6,
            IpProtocol::NoNextHeader,
            IpProtocol::DestinationOptions,
            IpProtocol::Mobility,
        ] {
            assert_eq!(IpProtocol::try_from_u8(proto.to_u8()).unwrap(), proto);
        }
    }

    #[test]
    fn test_undefined_code_rejected() {
        let err = IpProtocol::try_from_u8(0xff).unwrap_err();
        assert_eq!(
            err,
            Error::EnumValue {
                field: "IP protocol number",
                value: 0xff
            }
        );
    }

    #[test]
    fn test_wire_decode_undefined_is_format() {
        assert!(matches!(
            IpProtocol::from_wire(0xfe).unwrap_err(),
            Error::Format(_)
        ));
    }

    #[test]
    fn test_extension_set() {
        assert!(IpProtocol::HopByHopOptions.is_extension());
        assert!(IpProtocol::Mobility.is_extension());
        assert!(!IpProtocol::Tcp.is_extension());
        assert!(!IpProtocol::NoNextHeader.is_extension());
        assert!(!IpProtocol::Icmpv6.is_extension());
    }
}
