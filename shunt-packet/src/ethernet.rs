//! Ethernet II frame header
//!
//! The link layer is an opaque chain member: the stack reads the 14-byte
//! header, uses the ethertype to pick the next decoder, and otherwise leaves
//! the frame alone. No minimum-frame padding is applied on encode, since it
//! would change the byte stream and break exact re-serialization.

use std::fmt;
use std::str::FromStr;

use bytes::{BufMut, BytesMut};
use shunt_core::{Error, Result};

use crate::wire;

/// Common EtherType values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherType {
    /// IPv4 (0x0800)
    IPv4,
    /// ARP (0x0806)
    Arp,
    /// VLAN-tagged frame (0x8100)
    Vlan,
    /// IPv6 (0x86DD)
    IPv6,
    /// Any other ethertype
    Custom(u16),
}

impl EtherType {
    /// Convert EtherType to its u16 value
    pub fn to_u16(self) -> u16 {
        match self {
            EtherType::IPv4 => 0x0800,
            EtherType::Arp => 0x0806,
            EtherType::Vlan => 0x8100,
            EtherType::IPv6 => 0x86DD,
            EtherType::Custom(val) => val,
        }
    }

    /// Create EtherType from a u16 value
    pub fn from_u16(value: u16) -> Self {
        match value {
            0x0800 => EtherType::IPv4,
            0x0806 => EtherType::Arp,
            0x8100 => EtherType::Vlan,
            0x86DD => EtherType::IPv6,
            val => EtherType::Custom(val),
        }
    }
}

impl fmt::Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtherType::IPv4 => write!(f, "IPv4"),
            EtherType::Arp => write!(f, "ARP"),
            EtherType::Vlan => write!(f, "VLAN"),
            EtherType::IPv6 => write!(f, "IPv6"),
            EtherType::Custom(val) => write!(f, "0x{val:04X}"),
        }
    }
}

/// MAC address (6 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// Broadcast MAC address (FF:FF:FF:FF:FF:FF)
    pub const BROADCAST: MacAddress = MacAddress([0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);

    /// Zero MAC address (00:00:00:00:00:00)
    pub const ZERO: MacAddress = MacAddress([0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);

    /// Create a new MAC address from a byte array
    pub const fn new(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }

    /// Create a MAC address from a slice of exactly 6 bytes
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        if slice.len() != 6 {
            return Err(Error::format(format!(
                "MAC address needs 6 bytes, got {}",
                slice.len()
            )));
        }
        let mut bytes = [0u8; 6];
        bytes.copy_from_slice(slice);
        Ok(MacAddress(bytes))
    }

    /// Get the MAC address as a byte array
    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Check if this is a multicast address (bit 0 of first octet is 1)
    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 == 0x01
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err(Error::format("invalid MAC address format"));
        }
        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            bytes[i] = u8::from_str_radix(part, 16)
                .map_err(|_| Error::format("invalid MAC address hex"))?;
        }
        Ok(MacAddress(bytes))
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }
}

/// Ethernet II frame header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetFrame {
    /// Destination MAC address
    pub destination: MacAddress,
    /// Source MAC address
    pub source: MacAddress,
    /// EtherType of the following header
    pub ethertype: EtherType,
}

impl EthernetFrame {
    /// Header size on the wire (dst + src + type)
    pub const HEADER_LEN: usize = 14;

    /// Create a new Ethernet frame header
    pub fn new(destination: MacAddress, source: MacAddress, ethertype: EtherType) -> Self {
        EthernetFrame {
            destination,
            source,
            ethertype,
        }
    }

    /// Serialize the header into `buf`
    pub fn put_wire(&self, buf: &mut BytesMut) {
        buf.put_slice(self.destination.as_bytes());
        buf.put_slice(self.source.as_bytes());
        buf.put_u16(self.ethertype.to_u16());
    }

    /// Parse a frame header, returning it and the bytes consumed
    pub fn from_wire(buf: &[u8]) -> Result<(Self, usize)> {
        wire::ensure(buf, Self::HEADER_LEN, "Ethernet frame")?;
        let destination = MacAddress::from_slice(&buf[0..6])?;
        let source = MacAddress::from_slice(&buf[6..12])?;
        let ethertype = EtherType::from_u16(u16::from_be_bytes([buf[12], buf[13]]));
        Ok((
            EthernetFrame {
                destination,
                source,
                ethertype,
            },
            Self::HEADER_LEN,
        ))
    }
}

impl fmt::Display for EthernetFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ethernet {} -> {} type={}",
            self.source, self.destination, self.ethertype
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_roundtrip() {
        let frame = EthernetFrame::new(
            MacAddress([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]),
            MacAddress([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]),
            EtherType::IPv6,
        );

        let mut buf = BytesMut::new();
        frame.put_wire(&mut buf);
        assert_eq!(buf.len(), EthernetFrame::HEADER_LEN);
        assert_eq!(&buf[12..14], &[0x86, 0xDD]);

        let (parsed, used) = EthernetFrame::from_wire(&buf).unwrap();
        assert_eq!(used, EthernetFrame::HEADER_LEN);
        assert_eq!(parsed, frame);
    }

    #[test]
    fn test_frame_too_short() {
        let err = EthernetFrame::from_wire(&[0u8; 13]).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_mac_display_and_parse() {
        let mac = MacAddress([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        assert_eq!(mac.to_string(), "00:11:22:33:44:55");
        assert_eq!("00:11:22:33:44:55".parse::<MacAddress>().unwrap(), mac);
        assert!("00:11:22".parse::<MacAddress>().is_err());
    }

    #[test]
    fn test_mac_multicast() {
        assert!(MacAddress::BROADCAST.is_multicast());
        assert!(!MacAddress([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]).is_multicast());
    }

    #[test]
    fn test_unknown_ethertype_preserved() {
        let t = EtherType::from_u16(0x88B5);
        assert_eq!(t, EtherType::Custom(0x88B5));
        assert_eq!(t.to_u16(), 0x88B5);
    }
}
