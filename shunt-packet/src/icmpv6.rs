//! ICMPv6 as an opaque chain leaf
//!
//! The stack keeps the four fixed octets apart from the body so tests can
//! poke at them, but interprets nothing further: the body is raw bytes and
//! the checksum is carried verbatim. An ICMPv6 header never chains onward.

use std::fmt;

use bytes::{BufMut, BytesMut};
use shunt_core::Result;

use crate::wire;

/// ICMPv6 echo request type
pub const ICMPV6_ECHO_REQUEST: u8 = 128;

/// ICMPv6 message as an opaque payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icmpv6 {
    /// Message type
    pub icmp_type: u8,
    /// Message code
    pub code: u8,
    /// Checksum field, carried verbatim
    pub checksum: u16,
    /// Everything after the fixed octets
    pub body: Vec<u8>,
}

impl Icmpv6 {
    /// Fixed part of the message (type, code, checksum)
    pub const FIXED_LEN: usize = 4;

    /// Create an echo request with a zeroed identifier/sequence body
    pub fn new() -> Self {
        Icmpv6 {
            icmp_type: ICMPV6_ECHO_REQUEST,
            code: 0,
            checksum: 0,
            body: vec![0; 4],
        }
    }

    /// Encoded size
    pub fn wire_len(&self) -> usize {
        Self::FIXED_LEN + self.body.len()
    }

    /// Serialize the message into `buf`
    pub fn put_wire(&self, buf: &mut BytesMut) {
        buf.put_u8(self.icmp_type);
        buf.put_u8(self.code);
        buf.put_u16(self.checksum);
        buf.put_slice(&self.body);
    }

    /// Parse a message, consuming the whole buffer
    pub fn from_wire(buf: &[u8]) -> Result<(Self, usize)> {
        wire::ensure(buf, Self::FIXED_LEN, "ICMPv6 message")?;
        Ok((
            Icmpv6 {
                icmp_type: buf[0],
                code: buf[1],
                checksum: u16::from_be_bytes([buf[2], buf[3]]),
                body: buf[4..].to_vec(),
            },
            buf.len(),
        ))
    }
}

impl Default for Icmpv6 {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Icmpv6 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ICMPv6 type={} code={} ({} body bytes)",
            self.icmp_type,
            self.code,
            self.body.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let msg = Icmpv6::new();
        let mut buf = BytesMut::new();
        msg.put_wire(&mut buf);
        assert_eq!(buf.len(), 8);

        let (parsed, used) = Icmpv6::from_wire(&buf).unwrap();
        assert_eq!(used, 8);
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_consumes_whole_buffer() {
        let raw = [135u8, 0, 0xAB, 0xCD, 1, 2, 3, 4, 5];
        let (parsed, used) = Icmpv6::from_wire(&raw).unwrap();
        assert_eq!(used, 9);
        assert_eq!(parsed.icmp_type, 135);
        assert_eq!(parsed.checksum, 0xABCD);
        assert_eq!(parsed.body, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_too_short() {
        assert!(Icmpv6::from_wire(&[128, 0, 0]).is_err());
    }
}
