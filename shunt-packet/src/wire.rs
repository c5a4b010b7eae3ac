//! Big-endian field codec shared by every header
//!
//! Readers take a slice and return the decoded value together with the
//! remaining bytes, so decode loops thread the cursor explicitly. A short
//! buffer is always a `Format` error; nothing is consumed on failure.

use std::net::{IpAddr, Ipv6Addr};

use bytes::BufMut;
use shunt_core::{Error, Result};

/// Fail with a truncation error unless `buf` holds at least `need` bytes.
pub fn ensure(buf: &[u8], need: usize, what: &str) -> Result<()> {
    if buf.len() < need {
        Err(Error::truncated(what, need, buf.len()))
    } else {
        Ok(())
    }
}

/// Read one octet.
pub fn read_u8<'a>(buf: &'a [u8], what: &str) -> Result<(u8, &'a [u8])> {
    ensure(buf, 1, what)?;
    Ok((buf[0], &buf[1..]))
}

/// Read a big-endian u16.
pub fn read_u16<'a>(buf: &'a [u8], what: &str) -> Result<(u16, &'a [u8])> {
    ensure(buf, 2, what)?;
    Ok((u16::from_be_bytes([buf[0], buf[1]]), &buf[2..]))
}

/// Read a big-endian u32.
pub fn read_u32<'a>(buf: &'a [u8], what: &str) -> Result<(u32, &'a [u8])> {
    ensure(buf, 4, what)?;
    Ok((
        u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]),
        &buf[4..],
    ))
}

/// Read a big-endian unsigned integer of `width` bytes, `width <= 8`.
pub fn read_uint<'a>(buf: &'a [u8], width: usize, what: &str) -> Result<(u64, &'a [u8])> {
    debug_assert!(width <= 8);
    ensure(buf, width, what)?;
    let mut value = 0u64;
    for &b in &buf[..width] {
        value = (value << 8) | u64::from(b);
    }
    Ok((value, &buf[width..]))
}

/// Write a big-endian unsigned integer of `width` bytes, `width <= 8`.
pub fn put_uint<B: BufMut>(buf: &mut B, value: u64, width: usize) {
    debug_assert!(width <= 8);
    for i in (0..width).rev() {
        buf.put_u8((value >> (8 * i)) as u8);
    }
}

/// Read a 16-byte IPv6 address.
pub fn read_addr<'a>(buf: &'a [u8], what: &str) -> Result<(Ipv6Addr, &'a [u8])> {
    ensure(buf, 16, what)?;
    let mut octets = [0u8; 16];
    octets.copy_from_slice(&buf[..16]);
    Ok((Ipv6Addr::from(octets), &buf[16..]))
}

/// Accept a value for an IPv6 address field, rejecting other families.
///
/// Raised at assignment time so a wrong-family address never reaches the
/// wire as a truncated or zero-extended 16-byte value.
pub fn ipv6_field(addr: impl Into<IpAddr>, field: &str) -> Result<Ipv6Addr> {
    match addr.into() {
        IpAddr::V6(v6) => Ok(v6),
        IpAddr::V4(v4) => Err(Error::type_mismatch(format!(
            "{field} requires an IPv6 address, got IPv4 {v4}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use std::net::Ipv4Addr;

    #[test]
    fn test_read_fixed_widths() {
        let buf = [0x12, 0x34, 0x56, 0x78, 0x9A];
        let (v, rest) = read_u8(&buf, "t").unwrap();
        assert_eq!(v, 0x12);
        let (v, rest) = read_u16(rest, "t").unwrap();
        assert_eq!(v, 0x3456);
        assert_eq!(rest, &[0x78, 0x9A]);

        let (v, rest) = read_u32(&buf, "t").unwrap();
        assert_eq!(v, 0x12345678);
        assert_eq!(rest, &[0x9A]);
    }

    #[test]
    fn test_read_short_buffer() {
        let err = read_u32(&[0x00, 0x01], "frame").unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_uint_roundtrip() {
        let mut buf = BytesMut::new();
        put_uint(&mut buf, 0x0102_0304_0506, 6);
        assert_eq!(&buf[..], &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);

        let (v, rest) = read_uint(&buf, 6, "t").unwrap();
        assert_eq!(v, 0x0102_0304_0506);
        assert!(rest.is_empty());
    }

    #[test]
    fn test_read_addr() {
        let mut buf = BytesMut::new();
        let addr: Ipv6Addr = "2001:db8::1".parse().unwrap();
        buf.put_slice(&addr.octets());
        let (parsed, rest) = read_addr(&buf, "t").unwrap();
        assert_eq!(parsed, addr);
        assert!(rest.is_empty());
    }

    #[test]
    fn test_ipv6_field_accepts_v6() {
        let addr: Ipv6Addr = "fe80::1".parse().unwrap();
        assert_eq!(ipv6_field(addr, "source").unwrap(), addr);
    }

    #[test]
    fn test_ipv6_field_rejects_v4() {
        let err = ipv6_field(Ipv4Addr::new(10, 0, 0, 1), "destination").unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(_)));
    }
}
