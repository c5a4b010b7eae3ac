//! Packet header-stack construction and parsing
//!
//! This crate builds, mutates and byte-serializes protocol header stacks for
//! testing and teaching network software. A stack is an ordered sequence of
//! typed headers chained by next-header codes: each header declares the
//! protocol of the bytes that follow it, and decoding walks the chain until
//! it reaches an opaque payload or the "no next header" sentinel.
//!
//! Supported chain members:
//!
//! - **Ethernet II** frames (opaque link layer, chained by ethertype)
//! - **IPv6** base headers
//! - IPv6 extension headers: **hop-by-hop options**, **destination
//!   options**, **routing**, **fragment**, **mobility**
//! - **ICMPv6** and raw byte payloads as opaque leaves
//!
//! The options-bearing extension headers carry type-length-value records
//! (padding, router alert, tunnel encapsulation limit, home address, jumbo
//! payload) with the standard 8-octet alignment rule. Encoding a misaligned
//! options header emits a warning and returns the bytes unchanged; padding
//! is the caller's responsibility.
//!
//! # Building a stack
//!
//! ```
//! use std::net::Ipv6Addr;
//! use shunt_packet::builder::StackBuilder;
//! use shunt_packet::ethernet::MacAddress;
//!
//! let pkt = StackBuilder::new()
//!     .ethernet(
//!         MacAddress([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]),
//!         MacAddress([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]),
//!     )
//!     .ipv6("fc00::a".parse().unwrap(), "fc00::b".parse().unwrap())
//!     .icmpv6()
//!     .build()
//!     .unwrap();
//!
//! let raw = pkt.to_bytes();
//! let reparsed = shunt_packet::Packet::from_bytes(&raw).unwrap();
//! assert_eq!(pkt, reparsed);
//! ```
//!
//! # Mutating a stack
//!
//! Headers are plain values: look one up by kind, change its fields, and
//! re-serialize. Next-header chaining is explicit: inserting a header does
//! not rewrite its neighbours' codes, the caller does.

pub mod builder;
pub mod ethernet;
pub mod fragment;
pub mod icmpv6;
pub mod ipv6;
pub mod mobility;
pub mod options;
pub mod proto;
pub mod routing;
pub mod stack;
pub mod wire;


// Re-export commonly used types
pub use builder::StackBuilder;
pub use ethernet::{EtherType, EthernetFrame, MacAddress};
pub use fragment::FragmentHeader;
pub use icmpv6::Icmpv6;
pub use ipv6::Ipv6Header;
pub use mobility::MobilityHeader;
pub use options::{DestinationOptions, HopByHopOptions, Ipv6Option, OptionList};
pub use proto::IpProtocol;
pub use stack::{Header, HeaderKind, Packet};

pub use shunt_core::{Error, Query, Result};
