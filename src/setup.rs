// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The USB SETUP packet and the pieces of its `bmRequestType` field.

use byteorder::LittleEndian;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use zerocopy::{AsBytes, FromBytes, LayoutVerified, Unaligned, U16};

/// USB deals in two different transfer directions, called OUT
/// (host-to-device) and IN (device-to-host). OUT is represented by a 0 bit
/// in the top of `bmRequestType`, IN by a 1.
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
pub enum UsbDir {
    Out = 0,
    In = 0x80,
}

impl UsbDir {
    pub const fn of_request_type(request_type: u8) -> Self {
        if request_type & Self::In as u8 != 0 {
            Self::In
        } else {
            Self::Out
        }
    }
}

/// Bits 5..=6 of `bmRequestType`: which vocabulary the request code is drawn
/// from. Vendor requests are the ones this crate cares about.
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
pub enum RequestKind {
    Standard = 0,
    Class = 1,
    Vendor = 2,
}

/// Bits 0..=4 of `bmRequestType`: what the request is addressed to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
pub enum Recipient {
    Device = 0,
    Interface = 1,
    Endpoint = 2,
    Other = 3,
}

/// Layout of an 8-byte USB SETUP packet, as delivered by the device stack.
/// Valid only for the duration of the control callback that carries it.
#[repr(C)]
#[derive(Debug, AsBytes, FromBytes, Unaligned)]
pub struct UsbSetupPacket {
    /// Bitmask combining direction, request kind, and recipient; see
    /// `UsbDir`, `RequestKind`, and `Recipient` for the pieces.
    pub request_type: u8,
    /// Request code. Standard codes are defined by the USB spec; vendor
    /// requests use locally chosen values.
    pub request: u8,
    /// A simple argument of up to 16 bits, specific to the request.
    pub value: U16<LittleEndian>,
    /// A second 16-bit argument; for the Microsoft feature-descriptor
    /// requests this selects which descriptor is wanted.
    pub index: U16<LittleEndian>,
    /// If data will be transferred after this request (in the direction
    /// given by `request_type`), the number of bytes (OUT) or maximum
    /// number of bytes (IN).
    pub length: U16<LittleEndian>,
}

impl UsbSetupPacket {
    /// Reinterprets a raw 8-byte buffer as a SETUP packet. Returns `None`
    /// if the slice isn't exactly 8 bytes.
    pub fn parse(raw: &[u8]) -> Option<&Self> {
        Some(LayoutVerified::<_, Self>::new(raw)?.into_ref())
    }

    pub fn direction(&self) -> UsbDir {
        UsbDir::of_request_type(self.request_type)
    }

    pub fn kind(&self) -> Option<RequestKind> {
        RequestKind::from_u8((self.request_type >> 5) & 0x3)
    }

    /// The addressed recipient, or `None` for the reserved encodings above
    /// `Other`.
    pub fn recipient(&self) -> Option<Recipient> {
        Recipient::from_u8(self.request_type & 0x1f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_decodes_fields() {
        // IN | vendor | interface, request 7, value 0, index 5, length 146.
        let raw = [0xc1, 0x07, 0x00, 0x00, 0x05, 0x00, 0x92, 0x00];
        let setup = UsbSetupPacket::parse(&raw).unwrap();
        assert_eq!(setup.direction(), UsbDir::In);
        assert_eq!(setup.kind(), Some(RequestKind::Vendor));
        assert_eq!(setup.recipient(), Some(Recipient::Interface));
        assert_eq!(setup.request, 7);
        assert_eq!(setup.index.get(), 5);
        assert_eq!(setup.length.get(), 146);
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!(UsbSetupPacket::parse(&[0; 7]).is_none());
        assert!(UsbSetupPacket::parse(&[0; 9]).is_none());
    }

    #[test]
    fn reserved_recipient_is_none() {
        let raw = [0xdf, 0x07, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00];
        let setup = UsbSetupPacket::parse(&raw).unwrap();
        assert_eq!(setup.recipient(), None);
        // The kind bits still decode.
        assert_eq!(setup.kind(), Some(RequestKind::Vendor));
    }
}
