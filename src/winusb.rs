// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! WinUSB auto-install: Microsoft OS descriptor handling on endpoint 0.
//!
//! Windows probes devices that claim USB 2.00 compliance with a request for
//! string descriptor 0xEE. A device that answers with the `MSFT100`
//! signature -- plus a vendor code of its choosing -- is then asked, via
//! vendor requests using that code, for two "feature descriptors":
//!
//! - the Compatible ID descriptor, where we claim compatibility with
//!   `WINUSB`, telling Windows to bind WinUSB.sys without an INF in sight;
//! - the Extended Properties descriptor, where we hand over the
//!   `DeviceInterfaceGUIDs` registry value user applications will open the
//!   device by.
//!
//! The byte layouts are fixed by the (unversioned, long-frozen) MS OS
//! Descriptors 1.0 spec and must be reproduced exactly; they're defined here
//! as `repr(C)` structs of byte-order-explicit fields so the layout is
//! checkable rather than a wall of hex.
//!
//! Anything on endpoint 0 that doesn't match one of the recognized shapes is
//! answered with a stall, which is USB for "request not understood." That's
//! the only error signal in this module; nothing here panics on host input.

use byteorder::LittleEndian;
use zerocopy::{AsBytes, U16, U32};

use crate::descriptor::UsbDescType;
use crate::setup::{Recipient, RequestKind, UsbSetupPacket};

/// The reserved string-descriptor index Windows uses to probe for MS OS
/// descriptor support.
pub const MS_OS_STRING_DESCRIPTOR_INDEX: u8 = 0xee;

/// The vendor request code we advertise in the OS string descriptor and
/// expect back in the follow-up feature-descriptor requests. Windows doesn't
/// care what the value is, only that the two ends agree.
pub const MS_VENDOR_CODE: u8 = 7;

/// `wIndex` value selecting the Compatible ID feature descriptor.
const COMPATIBLE_ID_INDEX: u16 = 4;
/// `wIndex` value selecting the Extended Properties feature descriptor.
const EXTENDED_PROPERTIES_INDEX: u16 = 5;

/// BCD version carried by both feature descriptors.
const MS_OS_DESCRIPTOR_VERSION: u16 = 0x0100;

/// Registry data type for the Extended Properties payload: REG_MULTI_SZ, a
/// double-null-terminated multi-string.
const REG_MULTI_SZ: u32 = 7;

/// The 18-byte MS OS String Descriptor: an ordinary string descriptor
/// header, the UTF-16LE signature `MSFT100`, the vendor code, and a pad.
#[repr(C)]
#[derive(Debug, AsBytes)]
pub struct MsOsStringDescriptor {
    length: u8,
    descriptor_type: u8,
    signature: [u8; 14],
    vendor_code: u8,
    pad: u8,
}

pub static MS_OS_STRING_DESCRIPTOR: MsOsStringDescriptor = MsOsStringDescriptor {
    length: core::mem::size_of::<MsOsStringDescriptor>() as u8,
    descriptor_type: UsbDescType::String as u8,
    signature: *b"M\0S\0F\0T\01\00\00\0",
    vendor_code: MS_VENDOR_CODE,
    pad: 0,
};

/// The 40-byte Compatible ID Feature Descriptor, declaring compatible ID
/// `WINUSB` for interface 0.
#[repr(C)]
#[derive(Debug, AsBytes)]
pub struct CompatibleIdDescriptor {
    total_length: U32<LittleEndian>,
    version: U16<LittleEndian>,
    index: U16<LittleEndian>,
    section_count: u8,
    reserved0: [u8; 7],
    interface_number: u8,
    reserved1: u8,
    compatible_id: [u8; 8],
    sub_compatible_id: [u8; 8],
    reserved2: [u8; 6],
}

pub static COMPATIBLE_ID_DESCRIPTOR: CompatibleIdDescriptor = CompatibleIdDescriptor {
    total_length: U32::from_bytes(u32::to_le_bytes(
        core::mem::size_of::<CompatibleIdDescriptor>() as u32,
    )),
    version: U16::from_bytes(u16::to_le_bytes(MS_OS_DESCRIPTOR_VERSION)),
    index: U16::from_bytes(u16::to_le_bytes(COMPATIBLE_ID_INDEX)),
    section_count: 1,
    reserved0: [0; 7],
    interface_number: 0,
    // The spec marks this byte reserved but fixes its value at 1.
    reserved1: 1,
    compatible_id: *b"WINUSB\0\0",
    sub_compatible_id: [0; 8],
    reserved2: [0; 6],
};

/// The 146-byte Extended Properties Feature Descriptor, carrying a single
/// REG_MULTI_SZ registry property named `DeviceInterfaceGUIDs`.
#[repr(C)]
#[derive(Debug, AsBytes)]
pub struct ExtendedPropertiesDescriptor {
    total_length: U32<LittleEndian>,
    version: U16<LittleEndian>,
    index: U16<LittleEndian>,
    section_count: U16<LittleEndian>,
    property_size: U32<LittleEndian>,
    data_type: U32<LittleEndian>,
    name_length: U16<LittleEndian>,
    /// UTF-16LE `DeviceInterfaceGUIDs`, null terminated.
    name: [u8; 42],
    data_length: U32<LittleEndian>,
    /// UTF-16LE GUID string, double-null terminated (one terminator for the
    /// string, one for the multi-string list).
    data: [u8; 80],
}

pub static EXTENDED_PROPERTIES_DESCRIPTOR: ExtendedPropertiesDescriptor =
    ExtendedPropertiesDescriptor {
        total_length: U32::from_bytes(u32::to_le_bytes(
            core::mem::size_of::<ExtendedPropertiesDescriptor>() as u32,
        )),
        version: U16::from_bytes(u16::to_le_bytes(MS_OS_DESCRIPTOR_VERSION)),
        index: U16::from_bytes(u16::to_le_bytes(EXTENDED_PROPERTIES_INDEX)),
        section_count: U16::from_bytes(u16::to_le_bytes(1)),
        // Everything from `data_type` onward: 146 total - 10 header bytes.
        property_size: U32::from_bytes(u32::to_le_bytes(136)),
        data_type: U32::from_bytes(u32::to_le_bytes(REG_MULTI_SZ)),
        name_length: U16::from_bytes(u16::to_le_bytes(42)),
        name: *b"D\0e\0v\0i\0c\0e\0I\0n\0t\0e\0r\0f\0a\0c\0e\0G\0U\0I\0D\0s\0\0\0",
        data_length: U32::from_bytes(u32::to_le_bytes(80)),
        data: *b"{\06\0E\04\05\07\03\06\0A\0-\02\0B\01\0B\0-\04\00\07\08\0-\0B\07\07\02\0-\0B\03\0A\0F\02\0B\06\0F\0D\0E\01\0C\0}\0\0\0\0\0",
    };

/// What the dispatcher decided to do with an endpoint-0 request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlResponse {
    /// Transmit this payload, truncated to the host's requested length.
    Send(&'static [u8]),
    /// Halt endpoint 0 to signal an unsupported request.
    Stall,
}

/// The seam to the device stack's endpoint-0 machinery. Implementations
/// acknowledge the data stage, hand bytes to the hardware, or halt the
/// endpoint; none of these may block.
pub trait ControlPipe {
    /// Acknowledges/clears the pending endpoint-0 data stage so the hardware
    /// is ready to transmit a response.
    fn ack_data_stage(&mut self);
    /// Queues `data` for transmission to the host on endpoint 0 IN.
    fn send(&mut self, data: &[u8]);
    /// Halts endpoint 0, signaling an unsupported request to the host.
    fn stall(&mut self);
}

/// Picks a response for a string-descriptor request whose index fell outside
/// the standard string table. Only the 0xEE probe is recognized; the low
/// byte of `wValue` carries the index, the high byte the descriptor type.
pub fn dispatch_string_descriptor(setup: &UsbSetupPacket) -> ControlResponse {
    if setup.value.get() as u8 != MS_OS_STRING_DESCRIPTOR_INDEX {
        return ControlResponse::Stall;
    }
    log::debug!("sending MS OS string descriptor 'MSFT100'");
    ControlResponse::Send(MS_OS_STRING_DESCRIPTOR.as_bytes())
}

/// Picks a response for a vendor request on endpoint 0. We recognize the two
/// Microsoft feature-descriptor queries issued with our vendor code; every
/// other combination stalls.
pub fn dispatch_vendor_request(setup: &UsbSetupPacket) -> ControlResponse {
    if setup.kind() != Some(RequestKind::Vendor) || setup.request != MS_VENDOR_CODE {
        return ControlResponse::Stall;
    }
    match (setup.index.get(), setup.recipient()) {
        (COMPATIBLE_ID_INDEX, Some(Recipient::Device)) => {
            log::debug!("sending compatible ID feature descriptor 'WINUSB'");
            ControlResponse::Send(COMPATIBLE_ID_DESCRIPTOR.as_bytes())
        }
        (EXTENDED_PROPERTIES_INDEX, Some(Recipient::Interface)) => {
            log::debug!("sending extended properties feature descriptor");
            ControlResponse::Send(EXTENDED_PROPERTIES_DESCRIPTOR.as_bytes())
        }
        _ => ControlResponse::Stall,
    }
}

/// Entry point for vendor requests delivered by the device stack. Clears the
/// data stage, then either transmits the chosen payload or stalls.
pub fn handle_vendor_request<P: ControlPipe>(pipe: &mut P, setup: &UsbSetupPacket) {
    log::trace!(
        "vendor request: type={:#04x} request={:#04x} value={:#06x} index={:#06x} length={:#06x}",
        setup.request_type,
        setup.request,
        setup.value.get(),
        setup.index.get(),
        setup.length.get(),
    );
    pipe.ack_data_stage();
    apply(pipe, setup, dispatch_vendor_request(setup));
}

/// Entry point for string-descriptor requests whose index the device stack
/// didn't find in its own table.
pub fn handle_string_descriptor<P: ControlPipe>(pipe: &mut P, setup: &UsbSetupPacket) {
    log::trace!("string descriptor request: value={:#06x}", setup.value.get());
    pipe.ack_data_stage();
    apply(pipe, setup, dispatch_string_descriptor(setup));
}

fn apply<P: ControlPipe>(pipe: &mut P, setup: &UsbSetupPacket, response: ControlResponse) {
    match response {
        ControlResponse::Send(payload) => {
            // Never more than the host asked for, never more than we have.
            let len = payload.len().min(usize::from(setup.length.get()));
            log::debug!("sending {} bytes on EP0", len);
            pipe.send(&payload[..len]);
        }
        ControlResponse::Stall => pipe.stall(),
    }
}
