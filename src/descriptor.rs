// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Standard device descriptor support.
//!
//! The one non-obvious requirement here: the descriptor must advertise USB
//! 2.00, not the 1.10 that full-speed device stacks commonly default to.
//! Windows only ever asks for the 0xEE OS string descriptor (see `winusb`)
//! from devices claiming 2.00, so rather than patching a descriptor table in
//! place at startup, `DeviceDescriptorBuilder` bakes the version in when the
//! descriptor is constructed.

use byteorder::LittleEndian;
use num_derive::FromPrimitive;
use zerocopy::{AsBytes, U16};

/// Types of USB descriptor.
#[derive(Copy, Clone, Debug, FromPrimitive, AsBytes)]
#[repr(u8)]
pub enum UsbDescType {
    Device = 0x01,
    Config = 0x02,
    String = 0x03,
    Interface = 0x04,
    Endpoint = 0x05,
}

/// The USB specification release a device claims compliance with, in
/// binary-coded decimal. 2.00 is required for WinUSB auto-install.
pub const USB_BCD_2_0: u16 = 0x0200;

/// Describes a device. This is the most broad description in USB and is
/// typically the first thing the host asks for.
#[repr(C)]
#[derive(Debug, AsBytes)]
pub struct UsbDeviceDescriptor {
    /// Length of this structure, must be 18.
    pub length: u8,
    /// Type of this descriptor, must be `Device`.
    pub descriptor_type: UsbDescType,
    /// Version of the USB protocol complied with, in binary-coded decimal.
    pub bcd_usb: U16<LittleEndian>,
    /// Class of device, giving a broad functional area. Zero here; the
    /// vendor-specific class lives on the interface.
    pub device_class: u8,
    /// Subclass of device, refining the class.
    pub device_subclass: u8,
    /// Protocol within the subclass.
    pub device_protocol: u8,
    /// Maximum unit of data this device can move on endpoint 0.
    pub max_packet_size0: u8,
    /// ID of product vendor.
    pub vendor: U16<LittleEndian>,
    /// ID of product.
    pub product: U16<LittleEndian>,
    /// Device version number, as BCD again.
    pub bcd_device: U16<LittleEndian>,
    /// Index of manufacturer name in string descriptor table.
    pub manufacturer_s: u8,
    /// Index of product name in string descriptor table.
    pub product_s: u8,
    /// Index of serial number in string descriptor table.
    pub serial_s: u8,
    /// Number of configurations supported by this device.
    pub num_configurations: u8,
}

/// Builds a `UsbDeviceDescriptor` for the bulk device. `bcd_usb` is always
/// `USB_BCD_2_0`; there is deliberately no way to build one claiming 1.10.
#[derive(Debug)]
pub struct DeviceDescriptorBuilder {
    vendor: u16,
    product: u16,
    device_release: u16,
    manufacturer_s: u8,
    product_s: u8,
    serial_s: u8,
}

impl DeviceDescriptorBuilder {
    pub fn new(vendor: u16, product: u16) -> Self {
        Self {
            vendor,
            product,
            device_release: 0,
            manufacturer_s: 0,
            product_s: 0,
            serial_s: 0,
        }
    }

    /// Sets the BCD device release number.
    pub fn device_release(mut self, bcd: u16) -> Self {
        self.device_release = bcd;
        self
    }

    /// Sets the string-descriptor indices for the manufacturer, product, and
    /// serial number strings.
    pub fn strings(mut self, manufacturer: u8, product: u8, serial: u8) -> Self {
        self.manufacturer_s = manufacturer;
        self.product_s = product;
        self.serial_s = serial;
        self
    }

    pub fn build(self) -> UsbDeviceDescriptor {
        UsbDeviceDescriptor {
            length: core::mem::size_of::<UsbDeviceDescriptor>() as u8,
            descriptor_type: UsbDescType::Device,
            bcd_usb: U16::new(USB_BCD_2_0),
            device_class: 0,
            device_subclass: 0,
            device_protocol: 0,
            max_packet_size0: 64,
            vendor: U16::new(self.vendor),
            product: U16::new(self.product),
            bcd_device: U16::new(self.device_release),
            manufacturer_s: self.manufacturer_s,
            product_s: self.product_s,
            serial_s: self.serial_s,
            num_configurations: 1,
        }
    }
}
