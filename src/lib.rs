// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core logic for a vendor-class USB full-speed bulk device that echoes
//! everything the host sends back with alphabetic case inverted, and that
//! talks Microsoft's OS-descriptor protocol so Windows installs WinUSB for
//! it automatically -- no INF, no custom driver.
//!
//! This crate is the hardware-independent middle of such a firmware. The
//! device stack below it (endpoint configuration, packet pumping, the
//! SETUP/DATA/STATUS choreography on endpoint 0) and the board glue around
//! it (clocks, pins, console, the polling loop) are collaborators, reached
//! through narrow seams:
//!
//! - [`device::BulkEchoDevice`] consumes typed [`device::BulkEvent`]
//!   notifications and owns the RX/TX [`ring::RingBuffer`] pair the stack
//!   moves bulk data through; the echo transform lives in [`echo`].
//! - [`winusb`] decides endpoint-0 responses for the 0xEE string-descriptor
//!   probe and the two Microsoft feature-descriptor vendor requests, and
//!   drives them through the [`winusb::ControlPipe`] trait the stack
//!   implements. Everything unrecognized stalls.
//! - [`descriptor::DeviceDescriptorBuilder`] produces a device descriptor
//!   that claims USB 2.00, without which Windows never probes at all.
//!
//! Handlers run in the stack's interrupt-like context, never block, and
//! never panic on host input; the main loop watches traffic through
//! [`device::TrafficCounters`] snapshots.

#![cfg_attr(not(test), no_std)]
#![warn(missing_debug_implementations, rust_2018_idioms)]

pub mod descriptor;
pub mod device;
pub mod echo;
pub mod ring;
pub mod setup;
pub mod winusb;

pub use device::{BulkEchoDevice, BulkEvent, ConnectionState, TrafficCounters, BULK_BUFFER_SIZE};
pub use ring::RingBuffer;
pub use setup::UsbSetupPacket;
pub use winusb::{ControlPipe, ControlResponse, MS_VENDOR_CODE};
