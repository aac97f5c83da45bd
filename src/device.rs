// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The bulk channel event handler: connection state, traffic counters, and
//! the glue that routes receive deliveries into the echo engine.
//!
//! The device stack serializes its notifications, so every handler here runs
//! to completion without being preempted by another USB event. The main loop
//! only ever reads counter snapshots, which is why the counters are atomics
//! with relaxed ordering rather than anything heavier.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::echo;
use crate::ring::RingBuffer;

/// Capacity, in bytes, of each side of the bulk channel. Shared by the RX
/// and TX rings so the echo engine's wrap arithmetic is uniform.
pub const BULK_BUFFER_SIZE: usize = 256;

/// The ring type used on both sides of the bulk channel.
pub type BulkRing = RingBuffer<BULK_BUFFER_SIZE>;

/// Channel-level notifications from the device stack, one variant per event
/// the stack can deliver. Carries typed payloads instead of the stack's
/// untyped value/pointer pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkEvent {
    /// A host has connected and configured us; communication is possible.
    Connected,
    /// The host has disconnected.
    Disconnected,
    /// `delivered` new bytes have arrived at the front of the RX ring.
    RxAvailable { delivered: usize },
    /// The stack finished transmitting `sent` bytes to the host.
    TxComplete { sent: usize },
    /// Bus suspend. Ignored.
    Suspend,
    /// Bus resume. Ignored.
    Resume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// Monotonically increasing transmit/receive byte totals.
///
/// Written only from the USB event context, read from the main loop for
/// display. Relaxed atomics keep the reads tear-free per counter; the pair
/// taken together is only ever a coarse snapshot, which is all the display
/// needs. Wraparound at `u32::MAX` is accepted.
#[derive(Debug)]
pub struct TrafficCounters {
    tx: AtomicU32,
    rx: AtomicU32,
}

impl TrafficCounters {
    pub const fn new() -> Self {
        Self {
            tx: AtomicU32::new(0),
            rx: AtomicU32::new(0),
        }
    }

    // Single-writer: load+store suffices, and armv6-m has no fetch_add.
    pub(crate) fn add_tx(&self, n: u32) {
        self.tx.store(self.tx.load(Ordering::Relaxed).wrapping_add(n), Ordering::Relaxed);
    }

    pub(crate) fn add_rx(&self, n: u32) {
        self.rx.store(self.rx.load(Ordering::Relaxed).wrapping_add(n), Ordering::Relaxed);
    }

    /// Total bytes transmitted to the host.
    pub fn tx_bytes(&self) -> u32 {
        self.tx.load(Ordering::Relaxed)
    }

    /// Total bytes received from the host.
    pub fn rx_bytes(&self) -> u32 {
        self.rx.load(Ordering::Relaxed)
    }
}

impl Default for TrafficCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// The bulk echo device: owns the ring pair, the connection state, and the
/// traffic counters.
#[derive(Debug)]
pub struct BulkEchoDevice {
    state: ConnectionState,
    rx: BulkRing,
    tx: BulkRing,
    counters: TrafficCounters,
}

impl BulkEchoDevice {
    pub const fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            rx: BulkRing::new(),
            tx: BulkRing::new(),
            counters: TrafficCounters::new(),
        }
    }

    /// Handles one channel notification, returning the numeric result the
    /// device stack's calling convention expects: the consumed byte count
    /// for `RxAvailable`, zero for everything else.
    ///
    /// Events that don't make sense in the current state are silently
    /// ignored. The stack is the authority on protocol correctness; dropping
    /// a stray notification preserves forward progress, rejecting it
    /// wouldn't.
    pub fn handle_event(&mut self, event: BulkEvent) -> u32 {
        match (self.state, event) {
            (_, BulkEvent::Connected) => {
                log::info!("host connected");
                self.state = ConnectionState::Connected;
                // Start the session from a clean slate.
                self.rx.flush();
                self.tx.flush();
                0
            }
            (_, BulkEvent::Disconnected) => {
                log::info!("host disconnected");
                self.state = ConnectionState::Disconnected;
                0
            }
            (ConnectionState::Connected, BulkEvent::RxAvailable { delivered }) => {
                echo::process_delivery(&mut self.rx, &mut self.tx, &self.counters, delivered)
                    as u32
            }
            (ConnectionState::Connected, BulkEvent::TxComplete { sent }) => {
                log::debug!("tx complete: {} bytes", sent);
                self.counters.add_tx(sent as u32);
                0
            }
            _ => 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn counters(&self) -> &TrafficCounters {
        &self.counters
    }

    /// The receive ring the device stack deposits host data into before
    /// signaling `RxAvailable`.
    pub fn rx_ring_mut(&mut self) -> &mut BulkRing {
        &mut self.rx
    }

    /// The transmit ring the device stack drains toward the host.
    pub fn tx_ring_mut(&mut self) -> &mut BulkRing {
        &mut self.tx
    }
}

impl Default for BulkEchoDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_flushes_both_rings() {
        let mut dev = BulkEchoDevice::new();
        dev.rx_ring_mut().write_slice(b"stale");
        dev.tx_ring_mut().write_slice(b"stale");

        assert_eq!(dev.handle_event(BulkEvent::Connected), 0);
        assert!(dev.is_connected());
        assert_eq!(dev.rx_ring_mut().unread(), 0);
        assert_eq!(dev.tx_ring_mut().unread(), 0);
    }

    #[test]
    fn rx_while_disconnected_is_ignored() {
        let mut dev = BulkEchoDevice::new();
        dev.rx_ring_mut().write_slice(b"abc");
        assert_eq!(dev.handle_event(BulkEvent::RxAvailable { delivered: 3 }), 0);
        // Nothing consumed, nothing echoed, nothing counted.
        assert_eq!(dev.rx_ring_mut().unread(), 3);
        assert_eq!(dev.tx_ring_mut().unread(), 0);
        assert_eq!(dev.counters().rx_bytes(), 0);
    }

    #[test]
    fn rx_while_connected_echoes_and_returns_consumed() {
        let mut dev = BulkEchoDevice::new();
        dev.handle_event(BulkEvent::Connected);
        dev.rx_ring_mut().write_slice(b"Hello");
        assert_eq!(dev.handle_event(BulkEvent::RxAvailable { delivered: 5 }), 5);

        let mut out = [0; 8];
        let n = dev.tx_ring_mut().read_slice(&mut out);
        assert_eq!(&out[..n], b"hELLO");
        assert_eq!(dev.counters().rx_bytes(), 5);
    }

    #[test]
    fn tx_complete_accumulates() {
        let mut dev = BulkEchoDevice::new();
        dev.handle_event(BulkEvent::Connected);
        assert_eq!(dev.handle_event(BulkEvent::TxComplete { sent: 64 }), 0);
        assert_eq!(dev.handle_event(BulkEvent::TxComplete { sent: 8 }), 0);
        assert_eq!(dev.counters().tx_bytes(), 72);
    }

    #[test]
    fn suspend_and_resume_are_ignored() {
        let mut dev = BulkEchoDevice::new();
        dev.handle_event(BulkEvent::Connected);
        assert_eq!(dev.handle_event(BulkEvent::Suspend), 0);
        assert_eq!(dev.handle_event(BulkEvent::Resume), 0);
        assert!(dev.is_connected());
    }

    #[test]
    fn disconnect_stops_the_echo() {
        let mut dev = BulkEchoDevice::new();
        dev.handle_event(BulkEvent::Connected);
        dev.handle_event(BulkEvent::Disconnected);
        assert!(!dev.is_connected());
        dev.rx_ring_mut().write_slice(b"abc");
        assert_eq!(dev.handle_event(BulkEvent::RxAvailable { delivered: 3 }), 0);
        assert_eq!(dev.tx_ring_mut().unread(), 0);
    }

    #[test]
    fn counters_wrap() {
        let counters = TrafficCounters::new();
        counters.add_rx(u32::MAX);
        counters.add_rx(2);
        assert_eq!(counters.rx_bytes(), 1);
    }
}
