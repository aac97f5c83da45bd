// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The echo transform: everything the host sends comes back with alphabetic
//! case inverted.

use crate::device::TrafficCounters;
use crate::ring::RingBuffer;

/// Swaps the case of ASCII letters and passes every other byte value
/// through untouched. Applying it twice is the identity.
pub fn swap_case(b: u8) -> u8 {
    match b {
        b'a'..=b'z' => b - 0x20,
        b'A'..=b'Z' => b + 0x20,
        _ => b,
    }
}

/// Processes a delivery of `delivered` newly arrived bytes sitting at the
/// front of the RX ring, case-swapping them into the TX ring.
///
/// Only `min(delivered, tx.space())` bytes are moved -- if the host isn't
/// draining the TX side fast enough, the surplus stays unread in the RX ring
/// and the device stack redelivers it once space frees up. The RX byte
/// counter is bumped by the full delivered count up front, matching what the
/// host actually sent.
///
/// Returns the number of input bytes consumed; the device stack uses this to
/// advance its own receive cursor.
pub fn process_delivery<const N: usize>(
    rx: &mut RingBuffer<N>,
    tx: &mut RingBuffer<N>,
    counters: &TrafficCounters,
    delivered: usize,
) -> usize {
    counters.add_rx(delivered as u32);
    log::debug!("received {} bytes", delivered);

    // Clamp to what's actually unread so a misreported delivery count can't
    // walk off the data.
    let consumed = delivered.min(tx.space()).min(rx.unread());

    let mut remaining = consumed;
    while remaining > 0 {
        // Transform across one pair of contiguous windows; either side may
        // hit the physical end of its storage first.
        let n = {
            let src = rx.readable();
            let dst = tx.writable();
            let n = remaining.min(src.len()).min(dst.len());
            for (d, s) in dst[..n].iter_mut().zip(&src[..n]) {
                *d = swap_case(*s);
            }
            n
        };
        rx.consume(n);
        tx.produce(n);
        remaining -= n;
    }

    log::debug!("wrote {} bytes", consumed);
    consumed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_is_an_involution() {
        for b in 0..=255u8 {
            assert_eq!(swap_case(swap_case(b)), b);
        }
    }

    #[test]
    fn swap_leaves_non_letters_alone() {
        for b in (0..=255u8).filter(|b| !b.is_ascii_alphabetic()) {
            assert_eq!(swap_case(b), b);
        }
        assert_eq!(swap_case(b'a'), b'A');
        assert_eq!(swap_case(b'Z'), b'z');
    }

    fn feed(rx: &mut RingBuffer<8>, tx: &mut RingBuffer<8>, counters: &TrafficCounters, data: &[u8]) -> usize {
        let delivered = rx.write_slice(data);
        assert_eq!(delivered, data.len());
        process_delivery(rx, tx, counters, delivered)
    }

    #[test]
    fn echoes_with_case_swapped() {
        let mut rx = RingBuffer::<8>::new();
        let mut tx = RingBuffer::<8>::new();
        let counters = TrafficCounters::new();

        assert_eq!(feed(&mut rx, &mut tx, &counters, b"Ab1!zY"), 6);
        let mut out = [0; 8];
        let n = tx.read_slice(&mut out);
        assert_eq!(&out[..n], b"aB1!Zy");
        assert_eq!(counters.rx_bytes(), 6);
    }

    #[test]
    fn backpressure_consumes_exactly_the_space_available() {
        let mut rx = RingBuffer::<8>::new();
        let mut tx = RingBuffer::<8>::new();
        let counters = TrafficCounters::new();

        // Leave only 3 bytes of TX space.
        tx.write_slice(b"XXXXX");
        assert_eq!(feed(&mut rx, &mut tx, &counters, b"abcdef"), 3);
        // The unconsumed remainder is still queued for redelivery.
        assert_eq!(rx.unread(), 3);
        assert_eq!(rx.readable(), b"def");
        // But the counter reflects the full delivery.
        assert_eq!(counters.rx_bytes(), 6);

        // Once the host drains TX, redelivery picks up the rest in order.
        let mut out = [0; 8];
        tx.read_slice(&mut out);
        assert_eq!(process_delivery(&mut rx, &mut tx, &counters, 3), 3);
        let n = tx.read_slice(&mut out);
        assert_eq!(&out[..n], b"DEF");
    }

    #[test]
    fn wrap_is_transparent() {
        // Feed more than a full buffer's worth in chunks, draining TX as we
        // go, and check the concatenated output against a straight map.
        let input = b"The quick brown fox JUMPS over 13 lazy dogs!";
        let mut rx = RingBuffer::<8>::new();
        let mut tx = RingBuffer::<8>::new();
        let counters = TrafficCounters::new();

        let mut echoed = Vec::new();
        for chunk in input.chunks(5) {
            let consumed = feed(&mut rx, &mut tx, &counters, chunk);
            assert_eq!(consumed, chunk.len());
            let mut out = [0; 8];
            let n = tx.read_slice(&mut out);
            echoed.extend_from_slice(&out[..n]);
        }
        let expected: Vec<u8> = input.iter().map(|&b| swap_case(b)).collect();
        assert_eq!(echoed, expected);
        assert_eq!(counters.rx_bytes(), input.len() as u32);
    }

    #[test]
    fn overreported_delivery_is_clamped() {
        let mut rx = RingBuffer::<8>::new();
        let mut tx = RingBuffer::<8>::new();
        let counters = TrafficCounters::new();

        rx.write_slice(b"hi");
        // Stack claims 5 bytes arrived; only 2 exist.
        assert_eq!(process_delivery(&mut rx, &mut tx, &counters, 5), 2);
        assert_eq!(tx.unread(), 2);
    }
}
