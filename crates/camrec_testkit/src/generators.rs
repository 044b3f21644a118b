//! Property-based test generators using proptest.
//!
//! Provides strategies for session owners and captured traffic.

use camrec_core::{Direction, SessionOwner};
use proptest::prelude::*;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// One step of generated traffic: a packet, preceded by a pause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficStep {
    /// Milliseconds the clock advances before the packet.
    pub delay_ms: i64,
    /// Packet direction.
    pub direction: Direction,
    /// Packet payload.
    pub payload: Vec<u8>,
}

/// Strategy for generating packet directions.
pub fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Input), Just(Direction::Output)]
}

/// Strategy for generating payloads, including empty ones.
pub fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..64)
}

/// Strategy for generating source addresses of either family.
pub fn address_strategy() -> impl Strategy<Value = IpAddr> {
    prop_oneof![
        any::<[u8; 4]>().prop_map(|o| IpAddr::V4(Ipv4Addr::from(o))),
        any::<[u8; 16]>().prop_map(|o| IpAddr::V6(Ipv6Addr::from(o))),
    ]
}

/// Strategy for generating session owners.
pub fn owner_strategy() -> impl Strategy<Value = SessionOwner> {
    (any::<u32>(), 0u32..1000, any::<u32>(), address_strategy()).prop_map(
        |(owner_id, owner_level, account_id, address)| {
            SessionOwner::new(owner_id, owner_level, account_id, address)
        },
    )
}

/// Strategy for generating one session's traffic.
///
/// Delays stay under a second so generated sessions never go idle under
/// the default timeout.
pub fn traffic_strategy(max_packets: usize) -> impl Strategy<Value = Vec<TrafficStep>> {
    prop::collection::vec(
        (0i64..1000, direction_strategy(), payload_strategy()).prop_map(
            |(delay_ms, direction, payload)| TrafficStep {
                delay_ms,
                direction,
                payload,
            },
        ),
        0..max_packets,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::strategy::ValueTree;
    use proptest::test_runner::TestRunner;

    #[test]
    fn traffic_respects_bounds() {
        let mut runner = TestRunner::default();
        for _ in 0..32 {
            let traffic = traffic_strategy(10)
                .new_tree(&mut runner)
                .unwrap()
                .current();
            assert!(traffic.len() < 10);
            assert!(traffic.iter().all(|s| (0..1000).contains(&s.delay_ms)));
            assert!(traffic.iter().all(|s| s.payload.len() < 64));
        }
    }
}
