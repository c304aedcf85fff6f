//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv6Addr;

use const_addrs::{ip6, net6};
use holo_nib::config::NibConfig;
use holo_nib::mode::Mode;
use holo_nib::nud::NudState;
use holo_nib::timer::{EventTimer, TimerCtx, TimerKind};
use holo_nib::{Error, Nib};

#[derive(Debug, Default)]
struct NoopTimer;

impl EventTimer for NoopTimer {
    fn add(&mut self, _ctx: TimerCtx, _kind: TimerKind, _offset_ms: u64) -> u64 {
        0
    }

    fn cancel(&mut self, _handle: u64) {}

    fn lookup(&self, _ctx: TimerCtx, _kind: TimerKind) -> Option<u64> {
        None
    }
}

const IFACE: u32 = 1;

#[test]
fn lookup_on_an_empty_nib_finds_no_route() {
    let mut nib = Nib::new(NibConfig::default());
    let dst = ip6!("2001:db8::1");
    assert_eq!(nib.get_route(dst), Err(Error::NetUnreachable(dst)));
}

#[test]
fn with_only_a_default_router_every_destination_routes_through_it() {
    let mut nib = Nib::new(NibConfig::default());
    nib.drl_add(ip6!("fe80::1"), IFACE).unwrap();

    let route = nib.get_route(ip6!("2001:db8::1")).unwrap();
    assert_eq!(route.next_hop, ip6!("fe80::1"));
    assert_eq!(route.dst_len, 0);
    assert!(route.primary);
}

#[test]
fn an_installed_route_wins_over_the_default_router_for_covered_destinations() {
    let mut nib = Nib::new(NibConfig::default());
    nib.drl_add(ip6!("fe80::1"), IFACE).unwrap();
    nib.offl_add(
        Some(ip6!("fe80::2")),
        IFACE,
        net6!("2001:db8:1::/48").ip(),
        48,
        Mode::FT,
    )
    .unwrap();

    let covered = nib.get_route(ip6!("2001:db8:1::5")).unwrap();
    assert_eq!(covered.next_hop, ip6!("fe80::2"));
    assert_eq!(covered.dst_len, 48);
    assert!(!covered.primary, "an installed route is not a default router");

    let uncovered = nib.get_route(ip6!("2001:db8:2::5")).unwrap();
    assert_eq!(uncovered.next_hop, ip6!("fe80::1"));
    assert_eq!(uncovered.dst_len, 0);
}

#[test]
fn a_prefix_list_only_entry_does_not_satisfy_forwarding() {
    let mut nib = Nib::new(NibConfig::default());
    nib.drl_add(ip6!("fe80::1"), IFACE).unwrap();
    let mut timer = NoopTimer;
    nib.pl_add(
        Some(ip6!("fe80::2")),
        IFACE,
        net6!("2001:db8:1::/48").ip(),
        48,
        30_000,
        15_000,
        0,
        &mut timer,
    )
    .unwrap();

    let route = nib.get_route(ip6!("2001:db8:1::5")).unwrap();
    assert_eq!(
        route.next_hop,
        ip6!("fe80::1"),
        "on-link-only prefixes must yield to the default router"
    );
}

#[test]
fn neighbor_cache_eviction_reuses_the_oldest_unregistered_entry_under_pressure() {
    let mut config = NibConfig::default();
    config.nib_numof = 2;
    let mut nib = Nib::new(config);
    let mut timer = NoopTimer;

    let oldest = nib
        .nc_add(ip6!("fe80::1"), IFACE, NudState::Stale, &mut timer)
        .unwrap();
    nib.nc_add(ip6!("fe80::2"), IFACE, NudState::Stale, &mut timer)
        .unwrap();

    let reused = nib
        .nc_add(ip6!("fe80::3"), IFACE, NudState::Stale, &mut timer)
        .unwrap();
    assert_eq!(reused, oldest);
    assert!(nib.nc_get(Some(ip6!("fe80::1")), IFACE).is_none());
    assert!(nib.nc_get(Some(ip6!("fe80::2")), IFACE).is_some());
    assert!(nib.nc_get(Some(ip6!("fe80::3")), IFACE).is_some());
}

#[test]
fn router_selection_rotates_when_no_router_is_reachable() {
    let mut nib = Nib::new(NibConfig::default());
    let mut timer = NoopTimer;
    nib.drl_add(ip6!("fe80::1"), IFACE).unwrap();
    nib.drl_add(ip6!("fe80::2"), IFACE).unwrap();

    // Each default router's on-link node still defaults to Stale (already
    // "reachable"); drive it to Unreachable through the same on-link node
    // via nc_add, the way a real caller would after NUD gives up on it.
    for addr in [ip6!("fe80::1"), ip6!("fe80::2")] {
        nib.nc_add(addr, IFACE, NudState::Unreachable, &mut timer)
            .unwrap();
    }

    let first = nib.get_route(ip6!("2001:db8::1")).unwrap().next_hop;
    let second = nib.get_route(ip6!("2001:db8::1")).unwrap().next_hop;
    let third = nib.get_route(ip6!("2001:db8::1")).unwrap().next_hop;
    assert_ne!(first, second, "selection should rotate off an unreachable prime");
    assert_eq!(first, third, "rotation should cycle back after both routers");
}

#[cfg(feature = "multihop-p6c")]
#[test]
fn removing_an_abr_drops_every_prefix_and_context_it_owned() {
    use holo_nib::abr::ContextReleaser;

    #[derive(Debug, Default)]
    struct RecordingReleaser {
        released: Vec<u8>,
    }
    impl ContextReleaser for RecordingReleaser {
        fn release(&mut self, cid: u8) {
            self.released.push(cid);
        }
    }

    let mut nib = Nib::new(NibConfig::default());
    let mut timer = NoopTimer;
    let mut releaser = RecordingReleaser::default();

    let abr = nib.abr_add(ip6!("2001:db8::1"), 1).unwrap();
    let owned = nib
        .pl_add(
            Some(ip6!("fe80::2")),
            IFACE,
            net6!("2001:db8:1::/48").ip(),
            48,
            30_000,
            15_000,
            0,
            &mut timer,
        )
        .unwrap();
    nib.abr_add_pfx(abr, owned);

    nib.abr_remove(abr, &mut releaser, &mut timer);

    assert!(
        nib.offl_get(owned).is_none(),
        "abr_remove must cascade into pl_remove for every prefix it owned"
    );
    assert!(nib.abr_iterate(None).is_none());
}
