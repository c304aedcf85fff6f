//
// Copyright (c) The Holo Core Contributors
//
// See LICENSE for license details.
//

/// Neighbor Unreachability Detection state of an on-link node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NudState {
    Incomplete,
    Reachable,
    Stale,
    Delay,
    Probe,
    Unreachable,
}

/// Address-registration state of an on-link node, as seen by 6LoWPAN
/// neighbor-cache garbage collection.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AddrRegState {
    /// Not backed by an address registration; eligible for GC eviction.
    #[default]
    Gc,
    /// Registered through 6LoWPAN address registration; not GC-eligible.
    Registered,
}

// ===== impl NudState =====

impl NudState {
    /// Returns true if a neighbor in this state may be used as a next hop
    /// without first triggering unreachability detection.
    pub fn is_reachable(&self) -> bool {
        !matches!(self, NudState::Unreachable | NudState::Incomplete)
    }

    /// Returns true if `nc_add` may insert a fresh entry directly into this
    /// state. DELAY, PROBE and REACHABLE are reached only through the NUD
    /// state machine, never as an initial state.
    pub(crate) fn is_valid_initial(&self) -> bool {
        matches!(
            self,
            NudState::Incomplete | NudState::Stale | NudState::Unreachable
        )
    }
}
