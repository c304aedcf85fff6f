//
// Copyright (c) The Holo Core Contributors
//
// See LICENSE for license details.
//

use bitflags::bitflags;

bitflags! {
    /// Membership bits shared by on-link nodes and off-link entries.
    ///
    /// An on-link node sets some subset of `NC | DRL | DST` depending on
    /// which logical tables reference it; an off-link entry sets some
    /// subset of `FT | PL | RPL` depending on which tables it belongs to.
    /// Reusing a single bit-enum for both mirrors the original layout,
    /// where clearing the last bit is what frees the underlying slot.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct Mode: u8 {
        /// Neighbor cache membership.
        const NC  = 0x01;
        /// Default router list membership.
        const DRL = 0x02;
        /// Referenced as a next hop by at least one off-link entry.
        const DST = 0x04;
        /// Forwarding-table membership (installed route).
        const FT  = 0x08;
        /// Prefix-list membership.
        const PL  = 0x10;
        /// RPL-sourced route membership.
        const RPL = 0x20;
    }
}
