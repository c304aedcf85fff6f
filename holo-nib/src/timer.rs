//
// Copyright (c) The Holo Core Contributors
//
// See LICENSE for license details.
//

use generational_arena::Index;

/// Opaque token identifying a scheduled event, handed back by
/// [`EventTimer::add`] and later passed to [`EventTimer::cancel`].
///
/// The NIB never inspects this value; it only stores it long enough to
/// cancel the event eagerly when the owning record is removed. Unlike the
/// embedded-link timer handles it stands in for, it is a plain `Copy` token
/// rather than a pinned struct field, so nothing requires it to stay at a
/// fixed address.
pub type TimerHandle = u64;

/// What a scheduled event is for.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TimerKind {
    /// Neighbor unreachability detection retransmission.
    NudTimeout,
    /// Deferred solicited Neighbor Advertisement.
    SndNa,
    /// 6LoWPAN address-registration timeout.
    AddrReg,
    /// Prefix-list entry expiry (valid lifetime).
    PrefixTimeout,
    /// Per-interface reachable-time recalculation.
    ReachTimeRecalc,
}

/// Identifies which record a scheduled event belongs to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TimerCtx {
    Onl(Index),
    Offl(Index),
    Iface(u32),
}

/// The NIB's binding to the external event-timer service.
///
/// The timer service itself — delivery, wakeups, the event queue — lives
/// outside this crate; the NIB only needs to schedule and cancel events and
/// to ask how much time is left before one fires. Implementations re-enter
/// the NIB through the mutation API from outside the critical section, the
/// same way `holo_utils::task::TimeoutTask` hands a callback to the tokio
/// runtime without the owning protocol instance knowing anything about
/// `tokio` internals.
pub trait EventTimer: std::fmt::Debug {
    /// Schedules `kind` for `ctx` to fire after `offset_ms` milliseconds,
    /// returning a handle that can later be passed to [`cancel`](Self::cancel).
    fn add(&mut self, ctx: TimerCtx, kind: TimerKind, offset_ms: u64) -> TimerHandle;

    /// Cancels a previously scheduled event. A handle for an event that
    /// already fired is silently ignored.
    fn cancel(&mut self, handle: TimerHandle);

    /// Returns the number of milliseconds remaining before the event
    /// matching `(ctx, kind)` fires, or `None` if no such event is pending.
    fn lookup(&self, ctx: TimerCtx, kind: TimerKind) -> Option<u64>;
}
