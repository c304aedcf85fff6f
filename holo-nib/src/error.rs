//
// Copyright (c) The Holo Core Contributors
//
// See LICENSE for license details.
//

use std::net::Ipv6Addr;

// NIB errors.
//
// These are the only failure modes the NIB itself can report: pool
// exhaustion and "no route". Precondition violations (a malformed prefix
// length, an invalid initial NUD state) are contract violations, not
// recoverable errors, and panic instead — see the module docs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// `get_route` found neither an off-link entry nor a default router
    /// that could supply a next hop.
    NetUnreachable(Ipv6Addr),
    /// A mutating operation needed a free slot and none was available.
    PoolExhausted(Pool),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Pool {
    Onl,
    DefaultRouter,
    OffLink,
    Abr,
    Interface,
}

// ===== impl Error =====

impl Error {
    pub(crate) fn log(&self) {
        tracing::debug!(error = %self, "nib operation failed");
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NetUnreachable(dst) => {
                write!(f, "no route to {dst}")
            }
            Error::PoolExhausted(pool) => {
                write!(f, "{pool} pool exhausted")
            }
        }
    }
}

impl std::error::Error for Error {}

impl std::fmt::Display for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pool::Onl => write!(f, "on-link node"),
            Pool::DefaultRouter => write!(f, "default router"),
            Pool::OffLink => write!(f, "off-link entry"),
            Pool::Abr => write!(f, "authoritative border router"),
            Pool::Interface => write!(f, "interface"),
        }
    }
}
