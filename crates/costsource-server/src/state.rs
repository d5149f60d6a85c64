//! Plugin instance state machine (spec.md §4.6):
//! `Created → Listening(port) → Serving(n in-flight) → Draining → Terminated`.
//! Only `Serving → Draining → Terminated` is driven by shutdown;
//! startup failure goes straight to `Terminated`.

use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Created,
    Listening,
    Serving,
    Draining,
    Terminated,
}

impl LifecyclePhase {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Created,
            1 => Self::Listening,
            2 => Self::Serving,
            3 => Self::Draining,
            _ => Self::Terminated,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Created => 0,
            Self::Listening => 1,
            Self::Serving => 2,
            Self::Draining => 3,
            Self::Terminated => 4,
        }
    }
}

/// Lock-free tracker for a single server instance's lifecycle phase,
/// bound port, and in-flight RPC count.
pub struct LifecycleTracker {
    phase: AtomicU8,
    port: AtomicI64,
    in_flight: AtomicU32,
}

impl LifecycleTracker {
    pub fn new() -> Self {
        Self {
            phase: AtomicU8::new(LifecyclePhase::Created.as_u8()),
            port: AtomicI64::new(-1),
            in_flight: AtomicU32::new(0),
        }
    }

    pub fn phase(&self) -> LifecyclePhase {
        LifecyclePhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    pub fn mark_listening(&self, port: u16) {
        self.port.store(port as i64, Ordering::SeqCst);
        self.phase.store(LifecyclePhase::Listening.as_u8(), Ordering::SeqCst);
    }

    pub fn mark_serving(&self) {
        self.phase.store(LifecyclePhase::Serving.as_u8(), Ordering::SeqCst);
    }

    pub fn mark_draining(&self) {
        self.phase.store(LifecyclePhase::Draining.as_u8(), Ordering::SeqCst);
    }

    pub fn mark_terminated(&self) {
        self.phase.store(LifecyclePhase::Terminated.as_u8(), Ordering::SeqCst);
    }

    pub fn bound_port(&self) -> Option<u16> {
        let p = self.port.load(Ordering::SeqCst);
        if p < 0 {
            None
        } else {
            Some(p as u16)
        }
    }

    pub fn enter_rpc(&self) -> RpcGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        RpcGuard { tracker: self }
    }

    pub fn in_flight(&self) -> u32 {
        self.in_flight.load(Ordering::SeqCst)
    }
}

impl Default for LifecycleTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the in-flight counter on drop, so a panicking handler
/// never leaks a phantom in-flight RPC.
pub struct RpcGuard<'a> {
    tracker: &'a LifecycleTracker,
}

impl Drop for RpcGuard<'_> {
    fn drop(&mut self) {
        self.tracker.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
