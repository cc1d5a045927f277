//! Critical-section port hooks for the heap engine.
//!
//! The engine itself never picks a synchronization primitive — it asks a
//! `CriticalSection` implementation to create, lock, and unlock a zone
//! around its mutating operations, the same separation of concerns the
//! rest of this workspace draws between the kernel and its sibling
//! hardware-abstraction crates.
//!
//! Two implementations are provided: [`NoOpCriticalSection`] for
//! single-threaded callers (the spec's documented default), and
//! [`SpinCriticalSection`] for coarse-grained mutual exclusion under
//! preemptive multithreading.
#![no_std]

use core::sync::atomic::{AtomicBool, Ordering};

/// A critical-section port: create, lock, unlock.
///
/// `create` is invoked exactly once, lazily, by the engine on the first
/// `create()` call it services. `lock`/`unlock` bracket every mutating
/// engine operation. Implementations MUST make `unlock` safe to call
/// immediately after the matching `lock` on every code path, including
/// error returns — callers are expected to pair them via [`Section::enter`]
/// rather than calling `lock`/`unlock` directly, so a panic or early
/// return inside the protected section still releases the zone.
pub trait CriticalSection: Sync {
    /// One-time setup of the underlying primitive. May be called more than
    /// once by a caller that does its own lazy-init tracking; implementations
    /// should be idempotent.
    fn create(&self);
    /// Acquire the zone. Blocks (spins) until available.
    fn lock(&self);
    /// Release the zone. Must be called exactly once per successful `lock`.
    fn unlock(&self);
}

/// The spec's documented default: no synchronization at all.
///
/// Correct only for genuinely single-threaded callers. This is what the
/// engine uses if a caller never names a different port.
#[derive(Default)]
pub struct NoOpCriticalSection;

impl CriticalSection for NoOpCriticalSection {
    #[inline]
    fn create(&self) {}
    #[inline]
    fn lock(&self) {}
    #[inline]
    fn unlock(&self) {}
}

/// A coarse-grained global spinlock port, for preemptive multithreaded hosts.
///
/// Built directly on an `AtomicBool` test-and-set rather than on
/// `spin::Mutex`'s guard-returning API: the engine needs a bare
/// `lock()`/`unlock()` pair it can bracket around a mutating section (see
/// [`Section::enter`]), not a guard type threaded through every call site.
pub struct SpinCriticalSection {
    locked: AtomicBool,
}

impl SpinCriticalSection {
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }
}

impl Default for SpinCriticalSection {
    fn default() -> Self {
        Self::new()
    }
}

impl CriticalSection for SpinCriticalSection {
    #[inline]
    fn create(&self) {
        // The AtomicBool is already valid at construction; nothing to do.
    }

    fn lock(&self) {
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            core::hint::spin_loop();
        }
    }

    fn unlock(&self) {
        self.locked.store(false, Ordering::Release);
    }
}

/// RAII helper that calls `lock()` on construction and `unlock()` on drop.
///
/// This is how the engine satisfies the port contract's "release on every
/// return path" requirement without repeating a matching `unlock()` call at
/// every early-return site: the guard's `Drop` impl is that call.
pub struct Section<'a, C: CriticalSection> {
    port: &'a C,
}

impl<'a, C: CriticalSection> Section<'a, C> {
    /// Acquires `port` and returns a guard that releases it on drop.
    pub fn enter(port: &'a C) -> Self {
        port.lock();
        Self { port }
    }
}

impl<C: CriticalSection> Drop for Section<'_, C> {
    fn drop(&mut self) {
        self.port.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_methods_do_not_panic() {
        let port = NoOpCriticalSection;
        port.create();
        port.lock();
        port.unlock();
    }

    #[test]
    fn spin_port_round_trips() {
        let port = SpinCriticalSection::new();
        port.create();
        {
            let _section = Section::enter(&port);
            assert!(port.locked.load(Ordering::Relaxed));
        }
        assert!(!port.locked.load(Ordering::Relaxed));
    }

    #[test]
    fn spin_port_releases_on_early_return() {
        let port = SpinCriticalSection::new();

        fn protected(port: &SpinCriticalSection, fail: bool) -> Result<(), ()> {
            let _section = Section::enter(port);
            if fail {
                return Err(());
            }
            Ok(())
        }

        assert!(protected(&port, true).is_err());
        assert!(!port.locked.load(Ordering::Relaxed));
    }
}
