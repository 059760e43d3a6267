//! Triple-buffer index rotation.
//!
//! Three slot indices (`write`, `clean`, `read`) always form a permutation of
//! `{0, 1, 2}`. The producer owns `write`, the consumer owns `read`, and
//! `clean` is the handoff slot touched only inside [`TripleBuffer::offer`] and
//! [`TripleBuffer::update`]. The most recent offer wins and the producer is
//! never blocked by the consumer.
//!
//! The critical section around each rotation is injected through
//! [`Exclusion`]: [`LockExclusion`] for threads, [`InterruptExclusion`] for a
//! producer running in an interrupt handler.

use std::sync::atomic::{compiler_fence, AtomicBool, AtomicU8, Ordering};
use std::sync::{Mutex, PoisonError};

/// Critical-section strategy wrapped around index rotation.
///
/// # Safety
///
/// Implementations must make every memory access before an `offer_section`
/// visible to the code following any later `update_section`, and must never
/// let the two sections run concurrently. Slot contents are shared without
/// further synchronization on the strength of this guarantee.
pub unsafe trait Exclusion {
    fn offer_section<R>(&self, section: impl FnOnce() -> R) -> R;
    fn update_section<R>(&self, section: impl FnOnce() -> R) -> R;
}

/// Both rotations hold one mutex, for a producer and consumer on separate
/// threads.
#[derive(Debug, Default)]
pub struct LockExclusion {
    lock: Mutex<()>,
}

impl LockExclusion {
    pub fn new() -> Self {
        Self::default()
    }
}

// SAFETY: the mutex serializes the sections and its release/acquire pair
// orders slot accesses around them.
unsafe impl Exclusion for LockExclusion {
    fn offer_section<R>(&self, section: impl FnOnce() -> R) -> R {
        // Poison is ignored; a section holds no state across a panic.
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        section()
    }

    fn update_section<R>(&self, section: impl FnOnce() -> R) -> R {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        section()
    }
}

/// Gate for the interrupt that runs the producer.
pub trait InterruptSource {
    fn is_enabled(&self) -> bool;
    fn disable(&self);
    fn enable(&self);
}

/// Exclusion for a producer running in an interrupt handler on the same core
/// as the consumer.
///
/// `offer` runs with the consumer suspended, so it only needs a release fence
/// before rotating. `update` masks the producer's interrupt (if it is
/// enabled) around its rotation and issues an acquire fence before unmasking.
#[derive(Debug)]
pub struct InterruptExclusion<S> {
    source: S,
}

impl<S: InterruptSource> InterruptExclusion<S> {
    /// # Safety
    ///
    /// `offer` must only be called from the interrupt handler that `source`
    /// gates, `update` must run on the same core, and `source.disable()` must
    /// keep that handler from running until `source.enable()`.
    pub unsafe fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

// SAFETY: upheld by the contract of `InterruptExclusion::new`. With both
// sides on one core, compiler fences are enough to order slot accesses.
unsafe impl<S: InterruptSource> Exclusion for InterruptExclusion<S> {
    fn offer_section<R>(&self, section: impl FnOnce() -> R) -> R {
        compiler_fence(Ordering::Release);
        section()
    }

    fn update_section<R>(&self, section: impl FnOnce() -> R) -> R {
        if !self.source.is_enabled() {
            let out = section();
            compiler_fence(Ordering::Acquire);
            return out;
        }
        self.source.disable();
        compiler_fence(Ordering::SeqCst);
        let out = section();
        compiler_fence(Ordering::Acquire);
        self.source.enable();
        out
    }
}

/// Snapshot of the rotation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Indices {
    pub write: u8,
    pub clean: u8,
    pub read: u8,
    pub fresh: bool,
}

impl Indices {
    pub const INITIAL: Indices = Indices {
        write: 0,
        clean: 1,
        read: 2,
        fresh: false,
    };

    /// Whether the three indices are a permutation of `{0, 1, 2}`.
    pub fn is_valid(&self) -> bool {
        let [write, clean, read] = [self.write, self.clean, self.read];
        write < 3 && clean < 3 && read < 3 && (1u8 << write | 1 << clean | 1 << read) == 0b111
    }
}

/// The rotating index triple plus its `fresh` flag.
///
/// Accesses inside the sections are relaxed; ordering comes from the
/// [`Exclusion`].
#[derive(Debug)]
pub struct TripleBuffer<E> {
    write: AtomicU8,
    clean: AtomicU8,
    read: AtomicU8,
    fresh: AtomicBool,
    exclusion: E,
}

impl<E: Exclusion> TripleBuffer<E> {
    pub fn new(exclusion: E) -> Self {
        let Indices {
            write,
            clean,
            read,
            fresh,
        } = Indices::INITIAL;
        Self {
            write: AtomicU8::new(write),
            clean: AtomicU8::new(clean),
            read: AtomicU8::new(read),
            fresh: AtomicBool::new(fresh),
            exclusion,
        }
    }

    /// Producer side: publish the write slot and take the clean one.
    pub fn offer(&self) {
        self.exclusion.offer_section(|| {
            let write = self.write.load(Ordering::Relaxed);
            let clean = self.clean.load(Ordering::Relaxed);
            self.write.store(clean, Ordering::Relaxed);
            self.clean.store(write, Ordering::Relaxed);
            self.fresh.store(true, Ordering::Relaxed);
            debug_assert!(self.snapshot().is_valid(), "index triple corrupted by offer");
        });
    }

    /// Consumer side: take the clean slot if it holds an unseen offer.
    /// Returns `false` and leaves everything unchanged otherwise.
    pub fn update(&self) -> bool {
        self.exclusion.update_section(|| {
            if !self.fresh.load(Ordering::Relaxed) {
                return false;
            }
            let read = self.read.load(Ordering::Relaxed);
            let clean = self.clean.load(Ordering::Relaxed);
            self.read.store(clean, Ordering::Relaxed);
            self.clean.store(read, Ordering::Relaxed);
            self.fresh.store(false, Ordering::Relaxed);
            debug_assert!(self.snapshot().is_valid(), "index triple corrupted by update");
            true
        })
    }

    /// Slot currently owned by the producer.
    pub fn write_index(&self) -> usize {
        usize::from(self.write.load(Ordering::Relaxed))
    }

    /// Slot currently owned by the consumer.
    pub fn read_index(&self) -> usize {
        usize::from(self.read.load(Ordering::Relaxed))
    }

    pub fn exclusion(&self) -> &E {
        &self.exclusion
    }

    /// Current indices. Only coherent when neither side is rotating.
    pub fn snapshot(&self) -> Indices {
        Indices {
            write: self.write.load(Ordering::Relaxed),
            clean: self.clean.load(Ordering::Relaxed),
            read: self.read.load(Ordering::Relaxed),
            fresh: self.fresh.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug)]
    struct FakeInterrupt {
        enabled: Cell<bool>,
        disables: Cell<u32>,
        enables: Cell<u32>,
    }

    impl FakeInterrupt {
        fn new(enabled: bool) -> Self {
            Self {
                enabled: Cell::new(enabled),
                disables: Cell::new(0),
                enables: Cell::new(0),
            }
        }
    }

    impl InterruptSource for FakeInterrupt {
        fn is_enabled(&self) -> bool {
            self.enabled.get()
        }

        fn disable(&self) {
            self.enabled.set(false);
            self.disables.set(self.disables.get() + 1);
        }

        fn enable(&self) {
            self.enabled.set(true);
            self.enables.set(self.enables.get() + 1);
        }
    }

    fn interrupt_buffer(enabled: bool) -> TripleBuffer<InterruptExclusion<FakeInterrupt>> {
        // SAFETY: single-threaded test; offer and update never overlap.
        TripleBuffer::new(unsafe { InterruptExclusion::new(FakeInterrupt::new(enabled)) })
    }

    #[test]
    fn test_initial_state() {
        let buffer = TripleBuffer::new(LockExclusion::new());
        assert_eq!(buffer.snapshot(), Indices::INITIAL);
        assert_eq!(buffer.write_index(), 0);
        assert_eq!(buffer.read_index(), 2);
    }

    #[test]
    fn test_update_without_offer() {
        let buffer = TripleBuffer::new(LockExclusion::new());
        assert!(!buffer.update());
        assert_eq!(buffer.snapshot(), Indices::INITIAL);
    }

    #[test]
    fn test_offer_then_update_twice() {
        let buffer = TripleBuffer::new(LockExclusion::new());
        let written = buffer.write_index();
        buffer.offer();
        assert!(buffer.snapshot().fresh);
        assert_ne!(buffer.write_index(), written);

        assert!(buffer.update());
        assert_eq!(buffer.read_index(), written);
        assert!(!buffer.update());
        assert_eq!(buffer.read_index(), written);
    }

    #[test]
    fn test_most_recent_offer_wins() {
        let buffer = TripleBuffer::new(LockExclusion::new());
        buffer.offer();
        let second = buffer.write_index();
        buffer.offer();
        let third = buffer.write_index();
        buffer.offer();

        assert!(buffer.update());
        assert_eq!(buffer.read_index(), third);
        assert_ne!(buffer.read_index(), second);
    }

    #[test]
    fn test_indices_stay_a_permutation() {
        let buffer = TripleBuffer::new(LockExclusion::new());
        let mut state: u32 = 0x2545_F491;
        for _ in 0..10_000 {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            if state & 1 == 0 {
                buffer.offer();
            } else {
                buffer.update();
            }
            let snapshot = buffer.snapshot();
            assert!(snapshot.is_valid(), "{snapshot:?}");
            assert_ne!(buffer.write_index(), buffer.read_index());
        }
    }

    #[test]
    fn test_write_slot_never_handed_to_reader_early() {
        let buffer = TripleBuffer::new(LockExclusion::new());
        for _ in 0..5 {
            let write = buffer.write_index();
            buffer.update();
            assert_ne!(buffer.read_index(), write);
            buffer.offer();
        }
    }

    #[test]
    fn test_interrupt_update_masks_and_restores() {
        let buffer = interrupt_buffer(true);
        buffer.offer();
        assert!(buffer.update());

        let source = buffer.exclusion().source();
        assert_eq!(source.disables.get(), 1);
        assert_eq!(source.enables.get(), 1);
        assert!(source.is_enabled());
    }

    #[test]
    fn test_interrupt_update_leaves_disabled_source_alone() {
        let buffer = interrupt_buffer(false);
        buffer.offer();
        assert!(buffer.update());

        let source = buffer.exclusion().source();
        assert_eq!(source.disables.get(), 0);
        assert_eq!(source.enables.get(), 0);
        assert!(!source.is_enabled());
    }

    #[test]
    fn test_interrupt_offer_does_not_touch_source() {
        let buffer = interrupt_buffer(true);
        buffer.offer();
        buffer.offer();
        let source = buffer.exclusion().source();
        assert_eq!(source.disables.get(), 0);
        assert!(buffer.update());
        assert!(!buffer.update());
    }

    #[test]
    fn test_invalid_indices_detected() {
        let indices = Indices {
            write: 1,
            clean: 1,
            read: 2,
            fresh: false,
        };
        assert!(!indices.is_valid());
        assert!(Indices::INITIAL.is_valid());
    }
}
