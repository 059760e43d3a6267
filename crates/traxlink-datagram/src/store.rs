//! Three attitude sample slots shared between one producer and one consumer.
//!
//! [`AttitudeStore::split`] hands out a [`Publisher`] (slot for the parser to
//! fill, plus `offer`) and a [`Reader`] (`update` plus accessors). Slots are
//! allocated once and reused in place.

use std::cell::UnsafeCell;
use std::sync::Arc;

use crate::component::{AttitudeSample, Axis};
use crate::triple::{Exclusion, LockExclusion, TripleBuffer};

/// Where the parser assembles a sample and how it announces completion.
pub trait SampleSink {
    /// The sample being filled in. Fields may be overwritten by later
    /// datagrams until `commit`.
    fn slot(&mut self) -> &mut AttitudeSample;

    /// The slot holds a complete, checksum-validated sample.
    fn commit(&mut self);
}

struct Shared<E> {
    slots: [UnsafeCell<AttitudeSample>; 3],
    buffer: TripleBuffer<E>,
}

// SAFETY: the slot at `write` is only touched through the single Publisher
// and the slot at `read` only through the single Reader. The indices change
// only inside the Exclusion sections, which order slot accesses on either
// side of a handoff.
unsafe impl<E: Exclusion + Sync> Sync for Shared<E> {}

/// A triple-buffered attitude store, before it is split.
pub struct AttitudeStore<E> {
    shared: Arc<Shared<E>>,
}

impl AttitudeStore<LockExclusion> {
    /// Store for a producer and consumer on separate threads.
    pub fn with_lock() -> Self {
        Self::new(LockExclusion::new())
    }
}

impl<E: Exclusion> AttitudeStore<E> {
    pub fn new(exclusion: E) -> Self {
        Self {
            shared: Arc::new(Shared {
                slots: Default::default(),
                buffer: TripleBuffer::new(exclusion),
            }),
        }
    }

    /// Hand out the two ends. Each exists exactly once.
    pub fn split(self) -> (Publisher<E>, Reader<E>) {
        let reader = Reader {
            shared: Arc::clone(&self.shared),
            observed: false,
        };
        (
            Publisher {
                shared: self.shared,
            },
            reader,
        )
    }
}

/// Producer end: exclusive access to the write slot.
pub struct Publisher<E> {
    shared: Arc<Shared<E>>,
}

impl<E: Exclusion> Publisher<E> {
    pub fn write_slot(&mut self) -> &mut AttitudeSample {
        let index = self.shared.buffer.write_index();
        // SAFETY: only this publisher accesses the write slot, and the write
        // index moves only in `offer`, which needs `&mut self` and so cannot
        // overlap the returned borrow.
        unsafe { &mut *self.shared.slots[index].get() }
    }

    /// Publish the write slot as the newest sample.
    pub fn offer(&mut self) {
        self.shared.buffer.offer();
    }
}

impl<E: Exclusion> SampleSink for Publisher<E> {
    fn slot(&mut self) -> &mut AttitudeSample {
        self.write_slot()
    }

    fn commit(&mut self) {
        self.offer();
    }
}

/// Consumer end: `update` plus read accessors.
///
/// Accessor results are stable between calls to `update` and change only
/// after an `update` that returned `true`.
pub struct Reader<E> {
    shared: Arc<Shared<E>>,
    observed: bool,
}

impl<E: Exclusion> Reader<E> {
    /// Adopt the newest offered sample, if there is one not yet seen.
    pub fn update(&mut self) -> bool {
        let updated = self.shared.buffer.update();
        self.observed |= updated;
        updated
    }

    pub fn sample(&self) -> &AttitudeSample {
        let index = self.shared.buffer.read_index();
        // SAFETY: only this reader accesses the read slot, and the read index
        // moves only in `update`, which needs `&mut self`.
        unsafe { &*self.shared.slots[index].get() }
    }

    /// Angle in degrees for `axis`.
    pub fn attitude(&self, axis: Axis) -> f32 {
        self.sample().attitude(axis)
    }

    pub fn heading_status(&self) -> u8 {
        self.sample().heading_status
    }

    /// Whether any `update` has succeeded. Until then the accessors return
    /// a zeroed sample.
    pub fn has_sample(&self) -> bool {
        self.observed
    }
}

/// Single-slot sink that keeps the most recent committed sample.
///
/// Used where producer and consumer are the same caller, such as decoding a
/// capture file.
#[derive(Debug, Default, Clone)]
pub struct Latest {
    slot: AttitudeSample,
    ready: Option<AttitudeSample>,
}

impl Latest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the last committed sample, leaving nothing pending.
    pub fn take(&mut self) -> Option<AttitudeSample> {
        self.ready.take()
    }

    pub fn peek(&self) -> Option<&AttitudeSample> {
        self.ready.as_ref()
    }
}

impl SampleSink for Latest {
    fn slot(&mut self) -> &mut AttitudeSample {
        &mut self.slot
    }

    fn commit(&mut self) {
        self.ready = Some(self.slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(n: u32) -> AttitudeSample {
        AttitudeSample {
            pitch: n as f32,
            yaw: (n * 2) as f32,
            roll: -(n as f32),
            heading_status: (n % 256) as u8,
        }
    }

    fn consistent(s: &AttitudeSample) -> Option<u32> {
        let n = s.pitch as u32;
        (s.yaw == (n * 2) as f32 && s.roll == -(n as f32) && s.heading_status == (n % 256) as u8)
            .then_some(n)
    }

    #[test]
    fn test_reader_starts_empty() {
        let (_publisher, mut reader) = AttitudeStore::with_lock().split();
        assert!(!reader.has_sample());
        assert_eq!(*reader.sample(), AttitudeSample::default());
        assert!(!reader.update());
        assert!(!reader.has_sample());
    }

    #[test]
    fn test_offer_visible_after_update() {
        let (mut publisher, mut reader) = AttitudeStore::with_lock().split();
        *publisher.write_slot() = sample(7);
        publisher.offer();

        assert_eq!(*reader.sample(), AttitudeSample::default());
        assert!(reader.update());
        assert!(reader.has_sample());
        assert_eq!(reader.attitude(Axis::Pitch), 7.0);
        assert_eq!(reader.attitude(Axis::Yaw), 14.0);
        assert_eq!(reader.attitude(Axis::Roll), -7.0);
        assert_eq!(reader.heading_status(), 7);
    }

    #[test]
    fn test_accessors_stable_until_update() {
        let (mut publisher, mut reader) = AttitudeStore::with_lock().split();
        *publisher.write_slot() = sample(1);
        publisher.offer();
        assert!(reader.update());

        *publisher.write_slot() = sample(2);
        publisher.offer();
        *publisher.write_slot() = sample(3);
        assert_eq!(*reader.sample(), sample(1));

        assert!(reader.update());
        assert_eq!(*reader.sample(), sample(2));
        assert!(!reader.update());
        assert_eq!(*reader.sample(), sample(2));
    }

    #[test]
    fn test_sink_commit_offers() {
        let (mut publisher, mut reader) = AttitudeStore::with_lock().split();
        publisher.slot().heading_status = 3;
        publisher.commit();
        assert!(reader.update());
        assert_eq!(reader.heading_status(), 3);
    }

    #[test]
    fn test_latest_keeps_only_committed() {
        let mut latest = Latest::new();
        latest.slot().pitch = 1.0;
        assert!(latest.peek().is_none());
        latest.commit();
        latest.slot().pitch = 2.0;
        assert_eq!(latest.take().map(|s| s.pitch), Some(1.0));
        assert!(latest.take().is_none());
    }

    #[test]
    fn test_concurrent_reader_never_sees_torn_sample() {
        const OFFERS: u32 = 200_000;
        let (mut publisher, mut reader) = AttitudeStore::with_lock().split();

        let producer = std::thread::spawn(move || {
            for n in 1..=OFFERS {
                let slot = publisher.write_slot();
                slot.pitch = n as f32;
                slot.yaw = (n * 2) as f32;
                slot.roll = -(n as f32);
                slot.heading_status = (n % 256) as u8;
                publisher.offer();
            }
        });

        let mut last = 0;
        while last < OFFERS {
            if reader.update() {
                let n = consistent(reader.sample())
                    .unwrap_or_else(|| panic!("torn sample {:?}", reader.sample()));
                assert!(n > last, "sample went backwards: {n} after {last}");
                last = n;
            }
        }
        producer.join().unwrap();
        assert!(!reader.update());
    }
}
