use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};

use hmilink_frame::Frame;
use tracing::{debug, error, trace};

use crate::error::RegistryError;

/// Number of consumer slots when none is configured.
pub const DEFAULT_SLOT_COUNT: usize = 10;

/// Receives every frame published while registered.
///
/// `on_frame` runs on the publishing thread with the registry lock held. It
/// must return promptly and must not call back into the same registry.
pub trait FrameConsumer: Send + Sync {
    fn on_frame(&self, frame: &Frame);

    /// Label used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> FrameConsumer for F
where
    F: Fn(&Frame) + Send + Sync,
{
    fn on_frame(&self, frame: &Frame) {
        self(frame)
    }
}

/// Token for one registration.
///
/// Ids from an earlier registration of a reused slot do not match the new
/// occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConsumerId {
    slot: usize,
    generation: u64,
}

impl ConsumerId {
    /// Slot the consumer was placed in.
    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// Registry configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Number of consumer slots. Default: 10.
    pub slots: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            slots: DEFAULT_SLOT_COUNT,
        }
    }
}

/// Delivery totals since the registry was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Frames passed to `publish`.
    pub published: u64,
    /// Consumer invocations, including ones that panicked.
    pub deliveries: u64,
    /// Consumer invocations that panicked.
    pub consumer_panics: u64,
}

struct Entry {
    consumer: Arc<dyn FrameConsumer>,
    generation: u64,
}

struct Slots {
    entries: Vec<Option<Entry>>,
    next_generation: u64,
    stats: DispatchStats,
}

/// Fixed-slot set of frame consumers.
///
/// One lock covers the slot table and the whole delivery pass, so a publish
/// sees exactly the registrations present when it started and a
/// registration change never lands in the middle of a pass.
pub struct HandlerRegistry {
    inner: Mutex<Slots>,
    capacity: usize,
}

impl HandlerRegistry {
    /// Create a registry with the default slot count.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a registry with explicit configuration.
    pub fn with_config(config: RegistryConfig) -> Self {
        let mut entries = Vec::with_capacity(config.slots);
        entries.resize_with(config.slots, || None);
        Self {
            inner: Mutex::new(Slots {
                entries,
                next_generation: 0,
                stats: DispatchStats::default(),
            }),
            capacity: config.slots,
        }
    }

    /// Shareable handle for use across threads.
    pub fn shared(config: RegistryConfig) -> Arc<Self> {
        Arc::new(Self::with_config(config))
    }

    /// Place a consumer in the lowest free slot.
    pub fn register(&self, consumer: Arc<dyn FrameConsumer>) -> Result<ConsumerId, RegistryError> {
        let mut slots = self.lock()?;

        if let Some(slot) = position_of(&slots.entries, &consumer) {
            return Err(RegistryError::AlreadyRegistered { slot });
        }
        let Some(slot) = slots.entries.iter().position(Option::is_none) else {
            return Err(RegistryError::Full {
                slots: self.capacity,
            });
        };

        let generation = slots.next_generation;
        slots.next_generation += 1;
        debug!(slot, consumer = consumer.name(), "consumer registered");
        slots.entries[slot] = Some(Entry {
            consumer,
            generation,
        });

        Ok(ConsumerId { slot, generation })
    }

    /// Remove the registration an id refers to.
    pub fn unregister(&self, id: ConsumerId) -> Result<(), RegistryError> {
        let mut slots = self.lock()?;
        let entry = slots
            .entries
            .get_mut(id.slot)
            .ok_or(RegistryError::NotRegistered)?;

        if !entry
            .as_ref()
            .is_some_and(|current| current.generation == id.generation)
        {
            return Err(RegistryError::NotRegistered);
        }
        if let Some(removed) = entry.take() {
            debug!(
                slot = id.slot,
                consumer = removed.consumer.name(),
                "consumer unregistered"
            );
        }
        Ok(())
    }

    /// Remove a consumer by identity.
    pub fn unregister_consumer(
        &self,
        consumer: &Arc<dyn FrameConsumer>,
    ) -> Result<(), RegistryError> {
        let mut slots = self.lock()?;
        let slot = position_of(&slots.entries, consumer).ok_or(RegistryError::NotRegistered)?;
        debug!(slot, consumer = consumer.name(), "consumer unregistered");
        slots.entries[slot] = None;
        Ok(())
    }

    /// Deliver a frame to every registered consumer in slot order.
    ///
    /// Returns the number of consumers invoked. A consumer that panics is
    /// logged and counted; delivery continues with the next slot.
    pub fn publish(&self, frame: &Frame) -> Result<usize, RegistryError> {
        let mut slots = self.lock()?;
        let Slots { entries, stats, .. } = &mut *slots;

        stats.published += 1;
        let mut invoked = 0;
        for (slot, entry) in entries.iter().enumerate() {
            let Some(entry) = entry else { continue };
            invoked += 1;
            let consumer = &entry.consumer;
            if catch_unwind(AssertUnwindSafe(|| consumer.on_frame(frame))).is_err() {
                stats.consumer_panics += 1;
                error!(slot, consumer = consumer.name(), "consumer panicked during delivery");
            }
        }
        stats.deliveries += invoked as u64;
        trace!(bytes = frame.len(), consumers = invoked, "frame published");

        Ok(invoked)
    }

    /// Whether this exact consumer is registered.
    pub fn contains(&self, consumer: &Arc<dyn FrameConsumer>) -> Result<bool, RegistryError> {
        Ok(position_of(&self.lock()?.entries, consumer).is_some())
    }

    /// Number of occupied slots.
    pub fn len(&self) -> Result<usize, RegistryError> {
        Ok(self.lock()?.entries.iter().flatten().count())
    }

    pub fn is_empty(&self) -> Result<bool, RegistryError> {
        Ok(self.len()? == 0)
    }

    /// Total number of slots.
    pub fn slots(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> Result<DispatchStats, RegistryError> {
        Ok(self.lock()?.stats)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Slots>, RegistryError> {
        self.inner.lock().map_err(|_| RegistryError::Poisoned)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("slots", &self.capacity)
            .finish_non_exhaustive()
    }
}

fn position_of(entries: &[Option<Entry>], consumer: &Arc<dyn FrameConsumer>) -> Option<usize> {
    entries.iter().position(|entry| {
        entry
            .as_ref()
            .is_some_and(|e| std::ptr::addr_eq(Arc::as_ptr(&e.consumer), Arc::as_ptr(consumer)))
    })
}
