/// Event bus.
///
/// A single ordered stream of [`SimEvent`]s, pushed synchronously to every
/// subscriber in publication order. Immediately repeated, value-equal
/// events are dropped at the bus boundary by a one-slot comparison buffer;
/// non-adjacent repeats are delivered normally.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::error::{SimError, SimResult};
use crate::event::SimEvent;

// ── Subscriber trait ──────────────────────────────────────────────────

/// Receives events published on the bus.
pub trait EventSubscriber {
    /// Called for every delivered event.
    fn on_event(&mut self, event: &SimEvent);

    /// Called exactly once when the bus closes. The default does nothing.
    fn on_complete(&mut self) {}
}

/// A subscriber backed by a closure, handy in tests and one-off scripts.
impl<F> EventSubscriber for F
where
    F: FnMut(&SimEvent),
{
    fn on_event(&mut self, event: &SimEvent) {
        (self)(event);
    }
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

// ── EventBus ──────────────────────────────────────────────────────────

/// Multicast, replayless, adjacent-deduplicating event stream.
pub struct EventBus {
    subscribers: Vec<(SubscriptionId, Box<dyn EventSubscriber>)>,
    /// Last event that went out; the dedup comparison buffer.
    last: Option<SimEvent>,
    next_subscription: u64,
    delivered: u64,
    suppressed: u64,
    closed: bool,
}

impl EventBus {
    pub fn new() -> Self {
        EventBus {
            subscribers: Vec::new(),
            last: None,
            next_subscription: 0,
            delivered: 0,
            suppressed: 0,
            closed: false,
        }
    }

    /// Register a subscriber. It sees only events published from now on.
    pub fn subscribe(&mut self, subscriber: Box<dyn EventSubscriber>) -> SimResult<SubscriptionId> {
        if self.closed {
            return Err(SimError::Closed);
        }
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, subscriber));
        Ok(id)
    }

    /// Remove a subscriber without signalling completion to it.
    ///
    /// Returns `false` if the subscription was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Publish an event to every subscriber.
    ///
    /// Returns `Ok(false)` if the event was dropped because it equals the
    /// event published immediately before it.
    pub fn publish(&mut self, event: SimEvent) -> SimResult<bool> {
        if self.closed {
            return Err(SimError::Closed);
        }
        if self.last.as_ref() == Some(&event) {
            self.suppressed += 1;
            trace!(event = %event, "suppressed repeated event");
            return Ok(false);
        }

        trace!(event = %event, subscribers = self.subscribers.len(), "publish");
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber.on_event(&event);
        }
        self.delivered += 1;
        self.last = Some(event);
        Ok(true)
    }

    /// Signal completion to every subscriber and refuse further traffic.
    ///
    /// Returns `false` if the bus was already closed.
    pub fn close(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        for (_, mut subscriber) in self.subscribers.drain(..) {
            subscriber.on_complete();
        }
        self.last = None;
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Number of events delivered so far.
    pub fn delivered_count(&self) -> u64 {
        self.delivered
    }

    /// Number of events dropped as adjacent duplicates.
    pub fn suppressed_count(&self) -> u64 {
        self.suppressed
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .field("delivered", &self.delivered)
            .field("suppressed", &self.suppressed)
            .field("closed", &self.closed)
            .finish()
    }
}

// ── EventRecorder ─────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Recording {
    events: Vec<SimEvent>,
    completions: u32,
}

/// A subscriber that records everything it receives.
///
/// Cloning a recorder shares the underlying recording, so one clone can
/// be handed to the bus while the other is kept for inspection.
///
/// ```rust
/// use selene::{EventRecorder, Simulation};
///
/// let mut sim = Simulation::new();
/// let recorder = EventRecorder::new();
/// sim.subscribe(Box::new(recorder.clone())).unwrap();
/// sim.tick(0.016).unwrap();
/// assert_eq!(recorder.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    inner: Rc<RefCell<Recording>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of every event recorded so far.
    pub fn events(&self) -> Vec<SimEvent> {
        self.inner.borrow().events.clone()
    }

    /// The event at `index`, if recorded.
    pub fn get(&self, index: usize) -> Option<SimEvent> {
        self.inner.borrow().events.get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().events.is_empty()
    }

    /// How many times completion was signalled.
    pub fn completions(&self) -> u32 {
        self.inner.borrow().completions
    }

    /// Kinds of the recorded events, in order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.inner.borrow().events.iter().map(SimEvent::kind).collect()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.inner.borrow_mut().events.clear();
    }
}

impl EventSubscriber for EventRecorder {
    fn on_event(&mut self, event: &SimEvent) {
        self.inner.borrow_mut().events.push(event.clone());
    }

    fn on_complete(&mut self) {
        self.inner.borrow_mut().completions += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::DeviceId;
    use crate::time::Frame;
    use uuid::Uuid;

    fn created() -> SimEvent {
        SimEvent::DeviceCreated {
            device: DeviceId::from_uuid(Uuid::new_v4()),
        }
    }

    #[test]
    fn test_multicast_same_order() {
        let mut bus = EventBus::new();
        let a = EventRecorder::new();
        let b = EventRecorder::new();
        bus.subscribe(Box::new(a.clone())).unwrap();
        bus.subscribe(Box::new(b.clone())).unwrap();

        let e1 = created();
        let e2 = created();
        bus.publish(e1.clone()).unwrap();
        bus.publish(e2.clone()).unwrap();

        assert_eq!(a.events(), vec![e1.clone(), e2.clone()]);
        assert_eq!(b.events(), vec![e1, e2]);
    }

    #[test]
    fn test_adjacent_duplicates_suppressed() {
        let mut bus = EventBus::new();
        let rec = EventRecorder::new();
        bus.subscribe(Box::new(rec.clone())).unwrap();

        let e1 = created();
        let e2 = created();
        assert!(bus.publish(e1.clone()).unwrap());
        assert!(!bus.publish(e1.clone()).unwrap());
        assert!(bus.publish(e2.clone()).unwrap());
        // Non-adjacent repeat goes through.
        assert!(bus.publish(e1.clone()).unwrap());

        assert_eq!(rec.events(), vec![e1.clone(), e2, e1]);
        assert_eq!(bus.delivered_count(), 3);
        assert_eq!(bus.suppressed_count(), 1);
    }

    #[test]
    fn test_late_subscriber_misses_prior_events() {
        let mut bus = EventBus::new();
        bus.publish(created()).unwrap();

        let rec = EventRecorder::new();
        bus.subscribe(Box::new(rec.clone())).unwrap();
        assert!(rec.is_empty());

        bus.publish(SimEvent::Tick {
            frame: Frame::ZERO,
            delta_seconds: 1.0,
        })
        .unwrap();
        assert_eq!(rec.len(), 1);
    }

    #[test]
    fn test_close_completes_once_and_rejects_publish() {
        let mut bus = EventBus::new();
        let rec = EventRecorder::new();
        bus.subscribe(Box::new(rec.clone())).unwrap();

        assert!(bus.close());
        assert!(!bus.close());
        assert_eq!(rec.completions(), 1);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.publish(created()), Err(SimError::Closed));
        assert!(bus.subscribe(Box::new(EventRecorder::new())).is_err());
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut bus = EventBus::new();
        let rec = EventRecorder::new();
        let id = bus.subscribe(Box::new(rec.clone())).unwrap();
        bus.publish(created()).unwrap();
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(created()).unwrap();
        assert_eq!(rec.len(), 1);

        bus.close();
        assert_eq!(rec.completions(), 0);
    }

    #[test]
    fn test_closure_subscriber() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(0u32));
        let counter = Rc::clone(&seen);
        bus.subscribe(Box::new(move |_e: &SimEvent| {
            *counter.borrow_mut() += 1;
        }))
        .unwrap();
        bus.publish(created()).unwrap();
        bus.publish(created()).unwrap();
        assert_eq!(*seen.borrow(), 2);
    }
}
