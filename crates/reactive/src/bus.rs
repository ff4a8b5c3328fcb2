//! Publish/subscribe for Sift.
//!
//! `Emitter` is the capability a view is constructed with; `EventBus` is the
//! default implementation. Delivery is synchronous and follows subscription
//! order.

use crate::event::{Event, Topic};
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

/// Unique identifier for a subscription.
pub type SubscriptionId = u64;

/// Callback type for event notifications.
pub type Listener<Ev> = Rc<dyn Fn(&Ev)>;

/// The publish/subscribe capability.
pub trait Emitter<Ev> {
    /// Subscribes a listener to a topic and returns its id.
    fn on(&self, topic: Topic, listener: Listener<Ev>) -> SubscriptionId;

    /// Unsubscribes by id. Returns true if the subscription existed.
    fn off(&self, id: SubscriptionId) -> bool;

    /// Delivers an event to every matching listener.
    fn emit(&self, event: &Ev);

    /// Returns the number of subscriptions.
    fn listener_count(&self) -> usize;
}

/// A subscription to events.
struct Subscription<Ev> {
    /// Unique identifier
    id: SubscriptionId,
    /// Which events are delivered
    topic: Topic,
    /// Callback to invoke
    listener: Listener<Ev>,
}

/// The default `Emitter`: an ordered list of subscriptions.
///
/// Listeners may subscribe or unsubscribe while an event is being delivered.
/// Each `emit` dispatches to the subscriptions that existed when it started.
pub struct EventBus<Ev> {
    /// Subscriptions in subscription order
    subscriptions: RefCell<Vec<Subscription<Ev>>>,
    /// Next subscription ID to assign
    next_id: Cell<SubscriptionId>,
}

impl<Ev> Default for EventBus<Ev> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ev> EventBus<Ev> {
    /// Creates a bus with no subscriptions.
    pub fn new() -> Self {
        Self {
            subscriptions: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        }
    }

    /// Subscribes a closure to a topic.
    pub fn subscribe<F>(&self, topic: Topic, callback: F) -> SubscriptionId
    where
        F: Fn(&Ev) + 'static,
    {
        self.insert(topic, Rc::new(callback))
    }

    /// Returns true if there are no subscriptions.
    pub fn is_empty(&self) -> bool {
        self.subscriptions.borrow().is_empty()
    }

    /// Returns all subscription IDs.
    pub fn subscription_ids(&self) -> Vec<SubscriptionId> {
        self.subscriptions.borrow().iter().map(|s| s.id).collect()
    }

    /// Clears all subscriptions.
    pub fn clear(&self) {
        self.subscriptions.borrow_mut().clear();
    }

    fn insert(&self, topic: Topic, listener: Listener<Ev>) -> SubscriptionId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.subscriptions.borrow_mut().push(Subscription {
            id,
            topic,
            listener,
        });
        id
    }
}

impl<Ev: Event> Emitter<Ev> for EventBus<Ev> {
    fn on(&self, topic: Topic, listener: Listener<Ev>) -> SubscriptionId {
        self.insert(topic, listener)
    }

    fn off(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscriptions.borrow_mut();
        let before = subs.len();
        subs.retain(|s| s.id != id);
        subs.len() != before
    }

    fn emit(&self, event: &Ev) {
        let name = event.name();
        // Snapshot so listeners can re-enter the bus
        let targets: Vec<Listener<Ev>> = self
            .subscriptions
            .borrow()
            .iter()
            .filter(|s| s.topic.matches(&name))
            .map(|s| Rc::clone(&s.listener))
            .collect();
        for listener in targets {
            listener(event);
        }
    }

    fn listener_count(&self) -> usize {
        self.subscriptions.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::borrow::Cow;
    use alloc::string::String;
    use alloc::vec;

    struct Ping(&'static str);

    impl Event for Ping {
        fn name(&self) -> Cow<'_, str> {
            Cow::Borrowed(self.0)
        }
    }

    #[test]
    fn test_subscribe_assigns_ids() {
        let bus: EventBus<Ping> = EventBus::new();

        let id1 = bus.subscribe(Topic::All, |_| {});
        let id2 = bus.subscribe(Topic::All, |_| {});

        assert_eq!(id1, 1);
        assert_eq!(id2, 2);
        assert_eq!(bus.listener_count(), 2);
        assert_eq!(bus.subscription_ids(), vec![1, 2]);
    }

    #[test]
    fn test_off() {
        let bus: EventBus<Ping> = EventBus::new();

        let id = bus.subscribe(Topic::All, |_| {});
        assert!(bus.off(id));
        assert!(bus.is_empty());
        assert!(!bus.off(id)); // Already removed
    }

    #[test]
    fn test_emit_routes_by_topic() {
        let bus: EventBus<Ping> = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = log.clone();
        bus.subscribe(Topic::named("add"), move |e| l.borrow_mut().push(String::from(e.0)));
        let l = log.clone();
        bus.subscribe(Topic::All, move |e| l.borrow_mut().push(alloc::format!("all:{}", e.0)));

        bus.emit(&Ping("add"));
        bus.emit(&Ping("remove"));

        assert_eq!(*log.borrow(), vec!["add", "all:add", "all:remove"]);
    }

    #[test]
    fn test_emit_in_subscription_order() {
        let bus: EventBus<Ping> = EventBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        for i in 0..5 {
            let o = order.clone();
            bus.subscribe(Topic::All, move |_| o.borrow_mut().push(i));
        }
        bus.emit(&Ping("x"));

        assert_eq!(*order.borrow(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_listener_can_reenter() {
        let bus: Rc<EventBus<Ping>> = Rc::new(EventBus::new());
        let count = Rc::new(Cell::new(0));

        let b = bus.clone();
        let c = count.clone();
        let id = bus.subscribe(Topic::All, move |_| {
            c.set(c.get() + 1);
            // Subscribing from inside a listener must not panic
            b.subscribe(Topic::named("late"), |_| {});
        });
        bus.emit(&Ping("first"));
        assert_eq!(count.get(), 1);
        assert_eq!(bus.listener_count(), 2);

        // Unsubscribing itself from inside a listener
        let b = bus.clone();
        bus.subscribe(Topic::named("stop"), move |_| {
            b.off(id);
        });
        bus.emit(&Ping("stop"));
        assert_eq!(count.get(), 2); // snapshot still delivered once
        bus.emit(&Ping("stop"));
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_clear() {
        let bus: EventBus<Ping> = EventBus::new();
        bus.subscribe(Topic::All, |_| {});
        bus.subscribe(Topic::All, |_| {});
        bus.clear();
        assert!(bus.is_empty());
    }
}
