//! Key event subscription
//!
//! A `KeyEventSource` hands normalized keys to subscribed handlers until the
//! returned `Disposer` is invoked. `KeyDispatcher` is the in-process source
//! the host loop feeds.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use super::key::KeyId;

/// Callback receiving each key press in arrival order
pub type KeyHandler = Box<dyn FnMut(&KeyId)>;

/// A stream of normalized key presses that handlers can subscribe to
pub trait KeyEventSource {
    /// Deliver every subsequent key to `on_key` until the disposer runs
    fn subscribe(&self, on_key: KeyHandler) -> Disposer;
}

/// Releases a subscription
///
/// Disposing is idempotent, and dropping an undisposed `Disposer` disposes it.
#[must_use = "dropping a Disposer releases the subscription immediately"]
pub struct Disposer {
    release: Option<Box<dyn FnOnce()>>,
}

impl Disposer {
    /// Create a disposer that runs `release` exactly once
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Release the subscription; later calls do nothing
    pub fn dispose(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    /// Whether `dispose` has already run
    pub fn is_disposed(&self) -> bool {
        self.release.is_none()
    }
}

impl Drop for Disposer {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Disposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposer")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

struct Subscriber {
    id: u64,
    live: Rc<Cell<bool>>,
    handler: Rc<RefCell<KeyHandler>>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

/// Fans dispatched keys out to live subscribers in subscription order
#[derive(Clone, Default)]
pub struct KeyDispatcher {
    registry: Rc<RefCell<Registry>>,
}

impl KeyDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one key to every live subscriber
    ///
    /// Subscribers are snapshotted first so handlers may subscribe or dispose
    /// while the key is in flight. Liveness is rechecked right before each
    /// call, so a subscription disposed mid-dispatch sees nothing further.
    pub fn dispatch(&self, key: &KeyId) {
        let targets: Vec<(Rc<Cell<bool>>, Rc<RefCell<KeyHandler>>)> = self
            .registry
            .borrow()
            .subscribers
            .iter()
            .map(|s| (Rc::clone(&s.live), Rc::clone(&s.handler)))
            .collect();

        trace!(%key, subscribers = targets.len(), "dispatching key");

        for (live, handler) in targets {
            if !live.get() {
                continue;
            }
            // A handler re-entering dispatch for itself is skipped
            if let Ok(mut handler) = handler.try_borrow_mut() {
                (*handler)(key);
            }
        }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.registry.borrow().subscribers.len()
    }
}

impl KeyEventSource for KeyDispatcher {
    fn subscribe(&self, on_key: KeyHandler) -> Disposer {
        let live = Rc::new(Cell::new(true));
        let id = {
            let mut registry = self.registry.borrow_mut();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.subscribers.push(Subscriber {
                id,
                live: Rc::clone(&live),
                handler: Rc::new(RefCell::new(on_key)),
            });
            id
        };

        trace!(id, "key subscriber added");

        let registry: Weak<RefCell<Registry>> = Rc::downgrade(&self.registry);
        Disposer::new(move || {
            live.set(false);
            if let Some(registry) = registry.upgrade() {
                registry.borrow_mut().subscribers.retain(|s| s.id != id);
                trace!(id, "key subscriber removed");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<KeyId>>>, KeyHandler) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let handler: KeyHandler = Box::new(move |key: &KeyId| sink.borrow_mut().push(key.clone()));
        (seen, handler)
    }

    #[test]
    fn test_delivers_in_order_exactly_once() {
        let dispatcher = KeyDispatcher::new();
        let (seen, handler) = recorder();
        let _sub = dispatcher.subscribe(handler);

        dispatcher.dispatch(&KeyId::ARROW_UP);
        dispatcher.dispatch(&KeyId::char('b'));
        dispatcher.dispatch(&KeyId::ARROW_DOWN);

        assert_eq!(
            *seen.borrow(),
            vec![KeyId::ARROW_UP, KeyId::char('b'), KeyId::ARROW_DOWN]
        );
    }

    #[test]
    fn test_no_delivery_outside_subscription() {
        let dispatcher = KeyDispatcher::new();
        dispatcher.dispatch(&KeyId::char('x'));

        let (seen, handler) = recorder();
        let mut sub = dispatcher.subscribe(handler);
        dispatcher.dispatch(&KeyId::char('y'));
        sub.dispose();
        dispatcher.dispatch(&KeyId::char('z'));

        assert_eq!(*seen.borrow(), vec![KeyId::char('y')]);
        assert_eq!(dispatcher.subscriber_count(), 0);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let dispatcher = KeyDispatcher::new();
        let (_seen, handler) = recorder();
        let (_other_seen, other) = recorder();
        let mut sub = dispatcher.subscribe(handler);
        let _other = dispatcher.subscribe(other);

        sub.dispose();
        sub.dispose();
        assert!(sub.is_disposed());
        assert_eq!(dispatcher.subscriber_count(), 1);
    }

    #[test]
    fn test_drop_disposes() {
        let dispatcher = KeyDispatcher::new();
        let (seen, handler) = recorder();
        {
            let _sub = dispatcher.subscribe(handler);
            assert_eq!(dispatcher.subscriber_count(), 1);
        }
        dispatcher.dispatch(&KeyId::char('a'));
        assert!(seen.borrow().is_empty());
        assert_eq!(dispatcher.subscriber_count(), 0);
    }

    #[test]
    fn test_dispose_during_dispatch_stops_later_subscriber() {
        let dispatcher = KeyDispatcher::new();
        let (seen, handler) = recorder();
        let victim: Rc<RefCell<Option<Disposer>>> = Rc::new(RefCell::new(None));

        let slot = Rc::clone(&victim);
        let _killer = dispatcher.subscribe(Box::new(move |_key: &KeyId| {
            if let Some(mut disposer) = slot.borrow_mut().take() {
                disposer.dispose();
            }
        }));
        *victim.borrow_mut() = Some(dispatcher.subscribe(handler));

        dispatcher.dispatch(&KeyId::char('a'));
        dispatcher.dispatch(&KeyId::char('b'));

        assert!(seen.borrow().is_empty());
        assert_eq!(dispatcher.subscriber_count(), 1);
    }

    #[test]
    fn test_subscribe_during_dispatch_starts_with_next_key() {
        let dispatcher = KeyDispatcher::new();
        let (seen, handler) = recorder();
        let pending = Rc::new(RefCell::new(Some(handler)));
        let keep: Rc<RefCell<Vec<Disposer>>> = Rc::new(RefCell::new(Vec::new()));

        let inner = dispatcher.clone();
        let pending_slot = Rc::clone(&pending);
        let keep_slot = Rc::clone(&keep);
        let _outer = dispatcher.subscribe(Box::new(move |_key: &KeyId| {
            if let Some(handler) = pending_slot.borrow_mut().take() {
                keep_slot.borrow_mut().push(inner.subscribe(handler));
            }
        }));

        dispatcher.dispatch(&KeyId::char('a'));
        dispatcher.dispatch(&KeyId::char('b'));

        assert_eq!(*seen.borrow(), vec![KeyId::char('b')]);
    }

    #[test]
    fn test_disposer_outlives_dispatcher() {
        let dispatcher = KeyDispatcher::new();
        let (_seen, handler) = recorder();
        let mut sub = dispatcher.subscribe(handler);
        drop(dispatcher);
        sub.dispose();
        assert!(sub.is_disposed());
    }
}
