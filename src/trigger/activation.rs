//! Scoped trigger activation
//!
//! An `Activation` pairs one controller with one subscription for as long as
//! a wrapped subject is mounted. Dropping it (including during unwinding)
//! releases the subscription before the controller is discarded.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::config::Config;
use crate::events::TriggerEvent;
use crate::input::{Disposer, KeyEventSource, KeyId};

use super::controller::{TriggerController, TriggerState};

/// A live trigger bound to a key source
#[derive(Debug)]
pub struct Activation {
    controller: Rc<RefCell<TriggerController>>,
    subscription: Disposer,
}

impl Activation {
    /// Create a controller and subscribe it to `source`
    pub fn activate<S>(
        source: &S,
        config: &Config,
        event_tx: broadcast::Sender<TriggerEvent>,
    ) -> Self
    where
        S: KeyEventSource + ?Sized,
    {
        let controller = Rc::new(RefCell::new(TriggerController::new(config, event_tx)));

        // The handler only holds a weak reference, so a source that keeps it
        // past deactivation cannot reach the controller
        let weak: Weak<RefCell<TriggerController>> = Rc::downgrade(&controller);
        let subscription = source.subscribe(Box::new(move |key: &KeyId| {
            if let Some(controller) = weak.upgrade() {
                controller.borrow_mut().on_key(key);
            }
        }));

        info!(
            sequence = %config.sequence,
            policy = %config.reset,
            "trigger activated"
        );

        Self {
            controller,
            subscription,
        }
    }

    /// Current mode flag
    pub fn is_unlocked(&self) -> bool {
        self.controller.borrow().is_unlocked()
    }

    pub fn state(&self) -> TriggerState {
        self.controller.borrow().state()
    }

    /// Contents of the rolling window, oldest first
    pub fn snapshot(&self) -> Vec<KeyId> {
        self.controller.borrow().snapshot()
    }

    /// Turn the mode off and start collecting keys again
    pub fn reset(&self) {
        self.controller.borrow_mut().reset();
    }

    /// Release the subscription and discard all trigger state
    pub fn deactivate(self) {
        drop(self);
    }
}

impl Drop for Activation {
    fn drop(&mut self) {
        self.subscription.dispose();
        // A handler mid-dispatch may still hold the controller borrowed
        if let Ok(mut controller) = self.controller.try_borrow_mut() {
            controller.teardown();
        }
        debug!("trigger deactivated");
    }
}
