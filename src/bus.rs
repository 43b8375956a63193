// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! In-process notifications of namespace enable/disable changes.

use std::fmt;
use std::sync::Arc;
use std::sync::Weak;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use parking_lot::Mutex;

/// The kind of a namespace change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// The namespace was enabled.
    Enable,
    /// The namespace was disabled.
    Disable,
}

/// A namespace change, carrying the raw token that was toggled.
///
/// The namespace is the token as written in the spec, not its compiled pattern. Subscribers
/// compare it to their own namespace by exact string equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    kind: ChangeKind,
    namespace: String,
}

impl ChangeEvent {
    /// Create an enable event.
    pub fn enable(namespace: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Enable,
            namespace: namespace.into(),
        }
    }

    /// Create a disable event.
    pub fn disable(namespace: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Disable,
            namespace: namespace.into(),
        }
    }

    /// The kind of change.
    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    /// The raw namespace token.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

type Callback = Arc<dyn Fn(&ChangeEvent) + Send + Sync + 'static>;

#[derive(Default)]
struct BusInner {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(u64, Callback)>>,
}

/// A publish/subscribe bus for [`ChangeEvent`]s.
///
/// Cloning yields another handle to the same bus.
#[derive(Clone, Default)]
pub struct ChangeBus {
    inner: Arc<BusInner>,
}

impl fmt::Debug for ChangeBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl ChangeBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for every published event.
    ///
    /// The callback stays registered until the returned [`Subscription`] is dropped or disposed.
    pub fn subscribe(
        &self,
        callback: impl Fn(&ChangeEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers.lock().push((id, Arc::new(callback)));
        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver an event to every current subscriber, in subscription order.
    ///
    /// Callbacks run without the subscriber list locked, so they may subscribe or unsubscribe.
    pub fn publish(&self, event: &ChangeEvent) {
        let callbacks = self
            .inner
            .subscribers
            .lock()
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect::<Vec<_>>();

        for callback in callbacks {
            callback(event);
        }
    }

    /// The number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    #[cfg(test)]
    pub(crate) fn subscriptions_issued(&self) -> u64 {
        self.inner.next_id.load(Ordering::Relaxed)
    }
}

/// A registration on a [`ChangeBus`]. Dropping it unsubscribes.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    bus: Weak<BusInner>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Subscription {
    /// Unsubscribe now.
    pub fn dispose(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.subscribers.lock().retain(|(id, _)| *id != self.id);
        }
    }
}
