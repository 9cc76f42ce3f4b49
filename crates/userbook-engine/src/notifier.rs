//! Change notification for live views
//!
//! Subscribers register a channel for one of three views: every user, the
//! adults, or a single user id. After a mutation that changed a row, the
//! repository asks the notifier to re-query each affected view and push the
//! fresh snapshot. Registration and publication both run on the repository
//! worker, so a subscriber never sees a snapshot older than one it already
//! received.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::mpsc;
use userbook_core::model::User;
use userbook_store::{Result, UserStore};

/// Which list a list subscriber follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ListView {
    All,
    Adults,
}

impl ListView {
    fn query(self, store: &UserStore) -> Result<Vec<User>> {
        match self {
            ListView::All => store.get_all(),
            ListView::Adults => store.get_adults(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum SubscriptionKey {
    List(u64),
    Record(u64),
}

struct ListListener {
    view: ListView,
    tx: mpsc::UnboundedSender<Vec<User>>,
}

struct RecordListener {
    user_id: i64,
    tx: mpsc::UnboundedSender<Option<User>>,
}

/// Registry of live subscribers
#[derive(Default)]
pub(crate) struct ChangeNotifier {
    next_id: AtomicU64,
    lists: Mutex<HashMap<u64, ListListener>>,
    records: Mutex<HashMap<u64, RecordListener>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Listener maps hold no invariants a panicking holder could break
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ChangeNotifier {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Create the receiving half of a list subscription
    ///
    /// The returned attach step must run on the worker; it sends the initial
    /// snapshot and then registers the listener.
    pub(crate) fn subscribe_list(
        self: &Arc<Self>,
        view: ListView,
    ) -> (Subscription<Vec<User>>, PendingList) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = Subscription {
            key: SubscriptionKey::List(id),
            rx,
            notifier: Arc::downgrade(self),
        };
        let pending = PendingList {
            id,
            view,
            tx,
            notifier: Arc::downgrade(self),
        };
        (subscription, pending)
    }

    /// Create the receiving half of a single-record subscription
    pub(crate) fn subscribe_record(
        self: &Arc<Self>,
        user_id: i64,
    ) -> (Subscription<Option<User>>, PendingRecord) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = Subscription {
            key: SubscriptionKey::Record(id),
            rx,
            notifier: Arc::downgrade(self),
        };
        let pending = PendingRecord {
            id,
            user_id,
            tx,
            notifier: Arc::downgrade(self),
        };
        (subscription, pending)
    }

    fn unregister(&self, key: SubscriptionKey) {
        match key {
            SubscriptionKey::List(id) => {
                lock(&self.lists).remove(&id);
            }
            SubscriptionKey::Record(id) => {
                lock(&self.records).remove(&id);
            }
        }
    }

    /// Number of registered subscribers across all views
    pub(crate) fn subscriber_count(&self) -> usize {
        lock(&self.lists).len() + lock(&self.records).len()
    }

    /// Push fresh snapshots to every view affected by a change to `user_id`
    ///
    /// List views always re-query: a change to any row can move it in or
    /// out of the adults list or reorder the full list. Record views only
    /// re-query when they follow `user_id`. Each view is queried once no
    /// matter how many subscribers follow it.
    pub(crate) fn publish(&self, store: &UserStore, user_id: i64) -> Result<usize> {
        let mut delivered = 0;

        {
            let mut lists = lock(&self.lists);
            let mut snapshots: HashMap<ListView, Vec<User>> = HashMap::new();
            let mut closed = Vec::new();
            for (id, listener) in lists.iter() {
                if listener.tx.is_closed() {
                    closed.push(*id);
                    continue;
                }
                let snapshot = match snapshots.get(&listener.view) {
                    Some(snapshot) => snapshot.clone(),
                    None => {
                        let snapshot = listener.view.query(store)?;
                        snapshots.insert(listener.view, snapshot.clone());
                        snapshot
                    }
                };
                if listener.tx.send(snapshot).is_ok() {
                    delivered += 1;
                } else {
                    closed.push(*id);
                }
            }
            for id in closed {
                lists.remove(&id);
            }
        }

        {
            let mut records = lock(&self.records);
            let mut snapshot: Option<Option<User>> = None;
            let mut closed = Vec::new();
            for (id, listener) in records.iter().filter(|(_, l)| l.user_id == user_id) {
                let current = match &snapshot {
                    Some(current) => current.clone(),
                    None => {
                        let current = store.get_by_id(user_id)?;
                        snapshot = Some(current.clone());
                        current
                    }
                };
                if listener.tx.send(current).is_ok() {
                    delivered += 1;
                } else {
                    closed.push(*id);
                }
            }
            records.retain(|id, listener| !closed.contains(id) && !listener.tx.is_closed());
        }

        tracing::debug!(user_id, delivered, "published change");
        Ok(delivered)
    }
}

/// A list subscription waiting to be attached on the worker
pub(crate) struct PendingList {
    id: u64,
    view: ListView,
    tx: mpsc::UnboundedSender<Vec<User>>,
    notifier: Weak<ChangeNotifier>,
}

impl PendingList {
    /// Start following changes, then send the current snapshot
    ///
    /// The listener is registered before the snapshot goes out, so a
    /// subscriber that cancels as soon as it sees the snapshot always finds
    /// its entry to remove.
    pub(crate) fn attach(self, store: &UserStore) -> Result<()> {
        let snapshot = self.view.query(store)?;
        let Some(notifier) = self.notifier.upgrade() else {
            return Ok(());
        };

        lock(&notifier.lists).insert(
            self.id,
            ListListener {
                view: self.view,
                tx: self.tx.clone(),
            },
        );
        // Receiver already gone: take the entry back out
        if self.tx.send(snapshot).is_err() {
            notifier.unregister(SubscriptionKey::List(self.id));
        }
        Ok(())
    }
}

/// A single-record subscription waiting to be attached on the worker
pub(crate) struct PendingRecord {
    id: u64,
    user_id: i64,
    tx: mpsc::UnboundedSender<Option<User>>,
    notifier: Weak<ChangeNotifier>,
}

impl PendingRecord {
    pub(crate) fn attach(self, store: &UserStore) -> Result<()> {
        let current = store.get_by_id(self.user_id)?;
        let Some(notifier) = self.notifier.upgrade() else {
            return Ok(());
        };

        lock(&notifier.records).insert(
            self.id,
            RecordListener {
                user_id: self.user_id,
                tx: self.tx.clone(),
            },
        );
        if self.tx.send(current).is_err() {
            notifier.unregister(SubscriptionKey::Record(self.id));
        }
        Ok(())
    }
}

/// A live view over the user store
///
/// Yields the view's state at subscription time first, then one snapshot
/// per change that affects it, in commit order. Dropping the subscription
/// (or calling [`Subscription::cancel`]) stops delivery and removes it from
/// the registry.
pub struct Subscription<T> {
    key: SubscriptionKey,
    rx: mpsc::UnboundedReceiver<T>,
    notifier: Weak<ChangeNotifier>,
}

impl<T> Subscription<T> {
    /// Wait for the next snapshot
    ///
    /// Returns `None` once the repository is gone and every buffered
    /// snapshot has been taken.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Take a buffered snapshot without waiting
    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Stop receiving snapshots
    pub fn cancel(self) {}
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.rx.close();
        if let Some(notifier) = self.notifier.upgrade() {
            notifier.unregister(self.key);
        }
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("key", &self.key).finish()
    }
}
