//! Repository façade
//!
//! `UserRepository` is the only way the presentation layer touches the
//! store. Every operation becomes a job on the ordered worker: the job logs
//! its lifecycle, runs against the store on the blocking pool and, when it
//! changed a row, republishes the affected live views before replying.

use crate::notifier::{ChangeNotifier, ListView, Subscription};
use crate::worker::{Pending, Worker};
use std::sync::Arc;
use std::time::Instant;
use userbook_core::errors::ExError;
use userbook_core::model::{User, UserFields};
use userbook_core::{log_op_end, log_op_error, log_op_start};
use userbook_core_types::RequestId;
use userbook_store::{Result, UserStore};

/// Handle to the user store for async callers
///
/// Cheap to clone; clones share the store, the worker queue and the
/// subscriber registry. Operations submitted through any clone execute in
/// the order they were submitted.
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<UserStore>,
    worker: Worker,
    notifier: Arc<ChangeNotifier>,
}

impl UserRepository {
    /// Wrap an opened store
    ///
    /// # Errors
    /// `Concurrency` when called outside a tokio runtime.
    pub fn new(store: Arc<UserStore>) -> Result<Self> {
        Ok(Self {
            store,
            worker: Worker::spawn()?,
            notifier: ChangeNotifier::new(),
        })
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<UserStore> {
        &self.store
    }

    /// Number of live subscriptions across all views
    pub fn subscriber_count(&self) -> usize {
        self.notifier.subscriber_count()
    }

    // ===== Mutations =====

    /// Queue an insert; resolves to the assigned id
    pub fn submit_insert(&self, fields: UserFields) -> Pending<i64> {
        self.submit_write("user_insert", None, move |store| {
            let id = store.insert(&fields)?;
            Ok((id, Some(id)))
        })
    }

    /// Queue an explicit-id insert; resolves to `None` when the id is taken
    pub fn submit_insert_with_id(&self, user: User) -> Pending<Option<i64>> {
        self.submit_write("user_insert_with_id", Some(user.id), move |store| {
            let inserted = store.insert_with_id(&user)?;
            Ok((inserted, inserted))
        })
    }

    /// Queue an update; resolves to whether a record was overwritten
    pub fn submit_update(&self, user: User) -> Pending<bool> {
        self.submit_write("user_update", Some(user.id), move |store| {
            let updated = store.update(&user)?;
            Ok((updated, updated.then_some(user.id)))
        })
    }

    /// Queue a delete; resolves to whether a record was removed
    pub fn submit_delete(&self, id: i64) -> Pending<bool> {
        self.submit_write("user_delete", Some(id), move |store| {
            let deleted = store.delete(id)?;
            Ok((deleted, deleted.then_some(id)))
        })
    }

    /// Insert a new record and return its id
    ///
    /// # Errors
    /// `Persistence` on storage failure, `Concurrency` if the worker is gone.
    pub async fn insert(&self, fields: UserFields) -> Result<i64> {
        self.submit_insert(fields).await
    }

    /// Insert with an explicit id; a taken id is ignored and yields `None`
    ///
    /// # Errors
    /// `Persistence` on storage failure, `Concurrency` if the worker is gone.
    pub async fn insert_with_id(&self, user: User) -> Result<Option<i64>> {
        self.submit_insert_with_id(user).await
    }

    /// Overwrite the record with `user.id`; `false` if there is none
    ///
    /// # Errors
    /// `Persistence` on storage failure, `Concurrency` if the worker is gone.
    pub async fn update(&self, user: User) -> Result<bool> {
        self.submit_update(user).await
    }

    /// Delete the record with `id`; `false` if there is none
    ///
    /// # Errors
    /// `Persistence` on storage failure, `Concurrency` if the worker is gone.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        self.submit_delete(id).await
    }

    // ===== Reads =====

    /// Every record, sorted by first name
    ///
    /// Ordered with respect to mutations submitted earlier.
    ///
    /// # Errors
    /// `Persistence` on storage failure, `Concurrency` if the worker is gone.
    pub async fn get_all(&self) -> Result<Vec<User>> {
        self.submit_read("user_get_all", None, UserStore::get_all).await
    }

    /// # Errors
    /// `Persistence` on storage failure, `Concurrency` if the worker is gone.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        self.submit_read("user_get_by_id", Some(id), move |store| store.get_by_id(id))
            .await
    }

    /// # Errors
    /// `Persistence` on storage failure, `Concurrency` if the worker is gone.
    pub async fn get_adults(&self) -> Result<Vec<User>> {
        self.submit_read("user_get_adults", None, UserStore::get_adults).await
    }

    // ===== Live views =====

    /// Follow the full, sorted list of users
    pub fn observe_all(&self) -> Subscription<Vec<User>> {
        self.observe_list("user_observe_all", ListView::All)
    }

    /// Follow the users aged 18 or more
    pub fn observe_adults(&self) -> Subscription<Vec<User>> {
        self.observe_list("user_observe_adults", ListView::Adults)
    }

    /// Follow one record
    ///
    /// Yields `None` while no record has the id, including after a delete.
    /// The subscription stays open, so a later insert with the same explicit
    /// id is delivered as `Some`.
    pub fn observe_by_id(&self, id: i64) -> Subscription<Option<User>> {
        let (subscription, pending) = self.notifier.subscribe_record(id);
        drop(self.submit_read("user_observe_by_id", Some(id), move |store| {
            pending.attach(store)
        }));
        subscription
    }

    fn observe_list(&self, op: &'static str, view: ListView) -> Subscription<Vec<User>> {
        let (subscription, pending) = self.notifier.subscribe_list(view);
        drop(self.submit_read(op, None, move |store| pending.attach(store)));
        subscription
    }

    // ===== Job plumbing =====

    fn submit_read<T, F>(&self, op: &'static str, user_id: Option<i64>, f: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce(&UserStore) -> Result<T> + Send + 'static,
    {
        let store = self.store.clone();
        let request_id = RequestId::new();
        let job_request_id = request_id.clone();
        self.worker.submit(request_id, move || {
            run_logged(op, &job_request_id, user_id, || f(store.as_ref()))
        })
    }

    /// `f` returns its result plus the id of the row it changed, if any
    fn submit_write<T, F>(&self, op: &'static str, user_id: Option<i64>, f: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce(&UserStore) -> Result<(T, Option<i64>)> + Send + 'static,
    {
        let store = self.store.clone();
        let notifier = self.notifier.clone();
        let request_id = RequestId::new();
        let job_request_id = request_id.clone();
        self.worker.submit(request_id, move || {
            let (value, changed) =
                run_logged(op, &job_request_id, user_id, || f(store.as_ref()))?;
            if let Some(changed_id) = changed {
                // The write is committed; a failed re-query only costs this round
                if let Err(e) = notifier.publish(&store, changed_id) {
                    tracing::warn!(
                        op,
                        request_id = %job_request_id,
                        user_id = changed_id,
                        error = %e,
                        "failed to publish change"
                    );
                }
            }
            Ok(value)
        })
    }
}

fn run_logged<T>(
    op: &'static str,
    request_id: &RequestId,
    user_id: Option<i64>,
    f: impl FnOnce() -> Result<T>,
) -> Result<T> {
    log_op_start!(op, request_id = %request_id, user_id = user_id);
    let start = Instant::now();

    let result = f().map_err(|e: ExError| e.with_request_id(request_id.clone()));
    let duration = start.elapsed().as_millis() as u64;

    match &result {
        Ok(_) => {
            log_op_end!(op, duration_ms = duration, request_id = %request_id);
        }
        Err(e) => {
            log_op_error!(op, e.clone(), duration_ms = duration, request_id = %request_id);
        }
    }
    result
}
