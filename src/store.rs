use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::watch;

use crate::error::StoreError;
use crate::post::Post;
use crate::transport::Transport;

pub type CollectionOutcome = Result<Arc<Vec<Post>>, StoreError>;

struct Settled {
    outcome: CollectionOutcome,
    at: Instant,
}

struct SharedFetch {
    started: AtomicBool,
    settled: watch::Sender<Option<Settled>>,
}

/// A lazily started, replayable collection fetch.
///
/// Clones share one underlying request: the first `get` spawns it and every
/// caller, concurrent or later, observes the same outcome. The request runs on
/// its own task, so dropping a waiter never cancels it.
#[derive(Clone)]
pub struct CollectionHandle {
    fetch: Arc<SharedFetch>,
    transport: Transport,
}

impl CollectionHandle {
    fn new(transport: Transport) -> Self {
        let (settled, _) = watch::channel(None);
        Self {
            fetch: Arc::new(SharedFetch {
                started: AtomicBool::new(false),
                settled,
            }),
            transport,
        }
    }

    pub async fn get(&self) -> CollectionOutcome {
        let mut rx = self.fetch.settled.subscribe();

        if !self.fetch.started.swap(true, Ordering::SeqCst) {
            let fetch = self.fetch.clone();
            let transport = self.transport.clone();
            tokio::spawn(async move {
                let outcome = match transport.list().await {
                    Ok(posts) => {
                        tracing::info!(count = posts.len(), "fetched posts");
                        Ok(Arc::new(posts))
                    }
                    Err(e) => Err(StoreError::from(e)),
                };
                fetch.settled.send_replace(Some(Settled {
                    outcome,
                    at: Instant::now(),
                }));
            });
        }

        let settled = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| StoreError::new("collection fetch was abandoned"))?;
        match &*settled {
            Some(settled) => settled.outcome.clone(),
            None => Err(StoreError::new("collection fetch was abandoned")),
        }
    }

    /// Whether the underlying request has completed.
    pub fn is_settled(&self) -> bool {
        self.fetch.settled.borrow().is_some()
    }

    /// Time since the underlying request completed, if it has.
    pub fn settled_for(&self) -> Option<Duration> {
        self.fetch
            .settled
            .borrow()
            .as_ref()
            .map(|settled| settled.at.elapsed())
    }

    /// Whether both handles share the same underlying request.
    pub fn same_fetch(&self, other: &CollectionHandle) -> bool {
        Arc::ptr_eq(&self.fetch, &other.fetch)
    }
}

pub struct PostStore {
    transport: Transport,
    cache: Mutex<Option<CollectionHandle>>,
    refresh: AtomicBool,
    max_age: Option<Duration>,
}

impl PostStore {
    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            cache: Mutex::new(None),
            refresh: AtomicBool::new(false),
            max_age: None,
        }
    }

    /// Treat a cached collection as stale once it settled more than `max_age` ago.
    /// A fetch still in flight never expires.
    pub fn with_max_age(mut self, max_age: Option<Duration>) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn collection(&self) -> CollectionHandle {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);

        let forced = self.refresh.swap(false, Ordering::SeqCst);
        if let Some(handle) = cache
            .as_ref()
            .filter(|handle| !forced && !self.is_expired(handle))
        {
            return handle.clone();
        }

        tracing::debug!(forced, "starting new collection fetch");
        let handle = CollectionHandle::new(self.transport.clone());
        *cache = Some(handle.clone());
        handle
    }

    pub fn force_refresh(&self) -> CollectionHandle {
        self.invalidate();
        self.collection()
    }

    pub async fn get_by_id(&self, id: u64) -> Result<Post, StoreError> {
        Ok(self.transport.get(id).await?)
    }

    pub async fn create(&self, post: &Post) -> Result<Post, StoreError> {
        let created = self.transport.create(&post.without_id()).await?;
        self.invalidate();
        Ok(created)
    }

    pub async fn update(&self, id: u64, post: &Post) -> Result<Post, StoreError> {
        let updated = self.transport.update(id, post).await?;
        self.invalidate();
        Ok(updated)
    }

    pub async fn delete(&self, id: u64) -> Result<(), StoreError> {
        self.transport.delete(id).await?;
        self.invalidate();
        Ok(())
    }

    /// Whether the force-refresh flag is set by a write or `force_refresh`.
    pub fn is_stale(&self) -> bool {
        self.refresh.load(Ordering::SeqCst)
    }

    fn is_expired(&self, handle: &CollectionHandle) -> bool {
        match (self.max_age, handle.settled_for()) {
            (Some(max_age), Some(age)) => age >= max_age,
            _ => false,
        }
    }

    fn invalidate(&self) {
        self.refresh.store(true, Ordering::SeqCst);
    }
}
