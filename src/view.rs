use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::post::Post;
use crate::render;
use crate::store::PostStore;

#[derive(Debug, Clone)]
pub struct ViewState {
    pub loading: bool,
    pub error: Option<String>,
    pub posts: Arc<Vec<Post>>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            loading: true,
            error: None,
            posts: Arc::new(Vec::new()),
        }
    }
}

struct Teardown {
    signaled: AtomicBool,
    notify: Notify,
}

impl Teardown {
    fn new() -> Self {
        Self {
            signaled: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    fn signal(&self) {
        if !self.signaled.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    fn is_signaled(&self) -> bool {
        self.signaled.load(Ordering::SeqCst)
    }

    async fn wait(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_signaled() {
            return;
        }
        notified.await;
    }
}

/// Loading/error state around the post collection.
///
/// Every state mutation happens under the state lock after checking both the
/// teardown signal and that the load is still the latest one, so a load that
/// settles after `teardown` (or after a newer load started) changes nothing.
pub struct PostsView {
    store: Arc<PostStore>,
    state: Mutex<ViewState>,
    teardown: Teardown,
    generation: AtomicU64,
}

impl PostsView {
    pub fn new(store: Arc<PostStore>) -> Self {
        Self {
            store,
            state: Mutex::new(ViewState::default()),
            teardown: Teardown::new(),
            generation: AtomicU64::new(0),
        }
    }

    pub async fn activate(&self) {
        self.load().await;
    }

    pub async fn load(&self) {
        let generation = {
            let mut state = self.lock_state();
            if self.teardown.is_signaled() {
                return;
            }
            state.loading = true;
            state.error = None;
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        let handle = self.store.collection();
        let outcome = tokio::select! {
            outcome = handle.get() => outcome,
            _ = self.teardown.wait() => {
                tracing::debug!(generation, "view torn down; discarding load");
                return;
            }
        };

        let mut state = self.lock_state();
        if self.teardown.is_signaled() || self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, "load superseded; discarding result");
            return;
        }
        match outcome {
            Ok(posts) => {
                state.posts = posts;
            }
            Err(err) => {
                state.error = Some(err.message().to_string());
                state.posts = Arc::new(Vec::new());
            }
        }
        state.loading = false;
    }

    pub async fn refresh(&self) {
        {
            let mut state = self.lock_state();
            if self.teardown.is_signaled() {
                return;
            }
            state.loading = true;
        }
        self.store.force_refresh();
        self.load().await;
    }

    pub fn teardown(&self) {
        let _state = self.lock_state();
        self.teardown.signal();
    }

    pub fn is_torn_down(&self) -> bool {
        self.teardown.is_signaled()
    }

    pub fn state(&self) -> ViewState {
        self.lock_state().clone()
    }

    pub fn render(&self, title: &str) -> String {
        render::render_page(title, &self.state())
    }

    fn lock_state(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
