//! An [`EventRepository`] wrapper that can hold a caller right after a read.
//!
//! Tests use it to run one operation in the gap between another operation's
//! read of an event and the write that follows it:
//!
//! ```
//! use eventhub_core::providers::EventRepository;
//! use eventhub_testing::fixtures::EventBuilder;
//! use eventhub_testing::memory::InMemoryEventRepository;
//! use eventhub_testing::pausing::PausingEventRepository;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let events = Arc::new(PausingEventRepository::new(Arc::new(InMemoryEventRepository::new())));
//! let event = events
//!     .create(&EventBuilder::new(eventhub_core::UserId::new(), "Gala").build())
//!     .await
//!     .unwrap();
//!
//! let mut pause = events.pause_next_get();
//! let reader = {
//!     let events = Arc::clone(&events);
//!     tokio::spawn(async move { events.get(event.id).await })
//! };
//! pause.reached().await;
//! // ... the reader holds its snapshot here ...
//! pause.resume();
//! assert!(reader.await.unwrap().is_ok());
//! # });
//! ```

use chrono::{DateTime, Utc};
use eventhub_core::providers::{BoxFuture, EventFilter, EventRepository};
use eventhub_core::{Event, EventId, EventStatus, Page, PageRequest, Result};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

type Armed = (oneshot::Sender<()>, oneshot::Receiver<()>);

/// Delegates to an inner repository; `get` can be paused once per arming.
pub struct PausingEventRepository {
    inner: Arc<dyn EventRepository>,
    armed: Mutex<Option<Armed>>,
}

/// Control side of an armed pause.
#[derive(Debug)]
pub struct Pause {
    reached: oneshot::Receiver<()>,
    resume: oneshot::Sender<()>,
}

impl Pause {
    /// Wait until the paused `get` has read its event.
    pub async fn reached(&mut self) {
        // A dropped sender means the reader went away; nothing to wait for.
        let _ = (&mut self.reached).await;
    }

    /// Let the paused caller continue with what it read.
    pub fn resume(self) {
        let _ = self.resume.send(());
    }
}

impl PausingEventRepository {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn EventRepository>) -> Self {
        Self {
            inner,
            armed: Mutex::new(None),
        }
    }

    /// Hold the next `get` after it has read, until the returned
    /// [`Pause`] is resumed (or dropped).
    #[must_use]
    pub fn pause_next_get(&self) -> Pause {
        let (reached_tx, reached_rx) = oneshot::channel();
        let (resume_tx, resume_rx) = oneshot::channel();
        if let Ok(mut armed) = self.armed.lock() {
            *armed = Some((reached_tx, resume_rx));
        }
        Pause {
            reached: reached_rx,
            resume: resume_tx,
        }
    }

    fn take_armed(&self) -> Option<Armed> {
        self.armed.lock().ok().and_then(|mut armed| armed.take())
    }
}

impl EventRepository for PausingEventRepository {
    fn create(&self, event: &Event) -> BoxFuture<'_, Result<Event>> {
        self.inner.create(event)
    }

    fn get(&self, id: EventId) -> BoxFuture<'_, Result<Event>> {
        Box::pin(async move {
            let read = self.inner.get(id).await;
            if let Some((reached, resume)) = self.take_armed() {
                let _ = reached.send(());
                let _ = resume.await;
            }
            read
        })
    }

    fn get_by_slug(&self, slug: &str) -> BoxFuture<'_, Result<Event>> {
        self.inner.get_by_slug(slug)
    }

    fn slug_exists(&self, slug: &str, exclude: Option<EventId>) -> BoxFuture<'_, Result<bool>> {
        self.inner.slug_exists(slug, exclude)
    }

    fn update(&self, event: &Event) -> BoxFuture<'_, Result<Event>> {
        self.inner.update(event)
    }

    fn transition(
        &self,
        id: EventId,
        expected: EventStatus,
        next: EventStatus,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Event>> {
        self.inner.transition(id, expected, next, now)
    }

    fn delete(&self, id: EventId) -> BoxFuture<'_, Result<()>> {
        self.inner.delete(id)
    }

    fn list(&self, filter: &EventFilter, page: PageRequest) -> BoxFuture<'_, Result<Page<Event>>> {
        self.inner.list(filter, page)
    }
}
