//! Worklist of pages waiting to be fetched
//!
//! This module handles:
//! - FIFO ordering of queued (URL, stage) tasks
//! - Dropping URLs that were already queued once
//! - Respecting a minimum delay between fetches

use crate::state::CrawlStage;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// A page queued for fetching, with the handler it is fetched for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    /// The URL to fetch
    pub url: Url,

    /// Which stage handles the fetched page
    pub stage: CrawlStage,
}

impl CrawlTask {
    pub fn new(url: Url, stage: CrawlStage) -> Self {
        Self { url, stage }
    }
}

/// Frontier of outstanding crawl tasks
///
/// Every URL is accepted at most once for the lifetime of the frontier, so
/// pagination blocks that link back to earlier pages cannot loop the crawl.
pub struct Frontier {
    queue: VecDeque<CrawlTask>,
    seen: HashSet<String>,
    min_delay: Duration,
    last_fetch: Option<Instant>,
}

impl Frontier {
    /// Creates an empty frontier waiting `min_delay` between fetches
    pub fn new(min_delay: Duration) -> Self {
        Self {
            queue: VecDeque::new(),
            seen: HashSet::new(),
            min_delay,
            last_fetch: None,
        }
    }

    /// Queues a task unless its URL was queued before
    ///
    /// URLs differing only in their fragment count as the same page.
    ///
    /// # Returns
    ///
    /// `true` if the task was queued
    pub fn push(&mut self, task: CrawlTask) -> bool {
        let mut key = task.url.clone();
        key.set_fragment(None);

        if !self.seen.insert(key.into()) {
            return false;
        }

        self.queue.push_back(task);
        true
    }

    /// Takes the oldest queued task
    pub fn next_task(&mut self) -> Option<CrawlTask> {
        self.queue.pop_front()
    }

    /// Waits until the minimum delay since the previous fetch has passed
    ///
    /// The first call returns immediately.
    pub async fn wait_turn(&mut self) {
        if let Some(last) = self.last_fetch {
            let ready_at = last + self.min_delay;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        self.last_fetch = Some(Instant::now());
    }

    /// Number of tasks still queued
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of distinct URLs ever queued
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}
