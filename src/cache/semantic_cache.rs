//! Semantic cache: named graphs with per-graph expiry scheduling.
//!
//! Writes go through the internal bus so that, for a given graph name, "cancel old expiry,
//! install new graph, schedule new expiry" happens as one step. Reads are served directly
//! and never trigger eviction; only a fired expiry task does.

use crate::cache::{GraphStore, QueryResult};
use crate::core::ExpiringNamedGraph;
use crate::error::Result;
use chrono::{DateTime, Utc};
use oxigraph::model::{NamedNode, NamedNodeRef};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::debug;

/// Notification emitted by a fired expiry task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExpiredGraph {
    pub graph_name: NamedNode,
    /// Generation of the write that scheduled the task; a newer write makes it stale.
    pub generation: u64,
}

struct CacheEntry {
    expiry: Option<DateTime<Utc>>,
    generation: u64,
    task: Option<AbortHandle>,
}

impl Drop for CacheEntry {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

pub struct SemanticCache {
    store: Box<dyn GraphStore>,
    entries: RwLock<HashMap<NamedNode, CacheEntry>>,
    grace_period: Duration,
    expirations: mpsc::UnboundedSender<ExpiredGraph>,
    management: Handle,
    next_generation: AtomicU64,
}

impl SemanticCache {
    /// Create a cache whose expiry tasks run on `management` and report on the returned
    /// receiver.
    pub(crate) fn new(
        store: Box<dyn GraphStore>,
        grace_period: Duration,
        management: Handle,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<ExpiredGraph>) {
        let (expirations, receiver) = mpsc::unbounded_channel();
        let cache = Self {
            store,
            entries: RwLock::new(HashMap::new()),
            grace_period,
            expirations,
            management,
            next_generation: AtomicU64::new(0),
        };
        (Arc::new(cache), receiver)
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Upsert a graph and (re)schedule its eviction.
    ///
    /// Any pending eviction of the same graph name is cancelled. A graph without expiry is
    /// cached until deleted.
    pub(crate) fn put_named_graph_to_cache(&self, graph: ExpiringNamedGraph) -> Result<()> {
        let mut entries = self.entries.write();
        self.store.put(graph.graph_name.as_ref(), &graph.graph)?;

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let task = graph
            .expiry
            .map(|expiry| self.schedule_expiry(graph.graph_name.clone(), expiry, generation));
        debug!(graph = %graph.graph_name, expiry = ?graph.expiry, "cached graph");

        // Dropping the replaced entry aborts its expiry task.
        entries.insert(graph.graph_name, CacheEntry { expiry: graph.expiry, generation, task });
        Ok(())
    }

    /// Remove a graph and cancel its pending eviction. Returns whether it was cached.
    pub(crate) fn delete_named_graph(&self, graph_name: NamedNodeRef<'_>) -> Result<bool> {
        let mut entries = self.entries.write();
        let tracked = entries.remove(&graph_name.into_owned()).is_some();
        let stored = self.store.delete(graph_name)?;
        Ok(tracked || stored)
    }

    /// Consume an expiry notification. Returns `true` when it still refers to the live
    /// entry, which is then forgotten; stale notifications are ignored.
    pub(crate) fn take_expired(&self, expired: &ExpiredGraph) -> bool {
        let mut entries = self.entries.write();
        match entries.get(&expired.graph_name) {
            Some(entry) if entry.generation == expired.generation => {
                entries.remove(&expired.graph_name);
                true
            }
            _ => false,
        }
    }

    /// Cached graph with its expiry, if present.
    pub fn get_named_graph(&self, graph_name: NamedNodeRef<'_>) -> Result<Option<ExpiringNamedGraph>> {
        let entries = self.entries.read();
        let Some(graph) = self.store.get(graph_name)? else {
            return Ok(None);
        };
        let expiry = entries.get(&graph_name.into_owned()).and_then(|entry| entry.expiry);
        Ok(Some(ExpiringNamedGraph::new(graph_name.into_owned(), graph, expiry)))
    }

    pub fn contains_named_graph(&self, graph_name: NamedNodeRef<'_>) -> Result<bool> {
        let _entries = self.entries.read();
        self.store.contains(graph_name)
    }

    /// Expiry of a cached graph; `None` when unknown or cached indefinitely.
    pub fn expiry(&self, graph_name: NamedNodeRef<'_>) -> Option<DateTime<Utc>> {
        self.entries.read().get(&graph_name.into_owned()).and_then(|entry| entry.expiry)
    }

    /// Graph names written to the cache and not yet evicted or deleted.
    pub fn graph_names(&self) -> Vec<NamedNode> {
        let mut names: Vec<NamedNode> = self.entries.read().keys().cloned().collect();
        names.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        names
    }

    /// Number of graphs with a scheduled eviction.
    pub fn scheduled_expiry_count(&self) -> usize {
        self.entries.read().values().filter(|entry| entry.task.is_some()).count()
    }

    /// Evaluate a SPARQL query against the store. Fails with
    /// [`GatewayError::SparqlNotSupported`](crate::GatewayError::SparqlNotSupported) when the
    /// store cannot query.
    pub(crate) fn process_sparql_query(&self, query: &str) -> Result<QueryResult> {
        self.store.query(query)
    }

    fn schedule_expiry(
        &self,
        graph_name: NamedNode,
        expiry: DateTime<Utc>,
        generation: u64,
    ) -> AbortHandle {
        let delay = (expiry - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO)
            .saturating_add(self.grace_period);
        let expirations = self.expirations.clone();

        let task = self.management.spawn(async move {
            tokio::time::sleep(delay).await;
            // The receiver is gone only when the bus worker shut down.
            let _ = expirations.send(ExpiredGraph { graph_name, generation });
        });
        task.abort_handle()
    }
}
