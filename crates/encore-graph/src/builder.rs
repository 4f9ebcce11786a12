//! Graph construction from audit entries

use crate::graph::{Graph, Link, Node, ANONYMOUS_NODE_ID, PLATFORM_PREFIX};
use chrono::{DateTime, Utc};
use encore_core::PlatformRegistry;
use encore_ledger::AuditLogEntry;
use encore_policy::{classify, CategoryId, PermissionType, PermissionValue};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Default label of the root node
pub const DEFAULT_ARTIST_LABEL: &str = "Artist";

/// Node id for a requester name
///
/// Case-folds and strips every non-alphanumeric character, so "Open-AI" and
/// "openai" share a node. Folding is lowercasing plus the multi-character
/// folds `ß`/`ẞ` to `ss` and final sigma to `σ`, so "STRASSE" and "Straße"
/// also share one.
pub fn normalize_requester(requester_name: &str) -> String {
    let mut folded = String::with_capacity(requester_name.len());
    for lower in requester_name
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
    {
        match lower {
            'ß' => folded.push_str("ss"),
            'ς' => folded.push('σ'),
            other => folded.push(other),
        }
    }
    if folded.is_empty() {
        ANONYMOUS_NODE_ID.to_string()
    } else {
        format!("{PLATFORM_PREFIX}{folded}")
    }
}

/// Builds propagation graphs, optionally enriching nodes from a registry
#[derive(Clone, Default)]
pub struct GraphBuilder {
    artist_label: Option<String>,
    registry: Option<Arc<dyn PlatformRegistry>>,
}

impl GraphBuilder {
    /// Builder with the default root label and no registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Label the root node
    pub fn with_artist_label(mut self, label: impl Into<String>) -> Self {
        self.artist_label = Some(label.into());
        self
    }

    /// Add `url` and `certified` to platform nodes the registry knows
    pub fn with_registry(mut self, registry: Arc<dyn PlatformRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Build the graph for `entries`
    ///
    /// The skeleton of root, categories, and core links is always present.
    /// Entries with unclassified permission types are skipped. Platform nodes
    /// take their label and requester type from the earliest entry by
    /// `(timestamp, sequence)`.
    pub fn build<I, E>(&self, entries: I) -> Graph
    where
        I: IntoIterator<Item = E>,
        E: Borrow<AuditLogEntry>,
    {
        let mut graph = self.skeleton();

        let entries: Vec<E> = entries.into_iter().collect();
        let mut ordered: Vec<&AuditLogEntry> = entries.iter().map(Borrow::borrow).collect();
        ordered.sort_by_key(|entry| entry.order_key());

        let mut seen = HashSet::new();
        let mut skipped = 0usize;
        for entry in ordered {
            let Some(category) = classify(entry.permission_type) else {
                skipped += 1;
                continue;
            };
            let node_id = normalize_requester(&entry.requester_name);
            if seen.insert(node_id.clone()) {
                graph.nodes.push(self.platform_node(&node_id, entry));
            }
            graph.links.push(Link::decision(
                node_id,
                category,
                entry.permission_type,
                entry.result.clone(),
            ));
        }

        debug!(
            nodes = graph.nodes.len(),
            links = graph.links.len(),
            skipped,
            "built propagation graph"
        );
        graph
    }

    fn skeleton(&self) -> Graph {
        let label = self
            .artist_label
            .clone()
            .unwrap_or_else(|| DEFAULT_ARTIST_LABEL.to_string());
        let mut graph = Graph {
            nodes: vec![Node::artist(label)],
            links: Vec::new(),
        };
        for category in CategoryId::ALL {
            graph.nodes.push(Node::group(category));
            graph.links.push(Link::core(category));
        }
        graph
    }

    fn platform_node(&self, node_id: &str, entry: &AuditLogEntry) -> Node {
        let mut node = Node::platform(node_id, &entry.requester_name, entry.requester_type);
        let info = self.registry.as_ref().and_then(|registry| {
            entry
                .requester_id
                .as_deref()
                .and_then(|id| registry.lookup(id))
                .or_else(|| registry.lookup(&entry.requester_name))
        });
        if let Some(info) = info {
            node.url = info.url;
            node.certified = info.certified;
        }
        node
    }
}

impl std::fmt::Debug for GraphBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphBuilder")
            .field("artist_label", &self.artist_label)
            .field("registry", &self.registry.is_some())
            .finish()
    }
}

/// Build a graph with the default builder
pub fn build<I, E>(entries: I) -> Graph
where
    I: IntoIterator<Item = E>,
    E: Borrow<AuditLogEntry>,
{
    GraphBuilder::new().build(entries)
}

/// Most recent decision for one requester in one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestResult {
    /// Requester node id
    pub requester: String,
    /// Category
    pub category: CategoryId,
    /// Permission type of the latest decision
    pub permission_type: PermissionType,
    /// Latest decision
    pub result: PermissionValue,
    /// When it was decided
    pub timestamp: DateTime<Utc>,
    /// Ledger sequence of the entry
    pub sequence: u64,
}

/// Latest decision per `(requester node, category)`, sorted by requester then
/// category
pub fn latest_results<I, E>(entries: I) -> Vec<LatestResult>
where
    I: IntoIterator<Item = E>,
    E: Borrow<AuditLogEntry>,
{
    let mut latest: BTreeMap<(String, CategoryId), LatestResult> = BTreeMap::new();
    for entry in entries {
        let entry = entry.borrow();
        let Some(category) = classify(entry.permission_type) else {
            continue;
        };
        let key = (normalize_requester(&entry.requester_name), category);
        let newer = latest
            .get(&key)
            .map_or(true, |current| entry.order_key() > (current.timestamp, current.sequence));
        if newer {
            latest.insert(
                key.clone(),
                LatestResult {
                    requester: key.0,
                    category,
                    permission_type: entry.permission_type,
                    result: entry.result.clone(),
                    timestamp: entry.timestamp,
                    sequence: entry.sequence,
                },
            );
        }
    }
    latest.into_values().collect()
}
