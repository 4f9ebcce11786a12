//! Graph types
//!
//! Serialized as `{"nodes": [...], "links": [...]}` for force-directed
//! rendering. Two graphs are equal when they hold the same nodes and the same
//! multiset of links, regardless of order.

use encore_ledger::RequesterType;
use encore_policy::{CategoryId, PermissionType, PermissionValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Id of the root node representing the rights holder
pub const ROOT_NODE_ID: &str = "artist";

/// Id prefix of requester nodes
pub const PLATFORM_PREFIX: &str = "platform:";

/// Id of the requester node for names with no alphanumeric characters
///
/// Normalized names never contain `_`, so no real requester maps here.
pub const ANONYMOUS_NODE_ID: &str = "platform:_anonymous";

/// Role of a node in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Rights holder at the root
    Artist,
    /// Consent category
    Group,
    /// Requester
    Platform,
}

/// Graph node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Node {
    /// Unique node id
    pub id: String,
    /// Display label
    pub label: String,
    /// Node role
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Requester kind, on platform nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester_type: Option<RequesterType>,
    /// Category, on group nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryId>,
    /// Platform URL from the registry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Certification flag from the registry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certified: Option<bool>,
}

impl Node {
    /// Root node
    pub fn artist(label: impl Into<String>) -> Self {
        Self {
            id: ROOT_NODE_ID.to_string(),
            label: label.into(),
            kind: NodeKind::Artist,
            requester_type: None,
            category: None,
            url: None,
            certified: None,
        }
    }

    /// Category node
    pub fn group(category: CategoryId) -> Self {
        Self {
            id: category.node_id().to_string(),
            label: category.label().to_string(),
            kind: NodeKind::Group,
            requester_type: None,
            category: Some(category),
            url: None,
            certified: None,
        }
    }

    /// Requester node
    pub fn platform(
        id: impl Into<String>,
        label: impl Into<String>,
        requester_type: RequesterType,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind: NodeKind::Platform,
            requester_type: Some(requester_type),
            category: None,
            url: None,
            certified: None,
        }
    }
}

/// Role of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// Skeleton link from the root to a category
    Core,
    /// One recorded decision from a requester to a category
    Decision,
}

/// Directed link between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Link {
    /// Source node id
    pub source: String,
    /// Target node id
    pub target: String,
    /// Link role
    #[serde(rename = "type")]
    pub kind: LinkKind,
    /// Decision carried by a decision link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<PermissionValue>,
    /// Permission type of a decision link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission_type: Option<PermissionType>,
}

impl Link {
    /// Skeleton link from the root to a category
    pub fn core(category: CategoryId) -> Self {
        Self {
            source: ROOT_NODE_ID.to_string(),
            target: category.node_id().to_string(),
            kind: LinkKind::Core,
            result: None,
            permission_type: None,
        }
    }

    /// Decision link from a requester node to a category
    pub fn decision(
        source: impl Into<String>,
        category: CategoryId,
        permission_type: PermissionType,
        result: PermissionValue,
    ) -> Self {
        Self {
            source: source.into(),
            target: category.node_id().to_string(),
            kind: LinkKind::Decision,
            result: Some(result),
            permission_type: Some(permission_type),
        }
    }
}

/// Propagation graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    /// Nodes, unique by id
    pub nodes: Vec<Node>,
    /// Links; parallel links are kept
    pub links: Vec<Link>,
}

impl Graph {
    /// Node with the given id
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Links from `source` to `target`, in insertion order
    pub fn links_between<'a>(
        &'a self,
        source: &'a str,
        target: &'a str,
    ) -> impl Iterator<Item = &'a Link> + 'a {
        self.links
            .iter()
            .filter(move |link| link.source == source && link.target == target)
    }

    /// Nodes of one kind
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter().filter(move |node| node.kind == kind)
    }

    /// Sort nodes and links into a stable order
    pub fn canonicalize(&mut self) {
        self.nodes.sort();
        self.links.sort();
    }

    /// Canonicalized copy
    pub fn canonical(mut self) -> Self {
        self.canonicalize();
        self
    }

    /// Serialize as pretty JSON
    pub fn to_json_pretty(&self) -> encore_core::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        if self.nodes.len() != other.nodes.len() || self.links.len() != other.links.len() {
            return false;
        }
        let mut a = self.clone();
        let mut b = other.clone();
        a.canonicalize();
        b.canonicalize();
        a.nodes == b.nodes && a.links == b.links
    }
}

impl Eq for Graph {}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "graph({} nodes, {} links)", self.nodes.len(), self.links.len())
    }
}
