//! Lymphatic network topology.
//!
//! A graph is a list of tumor and LNL nodes with directed edges. Edges
//! leaving a tumor are *base* edges, edges leaving an LNL are *transition*
//! edges. The edge list is stored base edges first, each group in
//! declaration order, which is exactly the layout of a spread-probability
//! vector.

use std::str::FromStr;

use lymph_config::GraphEntry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::state::MAX_STATE_BITS;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Tumor,
    Lnl,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Tumor => "tumor",
            NodeKind::Lnl => "lnl",
        }
    }

    /// Parse the kind of node `name`.
    pub fn parse_for(kind: &str, name: &str) -> Result<Self> {
        kind.parse().map_err(|_| Error::UnknownNodeKind {
            name: name.to_string(),
            kind: kind.to_string(),
        })
    }
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "tumor" => Ok(NodeKind::Tumor),
            "lnl" => Ok(NodeKind::Lnl),
            other => Err(format!("unknown node kind: {other}")),
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
}

/// Where an edge starts, seen from the per-side state vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeSource {
    Tumor,
    /// Position of the source among the LNLs.
    Lnl(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Index into [`Graph::nodes`].
    pub source: usize,
    /// Index into [`Graph::nodes`].
    pub target: usize,
    pub from: EdgeSource,
    /// Position of the target among the LNLs.
    pub to_lnl: usize,
}

impl Edge {
    pub fn is_base(&self) -> bool {
        matches!(self.from, EdgeSource::Tumor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    nodes: Vec<Node>,
    /// Base edges first, then transition edges.
    edges: Vec<Edge>,
    /// Node indices of the LNLs in declaration order.
    lnls: Vec<usize>,
    num_base: usize,
}

impl Graph {
    /// Build a graph from `(kind, name, targets)` entries.
    pub fn new<'a, I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str, &'a [String])>,
    {
        let entries: Vec<_> = entries.into_iter().collect();

        let mut nodes: Vec<Node> = Vec::with_capacity(entries.len());
        for (kind, name, _) in &entries {
            let kind = NodeKind::parse_for(kind, name)?;
            if nodes.iter().any(|n| n.name == *name) {
                return Err(Error::InvalidGraph(format!("node '{name}' is declared twice")));
            }
            nodes.push(Node {
                name: name.to_string(),
                kind,
            });
        }

        let lnls: Vec<usize> = nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.kind == NodeKind::Lnl)
            .map(|(i, _)| i)
            .collect();
        if lnls.is_empty() {
            return Err(Error::InvalidGraph("graph has no LNL".to_string()));
        }
        if lnls.len() > MAX_STATE_BITS {
            return Err(Error::InvalidGraph(format!(
                "{} LNLs exceed the limit of {MAX_STATE_BITS}",
                lnls.len()
            )));
        }
        let lnl_position = |node: usize| lnls.iter().position(|&i| i == node);

        let mut base = Vec::new();
        let mut trans = Vec::new();
        for (source, (_, name, targets)) in entries.iter().enumerate() {
            for target_name in targets.iter() {
                let target = nodes
                    .iter()
                    .position(|n| n.name == *target_name)
                    .ok_or_else(|| {
                        Error::InvalidGraph(format!(
                            "edge {name} -> {target_name} points to an undeclared node"
                        ))
                    })?;
                let to_lnl = lnl_position(target).ok_or_else(|| {
                    Error::InvalidGraph(format!(
                        "edge {name} -> {target_name} must end in an LNL"
                    ))
                })?;
                if source == target {
                    return Err(Error::InvalidGraph(format!("self loop on '{name}'")));
                }
                match nodes[source].kind {
                    NodeKind::Tumor => base.push(Edge {
                        source,
                        target,
                        from: EdgeSource::Tumor,
                        to_lnl,
                    }),
                    NodeKind::Lnl => trans.push(Edge {
                        source,
                        target,
                        from: EdgeSource::Lnl(lnl_position(source).unwrap_or_default()),
                        to_lnl,
                    }),
                }
            }
        }

        let num_base = base.len();
        base.extend(trans);

        Ok(Self {
            nodes,
            edges: base,
            lnls,
            num_base,
        })
    }

    pub fn from_entries(entries: &[GraphEntry]) -> Result<Self> {
        Self::new(
            entries
                .iter()
                .map(|e| (e.kind.as_str(), e.name.as_str(), e.targets.as_slice())),
        )
    }

    /// Rebuild from a `"kind,name" -> [targets]` map.
    pub fn from_key_map(map: &Map<String, Value>) -> Result<Self> {
        let mut entries = Vec::with_capacity(map.len());
        for (key, targets) in map {
            let (kind, name) = decode_key(key)?;
            let targets: Vec<String> = serde_json::from_value(targets.clone())?;
            entries.push(GraphEntry {
                kind: kind.as_str().to_string(),
                name,
                targets,
            });
        }
        Self::from_entries(&entries)
    }

    /// Inverse of [`Graph::from_key_map`].
    pub fn to_key_map(&self) -> Result<Map<String, Value>> {
        let mut map = Map::new();
        for (i, node) in self.nodes.iter().enumerate() {
            let targets: Vec<Value> = self
                .edges
                .iter()
                .filter(|e| e.source == i)
                .map(|e| Value::String(self.nodes[e.target].name.clone()))
                .collect();
            map.insert(encode_key(node.kind, &node.name)?, Value::Array(targets));
        }
        Ok(map)
    }

    pub fn to_entries(&self) -> Vec<GraphEntry> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| GraphEntry {
                kind: node.kind.as_str().to_string(),
                name: node.name.clone(),
                targets: self
                    .edges
                    .iter()
                    .filter(|e| e.source == i)
                    .map(|e| self.nodes[e.target].name.clone())
                    .collect(),
            })
            .collect()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All edges, base edges first.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn base_edges(&self) -> &[Edge] {
        &self.edges[..self.num_base]
    }

    pub fn trans_edges(&self) -> &[Edge] {
        &self.edges[self.num_base..]
    }

    pub fn lnl_count(&self) -> usize {
        self.lnls.len()
    }

    pub fn lnl_names(&self) -> Vec<&str> {
        self.lnls.iter().map(|&i| self.nodes[i].name.as_str()).collect()
    }

    pub fn edge_label(&self, edge: &Edge) -> String {
        format!("{} -> {}", self.nodes[edge.source].name, self.nodes[edge.target].name)
    }

    /// Incoming edges per LNL as `(edge index, source)` pairs.
    pub fn incoming(&self) -> Vec<Vec<(usize, EdgeSource)>> {
        let mut incoming = vec![Vec::new(); self.lnl_count()];
        for (idx, edge) in self.edges.iter().enumerate() {
            incoming[edge.to_lnl].push((idx, edge.from));
        }
        incoming
    }
}

/// Encode a node as a `"kind,name"` key.
pub fn encode_key(kind: NodeKind, name: &str) -> Result<String> {
    if name.contains(',') {
        return Err(Error::InvalidKey(name.to_string()));
    }
    Ok(format!("{},{}", kind.as_str(), name))
}

pub fn decode_key(key: &str) -> Result<(NodeKind, String)> {
    let (kind, name) = key
        .split_once(',')
        .ok_or_else(|| Error::InvalidKey(key.to_string()))?;
    if name.contains(',') {
        return Err(Error::InvalidKey(key.to_string()));
    }
    Ok((NodeKind::parse_for(kind, name)?, name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_entries() -> Vec<GraphEntry> {
        vec![
            GraphEntry::new("tumor", "primary", &["one", "two"]),
            GraphEntry::new("lnl", "one", &["two", "three"]),
            GraphEntry::new("lnl", "two", &["three"]),
            GraphEntry::new("lnl", "three", &[]),
        ]
    }

    #[test]
    fn classifies_base_and_transition_edges() {
        let graph = Graph::from_entries(&example_entries()).unwrap();
        assert_eq!(graph.lnl_count(), 3);
        assert_eq!(graph.base_edges().len(), 2);
        assert_eq!(graph.trans_edges().len(), 3);
        assert!(graph.base_edges().iter().all(Edge::is_base));
        assert_eq!(graph.lnl_names(), vec!["one", "two", "three"]);

        let labels: Vec<_> = graph.edges().iter().map(|e| graph.edge_label(e)).collect();
        assert_eq!(
            labels,
            vec![
                "primary -> one",
                "primary -> two",
                "one -> two",
                "one -> three",
                "two -> three"
            ]
        );
    }

    #[test]
    fn base_edges_come_first_even_if_declared_later() {
        let graph = Graph::from_entries(&[
            GraphEntry::new("lnl", "a", &["b"]),
            GraphEntry::new("lnl", "b", &[]),
            GraphEntry::new("tumor", "t", &["a"]),
        ])
        .unwrap();
        assert_eq!(graph.edge_label(&graph.edges()[0]), "t -> a");
        assert_eq!(graph.edges()[1].from, EdgeSource::Lnl(0));
    }

    #[test]
    fn unknown_kind_names_the_node() {
        let err = Graph::from_entries(&[
            GraphEntry::new("tumor", "primary", &["x"]),
            GraphEntry::new("vessel", "x", &[]),
        ])
        .unwrap_err();
        match err {
            Error::UnknownNodeKind { name, kind } => {
                assert_eq!(name, "x");
                assert_eq!(kind, "vessel");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn rejects_edges_into_tumors() {
        let err = Graph::from_entries(&[
            GraphEntry::new("tumor", "primary", &[]),
            GraphEntry::new("lnl", "one", &["primary"]),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::InvalidGraph(_)));
    }

    #[test]
    fn rejects_too_many_lnls() {
        let names: Vec<String> = (0..=MAX_STATE_BITS).map(|i| format!("L{i}")).collect();
        let targets = names.clone();
        let mut entries = vec![("tumor", "primary", targets.as_slice())];
        entries.extend(names.iter().map(|n| ("lnl", n.as_str(), &[][..])));
        let err = Graph::new(entries).unwrap_err();
        assert!(matches!(err, Error::InvalidGraph(_)), "{err}");
    }

    #[test]
    fn accepts_lnls_up_to_the_limit() {
        let names: Vec<String> = (0..MAX_STATE_BITS).map(|i| format!("L{i}")).collect();
        let mut entries = vec![("tumor", "primary", &names[..1])];
        entries.extend(names.iter().map(|n| ("lnl", n.as_str(), &[][..])));
        assert_eq!(Graph::new(entries).unwrap().lnl_count(), MAX_STATE_BITS);
    }

    #[test]
    fn key_map_roundtrip_keeps_order() {
        let graph = Graph::from_entries(&example_entries()).unwrap();
        let map = graph.to_key_map().unwrap();
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["tumor,primary", "lnl,one", "lnl,two", "lnl,three"]);
        assert_eq!(Graph::from_key_map(&map).unwrap(), graph);
    }

    #[test]
    fn keys_reject_commas() {
        assert!(matches!(
            encode_key(NodeKind::Lnl, "II,a"),
            Err(Error::InvalidKey(_))
        ));
        assert!(matches!(decode_key("lnl"), Err(Error::InvalidKey(_))));
        assert!(matches!(decode_key("lnl,a,b"), Err(Error::InvalidKey(_))));
        assert_eq!(
            decode_key("tumor,primary").unwrap(),
            (NodeKind::Tumor, "primary".to_string())
        );
    }

    #[test]
    fn incoming_edges_per_lnl() {
        let graph = Graph::from_entries(&example_entries()).unwrap();
        let incoming = graph.incoming();
        assert_eq!(incoming[0], vec![(0, EdgeSource::Tumor)]);
        assert_eq!(incoming[1], vec![(1, EdgeSource::Tumor), (2, EdgeSource::Lnl(0))]);
        assert_eq!(
            incoming[2],
            vec![(3, EdgeSource::Lnl(0)), (4, EdgeSource::Lnl(1))]
        );
    }
}
