use super::atom::AtomAttributes;
use super::topology::{BondAttributes, canonical_pair};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Self-bond on node {0}")]
    SelfLoop(usize),
    #[error("Duplicate edge between nodes {0} and {1}")]
    DuplicateEdge(usize, usize),
    #[error("Edge references node {node}, but the graph has only {node_count} nodes")]
    UnknownNode { node: usize, node_count: usize },
}

/// An undirected graph with typed node and edge attributes over a dense `0..n` node space.
///
/// Nodes are never removed, so a node's `usize` index is its petgraph `NodeIndex`. Every
/// edge is stored with its endpoints in canonical `(lower, higher)` order and at most once.
#[derive(Debug, Clone)]
pub struct AttributedGraph<N> {
    graph: UnGraph<N, BondAttributes>,
}

impl<N> Default for AttributedGraph<N> {
    fn default() -> Self {
        Self {
            graph: UnGraph::default(),
        }
    }
}

impl<N: PartialEq> PartialEq for AttributedGraph<N> {
    fn eq(&self, other: &Self) -> bool {
        self.graph.node_count() == other.graph.node_count()
            && self
                .graph
                .raw_nodes()
                .iter()
                .zip(other.graph.raw_nodes())
                .all(|(a, b)| a.weight == b.weight)
            && self.edges().collect::<BTreeMap<_, _>>() == other.edges().collect::<BTreeMap<_, _>>()
    }
}

impl<N> AttributedGraph<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, attributes: N) -> usize {
        self.graph.add_node(attributes).index()
    }

    pub fn add_edge(
        &mut self,
        a: usize,
        b: usize,
        attributes: BondAttributes,
    ) -> Result<(), GraphError> {
        let node_count = self.graph.node_count();
        for node in [a, b] {
            if node >= node_count {
                return Err(GraphError::UnknownNode { node, node_count });
            }
        }
        if a == b {
            return Err(GraphError::SelfLoop(a));
        }
        let (low, high) = canonical_pair(a, b);
        if self.contains_edge(low, high) {
            return Err(GraphError::DuplicateEdge(low, high));
        }
        self.graph
            .add_edge(NodeIndex::new(low), NodeIndex::new(high), attributes);
        Ok(())
    }

    pub fn node(&self, index: usize) -> Option<&N> {
        self.graph.node_weight(NodeIndex::new(index))
    }

    pub fn node_mut(&mut self, index: usize) -> Option<&mut N> {
        self.graph.node_weight_mut(NodeIndex::new(index))
    }

    pub fn nodes(&self) -> impl Iterator<Item = (usize, &N)> {
        self.graph
            .node_indices()
            .map(move |i| (i.index(), &self.graph[i]))
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut N> {
        self.graph.node_weights_mut()
    }

    /// Edges in insertion order, keyed by their canonical node pair.
    pub fn edges(&self) -> impl Iterator<Item = ((usize, usize), &BondAttributes)> {
        self.graph
            .edge_references()
            .map(|e| ((e.source().index(), e.target().index()), e.weight()))
    }

    pub fn edge(&self, a: usize, b: usize) -> Option<&BondAttributes> {
        self.graph
            .find_edge(NodeIndex::new(a), NodeIndex::new(b))
            .and_then(|e| self.graph.edge_weight(e))
    }

    pub fn contains_edge(&self, a: usize, b: usize) -> bool {
        self.graph
            .contains_edge(NodeIndex::new(a), NodeIndex::new(b))
    }

    /// Neighbours of `index`; empty for an unknown node.
    pub fn neighbors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.graph
            .neighbors(NodeIndex::new(index))
            .map(|n| n.index())
    }

    pub fn degree(&self, index: usize) -> usize {
        self.neighbors(index).count()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Copies every node and edge of `other` into this graph, converting node attributes
    /// with `convert`. Returns the index offset applied to the copied nodes.
    pub fn absorb<M>(
        &mut self,
        other: &AttributedGraph<M>,
        mut convert: impl FnMut(usize, &M) -> N,
    ) -> usize {
        let offset = self.graph.node_count();
        for (index, attrs) in other.nodes() {
            self.graph.add_node(convert(index, attrs));
        }
        for ((a, b), attrs) in other.edges() {
            self.graph.add_edge(
                NodeIndex::new(a + offset),
                NodeIndex::new(b + offset),
                attrs.clone(),
            );
        }
        offset
    }
}

/// The attributed graph of a single molecule.
pub type MoleculeGraph = AttributedGraph<AtomAttributes>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::topology::BondType;

    fn node(element: &str) -> AtomAttributes {
        AtomAttributes {
            element: element.to_string(),
            ..Default::default()
        }
    }

    fn three_node_graph() -> MoleculeGraph {
        let mut graph = MoleculeGraph::new();
        graph.add_node(node("C"));
        graph.add_node(node("C"));
        graph.add_node(node("O"));
        graph
    }

    #[test]
    fn add_node_returns_dense_indices() {
        let graph = three_node_graph();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.node(2).unwrap().element, "O");
        assert!(graph.node(3).is_none());
    }

    #[test]
    fn add_edge_links_both_endpoints() {
        let mut graph = three_node_graph();
        graph
            .add_edge(1, 0, BondAttributes::new(BondType::Single))
            .unwrap();
        assert!(graph.contains_edge(0, 1));
        assert!(graph.contains_edge(1, 0));
        assert_eq!(graph.neighbors(0).collect::<Vec<_>>(), [1]);
        assert_eq!(graph.neighbors(1).collect::<Vec<_>>(), [0]);
        assert_eq!(graph.degree(2), 0);
        assert_eq!(graph.neighbors(9).count(), 0);
        assert_eq!(graph.edges().next().unwrap().0, (0, 1));
    }

    #[test]
    fn add_edge_rejects_duplicates_regardless_of_order() {
        let mut graph = three_node_graph();
        graph
            .add_edge(0, 2, BondAttributes::new(BondType::Single))
            .unwrap();
        let err = graph
            .add_edge(2, 0, BondAttributes::new(BondType::Double))
            .unwrap_err();
        assert_eq!(err, GraphError::DuplicateEdge(0, 2));
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edge(0, 2).unwrap().bond_type, BondType::Single);
    }

    #[test]
    fn add_edge_rejects_self_loops_and_unknown_nodes() {
        let mut graph = three_node_graph();
        assert_eq!(
            graph.add_edge(1, 1, BondAttributes::new(BondType::Single)),
            Err(GraphError::SelfLoop(1))
        );
        assert_eq!(
            graph.add_edge(0, 7, BondAttributes::new(BondType::Single)),
            Err(GraphError::UnknownNode {
                node: 7,
                node_count: 3
            })
        );
    }

    #[test]
    fn absorb_offsets_nodes_and_edges() {
        let mut molecule = three_node_graph();
        molecule
            .add_edge(0, 1, BondAttributes::new(BondType::Single))
            .unwrap();
        molecule
            .add_edge(1, 2, BondAttributes::new(BondType::Single))
            .unwrap();

        let mut merged: AttributedGraph<(usize, String)> = AttributedGraph::new();
        let first = merged.absorb(&molecule, |i, a| (i, a.element.clone()));
        let second = merged.absorb(&molecule, |i, a| (i, a.element.clone()));

        assert_eq!(first, 0);
        assert_eq!(second, 3);
        assert_eq!(merged.node_count(), 6);
        assert_eq!(merged.edge_count(), 4);
        assert!(merged.contains_edge(3, 4));
        assert!(merged.contains_edge(4, 5));
        assert!(!merged.contains_edge(2, 3));
        assert_eq!(merged.node(5).unwrap(), &(2, "O".to_string()));
    }

    #[test]
    fn equality_ignores_edge_insertion_order() {
        let mut forward = three_node_graph();
        forward
            .add_edge(0, 1, BondAttributes::new(BondType::Single))
            .unwrap();
        forward
            .add_edge(1, 2, BondAttributes::new(BondType::Double))
            .unwrap();
        let mut backward = three_node_graph();
        backward
            .add_edge(2, 1, BondAttributes::new(BondType::Double))
            .unwrap();
        backward
            .add_edge(1, 0, BondAttributes::new(BondType::Single))
            .unwrap();
        assert_eq!(forward, backward);

        backward.node_mut(2).unwrap().element = "N".to_string();
        assert_ne!(forward, backward);
    }
}
