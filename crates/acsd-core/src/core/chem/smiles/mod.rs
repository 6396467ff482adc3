//! A connectivity-level SMILES reader.
//!
//! Produces an atom/bond graph with implicit hydrogen counts, which is all the
//! atom-environment comparison needs. Stereochemistry is read and discarded.

pub mod error;
pub mod tokenizer;

pub use error::SmilesError;

use crate::core::chem::elements::default_valences;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::BTreeMap;
use tokenizer::{AtomToken, BondToken, Token, tokenize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmilesAtom {
    pub element: String,
    pub is_aromatic: bool,
    pub isotope: Option<u16>,
    pub charge: i32,
    /// Hydrogens implied by the SMILES rather than written as atoms.
    pub implicit_hydrogens: u32,
    pub is_bracket: bool,
}

impl SmilesAtom {
    pub fn is_hydrogen(&self) -> bool {
        matches!(self.element.as_str(), "H" | "D" | "T")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmilesBondOrder {
    Single,
    Double,
    Triple,
    Quadruple,
    Aromatic,
}

impl SmilesBondOrder {
    fn valence(&self) -> u32 {
        match self {
            Self::Single | Self::Aromatic => 1,
            Self::Double => 2,
            Self::Triple => 3,
            Self::Quadruple => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmilesBond {
    pub atoms: (usize, usize),
    pub order: SmilesBondOrder,
}

#[derive(Debug, Clone, Default)]
pub struct SmilesGraph {
    graph: UnGraph<SmilesAtom, SmilesBondOrder>,
}

impl SmilesGraph {
    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn atom(&self, index: usize) -> Option<&SmilesAtom> {
        self.graph.node_weight(NodeIndex::new(index))
    }

    /// Atoms in the order they appear in the SMILES string.
    pub fn atoms(&self) -> impl Iterator<Item = (usize, &SmilesAtom)> + '_ {
        self.graph
            .node_indices()
            .map(move |i| (i.index(), &self.graph[i]))
    }

    /// Bonds in the order they were closed while reading.
    pub fn bonds(&self) -> impl Iterator<Item = SmilesBond> + '_ {
        self.graph.edge_references().map(|e| SmilesBond {
            atoms: (e.source().index(), e.target().index()),
            order: *e.weight(),
        })
    }

    pub fn neighbors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.graph
            .neighbors(NodeIndex::new(index))
            .map(|n| n.index())
    }

    fn add_atom(&mut self, token: &AtomToken) -> usize {
        self.graph
            .add_node(SmilesAtom {
                element: token.symbol.clone(),
                is_aromatic: token.is_aromatic,
                isotope: token.isotope,
                charge: i32::from(token.charge),
                implicit_hydrogens: token.hcount.map_or(0, u32::from),
                is_bracket: token.is_bracket,
            })
            .index()
    }

    fn has_bond(&self, a: usize, b: usize) -> bool {
        self.graph.contains_edge(NodeIndex::new(a), NodeIndex::new(b))
    }

    fn add_bond(&mut self, a: usize, b: usize, token: Option<BondToken>) {
        let (a, b) = (NodeIndex::new(a), NodeIndex::new(b));
        let order = match token {
            Some(BondToken::Double) => SmilesBondOrder::Double,
            Some(BondToken::Triple) => SmilesBondOrder::Triple,
            Some(BondToken::Quadruple) => SmilesBondOrder::Quadruple,
            Some(BondToken::Aromatic) => SmilesBondOrder::Aromatic,
            Some(BondToken::Single | BondToken::Up | BondToken::Down) => SmilesBondOrder::Single,
            None if self.graph[a].is_aromatic && self.graph[b].is_aromatic => {
                SmilesBondOrder::Aromatic
            }
            None => SmilesBondOrder::Single,
        };
        self.graph.add_edge(a, b, order);
    }

    // Organic-subset atoms get the hydrogens needed to reach their smallest default
    // valence; aromatic atoms count one extra bond for the delocalised system.
    fn assign_implicit_hydrogens(&mut self) {
        let mut bond_sums = vec![0u32; self.graph.node_count()];
        for edge in self.graph.edge_references() {
            bond_sums[edge.source().index()] += edge.weight().valence();
            bond_sums[edge.target().index()] += edge.weight().valence();
        }

        for (atom, bond_sum) in self.graph.node_weights_mut().zip(bond_sums) {
            if atom.is_bracket {
                continue;
            }
            let used = bond_sum + u32::from(atom.is_aromatic);
            atom.implicit_hydrogens = default_valences(&atom.element)
                .and_then(|valences| valences.iter().find(|&&v| v >= used))
                .map_or(0, |v| v - used);
        }
    }
}

/// Reads a SMILES string into a connectivity graph.
pub fn parse_smiles(input: &str) -> Result<SmilesGraph, SmilesError> {
    let tokens = tokenize(input)?;
    if !tokens.iter().any(|t| matches!(t, Token::Atom(_))) {
        return Err(SmilesError::EmptyInput);
    }

    let mut graph = SmilesGraph::default();
    let mut previous: Option<usize> = None;
    let mut pending_bond: Option<(BondToken, usize)> = None;
    let mut branches: Vec<(Option<usize>, usize)> = Vec::new();
    let mut open_rings: BTreeMap<u16, (usize, Option<BondToken>, usize)> = BTreeMap::new();
    let mut trailing_dot: Option<usize> = None;

    for token in &tokens {
        match token {
            Token::Atom(atom) => {
                let index = graph.add_atom(atom);
                match (previous, pending_bond.take()) {
                    (Some(prev), bond) => graph.add_bond(prev, index, bond.map(|(b, _)| b)),
                    (None, Some((_, pos))) => return Err(SmilesError::DanglingBond { pos }),
                    (None, None) => {}
                }
                previous = Some(index);
            }
            Token::Bond(bond, pos) => {
                if previous.is_none() || pending_bond.is_some() {
                    return Err(SmilesError::DanglingBond { pos: *pos });
                }
                pending_bond = Some((*bond, *pos));
            }
            Token::RingClosure { digit, pos } => {
                let current = previous.ok_or(SmilesError::InvalidRingBond {
                    digit: *digit,
                    pos: *pos,
                })?;
                let bond = pending_bond.take().map(|(b, _)| b);
                match open_rings.remove(digit) {
                    Some((partner, partner_bond, _)) => {
                        if partner == current || graph.has_bond(partner, current) {
                            return Err(SmilesError::InvalidRingBond {
                                digit: *digit,
                                pos: *pos,
                            });
                        }
                        let order = match (partner_bond, bond) {
                            (Some(a), Some(b)) if a != b => {
                                return Err(SmilesError::RingBondConflict { digit: *digit });
                            }
                            (a, b) => a.or(b),
                        };
                        graph.add_bond(partner, current, order);
                    }
                    None => {
                        open_rings.insert(*digit, (current, bond, *pos));
                    }
                }
            }
            Token::OpenParen(pos) => {
                if previous.is_none() {
                    return Err(SmilesError::UnmatchedParen { pos: *pos });
                }
                branches.push((previous, *pos));
            }
            Token::CloseParen(pos) => {
                if let Some((_, bond_pos)) = pending_bond {
                    return Err(SmilesError::DanglingBond { pos: bond_pos });
                }
                let (branch_root, _) = branches
                    .pop()
                    .ok_or(SmilesError::UnmatchedParen { pos: *pos })?;
                previous = branch_root;
            }
            Token::Dot(pos) => {
                // Every fragment between dots needs at least one atom.
                if previous.is_none() || pending_bond.is_some() || !branches.is_empty() {
                    return Err(SmilesError::UnexpectedChar { pos: *pos, ch: '.' });
                }
                previous = None;
                trailing_dot = Some(*pos);
            }
        }
        if matches!(token, Token::Atom(_)) {
            trailing_dot = None;
        }
    }

    if let Some(pos) = trailing_dot {
        return Err(SmilesError::UnexpectedChar { pos, ch: '.' });
    }

    if let Some((_, pos)) = pending_bond {
        return Err(SmilesError::DanglingBond { pos });
    }
    if let Some((_, pos)) = branches.pop() {
        return Err(SmilesError::UnmatchedParen { pos });
    }
    if let Some((&digit, _)) = open_rings.iter().next() {
        return Err(SmilesError::UnclosedRing { digit });
    }

    graph.assign_implicit_hydrogens();
    Ok(graph)
}
