//! Element interactions.
//!
//! A dense matrix of pairwise damage factors, plus a sparse relation graph
//! used to answer structural questions such as "which elements oppose this
//! one". The matrix is the hot path (two index loads per combat hit); the
//! graph feeds slower machinery like mastery decay.

use crate::catalog::{ElementCatalog, ElementIndex};
use crate::error::{ElemResult, ElementError};
use crate::ids::ElementId;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

/// Relation classes between a source and a target element.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InteractionKind {
    /// Source feeds the target; attacks land harder.
    Generating,
    /// Source suppresses the target.
    Overcoming,
    /// Same element; resisted.
    Same,
    /// No relation.
    Neutral,
    /// Direct opposites; mutual dampening.
    Opposite,
    /// Scripted pairing with a hand-set factor.
    Special,
}

impl InteractionKind {
    /// The multiplier applied when a rule does not override it.
    pub fn default_multiplier(&self) -> f64 {
        match self {
            InteractionKind::Generating => 1.2,
            InteractionKind::Overcoming => 1.5,
            InteractionKind::Same => 0.8,
            InteractionKind::Neutral => 1.0,
            InteractionKind::Opposite => 0.7,
            InteractionKind::Special => 1.0,
        }
    }
}

/// One declared relation between two elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRule {
    pub source: ElementId,
    pub target: ElementId,
    pub kind: InteractionKind,
    /// Overrides the kind's default multiplier when set.
    #[serde(default)]
    pub multiplier: Option<f64>,
}

impl InteractionRule {
    pub fn new(source: impl Into<ElementId>, target: impl Into<ElementId>, kind: InteractionKind) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
            multiplier: None,
        }
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(multiplier);
        self
    }
}

fn resolve(catalog: &ElementCatalog, id: &ElementId) -> ElemResult<ElementIndex> {
    catalog
        .lookup(id.as_str())
        .ok_or_else(|| ElementError::UnknownElement { id: id.to_string() })
}

/// Dense source x target factor table.
///
/// Unregistered pairs read as 1.0, so combat math never has to branch on
/// whether a relation exists.
#[derive(Debug, Clone)]
pub struct InteractionMatrix {
    side: usize,
    factors: Vec<f64>,
}

impl InteractionMatrix {
    /// An all-neutral matrix for `side` elements.
    pub fn neutral(side: usize) -> Self {
        Self {
            side,
            factors: vec![1.0; side * side],
        }
    }

    /// Build a matrix from declared rules, resolving element ids through
    /// the catalog. Unknown ids fail the whole build.
    pub fn from_rules(catalog: &ElementCatalog, rules: &[InteractionRule]) -> ElemResult<Self> {
        let mut matrix = Self::neutral(catalog.len());
        for rule in rules {
            let source = resolve(catalog, &rule.source)?;
            let target = resolve(catalog, &rule.target)?;
            let factor = rule.multiplier.unwrap_or_else(|| rule.kind.default_multiplier());
            matrix.set_factor(source, target, factor)?;
        }
        Ok(matrix)
    }

    /// The factor applied when `source` attacks `target`. Out-of-range
    /// indices read as neutral.
    pub fn factor(&self, source: ElementIndex, target: ElementIndex) -> f64 {
        if source.get() < self.side && target.get() < self.side {
            self.factors[source.get() * self.side + target.get()]
        } else {
            1.0
        }
    }

    /// Overwrite one cell. Rejects negative or non-finite factors and
    /// out-of-range indices, leaving the matrix unchanged.
    pub fn set_factor(
        &mut self,
        source: ElementIndex,
        target: ElementIndex,
        factor: f64,
    ) -> ElemResult<()> {
        if !factor.is_finite() {
            return Err(ElementError::NonFiniteValue { value: factor });
        }
        if factor < 0.0 {
            return Err(ElementError::NegativeFactor { value: factor });
        }
        for index in [source, target] {
            if index.get() >= self.side {
                return Err(ElementError::ElementIndexOutOfRange {
                    index: index.get(),
                    count: self.side,
                });
            }
        }
        self.factors[source.get() * self.side + target.get()] = factor;
        Ok(())
    }

    pub fn side(&self) -> usize {
        self.side
    }
}

/// Directed relation graph over catalog elements.
///
/// Nodes are element indices in catalog order, edges carry the relation
/// kind. Only structural queries live here; numeric factors stay in the
/// matrix.
#[derive(Debug, Clone)]
pub struct RelationGraph {
    graph: DiGraph<ElementIndex, InteractionKind>,
}

impl RelationGraph {
    /// Build the graph from declared rules. Unknown ids fail the build.
    pub fn from_rules(catalog: &ElementCatalog, rules: &[InteractionRule]) -> ElemResult<Self> {
        let mut graph = DiGraph::with_capacity(catalog.len(), rules.len());
        for i in 0..catalog.len() {
            graph.add_node(ElementIndex::new(i));
        }
        for rule in rules {
            let source = resolve(catalog, &rule.source)?;
            let target = resolve(catalog, &rule.target)?;
            graph.add_edge(
                NodeIndex::new(source.get()),
                NodeIndex::new(target.get()),
                rule.kind,
            );
        }
        Ok(Self { graph })
    }

    /// An empty graph over `side` elements.
    pub fn neutral(side: usize) -> Self {
        let mut graph = DiGraph::new();
        for i in 0..side {
            graph.add_node(ElementIndex::new(i));
        }
        Self { graph }
    }

    /// Elements that suppress or oppose `element`: sources of incoming
    /// Overcoming and Opposite edges.
    pub fn opposing(&self, element: ElementIndex) -> Vec<ElementIndex> {
        if element.get() >= self.graph.node_count() {
            return Vec::new();
        }
        let node = NodeIndex::new(element.get());
        let mut out: Vec<ElementIndex> = self
            .graph
            .edges_directed(node, Direction::Incoming)
            .filter(|edge| {
                matches!(
                    edge.weight(),
                    InteractionKind::Overcoming | InteractionKind::Opposite
                )
            })
            .map(|edge| ElementIndex::new(edge.source().index()))
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// The relation kind on the `source -> target` edge, if one exists.
    pub fn relation(&self, source: ElementIndex, target: ElementIndex) -> Option<InteractionKind> {
        if source.get() >= self.graph.node_count() || target.get() >= self.graph.node_count() {
            return None;
        }
        self.graph
            .find_edge(NodeIndex::new(source.get()), NodeIndex::new(target.get()))
            .map(|edge| self.graph[edge])
    }
}
