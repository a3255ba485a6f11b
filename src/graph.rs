//! A module for working with graphs: vertices, relations and the ties within them.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    config::AnalysisConfig,
    edge::{Edge, EdgeType},
    error::{Error, Result},
    matrix::Snapshot,
    vertex::{Vertex, VertexId},
};

/// The minimum number of actors for the selection constructions (clique, star, cycle, line).
const MIN_SELECTION: usize = 3;

/// Rules for turning a directed network into a symmetric one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymmetrizeRule {
    /// Every arc gets a mirror arc.
    AllArcs,
    /// Only reciprocated arcs survive.
    StrongTies,
    /// Two actors are tied when at least one actor is tied to both of them. The tie weight is the
    /// number of such actors.
    Cocitation,
}

/// A named layer of ties over the vertex set of a graph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Relation {
    name: String,
    /// Arcs keyed by `(source, target)`. Undirected ties are stored in both orientations.
    arcs: BTreeMap<(VertexId, VertexId), Edge>,
}

impl Relation {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arcs: BTreeMap::new(),
        }
    }

    /// Returns the relation's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of stored arcs (undirected ties count twice).
    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    fn outbound(&self, vertex: VertexId) -> impl Iterator<Item = &Edge> {
        self.arcs
            .range((vertex, VertexId::MIN)..=(vertex, VertexId::MAX))
            .map(|(_, edge)| edge)
    }
}

/// A multi-relational social network.
///
/// Vertices are owned by the graph and addressed by stable ids. Each relation owns its own ties;
/// switching the current relation changes which ties are visible to queries and analyses but
/// never the vertex set.
///
/// # Examples
///
/// ```
/// use sociogram::graph::Graph;
///
/// let mut graph = Graph::undirected();
/// let a = graph.add_vertex();
/// let b = graph.add_vertex();
/// let c = graph.add_vertex();
///
/// graph.add_edge(a, b, 1.0).unwrap();
/// graph.add_edge(a, c, 1.0).unwrap();
///
/// assert_eq!(graph.edge_count(), 2);
/// assert_eq!(graph.density(), 2.0 / 3.0);
/// ```
#[derive(Clone, Debug)]
pub struct Graph {
    directed: bool,
    vertices: BTreeMap<VertexId, Vertex>,
    relations: Vec<Relation>,
    current: usize,
    next_id: VertexId,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Graph {
    /// Creates an empty graph with a single relation.
    pub fn new(directed: bool) -> Self {
        Self {
            directed,
            vertices: BTreeMap::new(),
            relations: vec![Relation::new("default")],
            current: 0,
            next_id: 1,
        }
    }

    /// Creates an empty directed graph.
    pub fn directed() -> Self {
        Self::new(true)
    }

    /// Creates an empty undirected graph.
    pub fn undirected() -> Self {
        Self::new(false)
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Builds the read-only dense view consumed by the analysis engines.
    pub fn snapshot(&self, config: &AnalysisConfig) -> Snapshot {
        Snapshot::new(self, config)
    }

    //
    // Vertices
    //

    /// Adds a vertex with the next free id and returns that id.
    ///
    /// Ids count up and removed ids are not reused until the counter reaches `VertexId::MAX`.
    /// From then on the smallest unused id is handed out.
    pub fn add_vertex(&mut self) -> VertexId {
        let id = match self.next_id.checked_add(1) {
            Some(next) => {
                let id = self.next_id;
                self.next_id = next;
                id
            }
            None => self.smallest_free_id(),
        };
        self.vertices.insert(id, Vertex::new(id));

        id
    }

    /// Adds a vertex with an explicit id, as importers do. `VertexId::MAX` is reserved.
    pub fn insert_vertex(&mut self, id: VertexId) -> Result<()> {
        if id == VertexId::MAX {
            return Err(Error::invalid(format!("vertex id {id} is reserved")));
        }
        if self.vertices.contains_key(&id) {
            return Err(Error::DuplicateVertex(id));
        }

        self.vertices.insert(id, Vertex::new(id));
        self.next_id = self.next_id.max(id + 1);

        Ok(())
    }

    fn smallest_free_id(&self) -> VertexId {
        let mut candidate: VertexId = 1;
        for &id in self.vertices.keys() {
            if id > candidate {
                break;
            }
            if id == candidate {
                candidate = candidate.saturating_add(1);
            }
        }

        candidate
    }

    /// Removes a vertex and every tie touching it.
    ///
    /// Disallowed while more than one relation exists, as ties of the inactive relations would be
    /// invalidated.
    pub fn remove_vertex(&mut self, id: VertexId) -> Result<Vertex> {
        if self.relations.len() > 1 {
            return Err(Error::MultiRelationConstraint {
                relations: self.relations.len(),
            });
        }

        let vertex = self.vertices.remove(&id).ok_or(Error::VertexNotFound(id))?;
        self.relation_mut().arcs.retain(|_, edge| !edge.contains(id));

        Ok(vertex)
    }

    pub fn contains_vertex(&self, id: VertexId) -> bool {
        self.vertices.contains_key(&id)
    }

    pub fn vertex(&self, id: VertexId) -> Result<&Vertex> {
        self.vertices.get(&id).ok_or(Error::VertexNotFound(id))
    }

    pub fn vertex_mut(&mut self, id: VertexId) -> Result<&mut Vertex> {
        self.vertices.get_mut(&id).ok_or(Error::VertexNotFound(id))
    }

    /// Iterates over the vertices in ascending id order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }

    /// Returns the vertex ids in ascending order.
    pub fn vertex_ids(&self) -> Vec<VertexId> {
        self.vertices.keys().copied().collect()
    }

    /// Returns the vertex count of the graph.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    //
    // Edges
    //

    /// Inserts a tie of the given weight into the current relation.
    ///
    /// Returns whether the tie was new; an existing tie is left untouched. Weights are finite and
    /// non-zero. Negative weights are kept as signed tie values and count by their magnitude in
    /// path lengths.
    pub fn add_edge(&mut self, source: VertexId, target: VertexId, weight: f64) -> Result<bool> {
        self.insert_edge(Edge::new(source, target, weight))
    }

    /// Inserts a tie, with its payload, into the current relation.
    pub fn insert_edge(&mut self, edge: Edge) -> Result<bool> {
        self.require(edge.source())?;
        self.require(edge.target())?;
        check_weight(edge.weight)?;

        let key = (edge.source(), edge.target());
        if self.relation().arcs.contains_key(&key) {
            return Ok(false);
        }

        let directed = self.directed;
        let arcs = &mut self.relation_mut().arcs;
        if !directed {
            arcs.insert((edge.target(), edge.source()), edge.reversed());
        }
        arcs.insert(key, edge);

        Ok(true)
    }

    /// Removes a tie from the current relation and returns whether it was present.
    ///
    /// # Examples
    ///
    /// ```
    /// use sociogram::graph::Graph;
    ///
    /// let mut graph = Graph::directed();
    /// let (a, b) = (graph.add_vertex(), graph.add_vertex());
    /// graph.add_edge(a, b, 1.0).unwrap();
    ///
    /// assert_eq!(graph.remove_edge(a, b), true);
    /// assert_eq!(graph.remove_edge(a, b), false);
    /// ```
    pub fn remove_edge(&mut self, source: VertexId, target: VertexId) -> bool {
        let directed = self.directed;
        let arcs = &mut self.relation_mut().arcs;
        let is_removed = arcs.remove(&(source, target)).is_some();

        if is_removed && !directed {
            arcs.remove(&(target, source));
        }

        is_removed
    }

    /// Checks if the current relation contains a tie from `source` to `target`.
    pub fn has_edge(&self, source: VertexId, target: VertexId) -> bool {
        self.relation().arcs.contains_key(&(source, target))
    }

    pub fn edge(&self, source: VertexId, target: VertexId) -> Option<&Edge> {
        self.relation().arcs.get(&(source, target))
    }

    /// Returns the weight of the tie from `source` to `target`, if any.
    pub fn weight(&self, source: VertexId, target: VertexId) -> Option<f64> {
        self.edge(source, target).map(|edge| edge.weight)
    }

    /// Updates the weight of an existing tie (both orientations in an undirected graph).
    pub fn set_edge_weight(&mut self, source: VertexId, target: VertexId, weight: f64) -> Result<()> {
        check_weight(weight)?;
        let directed = self.directed;
        let arcs = &mut self.relation_mut().arcs;

        let edge = arcs.get_mut(&(source, target)).ok_or(Error::EdgeNotFound {
            from: source,
            to: target,
        })?;
        edge.weight = weight;

        if !directed {
            if let Some(mirror) = arcs.get_mut(&(target, source)) {
                mirror.weight = weight;
            }
        }

        Ok(())
    }

    /// Returns the type of the tie from `source` to `target`, derived from its mirror.
    pub fn edge_type(&self, source: VertexId, target: VertexId) -> Option<EdgeType> {
        if !self.has_edge(source, target) {
            return None;
        }

        let edge_type = if !self.directed {
            EdgeType::Undirected
        } else if self.has_edge(target, source) {
            EdgeType::Reciprocated
        } else {
            EdgeType::Directed
        };

        Some(edge_type)
    }

    /// Changes the type of an arc by adding or removing its mirror.
    ///
    /// In a directed graph, `Reciprocated` and `Undirected` add the mirror (with the same weight)
    /// and `Directed` removes it. An undirected graph only accepts `Undirected`.
    pub fn set_edge_type(
        &mut self,
        source: VertexId,
        target: VertexId,
        edge_type: EdgeType,
    ) -> Result<()> {
        let edge = self
            .edge(source, target)
            .cloned()
            .ok_or(Error::EdgeNotFound {
                from: source,
                to: target,
            })?;

        if !self.directed {
            return match edge_type {
                EdgeType::Undirected => Ok(()),
                _ => Err(Error::invalid(
                    "ties of an undirected graph are always undirected",
                )),
            };
        }

        let arcs = &mut self.relation_mut().arcs;
        match edge_type {
            EdgeType::Directed => {
                arcs.remove(&(target, source));
            }
            EdgeType::Undirected | EdgeType::Reciprocated => {
                arcs.entry((target, source)).or_insert_with(|| edge.reversed());
            }
        }

        Ok(())
    }

    /// Iterates over the ties of the current relation, each undirected tie once.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        let directed = self.directed;
        self.relation()
            .arcs
            .values()
            .filter(move |edge| directed || edge.source() <= edge.target())
    }

    /// Returns the number of ties in the current relation, each undirected tie counted once.
    pub fn edge_count(&self) -> usize {
        self.edges().count()
    }

    /// Returns the vertices `vertex` sends ties to.
    pub fn successors(&self, vertex: VertexId) -> Vec<VertexId> {
        self.relation()
            .outbound(vertex)
            .map(|edge| edge.target())
            .collect()
    }

    /// Returns the vertices sending ties to `vertex`.
    pub fn predecessors(&self, vertex: VertexId) -> Vec<VertexId> {
        self.relation()
            .arcs
            .keys()
            .filter(|(_, target)| *target == vertex)
            .map(|(source, _)| *source)
            .collect()
    }

    pub fn out_degree(&self, vertex: VertexId) -> usize {
        self.relation().outbound(vertex).count()
    }

    pub fn in_degree(&self, vertex: VertexId) -> usize {
        self.predecessors(vertex).len()
    }

    /// Returns whether the vertex has no ties to or from other vertices. Self-loops don't count.
    pub fn is_isolated(&self, vertex: VertexId) -> bool {
        !self
            .relation()
            .arcs
            .keys()
            .any(|&(s, t)| s != t && (s == vertex || t == vertex))
    }

    //
    // Relations
    //

    /// Appends a new, empty relation and returns its index. The current relation is unchanged.
    pub fn add_relation(&mut self, name: impl Into<String>) -> usize {
        self.relations.push(Relation::new(name));
        self.relations.len() - 1
    }

    /// Makes another relation the current one.
    pub fn switch_relation(&mut self, index: usize) -> Result<()> {
        if index >= self.relations.len() {
            return Err(Error::RelationNotFound(index));
        }

        debug!(from = self.current, to = index, "switching relation");
        self.current = index;

        Ok(())
    }

    /// Removes a relation. The last remaining relation can't be removed.
    pub fn remove_relation(&mut self, index: usize) -> Result<Relation> {
        if index >= self.relations.len() {
            return Err(Error::RelationNotFound(index));
        }

        if self.relations.len() == 1 {
            return Err(Error::invalid("a graph keeps at least one relation"));
        }

        let relation = self.relations.remove(index);
        if self.current >= index && self.current > 0 {
            self.current -= 1;
        }

        Ok(relation)
    }

    pub fn rename_relation(&mut self, index: usize, name: impl Into<String>) -> Result<()> {
        let relation = self
            .relations
            .get_mut(index)
            .ok_or(Error::RelationNotFound(index))?;
        relation.name = name.into();

        Ok(())
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// Returns the index of the current relation.
    pub fn current_relation(&self) -> usize {
        self.current
    }

    //
    // Whole-graph transformations and measures
    //

    /// Switches the graph between directed and undirected semantics.
    ///
    /// Going undirected merges each arc with its mirror in every relation, keeping the larger
    /// weight.
    pub fn set_directed(&mut self, directed: bool) {
        if self.directed == directed {
            return;
        }

        if !directed {
            for relation in &mut self.relations {
                let keys: Vec<(VertexId, VertexId)> = relation.arcs.keys().copied().collect();
                for (source, target) in keys {
                    let weight = relation.arcs[&(source, target)].weight;
                    match relation.arcs.get_mut(&(target, source)) {
                        Some(mirror) => mirror.weight = mirror.weight.max(weight),
                        None => {
                            let mirror = relation.arcs[&(source, target)].reversed();
                            relation.arcs.insert((target, source), mirror);
                        }
                    }
                }
            }
        }

        self.directed = directed;
    }

    /// Computes the density of the current relation, the ratio of ties with respect to the
    /// maximum possible ties. Self-loops are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use sociogram::graph::Graph;
    ///
    /// let mut graph = Graph::directed();
    /// let (a, b) = (graph.add_vertex(), graph.add_vertex());
    ///
    /// graph.add_edge(a, b, 1.0).unwrap();
    /// assert_eq!(graph.density(), 0.5);
    ///
    /// graph.add_edge(b, a, 1.0).unwrap();
    /// assert_eq!(graph.density(), 1.0);
    /// ```
    pub fn density(&self) -> f64 {
        let vc = self.vertex_count() as f64;
        let ec = self.edges().filter(|edge| !edge.is_loop()).count() as f64;

        // Calculate the total number of possible ties given a vertex count.
        let pec = if self.directed {
            vc * (vc - 1.0)
        } else {
            vc * (vc - 1.0) / 2.0
        };

        ec / pec
    }

    /// Returns whether every arc of the current relation has a mirror arc.
    pub fn is_symmetric(&self) -> bool {
        let arcs = &self.relation().arcs;
        arcs.keys().all(|&(s, t)| arcs.contains_key(&(t, s)))
    }

    /// Returns the fraction of arcs whose mirror also exists. Self-loops are ignored.
    pub fn reciprocity(&self) -> f64 {
        let arcs = &self.relation().arcs;
        let (mut total, mut reciprocated) = (0usize, 0usize);

        for &(s, t) in arcs.keys().filter(|(s, t)| s != t) {
            total += 1;
            if arcs.contains_key(&(t, s)) {
                reciprocated += 1;
            }
        }

        if total == 0 {
            return 0.0;
        }

        reciprocated as f64 / total as f64
    }

    /// Makes the current relation symmetric according to `rule`.
    pub fn symmetrize(&mut self, rule: SymmetrizeRule) {
        let arcs = &mut self.relations[self.current].arcs;

        match rule {
            SymmetrizeRule::AllArcs => {
                let missing: Vec<Edge> = arcs
                    .values()
                    .filter(|edge| !arcs.contains_key(&(edge.target(), edge.source())))
                    .map(Edge::reversed)
                    .collect();
                for edge in missing {
                    arcs.insert((edge.source(), edge.target()), edge);
                }
            }
            SymmetrizeRule::StrongTies => {
                let keys: BTreeSet<(VertexId, VertexId)> = arcs.keys().copied().collect();
                arcs.retain(|&(s, t), _| keys.contains(&(t, s)));
            }
            SymmetrizeRule::Cocitation => {
                // Senders per receiver: actors citing each vertex.
                let mut citers: BTreeMap<VertexId, BTreeSet<VertexId>> = BTreeMap::new();
                for &(s, t) in arcs.keys().filter(|(s, t)| s != t) {
                    citers.entry(t).or_default().insert(s);
                }

                let mut cocited = BTreeMap::new();
                for (i, (&a, citers_a)) in citers.iter().enumerate() {
                    for (&b, citers_b) in citers.iter().skip(i + 1) {
                        let shared = citers_a.intersection(citers_b).count();
                        if shared > 0 {
                            let weight = shared as f64;
                            cocited.insert((a, b), Edge::new(a, b, weight));
                            cocited.insert((b, a), Edge::new(b, a, weight));
                        }
                    }
                }

                *arcs = cocited;
            }
        }
    }

    /// Binarizes the current relation: ties weighing at least `threshold` become unit ties and
    /// the rest are dropped.
    pub fn dichotomize(&mut self, threshold: f64) {
        let arcs = &mut self.relation_mut().arcs;
        arcs.retain(|_, edge| edge.weight >= threshold);
        for edge in arcs.values_mut() {
            edge.weight = 1.0;
        }
    }

    //
    // Selection constructions
    //

    /// Ties every pair of the selected actors.
    pub fn make_clique(&mut self, selection: &[VertexId]) -> Result<()> {
        self.check_selection(selection)?;

        for (i, &a) in selection.iter().enumerate() {
            for &b in &selection[i + 1..] {
                self.tie(a, b)?;
            }
        }

        Ok(())
    }

    /// Ties the first selected actor (the hub) to every other selected actor.
    pub fn make_star(&mut self, selection: &[VertexId]) -> Result<()> {
        self.check_selection(selection)?;

        let hub = selection[0];
        for &leaf in &selection[1..] {
            self.tie(hub, leaf)?;
        }

        Ok(())
    }

    /// Ties the selected actors in order, closing the ring from last to first.
    pub fn make_cycle(&mut self, selection: &[VertexId]) -> Result<()> {
        self.make_line(selection)?;
        self.tie(selection[selection.len() - 1], selection[0])
    }

    /// Ties the selected actors in order.
    pub fn make_line(&mut self, selection: &[VertexId]) -> Result<()> {
        self.check_selection(selection)?;

        for pair in selection.windows(2) {
            self.tie(pair[0], pair[1])?;
        }

        Ok(())
    }

    //
    // Private
    //

    fn relation(&self) -> &Relation {
        // Safety: `current` always indexes an existing relation, which every mutation of
        // `relations` maintains.
        &self.relations[self.current]
    }

    fn relation_mut(&mut self) -> &mut Relation {
        &mut self.relations[self.current]
    }

    /// Returns the ties of the current relation keyed by `(source, target)`, both orientations
    /// included for undirected ties.
    pub(crate) fn arcs(&self) -> impl Iterator<Item = &Edge> {
        self.relation().arcs.values()
    }

    fn require(&self, id: VertexId) -> Result<()> {
        if self.vertices.contains_key(&id) {
            Ok(())
        } else {
            Err(Error::VertexNotFound(id))
        }
    }

    fn check_selection(&self, selection: &[VertexId]) -> Result<()> {
        if selection.len() < MIN_SELECTION {
            return Err(Error::InsufficientSelection {
                required: MIN_SELECTION,
                got: selection.len(),
            });
        }

        selection.iter().try_for_each(|&id| self.require(id))
    }

    /// Adds a unit tie in both directions (a single edge in an undirected graph).
    fn tie(&mut self, a: VertexId, b: VertexId) -> Result<()> {
        self.add_edge(a, b, 1.0)?;
        if self.directed {
            self.add_edge(b, a, 1.0)?;
        }

        Ok(())
    }
}

/// A zero weight would be a tie absent from the adjacency matrix yet zero long in path costs.
fn check_weight(weight: f64) -> Result<()> {
    if weight == 0.0 || !weight.is_finite() {
        return Err(Error::invalid(format!("tie weight {weight} must be finite and non-zero")));
    }

    Ok(())
}
