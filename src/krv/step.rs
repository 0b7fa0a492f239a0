//! Linear updates of the implicit flow vectors.
//!
//! Each active edge conceptually carries a flow vector in `R^m`. A step is a
//! linear map `M` with `flow'_a = Σ_b M[a][b] · flow_b`; because projection
//! onto a direction is linear too, the same map updates every tracked
//! projection. Maps are sparse: a row that is not stored is the identity row.
//!
//! - [`MatchingStep`] mixes matched pairs of edges.
//! - [`DeletionStep`] moves source mass onto the min cut and reshapes the
//!   active/inactive partition.

use super::divider::Division;
use crate::graph::Subgraph;
use ndarray::ArrayViewMut1;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// A sparse square map over local edges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseMap {
    rows: BTreeMap<usize, Vec<(usize, f64)>>,
}

impl SparseMap {
    /// The identity map.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Whether every row is the identity row.
    pub fn is_identity(&self) -> bool {
        self.rows.is_empty()
    }

    /// Stored row of `edge`, or `None` for an identity row.
    pub fn row(&self, edge: usize) -> Option<&[(usize, f64)]> {
        self.rows.get(&edge).map(Vec::as_slice)
    }

    /// Replace the row of `edge`.
    pub fn set_row(&mut self, edge: usize, entries: Vec<(usize, f64)>) {
        self.rows.insert(edge, entries);
    }

    /// Make `edge` carry nothing.
    pub fn zero_row(&mut self, edge: usize) {
        self.rows.insert(edge, Vec::new());
    }

    /// Apply to a projection vector indexed by local edge.
    pub fn apply(&self, projection: &[f64]) -> Vec<f64> {
        let mut out = projection.to_vec();
        for (&a, row) in &self.rows {
            out[a] = row.iter().map(|&(b, c)| c * projection[b]).sum();
        }
        out
    }

    /// Apply in place to one projection row.
    pub fn apply_to(&self, mut projection: ArrayViewMut1<'_, f64>) {
        let updates: Vec<(usize, f64)> = self
            .rows
            .iter()
            .map(|(&a, row)| (a, row.iter().map(|&(b, c)| c * projection[b]).sum()))
            .collect();
        for (a, value) in updates {
            projection[a] = value;
        }
    }

    /// The map "first `self`, then `then`".
    pub fn then(&self, then: &SparseMap) -> SparseMap {
        let mut rows = self.rows.clone();
        for (&a, outer) in &then.rows {
            let mut acc: BTreeMap<usize, f64> = BTreeMap::new();
            for &(b, c) in outer {
                match self.rows.get(&b) {
                    Some(inner) => {
                        for &(k, d) in inner {
                            *acc.entry(k).or_insert(0.0) += c * d;
                        }
                    }
                    None => *acc.entry(b).or_insert(0.0) += c,
                }
            }
            rows.insert(a, acc.into_iter().filter(|&(_, c)| c != 0.0).collect());
        }
        SparseMap { rows }
    }
}

/// Anything that updates the implicit flow vectors.
pub trait Step {
    /// The linear map of this step.
    fn map(&self) -> &SparseMap;

    /// Apply the step to a projection vector.
    fn apply(&self, projection: &[f64]) -> Vec<f64> {
        self.map().apply(projection)
    }
}

/// The active set A and the inactive set B, as local edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgePartition {
    /// Edges whose flow vectors are tracked.
    pub active: BTreeSet<usize>,
    /// Edges set aside by a deletion step.
    pub inactive: BTreeSet<usize>,
}

impl EdgePartition {
    /// Everything active.
    pub fn from_active<I: IntoIterator<Item = usize>>(edges: I) -> Self {
        Self {
            active: edges.into_iter().collect(),
            inactive: BTreeSet::new(),
        }
    }

    /// |A| + |B|.
    pub fn len(&self) -> usize {
        self.active.len() + self.inactive.len()
    }

    /// Whether both sets are empty.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.inactive.is_empty()
    }

    /// A ∪ B, ascending.
    pub fn edges(&self) -> Vec<usize> {
        self.active.union(&self.inactive).copied().collect()
    }

    /// Reactivate everything: A := A ∪ B, B := ∅.
    pub fn reactivate(&mut self) {
        let inactive = std::mem::take(&mut self.inactive);
        self.active.extend(inactive);
    }
}

/// One flow path reduced to what the deletion step needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Route {
    /// Source edge the path starts at.
    pub source: usize,
    /// First cut edge the path crosses.
    pub cut: usize,
    /// Flow carried.
    pub mass: f64,
}

/// Mixing step built from a fractional matching between active edges.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchingStep {
    map: SparseMap,
    pairs: usize,
}

impl MatchingStep {
    /// Build from matched `(from, to, amount)` edge triples.
    ///
    /// Each pair swaps `fraction · amount` of capacity-weighted mass in both
    /// directions, so every row keeps its edge's total mass. Pairs touching
    /// inactive edges or matching an edge with itself are ignored. The
    /// resulting map is applied `repetitions` times.
    pub fn new(
        pairs: &[(usize, usize, f64)],
        weights: &[f64],
        active: &BTreeSet<usize>,
        fraction: f64,
        repetitions: usize,
    ) -> Self {
        let mut rows: BTreeMap<usize, BTreeMap<usize, f64>> = BTreeMap::new();
        let mut used = 0;
        for &(a, b, amount) in pairs {
            if a == b || !active.contains(&a) || !active.contains(&b) {
                continue;
            }
            let (wa, wb) = (weights[a], weights[b]);
            if wa <= 0.0 || wb <= 0.0 || amount <= 0.0 {
                continue;
            }
            let moved = fraction * amount.min(wa).min(wb);
            for (x, y, wx, wy) in [(a, b, wa, wb), (b, a, wb, wa)] {
                let row = rows.entry(x).or_insert_with(|| BTreeMap::from([(x, 1.0)]));
                *row.entry(x).or_insert(0.0) -= moved / wx;
                *row.entry(y).or_insert(0.0) += moved / wy;
            }
            used += 1;
        }

        let mut once = SparseMap::identity();
        for (a, row) in rows {
            once.set_row(a, row.into_iter().collect());
        }
        let mut map = once.clone();
        for _ in 1..repetitions.max(1) {
            map = map.then(&once);
        }

        Self { map, pairs: used }
    }

    /// Number of pairs that contributed.
    pub fn pairs(&self) -> usize {
        self.pairs
    }
}

impl Step for MatchingStep {
    fn map(&self) -> &SparseMap {
        &self.map
    }
}

/// Deletion step: moves source mass onto the min cut, or restarts from a
/// balanced candidate set.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletionStep {
    map: SparseMap,
    partition: EdgePartition,
    restart_needed: bool,
    no_progress: bool,
}

impl DeletionStep {
    /// Build the deletion candidate for one round.
    ///
    /// `cut` holds the translated min-cut edges, `routes` the rescaled flow
    /// paths, and `restart_floor` the size under which |A| + |B| triggers a
    /// restart.
    pub fn new(
        subgraph: &Subgraph<'_>,
        current: &EdgePartition,
        division: &Division,
        cut: &[usize],
        routes: &[Route],
        restart_floor: f64,
    ) -> Self {
        let sinks: BTreeSet<usize> = division.sinks.iter().copied().collect();
        let cut_set: BTreeSet<usize> = cut.iter().copied().collect();

        let candidate: BTreeSet<usize> = current
            .active
            .union(&current.inactive)
            .copied()
            .filter(|e| !sinks.contains(e))
            .chain(cut_set.iter().copied())
            .collect();
        if subgraph.is_balanced(candidate.iter().copied()) {
            return Self {
                map: SparseMap::identity(),
                partition: EdgePartition {
                    active: candidate,
                    inactive: BTreeSet::new(),
                },
                restart_needed: true,
                no_progress: false,
            };
        }

        let sources: BTreeSet<usize> = division.sources.iter().copied().collect();
        let moved: BTreeSet<usize> = current
            .active
            .union(&current.inactive)
            .copied()
            .filter(|e| !sources.contains(e))
            .chain(cut_set.iter().copied())
            .collect();
        let moved_balanced = subgraph.is_balanced(moved.iter().copied());
        debug_assert!(
            moved_balanced,
            "neither deletion candidate is a balanced clustering"
        );
        if !moved_balanced {
            warn!(
                cut = cut_set.len(),
                sources = sources.len(),
                "deletion candidate would unbalance the separator; skipping"
            );
            return Self::unchanged(current);
        }

        let mut received: BTreeMap<usize, BTreeMap<usize, f64>> = BTreeMap::new();
        for route in routes {
            let w = subgraph.weight(route.source);
            if route.mass <= 0.0 || w <= 0.0 || !cut_set.contains(&route.cut) {
                continue;
            }
            *received
                .entry(route.cut)
                .or_default()
                .entry(route.source)
                .or_insert(0.0) += route.mass / w;
        }

        let mut map = SparseMap::identity();
        for &e in &sources {
            map.zero_row(e);
        }

        let mut active: BTreeSet<usize> = current
            .active
            .iter()
            .copied()
            .filter(|e| !sources.contains(e) && !cut_set.contains(e))
            .collect();
        let mut inactive: BTreeSet<usize> = current
            .inactive
            .iter()
            .copied()
            .filter(|e| !cut_set.contains(e))
            .collect();

        for &c in &cut_set {
            let wc = subgraph.weight(c);
            let mut row = received.remove(&c).unwrap_or_default();
            let mut mass: f64 = row
                .iter()
                .map(|(&s, &coeff)| coeff * subgraph.weight(s))
                .sum();
            if current.active.contains(&c) && !sources.contains(&c) {
                *row.entry(c).or_insert(0.0) += 1.0;
                mass += wc;
            }

            if mass >= wc && mass > 0.0 {
                let alpha = wc / mass;
                map.set_row(c, row.into_iter().map(|(s, coeff)| (s, alpha * coeff)).collect());
                active.insert(c);
            } else {
                map.zero_row(c);
                inactive.insert(c);
            }
        }

        let restart_needed = ((active.len() + inactive.len()) as f64) < restart_floor;
        let no_progress = active == current.active && inactive == current.inactive;

        Self {
            map,
            partition: EdgePartition { active, inactive },
            restart_needed,
            no_progress,
        }
    }

    fn unchanged(current: &EdgePartition) -> Self {
        Self {
            map: SparseMap::identity(),
            partition: current.clone(),
            restart_needed: false,
            no_progress: true,
        }
    }

    /// The partition this step would produce.
    pub fn partition(&self) -> &EdgePartition {
        &self.partition
    }

    /// Consume the step, returning its partition.
    pub fn into_partition(self) -> EdgePartition {
        self.partition
    }

    /// Whether applying this step must be followed by a restart.
    pub fn restart_needed(&self) -> bool {
        self.restart_needed
    }

    /// Whether A and B come out unchanged.
    pub fn no_progress(&self) -> bool {
        self.no_progress
    }
}

impl Step for DeletionStep {
    fn map(&self) -> &SparseMap {
        &self.map
    }
}
