//! Splitting the active set into flow sources and sinks along a projection.

use std::collections::BTreeSet;

/// Below this many active edges the divider simply halves the ranking.
const SMALL_ACTIVE_SET: usize = 8;

/// How the divider picks its source set on large active sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DivisionStrategy {
    /// Take the most extreme eighth of the smaller side as-is.
    #[default]
    Practical,
    /// Additionally require the chosen sources to hold at least 1/20 of the
    /// potential, re-splitting by distance thresholds when they do not.
    Theoretical,
}

/// Sources and sinks for one flow round, as local edge indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Division {
    /// Edges attached to the source (A_s).
    pub sources: Vec<usize>,
    /// Edges attached to the sink (A_t).
    pub sinks: Vec<usize>,
}

impl Division {
    /// A round is skipped when either side is empty.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty() || self.sinks.is_empty()
    }
}

/// Splits an active edge set by projected flow value.
#[derive(Debug, Clone, Copy, Default)]
pub struct VertexDivider {
    strategy: DivisionStrategy,
}

impl VertexDivider {
    /// Create a divider with the given strategy.
    pub fn new(strategy: DivisionStrategy) -> Self {
        Self { strategy }
    }

    /// Divide `active` given per-edge projections and weights (indexed by
    /// local edge). Each edge is ranked by `projection / weight`.
    ///
    /// On at least eight edges the result satisfies `|sources| ≤ ⌈|A|/8⌉`
    /// and `|sinks| ≥ ⌊|A|/2⌋`.
    pub fn divide(
        &self,
        active: &BTreeSet<usize>,
        projection: &[f64],
        weights: &[f64],
    ) -> Division {
        let n = active.len();
        let value = |e: usize| {
            if weights[e] > 0.0 {
                projection[e] / weights[e]
            } else {
                0.0
            }
        };

        if n < SMALL_ACTIVE_SET {
            let mut ranked: Vec<usize> = active.iter().copied().collect();
            ranked.sort_by(|&a, &b| value(a).total_cmp(&value(b)));
            let half = n / 2;
            return Division {
                sources: ranked[..half].to_vec(),
                sinks: ranked[n - half..].to_vec(),
            };
        }

        let total_weight: f64 = active.iter().map(|&e| weights[e]).sum();
        let avg = if total_weight > 0.0 {
            active.iter().map(|&e| projection[e]).sum::<f64>() / total_weight
        } else {
            0.0
        };
        let deviation = |e: usize| (value(e) - avg).abs();

        let (below, above): (Vec<usize>, Vec<usize>) =
            active.iter().copied().partition(|&e| value(e) < avg);
        let (mut small, large) = if below.len() <= above.len() {
            (below, above)
        } else {
            (above, below)
        };
        // Most extreme first; ties by index keep the order deterministic.
        small.sort_by(|&a, &b| deviation(b).total_cmp(&deviation(a)).then(a.cmp(&b)));

        let cap = n.div_ceil(8);
        let sources: Vec<usize> = small.iter().take(cap).copied().collect();
        let practical = Division {
            sources,
            sinks: large.clone(),
        };
        if self.strategy == DivisionStrategy::Practical {
            return practical;
        }

        let mass = |e: usize| weights[e] * (value(e) - avg).powi(2);
        let total_mass: f64 = active.iter().map(|&e| mass(e)).sum();
        let source_mass: f64 = practical.sources.iter().map(|&e| mass(e)).sum();
        if source_mass >= total_mass / 20.0 {
            return practical;
        }

        let l: f64 = small.iter().map(|&e| weights[e] * deviation(e)).sum();
        let far = 6.0 * l / n as f64;
        let near = 4.0 * l / n as f64;
        let sources: Vec<usize> = small
            .iter()
            .copied()
            .filter(|&e| deviation(e) >= far)
            .take(cap)
            .collect();
        if sources.is_empty() {
            return practical;
        }
        let mut sinks = large;
        sinks.extend(
            small
                .iter()
                .copied()
                .filter(|&e| deviation(e) <= near && !sources.contains(&e)),
        );
        sinks.sort_unstable();

        Division { sources, sinks }
    }
}
