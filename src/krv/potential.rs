//! Random-projection estimate of how far the flow vectors are from mixed.
//!
//! The potential of an active set `A` is
//!
//! ```text
//! Φ(A) = Σ_{e∈A} w_e · ‖f_e / w_e − μ‖²,   μ = Σ_A f_e / Σ_A w_e
//! ```
//!
//! Flow vectors live in `R^m` and are never stored. Instead the tracker keeps
//! `K` Gaussian directions `r_k` and, for each, the projections
//! `u_e = ⟨f_e, r_k⟩`, updated by every committed step. Each direction gives
//! an estimate `|A| · Σ_A w_e (u_e / w_e − ū)²`; the tracker reports their
//! mean.

use super::step::SparseMap;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::Rng;
use rand_distr::StandardNormal;
use std::collections::BTreeSet;

/// Tracks `K` projections of the implicit flow vectors.
#[derive(Debug, Clone)]
pub struct PotentialTracker {
    weights: Array1<f64>,
    /// `K × m`: projections before any step, `w_e · r_k[e]`.
    base: Array2<f64>,
    /// `K × m`: projections after every committed step.
    bank: Array2<f64>,
    /// Steps committed since the last restart, oldest first.
    history: Vec<SparseMap>,
    active: BTreeSet<usize>,
}

impl PotentialTracker {
    /// Sample `projections` unit directions over `weights.len()` edges.
    pub fn new<R: Rng + ?Sized>(
        weights: &[f64],
        projections: usize,
        active: BTreeSet<usize>,
        rng: &mut R,
    ) -> Self {
        let weights = Array1::from(weights.to_vec());
        let mut base = Array2::zeros((projections, weights.len()));
        for mut row in base.axis_iter_mut(Axis(0)) {
            row.assign(&Self::direction(&weights, rng));
        }
        Self {
            weights,
            bank: base.clone(),
            base,
            history: Vec::new(),
            active,
        }
    }

    /// `w ∘ r` for a fresh unit Gaussian direction `r`.
    fn direction<R: Rng + ?Sized>(weights: &Array1<f64>, rng: &mut R) -> Array1<f64> {
        let mut r: Array1<f64> = (0..weights.len())
            .map(|_| rng.sample::<f64, _>(StandardNormal))
            .collect();
        let norm = r.dot(&r).sqrt();
        if norm > 0.0 {
            r /= norm;
        }
        r * weights
    }

    /// Number of tracked directions.
    pub fn projections(&self) -> usize {
        self.bank.nrows()
    }

    /// Steps committed since the last restart.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// The active set the potential is measured over.
    pub fn active(&self) -> &BTreeSet<usize> {
        &self.active
    }

    /// Projections onto a new direction, pushed through the step history.
    pub fn fresh_projection<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        let mut projection = Self::direction(&self.weights, rng);
        for step in &self.history {
            step.apply_to(projection.view_mut());
        }
        projection.to_vec()
    }

    /// Current potential over the active set.
    pub fn potential(&self) -> f64 {
        let total: f64 = self
            .bank
            .axis_iter(Axis(0))
            .map(|row| self.estimate(row, &self.active))
            .sum();
        Self::mean(total, self.projections())
    }

    /// Potential over `active` if `step` were committed now.
    pub fn potential_after(&self, active: &BTreeSet<usize>, step: &SparseMap) -> f64 {
        let total: f64 = self
            .bank
            .axis_iter(Axis(0))
            .map(|row| {
                let mut row = row.to_owned();
                step.apply_to(row.view_mut());
                self.estimate(row.view(), active)
            })
            .sum();
        Self::mean(total, self.projections())
    }

    /// Apply `step` to every tracked projection and adopt `active`.
    pub fn commit(&mut self, step: SparseMap, active: BTreeSet<usize>) {
        for row in self.bank.axis_iter_mut(Axis(0)) {
            step.apply_to(row);
        }
        self.history.push(step);
        self.active = active;
    }

    /// Forget every step and measure over `active` from the raw projections.
    pub fn restart(&mut self, active: BTreeSet<usize>) {
        self.bank.assign(&self.base);
        self.history.clear();
        self.active = active;
    }

    fn estimate(&self, row: ArrayView1<'_, f64>, active: &BTreeSet<usize>) -> f64 {
        let (sum_u, sum_w) = active
            .iter()
            .fold((0.0, 0.0), |(u, w), &e| (u + row[e], w + self.weights[e]));
        if active.is_empty() || sum_w <= 0.0 {
            return 0.0;
        }
        let avg = sum_u / sum_w;
        let spread: f64 = active
            .iter()
            .filter(|&&e| self.weights[e] > 0.0)
            .map(|&e| {
                let w = self.weights[e];
                w * (row[e] / w - avg).powi(2)
            })
            .sum();
        active.len() as f64 * spread
    }

    fn mean(total: f64, count: usize) -> f64 {
        if count == 0 {
            0.0
        } else {
            total / count as f64
        }
    }
}
