//! Tree validation and health checking utilities.
//!
//! Verifies that a decomposition tree is well formed:
//! - a single root, every node reachable from it, no cycles
//! - parent and child links agree
//! - exactly one leaf per graph vertex, and leaves have no children
//! - edge weights are non-negative (infinity allowed)
//!
//! # Example
//!
//! ```rust,ignore
//! use cleave::hierarchy::HealthCheck;
//!
//! let report = tree.health_check();
//! if !report.is_healthy() {
//!     for issue in report.validation.issues {
//!         eprintln!("{}", issue);
//!     }
//! }
//! ```

use std::collections::HashMap;

use super::tree::{DecompositionTree, NodeKind};

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational, not a problem.
    Info,
    /// Something unusual but not necessarily wrong.
    Warning,
    /// A problem that should be fixed.
    Error,
    /// A critical issue that may cause failures.
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// A single validation issue.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity of the issue.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// Node involved, if any.
    pub node_id: Option<usize>,
    /// Additional context.
    pub context: Option<String>,
}

impl ValidationIssue {
    /// Create a new validation issue.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            node_id: None,
            context: None,
        }
    }

    /// Attach a node id.
    pub fn with_node(mut self, id: usize) -> Self {
        self.node_id = Some(id);
        self
    }

    /// Attach context.
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context = Some(ctx.into());
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)?;
        if let Some(id) = self.node_id {
            write!(f, " (node {})", id)?;
        }
        if let Some(ctx) = &self.context {
            write!(f, " - {}", ctx)?;
        }
        Ok(())
    }
}

/// Issues found by a validation pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// All issues found.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Add an issue.
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Add a warning-level issue.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.add(ValidationIssue::new(Severity::Warning, message));
    }

    /// Add an error-level issue.
    pub fn error(&mut self, message: impl Into<String>) {
        self.add(ValidationIssue::new(Severity::Error, message));
    }

    /// Add a critical-level issue.
    pub fn critical(&mut self, message: impl Into<String>) {
        self.add(ValidationIssue::new(Severity::Critical, message));
    }

    /// No errors or critical issues.
    pub fn is_healthy(&self) -> bool {
        !self.issues.iter().any(|i| i.severity >= Severity::Error)
    }

    /// No issues at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues of a given severity or higher.
    pub fn issues_at_level(&self, min_severity: Severity) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity >= min_severity)
            .collect()
    }

    /// Count issues by severity.
    pub fn counts(&self) -> HashMap<Severity, usize> {
        let mut counts = HashMap::new();
        for issue in &self.issues {
            *counts.entry(issue.severity).or_default() += 1;
        }
        counts
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_clean() {
            return write!(f, "Validation passed: no issues found");
        }

        let counts = self.counts();
        write!(f, "Validation report: ")?;

        let parts: Vec<String> = [
            (Severity::Critical, "critical"),
            (Severity::Error, "errors"),
            (Severity::Warning, "warnings"),
            (Severity::Info, "info"),
        ]
        .iter()
        .filter_map(|(sev, name)| counts.get(sev).map(|c| format!("{} {}", c, name)))
        .collect();

        writeln!(f, "{}", parts.join(", "))?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// Validation issues plus shape statistics.
#[derive(Debug, Clone)]
pub struct HealthReport {
    /// Validation issues.
    pub validation: ValidationReport,
    /// Total number of nodes.
    pub node_count: usize,
    /// Number of leaves.
    pub leaf_count: usize,
    /// Largest node depth.
    pub height: usize,
    /// Average number of children of internal nodes.
    pub avg_branching_factor: f64,
}

impl HealthReport {
    /// No errors or critical issues.
    pub fn is_healthy(&self) -> bool {
        self.validation.is_healthy()
    }
}

impl std::fmt::Display for HealthReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Tree Health Report")?;
        writeln!(f, "==================")?;
        writeln!(f, "Nodes: {} ({} leaves)", self.node_count, self.leaf_count)?;
        writeln!(f, "Height: {}", self.height)?;
        writeln!(f, "Avg branching factor: {:.2}", self.avg_branching_factor)?;
        writeln!(f)?;
        write!(f, "{}", self.validation)
    }
}

/// Types that can be health-checked.
pub trait HealthCheck {
    /// Perform a health check.
    fn health_check(&self) -> HealthReport;

    /// Quick check.
    fn is_healthy(&self) -> bool {
        self.health_check().is_healthy()
    }
}

impl DecompositionTree {
    /// Check structure, leaf coverage and weights.
    pub fn validate(&self) -> ValidationReport {
        let nodes = self.nodes();
        let parents: Vec<Option<usize>> = nodes.iter().map(|n| n.parent).collect();
        let children: Vec<Vec<usize>> = nodes.iter().map(|n| n.children.clone()).collect();
        let mut report = validate_tree_structure(&parents, &children);

        let mut leaves_per_vertex = vec![0usize; self.n_vertices()];
        for node in nodes {
            if node.weight.is_nan() || node.weight < 0.0 {
                report.add(
                    ValidationIssue::new(Severity::Error, "edge weight is negative or NaN")
                        .with_node(node.id)
                        .with_context(format!("weight {}", node.weight)),
                );
            }
            match node.kind {
                NodeKind::Leaf(v) => {
                    if !node.children.is_empty() {
                        report.add(
                            ValidationIssue::new(Severity::Error, "leaf node has children")
                                .with_node(node.id),
                        );
                    }
                    match leaves_per_vertex.get_mut(v) {
                        Some(count) => *count += 1,
                        None => report.add(
                            ValidationIssue::new(Severity::Error, "leaf names an unknown vertex")
                                .with_node(node.id)
                                .with_context(format!("vertex {v}")),
                        ),
                    }
                }
                NodeKind::Internal => {
                    if node.children.is_empty() && node.id != self.root() {
                        report.add(
                            ValidationIssue::new(Severity::Warning, "internal node has no children")
                                .with_node(node.id),
                        );
                    }
                }
            }
        }

        let missing: Vec<usize> = (0..leaves_per_vertex.len())
            .filter(|&v| leaves_per_vertex[v] == 0)
            .collect();
        if !missing.is_empty() {
            report.add(
                ValidationIssue::new(
                    Severity::Error,
                    format!("{} vertices have no leaf", missing.len()),
                )
                .with_context(format!("first few: {:?}", &missing[..missing.len().min(5)])),
            );
        }
        for (v, &count) in leaves_per_vertex.iter().enumerate() {
            if count > 1 {
                report.add(
                    ValidationIssue::new(Severity::Error, "vertex has several leaves")
                        .with_context(format!("vertex {v}: {count} leaves")),
                );
            }
        }

        report
    }
}

impl HealthCheck for DecompositionTree {
    fn health_check(&self) -> HealthReport {
        let internal = self
            .nodes()
            .iter()
            .filter(|n| n.kind == NodeKind::Internal)
            .count();
        let total_children: usize = self.nodes().iter().map(|n| n.children.len()).sum();
        let avg_branching_factor = if internal == 0 {
            0.0
        } else {
            total_children as f64 / internal as f64
        };

        HealthReport {
            validation: self.validate(),
            node_count: self.len(),
            leaf_count: self.num_leaves(),
            height: self.height(),
            avg_branching_factor,
        }
    }
}

/// Validate that parent and child links form a single rooted tree.
///
/// `parents[i]` is the parent of node `i` (`None` for a root) and
/// `children[i]` its child list.
pub fn validate_tree_structure(
    parents: &[Option<usize>],
    children: &[Vec<usize>],
) -> ValidationReport {
    let mut report = ValidationReport::new();
    let node_count = parents.len();

    let roots: Vec<usize> = (0..node_count).filter(|&i| parents[i].is_none()).collect();
    if roots.is_empty() && node_count > 0 {
        report.critical("No root node found - tree has cycles");
    } else if roots.len() > 1 {
        report.error(format!("Multiple roots found: {:?}", roots));
    }

    for (child, parent) in parents.iter().enumerate() {
        let Some(parent) = *parent else { continue };
        match children.get(parent) {
            Some(list) if list.contains(&child) => {}
            Some(_) => report.add(
                ValidationIssue::new(
                    Severity::Error,
                    "Parent-child inconsistency: child claims parent but parent doesn't list child",
                )
                .with_node(child)
                .with_context(format!("parent: {}", parent)),
            ),
            None => report.add(
                ValidationIssue::new(Severity::Error, "Parent does not exist")
                    .with_node(child)
                    .with_context(format!("parent: {}", parent)),
            ),
        }
    }

    // Iterative DFS with coloring: 1 = on stack, 2 = done.
    let mut color = vec![0u8; node_count];
    let mut cycle = false;
    for &root in &roots {
        let mut stack = vec![(root, 0usize)];
        color[root] = 1;
        while let Some(top) = stack.last_mut() {
            let (node, next) = *top;
            match children.get(node).and_then(|c| c.get(next)) {
                Some(&child) => {
                    top.1 += 1;
                    match color.get(child) {
                        Some(0) => {
                            color[child] = 1;
                            stack.push((child, 0));
                        }
                        Some(1) => cycle = true,
                        _ => {}
                    }
                }
                None => {
                    color[node] = 2;
                    let _ = stack.pop();
                }
            }
        }
    }
    if cycle {
        report.critical("Cycle detected in tree structure");
    }

    let orphans: Vec<usize> = (0..node_count).filter(|&i| color[i] == 0).collect();
    if !orphans.is_empty() {
        report.add(
            ValidationIssue::new(
                Severity::Error,
                format!("{} orphaned nodes not reachable from root", orphans.len()),
            )
            .with_context(format!("first few: {:?}", &orphans[..orphans.len().min(5)])),
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Critical);
    }

    #[test]
    fn test_validation_report_healthy() {
        let mut report = ValidationReport::new();
        report.warn("A warning");
        assert!(report.is_healthy());

        report.error("An error");
        assert!(!report.is_healthy());
        assert_eq!(report.issues_at_level(Severity::Error).len(), 1);
    }

    #[test]
    fn test_validation_issue_display() {
        let issue = ValidationIssue::new(Severity::Error, "Something wrong")
            .with_node(42)
            .with_context("additional info");

        let s = format!("{}", issue);
        assert!(s.contains("ERROR"));
        assert!(s.contains("Something wrong"));
        assert!(s.contains("42"));
        assert!(s.contains("additional info"));
    }

    #[test]
    fn test_validate_valid_structure() {
        // 0 -> [1, 2]
        let parents = [None, Some(0), Some(0)];
        let children = [vec![1, 2], vec![], vec![]];
        assert!(validate_tree_structure(&parents, &children).is_clean());
    }

    #[test]
    fn test_validate_orphaned_cycle() {
        // Root 0 alone; 1 <-> 2 form a cycle nobody reaches.
        let parents = [None, Some(2), Some(1)];
        let children = [vec![], vec![2], vec![1]];
        let report = validate_tree_structure(&parents, &children);
        assert!(!report.is_healthy());
        assert!(report.issues.iter().any(|i| i.message.contains("orphaned")));
    }

    #[test]
    fn test_validate_multiple_roots() {
        let parents = [None, Some(0), None];
        let children = [vec![1], vec![], vec![]];
        let report = validate_tree_structure(&parents, &children);
        assert!(!report.is_healthy());
        assert!(report
            .issues
            .iter()
            .any(|i| i.message.contains("Multiple roots")));
    }

    #[test]
    fn test_decomposition_tree_health() {
        let mut tree = DecompositionTree::new(3);
        let a = tree.add_internal(0, f64::INFINITY);
        let _ = tree.add_leaf(a, 0, 1.0);
        let _ = tree.add_leaf(a, 1, 1.0);

        // Vertex 2 is still missing.
        let report = tree.validate();
        assert!(!report.is_healthy());
        assert!(report.issues.iter().any(|i| i.message.contains("no leaf")));

        let _ = tree.add_leaf(0, 2, 2.0);
        let health = tree.health_check();
        assert!(health.is_healthy(), "{}", health);
        assert_eq!(health.leaf_count, 3);
        assert_eq!(health.height, 2);
        // Root and `a` hold four children between them.
        assert!((health.avg_branching_factor - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_negative_weight_is_an_error() {
        let mut tree = DecompositionTree::new(1);
        let _ = tree.add_leaf(0, 0, -1.0);
        assert!(!tree.validate().is_healthy());
    }
}
