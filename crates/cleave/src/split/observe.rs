use serde::Serialize;
use std::time::Duration;

/// One executed cut.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutEvent<'a> {
    /// Depth of the branch that was cut. The whole graph is at depth 0.
    pub depth: usize,
    pub source: &'a str,
    pub sink: &'a str,
    /// Distance between the two terminals.
    pub distance: f64,
    /// Total weight of the cut edges.
    pub value: f64,
    pub source_size: usize,
    pub sink_size: usize,
}

/// A branch that needed no further separation and received its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedEvent {
    pub label: usize,
    pub depth: usize,
    pub size: usize,
}

/// Instrumentation hooks, called in execution order. Both methods default to doing nothing.
pub trait SplitObserver {
    fn on_cut(&mut self, _event: &CutEvent<'_>) {}

    fn on_resolved(&mut self, _event: &ResolvedEvent) {}
}

impl SplitObserver for () {}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SplitStats {
    pub cuts: usize,
    /// Labels handed out. Equal to `cuts + 1`.
    pub labels: usize,
    pub max_depth: usize,
    pub total_cut_weight: f64,
    /// Time spent choosing groups and terminals.
    pub selection_time: Duration,
    /// Time spent inside the min-cut capability.
    pub cut_time: Duration,
}
