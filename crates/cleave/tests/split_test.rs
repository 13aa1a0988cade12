use cleave::{
    AttrGraph, Attrs, Cut, CutEvent, Error, FordFulkerson, GraphView, MinCut, PositionScope,
    ResolvedEvent, SplitObserver, SplitOptions, SplitResult, Splitter, label_graph, split_graph,
};
use std::cell::Cell;

fn graph(nodes: &[(&str, f64, f64)], edges: &[(&str, &str, f64)]) -> AttrGraph {
    let mut g = AttrGraph::new();
    for &(id, x, y) in nodes {
        g.set_node(id, Attrs::new().with("x", x).with("y", y));
    }
    for &(v, w, weight) in edges {
        g.set_edge_with_label(v, w, Attrs::new().with("weight", weight));
    }
    g
}

fn loop_graph(ids: [&str; 6]) -> AttrGraph {
    let [n1, n2, n3, n4, n5, n6] = ids;
    graph(
        &[
            (n1, 0.0, 0.0),
            (n2, 1.0, 0.0),
            (n3, 2.0, 0.0),
            (n4, 0.0, 1.0),
            (n5, 1.0, 1.0),
            (n6, 2.0, 1.0),
        ],
        &[
            (n1, n2, 1.0),
            (n2, n3, 0.5),
            (n3, n6, 1.0),
            (n5, n6, 1.0),
            (n4, n5, 0.1),
            (n1, n4, 1.0),
        ],
    )
}

fn assert_labels(result: &SplitResult, expected: &[(&str, usize)]) {
    for &(id, label) in expected {
        assert_eq!(result.label(id), Some(label), "label of node {id}");
    }
    assert_eq!(result.labels.len(), expected.len());
}

#[test]
fn path_is_split_once() {
    let mut g = AttrGraph::new();
    g.set_node("1", Attrs::new().with("z", 0.0).with("y", 0.0).with("x", 0.0));
    g.set_node("2", Attrs::new().with("z", 1.0).with("y", 1.0).with("x", 0.0));
    g.set_node("3", Attrs::new().with("z", 0.0).with("y", 1.0).with("x", 1.0));
    g.set_edge_with_label("1", "2", Attrs::new().with("weight", 0.0));
    g.set_edge_with_label("2", "3", Attrs::new().with("weight", 1.0));

    let result = split_graph(&g, &[["1"], ["3"]], &["z", "y", "x"], "weight").expect("split");
    assert_eq!(result.num_splits, 1);
    assert_labels(&result, &[("1", 0), ("2", 1), ("3", 1)]);
}

#[test]
fn loop_is_split_into_halves() {
    let g = loop_graph(["1", "2", "3", "4", "5", "6"]);
    let result = split_graph(&g, &[["1"], ["6"]], &["x", "y"], "weight").expect("split");

    assert_eq!(result.num_splits, 1);
    assert_labels(
        &result,
        &[("1", 0), ("2", 0), ("4", 0), ("3", 1), ("5", 1), ("6", 1)],
    );
    assert!((result.stats.total_cut_weight - 0.6).abs() < 1e-12);
    assert_eq!(result.partitions(), vec![vec!["1", "2", "4"], vec!["3", "5", "6"]]);
}

#[test]
fn loop_with_three_groups_needs_two_cuts() {
    let g = loop_graph(["1", "2", "3", "4", "5", "6"]);
    let result = split_graph(&g, &[["1"], ["4"], ["6"]], &["x", "y"], "weight").expect("split");

    assert_eq!(result.num_splits, 2);
    assert_eq!(result.num_labels(), 3);
    assert_labels(
        &result,
        &[("1", 0), ("2", 0), ("4", 1), ("3", 2), ("5", 2), ("6", 2)],
    );
}

#[test]
fn multi_node_groups_stay_together() {
    let g = loop_graph(["1", "2", "3", "4", "5", "6"]);
    let groups = [vec!["1"], vec!["4"], vec!["5", "6"]];
    let result = split_graph(&g, &groups, &["x", "y"], "weight").expect("split");

    assert_eq!(result.num_splits, 2);
    assert_labels(
        &result,
        &[("1", 0), ("2", 0), ("4", 1), ("3", 2), ("5", 2), ("6", 2)],
    );
}

#[test]
fn node_ids_need_not_be_consecutive() {
    let g = loop_graph(["10", "20", "30", "40", "50", "60"]);
    let groups = [vec!["10"], vec!["40"], vec!["50", "60"]];
    let result = split_graph(&g, &groups, &["x", "y"], "weight").expect("split");

    assert_eq!(result.num_splits, 2);
    assert_labels(
        &result,
        &[
            ("10", 0),
            ("20", 0),
            ("40", 1),
            ("30", 2),
            ("50", 2),
            ("60", 2),
        ],
    );
}

#[test]
fn chain_with_interleaved_groups_needs_extra_cuts() {
    let ids = ["1", "2", "3", "4", "5", "6", "66", "7", "8", "9"];
    let xs = [1.0, 2.1, 3.0, 4.0, 5.0, 6.0, 6.5, 7.0, 8.0, 9.0];
    let weights = [0.1, 0.2, 0.3, 0.4, 0.5, 0.55, 0.6, 0.7, 0.8];

    let mut g = AttrGraph::new();
    for (id, x) in ids.iter().zip(xs) {
        g.set_node(*id, Attrs::new().with("x", x));
    }
    for (pair, weight) in ids.windows(2).zip(weights) {
        g.set_edge_with_label(pair[0], pair[1], Attrs::new().with("weight", weight));
    }

    let groups = [
        vec!["1", "3", "4"],
        vec!["2", "5"],
        vec!["6", "66"],
        vec!["7", "8", "9"],
    ];
    let result = split_graph(&g, &groups, &["x"], "weight").expect("split");

    assert_eq!(result.num_splits, 5);
    assert!(result.num_splits > groups.len() - 1);
    assert_labels(
        &result,
        &[
            ("1", 0),
            ("2", 1),
            ("3", 2),
            ("4", 2),
            ("5", 3),
            ("6", 4),
            ("66", 4),
            ("7", 5),
            ("8", 5),
            ("9", 5),
        ],
    );
    assert_eq!(result.stats.cuts, 5);
    assert_eq!(result.stats.labels, 6);
    assert_eq!(result.stats.max_depth, 3);
}

#[test]
fn fewer_than_two_groups_need_no_cut() {
    let g = loop_graph(["1", "2", "3", "4", "5", "6"]);

    let result = split_graph(&g, &[["1", "2"]], &["x", "y"], "weight").expect("split");
    assert_eq!(result.num_splits, 0);
    assert!(result.labels.values().all(|&label| label == 0));

    let no_groups: [[&str; 0]; 0] = [];
    let result = split_graph(&g, &no_groups, &["x", "y"], "weight").expect("split");
    assert_eq!(result.num_splits, 0);
    assert_eq!(result.num_labels(), 1);
}

#[test]
fn disconnected_terminals_are_split_for_free() {
    let g = graph(
        &[("a", 0.0, 0.0), ("b", 1.0, 0.0), ("c", 5.0, 0.0), ("d", 6.0, 0.0)],
        &[("a", "b", 1.0), ("c", "d", 1.0)],
    );
    let result = split_graph(&g, &[["a"], ["d"]], &["x", "y"], "weight").expect("split");

    assert_eq!(result.num_splits, 1);
    assert_eq!(result.stats.total_cut_weight, 0.0);
    assert_labels(&result, &[("a", 0), ("b", 0), ("c", 1), ("d", 1)]);
}

#[test]
fn self_loops_are_ignored() {
    let mut g = graph(
        &[("a", 0.0, 0.0), ("b", 1.0, 0.0)],
        &[("a", "b", 0.25), ("a", "a", 10.0)],
    );
    g.set_edge_with_label("b", "b", Attrs::new().with("weight", 3.0));

    let result = split_graph(&g, &[["a"], ["b"]], &["x", "y"], "weight").expect("split");
    assert_eq!(result.num_splits, 1);
    assert_eq!(result.stats.total_cut_weight, 0.25);
}

#[test]
fn invalid_input_is_rejected_before_splitting() {
    let g = loop_graph(["1", "2", "3", "4", "5", "6"]);

    let err = split_graph(&g, &[["1"], ["99"]], &["x", "y"], "weight").unwrap_err();
    assert!(matches!(
        err,
        Error::UnknownGroupNode { group: 1, ref node } if node == "99"
    ));

    let groups: [&[&str]; 2] = [&[], &["6"]];
    let err = split_graph(&g, &groups, &["x", "y"], "weight").unwrap_err();
    assert!(matches!(err, Error::EmptyGroup { group: 0 }));

    let no_attributes: [&str; 0] = [];
    let err = split_graph(&g, &[["1"], ["6"]], &no_attributes, "weight").unwrap_err();
    assert!(matches!(err, Error::NoPositionAttributes));

    let err = split_graph(&g, &[["1"], ["6"]], &["x", "z"], "weight").unwrap_err();
    assert!(matches!(
        err,
        Error::MissingPosition { ref node, ref attribute } if node == "1" && attribute == "z"
    ));

    let err = split_graph(&g, &[["1"], ["6"]], &["x", "y"], "capacity").unwrap_err();
    assert!(matches!(err, Error::MissingWeight { .. }));
}

#[test]
fn weights_must_be_finite_and_non_negative() {
    for bad in [-1.0, f64::NAN, f64::INFINITY] {
        let g = graph(
            &[("a", 0.0, 0.0), ("b", 1.0, 0.0)],
            &[("a", "b", bad)],
        );
        let err = split_graph(&g, &[["a"], ["b"]], &["x", "y"], "weight").unwrap_err();
        assert!(matches!(err, Error::InvalidWeight { .. }), "weight {bad}");
    }
}

#[test]
fn position_scope_controls_which_nodes_need_positions() {
    let mut g = graph(
        &[("a", 0.0, 0.0), ("c", 2.0, 0.0)],
        &[("a", "b", 1.0), ("b", "c", 0.5)],
    );
    assert!(g.node("b").is_some_and(Attrs::is_empty));

    let err = split_graph(&g, &[["a"], ["c"]], &["x", "y"], "weight").unwrap_err();
    assert!(matches!(err, Error::MissingPosition { ref node, .. } if node == "b"));

    let splitter = Splitter::new().with_options(SplitOptions {
        positions: PositionScope::GroupNodes,
    });
    let result = splitter
        .split(&g, &[["a"], ["c"]], &["x", "y"], "weight")
        .expect("split");
    assert_labels(&result, &[("a", 0), ("b", 0), ("c", 1)]);

    g.node_mut("a").expect("a").set("x", f64::NAN);
    let err = splitter
        .split(&g, &[["a"], ["c"]], &["x", "y"], "weight")
        .unwrap_err();
    assert!(matches!(err, Error::NonFinitePosition { .. }));
}

#[test]
fn overlapping_groups_are_reported() {
    let g = loop_graph(["1", "2", "3", "4", "5", "6"]);
    let err = split_graph(&g, &[["1"], ["1"]], &["x", "y"], "weight").unwrap_err();
    assert!(matches!(err, Error::CoincidentTerminals { ref node } if node == "1"));
}

#[test]
fn label_graph_writes_the_split_attribute() {
    let mut g = loop_graph(["1", "2", "3", "4", "5", "6"]);
    let splits = label_graph(&mut g, &[["1"], ["4"], ["6"]], &["x", "y"], "weight", "split")
        .expect("split");
    assert_eq!(splits, 2);

    let written: Vec<(String, f64)> = g
        .nodes()
        .map(|id| {
            let label = g.node(id).and_then(|a| a.get("split")).expect("label");
            (id.to_string(), label)
        })
        .collect();
    assert_eq!(
        written,
        vec![
            ("1".to_string(), 0.0),
            ("2".to_string(), 0.0),
            ("3".to_string(), 2.0),
            ("4".to_string(), 1.0),
            ("5".to_string(), 2.0),
            ("6".to_string(), 2.0),
        ]
    );
}

#[test]
fn label_graph_leaves_the_graph_untouched_on_error() {
    let mut g = loop_graph(["1", "2", "3", "4", "5", "6"]);
    let before = g.clone();
    assert!(label_graph(&mut g, &[["1"], ["7"]], &["x", "y"], "weight", "split").is_err());
    for id in before.nodes() {
        assert_eq!(g.node(id), before.node(id));
    }
}

#[derive(Default)]
struct Recorder {
    cuts: Vec<(usize, String, String, usize, usize)>,
    resolved: Vec<ResolvedEvent>,
}

impl SplitObserver for Recorder {
    fn on_cut(&mut self, event: &CutEvent<'_>) {
        self.cuts.push((
            event.depth,
            event.source.to_string(),
            event.sink.to_string(),
            event.source_size,
            event.sink_size,
        ));
    }

    fn on_resolved(&mut self, event: &ResolvedEvent) {
        self.resolved.push(*event);
    }
}

#[test]
fn observer_sees_cuts_and_resolved_branches_in_order() {
    let g = loop_graph(["1", "2", "3", "4", "5", "6"]);
    let mut recorder = Recorder::default();
    let result = Splitter::new()
        .split_observed(
            &g,
            &[["1"], ["4"], ["6"]],
            &["x", "y"],
            "weight",
            &mut recorder,
        )
        .expect("split");

    assert_eq!(
        recorder.cuts,
        vec![
            (0, "4".to_string(), "6".to_string(), 3, 3),
            (1, "1".to_string(), "4".to_string(), 2, 1),
        ]
    );
    assert_eq!(
        recorder.resolved,
        vec![
            ResolvedEvent { label: 0, depth: 2, size: 2 },
            ResolvedEvent { label: 1, depth: 2, size: 1 },
            ResolvedEvent { label: 2, depth: 1, size: 3 },
        ]
    );
    assert_eq!(result.stats.max_depth, 2);
}

/// Delegates to Ford-Fulkerson and counts the calls.
struct Counting {
    inner: FordFulkerson,
    calls: Cell<usize>,
}

impl MinCut for Counting {
    fn min_cut(&self, view: &GraphView<'_>, source: usize, sink: usize) -> cleave::Result<Cut> {
        self.calls.set(self.calls.get() + 1);
        self.inner.min_cut(view, source, sink)
    }
}

/// Puts every node on the source side.
struct Broken;

impl MinCut for Broken {
    fn min_cut(&self, view: &GraphView<'_>, _source: usize, _sink: usize) -> cleave::Result<Cut> {
        Ok(Cut {
            value: 0.0,
            source_side: vec![true; view.node_count()],
        })
    }
}

#[test]
fn custom_min_cut_is_used_and_checked() {
    let g = loop_graph(["1", "2", "3", "4", "5", "6"]);

    let splitter = Splitter::with_min_cut(Counting {
        inner: FordFulkerson::default(),
        calls: Cell::new(0),
    });
    let result = splitter
        .split(&g, &[["1"], ["4"], ["6"]], &["x", "y"], "weight")
        .expect("split");
    assert_eq!(splitter.min_cut().calls.get(), result.num_splits);

    let err = Splitter::with_min_cut(Broken)
        .split(&g, &[["1"], ["6"]], &["x", "y"], "weight")
        .unwrap_err();
    assert!(matches!(err, Error::InvalidCut { .. }));
}

// xorshift64*, enough for test fixtures.
struct Rng(u64);

impl Rng {
    fn next_u64(&mut self) -> u64 {
        self.0 ^= self.0 >> 12;
        self.0 ^= self.0 << 25;
        self.0 ^= self.0 >> 27;
        self.0.wrapping_mul(0x2545_f491_4f6c_dd1d)
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }
}

fn random_case(seed: u64) -> (AttrGraph, Vec<Vec<String>>) {
    let mut rng = Rng(seed);
    let nodes = 60 + rng.below(60);

    let mut g = AttrGraph::new();
    for i in 0..nodes {
        let attrs = Attrs::new()
            .with("z", rng.next_f64())
            .with("y", rng.next_f64())
            .with("x", rng.next_f64());
        g.set_node(i.to_string(), attrs);
    }
    for _ in 0..nodes * 3 {
        let (v, w) = (rng.below(nodes), rng.below(nodes));
        let weight = if rng.below(10) == 0 { 0.0 } else { rng.next_f64() };
        g.set_edge_with_label(v.to_string(), w.to_string(), Attrs::new().with("weight", weight));
    }

    // Disjoint groups of one to four nodes.
    let mut unused: Vec<usize> = (0..nodes).collect();
    let mut groups = Vec::new();
    for _ in 0..(2 + rng.below(10)) {
        let size = 1 + rng.below(4);
        let group: Vec<String> = (0..size)
            .map(|_| unused.swap_remove(rng.below(unused.len())).to_string())
            .collect();
        groups.push(group);
    }
    (g, groups)
}

#[test]
fn random_graphs_keep_groups_apart() {
    for seed in 1..=25u64 {
        let (g, groups) = random_case(seed);
        let result = split_graph(&g, &groups, &["z", "y", "x"], "weight").expect("split");

        assert_eq!(result.labels.len(), g.node_count(), "seed {seed}");
        assert!(result.num_splits >= groups.len() - 1, "seed {seed}");
        assert_eq!(result.stats.labels, result.num_splits + 1, "seed {seed}");

        let group_labels: Vec<Vec<usize>> = groups
            .iter()
            .map(|group| group.iter().filter_map(|id| result.label(id)).collect())
            .collect();
        for (i, a) in group_labels.iter().enumerate() {
            for b in &group_labels[i + 1..] {
                assert!(a.iter().all(|label| !b.contains(label)), "seed {seed}");
            }
        }

        let again = split_graph(&g, &groups, &["z", "y", "x"], "weight").expect("split");
        assert_eq!(again.num_splits, result.num_splits, "seed {seed}");
        assert_eq!(again.labels, result.labels, "seed {seed}");
    }
}
