use cleave_graphlib::{EdgeKey, Graph};

#[test]
fn undirected_edges_are_symmetric() {
    let mut g: Graph<(), i32> = Graph::new();

    g.set_edge_with_label("b", "a", 7);

    assert!(g.has_edge("a", "b"));
    assert!(g.has_edge("b", "a"));
    assert_eq!(g.edge("a", "b"), Some(&7));
    assert_eq!(g.edge("b", "a"), Some(&7));
    assert_eq!(g.edge_count(), 1);
}

#[test]
fn setting_an_existing_edge_overwrites_its_label() {
    let mut g: Graph<(), i32> = Graph::new();
    g.set_edge_with_label("a", "b", 1);
    g.set_edge_with_label("b", "a", 2);

    assert_eq!(g.edge_count(), 1);
    assert_eq!(g.edge("a", "b"), Some(&2));
}

#[test]
fn set_edge_creates_missing_endpoints_in_order() {
    let mut g: Graph<i32, ()> = Graph::new();
    g.set_node("z", 5);
    g.set_edge("x", "y");

    assert_eq!(g.node_ids(), vec!["z", "x", "y"]);
    assert_eq!(g.node("z"), Some(&5));
    assert_eq!(g.node("x"), Some(&0));
    assert_eq!(g.node_ix("z"), Some(0));
    assert_eq!(g.node_ix("y"), Some(2));
    assert_eq!(g.node_id(1), Some("x"));
    assert_eq!(g.node_ix("missing"), None);
}

#[test]
fn indexed_edges_use_insertion_indices() {
    let mut g: Graph<(), f64> = Graph::new();
    g.set_node("b", ());
    g.set_node("a", ());
    g.set_edge_with_label("b", "a", 0.5);

    let edges: Vec<(usize, usize, f64)> = g.indexed_edges().map(|(v, w, e)| (v, w, *e)).collect();
    // The key is canonicalized to ("a", "b"), so `v_ix` is the index of "a".
    assert_eq!(edges, vec![(1, 0, 0.5)]);
}

#[test]
fn neighbors_follow_edge_insertion_order() {
    let mut g: Graph<(), ()> = Graph::new();
    g.set_path(&["a", "b", "c"]);
    g.set_edge("b", "d");

    assert_eq!(g.neighbors("b"), vec!["a", "c", "d"]);
    assert_eq!(g.neighbors("a"), vec!["b"]);
    assert_eq!(g.neighbors("missing"), Vec::<&str>::new());
}

#[test]
fn neighbors_see_edges_added_after_a_query() {
    let mut g: Graph<(), ()> = Graph::new();
    g.set_edge("a", "b");
    assert_eq!(g.neighbors("a"), vec!["b"]);

    g.set_edge("a", "c");
    assert_eq!(g.neighbors("a"), vec!["b", "c"]);
}

#[test]
fn node_edges_returns_incident_edges() {
    let mut g: Graph<(), ()> = Graph::new();
    g.set_edge("a", "b");
    g.set_edge("c", "b");

    let edges = g.node_edges("b");
    assert_eq!(edges, vec![EdgeKey::new("a", "b"), EdgeKey::new("b", "c")]);
}

#[test]
fn incident_edge_indices_match_indexed_edges() {
    let mut g: Graph<(), u32> = Graph::new();
    g.set_edge_with_label("a", "b", 10);
    g.set_edge_with_label("c", "b", 11);
    g.set_edge_with_label("b", "b", 12);

    let b = g.node_ix("b").expect("b exists");
    assert_eq!(g.incident_edge_indices(b), vec![0, 1, 2]);

    let labels: Vec<u32> = g.indexed_edges().map(|(_, _, &l)| l).collect();
    let c = g.node_ix("c").expect("c exists");
    let at_c: Vec<u32> = g.incident_edge_indices(c).iter().map(|&e| labels[e]).collect();
    assert_eq!(at_c, vec![11]);
    assert!(g.incident_edge_indices(42).is_empty());

    g.remove_edge("a", "b");
    assert_eq!(g.incident_edge_indices(b), vec![0, 1]);
}

#[test]
fn self_loops_are_listed_once() {
    let mut g: Graph<(), ()> = Graph::new();
    g.set_edge("a", "a");

    assert_eq!(g.neighbors("a"), vec!["a"]);
    assert_eq!(g.node_edges("a").len(), 1);
}

#[test]
fn remove_edge_keeps_the_remaining_edges_addressable() {
    let mut g: Graph<(), i32> = Graph::new();
    g.set_edge_with_label("a", "b", 1);
    g.set_edge_with_label("b", "c", 2);
    g.set_edge_with_label("c", "d", 3);

    assert!(g.remove_edge("c", "b"));
    assert!(!g.remove_edge("c", "b"));

    assert_eq!(g.edge_count(), 2);
    assert_eq!(g.edge("a", "b"), Some(&1));
    assert_eq!(g.edge("d", "c"), Some(&3));
    assert_eq!(g.neighbors("c"), vec!["d"]);
    assert_eq!(g.node_count(), 4);
}

#[test]
fn edge_mut_updates_labels_in_place() {
    let mut g: Graph<(), i32> = Graph::new();
    g.set_edge_with_label("a", "b", 1);
    if let Some(label) = g.edge_mut("b", "a") {
        *label += 10;
    }
    assert_eq!(g.edge("a", "b"), Some(&11));
}
