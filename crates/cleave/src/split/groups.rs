//! Restriction of the groups to the nodes still present in a branch.

use super::view::GraphView;

/// Keeps, for every group, the members active in `view`, in their original order. Groups left
/// without members are dropped. Recomputed for every branch: membership only ever narrows.
pub(crate) fn active_groups(groups: &[Vec<usize>], view: &GraphView<'_>) -> Vec<Vec<usize>> {
    groups
        .iter()
        .map(|group| {
            group
                .iter()
                .copied()
                .filter(|&ix| view.is_active(ix))
                .collect::<Vec<_>>()
        })
        .filter(|group| !group.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::active_groups;
    use crate::graph::{AttrGraph, Attrs};
    use crate::split::SplitOptions;
    use crate::split::input::SplitGraph;
    use crate::split::view::GraphView;

    #[test]
    fn groups_narrow_and_empty_groups_disappear() {
        let mut g = AttrGraph::new();
        for (i, id) in ["a", "b", "c", "d", "e"].into_iter().enumerate() {
            g.set_node(id, Attrs::new().with("x", i as f64));
        }
        g.set_path(&["a", "b", "c", "d", "e"]);
        g.for_each_edge_mut(|_, attrs| {
            attrs.set("weight", 1.0);
        });

        let base = SplitGraph::build(
            &g,
            &[vec!["a", "c"], vec!["e"], vec!["b", "d"]],
            &["x"],
            "weight",
            &SplitOptions::default(),
        )
        .expect("valid input");
        let view = GraphView::full(&base);
        assert_eq!(
            active_groups(base.groups(), &view),
            vec![vec![0, 2], vec![4], vec![1, 3]]
        );

        let (left, right) = view.partition(&[true, true, true, false, false]);
        assert_eq!(
            active_groups(base.groups(), &left),
            vec![vec![0, 2], vec![1]]
        );
        assert_eq!(active_groups(base.groups(), &right), vec![vec![4], vec![3]]);
    }
}
