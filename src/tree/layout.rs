use super::{MapTree, NodeId};

/// Positions for the currently visible tree inside a fixed drawing area.
///
/// The depth axis runs horizontally with equal spacing between generations:
/// after the base layout pass, every node's x is snapped to
/// `depth * floor(width / (max_depth + 1))`. The sibling axis runs vertically,
/// with visible leaves on evenly spaced rows and branch nodes centered over
/// their children.
#[derive(Debug, Clone)]
pub struct MapLayout {
    /// Indexed by `NodeId`; meaningful only for ids listed in `visible`.
    pub positions: Vec<(f32, f32)>,
    pub visible: Vec<NodeId>,
    pub edges: Vec<(NodeId, NodeId)>,
    pub max_depth: usize,
    pub gutter: f32,
    pub width: f32,
    pub height: f32,
    pub leaf_count: usize,
}

impl MapLayout {
    pub fn position(&self, id: NodeId) -> (f32, f32) {
        self.positions[id]
    }
}

struct RowState {
    next_row: usize,
}

pub fn build(tree: &MapTree, width: f32, height: f32) -> MapLayout {
    let mut positions = vec![(0.0f32, 0.0f32); tree.nodes.len()];
    let mut visible = Vec::new();
    let mut edges = Vec::new();
    let mut state = RowState { next_row: 0 };

    assign_rows(
        tree,
        tree.root,
        &mut positions,
        &mut visible,
        &mut edges,
        &mut state,
    );

    let leaf_count = state.next_row.max(1);
    let max_depth = visible
        .iter()
        .map(|&id| tree.nodes[id].depth)
        .max()
        .unwrap_or(0);

    // Fixed generation spacing; `max_depth + 1` is always >= 1.
    let gutter = (width / (max_depth as f32 + 1.0)).floor();
    let row_step = if leaf_count > 1 {
        height / (leaf_count - 1) as f32
    } else {
        0.0
    };

    for &id in &visible {
        let (row, _) = positions[id];
        let y = if leaf_count > 1 {
            row * row_step
        } else {
            height / 2.0
        };
        positions[id] = (tree.nodes[id].depth as f32 * gutter, y);
    }

    MapLayout {
        positions,
        visible,
        edges,
        max_depth,
        gutter,
        width,
        height,
        leaf_count,
    }
}

/// First pass: store each visible node's sibling-axis row in `positions[id].0`
/// (leaves take successive rows, branches the midpoint of their span).
fn assign_rows(
    tree: &MapTree,
    id: NodeId,
    positions: &mut [(f32, f32)],
    visible: &mut Vec<NodeId>,
    edges: &mut Vec<(NodeId, NodeId)>,
    state: &mut RowState,
) -> f32 {
    visible.push(id);
    let node = &tree.nodes[id];

    let row = if tree.visible_child_count(id) == 0 {
        let row = state.next_row as f32;
        state.next_row += 1;
        row
    } else {
        let mut first = f32::MAX;
        let mut last = f32::MIN;
        for &child in &node.children {
            edges.push((id, child));
            let child_row = assign_rows(tree, child, positions, visible, edges, state);
            first = first.min(child_row);
            last = last.max(child_row);
        }
        (first + last) / 2.0
    };

    positions[id] = (row, 0.0);
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::MapTree;

    const W: f32 = 1000.0;
    const H: f32 = 600.0;

    fn three_level_tree() -> MapTree {
        // root -> (a -> (a1, a2), b)
        let mut tree = MapTree::new_document();
        let a = tree.add_child(tree.root);
        tree.add_child(tree.root);
        tree.add_child(a);
        tree.add_child(a);
        tree
    }

    #[test]
    fn depth_axis_uses_fixed_gutter() {
        let tree = three_level_tree();
        let layout = build(&tree, W, H);

        assert_eq!(layout.max_depth, 2);
        let gutter = (W / 3.0).floor();
        assert_eq!(layout.gutter, gutter);
        for &id in &layout.visible {
            let depth = tree.nodes[id].depth as f32;
            assert_eq!(layout.position(id).0, depth * gutter);
        }
    }

    #[test]
    fn gutter_tracks_visible_depth_across_collapse() {
        let mut tree = three_level_tree();
        let layout = build(&tree, W, H);
        assert_eq!(layout.gutter, (W / 3.0).floor());

        // Collapsing the deep branch shortens the visible tree to depth 1.
        tree.toggle(1);
        let layout = build(&tree, W, H);
        assert_eq!(layout.max_depth, 1);
        assert_eq!(layout.gutter, (W / 2.0).floor());
        assert_eq!(layout.position(1).0, layout.gutter);

        tree.toggle(1);
        let layout = build(&tree, W, H);
        assert_eq!(layout.gutter, (W / 3.0).floor());
    }

    #[test]
    fn root_only_tree_spans_full_width_gutter() {
        let tree = MapTree::new_document();
        let layout = build(&tree, W, H);

        assert_eq!(layout.max_depth, 0);
        assert_eq!(layout.gutter, W);
        assert_eq!(layout.position(tree.root), (0.0, H / 2.0));
        assert_eq!(layout.leaf_count, 1);
    }

    #[test]
    fn leaves_take_even_rows_and_parents_center() {
        let tree = three_level_tree();
        let layout = build(&tree, W, H);

        // Three visible leaves: a1, a2, b.
        assert_eq!(layout.leaf_count, 3);
        let step = H / 2.0;
        assert_eq!(layout.position(3).1, 0.0);
        assert_eq!(layout.position(4).1, step);
        assert_eq!(layout.position(2).1, 2.0 * step);
        // a centers over a1/a2, root over a and b's span.
        assert_eq!(layout.position(1).1, step / 2.0);
        assert_eq!(layout.position(0).1, (step / 2.0 + 2.0 * step) / 2.0);
    }

    #[test]
    fn collapsed_node_counts_as_leaf_row() {
        let mut tree = three_level_tree();
        tree.toggle(1);
        let layout = build(&tree, W, H);

        assert_eq!(layout.visible, vec![0, 1, 2]);
        assert_eq!(layout.leaf_count, 2);
        assert_eq!(layout.position(1).1, 0.0);
        assert_eq!(layout.position(2).1, H);
    }

    #[test]
    fn edges_connect_visible_parents_to_children() {
        let mut tree = three_level_tree();
        let layout = build(&tree, W, H);
        assert_eq!(layout.edges, vec![(0, 1), (1, 3), (1, 4), (0, 2)]);

        tree.toggle(1);
        let layout = build(&tree, W, H);
        assert_eq!(layout.edges, vec![(0, 1), (0, 2)]);
    }
}
