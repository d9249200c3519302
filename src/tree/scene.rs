use eframe::egui::{Align2, Color32, Pos2};

use super::render::RenderEngine;

// Lightsteelblue glyphs for collapsed subtrees, white otherwise; dark stroke
// for visibly childless nodes.
pub const FILL_COLLAPSED: Color32 = Color32::from_rgb(176, 196, 222);
pub const FILL_EXPANDED: Color32 = Color32::WHITE;
pub const STROKE_CHILDLESS: Color32 = Color32::from_rgb(3, 52, 116);
pub const STROKE_BRANCH: Color32 = Color32::from_rgb(176, 196, 222);
pub const LINK_COLOR: Color32 = Color32::from_rgb(204, 204, 204);
pub const TEXT_COLOR: Color32 = Color32::from_rgb(40, 40, 40);

pub const LABEL_SIZE: f32 = 14.0;
pub const ESTIMATION_SIZE: f32 = 12.0;
const LABEL_GAP: f32 = 20.0;

#[derive(Clone, Copy, Debug)]
pub struct StrokeStyle {
    pub width: f32,
    pub color: Color32,
}

/// Drawing commands for one frame, in paint order: links under glyphs under
/// text.
#[derive(Clone, Debug)]
pub enum ScenePrimitive {
    /// Cubic horizontal diagonal from a parent to a child.
    LinkPath {
        points: [Pos2; 4],
        style: StrokeStyle,
    },
    NodeGlyph {
        center: Pos2,
        radius: f32,
        fill: Color32,
        stroke: StrokeStyle,
    },
    Text {
        text: String,
        anchor: Pos2,
        align: Align2,
        size: f32,
        color: Color32,
    },
}

/// Samples every live sprite at `now` and emits the frame's primitives.
pub fn build_map_scene(engine: &RenderEngine, now: f64) -> Vec<ScenePrimitive> {
    let mut primitives = Vec::new();

    for link in engine.link_sprites() {
        let ((sx, sy), (tx, ty)) = link.endpoints(now);
        let mid = (sx + tx) / 2.0;
        primitives.push(ScenePrimitive::LinkPath {
            points: [
                Pos2::new(sx, sy),
                Pos2::new(mid, sy),
                Pos2::new(mid, ty),
                Pos2::new(tx, ty),
            ],
            style: StrokeStyle {
                width: 1.5,
                color: LINK_COLOR,
            },
        });
    }

    for sprite in engine.node_sprites() {
        let (x, y) = sprite.pos(now);
        let center = Pos2::new(x, y);
        let radius = sprite.radius.value(now);
        let alpha = sprite.label_alpha.value(now);

        let fill = if sprite.has_hidden_children {
            FILL_COLLAPSED
        } else {
            FILL_EXPANDED
        };
        let stroke_color = if sprite.childless {
            STROKE_CHILDLESS
        } else {
            STROKE_BRANCH
        };

        primitives.push(ScenePrimitive::NodeGlyph {
            center,
            radius,
            fill,
            stroke: StrokeStyle {
                width: 1.5,
                color: stroke_color,
            },
        });

        primitives.push(ScenePrimitive::Text {
            text: sprite.estimation.clone(),
            anchor: center,
            align: Align2::CENTER_CENTER,
            size: ESTIMATION_SIZE,
            color: TEXT_COLOR.gamma_multiply(alpha),
        });

        primitives.push(ScenePrimitive::Text {
            text: sprite.label.clone(),
            anchor: Pos2::new(x + radius + LABEL_GAP, y),
            align: Align2::LEFT_CENTER,
            size: LABEL_SIZE,
            color: TEXT_COLOR.gamma_multiply(alpha),
        });
    }

    primitives
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::layout;
    use crate::tree::render::RenderEngine;
    use crate::tree::MapTree;

    fn rendered_engine() -> (MapTree, RenderEngine) {
        let mut tree = MapTree::new_document();
        let a = tree.add_child(tree.root);
        tree.add_child(tree.root);
        tree.add_child(a);
        tree.toggle(a);
        let map = layout::build(&tree, 900.0, 600.0);
        let mut engine = RenderEngine::new();
        engine.render(&tree, &map, tree.root, 0.0);
        (tree, engine)
    }

    #[test]
    fn scene_emits_links_glyphs_and_texts_in_order() {
        let (_, engine) = rendered_engine();
        let scene = build_map_scene(&engine, 1.0);

        // Two edges, three nodes with two texts each.
        assert_eq!(scene.len(), 2 + 3 * 3);
        assert!(matches!(scene[0], ScenePrimitive::LinkPath { .. }));
        assert!(matches!(scene[1], ScenePrimitive::LinkPath { .. }));
        let glyphs = scene
            .iter()
            .filter(|p| matches!(p, ScenePrimitive::NodeGlyph { .. }))
            .count();
        assert_eq!(glyphs, 3);
    }

    #[test]
    fn collapsed_node_uses_collapsed_fill() {
        let (tree, engine) = rendered_engine();
        let _ = tree;
        let scene = build_map_scene(&engine, 1.0);

        let fills: Vec<Color32> = scene
            .iter()
            .filter_map(|p| match p {
                ScenePrimitive::NodeGlyph { fill, .. } => Some(*fill),
                _ => None,
            })
            .collect();
        assert!(fills.contains(&FILL_COLLAPSED));
        assert!(fills.contains(&FILL_EXPANDED));
    }

    #[test]
    fn link_paths_bend_at_the_depth_midpoint() {
        let (_, engine) = rendered_engine();
        let scene = build_map_scene(&engine, 1.0);

        if let ScenePrimitive::LinkPath { points, .. } = &scene[0] {
            let mid = (points[0].x + points[3].x) / 2.0;
            assert_eq!(points[1].x, mid);
            assert_eq!(points[2].x, mid);
            assert_eq!(points[1].y, points[0].y);
            assert_eq!(points[2].y, points[3].y);
        } else {
            panic!("expected a link path first");
        }
    }
}
