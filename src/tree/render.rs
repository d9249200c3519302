use std::collections::{HashMap, HashSet};

use super::layout::MapLayout;
use super::{MapTree, NodeId};

/// Transition length for every enter/update/exit animation.
pub const TRANSITION_SECONDS: f64 = 0.5;

/// One animated scalar: retargetable, cubic ease-in-out.
#[derive(Debug, Clone, Copy)]
pub struct Tween {
    from: f32,
    to: f32,
    start: f64,
    duration: f64,
}

impl Tween {
    pub fn new(from: f32, to: f32, start: f64) -> Self {
        Self {
            from,
            to,
            start,
            duration: TRANSITION_SECONDS,
        }
    }

    /// Restarts the tween towards `to` from the currently displayed value.
    /// A render pass that lands mid-animation simply re-targets; the last
    /// writer wins and nothing queues.
    pub fn retarget(&mut self, now: f64, to: f32) {
        self.from = self.value(now);
        self.to = to;
        self.start = now;
        self.duration = TRANSITION_SECONDS;
    }

    pub fn value(&self, now: f64) -> f32 {
        if self.duration <= 0.0 || now >= self.start + self.duration {
            return self.to;
        }
        if now <= self.start {
            return self.from;
        }
        let t = ((now - self.start) / self.duration) as f32;
        self.from + (self.to - self.from) * ease_cubic_in_out(t)
    }

    pub fn finished(&self, now: f64) -> bool {
        now >= self.start + self.duration
    }
}

fn ease_cubic_in_out(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}

/// Animated glyph for one node, keyed by its stable id.
#[derive(Debug, Clone)]
pub struct NodeSprite {
    pub id: NodeId,
    pub x: Tween,
    pub y: Tween,
    pub radius: Tween,
    pub label_alpha: Tween,
    /// Subtree hidden by a collapse; selects the glyph fill.
    pub has_hidden_children: bool,
    /// Zero visible children; selects the glyph stroke.
    pub childless: bool,
    pub label: String,
    pub estimation: String,
    /// Position at the end of the previous render pass; anchors the next
    /// pass's entering and exiting animations.
    pub prev: (f32, f32),
    pub exiting: bool,
}

impl NodeSprite {
    pub fn pos(&self, now: f64) -> (f32, f32) {
        (self.x.value(now), self.y.value(now))
    }

    fn finished(&self, now: f64) -> bool {
        self.x.finished(now)
            && self.y.finished(now)
            && self.radius.finished(now)
            && self.label_alpha.finished(now)
    }
}

/// Animated edge from a node to its parent, keyed by the child id.
#[derive(Debug, Clone)]
pub struct LinkSprite {
    pub child: NodeId,
    pub sx: Tween,
    pub sy: Tween,
    pub tx: Tween,
    pub ty: Tween,
    pub exiting: bool,
}

impl LinkSprite {
    pub fn endpoints(&self, now: f64) -> ((f32, f32), (f32, f32)) {
        (
            (self.sx.value(now), self.sy.value(now)),
            (self.tx.value(now), self.ty.value(now)),
        )
    }

    fn finished(&self, now: f64) -> bool {
        self.sx.finished(now)
            && self.sy.finished(now)
            && self.tx.finished(now)
            && self.ty.finished(now)
    }
}

/// Ids touched by one render pass, split by lifecycle phase.
#[derive(Debug, Default, Clone)]
pub struct RenderDiff {
    pub entered: Vec<NodeId>,
    pub updated: Vec<NodeId>,
    pub exited: Vec<NodeId>,
}

/// Matches the previously rendered node set against a freshly computed
/// layout, keyed by stable node id, and drives the resulting enter/update/
/// exit animations. Owns all position double-buffering: each sprite's `prev`
/// is overwritten with its just-computed target at the end of a pass.
#[derive(Debug, Default)]
pub struct RenderEngine {
    nodes: HashMap<NodeId, NodeSprite>,
    links: HashMap<NodeId, LinkSprite>,
}

impl RenderEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_sprites(&self) -> impl Iterator<Item = &NodeSprite> {
        self.nodes.values()
    }

    pub fn link_sprites(&self) -> impl Iterator<Item = &LinkSprite> {
        self.links.values()
    }

    pub fn sprite(&self, id: NodeId) -> Option<&NodeSprite> {
        self.nodes.get(&id)
    }

    /// Runs one reconciliation pass with `source` as the update root: the
    /// node whose previous position anchors entering elements and whose new
    /// position collects exiting ones.
    pub fn render(
        &mut self,
        tree: &MapTree,
        layout: &MapLayout,
        source: NodeId,
        now: f64,
    ) -> RenderDiff {
        let mut diff = RenderDiff::default();

        // First render of a document: seed the anchor at depth zero,
        // vertically centered.
        let source_prev = self
            .nodes
            .get(&source)
            .filter(|sprite| !sprite.exiting)
            .map(|sprite| sprite.prev)
            .unwrap_or((0.0, layout.height / 2.0));
        let source_new = layout.position(source);

        let new_set: HashSet<NodeId> = layout.visible.iter().copied().collect();

        for &id in &layout.visible {
            let (x, y) = layout.position(id);
            let radius = tree.visual_radius(id);
            let has_hidden_children = tree.has_hidden_children(id);
            let childless = tree.visible_child_count(id) == 0;
            let label = tree.label(id).to_string();
            let estimation = tree.aggregate_estimation(id).to_string();

            let updated = match self.nodes.get_mut(&id) {
                Some(sprite) if !sprite.exiting => {
                    sprite.x.retarget(now, x);
                    sprite.y.retarget(now, y);
                    sprite.radius.retarget(now, radius);
                    sprite.label_alpha.retarget(now, 1.0);
                    sprite.has_hidden_children = has_hidden_children;
                    sprite.childless = childless;
                    sprite.label = label.clone();
                    sprite.estimation = estimation.clone();
                    true
                }
                _ => false,
            };

            if updated {
                diff.updated.push(id);
            } else {
                // Fresh element, or one superseding its own unfinished exit
                // after a quick re-expand: either way it enters from the
                // update root's previous position, collapsed and transparent.
                self.nodes.insert(
                    id,
                    NodeSprite {
                        id,
                        x: Tween::new(source_prev.0, x, now),
                        y: Tween::new(source_prev.1, y, now),
                        radius: Tween::new(0.0, radius, now),
                        label_alpha: Tween::new(0.0, 1.0, now),
                        has_hidden_children,
                        childless,
                        label,
                        estimation,
                        prev: source_prev,
                        exiting: false,
                    },
                );
                diff.entered.push(id);
            }
        }

        for (&id, sprite) in self.nodes.iter_mut() {
            if !new_set.contains(&id) && !sprite.exiting {
                sprite.exiting = true;
                sprite.x.retarget(now, source_new.0);
                sprite.y.retarget(now, source_new.1);
                sprite.radius.retarget(now, 0.0);
                sprite.label_alpha.retarget(now, 0.0);
                diff.exited.push(id);
            }
        }

        let edge_children: HashSet<NodeId> =
            layout.edges.iter().map(|&(_, child)| child).collect();

        for &(parent, child) in &layout.edges {
            let (px, py) = layout.position(parent);
            let (cx, cy) = layout.position(child);
            let retargeted = match self.links.get_mut(&child) {
                Some(link) if !link.exiting => {
                    link.sx.retarget(now, px);
                    link.sy.retarget(now, py);
                    link.tx.retarget(now, cx);
                    link.ty.retarget(now, cy);
                    true
                }
                _ => false,
            };

            if !retargeted {
                // Enter as a degenerate point at the update root's previous
                // position.
                self.links.insert(
                    child,
                    LinkSprite {
                        child,
                        sx: Tween::new(source_prev.0, px, now),
                        sy: Tween::new(source_prev.1, py, now),
                        tx: Tween::new(source_prev.0, cx, now),
                        ty: Tween::new(source_prev.1, cy, now),
                        exiting: false,
                    },
                );
            }
        }

        for (&child, link) in self.links.iter_mut() {
            if !edge_children.contains(&child) && !link.exiting {
                link.exiting = true;
                link.sx.retarget(now, source_new.0);
                link.sy.retarget(now, source_new.1);
                link.tx.retarget(now, source_new.0);
                link.ty.retarget(now, source_new.1);
            }
        }

        // Stash the just-computed positions as the baseline for the next
        // pass's entering and exiting animations.
        for &id in &layout.visible {
            if let Some(sprite) = self.nodes.get_mut(&id) {
                sprite.prev = layout.position(id);
            }
        }

        diff
    }

    /// Drops exiting sprites whose animations have completed. Returns true
    /// while any animation is still in flight, which drives repaints.
    pub fn advance(&mut self, now: f64) -> bool {
        self.nodes
            .retain(|_, sprite| !(sprite.exiting && sprite.finished(now)));
        self.links
            .retain(|_, link| !(link.exiting && link.finished(now)));

        self.nodes.values().any(|sprite| !sprite.finished(now))
            || self.links.values().any(|link| !link.finished(now))
    }
}
