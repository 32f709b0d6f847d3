//! # Composites and the World
//!
//! A composite is a node in the scene tree. It owns bodies, constraints and
//! child composites. The world is simply the root composite, which always
//! carries gravity and bounds so every descendant resolves to a concrete value.
//!
//! The engine never keeps references into the tree between steps; it
//! re-flattens it every step, so hosts are free to restructure it between
//! heartbeats as long as they leave the modified flag set.

use serde::{Deserialize, Serialize};

use crate::body::{next_id, Body, BodyId};
use crate::constraint::Constraint;
use crate::types::{Bounds, Vec2};

/// Gravity direction and the scale applied to `mass * direction`
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gravity {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

impl Gravity {
    #[must_use]
    pub fn vector(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

impl Default for Gravity {
    fn default() -> Self {
        Self { x: 0.0, y: 1.0, scale: 0.001 }
    }
}

/// Gravity and bounds after inheriting from ancestors
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Resolved {
    pub gravity: Gravity,
    pub bounds: Bounds,
}

#[derive(Clone, Debug)]
pub struct Composite {
    pub id: CompositeId,
    pub label: String,
    pub bodies: Vec<Body>,
    pub constraints: Vec<Constraint>,
    pub composites: Vec<Composite>,
    /// Overrides the inherited gravity when set
    pub gravity: Option<Gravity>,
    /// Overrides the inherited bounds when set
    pub bounds: Option<Bounds>,
    is_modified: bool,
}

/// The scene root
pub type World = Composite;

/// Composite identifier. Drawn from [`next_id`], so it never equals a body id.
pub type CompositeId = BodyId;

impl Composite {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: next_id(),
            label: label.into(),
            bodies: Vec::new(),
            constraints: Vec::new(),
            composites: Vec::new(),
            gravity: None,
            bounds: None,
            is_modified: false,
        }
    }

    /// Create a scene root with concrete gravity and bounds
    pub fn world(gravity: Gravity, bounds: Bounds) -> World {
        let mut world = Self::new("World");
        world.gravity = Some(gravity);
        world.bounds = Some(bounds);
        world
    }

    pub fn add_body(&mut self, body: Body) -> BodyId {
        let id = body.id;
        self.bodies.push(body);
        self.is_modified = true;
        id
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
        self.is_modified = true;
    }

    pub fn add_composite(&mut self, composite: Composite) -> CompositeId {
        let id = composite.id;
        self.composites.push(composite);
        self.is_modified = true;
        id
    }

    /// Remove a body anywhere in the tree
    pub fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        if let Some(index) = self.bodies.iter().position(|b| b.id == id) {
            self.is_modified = true;
            return Some(self.bodies.remove(index));
        }
        for child in &mut self.composites {
            if let Some(body) = child.remove_body(id) {
                self.is_modified = true;
                return Some(body);
            }
        }
        None
    }

    /// Drop every body, constraint and child composite. Keeps static bodies
    /// when `keep_static` is set.
    pub fn clear(&mut self, keep_static: bool) {
        if keep_static {
            self.bodies.retain(|b| b.is_static);
        } else {
            self.bodies.clear();
        }
        self.constraints.clear();
        self.composites.clear();
        self.is_modified = true;
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies
            .iter()
            .find(|b| b.id == id)
            .or_else(|| self.composites.iter().find_map(|c| c.body(id)))
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        if let Some(index) = self.bodies.iter().position(|b| b.id == id) {
            return Some(&mut self.bodies[index]);
        }
        self.composites.iter_mut().find_map(|c| c.body_mut(id))
    }

    pub fn composite_mut(&mut self, id: CompositeId) -> Option<&mut Composite> {
        if self.id == id {
            return Some(self);
        }
        self.composites.iter_mut().find_map(|c| c.composite_mut(id))
    }

    /// Own bodies first, then each child composite depth-first
    pub fn all_bodies(&self) -> Vec<&Body> {
        let mut out = Vec::new();
        self.collect_bodies(&mut out);
        out
    }

    fn collect_bodies<'a>(&'a self, out: &mut Vec<&'a Body>) {
        out.extend(self.bodies.iter());
        for child in &self.composites {
            child.collect_bodies(out);
        }
    }

    pub fn all_bodies_mut(&mut self) -> Vec<&mut Body> {
        let mut out = Vec::new();
        self.collect_bodies_mut(&mut out);
        out
    }

    fn collect_bodies_mut<'a>(&'a mut self, out: &mut Vec<&'a mut Body>) {
        out.extend(self.bodies.iter_mut());
        for child in &mut self.composites {
            child.collect_bodies_mut(out);
        }
    }

    pub fn all_constraints(&self) -> Vec<&Constraint> {
        let mut out: Vec<&Constraint> = self.constraints.iter().collect();
        for child in &self.composites {
            out.extend(child.all_constraints());
        }
        out
    }

    /// Every descendant composite in pre-order. The receiver is not included.
    pub fn all_composites(&self) -> Vec<&Composite> {
        let mut out = Vec::new();
        for child in &self.composites {
            out.push(child);
            out.extend(child.all_composites());
        }
        out
    }

    /// Split the tree into flat mutable body and constraint lists in one pass
    pub fn split_mut(&mut self) -> (Vec<&mut Body>, Vec<&mut Constraint>) {
        let mut bodies = Vec::new();
        let mut constraints = Vec::new();
        self.collect_split(&mut bodies, &mut constraints);
        (bodies, constraints)
    }

    fn collect_split<'a>(&'a mut self, bodies: &mut Vec<&'a mut Body>, constraints: &mut Vec<&'a mut Constraint>) {
        bodies.extend(self.bodies.iter_mut());
        constraints.extend(self.constraints.iter_mut());
        for child in &mut self.composites {
            child.collect_split(bodies, constraints);
        }
    }

    /// Resolve this composite's gravity and bounds against its parent's
    #[must_use]
    pub fn resolve(&self, parent: &Resolved) -> Resolved {
        Resolved {
            gravity: self.gravity.unwrap_or(parent.gravity),
            bounds: self.bounds.unwrap_or(parent.bounds),
        }
    }

    /// Gravity and bounds of the root itself
    #[must_use]
    pub fn resolved_root(&self) -> Resolved {
        self.resolve(&Resolved {
            gravity: Gravity { x: 0.0, y: 0.0, scale: 0.0 },
            bounds: Bounds::UNBOUNDED,
        })
    }

    /// Visit every descendant (pre-order) and then the receiver, handing each
    /// its resolved gravity and bounds.
    pub fn for_each_resolved_mut(&mut self, f: &mut impl FnMut(&mut Composite, &Resolved)) {
        let root = self.resolved_root();
        self.visit_descendants_mut(&root, f);
        f(self, &root);
    }

    fn visit_descendants_mut(&mut self, parent: &Resolved, f: &mut impl FnMut(&mut Composite, &Resolved)) {
        for child in &mut self.composites {
            let resolved = child.resolve(parent);
            f(child, &resolved);
            child.visit_descendants_mut(&resolved, f);
        }
    }

    /// True when this composite or any descendant was structurally modified
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.is_modified || self.composites.iter().any(Composite::is_modified)
    }

    /// Set the flag on this composite and optionally every descendant
    pub fn set_modified(&mut self, value: bool, update_children: bool) {
        self.is_modified = value;
        if update_children {
            for child in &mut self.composites {
                child.set_modified(value, true);
            }
        }
    }

    /// Set the flag on the composite `id`, optionally on its ancestors and
    /// descendants. Returns false when `id` is not in the tree.
    pub fn set_modified_at(&mut self, id: BodyId, value: bool, update_parents: bool, update_children: bool) -> bool {
        if self.id == id {
            self.set_modified(value, update_children);
            return true;
        }
        for child in &mut self.composites {
            if child.set_modified_at(id, value, update_parents, update_children) {
                if update_parents {
                    self.is_modified = value;
                }
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composites_and_bodies_share_one_id_space() {
        let mut world = Composite::world(Gravity::default(), Bounds::UNBOUNDED);
        let body = world.add_body(Body::circle(Vec2::ZERO, 1.0));
        let child: CompositeId = world.add_composite(Composite::new("child"));
        assert_ne!(body, child);
        assert!(world.composite_mut(body).is_none());
        assert_eq!(world.composite_mut(child).map(|c| c.id), Some(child));
    }

    fn nested_world() -> World {
        let mut world = Composite::world(Gravity::default(), Bounds::UNBOUNDED);
        world.add_body(Body::circle(Vec2::ZERO, 1.0).with_label("root"));
        let mut child = Composite::new("child");
        child.gravity = Some(Gravity { x: 1.0, y: 0.0, scale: 0.002 });
        child.add_body(Body::circle(Vec2::new(5.0, 0.0), 1.0).with_label("child"));
        let mut grandchild = Composite::new("grandchild");
        grandchild.add_body(Body::circle(Vec2::new(9.0, 0.0), 1.0).with_label("grandchild"));
        child.add_composite(grandchild);
        world.add_composite(child);
        world
    }

    #[test]
    fn all_bodies_lists_own_bodies_before_children() {
        let world = nested_world();
        let labels: Vec<&str> = world.all_bodies().iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, ["root", "child", "grandchild"]);
    }

    #[test]
    fn gravity_is_inherited_from_the_nearest_override() {
        let mut world = nested_world();
        let mut seen = Vec::new();
        world.for_each_resolved_mut(&mut |c, r| seen.push((c.label.clone(), r.gravity)));
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].0, "child");
        assert_eq!(seen[1].0, "grandchild");
        assert_eq!(seen[1].1, seen[0].1);
        assert_eq!(seen[2].0, "World");
        assert_eq!(seen[2].1, Gravity::default());
    }

    #[test]
    fn modified_flag_propagates_through_children() {
        let mut world = nested_world();
        assert!(world.is_modified());
        world.set_modified(false, true);
        assert!(!world.is_modified());

        let grandchild_id = world.all_composites()[1].id;
        assert!(world.set_modified_at(grandchild_id, true, true, false));
        assert!(world.is_modified());
        world.set_modified(false, true);
        assert!(!world.is_modified());
    }

    #[test]
    fn remove_body_searches_the_tree() {
        let mut world = nested_world();
        let id = world.all_bodies()[2].id;
        world.set_modified(false, true);
        assert!(world.remove_body(id).is_some());
        assert!(world.is_modified());
        assert!(world.body(id).is_none());
        assert_eq!(world.all_bodies().len(), 2);
    }
}
