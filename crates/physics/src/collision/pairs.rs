//! # Pair Registry
//!
//! Tracks collision pairs across steps. Every step records one
//! [`Lifecycle`] transition per touched pair and then partitions those
//! transitions into the started / active / ended lists in a single pass, so
//! the event payloads can never drift from the registry or leak into the
//! next step.

use std::collections::HashMap;

use crate::body::BodySet;
use super::detector::can_collide;
use super::{Collision, Pair, PairId};

/// Per-step classification of a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// First confirmed contact
    Started,
    /// Contact continued from an earlier step
    Active,
    /// Expired this step and removed from the registry
    Ended,
}

#[derive(Debug, Default)]
pub struct Pairs {
    list: Vec<Pair>,
    table: HashMap<PairId, usize>,
    transitions: Vec<(Lifecycle, Pair)>,
    collision_start: Vec<Pair>,
    collision_active: Vec<Pair>,
    collision_end: Vec<Pair>,
}

impl Pairs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge this step's confirmed collisions into the registry.
    ///
    /// Known pairs are refreshed and classified active, unknown ones are
    /// created and classified started. Pairs missing from `collisions` are
    /// left alone; see [`Pairs::remove_old`].
    pub fn update(&mut self, collisions: &[Collision], timestamp: f64) {
        self.transitions.clear();

        for collision in collisions {
            let id = PairId::new(collision.body_a, collision.body_b);
            if let Some(&index) = self.table.get(&id) {
                let pair = &mut self.list[index];
                pair.update(*collision, timestamp);
                self.transitions.push((Lifecycle::Active, pair.clone()));
            } else {
                let pair = Pair::new(*collision, timestamp);
                self.table.insert(id, self.list.len());
                self.transitions.push((Lifecycle::Started, pair.clone()));
                self.list.push(pair);
            }
        }
    }

    /// Deactivate pairs not confirmed at `timestamp` and evict those idle for
    /// longer than `max_idle`, classifying each evicted pair as ended.
    ///
    /// Pairs whose bodies are both static or asleep are kept alive: the
    /// detector never tests them, which must not read as a separation.
    pub fn remove_old(&mut self, timestamp: f64, max_idle: f64, bodies: &BodySet<'_>) {
        let mut removed = false;

        for pair in &mut self.list {
            if pair.time_updated >= timestamp {
                continue;
            }
            if pair.is_active {
                pair.set_inactive();
            }

            let untested = match (bodies.get(pair.body_a), bodies.get(pair.body_b)) {
                (Some(a), Some(b)) => !can_collide(a, b),
                _ => false,
            };
            if untested {
                pair.time_updated = timestamp;
                continue;
            }

            if timestamp - pair.time_updated > max_idle {
                self.transitions.push((Lifecycle::Ended, pair.clone()));
                removed = true;
            }
        }

        if removed {
            self.list.retain(|p| timestamp - p.time_updated <= max_idle);
            self.reindex();
        }
    }

    /// Build the three lifecycle lists from this step's transitions
    pub fn partition(&mut self) {
        self.collision_start.clear();
        self.collision_active.clear();
        self.collision_end.clear();

        for (lifecycle, pair) in self.transitions.drain(..) {
            match lifecycle {
                Lifecycle::Started => {
                    self.collision_active.push(pair.clone());
                    self.collision_start.push(pair);
                }
                Lifecycle::Active => self.collision_active.push(pair),
                Lifecycle::Ended => self.collision_end.push(pair),
            }
        }
    }

    /// Forget every pair and every pending transition
    pub fn clear(&mut self) {
        self.list.clear();
        self.table.clear();
        self.transitions.clear();
        self.collision_start.clear();
        self.collision_active.clear();
        self.collision_end.clear();
    }

    fn reindex(&mut self) {
        self.table = self.list.iter().enumerate().map(|(i, p)| (p.id, i)).collect();
    }

    pub fn get(&self, id: PairId) -> Option<&Pair> {
        self.table.get(&id).map(|&i| &self.list[i])
    }

    pub fn list(&self) -> &[Pair] {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut [Pair] {
        &mut self.list
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Pairs that began touching in the latest step
    pub fn collision_start(&self) -> &[Pair] {
        &self.collision_start
    }

    /// Pairs touching in the latest step, new or continuing
    pub fn collision_active(&self) -> &[Pair] {
        &self.collision_active
    }

    /// Pairs that expired in the latest step
    pub fn collision_end(&self) -> &[Pair] {
        &self.collision_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;
    use crate::types::Vec2;

    const STEP: f64 = 16.0;

    fn collision(a: &Body, b: &Body) -> Collision {
        Collision {
            body_a: a.id,
            body_b: b.id,
            normal: Vec2::new(1.0, 0.0),
            tangent: Vec2::new(0.0, 1.0),
            depth: 0.1,
            support: Vec2::ZERO,
            friction: 0.1,
            restitution: 0.0,
        }
    }

    fn step(pairs: &mut Pairs, collisions: &[Collision], bodies: &BodySet<'_>, n: u32) {
        let timestamp = f64::from(n) * STEP;
        pairs.update(collisions, timestamp);
        pairs.remove_old(timestamp, STEP, bodies);
        pairs.partition();
    }

    #[test]
    fn new_contact_is_started_and_active() {
        let mut a = Body::circle(Vec2::ZERO, 1.0);
        let mut b = Body::circle(Vec2::new(1.5, 0.0), 1.0);
        let c = collision(&a, &b);
        let bodies = BodySet::new(vec![&mut a, &mut b]);
        let mut pairs = Pairs::new();

        step(&mut pairs, &[c], &bodies, 0);
        assert_eq!(pairs.collision_start().len(), 1);
        assert_eq!(pairs.collision_active().len(), 1);
        assert!(pairs.collision_end().is_empty());

        step(&mut pairs, &[c], &bodies, 1);
        assert!(pairs.collision_start().is_empty());
        assert_eq!(pairs.collision_active().len(), 1);
        assert_eq!(pairs.collision_active()[0].time_updated, STEP);
    }

    #[test]
    fn missing_pair_ends_exactly_once_after_grace_step() {
        let mut a = Body::circle(Vec2::ZERO, 1.0);
        let mut b = Body::circle(Vec2::new(1.5, 0.0), 1.0);
        let c = collision(&a, &b);
        let bodies = BodySet::new(vec![&mut a, &mut b]);
        let mut pairs = Pairs::new();

        step(&mut pairs, &[c], &bodies, 0);
        // One missed step is tolerated
        step(&mut pairs, &[], &bodies, 1);
        assert!(pairs.collision_end().is_empty());
        assert_eq!(pairs.len(), 1);
        assert!(!pairs.list()[0].is_active);

        step(&mut pairs, &[], &bodies, 2);
        assert_eq!(pairs.collision_end().len(), 1);
        assert!(pairs.is_empty());

        step(&mut pairs, &[], &bodies, 3);
        assert!(pairs.collision_end().is_empty());
    }

    #[test]
    fn resting_pairs_are_not_expired() {
        let mut a = Body::circle(Vec2::ZERO, 1.0);
        let mut b = Body::fixed(Vec2::new(1.5, 0.0), 1.0);
        let c = collision(&a, &b);
        a.is_sleeping = true;
        let bodies = BodySet::new(vec![&mut a, &mut b]);
        let mut pairs = Pairs::new();

        step(&mut pairs, &[c], &bodies, 0);
        for n in 1..10 {
            step(&mut pairs, &[], &bodies, n);
            assert!(pairs.collision_end().is_empty());
        }
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn awake_body_leaving_a_sleeper_ends_the_pair() {
        let mut a = Body::circle(Vec2::ZERO, 1.0);
        let mut b = Body::circle(Vec2::new(1.5, 0.0), 1.0);
        let c = collision(&a, &b);
        b.is_sleeping = true;
        let bodies = BodySet::new(vec![&mut a, &mut b]);
        let mut pairs = Pairs::new();

        step(&mut pairs, &[c], &bodies, 0);
        step(&mut pairs, &[], &bodies, 1);
        assert!(pairs.collision_end().is_empty());

        step(&mut pairs, &[], &bodies, 2);
        assert_eq!(pairs.collision_end().len(), 1);
        assert!(pairs.is_empty());
    }

    #[test]
    fn clear_drops_lists_and_registry() {
        let mut a = Body::circle(Vec2::ZERO, 1.0);
        let mut b = Body::circle(Vec2::new(1.5, 0.0), 1.0);
        let c = collision(&a, &b);
        let bodies = BodySet::new(vec![&mut a, &mut b]);
        let mut pairs = Pairs::new();
        step(&mut pairs, &[c], &bodies, 0);

        pairs.clear();
        assert!(pairs.is_empty());
        assert!(pairs.collision_start().is_empty());
        assert!(pairs.get(PairId::new(c.body_a, c.body_b)).is_none());
    }
}
