//! # Event Bus
//!
//! Synchronous, ordered dispatch of the engine's named events. Listeners get
//! the event and the engine's command queue: they observe state through the
//! event's borrowed source and request mutations by queueing commands, which
//! the engine applies at the top of the next step.

use std::fmt;
use std::str::FromStr;

use crate::collision::Pair;
use crate::commands::Commands;
use crate::composite::World;
use crate::error::PhysicsError;
use crate::metrics::Metrics;
use crate::timing::Timing;

/// The full event catalogue
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventName {
    BeforeTick,
    Tick,
    BeforeUpdate,
    AfterUpdate,
    BeforeRender,
    AfterRender,
    AfterTick,
    CollisionStart,
    CollisionActive,
    CollisionEnd,
}

impl EventName {
    pub const ALL: [EventName; 10] = [
        Self::BeforeTick,
        Self::Tick,
        Self::BeforeUpdate,
        Self::AfterUpdate,
        Self::BeforeRender,
        Self::AfterRender,
        Self::AfterTick,
        Self::CollisionStart,
        Self::CollisionActive,
        Self::CollisionEnd,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BeforeTick => "beforeTick",
            Self::Tick => "tick",
            Self::BeforeUpdate => "beforeUpdate",
            Self::AfterUpdate => "afterUpdate",
            Self::BeforeRender => "beforeRender",
            Self::AfterRender => "afterRender",
            Self::AfterTick => "afterTick",
            Self::CollisionStart => "collisionStart",
            Self::CollisionActive => "collisionActive",
            Self::CollisionEnd => "collisionEnd",
        }
    }

    /// Parse a space-separated list such as `"tick beforeUpdate"`
    pub fn parse_list(names: &str) -> Result<Vec<EventName>, PhysicsError> {
        names.split_whitespace().map(str::parse).collect()
    }
}

impl FromStr for EventName {
    type Err = PhysicsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| PhysicsError::UnknownEvent(s.to_string()))
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of the engine handed to listeners
#[derive(Copy, Clone, Debug)]
pub struct EventSource<'a> {
    pub world: &'a World,
    pub timing: &'a Timing,
    pub metrics: &'a Metrics,
}

#[derive(Copy, Clone, Debug)]
pub struct Event<'a> {
    pub name: EventName,
    /// Last wall-clock timestamp seen by the heartbeat
    pub timestamp: f64,
    pub source: EventSource<'a>,
    /// Present on the collision events, never empty
    pub pairs: Option<&'a [Pair]>,
}

pub type ListenerId = u64;

type Listener = Box<dyn FnMut(&Event<'_>, &mut Commands) + Send>;

struct Registration {
    id: ListenerId,
    names: Vec<EventName>,
    callback: Listener,
}

#[derive(Default)]
pub struct Events {
    registrations: Vec<Registration>,
    next_id: ListenerId,
}

impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for every name in the space-separated `names`
    pub fn on<F>(&mut self, names: &str, listener: F) -> Result<ListenerId, PhysicsError>
    where
        F: FnMut(&Event<'_>, &mut Commands) + Send + 'static,
    {
        let names = EventName::parse_list(names)?;
        if names.is_empty() {
            return Err(PhysicsError::UnknownEvent(String::new()));
        }
        self.next_id += 1;
        let id = self.next_id;
        self.registrations.push(Registration { id, names, callback: Box::new(listener) });
        Ok(id)
    }

    pub fn off(&mut self, id: ListenerId) -> Result<(), PhysicsError> {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.id != id);
        if self.registrations.len() == before {
            return Err(PhysicsError::UnknownListener(id));
        }
        Ok(())
    }

    pub fn has_listeners(&self, name: EventName) -> bool {
        self.registrations.iter().any(|r| r.names.contains(&name))
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Dispatch `event` once per name, to listeners in registration order
    pub fn trigger(&mut self, names: &[EventName], event: Event<'_>, commands: &mut Commands) {
        for &name in names {
            let event = Event { name, ..event };
            for registration in &mut self.registrations {
                if registration.names.contains(&name) {
                    (registration.callback)(&event, commands);
                }
            }
        }
    }
}

impl fmt::Debug for Events {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Events").field("listeners", &self.registrations.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::{Composite, Gravity};
    use crate::types::Bounds;
    use std::sync::{Arc, Mutex};

    #[test]
    fn names_round_trip_through_strings() {
        for name in EventName::ALL {
            assert_eq!(name.as_str().parse::<EventName>().unwrap(), name);
        }
        assert!(matches!("tock".parse::<EventName>(), Err(PhysicsError::UnknownEvent(_))));
    }

    #[test]
    fn one_listener_many_names_in_order() {
        let world = Composite::world(Gravity::default(), Bounds::UNBOUNDED);
        let timing = Timing::default();
        let metrics = Metrics::default();
        let event = Event {
            name: EventName::Tick,
            timestamp: 0.0,
            source: EventSource { world: &world, timing: &timing, metrics: &metrics },
            pairs: None,
        };

        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut events = Events::new();
        let log = Arc::clone(&seen);
        let first = events
            .on("tick beforeUpdate", move |e, _| log.lock().unwrap().push(("first", e.name)))
            .unwrap();
        let log = Arc::clone(&seen);
        events.on("tick", move |e, _| log.lock().unwrap().push(("second", e.name))).unwrap();

        let mut commands = Commands::new();
        events.trigger(&[EventName::Tick, EventName::BeforeUpdate], event, &mut commands);
        assert_eq!(
            *seen.lock().unwrap(),
            [
                ("first", EventName::Tick),
                ("second", EventName::Tick),
                ("first", EventName::BeforeUpdate),
            ]
        );

        events.off(first).unwrap();
        assert!(!events.has_listeners(EventName::BeforeUpdate));
        assert!(events.off(first).is_err());
    }

    #[test]
    fn registering_an_unknown_name_fails() {
        let mut events = Events::new();
        assert!(events.on("tick explode", |_, _| {}).is_err());
        assert!(events.is_empty());
    }
}
