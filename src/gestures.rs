//! Discrete swipe events from an optional gesture recognizer.
//!
//! The recognizer itself lives outside this crate. It publishes
//! [`GestureEvent`]s on a [`GestureChannel`]; consumers subscribe per kind and
//! keep the returned [`Subscription`] to unsubscribe later. Nothing in the
//! core requires a channel to exist.

use std::sync::mpsc::Sender;

use crate::math::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureKind {
    SwipeUp,
    SwipeDown,
    SwipeLeft,
    SwipeRight,
}

impl GestureKind {
    pub const ALL: [GestureKind; 4] = [
        GestureKind::SwipeUp,
        GestureKind::SwipeDown,
        GestureKind::SwipeLeft,
        GestureKind::SwipeRight,
    ];
}

/// A swipe with the motion vector that triggered it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    SwipeUp(Vec2),
    SwipeDown(Vec2),
    SwipeLeft(Vec2),
    SwipeRight(Vec2),
}

impl GestureEvent {
    pub fn kind(&self) -> GestureKind {
        match self {
            GestureEvent::SwipeUp(_) => GestureKind::SwipeUp,
            GestureEvent::SwipeDown(_) => GestureKind::SwipeDown,
            GestureEvent::SwipeLeft(_) => GestureKind::SwipeLeft,
            GestureEvent::SwipeRight(_) => GestureKind::SwipeRight,
        }
    }

    pub fn delta(&self) -> Vec2 {
        match *self {
            GestureEvent::SwipeUp(d)
            | GestureEvent::SwipeDown(d)
            | GestureEvent::SwipeLeft(d)
            | GestureEvent::SwipeRight(d) => d,
        }
    }

    pub fn new(kind: GestureKind, delta: Vec2) -> Self {
        match kind {
            GestureKind::SwipeUp => GestureEvent::SwipeUp(delta),
            GestureKind::SwipeDown => GestureEvent::SwipeDown(delta),
            GestureKind::SwipeLeft => GestureEvent::SwipeLeft(delta),
            GestureKind::SwipeRight => GestureEvent::SwipeRight(delta),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Handler = Box<dyn FnMut(&GestureEvent)>;

#[derive(Default)]
pub struct GestureChannel {
    handlers: Vec<(Subscription, GestureKind, Handler)>,
    next_id: u64,
}

impl GestureChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, kind: GestureKind, handler: F) -> Subscription
    where
        F: FnMut(&GestureEvent) + 'static,
    {
        let sub = Subscription(self.next_id);
        self.next_id += 1;
        self.handlers.push((sub, kind, Box::new(handler)));
        sub
    }

    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&mut self, sub: Subscription) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(s, _, _)| *s != sub);
        self.handlers.len() != before
    }

    /// Deliver `event` to every handler subscribed to its kind.
    pub fn emit(&mut self, event: GestureEvent) {
        let kind = event.kind();
        for (_, k, handler) in self.handlers.iter_mut() {
            if *k == kind {
                handler(&event);
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }
}

/// Subscribe to every swipe kind, forwarding events into `sender`
/// (typically a stage's gesture inbox).
pub fn forward_to(channel: &mut GestureChannel, sender: Sender<GestureEvent>) -> Vec<Subscription> {
    GestureKind::ALL
        .iter()
        .map(|kind| {
            let tx = sender.clone();
            channel.subscribe(*kind, move |event| {
                // A dropped stage just stops listening.
                let _ = tx.send(*event);
            })
        })
        .collect()
}
