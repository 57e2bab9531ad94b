//! Listener registrations for transient gesture events
//!
//! A drag gesture only needs move and end events while it is active. Each
//! gesture registers its listeners when it starts and gets back handles; the
//! exact same handles are released when the gesture ends, when a new gesture
//! replaces it, or when the sampler is dropped.

use std::collections::HashMap;

/// Kind of transient listener a gesture holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    /// Pointer/touch movement while dragging
    Move,
    /// Pointer release / touch end
    End,
}

/// Handle returned by a registration.
///
/// Not `Clone`: each registration is released exactly once, by moving its
/// handle back into [`ListenerRegistry::deregister`].
#[derive(Debug, PartialEq, Eq, Hash)]
#[must_use = "a listener handle must be deregistered or the listener leaks"]
pub struct ListenerHandle {
    id: u64,
    kind: ListenerKind,
}

impl ListenerHandle {
    pub fn kind(&self) -> ListenerKind {
        self.kind
    }
}

/// Event source that gestures attach transient listeners to
pub trait ListenerRegistry {
    /// Start delivering events of `kind`
    fn register(&mut self, kind: ListenerKind) -> ListenerHandle;

    /// Stop delivering events for the registration behind `handle`
    fn deregister(&mut self, handle: ListenerHandle);

    /// Whether at least one listener of `kind` is live
    fn is_listening(&self, kind: ListenerKind) -> bool;
}

/// In-process listener registry.
///
/// The host asks [`ListenerRegistry::is_listening`] before forwarding move
/// and release events, so nothing reaches the sampler between gestures.
#[derive(Debug, Default)]
pub struct ListenerTable {
    next_id: u64,
    live: HashMap<u64, ListenerKind>,
}

impl ListenerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live registrations
    pub fn active_count(&self) -> usize {
        self.live.len()
    }
}

impl ListenerRegistry for ListenerTable {
    fn register(&mut self, kind: ListenerKind) -> ListenerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id, kind);
        ListenerHandle { id, kind }
    }

    fn deregister(&mut self, handle: ListenerHandle) {
        self.live.remove(&handle.id);
    }

    fn is_listening(&self, kind: ListenerKind) -> bool {
        self.live.values().any(|k| *k == kind)
    }
}

/// The move/end registrations owned by one gesture
#[derive(Debug)]
pub struct GestureListeners {
    on_move: ListenerHandle,
    on_end: ListenerHandle,
}

impl GestureListeners {
    /// Register the move and end listeners for a new gesture
    pub fn acquire<R: ListenerRegistry + ?Sized>(registry: &mut R) -> Self {
        Self {
            on_move: registry.register(ListenerKind::Move),
            on_end: registry.register(ListenerKind::End),
        }
    }

    /// Release both registrations
    pub fn release<R: ListenerRegistry + ?Sized>(self, registry: &mut R) {
        registry.deregister(self.on_move);
        registry.deregister(self.on_end);
    }
}
