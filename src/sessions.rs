//! Thread-local registry of active recalculation polls.
//!
//! A poll session is keyed by the normalized user name, so at most one loop
//! polls for a given user at a time. Sessions can be cancelled; the loop
//! notices at its next suspension point.
//!
//! # Registry Structure
//! - key: normalized user name
//! - value: `(session_id, cancelled)`

use crate::utils::normalize_user;
use std::cell::RefCell;
use std::collections::HashMap;

pub type SessionId = u64;

struct Registry {
    next_id: SessionId,
    active: HashMap<String, (SessionId, bool)>,
}

thread_local! {
    /// Sessions survive component lifetimes; wasm runs on a single thread.
    static ACTIVE_SESSIONS: RefCell<Registry> = RefCell::new(Registry {
        next_id: 1,
        active: HashMap::new(),
    });
}

/// Owns the registry entry of one poll session and releases it on drop.
#[derive(Debug)]
pub struct SessionGuard {
    user: String,
    id: SessionId,
}

impl SessionGuard {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn is_cancelled(&self) -> bool {
        ACTIVE_SESSIONS.with(|r| {
            r.borrow()
                .active
                .get(&self.user)
                .map_or(true, |&(id, cancelled)| id != self.id || cancelled)
        })
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        ACTIVE_SESSIONS.with(|r| {
            let mut registry = r.borrow_mut();
            if registry.active.get(&self.user).map(|&(id, _)| id) == Some(self.id) {
                registry.active.remove(&self.user);
            }
        });
    }
}

/// Claim the session slot for `user`; `None` if a session is already active.
///
/// All lookups normalize the name first, so "Rafis " and "rafis" share a slot.
pub fn acquire(user: &str) -> Option<SessionGuard> {
    let user = normalize_user(user);
    ACTIVE_SESSIONS.with(|r| {
        let mut registry = r.borrow_mut();
        if registry.active.contains_key(&user) {
            return None;
        }
        let id = registry.next_id;
        registry.next_id += 1;
        registry.active.insert(user.clone(), (id, false));
        Some(SessionGuard { user, id })
    })
}

/// Ask the active session for `user` to stop. Returns whether one was running.
pub fn cancel(user: &str) -> bool {
    let user = normalize_user(user);
    ACTIVE_SESSIONS.with(|r| match r.borrow_mut().active.get_mut(&user) {
        Some(entry) => {
            entry.1 = true;
            true
        }
        None => false,
    })
}

pub fn is_active(user: &str) -> bool {
    let user = normalize_user(user);
    ACTIVE_SESSIONS.with(|r| r.borrow().active.contains_key(&user))
}
