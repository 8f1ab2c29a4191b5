// Copyright 2026 the Layerhack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generational arena for sessions.

use super::id::SessionId;

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot storage addressed by [`SessionId`] handles.
///
/// Destroyed entries are recycled via a free list, and generation counters
/// prevent stale handle access.
#[derive(Debug)]
pub struct SessionStore<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    len: usize,
}

impl<T> Default for SessionStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SessionStore<T> {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Inserts a value and returns its handle.
    pub fn insert(&mut self, value: T) -> SessionId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            let slot = &mut self.slots[idx as usize];
            slot.generation = slot.generation.wrapping_add(1);
            idx
        } else {
            let idx = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Slot {
                generation: 0,
                value: None,
            });
            idx
        };

        let slot = &mut self.slots[idx as usize];
        let id = SessionId {
            idx,
            generation: slot.generation,
        };
        slot.value = Some(value);
        self.len += 1;
        id
    }

    /// Removes a value, freeing its slot for reuse.
    ///
    /// Returns `None` for a stale handle.
    pub fn remove(&mut self, id: SessionId) -> Option<T> {
        let slot = self.slots.get_mut(id.idx as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let value = slot.value.take()?;
        self.free_list.push(id.idx);
        self.len -= 1;
        Some(value)
    }

    /// Returns whether the given handle refers to a live value.
    #[must_use]
    pub fn is_alive(&self, id: SessionId) -> bool {
        self.get(id).is_some()
    }

    /// Returns the value for a live handle.
    #[must_use]
    pub fn get(&self, id: SessionId) -> Option<&T> {
        let slot = self.slots.get(id.idx as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.value.as_ref()
    }

    /// Returns the value for a live handle, mutably.
    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut T> {
        let slot = self.slots.get_mut(id.idx as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.value.as_mut()
    }

    /// Returns a snapshot of all live handles in slot order.
    ///
    /// The snapshot makes it safe to destroy sessions while walking it.
    #[must_use]
    pub fn ids(&self) -> Vec<SessionId> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Iterates over live values and their handles in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SessionId, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            let value = slot.value.as_ref()?;
            let id = SessionId {
                idx: u32::try_from(idx).ok()?,
                generation: slot.generation,
            };
            Some((id, value))
        })
    }

    /// Iterates mutably over live values and their handles in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SessionId, &mut T)> + '_ {
        self.slots.iter_mut().enumerate().filter_map(|(idx, slot)| {
            let value = slot.value.as_mut()?;
            let id = SessionId {
                idx: u32::try_from(idx).ok()?,
                generation: slot.generation,
            };
            Some((id, value))
        })
    }

    /// Returns the number of live values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when no value is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::SessionStore;

    #[test]
    fn insert_and_remove() {
        let mut store = SessionStore::new();
        let a = store.insert("a");
        let b = store.insert("b");
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(a), Some(&"a"));

        assert_eq!(store.remove(a), Some("a"));
        assert!(!store.is_alive(a), "removed handle is dead");
        assert!(store.is_alive(b), "other handle unaffected");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn stale_handle_is_rejected_after_reuse() {
        let mut store = SessionStore::new();
        let old = store.insert(1_u32);
        store.remove(old);
        let new = store.insert(2_u32);

        assert_eq!(old.index(), new.index(), "slot is recycled");
        assert_ne!(old.generation(), new.generation());
        assert_eq!(store.get(old), None, "stale handle must not alias");
        assert_eq!(store.remove(old), None, "stale remove is a no-op");
        assert_eq!(store.get(new), Some(&2));
    }

    #[test]
    fn ids_snapshot_survives_removal() {
        let mut store = SessionStore::new();
        let ids: Vec<_> = (0..4_u32).map(|n| store.insert(n)).collect();
        for id in store.ids() {
            if store.get(id).is_some_and(|n| n % 2 == 0) {
                store.remove(id);
            }
        }
        assert_eq!(store.ids(), vec![ids[1], ids[3]]);
        assert!(!store.is_empty());
    }
}
