//! Generational slot arena.
//!
//! [`SlotArena`] stores values in a vector of slots and hands out [`SlotId`]s
//! made of a slot index and the slot's generation. Removing a value bumps the
//! generation of its slot and puts the slot on a free list, so:
//!
//! - freed slots are reused (the heap does not grow without bound)
//! - an id issued before a removal never resolves again, even after its slot
//!   is reused, so double frees and use-after-free are reported, not undefined
//!
//! # Example
//!
//! ```
//! use vtobj_mem::slots::SlotArena;
//!
//! let mut arena = SlotArena::new();
//! let a = arena.insert("first");
//!
//! assert_eq!(arena.get(a), Some(&"first"));
//! assert_eq!(arena.remove(a), Some("first"));
//!
//! // The slot is reused, but the old id stays dead
//! let b = arena.insert("second");
//! assert_eq!(a.index(), b.index());
//! assert_eq!(arena.get(a), None);
//! assert_eq!(arena.get(b), Some(&"second"));
//! ```

use std::fmt;

/// Handle to a value stored in a [`SlotArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId {
    index: u32,
    generation: u32,
}

impl SlotId {
    /// Returns the slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// Returns the generation the id was issued for.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Slot arena occupancy statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotStats {
    /// Slots currently holding a value.
    pub live: usize,
    /// Slots waiting on the free list.
    pub free: usize,
    /// Slots ever created (`live + free`).
    pub slots: usize,
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// A generational slot map.
pub struct SlotArena<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    live: usize,
}

impl<T> SlotArena<T> {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty arena with room for `capacity` values before the slot
    /// vector reallocates.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        SlotArena {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            live: 0,
        }
    }

    /// Stores `value`, reusing a freed slot when one is available.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` slots would be needed.
    pub fn insert(&mut self, value: T) -> SlotId {
        self.live += 1;

        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return SlotId {
                index,
                generation: slot.generation,
            };
        }

        let index = u32::try_from(self.slots.len())
            .expect("slot arena exceeded u32::MAX slots");
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        SlotId {
            index,
            generation: 0,
        }
    }

    /// Removes and returns the value for `id`.
    ///
    /// Returns `None` if `id` is stale or was never issued by this arena.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation {
            return None;
        }

        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index);
        self.live -= 1;
        Some(value)
    }

    /// Returns the value for `id`, or `None` if `id` is stale.
    #[must_use]
    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    /// Returns the value for `id` mutably, or `None` if `id` is stale.
    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    /// Returns `true` if `id` still names a live value.
    #[must_use]
    pub fn contains(&self, id: SlotId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if no value is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Returns occupancy statistics.
    #[must_use]
    pub fn stats(&self) -> SlotStats {
        SlotStats {
            live: self.live,
            free: self.free_list.len(),
            slots: self.slots.len(),
        }
    }

    /// Iterates over live values in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value.as_ref().map(|value| {
                (
                    SlotId {
                        // Every index was checked against u32::MAX on insert.
                        index: index as u32,
                        generation: slot.generation,
                    },
                    value,
                )
            })
        })
    }
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SlotArena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotArena")
            .field("live", &self.live)
            .field("free", &self.free_list.len())
            .field("slots", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut arena = SlotArena::new();
        let a = arena.insert(1);
        let b = arena.insert(2);

        assert_ne!(a, b);
        assert_eq!(arena.get(a), Some(&1));
        assert_eq!(arena.get(b), Some(&2));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_get_mut() {
        let mut arena = SlotArena::new();
        let a = arena.insert(String::from("x"));

        arena.get_mut(a).unwrap().push('y');

        assert_eq!(arena.get(a).map(String::as_str), Some("xy"));
    }

    #[test]
    fn test_double_remove_is_rejected() {
        let mut arena = SlotArena::new();
        let a = arena.insert(5);

        assert_eq!(arena.remove(a), Some(5));
        assert_eq!(arena.remove(a), None);
        assert!(arena.is_empty());
    }

    #[test]
    fn test_stale_id_after_reuse() {
        let mut arena = SlotArena::new();
        let a = arena.insert('a');
        arena.remove(a);
        let b = arena.insert('b');

        assert_eq!(a.index(), b.index());
        assert_eq!(b.generation(), a.generation() + 1);
        assert!(!arena.contains(a));
        assert!(arena.get_mut(a).is_none());
        assert_eq!(arena.remove(a), None);
        assert_eq!(arena.get(b), Some(&'b'));
    }

    #[test]
    fn test_unknown_index_is_none() {
        let mut arena: SlotArena<u8> = SlotArena::new();
        let foreign = SlotId {
            index: 9,
            generation: 0,
        };

        assert!(arena.get(foreign).is_none());
        assert!(arena.remove(foreign).is_none());
    }

    #[test]
    fn test_stats_and_iter() {
        let mut arena = SlotArena::with_capacity(4);
        let ids: Vec<_> = (0..4).map(|i| arena.insert(i * 10)).collect();
        arena.remove(ids[1]);
        arena.remove(ids[3]);

        assert_eq!(
            arena.stats(),
            SlotStats {
                live: 2,
                free: 2,
                slots: 4
            }
        );

        let live: Vec<_> = arena.iter().map(|(_, v)| *v).collect();
        assert_eq!(live, vec![0, 20]);

        let (id, _) = arena.iter().nth(1).unwrap();
        assert_eq!(id, ids[2]);
    }

    #[test]
    fn test_display() {
        let mut arena = SlotArena::new();
        let a = arena.insert(());
        assert_eq!(a.to_string(), "#0v0");
    }
}
