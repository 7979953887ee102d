//! Generational slot storage for bodies and joints.
//!
//! Handles stay valid until their slot is freed; a reused slot bumps its
//! generation so stale handles resolve to `None` instead of aliasing.

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Index plus generation identifying an arena entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }
}

impl<T> Arena<T> {
    pub(crate) fn insert(&mut self, value: T) -> RawHandle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            if let Some(slot) = self.slots.get_mut(index as usize) {
                slot.generation = slot.generation.wrapping_add(1);
                slot.value = Some(value);
                return RawHandle {
                    index,
                    generation: slot.generation,
                };
            }
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        RawHandle {
            index,
            generation: 0,
        }
    }

    pub(crate) fn remove(&mut self, handle: RawHandle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        self.free.push(handle.index);
        self.len -= 1;
        Some(value)
    }

    pub(crate) fn get(&self, handle: RawHandle) -> Option<&T> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub(crate) fn get_mut(&mut self, handle: RawHandle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    /// Live entry by raw slot index, ignoring generation.
    pub(crate) fn at(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(|slot| slot.value.as_ref())
    }

    pub(crate) fn at_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index).and_then(|slot| slot.value.as_mut())
    }

    /// Borrows two distinct live entries mutably by slot index.
    pub(crate) fn pair_mut(&mut self, a: usize, b: usize) -> Option<(&mut T, &mut T)> {
        if a == b {
            return None;
        }
        let (first, second) = if a < b {
            let (low, high) = self.slots.split_at_mut_checked(b)?;
            (low.get_mut(a)?, high.first_mut()?)
        } else {
            let (low, high) = self.slots.split_at_mut_checked(a)?;
            (high.first_mut()?, low.get_mut(b)?)
        };
        Some((first.value.as_mut()?, second.value.as_mut()?))
    }

    pub(crate) fn handle_at(&self, index: usize) -> Option<RawHandle> {
        let slot = self.slots.get(index)?;
        slot.value.as_ref()?;
        Some(RawHandle {
            index: u32::try_from(index).ok()?,
            generation: slot.generation,
        })
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (RawHandle, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let value = slot.value.as_ref()?;
            Some((
                RawHandle {
                    index: u32::try_from(index).ok()?,
                    generation: slot.generation,
                },
                value,
            ))
        })
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut().filter_map(|slot| slot.value.as_mut())
    }

    pub(crate) fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                if let Ok(index) = u32::try_from(index) {
                    self.free.push(index);
                }
            }
        }
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn stale_handle_does_not_alias_reused_slot() {
        let mut arena = Arena::default();
        let first = arena.insert(1_u8);
        assert_eq!(arena.remove(first), Some(1));
        let second = arena.insert(2_u8);
        assert_eq!(first.index, second.index);
        assert!(arena.get(first).is_none());
        assert_eq!(arena.get(second), Some(&2));
    }

    #[rstest]
    fn pair_mut_rejects_same_index() {
        let mut arena = Arena::default();
        arena.insert(1_u8);
        arena.insert(2_u8);
        assert!(arena.pair_mut(0, 0).is_none());
        let (a, b) = arena.pair_mut(1, 0).expect("two live slots");
        assert_eq!((*a, *b), (2, 1));
    }

    #[rstest]
    fn pair_mut_outside_the_arena_is_none() {
        let mut arena = Arena::default();
        let first = arena.insert(1_u8);
        arena.insert(2_u8);
        assert!(arena.pair_mut(0, 5).is_none());
        assert!(arena.pair_mut(7, 1).is_none());
        arena.remove(first);
        assert!(arena.pair_mut(0, 1).is_none());
    }

    #[rstest]
    fn clear_empties_and_recycles() {
        let mut arena = Arena::default();
        arena.insert('a');
        arena.insert('b');
        arena.clear();
        assert_eq!(arena.len(), 0);
        assert_eq!(arena.iter().count(), 0);
        arena.insert('c');
        assert_eq!(arena.capacity(), 2);
    }
}
