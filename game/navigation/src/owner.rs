use common::*;

/// Weak reference to something that submitted a path job. Stops resolving once released, even if
/// its slot has since been reused
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct OwnerHandle {
    index: u32,
    generation: u32,
}

#[derive(Default)]
pub struct OwnerRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

#[derive(Clone)]
struct Slot {
    generation: u32,
    alive: bool,
}

slog_value_debug!(OwnerHandle);

impl OwnerRegistry {
    pub fn register(&mut self) -> OwnerHandle {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                debug_assert!(!slot.alive, "free slot {} is alive", index);

                slot.generation = slot.generation.wrapping_add(1);
                slot.alive = true;
                OwnerHandle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    alive: true,
                });
                OwnerHandle {
                    index,
                    generation: 0,
                }
            }
        }
    }

    /// Returns false if already released
    pub fn release(&mut self, handle: OwnerHandle) -> bool {
        if !self.is_alive(handle) {
            return false;
        }

        self.slots[handle.index as usize].alive = false;
        self.free.push(handle.index);
        true
    }

    pub fn is_alive(&self, handle: OwnerHandle) -> bool {
        self.slots
            .get(handle.index as usize)
            .map_or(false, |slot| slot.alive && slot.generation == handle.generation)
    }

    /// Number of live owners
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Debug for OwnerRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "OwnerRegistry({} alive, {} slots)", self.len(), self.slots.len())
    }
}
