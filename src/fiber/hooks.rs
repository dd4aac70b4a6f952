//! Hook slots owned by component fibers.
//!
//! The engine does not define state or effect primitives. It only keeps, per
//! component fiber, an ordered list of opaque slots that is rebuilt every
//! generation: slot `i` of the new fiber is seeded from slot `i` of its
//! alternate. A hook subsystem built on top relies on that order being
//! stable for as long as the component keeps its position and type.

use std::any::Any;
use std::rc::Rc;

/// Opaque value stored in a hook slot.
pub type HookSlot = Rc<dyn Any>;

/// Hook cursor for one component evaluation.
pub struct Hooks<'a> {
    previous: &'a [HookSlot],
    slots: &'a mut Vec<HookSlot>,
}

impl<'a> Hooks<'a> {
    pub(crate) fn new(previous: &'a [HookSlot], slots: &'a mut Vec<HookSlot>) -> Self {
        slots.clear();
        Self { previous, slots }
    }

    /// Position of the next slot.
    pub fn index(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots the previous generation allocated.
    pub fn previous_len(&self) -> usize {
        self.previous.len()
    }

    /// Take the slot at the cursor and advance.
    ///
    /// Reuses the previous generation's value when it has the same type,
    /// otherwise stores `init()`.
    pub fn use_slot<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Rc<T> {
        let carried = self
            .previous
            .get(self.slots.len())
            .and_then(|slot| Rc::clone(slot).downcast::<T>().ok());
        let value = carried.unwrap_or_else(|| Rc::new(init()));
        self.slots.push(Rc::clone(&value) as HookSlot);
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_slots_allocate_in_order() {
        let mut slots = Vec::new();
        let mut hooks = Hooks::new(&[], &mut slots);

        let a = hooks.use_slot(|| 1u32);
        let b = hooks.use_slot(|| "two");
        assert_eq!(*a, 1);
        assert_eq!(*b, "two");
        assert_eq!(hooks.index(), 2);
        assert_eq!(slots.len(), 2);
    }

    #[test]
    fn test_slots_carry_across_generations() {
        let mut first = Vec::new();
        {
            let mut hooks = Hooks::new(&[], &mut first);
            let counter = hooks.use_slot(|| Cell::new(0));
            counter.set(5);
        }

        let mut second = Vec::new();
        let mut hooks = Hooks::new(&first, &mut second);
        let counter = hooks.use_slot(|| Cell::new(0));
        assert_eq!(counter.get(), 5);
        assert_eq!(hooks.previous_len(), 1);
    }

    #[test]
    fn test_type_mismatch_reinitializes() {
        let mut first = Vec::new();
        Hooks::new(&[], &mut first).use_slot(|| 3i64);

        let mut second = Vec::new();
        let mut hooks = Hooks::new(&first, &mut second);
        let value = hooks.use_slot(|| String::from("fresh"));
        assert_eq!(value.as_str(), "fresh");
    }
}
