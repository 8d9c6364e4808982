// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Slot allocator with id reuse.
//!
//! [`SlotPool`] hands out `u32` slot ids for stored values. Freed ids go to a
//! min-heap and the smallest one is handed out again by the next
//! [`allocate`](SlotPool::allocate), so ids stay dense. Operations on ids that
//! are not live are absorbed: [`get`](SlotPool::get) returns `None` and
//! [`free`](SlotPool::free) does nothing.
//!
//! Reuse costs O(log f) in the number of freed ids `f` rather than the O(1)
//! of a LIFO stack. The heap makes the reuse order independent of the order
//! ids were freed in, which keeps handles handed to the host reproducible
//! across runs. Lookups and stores stay O(1).

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Storage for values addressed by reusable integer ids.
#[derive(Clone, Debug)]
pub struct SlotPool<T> {
    slots: Vec<Option<T>>,
    free_list: BinaryHeap<Reverse<u32>>,
    live: usize,
}

impl<T> Default for SlotPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SlotPool<T> {
    /// Creates an empty pool.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: BinaryHeap::new(),
            live: 0,
        }
    }

    /// Stores `value` and returns its id.
    ///
    /// Reuses the smallest freed id if there is one, otherwise appends a new
    /// slot.
    pub fn allocate(&mut self, value: T) -> u32 {
        self.allocate_with(|_| value)
    }

    /// Like [`allocate`](Self::allocate), but builds the value from the id it
    /// is about to occupy.
    pub fn allocate_with(&mut self, make: impl FnOnce(u32) -> T) -> u32 {
        let id = if let Some(Reverse(id)) = self.free_list.pop() {
            id
        } else {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "slot counts beyond u32::MAX are not supported"
            )]
            let id = self.slots.len() as u32;
            self.slots.push(None);
            id
        };
        self.slots[id as usize] = Some(make(id));
        self.live += 1;
        id
    }

    /// Returns the value stored under `id`, if live.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&T> {
        self.slots.get(id as usize)?.as_ref()
    }

    /// Returns a mutable reference to the value stored under `id`, if live.
    #[must_use]
    pub fn get_mut(&mut self, id: u32) -> Option<&mut T> {
        self.slots.get_mut(id as usize)?.as_mut()
    }

    /// Returns whether `id` currently holds a value.
    #[must_use]
    pub fn contains(&self, id: u32) -> bool {
        self.get(id).is_some()
    }

    /// Removes the value under `id` and makes the id available for reuse.
    ///
    /// Returns the removed value, or `None` if `id` was not live.
    pub fn free(&mut self, id: u32) -> Option<T> {
        let value = self.slots.get_mut(id as usize)?.take()?;
        self.free_list.push(Reverse(id));
        self.live -= 1;
        Some(value)
    }

    /// Number of live values.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if no value is live.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Iterates over live `(id, value)` pairs in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "slot indices were issued as u32"
            )]
            let id = idx as u32;
            slot.as_ref().map(|value| (id, value))
        })
    }

    /// Collects the live ids in ascending order.
    ///
    /// Useful when the pool is mutated while walking its contents.
    #[must_use]
    pub fn ids(&self) -> Vec<u32> {
        self.iter().map(|(id, _)| id).collect()
    }
}
