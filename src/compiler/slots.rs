//! Persistent storage slot assignment

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Slot range owned by one storage declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRange {
    /// First slot
    pub base: usize,
    /// Number of consecutive slots
    pub field_count: usize,
}

impl SlotRange {
    /// One past the last slot
    pub fn end(&self) -> usize {
        self.base + self.field_count
    }
}

/// Append-only slot allocator
///
/// Ranges are handed out in declaration order and never reused. Allocating a
/// name twice returns the existing range.
#[derive(Debug, Clone, Default)]
pub struct SlotManager {
    order: Vec<String>,
    ranges: HashMap<String, SlotRange>,
    next: usize,
}

impl SlotManager {
    /// Creates an allocator starting at slot 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates `max(1, field_count)` slots for `name`, returning the base
    pub fn allocate(&mut self, name: &str, field_count: usize) -> usize {
        if let Some(existing) = self.ranges.get(name) {
            return existing.base;
        }
        let range = SlotRange {
            base: self.next,
            field_count: field_count.max(1),
        };
        self.next = range.end();
        self.order.push(name.to_string());
        self.ranges.insert(name.to_string(), range);
        range.base
    }

    /// Range assigned to `name`
    pub fn get(&self, name: &str) -> Option<SlotRange> {
        self.ranges.get(name).copied()
    }

    /// Next free slot
    pub fn next_slot(&self) -> usize {
        self.next
    }

    /// Names and ranges in allocation order
    pub fn entries(&self) -> impl Iterator<Item = (&str, SlotRange)> + '_ {
        self.order
            .iter()
            .map(move |name| (name.as_str(), self.ranges[name]))
    }

    /// Takes over a parent's ranges so the child continues after them
    pub fn absorb(&mut self, parent: &SlotManager) {
        for (name, range) in parent.entries() {
            if !self.ranges.contains_key(name) {
                self.order.push(name.to_string());
                self.ranges.insert(name.to_string(), range);
            }
        }
        self.next = self.next.max(parent.next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges_follow_declaration_order() {
        let mut slots = SlotManager::new();
        assert_eq!(slots.allocate("balances", 1), 0);
        assert_eq!(slots.allocate("position", 3), 1);
        assert_eq!(slots.allocate("totalSupply", 0), 4);
        assert_eq!(slots.next_slot(), 5);
        assert_eq!(
            slots.get("position"),
            Some(SlotRange {
                base: 1,
                field_count: 3
            })
        );
    }

    #[test]
    fn test_reallocation_is_stable() {
        let mut slots = SlotManager::new();
        slots.allocate("a", 1);
        assert_eq!(slots.allocate("a", 5), 0);
        assert_eq!(slots.next_slot(), 1);
    }

    #[test]
    fn test_absorb_continues_after_parent() {
        let mut parent = SlotManager::new();
        parent.allocate("owner", 1);
        parent.allocate("limits", 4);

        let mut child = SlotManager::new();
        child.absorb(&parent);
        assert_eq!(child.allocate("count", 1), 5);
        let names: Vec<&str> = child.entries().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["owner", "limits", "count"]);
    }
}
