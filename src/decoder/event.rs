//! Completion events.

use std::cmp::Ordering;

use crate::model::MachineKey;

/// "Machine `key` finishes its current job at `time`."
///
/// Ordered by time, then stage, then machine. The stage tie-break decides
/// which of two simultaneous completions is processed first and therefore
/// changes schedules; the machine key only makes the order total.
#[derive(Debug, Clone, Copy)]
pub struct Event {
    pub time: f64,
    pub key: MachineKey,
}

impl Event {
    pub fn new(time: f64, key: MachineKey) -> Self {
        Self { time, key }
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then_with(|| self.key.cmp(&other.key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Reverse;
    use std::collections::BinaryHeap;

    #[test]
    fn test_earliest_first_then_lower_stage() {
        let mut heap = BinaryHeap::new();
        heap.push(Reverse(Event::new(6.0, MachineKey::new(2, 1))));
        heap.push(Reverse(Event::new(6.0, MachineKey::new(1, 2))));
        heap.push(Reverse(Event::new(2.0, MachineKey::new(3, 1))));
        heap.push(Reverse(Event::new(6.0, MachineKey::new(1, 1))));

        let order: Vec<(f64, usize, usize)> = std::iter::from_fn(|| heap.pop())
            .map(|Reverse(e)| (e.time, e.key.stage, e.key.machine))
            .collect();
        assert_eq!(
            order,
            vec![(2.0, 3, 1), (6.0, 1, 1), (6.0, 1, 2), (6.0, 2, 1)]
        );
    }
}
