//! Post-synaptic event history
//!
//! For each post-neuron, a fixed-depth ring of `(tick, trace)` samples
//! recorded when the neuron fired, ordered by tick. The plastic kernel
//! replays the slice of this history that falls inside its deferred-update
//! window, so the ring offers a cursor that walks events in ascending tick
//! order while tracking the sample immediately preceding the window, the
//! anchor the nearest-neighbour rules difference against.

use synfire_storage::Tick;

/// Per-neuron bounded rings of post-spike samples
#[derive(Debug)]
pub struct PostEventHistory<T> {
    depth: usize,
    times: Vec<Tick>,
    traces: Vec<T>,
    heads: Vec<usize>,
    counts: Vec<usize>,
}

impl<T: Copy + Default> PostEventHistory<T> {
    /// Allocate rings of `depth` samples for `num_neurons` neurons
    pub fn new(num_neurons: usize, depth: usize) -> Self {
        assert!(depth > 0);
        Self {
            depth,
            times: vec![0; num_neurons * depth],
            traces: vec![T::default(); num_neurons * depth],
            heads: vec![0; num_neurons],
            counts: vec![0; num_neurons],
        }
    }

    /// Number of neurons tracked
    pub fn num_neurons(&self) -> usize {
        self.heads.len()
    }

    /// Samples retained per neuron
    pub fn depth(&self) -> usize {
        self.depth
    }

    fn entry(&self, neuron: usize, logical: usize) -> (Tick, T) {
        let phys = neuron * self.depth + (self.heads[neuron] + logical) % self.depth;
        (self.times[phys], self.traces[phys])
    }

    /// Append a sample, evicting the oldest when the ring is full
    ///
    /// Ticks must be non-decreasing per neuron.
    pub fn add(&mut self, neuron: usize, tick: Tick, trace: T) {
        debug_assert!(tick >= self.last_time(neuron));
        let (head, count) = (self.heads[neuron], self.counts[neuron]);
        let slot = if count < self.depth {
            self.counts[neuron] = count + 1;
            (head + count) % self.depth
        } else {
            self.heads[neuron] = (head + 1) % self.depth;
            head
        };
        let phys = neuron * self.depth + slot;
        self.times[phys] = tick;
        self.traces[phys] = trace;
    }

    /// Tick of the most recent sample, or 0 when none exists
    pub fn last_time(&self, neuron: usize) -> Tick {
        match self.counts[neuron] {
            0 => 0,
            count => self.entry(neuron, count - 1).0,
        }
    }

    /// Trace of the most recent sample, or the default when none exists
    pub fn last_trace(&self, neuron: usize) -> T {
        match self.counts[neuron] {
            0 => T::default(),
            count => self.entry(neuron, count - 1).1,
        }
    }

    /// Cursor over the samples with `begin <= tick < end`
    pub fn window(&self, neuron: usize, begin: Tick, end: Tick) -> PostEventWindow<'_, T> {
        let count = self.counts[neuron];
        let mut first = 0;
        while first < count && self.entry(neuron, first).0 < begin {
            first += 1;
        }
        let mut last = first;
        while last < count && self.entry(neuron, last).0 < end {
            last += 1;
        }
        let (prev_time, prev_trace) = if first > 0 {
            self.entry(neuron, first - 1)
        } else {
            (0, T::default())
        };
        PostEventWindow {
            history: self,
            neuron,
            next: first,
            remaining: last - first,
            prev_time,
            prev_trace,
        }
    }
}

/// Cursor over one neuron's in-window post events
#[derive(Debug)]
pub struct PostEventWindow<'a, T> {
    history: &'a PostEventHistory<T>,
    neuron: usize,
    next: usize,
    remaining: usize,
    prev_time: Tick,
    prev_trace: T,
}

impl<T: Copy + Default> PostEventWindow<'_, T> {
    /// Events not yet consumed
    pub fn num_events(&self) -> usize {
        self.remaining
    }

    /// Tick of the next event; only valid while `num_events() > 0`
    pub fn next_time(&self) -> Tick {
        debug_assert!(self.remaining > 0);
        self.history.entry(self.neuron, self.next).0
    }

    /// Trace of the next event; only valid while `num_events() > 0`
    pub fn next_trace(&self) -> T {
        debug_assert!(self.remaining > 0);
        self.history.entry(self.neuron, self.next).1
    }

    /// Tick of the sample immediately older than the cursor position
    pub fn prev_time(&self) -> Tick {
        self.prev_time
    }

    /// Trace of the sample immediately older than the cursor position
    pub fn prev_trace(&self) -> T {
        self.prev_trace
    }

    /// Consume the next event, installing it as the new prev
    ///
    /// `new_prev_time` is the consumed event's tick as seen through the
    /// synapse's dendritic delay, so later neighbourhood calculations
    /// difference against the delayed time.
    pub fn advance(&mut self, new_prev_time: Tick) {
        debug_assert!(self.remaining > 0);
        self.prev_trace = self.history.entry(self.neuron, self.next).1;
        self.prev_time = new_prev_time;
        self.next += 1;
        self.remaining -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_with(times: &[Tick]) -> PostEventHistory<u16> {
        let mut history = PostEventHistory::new(1, 8);
        for (i, &t) in times.iter().enumerate() {
            history.add(0, t, i as u16 + 1);
        }
        history
    }

    #[test]
    fn test_last_entry() {
        let history = history_with(&[3, 7, 12]);
        assert_eq!(history.last_time(0), 12);
        assert_eq!(history.last_trace(0), 3);
    }

    #[test]
    fn test_empty_sentinels() {
        let history: PostEventHistory<u16> = PostEventHistory::new(2, 4);
        assert_eq!(history.last_time(1), 0);
        assert_eq!(history.last_trace(1), 0);
        let window = history.window(1, 0, 100);
        assert_eq!(window.num_events(), 0);
        assert_eq!(window.prev_time(), 0);
    }

    #[test]
    fn test_window_bounds_half_open() {
        let history = history_with(&[3, 7, 12, 20]);
        let window = history.window(0, 7, 20);
        assert_eq!(window.num_events(), 2);
        assert_eq!(window.next_time(), 7);
        assert_eq!(window.prev_time(), 3);
        assert_eq!(window.prev_trace(), 1);
    }

    #[test]
    fn test_window_walk() {
        let history = history_with(&[3, 7, 12]);
        let mut window = history.window(0, 0, 100);
        assert_eq!(window.num_events(), 3);
        assert_eq!(window.prev_time(), 0);

        assert_eq!(window.next_time(), 3);
        window.advance(4); // delayed by 1
        assert_eq!(window.prev_time(), 4);
        assert_eq!(window.prev_trace(), 1);

        assert_eq!(window.next_time(), 7);
        window.advance(8);
        assert_eq!(window.next_time(), 12);
        window.advance(13);
        assert_eq!(window.num_events(), 0);
        assert_eq!(window.prev_trace(), 3);
    }

    #[test]
    fn test_eviction_keeps_newest() {
        let mut history = PostEventHistory::new(1, 4);
        for t in 1..=10u32 {
            history.add(0, t, t as u16);
        }
        // Only ticks 7..=10 remain
        let window = history.window(0, 0, 100);
        assert_eq!(window.num_events(), 4);
        assert_eq!(window.next_time(), 7);
        assert_eq!(history.last_time(0), 10);
    }

    #[test]
    fn test_window_of_evicted_range_is_empty() {
        let mut history = PostEventHistory::new(1, 2);
        for t in [5, 10, 15, 20] {
            history.add(0, t, 0u16);
        }
        let window = history.window(0, 0, 12);
        // Tick 15 is the oldest survivor; 5 and 10 are gone
        assert_eq!(window.num_events(), 0);
    }

    #[test]
    fn test_duplicate_ticks_allowed() {
        let history = history_with(&[5, 5, 5]);
        let window = history.window(0, 5, 6);
        assert_eq!(window.num_events(), 3);
    }
}
