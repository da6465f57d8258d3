/// Rolling statistics for the viewer graphs.

/// Ring buffer that stores the last N samples of a metric.
pub struct RingBuffer {
    data: Vec<f32>,
    head: usize,
    len: usize,
    capacity: usize,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: vec![0.0; capacity],
            head: 0,
            len: 0,
            capacity,
        }
    }

    pub fn push(&mut self, value: f32) {
        self.data[self.head] = value;
        self.head = (self.head + 1) % self.capacity;
        if self.len < self.capacity {
            self.len += 1;
        }
    }

    /// Return samples in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        let start = if self.len < self.capacity {
            0
        } else {
            self.head
        };
        (0..self.len).map(move |i| self.data[(start + i) % self.capacity])
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn last(&self) -> Option<f32> {
        if self.len == 0 {
            None
        } else {
            let idx = (self.head + self.capacity - 1) % self.capacity;
            Some(self.data[idx])
        }
    }

    pub fn max(&self) -> Option<f32> {
        self.iter().reduce(f32::max)
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}

/// Survivor curve of the current generation plus per-generation fitness history.
pub struct RunStats {
    pub alive: RingBuffer,
    pub best_fitness: RingBuffer,
    pub mean_fitness: RingBuffer,
    pub generations: u64,
}

impl RunStats {
    pub fn new(tick_capacity: usize, generation_capacity: usize) -> Self {
        Self {
            alive: RingBuffer::new(tick_capacity),
            best_fitness: RingBuffer::new(generation_capacity),
            mean_fitness: RingBuffer::new(generation_capacity),
            generations: 0,
        }
    }

    pub fn record_tick(&mut self, alive: usize) {
        self.alive.push(alive as f32);
    }

    /// Close out a generation and start a fresh survivor curve.
    pub fn record_generation(&mut self, fitness: &[(usize, f32)]) {
        let best = fitness.iter().map(|(_, f)| *f).fold(0.0f32, f32::max);
        let mean = if fitness.is_empty() {
            0.0
        } else {
            fitness.iter().map(|(_, f)| *f).sum::<f32>() / fitness.len() as f32
        };
        self.best_fitness.push(best);
        self.mean_fitness.push(mean);
        self.generations += 1;
        self.alive.clear();
    }
}
