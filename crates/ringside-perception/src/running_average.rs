//! Fixed-capacity running-average filter.
//!
//! Values are written into a ring buffer; once it is full every new value
//! overwrites the oldest one.  A running sum is maintained incrementally so
//! both [`RunningAverage::add_value`] and [`RunningAverage::average`] are
//! O(1).
//!
//! # Example
//!
//! ```rust
//! use ringside_perception::RunningAverage;
//!
//! let mut avg = RunningAverage::<i32>::new(3);
//! avg.add_value(3);
//! avg.add_value(6);
//! assert_eq!(avg.average(), 4);
//!
//! avg.add_value(9);
//! avg.add_value(12); // evicts 3
//! assert_eq!(avg.average(), 9);
//! ```

use std::ops::{Add, Div, Sub};

/// Numeric types a [`RunningAverage`] can hold.
///
/// `Default` must be the type's zero.
pub trait Averageable:
    Copy + Default + Add<Output = Self> + Sub<Output = Self> + Div<Output = Self>
{
    /// Convert an element count into `Self` for the final division.
    fn from_count(count: usize) -> Self;
}

macro_rules! impl_averageable {
    ($($t:ty),*) => {
        $(
            impl Averageable for $t {
                fn from_count(count: usize) -> Self {
                    count as $t
                }
            }
        )*
    };
}

impl_averageable!(i16, i32, i64, f32, f64);

/// Circular-buffer mean filter with a capacity fixed at construction.
///
/// Invariants: `sum` equals the sum of the occupied slots, and
/// `count <= capacity`.
#[derive(Debug, Clone)]
pub struct RunningAverage<T> {
    ring: Vec<T>,
    count: usize,
    write_index: usize,
    sum: T,
}

impl<T: Averageable> RunningAverage<T> {
    /// Create an empty filter holding at most `capacity` values.
    ///
    /// A `capacity` of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: vec![T::default(); capacity.max(1)],
            count: 0,
            write_index: 0,
            sum: T::default(),
        }
    }

    /// Add `value`, evicting the oldest value once the buffer is full.
    pub fn add_value(&mut self, value: T) {
        let slot = &mut self.ring[self.write_index];
        self.sum = self.sum - *slot + value;
        *slot = value;

        self.write_index = (self.write_index + 1) % self.ring.len();
        if self.count < self.ring.len() {
            self.count += 1;
        }
    }

    /// Mean of the stored values, or zero when empty.
    pub fn average(&self) -> T {
        if self.count == 0 {
            return T::default();
        }
        self.sum / T::from_count(self.count)
    }

    /// Empty the filter and zero every slot.
    pub fn clear(&mut self) {
        self.ring.fill(T::default());
        self.count = 0;
        self.write_index = 0;
        self.sum = T::default();
    }

    /// Clear, then add `value` exactly `times` times.
    ///
    /// Useful to pre-seed the history and avoid start-up transients.
    pub fn fill_value(&mut self, value: T, times: usize) {
        self.clear();
        for _ in 0..times {
            self.add_value(value);
        }
    }

    /// The `index`-th slot of the ring (storage order, not insertion order).
    pub fn get(&self, index: usize) -> Option<T> {
        if index < self.count {
            self.ring.get(index).copied()
        } else {
            None
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn capacity(&self) -> usize {
        self.ring.len()
    }

    pub fn sum(&self) -> T {
        self.sum
    }
}
