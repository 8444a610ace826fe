//! # Fixed-Capacity History Buffer
//!
//! A circular store of fixed-point samples with windowed statistics.
//!
//! ## Storage Model
//! - **Fixed point**: values are kept as small integers (`i16`, `u16`, ...) at a
//!   caller-chosen multiplier, e.g. wind direction in milliradians (`× 1000`)
//! - **Pure overwrite**: once full, [`RingBuffer::add`] replaces the oldest slot
//! - **Sentinel**: the type's maximum value (`MAX_VAL`) marks a slot without a
//!   sample. It is skipped by every statistic and never leaves this module as a
//!   number: accessors return `None` instead
//!
//! ## Windows
//! Every statistic has a `*_of_last(n)` variant that looks at the newest `n`
//! slots only, so chart code never scans more than what it displays.
//!
//! ## Median Tie-Break
//! On an even number of valid samples the median is the mean of the two middle
//! values, so `[5, 6]` yields `5.5` regardless of insertion order.

use std::fmt::Debug;

use crate::ValueFormat;

/// Integer type that can live in a [`RingBuffer`].
pub trait BufferSample: Copy + PartialOrd + Debug {
    /// Lowest storable value
    const MIN_VAL: Self;
    /// Highest representable value, reserved as the "no sample" sentinel
    const MAX_VAL: Self;

    fn to_f64(self) -> f64;

    /// Round into this type; `None` if the value does not fit.
    fn from_f64(value: f64) -> Option<Self>;
}

macro_rules! impl_buffer_sample {
    ($($t:ty),*) => {
        $(
            impl BufferSample for $t {
                const MIN_VAL: Self = <$t>::MIN;
                const MAX_VAL: Self = <$t>::MAX;

                fn to_f64(self) -> f64 {
                    self as f64
                }

                fn from_f64(value: f64) -> Option<Self> {
                    let rounded = value.round();
                    (rounded >= Self::MIN_VAL as f64 && rounded <= Self::MAX_VAL as f64)
                        .then(|| rounded as $t)
                }
            }
        )*
    };
}

impl_buffer_sample!(i16, u16, i32, u32);

/// Semantic description attached to a buffer.
///
/// `min` and `max` are the accepted domain in SI units; the fixed-point image of
/// `max` must stay below the sentinel.
#[derive(Clone, Debug, PartialEq)]
pub struct BufferMeta {
    /// Boat data name, e.g. `"TWD"`
    pub name: String,
    /// Format of the stored quantity
    pub format: ValueFormat,
    /// Expected update interval in milliseconds
    pub update_ms: u32,
    /// Fixed-point multiplier: stored = round(SI × multiplier)
    pub multiplier: f64,
    /// Smallest accepted SI value
    pub min: f64,
    /// Largest accepted SI value
    pub max: f64,
}

impl Default for BufferMeta {
    fn default() -> Self {
        Self {
            name: String::new(),
            format: ValueFormat::Other(String::new()),
            update_ms: 1000,
            multiplier: 1.0,
            min: f64::MIN,
            max: f64::MAX,
        }
    }
}

/// Fixed-capacity circular buffer of fixed-point samples.
///
/// # Example
/// ```
/// use boatdata_lib::ring_buffer::RingBuffer;
///
/// let mut buf = RingBuffer::<u16>::new(3);
/// for v in [1, 2, 3, 4] {
///     buf.add(v);
/// }
/// assert_eq!(buf.values(), vec![Some(2), Some(3), Some(4)]);
/// assert_eq!(buf.min(), Some(2));
/// ```
#[derive(Clone, Debug)]
pub struct RingBuffer<T: BufferSample> {
    buffer: Vec<T>,
    capacity: usize,
    /// Next slot to write
    head: usize,
    /// Number of occupied slots
    count: usize,
    /// Samples added since creation or the last clear
    total_added: u64,
    meta: BufferMeta,
}

impl<T: BufferSample> RingBuffer<T> {
    /// Create an empty buffer; a capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        Self::with_meta(capacity, BufferMeta::default())
    }

    pub fn with_meta(capacity: usize, meta: BufferMeta) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: vec![T::MAX_VAL; capacity],
            capacity,
            head: 0,
            count: 0,
            total_added: 0,
            meta,
        }
    }

    pub fn set_meta(&mut self, meta: BufferMeta) {
        self.meta = meta;
    }

    pub fn meta(&self) -> &BufferMeta {
        &self.meta
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn format(&self) -> &ValueFormat {
        &self.meta.format
    }

    /// Append a raw fixed-point sample, overwriting the oldest one when full.
    ///
    /// `T::MAX_VAL` may be added on purpose to mark a slot without data.
    pub fn add(&mut self, value: T) {
        self.buffer[self.head] = value;
        self.head = (self.head + 1) % self.capacity;
        if self.count < self.capacity {
            self.count += 1;
        }
        self.total_added += 1;
    }

    /// Append an explicit "no sample" slot.
    pub fn add_missing(&mut self) {
        self.add(T::MAX_VAL);
    }

    /// Convert an SI value to fixed point and append it.
    ///
    /// Returns false, leaving the buffer untouched, if the value is outside the
    /// domain in [`BufferMeta`] or not representable in `T`.
    pub fn add_si(&mut self, value: f64) -> bool {
        if !value.is_finite() || value < self.meta.min || value > self.meta.max {
            tracing::debug!(buffer = %self.meta.name, value, "sample outside domain dropped");
            return false;
        }
        match T::from_f64(value * self.meta.multiplier) {
            Some(raw) if raw != T::MAX_VAL => {
                self.add(raw);
                true
            }
            _ => {
                tracing::debug!(buffer = %self.meta.name, value, "sample not representable");
                false
            }
        }
    }

    /// Physical slot of the logical index (0 = oldest).
    fn slot(&self, index: usize) -> usize {
        let first = if self.count < self.capacity { 0 } else { self.head };
        (first + index) % self.capacity
    }

    fn is_sample(value: T) -> bool {
        value != T::MAX_VAL
    }

    /// Stored sample at logical `index` (0 = oldest).
    ///
    /// `None` if the index is out of range or the slot holds no sample.
    pub fn get(&self, index: usize) -> Option<T> {
        if index >= self.count {
            return None;
        }
        let value = self.buffer[self.slot(index)];
        Self::is_sample(value).then_some(value)
    }

    /// Sample at logical `index` converted to SI.
    pub fn get_si(&self, index: usize) -> Option<f64> {
        self.get(index).map(|v| self.to_si(v.to_f64()))
    }

    /// Oldest sample.
    pub fn first(&self) -> Option<T> {
        self.get(0)
    }

    /// Newest sample.
    pub fn last(&self) -> Option<T> {
        self.count.checked_sub(1).and_then(|i| self.get(i))
    }

    /// Physical slot of the oldest element.
    pub fn first_idx(&self) -> Option<usize> {
        (self.count > 0).then(|| self.slot(0))
    }

    /// Physical slot of the newest element.
    pub fn last_idx(&self) -> Option<usize> {
        (self.count > 0).then(|| (self.head + self.capacity - 1) % self.capacity)
    }

    /// Valid samples among the newest `amount` slots, oldest first.
    fn window(&self, amount: usize) -> impl Iterator<Item = T> + '_ {
        let amount = amount.min(self.count);
        (self.count - amount..self.count)
            .map(move |i| self.buffer[self.slot(i)])
            .filter(|&v| Self::is_sample(v))
    }

    /// Lowest sample of the newest `amount` slots.
    pub fn min_of_last(&self, amount: usize) -> Option<T> {
        self.window(amount)
            .fold(None, |acc, v| match acc {
                Some(m) if m <= v => Some(m),
                _ => Some(v),
            })
    }

    /// Highest sample of the newest `amount` slots.
    pub fn max_of_last(&self, amount: usize) -> Option<T> {
        self.window(amount)
            .fold(None, |acc, v| match acc {
                Some(m) if m >= v => Some(m),
                _ => Some(v),
            })
    }

    /// Midpoint between min and max of the newest `amount` slots, in raw units.
    pub fn mid_of_last(&self, amount: usize) -> Option<f64> {
        let min = self.min_of_last(amount)?.to_f64();
        let max = self.max_of_last(amount)?.to_f64();
        Some((min + max) / 2.0)
    }

    /// Median of the newest `amount` slots, in raw units.
    ///
    /// Even-sized windows average the two middle values.
    pub fn median_of_last(&self, amount: usize) -> Option<f64> {
        let mut values: Vec<f64> = self.window(amount).map(BufferSample::to_f64).collect();
        if values.is_empty() {
            return None;
        }
        values.sort_by(|a, b| a.total_cmp(b));
        let mid = values.len() / 2;
        if values.len() % 2 == 0 {
            Some((values[mid - 1] + values[mid]) / 2.0)
        } else {
            Some(values[mid])
        }
    }

    pub fn min(&self) -> Option<T> {
        self.min_of_last(self.count)
    }

    pub fn max(&self) -> Option<T> {
        self.max_of_last(self.count)
    }

    pub fn mid(&self) -> Option<f64> {
        self.mid_of_last(self.count)
    }

    pub fn median(&self) -> Option<f64> {
        self.median_of_last(self.count)
    }

    /// Convert a raw fixed-point number into SI using the buffer multiplier.
    pub fn to_si(&self, raw: f64) -> f64 {
        raw / self.meta.multiplier
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of occupied slots, sentinels included.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == self.capacity
    }

    /// Samples added since creation or the last [`clear`](Self::clear).
    pub fn total_added(&self) -> u64 {
        self.total_added
    }

    /// Lowest value the buffer type can store.
    pub fn min_val(&self) -> T {
        T::MIN_VAL
    }

    /// The "no sample" sentinel.
    pub fn max_val(&self) -> T {
        T::MAX_VAL
    }

    pub fn clear(&mut self) {
        self.buffer.iter_mut().for_each(|v| *v = T::MAX_VAL);
        self.head = 0;
        self.count = 0;
        self.total_added = 0;
    }

    /// Drop all samples and change the capacity.
    pub fn resize(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.buffer = vec![T::MAX_VAL; self.capacity];
        self.head = 0;
        self.count = 0;
        self.total_added = 0;
    }

    /// All slots from oldest to newest; `None` marks slots without a sample.
    pub fn values(&self) -> Vec<Option<T>> {
        self.values_of_last(self.count)
    }

    /// The newest `amount` slots from oldest to newest.
    pub fn values_of_last(&self, amount: usize) -> Vec<Option<T>> {
        let amount = amount.min(self.count);
        (self.count - amount..self.count).map(|i| self.get(i)).collect()
    }
}
