//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for buses and dispatch queues.
//!
//! Config is used in two ways:
//! 1. **Bus creation**: `Bus::with_config(&config)`
//! 2. **Queue creation**: `SerialQueue::with_config(name, &config)`
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1
//! - `queue_capacity = 0` → clamped to 1

/// Global configuration for buses and dispatch queues.
///
/// ## Field semantics
/// - `bus_capacity`: ring buffer size of the bus broadcast tap (min 1)
/// - `queue_capacity`: bound of a [`SerialQueue`](crate::SerialQueue) (min 1)
///
/// ## Notes
/// All fields are public for flexibility. Prefer using helper accessors to avoid
/// sprinkling clamping checks across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the bus broadcast tap ring buffer.
    ///
    /// Only async consumers of [`Bus::subscribe`](crate::Bus::subscribe) are affected:
    /// receivers that lag behind more than `bus_capacity` notifications observe
    /// `Lagged` and skip older items. Synchronous observers are never lagged.
    pub bus_capacity: usize,

    /// Maximum number of pending jobs in a serial dispatch queue.
    ///
    /// When full, further jobs are rejected with
    /// [`DispatchError::Full`](crate::DispatchError::Full) and dropped.
    pub queue_capacity: usize,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns a queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn queue_capacity_clamped(&self) -> usize {
        self.queue_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `queue_capacity = 1024`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            queue_capacity: 1024,
        }
    }
}
