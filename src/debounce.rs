//! Edge detection for polled key state
//!
//! Turns a continuously resampled "is this key down" reading into a single
//! event per press. There is no notion of time, only the previous sample.

use std::collections::HashMap;
use std::hash::Hash;

/// Per-key latch table
#[derive(Debug, Clone)]
pub struct KeyDebouncer<K> {
    latched: HashMap<K, bool>,
}

impl<K: Eq + Hash + Copy> KeyDebouncer<K> {
    pub fn new() -> Self {
        Self {
            latched: HashMap::new(),
        }
    }

    /// Start with every key in `keys` released
    pub fn with_keys(keys: impl IntoIterator<Item = K>) -> Self {
        Self {
            latched: keys.into_iter().map(|k| (k, false)).collect(),
        }
    }

    /// Feed one reading for `key`; true only on a released-to-pressed edge
    pub fn sample(&mut self, key: K, pressed: bool) -> bool {
        let latched = self.latched.entry(key).or_insert(false);
        let fired = pressed && !*latched;
        *latched = pressed;
        fired
    }

    pub fn is_latched(&self, key: K) -> bool {
        self.latched.get(&key).copied().unwrap_or(false)
    }

    /// Record a reading without reporting an edge.
    ///
    /// Used when polling starts so a key still held from before does not fire.
    pub fn prime(&mut self, key: K, pressed: bool) {
        self.latched.insert(key, pressed);
    }
}

impl<K: Eq + Hash + Copy> Default for KeyDebouncer<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_per_press() {
        let mut debouncer = KeyDebouncer::with_keys(['d', 'e']);
        let samples = [false, true, true, true, false, false, true, false, true, true];
        let fired: Vec<bool> = samples.iter().map(|&p| debouncer.sample('d', p)).collect();

        assert_eq!(
            fired,
            vec![false, true, false, false, false, false, true, false, true, false]
        );
    }

    #[test]
    fn test_fires_exactly_once_per_run_of_presses() {
        // Deterministic pseudo-random sequence
        let mut seed: u32 = 0x2545_f491;
        let mut debouncer = KeyDebouncer::new();
        let mut previous = false;
        let mut runs = 0;
        let mut fires = 0;

        for _ in 0..10_000 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let pressed = seed % 3 == 0;

            if pressed && !previous {
                runs += 1;
            }
            if debouncer.sample(0x44u16, pressed) {
                fires += 1;
                assert!(pressed);
            }
            assert_eq!(debouncer.is_latched(0x44), pressed);
            previous = pressed;
        }

        assert!(runs > 0);
        assert_eq!(runs, fires);
    }

    #[test]
    fn test_never_fires_on_release() {
        let mut debouncer = KeyDebouncer::new();
        assert!(debouncer.sample('q', true));
        assert!(!debouncer.sample('q', false));
        assert!(!debouncer.sample('q', false));
    }

    #[test]
    fn test_keys_are_independent() {
        let mut debouncer = KeyDebouncer::new();
        assert!(debouncer.sample('d', true));
        assert!(debouncer.sample('e', true));
        assert!(!debouncer.sample('d', true));
        assert!(!debouncer.sample('e', true));
        assert!(!debouncer.is_latched('l'));
    }

    #[test]
    fn test_primed_key_waits_for_release() {
        let mut debouncer = KeyDebouncer::new();
        debouncer.prime('t', true);
        assert!(!debouncer.sample('t', true));
        assert!(!debouncer.sample('t', false));
        assert!(debouncer.sample('t', true));
    }
}
