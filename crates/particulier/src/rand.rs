//! Lightweight xorshift32 PRNG for emitter sampling

/// Source of uniform samples for emitters.
///
/// Implementations must return values in `[0, 1)`.
pub trait ParticleRandom {
    fn next_f32(&mut self) -> f32;

    /// Returns `min + u * (max - min)`; a reversed range stays uniform.
    fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }
}

/// Seedable xorshift32 generator
#[derive(Debug, Clone)]
pub struct ParticleRng {
    state: u32,
}

impl ParticleRng {
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }
}

impl Default for ParticleRng {
    fn default() -> Self {
        Self::new(0xDEAD_BEEF)
    }
}

impl ParticleRandom for ParticleRng {
    fn next_f32(&mut self) -> f32 {
        // Top 24 bits fit the f32 mantissa exactly, so 1.0 is never produced
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rng_unit_interval() {
        let mut rng = ParticleRng::new(7);
        for _ in 0..10_000 {
            let v = rng.next_f32();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn rng_range_bounds() {
        let mut rng = ParticleRng::new(42);
        for _ in 0..1000 {
            let v = rng.range(0.0, 10.0);
            assert!(v >= 0.0 && v < 10.0);
        }
    }

    #[test]
    fn rng_reversed_range() {
        let mut rng = ParticleRng::new(3);
        for _ in 0..1000 {
            let v = rng.range(5.0, -5.0);
            assert!(v > -5.0 && v <= 5.0);
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = ParticleRng::new(99);
        let mut b = ParticleRng::new(99);
        for _ in 0..100 {
            assert_eq!(a.next_f32(), b.next_f32());
        }
        assert_ne!(ParticleRng::new(0).next_f32(), 0.0);
    }
}
