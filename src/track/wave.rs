//! Procedural speed wave
//!
//! Speed oscillates around the desired average along a chain of random
//! slopes. Each slope lasts a random number of seconds and is blended into the
//! next one with a cubic smoothstep, so the curve has no jumps at cycle
//! boundaries. Most slopes are drawn from the gentle "common" options; with a
//! small probability a steeper "rare" slope is picked instead.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Options for generating one kind of slope
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlopeOptions {
    /// Absolute bound of the slope tangent; slopes are drawn from (-slope, slope)
    pub slope: f64,
    /// Speed amplitude in km/h applied while this kind of slope is active
    pub amplitude: f64,
    /// Shortest slope in seconds
    pub min_period: u32,
    /// Longest slope in seconds
    pub max_period: u32,
}

/// Which options produced the current slope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlopeKind {
    Common,
    Rare,
}

/// Smoothstep-blended random slope generator
#[derive(Debug, Clone)]
pub struct SpeedWave {
    common: SlopeOptions,
    rare: SlopeOptions,
    rare_chance: f64,
    average: f64,
    period: u32,
    index: u32,
    prev_slope: f64,
    cur_slope: f64,
    kind: SlopeKind,
}

impl SpeedWave {
    /// Create a wave around `average` km/h
    ///
    /// The first call to [`SpeedWave::next_speed`] starts the first cycle.
    pub fn new(common: SlopeOptions, rare: SlopeOptions, rare_chance: f64, average: f64) -> Self {
        Self {
            common,
            rare,
            rare_chance: rare_chance.clamp(0.0, 0.5),
            average,
            period: 0,
            index: 0,
            prev_slope: 0.0,
            cur_slope: 0.0,
            kind: SlopeKind::Common,
        }
    }

    pub fn average(&self) -> f64 {
        self.average
    }

    pub fn kind(&self) -> SlopeKind {
        self.kind
    }

    /// Amplitude of the slope kind currently active
    pub fn amplitude(&self) -> f64 {
        match self.kind {
            SlopeKind::Common => self.common.amplitude,
            SlopeKind::Rare => self.rare.amplitude,
        }
    }

    /// Largest deviation from the average the wave can ever produce
    pub fn max_amplitude(&self) -> f64 {
        self.common.amplitude.max(self.rare.amplitude)
    }

    fn draw_kind<R: Rng>(&self, rng: &mut R) -> SlopeKind {
        if rng.gen::<f64>() < self.rare_chance {
            SlopeKind::Rare
        } else {
            SlopeKind::Common
        }
    }

    fn draw_slope<R: Rng>(&self, rng: &mut R) -> f64 {
        let common = self.common.slope;
        match self.kind {
            SlopeKind::Common => rng.gen_range(-common..=common),
            SlopeKind::Rare => {
                // rare slopes start at the common bound and extend by the rare excess
                let excess = (self.rare.slope - common).max(0.0);
                let extra = rng.gen_range(-excess..=excess);
                if extra <= 0.0 {
                    -common + extra
                } else {
                    common + extra
                }
            }
        }
    }

    fn draw_period<R: Rng>(&self, rng: &mut R) -> u32 {
        let options = match self.kind {
            SlopeKind::Common => &self.common,
            SlopeKind::Rare => &self.rare,
        };
        let (min, max) = (options.min_period.max(1), options.max_period.max(1));
        if min >= max {
            return min;
        }
        rng.gen_range(min..=max)
    }

    fn next_cycle<R: Rng>(&mut self, rng: &mut R) {
        self.prev_slope = self.cur_slope;
        self.index = 0;

        self.kind = self.draw_kind(rng);
        self.cur_slope = self.draw_slope(rng);
        self.period = self.draw_period(rng);
    }

    /// Speed in km/h for the next second
    pub fn next_speed<R: Rng>(&mut self, rng: &mut R) -> f64 {
        if self.index >= self.period {
            self.next_cycle(rng);
        }

        let fraction = self.index as f64 / self.period as f64;
        let lo = self.prev_slope * fraction;
        let hi = -self.cur_slope * (1.0 - fraction);
        let curve = fraction * fraction * (3.0 - 2.0 * fraction);
        let blend = lo * (1.0 - curve) + hi * curve;

        self.index += 1;
        self.average + blend * self.amplitude()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn options(slope: f64, amplitude: f64, min_period: u32, max_period: u32) -> SlopeOptions {
        SlopeOptions {
            slope,
            amplitude,
            min_period,
            max_period,
        }
    }

    #[test]
    fn test_wave_stays_within_amplitude() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut wave = SpeedWave::new(options(0.4, 1.5, 20, 50), options(1.0, 2.5, 15, 30), 0.5, 10.0);

        for _ in 0..10_000 {
            let speed = wave.next_speed(&mut rng);
            assert!((speed - wave.average()).abs() <= wave.amplitude() + 1e-12);
        }
    }

    #[test]
    fn test_wave_is_continuous() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut wave = SpeedWave::new(options(0.6, 2.5, 30, 60), options(1.2, 4.0, 20, 40), 0.0, 20.0);

        let mut prev = wave.next_speed(&mut rng);
        for _ in 0..5_000 {
            let speed = wave.next_speed(&mut rng);
            // a 30 second common slope moves the speed by well under half its amplitude per second
            assert!((speed - prev).abs() < 1.25);
            prev = speed;
        }
    }

    #[test]
    fn test_rare_slopes_are_steeper() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut wave = SpeedWave::new(options(0.4, 1.5, 5, 5), options(1.0, 2.5, 5, 5), 0.5, 10.0);

        for _ in 0..200 {
            wave.next_cycle(&mut rng);
            if wave.kind() == SlopeKind::Rare {
                assert!(wave.cur_slope.abs() >= 0.4 - 1e-12);
                assert!(wave.cur_slope.abs() <= 1.0 + 1e-12);
            } else {
                assert!(wave.cur_slope.abs() <= 0.4 + 1e-12);
            }
        }
    }

    #[test]
    fn test_rare_chance_is_capped() {
        let wave = SpeedWave::new(options(0.4, 1.5, 20, 50), options(1.0, 2.5, 15, 30), 0.9, 10.0);
        assert_eq!(wave.rare_chance, 0.5);
    }

    #[test]
    fn test_same_seed_same_wave() {
        let common = options(0.4, 1.5, 20, 50);
        let rare = options(1.0, 2.5, 15, 30);
        let mut a = SpeedWave::new(common, rare, 0.1, 12.0);
        let mut b = SpeedWave::new(common, rare, 0.1, 12.0);
        let mut rng_a = ChaCha8Rng::seed_from_u64(42);
        let mut rng_b = ChaCha8Rng::seed_from_u64(42);

        for _ in 0..500 {
            assert_eq!(a.next_speed(&mut rng_a), b.next_speed(&mut rng_b));
        }
    }
}
