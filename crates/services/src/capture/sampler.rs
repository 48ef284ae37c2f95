/// Forwards every Nth render callback to extraction, where
/// `N = round(render_rate / target_rate)`.
///
/// Rendering itself is not throttled; only the extraction hand-off is.
#[derive(Debug, Clone)]
pub struct FrameSampler {
    interval: u32,
    counter: u64,
}

impl FrameSampler {
    #[must_use]
    pub fn new(render_rate: u32, target_rate: u32) -> Self {
        let interval = if target_rate == 0 {
            1
        } else {
            (f64::from(render_rate) / f64::from(target_rate)).round().max(1.0) as u32
        };
        Self {
            interval,
            counter: 0,
        }
    }

    #[must_use]
    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// Counts one render callback; returns true if this frame should be extracted.
    pub fn on_render(&mut self) -> bool {
        self.counter += 1;
        self.counter % u64::from(self.interval) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixty_hz_render_forwards_every_fourth_frame_at_fifteen() {
        let mut sampler = FrameSampler::new(60, 15);
        assert_eq!(sampler.interval(), 4);

        let forwarded: Vec<bool> = (0..8).map(|_| sampler.on_render()).collect();
        assert_eq!(
            forwarded,
            vec![false, false, false, true, false, false, false, true]
        );
    }

    #[test]
    fn interval_rounds_and_never_drops_below_one() {
        assert_eq!(FrameSampler::new(144, 15).interval(), 10);
        assert_eq!(FrameSampler::new(30, 60).interval(), 1);
        assert_eq!(FrameSampler::new(60, 0).interval(), 1);
    }

    #[test]
    fn forwarded_rate_is_bounded() {
        let mut sampler = FrameSampler::new(120, 15);
        let forwarded = (0..120).filter(|_| sampler.on_render()).count();
        assert_eq!(forwarded, 15);
    }
}
