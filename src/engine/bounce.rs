use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BouncePhase {
    /// On its way up, still showing the unhit art.
    Rising,
    /// Past the peak, already showing the hit art.
    Falling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockArt {
    Unhit,
    Hit,
}

#[derive(Debug, Clone, Copy)]
struct Bounce {
    block: usize,
    phase: BouncePhase,
    until: Duration,
}

/// Cosmetic bounce sequences: rise, swap art at the peak, fall, done.
#[derive(Debug, Default)]
pub struct Bounces {
    active: Vec<Bounce>,
}

impl Bounces {
    pub fn start(&mut self, block: usize, now: Duration, rise: Duration) {
        self.active.retain(|b| b.block != block);
        self.active.push(Bounce {
            block,
            phase: BouncePhase::Rising,
            until: now + rise,
        });
    }

    pub fn phase(&self, block: usize) -> Option<BouncePhase> {
        self.active.iter().find(|b| b.block == block).map(|b| b.phase)
    }

    /// Art for a block given whether it has been triggered.
    pub fn art(&self, block: usize, triggered: bool) -> BlockArt {
        match self.phase(block) {
            Some(BouncePhase::Rising) => BlockArt::Unhit,
            Some(BouncePhase::Falling) => BlockArt::Hit,
            None if triggered => BlockArt::Hit,
            None => BlockArt::Unhit,
        }
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.active.iter().map(|b| b.until).min()
    }

    /// Advances every sequence due at `now`.
    pub fn fire(&mut self, now: Duration, fall: Duration) {
        for bounce in self.active.iter_mut().filter(|b| b.until <= now) {
            if bounce.phase == BouncePhase::Rising {
                bounce.phase = BouncePhase::Falling;
                bounce.until += fall;
            }
        }
        self.active
            .retain(|b| !(b.phase == BouncePhase::Falling && b.until <= now));
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn cancel_all(&mut self) {
        self.active.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn art_swaps_at_the_peak() {
        let mut bounces = Bounces::default();
        bounces.start(0, ms(0), ms(150));
        assert_eq!(bounces.art(0, true), BlockArt::Unhit);
        assert_eq!(bounces.next_deadline(), Some(ms(150)));

        bounces.fire(ms(150), ms(150));
        assert_eq!(bounces.phase(0), Some(BouncePhase::Falling));
        assert_eq!(bounces.art(0, true), BlockArt::Hit);
        assert_eq!(bounces.next_deadline(), Some(ms(300)));

        bounces.fire(ms(300), ms(150));
        assert!(bounces.is_empty());
        assert_eq!(bounces.art(0, true), BlockArt::Hit);
        assert_eq!(bounces.art(1, false), BlockArt::Unhit);
    }

    #[test]
    fn cancel_drops_pending_phases() {
        let mut bounces = Bounces::default();
        bounces.start(0, ms(0), ms(150));
        bounces.start(1, ms(40), ms(150));
        bounces.cancel_all();
        assert_eq!(bounces.next_deadline(), None);
        assert_eq!(bounces.phase(1), None);
    }
}
