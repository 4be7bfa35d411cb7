/// Something the tracker raised while counting discoveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    LevelComplete,
    GameComplete,
}

/// Share of countable objects found. A level with nothing to find is
/// already complete.
pub fn completion_fraction(found: usize, total: usize) -> f32 {
    if total == 0 {
        return 1.0;
    }
    found.min(total) as f32 / total as f32
}

/// One-shot level-complete latch plus the game-complete flag.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    latched: bool,
    overlay: bool,
    game_complete: bool,
}

impl ProgressTracker {
    /// Level-complete overlay is up.
    pub fn level_complete(&self) -> bool {
        self.overlay
    }

    pub fn game_complete(&self) -> bool {
        self.game_complete
    }

    /// Re-evaluates completion for the active level. The latch makes
    /// `LevelComplete` fire at most once per visit.
    pub fn update(&mut self, found: usize, total: usize, is_last: bool) -> Vec<Milestone> {
        let mut raised = Vec::new();
        if self.latched || completion_fraction(found, total) < 1.0 {
            return raised;
        }

        self.latched = true;
        self.overlay = true;
        raised.push(Milestone::LevelComplete);

        if is_last {
            self.game_complete = true;
            raised.push(Milestone::GameComplete);
        }
        raised
    }

    /// Marks the whole journey as finished, e.g. advancing past the last
    /// level.
    pub fn finish(&mut self) {
        self.overlay = false;
        self.game_complete = true;
    }

    /// Fresh latch for a new level visit.
    pub fn reset(&mut self) {
        *self = ProgressTracker::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_counts_found_over_total() {
        assert_eq!(completion_fraction(0, 2), 0.0);
        assert_eq!(completion_fraction(1, 2), 0.5);
        assert_eq!(completion_fraction(2, 2), 1.0);
        assert_eq!(completion_fraction(0, 0), 1.0);
    }

    #[test]
    fn level_complete_fires_once_per_visit() {
        let mut tracker = ProgressTracker::default();
        assert!(tracker.update(1, 2, false).is_empty());
        assert_eq!(tracker.update(2, 2, false), vec![Milestone::LevelComplete]);
        assert!(tracker.update(2, 2, false).is_empty());
        assert!(tracker.level_complete());
        assert!(!tracker.game_complete());


        tracker.reset();
        assert_eq!(tracker.update(2, 2, false), vec![Milestone::LevelComplete]);
    }

    #[test]
    fn last_level_also_completes_the_game() {
        let mut tracker = ProgressTracker::default();
        assert_eq!(
            tracker.update(3, 3, true),
            vec![Milestone::LevelComplete, Milestone::GameComplete]
        );
        assert!(tracker.game_complete());
        tracker.finish();
        assert!(!tracker.level_complete());
        assert!(tracker.game_complete());
    }
}
