use std::time::Duration;

use crate::world::Facing;

pub const WORLD_MIN: f32 = 0.0;
pub const WORLD_MAX: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
}

impl From<Direction> for Facing {
    fn from(dir: Direction) -> Self {
        match dir {
            Direction::Left => Facing::Left,
            Direction::Right => Facing::Right,
        }
    }
}

/// Character kinematic state. Only `Movement` writes it.
#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    pub world_position: f32,
    pub facing: Facing,
    pub airborne: bool,
    pub airborne_until: Option<Duration>,
}

impl Default for Character {
    fn default() -> Self {
        Character {
            world_position: WORLD_MIN,
            facing: Facing::Right,
            airborne: false,
            airborne_until: None,
        }
    }
}

/// Held directions, the movement ticker and the jump timer.
///
/// Times are engine-clock instants; `Movement` never reads a wall clock.
#[derive(Debug, Default)]
pub struct Movement {
    character: Character,
    left: bool,
    right: bool,
    next_step: Option<Duration>,
}

impl Movement {
    pub fn character(&self) -> &Character {
        &self.character
    }

    pub fn any_held(&self) -> bool {
        self.left || self.right
    }

    #[cfg(test)]
    pub fn ticking(&self) -> bool {
        self.next_step.is_some()
    }

    pub fn press(&mut self, dir: Direction, now: Duration, interval: Duration) {
        self.character.facing = dir.into();
        match dir {
            Direction::Left => self.left = true,
            Direction::Right => self.right = true,
        }
        if self.next_step.is_none() {
            self.next_step = Some(now + interval);
        }
    }

    pub fn release(&mut self, dir: Direction) {
        match dir {
            Direction::Left => self.left = false,
            Direction::Right => self.right = false,
        }
        if !self.any_held() {
            self.next_step = None;
        }
    }

    pub fn release_all(&mut self) {
        self.left = false;
        self.right = false;
        self.next_step = None;
    }

    /// Starts a jump pose lasting `duration`. Ignored while airborne.
    pub fn jump(&mut self, now: Duration, duration: Duration) -> bool {
        if self.character.airborne {
            return false;
        }
        self.character.airborne = true;
        self.character.airborne_until = Some(now + duration);
        true
    }

    /// Back to a fresh level start: position 0, grounded, facing right,
    /// nothing held.
    pub fn reset(&mut self) {
        *self = Movement::default();
    }

    /// Earliest pending ticker step or landing.
    pub fn next_deadline(&self) -> Option<Duration> {
        match (self.next_step, self.character.airborne_until) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fires whatever is due at `now`. Returns true when position or
    /// airborne state changed.
    pub fn fire(&mut self, now: Duration, interval: Duration, step: f32) -> bool {
        let mut changed = false;

        if let Some(at) = self.next_step.filter(|at| *at <= now) {
            self.step(step);
            self.next_step = Some(at + interval);
            changed = true;
        }

        if self.character.airborne_until.is_some_and(|at| at <= now) {
            self.character.airborne = false;
            self.character.airborne_until = None;
            changed = true;
        }

        changed
    }

    fn step(&mut self, step: f32) {
        let pos = &mut self.character.world_position;
        if self.right {
            *pos = (*pos + step).min(WORLD_MAX);
        }
        if self.left {
            *pos = (*pos - step).max(WORLD_MIN);
        }
    }
}
