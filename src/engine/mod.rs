//! The platformer engine.
//!
//! `Engine` owns every piece of mutable game state and the clock that
//! drives it. Hosts feed it control events and elapsed time; it answers
//! with state to draw and a queue of `EngineEvent`s.

pub mod bounce;
pub mod collision;
pub mod modal;
pub mod movement;
pub mod progress;
pub mod viewport;

use std::time::Duration;

use serde::Deserialize;

use crate::audio::AudioSink;
use crate::store::ProgressStore;
use crate::world::{Level, World};

use bounce::Bounces;
use collision::{ObjectKind, Radii, TriggerKey, TriggerRecord};
use modal::EventModal;
use movement::{Character, Direction, Movement};
use progress::{completion_fraction, Milestone, ProgressTracker};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// World units per movement tick.
    pub move_step: f32,
    pub tick_ms: u64,
    pub jump_ms: u64,
    /// Jump length when a block is right overhead.
    pub low_ceiling_jump_ms: u64,
    pub block_radius: f32,
    pub npc_radius: f32,
    pub bounce_rise_ms: u64,
    pub bounce_fall_ms: u64,
    pub sprite_anchor_max: f32,
    pub volume: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            move_step: 0.5,
            tick_ms: 16,
            jump_ms: 600,
            low_ceiling_jump_ms: 350,
            block_radius: 5.0,
            npc_radius: 8.0,
            bounce_rise_ms: 150,
            bounce_fall_ms: 150,
            sprite_anchor_max: 80.0,
            volume: 0.3,
        }
    }
}

impl EngineConfig {
    fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    fn radii(&self) -> Radii {
        Radii {
            block: self.block_radius,
            npc: self.npc_radius,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    LevelStarted(usize),
    Triggered(TriggerKey),
    LevelComplete(usize),
    GameComplete,
}

pub struct Engine<S: ProgressStore, A: AudioSink> {
    world: World,
    config: EngineConfig,
    store: S,
    audio: A,
    now: Duration,
    level: usize,
    resume_level: usize,
    movement: Movement,
    record: TriggerRecord,
    progress: ProgressTracker,
    modal: EventModal,
    bounces: Bounces,
    events: Vec<EngineEvent>,
}

impl<S: ProgressStore, A: AudioSink> Engine<S, A> {
    /// Builds an engine over a non-empty world and reads the saved level.
    /// Nothing plays until `start`.
    pub fn new(world: World, config: EngineConfig, store: S, audio: A) -> Self {
        let resume_level = match store.load() {
            Ok(Some(index)) if index < world.len() => index,
            Ok(Some(index)) => {
                log::warn!(
                    "saved level {} out of range (have {}), starting over",
                    index,
                    world.len()
                );
                0
            }
            Ok(None) => 0,
            Err(e) => {
                log::warn!("ignoring saved progress: {}", e);
                0
            }
        };

        Engine {
            world,
            config,
            store,
            audio,
            now: Duration::ZERO,
            level: resume_level,
            resume_level,
            movement: Movement::default(),
            record: TriggerRecord::default(),
            progress: ProgressTracker::default(),
            modal: EventModal::default(),
            bounces: Bounces::default(),
            events: Vec::new(),
        }
    }

    /// Level a "continue" would start at.
    pub fn resume_level(&self) -> usize {
        self.resume_level
    }

    pub fn start(&mut self, index: usize) {
        self.enter_level(index);
    }

    /// New game from the first level.
    pub fn restart(&mut self) {
        self.enter_level(0);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[cfg(test)]
    pub fn audio(&self) -> &A {
        &self.audio
    }

    #[cfg(test)]
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn level_index(&self) -> usize {
        self.level
    }

    pub fn level(&self) -> Option<&Level> {
        self.world.level(self.level)
    }

    pub fn is_last_level(&self) -> bool {
        self.world.is_last(self.level)
    }

    pub fn character(&self) -> &Character {
        self.movement.character()
    }

    pub fn modal(&self) -> &EventModal {
        &self.modal
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn bounces(&self) -> &Bounces {
        &self.bounces
    }

    pub fn is_triggered(&self, kind: ObjectKind, index: usize) -> bool {
        self.record.contains(&TriggerKey {
            level: self.level,
            kind,
            index,
        })
    }

    /// Discovered countable objects on the active level.
    pub fn found(&self) -> usize {
        self.record.count(self.level, ObjectKind::Block) + self.record.count(self.level, ObjectKind::Npc)
    }

    pub fn total(&self) -> usize {
        self.level().map_or(0, Level::countable)
    }

    pub fn completion(&self) -> f32 {
        completion_fraction(self.found(), self.total())
    }

    /// An overlay is up and owns the input.
    pub fn blocked(&self) -> bool {
        self.modal.visible() || self.progress.level_complete() || self.progress.game_complete()
    }

    pub fn press(&mut self, dir: Direction) {
        if self.blocked() {
            return;
        }
        self.movement.press(dir, self.now, self.config.tick());
    }

    pub fn release(&mut self, dir: Direction) {
        self.movement.release(dir);
    }

    /// Starts a jump if grounded. Returns whether one started.
    pub fn jump(&mut self) -> bool {
        if self.blocked() {
            return false;
        }
        let duration = if self.under_block() {
            self.config.low_ceiling_jump_ms
        } else {
            self.config.jump_ms
        };
        if !self.movement.jump(self.now, Duration::from_millis(duration)) {
            return false;
        }
        self.check_triggers();
        true
    }

    pub fn close_event(&mut self) {
        self.modal.close();
    }

    pub fn advance_media(&mut self) {
        self.modal.advance_media();
    }

    /// Leaves a completed level: loads the next one, or finishes the game
    /// when this was the last. Does nothing before the level is complete.
    pub fn advance(&mut self) -> bool {
        if !self.progress.level_complete() {
            return false;
        }
        if self.is_last_level() {
            self.progress.finish();
            self.clear_store();
            log::info!("journey finished");
        } else {
            self.enter_level(self.level + 1);
        }
        true
    }

    /// Moves the engine clock forward, firing timers in the order they fall
    /// due. Collisions are checked after every firing that moved or landed
    /// the character.
    pub fn update(&mut self, dt: Duration) {
        let target = self.now + dt;
        while let Some(at) = self.next_deadline().filter(|at| *at <= target) {
            self.now = at;
            let tick = self.config.tick();
            let changed = self.movement.fire(at, tick, self.config.move_step);
            self.bounces
                .fire(at, Duration::from_millis(self.config.bounce_fall_ms));
            if changed {
                self.check_triggers();
            }
        }
        self.now = target;
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    fn next_deadline(&self) -> Option<Duration> {
        [self.movement.next_deadline(), self.bounces.next_deadline()]
            .into_iter()
            .flatten()
            .min()
    }

    fn under_block(&self) -> bool {
        let pos = self.character().world_position;
        self.level().is_some_and(|level| {
            level
                .blocks
                .iter()
                .any(|b| viewport::trigger_distance(pos, b.position) <= self.config.block_radius)
        })
    }

    fn enter_level(&mut self, index: usize) {
        self.level = index.min(self.world.len().saturating_sub(1));
        self.resume_level = self.level;
        self.movement.reset();
        self.record.clear();
        self.progress.reset();
        self.modal.reset();
        self.bounces.cancel_all();

        if let Err(e) = self.store.save(self.level) {
            log::warn!("could not save progress: {}", e);
        }

        self.audio.stop();
        if let Some(track) = self.world.level(self.level).and_then(|l| l.audio.as_deref()) {
            if let Err(e) = self.audio.play_looping(track, self.config.volume) {
                log::warn!("soundtrack did not start: {}", e);
            }
        }

        log::info!("entered level {} of {}", self.level + 1, self.world.len());
        self.events.push(EngineEvent::LevelStarted(self.level));
        self.check_triggers();
    }

    fn check_triggers(&mut self) {
        let Some(level) = self.world.level(self.level) else {
            return;
        };
        let hits = self
            .record
            .scan(self.level, level, self.movement.character(), self.config.radii());

        for hit in hits {
            log::debug!(
                "{:?} {} fired at {:.1}",
                hit.key.kind,
                hit.key.index,
                self.movement.character().world_position
            );
            if hit.key.kind == ObjectKind::Block {
                self.bounces.start(
                    hit.key.index,
                    self.now,
                    Duration::from_millis(self.config.bounce_rise_ms),
                );
            }
            self.modal.open(hit.event);
            self.events.push(EngineEvent::Triggered(hit.key));
        }

        if self.modal.visible() {
            self.movement.release_all();
        }

        let found = self.found();
        let total = level.countable();
        let is_last = self.world.is_last(self.level);
        for milestone in self.progress.update(found, total, is_last) {
            match milestone {
                Milestone::LevelComplete => {
                    log::info!("level {} complete", self.level + 1);
                    self.events.push(EngineEvent::LevelComplete(self.level));
                }
                Milestone::GameComplete => {
                    self.clear_store();
                    self.events.push(EngineEvent::GameComplete);
                }
            }
        }
    }

    fn clear_store(&mut self) {
        self.resume_level = 0;
        if let Err(e) = self.store.clear() {
            log::warn!("could not clear progress: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioError;
    use crate::store::MemoryProgressStore;
    use crate::world::types::{Block, Event, EventKind, Facing, Npc, NpcSize};

    #[derive(Default)]
    struct RecordingAudio {
        calls: Vec<String>,
        reject: bool,
    }

    impl AudioSink for RecordingAudio {
        fn play_looping(&mut self, track: &str, _volume: f32) -> Result<(), AudioError> {
            self.calls.push(format!("play {track}"));
            if self.reject {
                return Err(AudioError::Output("autoplay blocked".into()));
            }
            Ok(())
        }

        fn stop(&mut self) {
            self.calls.push("stop".into());
        }
    }

    type TestEngine = Engine<MemoryProgressStore, RecordingAudio>;

    fn level(id: u32, blocks: &[f32], npcs: &[(f32, bool)]) -> Level {
        Level {
            id,
            name: format!("LEVEL {id}"),
            background: "bg.png".into(),
            mission: String::new(),
            year: String::new(),
            blocks: blocks
                .iter()
                .map(|&position| Block {
                    position,
                    event: Event::text(&format!("block at {position}")),
                })
                .collect(),
            npcs: npcs
                .iter()
                .map(|&(position, talks)| Npc {
                    position,
                    sprite: "npc.gif".into(),
                    facing: Facing::Left,
                    size: NpcSize::Small,
                    event: talks.then(|| Event::text(&format!("npc at {position}"))),
                })
                .collect(),
            audio: Some(format!("track{id}.ogg")),
        }
    }

    fn engine(levels: Vec<Level>, store: MemoryProgressStore) -> TestEngine {
        Engine::new(
            World::new(levels),
            EngineConfig::default(),
            store,
            RecordingAudio::default(),
        )
    }

    fn started(levels: Vec<Level>) -> TestEngine {
        let mut e = engine(levels, MemoryProgressStore::default());
        e.start(0);
        e.drain_events();
        e
    }

    const TICK: Duration = Duration::from_millis(16);

    /// Holds a direction until the character reaches `target`.
    fn walk_to(e: &mut TestEngine, target: f32) {
        let dir = if target >= e.character().world_position {
            Direction::Right
        } else {
            Direction::Left
        };
        e.press(dir);
        for _ in 0..1_000 {
            if e.character().world_position == target {
                break;
            }
            e.update(TICK);
        }
        e.release(dir);
        assert_eq!(e.character().world_position, target);
    }

    fn land(e: &mut TestEngine) {
        e.update(Duration::from_millis(700));
        assert!(!e.character().airborne);
    }

    #[test]
    fn resume_reads_a_valid_saved_level() {
        let levels = || vec![level(1, &[50.0], &[]), level(2, &[50.0], &[]), level(3, &[50.0], &[])];
        assert_eq!(engine(levels(), MemoryProgressStore::with_raw("2")).resume_level(), 2);
        assert_eq!(engine(levels(), MemoryProgressStore::with_raw("7")).resume_level(), 0);
        assert_eq!(engine(levels(), MemoryProgressStore::with_raw("two")).resume_level(), 0);
        assert_eq!(engine(levels(), MemoryProgressStore::default()).resume_level(), 0);
    }

    #[test]
    fn two_blocks_complete_on_the_second_hit() {
        let mut e = started(vec![level(1, &[40.0, 80.0], &[]), level(2, &[50.0], &[])]);

        walk_to(&mut e, 20.0);
        assert!(e.jump());
        assert_eq!(e.completion(), 0.5);
        assert!(!e.progress().level_complete());
        assert!(e.modal().visible());
        e.close_event();
        land(&mut e);

        walk_to(&mut e, 40.0);
        assert!(e.jump());
        assert_eq!(e.completion(), 1.0);
        assert!(e.progress().level_complete());

        let completions: Vec<_> = e
            .drain_events()
            .into_iter()
            .filter(|ev| matches!(ev, EngineEvent::LevelComplete(_)))
            .collect();
        assert_eq!(completions, vec![EngineEvent::LevelComplete(0)]);
    }

    #[test]
    fn an_object_fires_once_while_in_range() {
        let mut e = started(vec![level(1, &[], &[(40.0, true), (90.0, true)])]);

        // npc at 40 comes into range at 16; the popup stops the walk there
        walk_to(&mut e, 16.0);
        assert!(e.modal().visible());
        e.close_event();

        // keep standing and jumping inside the radius
        for pos in [18.0, 20.0, 23.0] {
            walk_to(&mut e, pos);
            e.jump();
            land(&mut e);
        }
        let fired = e
            .drain_events()
            .into_iter()
            .filter(|ev| matches!(ev, EngineEvent::Triggered(_)))
            .count();
        assert_eq!(fired, 1);
        assert!(!e.modal().visible());
        assert_eq!(e.completion(), 0.5);
    }

    #[test]
    fn decorative_npcs_are_ignored() {
        let mut e = started(vec![level(1, &[80.0], &[(40.0, false)])]);
        walk_to(&mut e, 20.0);
        e.jump();
        land(&mut e);
        assert_eq!(e.completion(), 0.0);
        assert!(!e.modal().visible());
        assert_eq!(e.total(), 1);
    }

    #[test]
    fn position_stays_in_world_bounds() {
        let mut e = started(vec![level(1, &[500.0], &[])]);
        e.press(Direction::Left);
        e.update(Duration::from_secs(2));
        assert_eq!(e.character().world_position, 0.0);

        e.press(Direction::Right);
        e.update(Duration::from_secs(10));
        assert_eq!(e.character().world_position, 0.0, "opposing keys cancel");

        e.release(Direction::Left);
        e.update(Duration::from_secs(10));
        assert_eq!(e.character().world_position, 100.0);
    }

    #[test]
    fn long_frames_still_hit_blocks_on_the_way() {
        let mut e = started(vec![level(1, &[40.0, 300.0], &[])]);
        walk_to(&mut e, 14.0);
        // one 600ms jump while running covers 14..32; block 0 is at 20
        e.press(Direction::Right);
        e.jump();
        e.update(Duration::from_millis(600));
        assert!(e.is_triggered(ObjectKind::Block, 0));
    }

    #[test]
    fn jumps_are_shorter_under_a_block() {
        let mut e = started(vec![level(1, &[40.0, 90.0], &[])]);
        walk_to(&mut e, 10.0);
        e.jump();
        assert_eq!(e.character().airborne_until, Some(e.now() + Duration::from_millis(600)));
        land(&mut e);

        walk_to(&mut e, 19.0);
        e.jump();
        assert_eq!(e.character().airborne_until, Some(e.now() + Duration::from_millis(350)));
    }

    #[test]
    fn same_tick_overlap_shows_block_then_npc() {
        let mut e = started(vec![level(1, &[40.0], &[(42.0, true)])]);
        walk_to(&mut e, 10.0);
        // reach the shared spot airborne without checking on the way
        e.movement.jump(e.now, Duration::from_millis(600));
        e.movement.press(Direction::Right, e.now, TICK);
        for _ in 0..20 {
            e.now += TICK;
            e.movement.fire(e.now, TICK, 0.5);
        }
        assert_eq!(e.character().world_position, 20.0);
        e.check_triggers();

        assert_eq!(e.modal().current().unwrap().content.as_deref(), Some("block at 40"));
        assert_eq!(e.modal().pending(), 1);
        e.close_event();
        assert_eq!(e.modal().current().unwrap().content.as_deref(), Some("npc at 42"));
    }

    #[test]
    fn open_modal_blocks_movement() {
        let mut e = started(vec![level(1, &[40.0, 90.0], &[])]);
        walk_to(&mut e, 20.0);
        e.press(Direction::Right);
        e.jump();
        assert!(e.modal().visible());

        let pos = e.character().world_position;
        e.press(Direction::Right);
        e.update(Duration::from_millis(200));
        assert_eq!(e.character().world_position, pos);
        assert!(!e.jump());

        e.close_event();
        e.press(Direction::Right);
        e.update(TICK);
        assert_eq!(e.character().world_position, pos + 0.5);
    }

    #[test]
    fn advancing_resets_the_level_state() {
        let mut e = started(vec![level(1, &[40.0], &[]), level(2, &[40.0], &[])]);
        assert!(!e.advance(), "level not complete yet");

        walk_to(&mut e, 20.0);
        e.jump();
        e.close_event();
        assert!(e.progress().level_complete());

        assert!(e.advance());
        assert_eq!(e.level_index(), 1);
        assert_eq!(e.character(), &Character::default());
        assert_eq!(e.found(), 0);
        assert!(e.bounces().is_empty());
        assert!(!e.progress().level_complete());
        assert_eq!(e.store().raw(), Some("1"));
        assert_eq!(
            e.audio().calls,
            vec!["stop", "play track1.ogg", "stop", "play track2.ogg"]
        );
    }

    #[test]
    fn new_game_starts_over_from_the_first_level() {
        let mut e = engine(
            vec![level(1, &[40.0], &[]), level(2, &[40.0], &[])],
            MemoryProgressStore::with_raw("1"),
        );
        e.start(e.resume_level());
        walk_to(&mut e, 20.0);
        e.jump();
        assert!(e.modal().visible());

        e.restart();
        assert_eq!(e.level_index(), 0);
        assert_eq!(e.resume_level(), 0);
        assert_eq!(e.store().raw(), Some("0"));
        assert_eq!(e.character(), &Character::default());
        assert_eq!(e.found(), 0);
        assert!(!e.modal().visible());
        assert!(!e.progress().game_complete());
    }

    #[test]
    fn final_level_completion_clears_progress() {
        let mut e = engine(
            vec![level(1, &[40.0], &[]), level(2, &[40.0], &[])],
            MemoryProgressStore::with_raw("1"),
        );
        e.start(e.resume_level());
        assert_eq!(e.store().raw(), Some("1"));

        walk_to(&mut e, 20.0);
        e.jump();
        // level-complete overlay never dismissed
        assert!(e.progress().level_complete());
        assert!(e.progress().game_complete());
        assert_eq!(e.store().raw(), None);
        assert!(e.drain_events().contains(&EngineEvent::GameComplete));

        assert!(e.advance());
        assert!(!e.progress().level_complete());
        assert!(e.progress().game_complete());
        assert_eq!(e.store().raw(), None);
    }

    #[test]
    fn rejected_soundtrack_is_not_fatal() {
        let mut e = Engine::new(
            World::new(vec![level(1, &[40.0], &[])]),
            EngineConfig::default(),
            MemoryProgressStore::default(),
            RecordingAudio {
                reject: true,
                ..RecordingAudio::default()
            },
        );
        e.start(0);
        assert_eq!(e.audio().calls, vec!["stop", "play track1.ogg"]);
        walk_to(&mut e, 5.0);
    }

    #[test]
    fn empty_level_is_complete_on_entry() {
        let mut e = started(vec![level(1, &[], &[(30.0, false)]), level(2, &[40.0], &[])]);
        e.restart();
        assert!(e.progress().level_complete());
        assert!(e.advance());
        assert_eq!(e.level_index(), 1);
    }

    #[test]
    fn bounce_runs_on_the_engine_clock() {
        let mut e = started(vec![level(1, &[40.0, 90.0], &[])]);
        walk_to(&mut e, 20.0);
        e.jump();
        assert_eq!(e.bounces().phase(0), Some(bounce::BouncePhase::Rising));
        e.update(Duration::from_millis(150));
        assert_eq!(e.bounces().phase(0), Some(bounce::BouncePhase::Falling));
        e.update(Duration::from_millis(150));
        assert!(e.bounces().is_empty());
    }

    #[test]
    fn event_kinds_survive_the_modal() {
        let mut lvl = level(1, &[40.0], &[]);
        lvl.blocks[0].event = Event {
            kind: EventKind::Video,
            content: None,
            images: vec!["still.jpg".into()],
            video: Some("clip.mp4".into()),
        };
        let mut e = started(vec![lvl]);
        walk_to(&mut e, 20.0);
        e.jump();
        e.advance_media();
        let media = e.modal().current_media().unwrap();
        assert_eq!(media.kind, modal::MediaKind::Video);
    }
}
