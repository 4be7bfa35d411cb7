use std::collections::HashSet;

use super::movement::Character;
use super::viewport::trigger_distance;
use crate::world::{Event, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    Block,
    Npc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriggerKey {
    pub level: usize,
    pub kind: ObjectKind,
    pub index: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Radii {
    pub block: f32,
    pub npc: f32,
}

#[derive(Debug, Clone)]
pub struct Hit {
    pub key: TriggerKey,
    pub event: Event,
}

/// Objects that already fired during the current level visit.
#[derive(Debug, Default)]
pub struct TriggerRecord {
    fired: HashSet<TriggerKey>,
}

impl TriggerRecord {
    pub fn contains(&self, key: &TriggerKey) -> bool {
        self.fired.contains(key)
    }

    pub fn clear(&mut self) {
        self.fired.clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.fired.len()
    }

    pub fn count(&self, level: usize, kind: ObjectKind) -> usize {
        self.fired
            .iter()
            .filter(|key| key.level == level && key.kind == kind)
            .count()
    }

    /// Tests every not-yet-fired object of `level` against the character
    /// and records the ones in range. Blocks come first, then NPCs, each in
    /// index order.
    pub fn scan(
        &mut self,
        level_index: usize,
        level: &Level,
        character: &Character,
        radii: Radii,
    ) -> Vec<Hit> {
        let mut hits = Vec::new();
        let pos = character.world_position;

        if character.airborne {
            for (index, block) in level.blocks.iter().enumerate() {
                let key = TriggerKey {
                    level: level_index,
                    kind: ObjectKind::Block,
                    index,
                };
                if trigger_distance(pos, block.position) <= radii.block && self.fired.insert(key) {
                    hits.push(Hit {
                        key,
                        event: block.event.clone(),
                    });
                }
            }
        }

        for (index, npc) in level.npcs.iter().enumerate() {
            let Some(event) = &npc.event else {
                continue;
            };
            let key = TriggerKey {
                level: level_index,
                kind: ObjectKind::Npc,
                index,
            };
            if trigger_distance(pos, npc.position) <= radii.npc && self.fired.insert(key) {
                hits.push(Hit {
                    key,
                    event: event.clone(),
                });
            }
        }

        hits
    }
}
