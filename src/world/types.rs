use serde::Deserialize;

/// Ordered sequence of levels, fixed at load time.
#[derive(Debug)]
pub struct World {
    pub levels: Vec<Level>,
}

impl World {
    pub fn new(levels: Vec<Level>) -> Self {
        World { levels }
    }

    pub fn level(&self, index: usize) -> Option<&Level> {
        self.levels.get(index)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_last(&self, index: usize) -> bool {
        index + 1 == self.levels.len()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Level {
    pub id: u32,
    pub name: String,
    pub background: String,
    pub mission: String,
    pub year: String,
    #[serde(default, rename = "block")]
    pub blocks: Vec<Block>,
    #[serde(default, rename = "npc")]
    pub npcs: Vec<Npc>,
    #[serde(default)]
    pub audio: Option<String>,
}

impl Level {
    /// NPCs that count toward completion, with their index in `npcs`.
    pub fn event_npcs(&self) -> impl Iterator<Item = (usize, &Npc)> {
        self.npcs.iter().enumerate().filter(|(_, npc)| npc.event.is_some())
    }

    /// Blocks plus event-bearing NPCs.
    pub fn countable(&self) -> usize {
        self.blocks.len() + self.event_npcs().count()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Block {
    pub position: f32, // world percentage, may exceed 100
    pub event: Event,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Npc {
    pub position: f32,
    pub sprite: String,
    #[serde(default)]
    pub facing: Facing,
    #[serde(default)]
    pub size: NpcSize,
    #[serde(default)]
    pub event: Option<Event>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Left,
    #[default]
    Right,
}

/// Display-scale token for NPC sprites.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NpcSize {
    Small,
    #[default]
    Medium,
    Large,
    Huge,
}

impl NpcSize {
    /// Sprite height in terminal rows.
    pub fn rows(self) -> u16 {
        match self {
            NpcSize::Small => 1,
            NpcSize::Medium => 2,
            NpcSize::Large => 3,
            NpcSize::Huge => 4,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Text,
    Image,
    Video,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default)]
    pub content: Option<String>,
    // A text event may still carry images.
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub video: Option<String>,
}

impl Event {
    #[cfg(test)]
    pub fn text(content: &str) -> Self {
        Event {
            kind: EventKind::Text,
            content: Some(content.to_string()),
            images: Vec::new(),
            video: None,
        }
    }

    /// Paginated media: images in order, then the video.
    pub fn media(&self) -> Vec<&str> {
        self.images
            .iter()
            .map(String::as_str)
            .chain(self.video.as_deref())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn npc_defaults_apply() {
        let npc: Npc = toml::from_str(
            r#"
            position = 160.0
            sprite = "characters/peach.gif"
            "#,
        )
        .unwrap();
        assert_eq!(npc.facing, Facing::Right);
        assert_eq!(npc.size, NpcSize::Medium);
        assert!(npc.event.is_none());
    }

    #[test]
    fn media_lists_images_before_video() {
        let event: Event = toml::from_str(
            r#"
            type = "text"
            content = "hello"
            images = ["a.jpg", "b.png"]
            video = "clip.mp4"
            "#,
        )
        .unwrap();
        assert_eq!(event.media(), vec!["a.jpg", "b.png", "clip.mp4"]);
    }

    #[test]
    fn countable_skips_decorative_npcs() {
        let level: Level = toml::from_str(
            r#"
            id = 1
            name = "TEST"
            background = "bg.png"
            mission = "m"
            year = "2000"

            [[block]]
            position = 10.0
            event = { type = "text", content = "one" }

            [[npc]]
            position = 40.0
            sprite = "deco.gif"

            [[npc]]
            position = 60.0
            sprite = "talker.gif"
            event = { type = "text", content = "hi" }
            "#,
        )
        .unwrap();
        assert_eq!(level.countable(), 2);
        assert_eq!(level.event_npcs().map(|(i, _)| i).collect::<Vec<_>>(), vec![1]);
    }
}
