//! World-to-screen mapping.
//!
//! The world scrolls 1:1 with the character: every entity sits at
//! `entity - character` percent of the viewport while the character itself
//! is drawn at `character` percent, capped so it never reaches the right
//! edge.

/// Where an entity fixed at `entity_world` appears, in viewport percent.
pub fn viewport_position(entity_world: f32, character_world: f32) -> f32 {
    entity_world - character_world
}

/// Horizontal background offset in percent.
pub fn background_offset(character_world: f32) -> f32 {
    character_world
}

/// Screen anchor of the character sprite.
pub fn sprite_anchor(character_world: f32, max_anchor: f32) -> f32 {
    character_world.min(max_anchor)
}

/// Distance used by every proximity test: character viewport position
/// against the entity's viewport position.
pub fn trigger_distance(character_world: f32, entity_world: f32) -> f32 {
    (character_world - viewport_position(entity_world, character_world)).abs()
}

/// Maps a viewport percentage onto a column of a `width`-wide strip.
/// Returns `None` when the point falls outside the strip.
pub fn to_column(percent: f32, width: u16) -> Option<u16> {
    if width == 0 || !(0.0..100.0).contains(&percent) {
        return None;
    }
    let col = (percent / 100.0 * width as f32).floor() as u16;
    Some(col.min(width - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entities_scroll_against_the_character() {
        assert_eq!(viewport_position(60.0, 0.0), 60.0);
        assert_eq!(viewport_position(60.0, 25.0), 35.0);
        assert_eq!(viewport_position(10.0, 25.0), -15.0);
    }

    #[test]
    fn sprite_anchor_caps_at_max() {
        assert_eq!(sprite_anchor(42.0, 80.0), 42.0);
        assert_eq!(sprite_anchor(95.0, 80.0), 80.0);
    }

    #[test]
    fn trigger_distance_is_zero_when_block_is_overhead() {
        // block at 130 sits above the character once it reaches 65
        assert_eq!(trigger_distance(65.0, 130.0), 0.0);
        assert_eq!(trigger_distance(60.0, 130.0), 10.0);
    }

    #[test]
    fn columns_clip_to_strip() {
        assert_eq!(to_column(0.0, 80), Some(0));
        assert_eq!(to_column(50.0, 80), Some(40));
        assert_eq!(to_column(99.99, 80), Some(79));
        assert_eq!(to_column(-0.5, 80), None);
        assert_eq!(to_column(100.0, 80), None);
        assert_eq!(to_column(10.0, 0), None);
    }
}
