use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::types::{Level, World};

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid level file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("bad level pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("no levels found in {}", .0.display())]
    Empty(PathBuf),
    #[error("level id {0} is defined more than once")]
    DuplicateId(u32),
}

pub fn load_level(path: &Path) -> Result<Level, WorldError> {
    let content = std::fs::read_to_string(path).map_err(|source| WorldError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| WorldError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_world(levels_dir: &Path) -> Result<World, WorldError> {
    let pattern = levels_dir.join("level_*.toml");
    let mut paths: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())?
        .filter_map(|entry| entry.ok())
        .collect();

    // level_01, level_02, ... in file name order
    paths.sort();

    let mut levels = Vec::with_capacity(paths.len());
    for path in &paths {
        let level = load_level(path)?;
        log::debug!(
            "loaded level {} '{}' from {} ({} blocks, {} npcs)",
            level.id,
            level.name,
            path.display(),
            level.blocks.len(),
            level.npcs.len()
        );
        levels.push(level);
    }

    if levels.is_empty() {
        return Err(WorldError::Empty(levels_dir.to_path_buf()));
    }

    let mut seen = HashSet::new();
    for level in &levels {
        if !seen.insert(level.id) {
            return Err(WorldError::DuplicateId(level.id));
        }
    }
    levels.sort_by_key(|level| level.id);

    Ok(World::new(levels))
}
