use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Resolves opaque asset references against the asset root. The engine
/// never looks inside a file; the TUI only needs to know whether one exists
/// and what to call it.
#[derive(Debug)]
pub struct Assets {
    root: PathBuf,
    known: HashMap<String, bool>,
}

impl Assets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Assets {
            root: root.into(),
            known: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, reference: &str) -> Option<PathBuf> {
        let path = self.root.join(reference);
        let exists = *self
            .known
            .entry(reference.to_string())
            .or_insert_with(|| path.is_file());
        exists.then_some(path)
    }

    /// `name` for a resolvable asset, `[name?]` as a stand-in for a broken
    /// one.
    pub fn label(&mut self, reference: &str) -> String {
        let name = display_name(reference);
        if self.resolve(reference).is_some() {
            name
        } else {
            log::debug!("asset {} missing under {}", reference, self.root.display());
            format!("[{}?]", name)
        }
    }
}

/// File stem of a reference: `characters/npcs/yoda.gif` -> `yoda`.
pub fn display_name(reference: &str) -> String {
    Path::new(reference)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| reference.to_string())
}
