use std::io::ErrorKind;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("progress store i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored level index {0:?} is not a number")]
    Corrupt(String),
}

/// Durable home of the current level index.
pub trait ProgressStore {
    fn load(&self) -> Result<Option<usize>, StoreError>;
    fn save(&mut self, index: usize) -> Result<(), StoreError>;
    fn clear(&mut self) -> Result<(), StoreError>;
}

impl<T: ProgressStore + ?Sized> ProgressStore for Box<T> {
    fn load(&self) -> Result<Option<usize>, StoreError> {
        (**self).load()
    }

    fn save(&mut self, index: usize) -> Result<(), StoreError> {
        (**self).save(index)
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        (**self).clear()
    }
}

fn parse(raw: &str) -> Result<usize, StoreError> {
    raw.trim()
        .parse()
        .map_err(|_| StoreError::Corrupt(raw.trim().to_string()))
}

/// Keeps the index as a decimal string in a single file.
#[derive(Debug)]
pub struct FileProgressStore {
    path: PathBuf,
}

impl FileProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileProgressStore { path: path.into() }
    }
}

impl ProgressStore for FileProgressStore {
    fn load(&self) -> Result<Option<usize>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => parse(&raw).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, index: usize) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, index.to_string())?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// In-process store for tests and `--no-save` runs.
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    raw: Option<String>,
}

#[cfg(test)]
impl MemoryProgressStore {
    pub fn with_raw(raw: &str) -> Self {
        MemoryProgressStore {
            raw: Some(raw.to_string()),
        }
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }
}

impl ProgressStore for MemoryProgressStore {
    fn load(&self) -> Result<Option<usize>, StoreError> {
        self.raw.as_deref().map(parse).transpose()
    }

    fn save(&mut self, index: usize) -> Result<(), StoreError> {
        self.raw = Some(index.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.raw = None;
        Ok(())
    }
}
