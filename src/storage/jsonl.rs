//! JSONL (JSON Lines) storage.
//!
//! JSONL is the source of truth for all normalized data.
//! Each line is a valid JSON object representing one entity.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::PathBuf;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::{StorageConfig, StorageError};
use crate::models::{Dataset, MultiMatchAnalysis};

/// Entity types for JSONL storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    Match,
    Mistake,
    Player,
}

impl EntityType {
    /// Get the filename for this entity type.
    pub fn filename(&self) -> &'static str {
        match self {
            EntityType::Match => "matches.jsonl",
            EntityType::Mistake => "mistakes.jsonl",
            EntityType::Player => "players.jsonl",
        }
    }
}

/// Path of an entity's JSONL file.
pub fn entity_path(config: &StorageConfig, entity: EntityType) -> PathBuf {
    config.normalized_dir().join(entity.filename())
}

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    /// Create a new JSONL writer for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    pub fn for_entity(config: &StorageConfig, entity: EntityType) -> Self {
        Self::new(entity_path(config, entity))
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Write entities, replacing the entire file.
    pub fn write_all(&self, entities: &[T]) -> Result<usize, StorageError> {
        self.ensure_dir()?;

        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);

        for entity in entities {
            writeln!(writer, "{}", serde_json::to_string(entity)?)?;
        }

        writer.flush()?;
        info!("Wrote {} entities to {:?}", entities.len(), self.path);

        Ok(entities.len())
    }
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    /// Create a new JSONL reader for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    pub fn for_entity(config: &StorageConfig, entity: EntityType) -> Self {
        Self::new(entity_path(config, entity))
    }

    /// Read all entities from the file. A missing file reads as empty;
    /// malformed lines are skipped with a warning.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut entities = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str(&line) {
                Ok(entity) => entities.push(entity),
                Err(e) => {
                    warn!("Failed to parse line {} in {:?}: {}", idx + 1, self.path, e);
                }
            }
        }

        debug!("Read {} entities from {:?}", entities.len(), self.path);
        Ok(entities)
    }
}

/// Load the stored dataset. Missing files read as empty collections.
pub fn load_dataset(config: &StorageConfig) -> Result<Dataset, StorageError> {
    Ok(Dataset {
        matches: JsonlReader::for_entity(config, EntityType::Match).read_all()?,
        mistakes: JsonlReader::for_entity(config, EntityType::Mistake).read_all()?,
        players: JsonlReader::for_entity(config, EntityType::Player).read_all()?,
    })
}

/// Replace the stored dataset.
pub fn save_dataset(config: &StorageConfig, dataset: &Dataset) -> Result<(), StorageError> {
    JsonlWriter::for_entity(config, EntityType::Match).write_all(&dataset.matches)?;
    JsonlWriter::for_entity(config, EntityType::Mistake).write_all(&dataset.mistakes)?;
    JsonlWriter::for_entity(config, EntityType::Player).write_all(&dataset.players)?;
    Ok(())
}

/// Persist an analysis snapshot as pretty JSON.
pub fn write_analysis(
    config: &StorageConfig,
    analysis: &MultiMatchAnalysis,
) -> Result<PathBuf, StorageError> {
    let path = config.analysis_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, serde_json::to_string_pretty(analysis)?)?;
    info!("Wrote analysis snapshot to {:?}", path);
    Ok(path)
}

/// Read the snapshot last written by [`write_analysis`].
pub fn read_analysis(config: &StorageConfig) -> Result<MultiMatchAnalysis, StorageError> {
    let path = config.analysis_path();
    if !path.exists() {
        return Err(StorageError::PathNotFound(path));
    }
    let contents = fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&contents)?)
}
