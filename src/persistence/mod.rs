//! Save/load of the progress record
//!
//! The record is a fixed 12-byte little-endian blob with no header or
//! version field: `{sector: i32, score: i32, integrity: f32}`. Writes go to a
//! temporary file first and are renamed into place.

use std::fs;
use std::path::Path;

use bytemuck::{Pod, Zeroable};

use crate::sim::GameEvent;
use crate::{RecoilError, RecoilResult};

/// On-disk progress record
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SaveRecord {
    pub sector: i32,
    pub score: i32,
    pub integrity: f32,
}

impl SaveRecord {
    pub const SIZE: usize = std::mem::size_of::<SaveRecord>();

    pub fn new(sector: u32, score: u32, integrity: f32) -> Self {
        Self {
            sector: i32::try_from(sector).unwrap_or(i32::MAX),
            score: i32::try_from(score).unwrap_or(i32::MAX),
            integrity,
        }
    }

    /// Record to write when a sector is cleared: resume at the next sector
    /// with the suit as it was at the exit
    pub fn after_clear(event: &GameEvent) -> Option<Self> {
        match *event {
            GameEvent::SectorCleared {
                sector,
                score,
                integrity,
            } => Some(Self::new(sector.saturating_add(1), score, integrity)),
            _ => None,
        }
    }

    /// Sector to resume at (at least 1)
    pub fn sector(&self) -> u32 {
        self.sector.max(1) as u32
    }

    pub fn score(&self) -> u32 {
        self.score.max(0) as u32
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&self.sector.to_le_bytes());
        out[4..8].copy_from_slice(&self.score.to_le_bytes());
        out[8..12].copy_from_slice(&self.integrity.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> RecoilResult<Self> {
        if bytes.len() != Self::SIZE {
            return Err(RecoilError::CorruptSave {
                expected: Self::SIZE,
                found: bytes.len(),
            });
        }
        let mut record: SaveRecord = bytemuck::pod_read_unaligned(bytes);
        // Stored little-endian regardless of host
        record.sector = i32::from_le(record.sector);
        record.score = i32::from_le(record.score);
        record.integrity = f32::from_bits(u32::from_le(record.integrity.to_bits()));
        Ok(record)
    }
}

/// Write the record atomically (tmp file, then rename)
pub fn save(path: &Path, record: &SaveRecord) -> RecoilResult<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, record.to_bytes())?;
    fs::rename(&tmp, path)?;
    log::info!(
        "Saved progress: sector {} score {} to {}",
        record.sector,
        record.score,
        path.display()
    );
    Ok(())
}

pub fn load(path: &Path) -> RecoilResult<SaveRecord> {
    let bytes = fs::read(path)?;
    SaveRecord::from_bytes(&bytes)
}
