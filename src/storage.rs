//! Binary I/O for solved tables, plus JSON export of policy trees.
//!
//! Table format: 32-byte header followed by `value` then `best_price`, each
//! (N+1)·(N+1)·M f64 little-endian in `state_index` order.
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | magic `"PRDP"` |
//! | 4 | 4 | version |
//! | 8 | 4 | N (rounds) |
//! | 12 | 4 | M (grid points) |
//! | 16 | 4 | terminal-reward tag |
//! | 20 | 12 | reserved (zero) |
//!
//! Loading maps the file with `memmap2` and decodes straight from the mapping.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use memmap2::Mmap;
use tracing::{info, warn};

use crate::constants::*;
use crate::error::{PricingError, Result};
use crate::policy::Policy;
use crate::types::{SolvedTable, SolverConfig, TerminalReward};

struct TableFileHeader {
    magic: u32,
    version: u32,
    rounds: u32,
    grid_points: u32,
    terminal_reward: u32,
}

impl TableFileHeader {
    fn to_bytes(&self) -> [u8; TABLE_HEADER_BYTES] {
        let mut bytes = [0u8; TABLE_HEADER_BYTES];
        let fields = [
            self.magic,
            self.version,
            self.rounds,
            self.grid_points,
            self.terminal_reward,
        ];
        for (chunk, field) in bytes.chunks_exact_mut(4).zip(fields) {
            chunk.copy_from_slice(&field.to_le_bytes());
        }
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let word = |at: usize| -> Option<u32> {
            let raw: [u8; 4] = bytes.get(at..at + 4)?.try_into().ok()?;
            Some(u32::from_le_bytes(raw))
        };
        Some(Self {
            magic: word(0)?,
            version: word(4)?,
            rounds: word(8)?,
            grid_points: word(12)?,
            terminal_reward: word(16)?,
        })
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        PricingError::InvalidConfig(format!("{what}={value} does not fit the table header"))
    })
}

/// Save a solved table.
pub fn save_table(path: impl AsRef<Path>, table: &SolvedTable) -> Result<()> {
    let path = path.as_ref();
    let start_time = Instant::now();
    ensure_parent(path)?;

    let header = TableFileHeader {
        magic: TABLE_FILE_MAGIC,
        version: TABLE_FILE_VERSION,
        rounds: to_u32(table.n(), "rounds")?,
        grid_points: to_u32(table.m(), "grid_points")?,
        terminal_reward: table.terminal_reward().tag(),
    };

    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(&header.to_bytes())?;
    for array in [table.values(), table.best_prices()] {
        for v in array {
            out.write_all(&v.to_le_bytes())?;
        }
    }
    out.flush()?;

    info!(
        path = %path.display(),
        states = table.values().len(),
        ms = format_args!("{:.2}", start_time.elapsed().as_secs_f64() * 1000.0),
        "saved table"
    );
    Ok(())
}

fn decode_f64s(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(8)
        .map(|chunk| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect()
}

fn invalid(path: &Path, msg: String) -> PricingError {
    warn!(path = %path.display(), "{}", msg);
    PricingError::InvalidFormat(msg)
}

/// Load a table written by [`save_table`].
pub fn load_table(path: impl AsRef<Path>) -> Result<SolvedTable> {
    let path = path.as_ref();
    let start_time = Instant::now();
    let file = File::open(path)?;
    // SAFETY: the mapping is read-only and dropped before this function returns.
    let mmap = unsafe { Mmap::map(&file)? };

    let header = TableFileHeader::from_bytes(&mmap)
        .ok_or_else(|| invalid(path, format!("file is {} bytes, shorter than header", mmap.len())))?;
    if header.magic != TABLE_FILE_MAGIC || header.version != TABLE_FILE_VERSION {
        return Err(invalid(
            path,
            format!(
                "magic=0x{:08x} version={} (expected 0x{:08x} version={})",
                header.magic, header.version, TABLE_FILE_MAGIC, TABLE_FILE_VERSION
            ),
        ));
    }
    let terminal_reward = TerminalReward::from_tag(header.terminal_reward).ok_or_else(|| {
        invalid(
            path,
            format!("unknown terminal reward tag {}", header.terminal_reward),
        )
    })?;

    let config = SolverConfig {
        rounds: header.rounds as usize,
        grid_points: header.grid_points as usize,
        terminal_reward,
    };
    config.validate()?;
    let states = num_states(config.rounds, config.grid_points).unwrap_or_default();
    let expected_size = states
        .checked_mul(2 * std::mem::size_of::<f64>())
        .and_then(|body| body.checked_add(TABLE_HEADER_BYTES));
    if expected_size != Some(mmap.len()) {
        return Err(invalid(
            path,
            format!(
                "size mismatch: expected {:?} bytes, got {}",
                expected_size,
                mmap.len()
            ),
        ));
    }

    let body = &mmap[TABLE_HEADER_BYTES..];
    let (value_bytes, price_bytes) = body.split_at(states * 8);
    let table = SolvedTable::from_parts(&config, decode_f64s(value_bytes), decode_f64s(price_bytes))?;

    info!(
        path = %path.display(),
        states,
        ms = format_args!("{:.2}", start_time.elapsed().as_secs_f64() * 1000.0),
        "loaded table"
    );
    Ok(table)
}

/// Write a policy tree as nested JSON (`value`, `accept`, `reject`).
pub fn save_policy_json(path: impl AsRef<Path>, policy: &Policy) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, policy)?;
    out.flush()?;
    info!(path = %path.display(), nodes = policy.node_count(), "saved policy");
    Ok(())
}

/// Read a policy tree written by [`save_policy_json`].
pub fn load_policy_json(path: impl AsRef<Path>) -> Result<Policy> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout() {
        let header = TableFileHeader {
            magic: TABLE_FILE_MAGIC,
            version: TABLE_FILE_VERSION,
            rounds: 3,
            grid_points: 500,
            terminal_reward: 1,
        };
        let bytes = header.to_bytes();
        assert_eq!(&bytes[0..4], b"PRDP");
        assert_eq!(&bytes[20..], &[0u8; 12]);
        let back = TableFileHeader::from_bytes(&bytes).unwrap();
        assert_eq!(back.rounds, 3);
        assert_eq!(back.grid_points, 500);
        assert_eq!(back.terminal_reward, 1);
    }

    #[test]
    fn short_header_rejected() {
        assert!(TableFileHeader::from_bytes(&[0u8; 10]).is_none());
    }
}
