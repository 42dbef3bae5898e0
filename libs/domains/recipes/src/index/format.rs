//! On-disk flat L2 index.
//!
//! Little-endian layout:
//!
//! ```text
//! magic    4 bytes  "SCIX"
//! version  u32      1
//! dim      u32
//! count    u64
//! records  count × (i64 id, dim × f32)
//! ```

use std::cmp::Ordering;
use std::path::Path;

use crate::error::{RecipeError, RecipeResult};

pub const INDEX_MAGIC: &[u8; 4] = b"SCIX";
pub const INDEX_VERSION: u32 = 1;
/// Id reserved for empty result slots; never stored in an index.
pub const NO_MATCH: i64 = -1;

const HEADER_LEN: usize = 4 + 4 + 4 + 8;

/// Immutable-after-build collection of `(id, vector)` pairs of one dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dimension: usize,
    ids: Vec<i64>,
    vectors: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> RecipeResult<Self> {
        if dimension == 0 {
            return Err(RecipeError::Config(
                "index dimension must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            dimension,
            ids: Vec::new(),
            vectors: Vec::new(),
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dimension)?;
        self.vectors.get(start..start + self.dimension)
    }

    pub fn add(&mut self, id: i64, vector: &[f32]) -> RecipeResult<()> {
        if id == NO_MATCH {
            return Err(RecipeError::Internal(format!(
                "id {NO_MATCH} is reserved for empty slots"
            )));
        }
        if vector.len() != self.dimension {
            return Err(RecipeError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(RecipeError::Internal(format!(
                "vector for recipe {id} contains non-finite values"
            )));
        }

        self.ids.push(id);
        self.vectors.extend_from_slice(vector);
        Ok(())
    }

    /// Exhaustive scan returning the `min(k, len)` nearest slots ordered by
    /// `(distance, id)`. Callers still treat `NO_MATCH` ids as empty slots.
    ///
    /// The query must already have the index dimension.
    pub fn scan(&self, query: &[f32], k: usize) -> Vec<(i64, f32)> {
        debug_assert_eq!(query.len(), self.dimension);

        let mut scored: Vec<(i64, f32)> = self
            .ids
            .iter()
            .zip(self.vectors.chunks_exact(self.dimension))
            .map(|(&id, vector)| (id, squared_l2(query, vector)))
            .collect();

        if k < scored.len() {
            scored.select_nth_unstable_by(k, by_distance_then_id);
            scored.truncate(k);
        }
        scored.sort_unstable_by(by_distance_then_id);
        scored
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let record_len = 8 + self.dimension * 4;
        let mut out = Vec::with_capacity(HEADER_LEN + self.len() * record_len);

        out.extend_from_slice(INDEX_MAGIC);
        out.extend_from_slice(&INDEX_VERSION.to_le_bytes());
        out.extend_from_slice(&(self.dimension as u32).to_le_bytes());
        out.extend_from_slice(&(self.len() as u64).to_le_bytes());

        for (id, vector) in self.ids.iter().zip(self.vectors.chunks_exact(self.dimension)) {
            out.extend_from_slice(&id.to_le_bytes());
            for value in vector {
                out.extend_from_slice(&value.to_le_bytes());
            }
        }
        out
    }

    /// Parse and validate a serialized index. `source` names the file in errors.
    pub fn from_bytes(bytes: &[u8], source: &str) -> RecipeResult<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(RecipeError::corrupt(source, "file is shorter than the header"));
        }
        if &bytes[0..4] != INDEX_MAGIC {
            return Err(RecipeError::corrupt(source, "bad magic"));
        }

        let version = read_u32(&bytes[4..8]);
        if version != INDEX_VERSION {
            return Err(RecipeError::corrupt(
                source,
                format!("unsupported version {version}"),
            ));
        }

        let dimension = read_u32(&bytes[8..12]) as usize;
        if dimension == 0 {
            return Err(RecipeError::corrupt(source, "dimension is zero"));
        }
        let count = read_u64(&bytes[12..20]);

        let record_len = 8 + dimension * 4;
        let expected_len = usize::try_from(count)
            .ok()
            .and_then(|c| c.checked_mul(record_len))
            .and_then(|body| body.checked_add(HEADER_LEN));
        if expected_len != Some(bytes.len()) {
            return Err(RecipeError::corrupt(
                source,
                format!(
                    "expected {count} records of dimension {dimension}, file is {} bytes",
                    bytes.len()
                ),
            ));
        }

        let count = count as usize;
        let mut ids = Vec::with_capacity(count);
        let mut vectors = Vec::with_capacity(count * dimension);
        for record in bytes[HEADER_LEN..].chunks_exact(record_len) {
            let id = read_i64(&record[0..8]);
            if id == NO_MATCH {
                return Err(RecipeError::corrupt(source, "record uses the reserved id -1"));
            }
            ids.push(id);
            for value in record[8..].chunks_exact(4) {
                let v = f32::from_le_bytes([value[0], value[1], value[2], value[3]]);
                if !v.is_finite() {
                    return Err(RecipeError::corrupt(
                        source,
                        format!("record {id} contains a non-finite value"),
                    ));
                }
                vectors.push(v);
            }
        }

        Ok(Self {
            dimension,
            ids,
            vectors,
        })
    }

    /// Read and validate an index file, requiring `expected_dimension`.
    pub fn load(path: &Path, expected_dimension: usize) -> RecipeResult<Self> {
        let source = path.display().to_string();
        let bytes = std::fs::read(path).map_err(|e| RecipeError::corrupt(&source, e))?;
        let index = Self::from_bytes(&bytes, &source)?;

        if index.dimension != expected_dimension {
            return Err(RecipeError::DimensionMismatch {
                expected: expected_dimension,
                actual: index.dimension,
            });
        }
        Ok(index)
    }

    /// Write to `path` through a sibling temp file and rename, so readers
    /// never observe a half-written index.
    pub fn write_to(&self, path: &Path) -> RecipeResult<()> {
        let tmp = path.with_extension("idx.tmp");
        std::fs::write(&tmp, self.to_bytes())
            .and_then(|_| std::fs::rename(&tmp, path))
            .map_err(|e| {
                RecipeError::Internal(format!("failed to write {}: {e}", path.display()))
            })
    }
}

fn by_distance_then_id(a: &(i64, f32), b: &(i64, f32)) -> Ordering {
    a.1.total_cmp(&b.1).then(a.0.cmp(&b.0))
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

fn read_i64(bytes: &[u8]) -> i64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    i64::from_le_bytes(buf)
}
