//! Exhaustive L2 index stored in a single binary file

use bytes::{Buf, BufMut, Bytes, BytesMut};
use ndarray::{Array2, ArrayView1};
use std::path::Path;

use crate::error::{Error, Result};

use super::{Neighbors, VectorIndex, NO_NEIGHBOR};

const MAGIC: &[u8; 4] = b"GRVI";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

/// Flat (brute-force) index over squared Euclidean distance
#[derive(Debug, Clone)]
pub struct FlatL2Index {
    /// One row per vector, in ordinal order
    vectors: Array2<f32>,
}

impl FlatL2Index {
    /// Create an empty index of the given dimensionality
    pub fn new(dimensions: usize) -> Self {
        Self {
            vectors: Array2::zeros((0, dimensions)),
        }
    }

    /// Build an index from row vectors; all rows must share one length
    pub fn from_vectors(dimensions: usize, vectors: &[Vec<f32>]) -> Result<Self> {
        let mut flat = Vec::with_capacity(vectors.len() * dimensions);
        for (ordinal, vector) in vectors.iter().enumerate() {
            if vector.len() != dimensions {
                return Err(Error::vector_index(format!(
                    "vector {} has dimension {}, expected {}",
                    ordinal,
                    vector.len(),
                    dimensions
                )));
            }
            flat.extend_from_slice(vector);
        }

        let vectors = Array2::from_shape_vec((vectors.len(), dimensions), flat)
            .map_err(|e| Error::vector_index(e.to_string()))?;

        Ok(Self { vectors })
    }

    /// Read an index file
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| Error::index_load(path, e.to_string()))?;
        Self::decode(Bytes::from(data)).map_err(|message| Error::index_load(path, message))
    }

    /// Write the index file
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.encode())?;
        Ok(())
    }

    fn encode(&self) -> Bytes {
        let (count, dimensions) = self.vectors.dim();
        let mut buf = BytesMut::with_capacity(HEADER_LEN + count * dimensions * 4);
        buf.put_slice(MAGIC);
        buf.put_u32_le(FORMAT_VERSION);
        buf.put_u32_le(dimensions as u32);
        buf.put_u64_le(count as u64);
        for value in self.vectors.iter() {
            buf.put_f32_le(*value);
        }
        buf.freeze()
    }

    fn decode(mut buf: Bytes) -> std::result::Result<Self, String> {
        if buf.remaining() < HEADER_LEN {
            return Err("file is shorter than the index header".to_string());
        }

        let magic = buf.copy_to_bytes(4);
        if magic.as_ref() != MAGIC {
            return Err("not a vector index file (bad magic)".to_string());
        }

        let version = buf.get_u32_le();
        if version != FORMAT_VERSION {
            return Err(format!("unsupported index format version {}", version));
        }

        let dimensions = buf.get_u32_le() as usize;
        let count = usize::try_from(buf.get_u64_le())
            .map_err(|_| "vector count does not fit in memory".to_string())?;

        if count > 0 && dimensions == 0 {
            return Err("index declares vectors of dimension 0".to_string());
        }

        let expected = count
            .checked_mul(dimensions)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| "index size overflows".to_string())?;
        if buf.remaining() != expected {
            return Err(format!(
                "expected {} bytes of vector data for {} x {}, found {}",
                expected,
                count,
                dimensions,
                buf.remaining()
            ));
        }

        let mut flat = Vec::with_capacity(count * dimensions);
        while buf.has_remaining() {
            flat.push(buf.get_f32_le());
        }

        let vectors =
            Array2::from_shape_vec((count, dimensions), flat).map_err(|e| e.to_string())?;

        Ok(Self { vectors })
    }
}

impl VectorIndex for FlatL2Index {
    fn len(&self) -> usize {
        self.vectors.nrows()
    }

    fn dimensions(&self) -> usize {
        self.vectors.ncols()
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Neighbors> {
        if query.len() != self.dimensions() {
            return Err(Error::vector_index(format!(
                "query has dimension {}, index has {}",
                query.len(),
                self.dimensions()
            )));
        }

        let query = ArrayView1::from(query);
        let mut scored: Vec<(f32, usize)> = self
            .vectors
            .outer_iter()
            .enumerate()
            .map(|(ordinal, row)| {
                let distance = row
                    .iter()
                    .zip(query.iter())
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum::<f32>();
                (distance, ordinal)
            })
            .collect();

        // Ascending distance, lower ordinal first on ties
        scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        scored.truncate(k);

        let mut neighbors = Neighbors {
            distances: Vec::with_capacity(k),
            ordinals: Vec::with_capacity(k),
        };
        for (distance, ordinal) in scored {
            neighbors.distances.push(distance);
            neighbors.ordinals.push(ordinal as i64);
        }
        while neighbors.ordinals.len() < k {
            neighbors.distances.push(f32::MAX);
            neighbors.ordinals.push(NO_NEIGHBOR);
        }

        Ok(neighbors)
    }
}
