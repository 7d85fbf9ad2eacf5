// File-level I/O helpers for posting lists.
//
// Raw lists are flat arrays of native-endian u64 records. Compressed lists
// are bare vbyte streams (see `vbyte`). Everything here is a thin adapter:
// read a whole file, hand the bytes to the pure codec, write the result with
// buffered I/O.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::intersect::batch::PostingSource;
use crate::vbyte::{self, DecodeError, sequence};

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `compress_file()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressStats {
    /// Raw input size in bytes.
    pub input_size: u64,
    /// Compressed output size in bytes.
    pub output_size: u64,
    /// Number of integers encoded.
    pub values: u64,
}

impl CompressStats {
    /// Compressed size over raw size (0.0 for an empty input).
    pub fn ratio(&self) -> f64 {
        if self.input_size == 0 {
            0.0
        } else {
            self.output_size as f64 / self.input_size as f64
        }
    }
}

/// Statistics returned by `decompress_file()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecompressStats {
    /// Compressed input size in bytes.
    pub input_size: u64,
    /// Raw output size in bytes.
    pub output_size: u64,
    /// Number of integers decoded.
    pub values: u64,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for file operations.
#[derive(Debug, Error)]
pub enum IoError {
    /// The file could not be opened or read.
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The file could not be created or written.
    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A raw list whose size is not a whole number of 8-byte records.
    #[error("{}: size {len} is not a multiple of 8", .path.display())]
    Misaligned { path: PathBuf, len: u64 },
    /// The compressed stream is malformed.
    #[error("{}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
}

// ---------------------------------------------------------------------------
// Compression mode and naming
// ---------------------------------------------------------------------------

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

const RECORD_SIZE: usize = std::mem::size_of::<u64>();

/// How a raw list is turned into a compressed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressMode {
    /// Encode values in file order.
    #[default]
    Plain,
    /// Sort, then encode successive differences.
    Sorted,
}

impl CompressMode {
    /// File name suffix appended to the raw input's name.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Plain => ".vb",
            Self::Sorted => ".sorted.vb",
        }
    }

    /// Whether files in this mode must be decoded with a prefix sum.
    pub fn is_delta(self) -> bool {
        matches!(self, Self::Sorted)
    }
}

/// `path` with `suffix` appended to its file name.
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

// ---------------------------------------------------------------------------
// Raw records
// ---------------------------------------------------------------------------

/// Interpret `bytes` as native-endian u64 records.
/// Returns `None` if the length is not a multiple of 8.
pub fn u64s_from_ne_bytes(bytes: &[u8]) -> Option<Vec<u64>> {
    if !bytes.len().is_multiple_of(RECORD_SIZE) {
        return None;
    }
    Some(
        bytes
            .chunks_exact(RECORD_SIZE)
            .map(|c| {
                let mut rec = [0u8; RECORD_SIZE];
                rec.copy_from_slice(c);
                u64::from_ne_bytes(rec)
            })
            .collect(),
    )
}

/// Read a raw list of native-endian u64 records.
pub fn read_raw(path: &Path) -> Result<Vec<u64>, IoError> {
    let bytes = read_bytes(path)?;
    let values = u64s_from_ne_bytes(&bytes).ok_or_else(|| IoError::Misaligned {
        path: path.to_path_buf(),
        len: bytes.len() as u64,
    })?;
    log::debug!("read {} raw value(s) from {}", values.len(), path.display());
    Ok(values)
}

/// Write `values` as native-endian u64 records.
pub fn write_raw(path: &Path, values: &[u64]) -> Result<u64, IoError> {
    write_with(path, |w| {
        for v in values {
            w.write_all(&v.to_ne_bytes())?;
        }
        Ok(())
    })?;
    Ok((values.len() * RECORD_SIZE) as u64)
}

// ---------------------------------------------------------------------------
// Compressed lists
// ---------------------------------------------------------------------------

/// Read and decode a compressed list.
///
/// With `delta`, the file must have been written in [`CompressMode::Sorted`].
pub fn read_encoded(path: &Path, delta: bool) -> Result<Vec<u64>, IoError> {
    let bytes = read_bytes(path)?;
    let values = vbyte::decode(&bytes, delta).map_err(|source| IoError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!(
        "decoded {} value(s) from {} ({} bytes)",
        values.len(),
        path.display(),
        bytes.len()
    );
    Ok(values)
}

/// Write an already-encoded buffer.
pub fn write_encoded(path: &Path, encoded: &[u8]) -> Result<u64, IoError> {
    write_with(path, |w| w.write_all(encoded))?;
    Ok(encoded.len() as u64)
}

// ---------------------------------------------------------------------------
// compress_file / decompress_file
// ---------------------------------------------------------------------------

/// Compress the raw list at `input` into `output`.
pub fn compress_file(
    input: &Path,
    output: &Path,
    mode: CompressMode,
) -> Result<CompressStats, IoError> {
    let values = read_raw(input)?;
    let encoded = match mode {
        CompressMode::Plain => vbyte::encode(&values, false),
        CompressMode::Sorted => vbyte::sort_and_delta_encode(&values),
    };
    let output_size = write_encoded(output, &encoded)?;

    let stats = CompressStats {
        input_size: (values.len() * RECORD_SIZE) as u64,
        output_size,
        values: values.len() as u64,
    };
    log::debug!(
        "compressed {} -> {} ({:?}): {} -> {} bytes",
        input.display(),
        output.display(),
        mode,
        stats.input_size,
        stats.output_size
    );
    Ok(stats)
}

/// Decompress `input` back into a raw list at `output`.
pub fn decompress_file(
    input: &Path,
    output: &Path,
    delta: bool,
) -> Result<DecompressStats, IoError> {
    let input_size = file_len(input)?;
    let values = read_encoded(input, delta)?;
    let output_size = write_raw(output, &values)?;
    Ok(DecompressStats {
        input_size,
        output_size,
        values: values.len() as u64,
    })
}

// ---------------------------------------------------------------------------
// Directory-backed posting source
// ---------------------------------------------------------------------------

/// Loads compressed lists named `<dir>/<prefix><id><suffix>`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    pub dir: PathBuf,
    pub prefix: String,
    pub suffix: String,
    /// Files were written in [`CompressMode::Sorted`]; otherwise lists are
    /// sorted after decoding.
    pub delta: bool,
}

impl Default for DirectorySource {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            prefix: "F".to_string(),
            suffix: CompressMode::Plain.suffix().to_string(),
            delta: false,
        }
    }
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Default::default()
        }
    }

    pub fn path_for(&self, id: u64) -> PathBuf {
        self.dir.join(format!("{}{id}{}", self.prefix, self.suffix))
    }
}

impl PostingSource for DirectorySource {
    type Error = IoError;

    fn load(&self, id: u64) -> Result<Vec<u64>, IoError> {
        let mut values = read_encoded(&self.path_for(id), self.delta)?;
        if !self.delta {
            sequence::sort_ascending(&mut values);
        }
        Ok(values)
    }
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

/// Read a whole file, mapping failures to [`IoError::Read`].
pub fn read_bytes(path: &Path) -> Result<Vec<u8>, IoError> {
    std::fs::read(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn file_len(path: &Path) -> Result<u64, IoError> {
    std::fs::metadata(path)
        .map(|m| m.len())
        .map_err(|source| IoError::Read {
            path: path.to_path_buf(),
            source,
        })
}

fn write_with(
    path: &Path,
    body: impl FnOnce(&mut BufWriter<File>) -> io::Result<()>,
) -> Result<(), IoError> {
    let wrap = |source| IoError::Write {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(wrap)?;
    let mut writer = BufWriter::with_capacity(BUF_SIZE, file);
    body(&mut writer).map_err(wrap)?;
    writer.flush().map_err(wrap)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
