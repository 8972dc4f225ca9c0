//! Read-only access to a single property area file.
//!
//! A property area is an append-only arena: a fixed header followed by trie
//! nodes and `prop_info` records. The trie cannot be walked without
//! replicating the host's internal layout, so lookups are done by brute-force
//! searching for the property name and stepping back to the record that owns
//! it. All integers are read in native byte order; the format is defined by
//! the platform that wrote it and is not portable.

use crate::props::error::{AreaError, Result};
use memchr::memmem::Finder;
use memmap2::{Mmap, MmapMut};
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

/// `PROP` in little-endian ASCII.
pub const PROP_AREA_MAGIC: u32 = 0x504f_5250;
pub const PROP_AREA_VERSION: u32 = 0xfc6e_d0ab;

/// bytes_used + serial + magic + version + 28 reserved bytes.
pub const HEADER_SIZE: usize = 4 + 4 + 4 + 4 + 28;

/// Inline value slot width of a `prop_info` record.
pub const PROP_VALUE_MAX: usize = 92;
/// Serial bit marking a value stored out of line.
pub const LONG_PROP_FLAG: u32 = 1 << 16;
const SERIAL_SIZE: usize = 4;
/// Distance from the start of a record to its name.
pub const NAME_OFFSET: usize = SERIAL_SIZE + PROP_VALUE_MAX;

/// Exclusive upper bound on an area's size, so 2^31 - 1 bytes is already too
/// large.
const MAX_AREA_SIZE: u64 = 0x7fff_ffff;

/// Returned when a value slot would be read past the end of the mapping.
pub const VALUE_OUT_OF_BOUNDS: &str = "<index out of bounds>";
/// Returned when a value slot holds no NUL terminator.
pub const VALUE_NO_TERMINATOR: &str = "<no terminator within value slot>";

/// Builds the on-disk path of a property area from its SELinux type name.
pub fn area_path(root: &Path, name: &str) -> PathBuf {
    root.join(format!("u:object_r:{name}:s0"))
}

/// A validated, read-only mapping of one property area.
pub struct PropArea {
    path: PathBuf,
    map: Mmap,
    bytes_used: u32,
    serial: u32,
}

impl std::fmt::Debug for PropArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropArea")
            .field("path", &self.path)
            .field("len", &self.map.len())
            .field("bytes_used", &self.bytes_used)
            .field("serial", &self.serial)
            .finish()
    }
}

impl PropArea {
    /// Opens the area named `name` under `root`.
    ///
    /// Returns [`AreaError::NotFound`] when the file is absent so callers can
    /// fall back to another alias without treating that as a failure.
    pub fn open<P: AsRef<Path>>(root: P, name: &str) -> Result<Self> {
        Self::open_path(area_path(root.as_ref(), name))
    }

    /// Opens and validates the area at an explicit path.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let metadata = match fs::metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AreaError::NotFound {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_file() {
            return Err(AreaError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let size = metadata.len();
        check_size(path, size)?;

        debug!(path = %path.display(), size, "Mapping property area");
        let file = File::open(path)?;
        // Safety: read-only mapping; the area is only ever appended to by its owner.
        let map = unsafe { Mmap::map(&file)? };
        Self::from_map(path.to_path_buf(), map)
    }

    /// Copies `bytes` into an anonymous read-only mapping and validates it
    /// as a property area.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let path = PathBuf::from("<memory>");
        check_size(&path, bytes.len() as u64)?;
        let mut map = MmapMut::map_anon(bytes.len())?;
        map.copy_from_slice(bytes);
        Self::from_map(path, map.make_read_only()?)
    }

    fn from_map(path: PathBuf, map: Mmap) -> Result<Self> {
        let bytes_used = read_u32(&map, 0).unwrap_or_default();
        let serial = read_u32(&map, 4).unwrap_or_default();
        let magic = read_u32(&map, 8).unwrap_or_default();
        if magic != PROP_AREA_MAGIC {
            return Err(AreaError::BadMagic { found: magic });
        }
        let version = read_u32(&map, 12).unwrap_or_default();
        if version != PROP_AREA_VERSION {
            return Err(AreaError::BadVersion { found: version });
        }
        trace!(path = %path.display(), bytes_used, serial, "Validated property area header");
        Ok(Self {
            path,
            map,
            bytes_used,
            serial,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Logical size declared by the header.
    pub fn bytes_used(&self) -> u32 {
        self.bytes_used
    }

    pub fn serial(&self) -> u32 {
        self.serial
    }

    /// Size of the whole mapping, header included.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }

    /// The record region following the header.
    pub fn data(&self) -> &[u8] {
        &self.map[HEADER_SIZE..]
    }

    /// Returns the inline value of every record whose name contains `key`.
    ///
    /// Every occurrence is reported, duplicates included: a read-only property
    /// that resolves to more than one value has been rewritten in place.
    /// Records with out-of-line values are skipped. Malformed slots produce
    /// [`VALUE_NO_TERMINATOR`] or [`VALUE_OUT_OF_BOUNDS`] instead of failing.
    pub fn find_values(&self, key: &str) -> Vec<String> {
        let values = find_values_in(self.data(), key.as_bytes());
        info!(
            area = %self.path.display(),
            key,
            values = ?values,
            "Found property values"
        );
        values
    }
}

fn check_size(path: &Path, size: u64) -> Result<()> {
    if size == 0 || size >= MAX_AREA_SIZE || size < HEADER_SIZE as u64 {
        return Err(AreaError::InvalidSize {
            path: path.to_path_buf(),
            size,
        });
    }
    Ok(())
}

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_ne_bytes(bytes.try_into().ok()?))
}

/// Scans `data` for `key` at every offset and decodes the owning records.
pub fn find_values_in(data: &[u8], key: &[u8]) -> Vec<String> {
    if key.is_empty() {
        return Vec::new();
    }
    let finder = Finder::new(key);
    let mut values = Vec::with_capacity(2);
    for offset in find_overlapping(data, &finder) {
        if offset < NAME_OFFSET {
            trace!(offset, "Match too close to the start of the area");
            continue;
        }
        let base = offset - NAME_OFFSET;
        let Some(serial) = read_u32(data, base) else {
            values.push(VALUE_OUT_OF_BOUNDS.to_string());
            continue;
        };
        if serial & LONG_PROP_FLAG != 0 {
            debug!(offset, serial, "Skipping long property");
            continue;
        }
        values.push(read_c_string(data, base + SERIAL_SIZE, PROP_VALUE_MAX));
    }
    values
}

/// Every start offset of `finder`'s needle in `haystack`, overlaps included.
fn find_overlapping<'a>(haystack: &'a [u8], finder: &'a Finder<'a>) -> impl Iterator<Item = usize> + 'a {
    let mut pos = 0usize;
    std::iter::from_fn(move || {
        let found = pos + finder.find(haystack.get(pos..)?)?;
        pos = found + 1;
        Some(found)
    })
}

/// Decodes a NUL-terminated string of at most `limit` bytes at `offset`.
pub fn read_c_string(data: &[u8], offset: usize, limit: usize) -> String {
    let Some(rest) = data.get(offset..) else {
        return VALUE_OUT_OF_BOUNDS.to_string();
    };
    let slot = &rest[..rest.len().min(limit)];
    match memchr::memchr(0, slot) {
        Some(end) => String::from_utf8_lossy(&slot[..end]).into_owned(),
        None if slot.len() < limit => VALUE_OUT_OF_BOUNDS.to_string(),
        None => VALUE_NO_TERMINATOR.to_string(),
    }
}
