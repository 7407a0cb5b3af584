//! # Path blob codec
//!
//! Paths are stored as text safe blobs: the path is written into a compact little endian binary
//! layout, compressed with zlib and then base64 encoded.
//!
//! The binary layout is:
//!
//! ```text
//! magic           [u8; 4] = b"PATH"
//! version         u8      = 1
//! waypoint count  u32
//!     point flag      u8 (0 = no point, 1 = point follows)
//!     point           f64 lat_deg, f64 lon_deg, f64 alt_m
//!     action count    u32
//!         key length      u32
//!         key             [u8; key length], UTF-8
//!         value           i32
//! obstacle count  u32
//!     kind            u8 (0 = circle, 1 = ring)
//!     circle          point, f64 radius_m
//!     ring            u32 point count, points
//! ```

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::convert::TryFrom;
use std::io::{Cursor, Read, Write};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};

use crate::geodesy::GeoPoint;
use crate::path::{Action, Obstacle, Path, Waypoint};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const MAGIC: &[u8; 4] = b"PATH";

const VERSION: u8 = 1;

const OBSTACLE_CIRCLE: u8 = 0;
const OBSTACLE_RING: u8 = 1;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur when decoding a path blob.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Failed to decode the path blob from base64: {0}")]
    Base64(base64::DecodeError),

    #[error("Failed to decompress the path blob: {0}")]
    Decompress(std::io::Error),

    #[error("The path data does not start with the expected magic bytes")]
    BadMagic,

    #[error("Unsupported path data version {0}")]
    UnsupportedVersion(u8),

    #[error("The path data ended unexpectedly")]
    UnexpectedEof,

    #[error("Invalid waypoint point flag {0}")]
    InvalidPointFlag(u8),

    #[error("Unknown obstacle kind {0}")]
    UnknownObstacleKind(u8),

    #[error("An action key is not valid UTF-8")]
    InvalidUtf8,

    #[error("{0} unexpected bytes after the end of the path data")]
    TrailingBytes(usize),
}

/// Errors which can occur when encoding a path blob.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("Failed to compress the path data: {0}")]
    Compress(std::io::Error),

    #[error("Too many elements to encode ({0})")]
    TooLong(usize),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Path {
    /// Decode a path from a serialized (base64, zlib compressed) blob.
    ///
    /// Leading and trailing whitespace around the blob is ignored.
    pub fn decode<B: AsRef<[u8]>>(blob: B) -> Result<Self, DecodeError> {
        let trimmed = trim_ascii_whitespace(blob.as_ref());

        let compressed = base64::decode(trimmed).map_err(DecodeError::Base64)?;

        let mut raw = Vec::new();
        ZlibDecoder::new(compressed.as_slice())
            .read_to_end(&mut raw)
            .map_err(DecodeError::Decompress)?;

        Self::from_bytes(&raw)
    }

    /// Encode the path into a serialized (base64, zlib compressed) blob.
    pub fn encode(&self) -> Result<String, EncodeError> {
        let raw = self.to_bytes()?;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&raw).map_err(EncodeError::Compress)?;
        let compressed = encoder.finish().map_err(EncodeError::Compress)?;

        Ok(base64::encode(compressed))
    }

    /// Parse a path from its uncompressed binary layout.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut cursor = Cursor::new(bytes);

        let mut magic = [0u8; 4];
        cursor.read_exact(&mut magic).map_err(|_| DecodeError::UnexpectedEof)?;
        if &magic != MAGIC {
            return Err(DecodeError::BadMagic);
        }

        let version = read_u8(&mut cursor)?;
        if version != VERSION {
            return Err(DecodeError::UnsupportedVersion(version));
        }

        let mut path = Path::new_empty();

        for _ in 0..read_u32(&mut cursor)? {
            path.waypoints.push(read_waypoint(&mut cursor)?);
        }

        for _ in 0..read_u32(&mut cursor)? {
            path.obstacles.push(read_obstacle(&mut cursor)?);
        }

        let consumed = cursor.position() as usize;
        if consumed != bytes.len() {
            return Err(DecodeError::TrailingBytes(bytes.len() - consumed));
        }

        Ok(path)
    }

    /// Write the path into its uncompressed binary layout.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let mut out = BlobWriter::default();

        out.bytes.extend_from_slice(MAGIC);
        out.u8(VERSION);

        out.len(self.waypoints.len())?;
        for waypoint in self.waypoints.iter() {
            match waypoint.point {
                Some(ref p) => {
                    out.u8(1);
                    out.point(p);
                }
                None => out.u8(0),
            }

            out.len(waypoint.actions.len())?;
            for action in waypoint.actions.iter() {
                out.len(action.key.len())?;
                out.bytes.extend_from_slice(action.key.as_bytes());
                out.i32(action.value);
            }
        }

        out.len(self.obstacles.len())?;
        for obstacle in self.obstacles.iter() {
            match obstacle {
                Obstacle::Circle { centre, radius_m } => {
                    out.u8(OBSTACLE_CIRCLE);
                    out.point(centre);
                    out.f64(*radius_m);
                }
                Obstacle::Ring { points } => {
                    out.u8(OBSTACLE_RING);
                    out.len(points.len())?;
                    for p in points.iter() {
                        out.point(p);
                    }
                }
            }
        }

        Ok(out.bytes)
    }
}

/// Accumulates the binary layout of a path.
#[derive(Default)]
struct BlobWriter {
    bytes: Vec<u8>,
}

impl BlobWriter {
    fn u8(&mut self, v: u8) {
        self.bytes.push(v);
    }

    fn i32(&mut self, v: i32) {
        let mut buf = [0u8; 4];
        LittleEndian::write_i32(&mut buf, v);
        self.bytes.extend_from_slice(&buf);
    }

    fn f64(&mut self, v: f64) {
        let mut buf = [0u8; 8];
        LittleEndian::write_f64(&mut buf, v);
        self.bytes.extend_from_slice(&buf);
    }

    /// Write a collection length as a `u32`.
    fn len(&mut self, len: usize) -> Result<(), EncodeError> {
        let len = u32::try_from(len).map_err(|_| EncodeError::TooLong(len))?;

        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, len);
        self.bytes.extend_from_slice(&buf);
        Ok(())
    }

    fn point(&mut self, p: &GeoPoint) {
        self.f64(p.lat_deg);
        self.f64(p.lon_deg);
        self.f64(p.alt_m);
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn trim_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or_else(|| bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map(|i| i + 1)
        .unwrap_or(start);

    &bytes[start..end]
}

fn read_waypoint(cursor: &mut Cursor<&[u8]>) -> Result<Waypoint, DecodeError> {
    let point = match read_u8(cursor)? {
        0 => None,
        1 => Some(read_point(cursor)?),
        f => return Err(DecodeError::InvalidPointFlag(f)),
    };

    let mut actions = Vec::new();
    for _ in 0..read_u32(cursor)? {
        let key_len = read_u32(cursor)? as usize;
        let mut key = Vec::new();
        cursor
            .by_ref()
            .take(key_len as u64)
            .read_to_end(&mut key)
            .map_err(|_| DecodeError::UnexpectedEof)?;
        if key.len() != key_len {
            return Err(DecodeError::UnexpectedEof);
        }

        let key = String::from_utf8(key).map_err(|_| DecodeError::InvalidUtf8)?;
        let value = cursor
            .read_i32::<LittleEndian>()
            .map_err(|_| DecodeError::UnexpectedEof)?;

        actions.push(Action { key, value });
    }

    Ok(Waypoint { point, actions })
}

fn read_obstacle(cursor: &mut Cursor<&[u8]>) -> Result<Obstacle, DecodeError> {
    match read_u8(cursor)? {
        OBSTACLE_CIRCLE => Ok(Obstacle::Circle {
            centre: read_point(cursor)?,
            radius_m: read_f64(cursor)?,
        }),
        OBSTACLE_RING => {
            let mut points = Vec::new();
            for _ in 0..read_u32(cursor)? {
                points.push(read_point(cursor)?);
            }
            Ok(Obstacle::Ring { points })
        }
        k => Err(DecodeError::UnknownObstacleKind(k)),
    }
}

fn read_point(cursor: &mut Cursor<&[u8]>) -> Result<GeoPoint, DecodeError> {
    Ok(GeoPoint {
        lat_deg: read_f64(cursor)?,
        lon_deg: read_f64(cursor)?,
        alt_m: read_f64(cursor)?,
    })
}

// All reads are from an in-memory buffer, so the only possible IO error is running out of data.

fn read_u8(cursor: &mut Cursor<&[u8]>) -> Result<u8, DecodeError> {
    cursor.read_u8().map_err(|_| DecodeError::UnexpectedEof)
}

fn read_u32(cursor: &mut Cursor<&[u8]>) -> Result<u32, DecodeError> {
    cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| DecodeError::UnexpectedEof)
}

fn read_f64(cursor: &mut Cursor<&[u8]>) -> Result<f64, DecodeError> {
    cursor
        .read_f64::<LittleEndian>()
        .map_err(|_| DecodeError::UnexpectedEof)
}
