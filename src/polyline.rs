//! Encoded polyline codec and route geometry types.
//!
//! The provider compresses route geometry into a compact printable ASCII
//! string: per-axis deltas in 1e-5 degree units, zig-zag folded, emitted as
//! base-32 chunks offset into the printable range. This module provides the
//! codec and the decoded representation.
//!
//! Encoding/decoding happens at the boundary (when receiving a provider
//! response); internal processing works on decoded coordinates.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Degrees per quantization unit (5 decimal digits, ~1.1m resolution).
const PRECISION: f64 = 1e-5;

/// A latitude/longitude pair quantized to 1e-5 degree units.
///
/// Stored as integer units so that equality is exact and rendering at
/// 5 decimal places is lossless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    lat_e5: i64,
    lon_e5: i64,
}

impl Coordinate {
    /// Quantizes real-valued degrees, truncating toward zero.
    ///
    /// Values that are exact 1e-5 multiples snap to the integer despite
    /// binary representation error (`-120.2 * 1e5` is `-12019999.999…` in
    /// f64; a bare truncation would be off by one unit).
    pub fn from_degrees(lat: f64, lon: f64) -> Self {
        Self {
            lat_e5: quantize(lat),
            lon_e5: quantize(lon),
        }
    }

    pub fn from_e5(lat_e5: i64, lon_e5: i64) -> Self {
        Self { lat_e5, lon_e5 }
    }

    pub fn lat(&self) -> f64 {
        self.lat_e5 as f64 * PRECISION
    }

    pub fn lon(&self) -> f64 {
        self.lon_e5 as f64 * PRECISION
    }

    pub fn lat_e5(&self) -> i64 {
        self.lat_e5
    }

    pub fn lon_e5(&self) -> i64 {
        self.lon_e5
    }
}

impl std::fmt::Display for Coordinate {
    /// Renders exactly 5 decimal places, matching the codec resolution.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.5},{:.5}", self.lat(), self.lon())
    }
}

fn quantize(degrees: f64) -> i64 {
    let scaled = degrees / PRECISION;
    let nearest = scaled.round();
    if (scaled - nearest).abs() < 1e-6 {
        nearest as i64
    } else {
        scaled.trunc() as i64
    }
}

/// A polyline representing a route geometry as decoded coordinates.
///
/// The original encoded string is not stored here; a `Path` keeps it for
/// round-trip and debugging purposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Coordinate>,
}

impl Polyline {
    pub fn new(points: Vec<Coordinate>) -> Self {
        Self { points }
    }

    /// Returns a reference to the coordinate points.
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    /// Consumes the polyline and returns the owned coordinate points.
    pub fn into_points(self) -> Vec<Coordinate> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Encodes a coordinate sequence into the provider's polyline format.
///
/// No range validation is performed; out-of-range input produces a
/// well-formed but meaningless string. Values whose quantized form exceeds
/// the accumulator range are a documented limitation.
pub fn encode(points: &[Coordinate]) -> String {
    let mut out = String::new();
    let mut prev_lat = 0i64;
    let mut prev_lon = 0i64;
    for point in points {
        emit_value(point.lat_e5 - prev_lat, &mut out);
        emit_value(point.lon_e5 - prev_lon, &mut out);
        prev_lat = point.lat_e5;
        prev_lon = point.lon_e5;
    }
    out
}

/// Zig-zag folds a delta and emits it as 5-bit chunks, low bits first.
/// Each chunk carries a continuation bit (0x20) and a +63 printable offset.
fn emit_value(delta: i64, out: &mut String) {
    let folded = if delta < 0 { !(delta << 1) } else { delta << 1 };
    let mut value = folded as u64;
    while value >= 0x20 {
        out.push((((value & 0x1f) | 0x20) as u8 + 63) as char);
        value >>= 5;
    }
    out.push((value as u8 + 63) as char);
}

/// Decodes an encoded polyline string.
///
/// The empty string decodes to an empty series. A stream that ends mid-chunk
/// or after an unpaired latitude fails with [`Error::MalformedPolyline`].
pub fn decode(encoded: &str) -> Result<Polyline, Error> {
    let bytes = encoded.as_bytes();
    let mut pos = 0usize;
    let mut lat = 0i64;
    let mut lon = 0i64;
    let mut points = Vec::new();
    while pos < bytes.len() {
        lat += read_delta(bytes, &mut pos)?;
        if pos >= bytes.len() {
            // latitude without a matching longitude
            return Err(Error::MalformedPolyline { at: pos });
        }
        lon += read_delta(bytes, &mut pos)?;
        points.push(Coordinate::from_e5(lat, lon));
    }
    Ok(Polyline::new(points))
}

fn read_delta(bytes: &[u8], pos: &mut usize) -> Result<i64, Error> {
    let mut value: u64 = 0;
    let mut shift = 0u32;
    loop {
        let Some(&byte) = bytes.get(*pos) else {
            return Err(Error::MalformedPolyline { at: *pos });
        };
        *pos += 1;
        let chunk = i64::from(byte) - 63;
        value |= ((chunk & 0x1f) as u64) << shift;
        shift += 5;
        if chunk & 0x20 == 0 {
            break;
        }
    }
    if value & 1 == 1 {
        Ok(!((value >> 1) as i64))
    } else {
        Ok((value >> 1) as i64)
    }
}
