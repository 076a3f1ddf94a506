//! GEOMETRY column decoder.
//!
//! Spatial values travel as a 4-byte SRID followed by a WKB body:
//!
//! ```text
//! [srid:4 LE][byte_order:1][wkb_type:4][payload...]
//! ```
//!
//! `byte_order` 0x01 selects little-endian for the type code and payload,
//! 0x00 big-endian. Collections nest full WKB bodies without an SRID.

use crate::error::{Error, Result};
use crate::protocol::buffer::{ReadBuffer, WriteBuffer};
use crate::protocol::constants::{
    WKB_GEOMETRYCOLLECTION, WKB_LINESTRING, WKB_MULTILINESTRING, WKB_MULTIPOINT,
    WKB_MULTIPOLYGON, WKB_POINT, WKB_POLYGON,
};
use crate::protocol::types::{Geometry, LineString, Point, Polygon};

/// Deepest collection nesting accepted in one field.
const MAX_WKB_DEPTH: usize = 32;

/// Byte-order aware reader over a WKB body.
struct WkbReader<'a> {
    buf: &'a mut ReadBuffer,
    little_endian: bool,
}

impl<'a> WkbReader<'a> {
    fn u32(&mut self) -> Result<u32> {
        let v = self.buf.read_u32_le()?;
        Ok(if self.little_endian { v } else { v.swap_bytes() })
    }

    fn f64(&mut self) -> Result<f64> {
        let bits = self.buf.read_u64_le()?;
        Ok(f64::from_bits(if self.little_endian {
            bits
        } else {
            bits.swap_bytes()
        }))
    }

    fn point(&mut self) -> Result<Point> {
        Ok(Point::new(self.f64()?, self.f64()?))
    }

    fn points(&mut self) -> Result<Vec<Point>> {
        let n = self.u32()? as usize;
        let mut points = Vec::with_capacity(n.min(self.buf.remaining() / 16));
        for _ in 0..n {
            points.push(self.point()?);
        }
        Ok(points)
    }

    fn rings(&mut self) -> Result<Vec<LineString>> {
        let n = self.u32()? as usize;
        let mut rings = Vec::with_capacity(n.min(self.buf.remaining() / 4));
        for _ in 0..n {
            rings.push(LineString::new(self.points()?));
        }
        Ok(rings)
    }
}

/// Read one WKB body (byte order, type code and payload).
pub fn read_wkb(buf: &mut ReadBuffer) -> Result<Geometry> {
    read_nested_wkb(buf, 0)
}

fn read_nested_wkb(buf: &mut ReadBuffer, depth: usize) -> Result<Geometry> {
    if depth > MAX_WKB_DEPTH {
        return Err(Error::protocol(format!(
            "Geometry nests deeper than {} levels",
            MAX_WKB_DEPTH
        )));
    }
    let little_endian = match buf.read_u8()? {
        0x01 => true,
        0x00 => false,
        other => {
            return Err(Error::protocol(format!(
                "Invalid WKB byte order 0x{:02x}",
                other
            )))
        }
    };
    let mut r = WkbReader { buf, little_endian };
    let wkb_type = r.u32()?;
    let geometry = match wkb_type {
        WKB_POINT => Geometry::Point(r.point()?),
        WKB_LINESTRING => Geometry::LineString(LineString::new(r.points()?)),
        WKB_POLYGON => Geometry::Polygon(Polygon::new(r.rings()?)),
        WKB_MULTIPOINT => {
            let n = r.u32()?;
            let mut points = Vec::new();
            for _ in 0..n {
                match read_nested_wkb(r.buf, depth + 1)? {
                    Geometry::Point(p) => points.push(p),
                    other => return Err(unexpected_member("MultiPoint", &other)),
                }
            }
            Geometry::MultiPoint(points)
        }
        WKB_MULTILINESTRING => {
            let n = r.u32()?;
            let mut lines = Vec::new();
            for _ in 0..n {
                match read_nested_wkb(r.buf, depth + 1)? {
                    Geometry::LineString(ls) => lines.push(ls),
                    other => return Err(unexpected_member("MultiLineString", &other)),
                }
            }
            Geometry::MultiLineString(lines)
        }
        WKB_MULTIPOLYGON => {
            let n = r.u32()?;
            let mut polys = Vec::new();
            for _ in 0..n {
                match read_nested_wkb(r.buf, depth + 1)? {
                    Geometry::Polygon(p) => polys.push(p),
                    other => return Err(unexpected_member("MultiPolygon", &other)),
                }
            }
            Geometry::MultiPolygon(polys)
        }
        WKB_GEOMETRYCOLLECTION => {
            let n = r.u32()?;
            let mut items = Vec::new();
            for _ in 0..n {
                items.push(read_nested_wkb(r.buf, depth + 1)?);
            }
            Geometry::GeometryCollection(items)
        }
        other => {
            return Err(Error::protocol(format!("Unknown WKB geometry type {}", other)))
        }
    };
    Ok(geometry)
}

fn unexpected_member(collection: &str, member: &Geometry) -> Error {
    Error::protocol(format!(
        "{} cannot contain a {}",
        collection,
        member.type_name()
    ))
}

/// Read a GEOMETRY field of `length` bytes: SRID prefix then WKB body.
///
/// Bytes left over after the body are skipped so the row cursor stays
/// aligned on the next field.
pub fn read_geometry(buf: &mut ReadBuffer, length: usize) -> Result<Geometry> {
    let start = buf.position();
    let _srid = buf.read_u32_le()?;
    let geometry = read_wkb(buf)?;
    let consumed = buf.position() - start;
    if consumed > length {
        return Err(Error::protocol(format!(
            "Geometry body ran {} bytes past its field length {}",
            consumed - length,
            length
        )));
    }
    buf.skip(length - consumed)?;
    Ok(geometry)
}

/// Write a little-endian WKB body for `geometry`.
pub fn write_wkb(out: &mut WriteBuffer, geometry: &Geometry) {
    fn header(out: &mut WriteBuffer, wkb_type: u32) {
        out.write_u8(0x01);
        out.write_u32_le(wkb_type);
    }
    fn coords(out: &mut WriteBuffer, points: &[Point]) {
        out.write_u32_le(points.len() as u32);
        for p in points {
            out.write_f64_le(p.x);
            out.write_f64_le(p.y);
        }
    }
    fn rings(out: &mut WriteBuffer, rings: &[LineString]) {
        out.write_u32_le(rings.len() as u32);
        for ring in rings {
            coords(out, &ring.points);
        }
    }

    match geometry {
        Geometry::Point(p) => {
            header(out, WKB_POINT);
            out.write_f64_le(p.x);
            out.write_f64_le(p.y);
        }
        Geometry::LineString(ls) => {
            header(out, WKB_LINESTRING);
            coords(out, &ls.points);
        }
        Geometry::Polygon(poly) => {
            header(out, WKB_POLYGON);
            rings(out, &poly.rings);
        }
        Geometry::MultiPoint(points) => {
            header(out, WKB_MULTIPOINT);
            out.write_u32_le(points.len() as u32);
            for p in points {
                write_wkb(out, &Geometry::Point(*p));
            }
        }
        Geometry::MultiLineString(lines) => {
            header(out, WKB_MULTILINESTRING);
            out.write_u32_le(lines.len() as u32);
            for ls in lines {
                header(out, WKB_LINESTRING);
                coords(out, &ls.points);
            }
        }
        Geometry::MultiPolygon(polys) => {
            header(out, WKB_MULTIPOLYGON);
            out.write_u32_le(polys.len() as u32);
            for poly in polys {
                header(out, WKB_POLYGON);
                rings(out, &poly.rings);
            }
        }
        Geometry::GeometryCollection(items) => {
            header(out, WKB_GEOMETRYCOLLECTION);
            out.write_u32_le(items.len() as u32);
            for g in items {
                write_wkb(out, g);
            }
        }
    }
}
