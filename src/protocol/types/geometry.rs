//! Spatial values decoded from GEOMETRY columns.

use std::fmt;

/// A single coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An ordered run of points.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineString {
    pub points: Vec<Point>,
}

impl LineString {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// A ring is closed when its first and last points coincide.
    pub fn is_closed(&self) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(a), Some(b)) => self.points.len() > 1 && a == b,
            _ => false,
        }
    }
}

/// An exterior ring followed by zero or more interior rings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    pub rings: Vec<LineString>,
}

impl Polygon {
    pub fn new(rings: Vec<LineString>) -> Self {
        Self { rings }
    }
}

/// Tagged geometry variant; the WKB type code selects the case.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point),
    LineString(LineString),
    Polygon(Polygon),
    MultiPoint(Vec<Point>),
    MultiLineString(Vec<LineString>),
    MultiPolygon(Vec<Polygon>),
    GeometryCollection(Vec<Geometry>),
}

impl Geometry {
    /// Shape name as used in WKT.
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPoint(_) => "MultiPoint",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::MultiPolygon(_) => "MultiPolygon",
            Geometry::GeometryCollection(_) => "GeometryCollection",
        }
    }
}

fn write_coords(f: &mut fmt::Formatter<'_>, points: &[Point]) -> fmt::Result {
    f.write_str("(")?;
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{} {}", p.x, p.y)?;
    }
    f.write_str(")")
}

fn write_rings(f: &mut fmt::Formatter<'_>, rings: &[LineString]) -> fmt::Result {
    f.write_str("(")?;
    for (i, ring) in rings.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write_coords(f, &ring.points)?;
    }
    f.write_str(")")
}

/// Well-Known Text rendering.
impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "POINT({} {})", self.x, self.y)
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Geometry::Point(p) => write!(f, "{}", p),
            Geometry::LineString(ls) => {
                f.write_str("LINESTRING")?;
                write_coords(f, &ls.points)
            }
            Geometry::Polygon(poly) => {
                f.write_str("POLYGON")?;
                write_rings(f, &poly.rings)
            }
            Geometry::MultiPoint(points) => {
                f.write_str("MULTIPOINT")?;
                write_coords(f, points)
            }
            Geometry::MultiLineString(lines) => {
                f.write_str("MULTILINESTRING")?;
                write_rings(f, lines)
            }
            Geometry::MultiPolygon(polys) => {
                f.write_str("MULTIPOLYGON(")?;
                for (i, poly) in polys.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write_rings(f, &poly.rings)?;
                }
                f.write_str(")")
            }
            Geometry::GeometryCollection(items) => {
                f.write_str("GEOMETRYCOLLECTION(")?;
                for (i, g) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", g)?;
                }
                f.write_str(")")
            }
        }
    }
}
