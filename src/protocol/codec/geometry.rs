//! Spatial codecs.
//!
//! Both protocols carry GEOMETRY fields as `[srid:4][wkb body]`; the SRID is
//! dropped on decode and written as 0 on encode.

use crate::error::{Error, Result};
use crate::protocol::buffer::{ReadBuffer, WriteBuffer};
use crate::protocol::decode::write_wkb;
use crate::protocol::types::{Column, DataType, Geometry, Point, Value};

use super::{wrong_value, Codec, Decode, EncodeContext, ParameterCodec};

/// Point layout length: srid(4) + order(1) + type(4) + x(8) + y(8).
const POINT_FIELD_LENGTH: u64 = 25;

/// Binary-protocol field: length prefix, zero SRID, WKB body.
fn write_geometry_field(out: &mut WriteBuffer, geometry: &Geometry) {
    let mut body = WriteBuffer::new();
    write_wkb(&mut body, geometry);
    out.write_length(4 + body.len() as u64);
    out.write_u32_le(0);
    out.write_bytes(body.as_bytes());
}

/// `Point`; a GEOMETRY field holding another shape is a type mismatch.
#[derive(Debug, Clone, Copy)]
pub struct PointCodec;

impl ParameterCodec for PointCodec {
    fn type_name(&self) -> &'static str {
        "Point"
    }

    fn can_encode(&self, value: &Value) -> bool {
        matches!(value, Value::Point(_) | Value::Geometry(Geometry::Point(_)))
    }

    fn encode_text(&self, out: &mut WriteBuffer, _: &EncodeContext, value: &Value, _: Option<usize>) -> Result<()> {
        let point = as_point(self, value)?;
        out.write_ascii(&format!("ST_PointFromText('{}')", point));
        Ok(())
    }

    fn encode_binary(&self, out: &mut WriteBuffer, value: &Value, _: Option<usize>) -> Result<()> {
        let point = as_point(self, value)?;
        out.write_length(POINT_FIELD_LENGTH);
        out.write_u32_le(0);
        write_wkb(out, &Geometry::Point(point));
        Ok(())
    }

    fn binary_encode_type(&self) -> DataType {
        DataType::Blob
    }
}

fn as_point(codec: &PointCodec, value: &Value) -> Result<Point> {
    match value {
        Value::Point(p) | Value::Geometry(Geometry::Point(p)) => Ok(*p),
        _ => Err(wrong_value(codec, value)),
    }
}

impl Codec<Point> for PointCodec {
    fn can_decode(&self, column: &Column) -> bool {
        column.data_type == DataType::Geometry
    }

    fn decode_text(&self, buf: &mut ReadBuffer, length: usize, column: &Column) -> Result<Point> {
        self.decode_binary(buf, length, column)
    }

    fn decode_binary(&self, buf: &mut ReadBuffer, length: usize, column: &Column) -> Result<Point> {
        match column.decode_geometry_binary(buf, length)? {
            Geometry::Point(p) => Ok(p),
            other => {
                tracing::debug!(shape = other.type_name(), "geometry is not a point");
                Err(Error::TypeMismatch {
                    data_type: DataType::Geometry,
                    target: "Point",
                })
            }
        }
    }
}

impl Decode for Point {
    fn codec() -> &'static dyn Codec<Self> {
        &PointCodec
    }
}

/// Any `Geometry` shape.
#[derive(Debug, Clone, Copy)]
pub struct GeometryCodec;

impl ParameterCodec for GeometryCodec {
    fn type_name(&self) -> &'static str {
        "Geometry"
    }

    fn can_encode(&self, value: &Value) -> bool {
        matches!(value, Value::Geometry(_))
    }

    fn encode_text(&self, out: &mut WriteBuffer, _: &EncodeContext, value: &Value, _: Option<usize>) -> Result<()> {
        let Value::Geometry(g) = value else {
            return Err(wrong_value(self, value));
        };
        out.write_ascii(&format!("ST_GeomFromText('{}')", g));
        Ok(())
    }

    fn encode_binary(&self, out: &mut WriteBuffer, value: &Value, _: Option<usize>) -> Result<()> {
        let Value::Geometry(g) = value else {
            return Err(wrong_value(self, value));
        };
        write_geometry_field(out, g);
        Ok(())
    }

    fn binary_encode_type(&self) -> DataType {
        DataType::Blob
    }
}

impl Codec<Geometry> for GeometryCodec {
    fn can_decode(&self, column: &Column) -> bool {
        column.data_type == DataType::Geometry
    }

    fn decode_text(&self, buf: &mut ReadBuffer, length: usize, column: &Column) -> Result<Geometry> {
        column.decode_geometry_text(buf, length)
    }

    fn decode_binary(&self, buf: &mut ReadBuffer, length: usize, column: &Column) -> Result<Geometry> {
        column.decode_geometry_binary(buf, length)
    }
}

impl Decode for Geometry {
    fn codec() -> &'static dyn Codec<Self> {
        &GeometryCodec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::protocol::codec::{decode_field, encode_binary, encode_text, find_encoder};
    use crate::protocol::types::{LineString, Protocol};
    use bytes::Bytes;

    #[test]
    fn test_point_binary_layout() {
        let mut out = WriteBuffer::new();
        let t = encode_binary(&mut out, &Value::Point(Point::new(1.0, -2.0)), None).unwrap();
        assert_eq!(t, DataType::Blob);
        let bytes = out.as_bytes();
        assert_eq!(bytes.len(), 26);
        assert_eq!(&bytes[..10], &[25, 0, 0, 0, 0, 0x01, 1, 0, 0, 0]);
        assert_eq!(&bytes[10..18], &1.0f64.to_le_bytes());
        assert_eq!(&bytes[18..], &(-2.0f64).to_le_bytes());

        let col = Column::new("g", DataType::Geometry);
        let field = Bytes::copy_from_slice(&bytes[1..]);
        assert_eq!(
            decode_field::<Point>(&col, field, Protocol::Text).unwrap(),
            Point::new(1.0, -2.0)
        );
    }

    #[test]
    fn test_point_requested_from_linestring() {
        let line = Geometry::LineString(LineString::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]));
        let mut out = WriteBuffer::new();
        encode_binary(&mut out, &Value::Geometry(line.clone()), None).unwrap();
        let field = Bytes::copy_from_slice(&out.as_bytes()[1..]);
        let col = Column::new("g", DataType::Geometry);

        let err = decode_field::<Point>(&col, field.clone(), Protocol::Binary).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert_eq!(decode_field::<Geometry>(&col, field, Protocol::Binary).unwrap(), line);
    }

    #[test]
    fn test_text_encoding() {
        let ctx = EncodeContext::default();
        let mut out = WriteBuffer::new();
        encode_text(&mut out, &ctx, &Value::Point(Point::new(1.5, 2.0)), None).unwrap();
        assert_eq!(out.as_bytes(), b"ST_PointFromText('POINT(1.5 2)')");
        assert_eq!(
            find_encoder(&Value::Geometry(Geometry::Point(Point::new(0.0, 0.0)))).unwrap().type_name(),
            "Point"
        );
    }

    #[test]
    fn test_non_geometry_column() {
        let col = Column::new("v", DataType::VarString);
        let err = decode_field::<Point>(&col, Bytes::from_static(b"x"), Protocol::Text).unwrap_err();
        assert_eq!(err.to_string(), "Data type VARSTRING cannot be decoded as Point");
    }
}
