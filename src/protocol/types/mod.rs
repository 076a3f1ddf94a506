//! MariaDB column metadata, values and rows.

mod column;
mod column_decode;
mod data_type;
mod geometry;
mod row;
mod value;

pub use column::{Column, ColumnInfo};
pub use column_decode::Protocol;
pub use data_type::DataType;
pub use geometry::{Geometry, LineString, Point, Polygon};
pub use row::Row;
pub use value::Value;
