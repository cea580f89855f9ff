//! Geometry codec for the portable [`Geometry`] union.
//!
//! WKB is the canonical interchange encoding with the host; WKT is a
//! documented fallback used only when WKB encoding refuses a geometry.
//! Encoding and decoding go through `geozero` processors.
//!
//! [`Geometry`]: geobridge_core_common::Geometry

pub mod error;
pub mod family;
pub mod interop;
pub mod reader;
pub mod writer;

pub use error::{CodecError, CodecResult};
pub use family::{FamilyInference, infer_family, promote, promote_to};
pub use interop::{from_geo_types, to_geo_types};
pub use reader::{GeometryBuilder, decode, decode_wkb, decode_wkt};
pub use writer::{GeozeroGeom, encode_wkb, encode_wkt, to_wkb_or_wkt};
