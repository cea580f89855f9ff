//! Destination type inference and multi-part promotion.

use geobridge_core_common::{Dimension, Geometry, GeometryFamily, GeometryType};
use log::warn;

/// Family used when a collection holds no usable geometry.
pub const DEFAULT_FAMILY: GeometryFamily = GeometryFamily::LineString;

/// Outcome of [`infer_family`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyInference {
    /// Destination WKB type for the whole collection
    pub geometry_type: GeometryType,
    /// True when no non-empty geometry was found and [`DEFAULT_FAMILY`] was used
    pub defaulted: bool,
}

/// Infer the single destination type of a geometry collection.
///
/// The first non-null, non-empty geometry fixes the base family and the Z/M
/// dimensionality. The collection is multi when that geometry is multi-part
/// or when any later geometry of the same family is, so that single
/// instances can be promoted and the collection shares one type.
///
/// Without any usable geometry the result falls back to a 2D single
/// [`DEFAULT_FAMILY`] with `defaulted` set.
pub fn infer_family<'a, I>(geometries: I) -> FamilyInference
where
    I: IntoIterator<Item = Option<&'a Geometry>>,
{
    let mut usable = geometries
        .into_iter()
        .flatten()
        .filter(|geometry| !geometry.is_empty());

    let Some(first) = usable.next() else {
        warn!(
            "no non-empty geometry found; defaulting destination type to {}",
            DEFAULT_FAMILY.name()
        );
        return FamilyInference {
            geometry_type: GeometryType::new(DEFAULT_FAMILY, false, Dimension::Xy),
            defaulted: true,
        };
    };

    let family = first.family();
    let multi = first.is_multi() || usable.any(|g| g.family() == family && g.is_multi());
    FamilyInference {
        geometry_type: GeometryType::new(family, multi, first.dimension()),
        defaulted: false,
    }
}

/// Promote a single-part geometry to multi-part when `want_multi` is set.
///
/// Multi-part geometries, and any geometry when `want_multi` is false, are
/// returned unchanged, so promotion is idempotent.
#[must_use]
pub fn promote(geometry: Geometry, want_multi: bool) -> Geometry {
    if want_multi {
        geometry.into_multi()
    } else {
        geometry
    }
}

/// Promote a geometry to match a collection type.
///
/// Only geometries of the collection's family are promoted; others are
/// returned unchanged for the caller to reject.
#[must_use]
pub fn promote_to(geometry: Geometry, target: &GeometryType) -> Geometry {
    if geometry.family() == target.family {
        promote(geometry, target.multi)
    } else {
        geometry
    }
}
