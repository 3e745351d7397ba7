//! GEOPLOT: dependency-free geometry and layout support for the drape viewer.
//!
//! - Geographic rectangle arithmetic (`bounds`): union, intersection,
//!   fractional buffering, corner enumeration, extrema over projected points.
//! - WGS-84 geodesy (`geodesy`): geodetic/ECEF conversions and great-circle
//!   displacement along a compass azimuth.
//! - Map projection seam (`projection`): the narrow `project` capability the
//!   surface tile needs, plus a local tangent-plane implementation.
//! - Plot axes (`axis`): the 2D axis pair re-derived from the footprint
//!   every frame.
//! - Stacked-plot layout policy (`stack`): per-cell sizing/spacing state and
//!   the layout directive grammar consumed by the external layout engine.
//!
//! Everything here is pure and single-threaded; no GPU types appear.

pub mod axis;
pub mod bounds;
pub mod geodesy;
pub mod projection;
pub mod stack;

pub use axis::{Axis2, AxisRange};
pub use bounds::GeoBounds;
pub use geodesy::LatLon;
pub use projection::{GeoProjection, TangentPlane};
