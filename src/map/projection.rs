use anyhow::{bail, Result};
use glam::DVec2;

use crate::map::region::Region;

/// Geographic extent of the loaded regions, in degrees
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    /// Westernmost longitude relative to the circular mean
    pub lon_min: f64,
    /// Easternmost longitude relative to the circular mean
    pub lon_max: f64,
    /// Arithmetic mean of all latitudes
    pub mid_lat: f64,
    /// Circular mean of all longitudes
    pub mid_lon: f64,
}

impl BoundingBox {
    /// Bounding box over every vertex of every polygon
    pub fn from_regions(regions: &[Region]) -> Result<Self> {
        let points: Vec<(f64, f64)> = regions
            .iter()
            .flat_map(|r| r.polygons.iter())
            .flat_map(|poly| poly.iter().copied())
            .collect();
        Self::from_points(&points)
    }

    /// Bounding box over `(lon, lat)` points
    pub fn from_points(points: &[(f64, f64)]) -> Result<Self> {
        if points.is_empty() {
            bail!("cannot compute a bounding box without any coordinates");
        }

        let lats: Vec<f64> = points.iter().map(|&(_, lat)| lat).collect();
        let lons: Vec<f64> = points.iter().map(|&(lon, _)| lon).collect();

        let mid_lat = lats.iter().sum::<f64>() / lats.len() as f64;
        let mid_lon = mean_angle(&lons);

        let lat_extent = MinMax::of(&lats);
        // Extremes are taken around the mean so a cluster straddling ±180° stays contiguous
        let recentered: Vec<f64> = lons.iter().map(|&lon| diff_angle(mid_lon, lon)).collect();
        let lon_extent = MinMax::of(&recentered);

        Ok(Self {
            lat_min: lat_extent.min,
            lat_max: lat_extent.max,
            lon_min: lons[lon_extent.min_idx],
            lon_max: lons[lon_extent.max_idx],
            mid_lat,
            mid_lon,
        })
    }
}

/// Circular mean of angles in degrees, result in (-180, 180]
pub fn mean_angle(degrees: &[f64]) -> f64 {
    let sum = degrees.iter().fold(DVec2::ZERO, |acc, deg| {
        let rad = deg.to_radians();
        acc + DVec2::new(rad.cos(), rad.sin())
    });
    let mean = sum / degrees.len().max(1) as f64;
    mean.y.atan2(mean.x).to_degrees()
}

/// Signed angular difference `b - a` in degrees, wrapped to [-180, 180]
pub fn diff_angle(a: f64, b: f64) -> f64 {
    let delta = (b - a).to_radians();
    delta.sin().atan2(delta.cos()).to_degrees()
}

/// Extremes of a slice together with the index where each first occurs
#[derive(Clone, Copy, Debug, PartialEq)]
struct MinMax {
    min: f64,
    max: f64,
    min_idx: usize,
    max_idx: usize,
}

impl MinMax {
    /// Caller guarantees a non-empty slice
    fn of(values: &[f64]) -> Self {
        let mut out = MinMax {
            min: f64::MAX,
            max: -f64::MAX,
            min_idx: 0,
            max_idx: 0,
        };
        for (i, &v) in values.iter().enumerate() {
            if v > out.max {
                out.max = v;
                out.max_idx = i;
            }
            if v < out.min {
                out.min = v;
                out.min_idx = i;
            }
        }
        out
    }
}

/// Orthographic projection centered on a fixed point
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    /// Center longitude in radians
    pub center_lon: f64,
    /// Center latitude in radians
    pub center_lat: f64,
}

impl Projection {
    pub fn centered_on(bbox: &BoundingBox) -> Self {
        Self {
            center_lon: bbox.mid_lon.to_radians(),
            center_lat: bbox.mid_lat.to_radians(),
        }
    }

    /// Project `(lon, lat)` in degrees onto the unit plane.
    /// y grows southwards so it can feed screen coordinates directly.
    #[inline]
    pub fn project(&self, lon: f64, lat: f64) -> DVec2 {
        let lam = lon.to_radians();
        let phi = lat.to_radians();
        let dlam = lam - self.center_lon;

        let x = self.center_lat.cos() * dlam.sin();
        let y = phi.cos() * self.center_lat.sin() - phi.sin() * self.center_lat.cos() * dlam.cos();
        DVec2::new(x, y)
    }
}

/// Linear map from a numeric domain onto a pixel range
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    #[inline]
    pub fn apply(&self, v: f64) -> f64 {
        let span = self.domain.1 - self.domain.0;
        if span == 0.0 {
            return (self.range.0 + self.range.1) * 0.5;
        }
        self.range.0 + (v - self.domain.0) / span * (self.range.1 - self.range.0)
    }
}

/// Projection plus the two screen scales fitting it into a viewport
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenProjection {
    pub projection: Projection,
    pub x_scale: LinearScale,
    pub y_scale: LinearScale,
}

impl ScreenProjection {
    /// Fit the projected bounding box into a `width` x `height` pixel viewport.
    /// Both axes share one factor, taken from whichever side is the tighter fit;
    /// the other axis is centered.
    pub fn fit(projection: Projection, bbox: &BoundingBox, width: f64, height: f64) -> Self {
        let lower_left = projection.project(bbox.lon_min, bbox.lat_min);
        let upper_left = projection.project(bbox.lon_min, bbox.lat_max);
        let upper_right = projection.project(bbox.lon_max, bbox.lat_max);
        let lower_right = projection.project(bbox.lon_max, bbox.lat_min);

        let min_x = lower_left.x.min(upper_left.x);
        let max_x = lower_right.x.max(upper_right.x);
        let min_y = upper_left.y.min(upper_right.y);
        let max_y = lower_left.y.max(lower_right.y);

        let map_width = max_x - min_x;
        let map_height = max_y - min_y;

        let factor = if map_width <= 0.0 && map_height <= 0.0 {
            1.0
        } else if map_width * height < map_height * width {
            // Taller than the viewport: fit height
            height / map_height
        } else {
            width / map_width
        };

        let pad_x = (width - map_width * factor) * 0.5;
        let pad_y = (height - map_height * factor) * 0.5;

        Self {
            projection,
            x_scale: LinearScale::new((min_x, max_x), (pad_x, pad_x + map_width * factor)),
            y_scale: LinearScale::new((min_y, max_y), (pad_y, pad_y + map_height * factor)),
        }
    }

    /// Geographic `(lon, lat)` to viewport pixel coordinates
    #[inline]
    pub fn to_screen(&self, lon: f64, lat: f64) -> DVec2 {
        let p = self.projection.project(lon, lat);
        DVec2::new(self.x_scale.apply(p.x), self.y_scale.apply(p.y))
    }
}

/// Zoom and pan applied on top of the fitted screen projection
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomTransform {
    pub k: f64,
    pub translate: DVec2,
}

impl ZoomTransform {
    pub const MIN_SCALE: f64 = 1.0;
    pub const MAX_SCALE: f64 = 4.0;
    pub const STEP: f64 = 1.5;

    pub fn identity() -> Self {
        Self {
            k: 1.0,
            translate: DVec2::ZERO,
        }
    }

    #[inline]
    pub fn apply(&self, p: DVec2) -> DVec2 {
        p * self.k + self.translate
    }

    /// Zoom by `factor` keeping the point under `pixel` fixed
    pub fn zoom_at(&mut self, pixel: DVec2, factor: f64) {
        let anchor = (pixel - self.translate) / self.k;
        self.k = (self.k * factor).clamp(Self::MIN_SCALE, Self::MAX_SCALE);
        self.translate = pixel - anchor * self.k;
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.translate += DVec2::new(dx, dy);
    }

    pub fn is_identity(&self) -> bool {
        self.k == 1.0 && self.translate == DVec2::ZERO
    }
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::identity()
    }
}
