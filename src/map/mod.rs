mod color;
mod geometry;
mod legend;
mod projection;
mod raster;
mod region;
mod renderer;

pub use color::{log_transform, ColorDomain, ColorMapper, ColorScale, Rgb, NEUTRAL, PALETTE};
pub use legend::{display_number, format_label, legend_values, round_half_up, Legend, LegendEntry, Swatch};
pub use projection::{BoundingBox, Projection, ScreenProjection, ZoomTransform};
pub use raster::{Fill, OutlineColor, Pixel, PixelCanvas, RegionRaster};
pub use region::{Polygon, Region, RegionId};
pub use renderer::{Highlight, MapRenderer};
