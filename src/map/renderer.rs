use anyhow::Result;
use glam::DVec2;

use crate::map::geometry::{draw_ring, fill_ring};
use crate::map::projection::{BoundingBox, Projection, ScreenProjection, ZoomTransform};
use crate::map::raster::{Fill, OutlineColor, Pixel, PixelCanvas, RegionRaster};
use crate::map::region::{Region, RegionId};

/// An outline to draw on top of the fills
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Highlight {
    pub region: RegionId,
    pub color: OutlineColor,
}

/// Projects regions once per viewport and composes frames from fills and outlines
pub struct MapRenderer {
    bbox: BoundingBox,
    projection: Projection,
    screen: ScreenProjection,
    pub zoom: ZoomTransform,
    width: usize,
    height: usize,
    /// Screen-space rings per region, zoom applied
    rings: Vec<Vec<Vec<DVec2>>>,
    raster: RegionRaster,
}

impl MapRenderer {
    /// The projection center is fixed here from the full region set
    pub fn new(regions: &[Region], width: usize, height: usize) -> Result<Self> {
        let bbox = BoundingBox::from_regions(regions)?;
        let projection = Projection::centered_on(&bbox);
        let screen = ScreenProjection::fit(projection, &bbox, width as f64, height as f64);

        let mut renderer = Self {
            bbox,
            projection,
            screen,
            zoom: ZoomTransform::identity(),
            width,
            height,
            rings: Vec::new(),
            raster: RegionRaster::new(width, height),
        };
        renderer.rebuild(regions);
        Ok(renderer)
    }

    #[cfg(test)]
    pub fn screen(&self) -> &ScreenProjection {
        &self.screen
    }

    #[cfg(test)]
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Refit the screen scales for a new viewport size
    pub fn resize(&mut self, regions: &[Region], width: usize, height: usize) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.screen = ScreenProjection::fit(self.projection, &self.bbox, width as f64, height as f64);
        self.rebuild(regions);
    }

    pub fn zoom_at(&mut self, regions: &[Region], px: f64, py: f64, factor: f64) {
        self.zoom.zoom_at(DVec2::new(px, py), factor);
        self.rebuild(regions);
    }

    pub fn pan(&mut self, regions: &[Region], dx: f64, dy: f64) {
        self.zoom.pan(dx, dy);
        self.rebuild(regions);
    }

    pub fn reset_zoom(&mut self, regions: &[Region]) {
        if !self.zoom.is_identity() {
            self.zoom = ZoomTransform::identity();
            self.rebuild(regions);
        }
    }

    /// Re-project every vertex and re-rasterize region ownership
    fn rebuild(&mut self, regions: &[Region]) {
        let screen = self.screen;
        let zoom = self.zoom;
        self.rings = regions
            .iter()
            .map(|region| {
                region
                    .polygons
                    .iter()
                    .map(|poly| {
                        poly.iter()
                            .map(|&(lon, lat)| zoom.apply(screen.to_screen(lon, lat)))
                            .collect()
                    })
                    .collect()
            })
            .collect();

        let mut raster = RegionRaster::new(self.width, self.height);
        let (width, height) = (self.width, self.height);
        for (id, rings) in self.rings.iter().enumerate() {
            for ring in rings {
                fill_ring(ring, width, height, &mut |x, y| raster.set(x, y, id));
                // Edges too, so slivers thinner than a pixel stay visible and clickable
                draw_ring(ring, &mut |x, y| raster.set_signed(x, y, id));
            }
        }
        self.raster = raster;
    }

    /// Region drawn at a pixel, topmost wins
    pub fn region_at(&self, x: usize, y: usize) -> Option<RegionId> {
        self.raster.owner(x, y)
    }

    #[cfg(test)]
    pub fn raster(&self) -> &RegionRaster {
        &self.raster
    }

    /// Compose a frame. `fills` is indexed by region id; highlights are drawn
    /// bottom to top in stack order.
    pub fn render(&self, fills: &[Fill], highlights: &[Highlight]) -> PixelCanvas {
        let mut canvas = PixelCanvas::new(self.width, self.height);

        for y in 0..self.height {
            for x in 0..self.width {
                if let Some(id) = self.raster.owner(x, y) {
                    let fill = fills.get(id).copied().unwrap_or(Fill::NoData);
                    canvas.set(x, y, Pixel::Fill(fill));
                }
            }
        }

        for highlight in highlights {
            let Some(rings) = self.rings.get(highlight.region) else {
                continue;
            };
            let pixel = Pixel::Outline(highlight.color);
            for ring in rings {
                draw_ring(ring, &mut |x, y| canvas.set_signed(x, y, pixel));
            }
        }

        canvas
    }
}
