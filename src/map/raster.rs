use crate::map::color::Rgb;
use crate::map::region::RegionId;

/// How a region is painted
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fill {
    Color(Rgb),
    /// No flow to the selection at this time step
    Neutral,
    /// Region absent from the dataset or without a value for the current step
    NoData,
}

/// Stroke color of a highlight outline
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutlineColor {
    Black,
    Grey,
}

/// One square pixel of the composed map
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Pixel {
    /// Outside every region
    #[default]
    Empty,
    Fill(Fill),
    Outline(OutlineColor),
}

/// Which region owns each pixel, for filling and hit testing.
/// Rebuilt only when the viewport geometry changes.
#[derive(Clone, Debug)]
pub struct RegionRaster {
    width: usize,
    height: usize,
    owners: Vec<Option<RegionId>>,
}

impl RegionRaster {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            owners: vec![None; width * height],
        }
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, region: RegionId) {
        if x < self.width && y < self.height {
            self.owners[y * self.width + x] = Some(region);
        }
    }

    /// Signed variant for line drawing (ignores off-canvas pixels)
    #[inline]
    pub fn set_signed(&mut self, x: i32, y: i32, region: RegionId) {
        if x >= 0 && y >= 0 {
            self.set(x as usize, y as usize, region);
        }
    }

    #[inline]
    pub fn owner(&self, x: usize, y: usize) -> Option<RegionId> {
        if x < self.width && y < self.height {
            self.owners[y * self.width + x]
        } else {
            None
        }
    }

    #[cfg(test)]
    pub fn owned_pixels(&self, region: RegionId) -> usize {
        self.owners.iter().filter(|&&o| o == Some(region)).count()
    }
}

/// Composed frame: fills plus outlines, one entry per pixel
#[derive(Clone, Debug)]
pub struct PixelCanvas {
    width: usize,
    height: usize,
    pixels: Vec<Pixel>,
}

impl PixelCanvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Pixel::Empty; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, pixel: Pixel) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = pixel;
        }
    }

    #[inline]
    pub fn set_signed(&mut self, x: i32, y: i32, pixel: Pixel) {
        if x >= 0 && y >= 0 {
            self.set(x as usize, y as usize, pixel);
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Pixel {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x]
        } else {
            Pixel::Empty
        }
    }

    #[cfg(test)]
    pub fn count(&self, pixel: Pixel) -> usize {
        self.pixels.iter().filter(|&&p| p == pixel).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds_is_ignored() {
        let mut raster = RegionRaster::new(2, 2);
        raster.set(5, 5, 1);
        raster.set_signed(-1, 0, 1);
        assert_eq!(raster.owned_pixels(1), 0);
        assert_eq!(raster.owner(9, 9), None);
    }

    #[test]
    fn test_canvas_set_get() {
        let mut canvas = PixelCanvas::new(3, 2);
        canvas.set(2, 1, Pixel::Outline(OutlineColor::Grey));
        assert_eq!(canvas.get(2, 1), Pixel::Outline(OutlineColor::Grey));
        assert_eq!(canvas.get(0, 0), Pixel::Empty);
        assert_eq!(canvas.count(Pixel::Empty), 5);
    }
}
