/// A polygon ring as `(lon, lat)` pairs in degrees
pub type Polygon = Vec<(f64, f64)>;

/// Index of a region in load order
pub type RegionId = usize;

/// A named municipality and its outline
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub name: String,
    pub polygons: Vec<Polygon>,
}

impl Region {
    pub fn new(name: impl Into<String>, polygons: Vec<Polygon>) -> Self {
        Self {
            name: name.into(),
            polygons,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.polygons.iter().map(Vec::len).sum()
    }
}
