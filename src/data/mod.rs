mod dataset;
mod demo;

pub use dataset::{Dataset, Defaults, FlowSeries, Meta, RegionRecords, Series, DATETIME_FORMAT};
pub use demo::generate_demo;

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use geojson::{GeoJson, Geometry, Value};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::map::{Polygon, Region, RegionId};

/// Movement data joined with the region outlines it describes
#[derive(Clone, Debug)]
pub struct Atlas {
    pub dataset: Dataset,
    pub regions: Vec<Region>,
    ids: HashMap<String, RegionId>,
}

impl Atlas {
    pub fn new(dataset: Dataset, regions: Vec<Region>) -> Result<Self> {
        if regions.is_empty() {
            bail!("no region outlines to draw");
        }
        Ok(Self::assemble(dataset, regions))
    }

    fn assemble(dataset: Dataset, regions: Vec<Region>) -> Self {
        let ids = regions
            .iter()
            .enumerate()
            .map(|(id, region)| (region.name.clone(), id))
            .collect();
        Self { dataset, regions, ids }
    }

    pub fn region_id(&self, name: &str) -> Option<RegionId> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: RegionId) -> &str {
        self.regions.get(id).map(|r| r.name.as_str()).unwrap_or("")
    }

    pub fn meta(&self) -> &Meta {
        &self.dataset.meta
    }
}

/// Load movement data and outlines from disk
pub fn load_atlas(data_path: &Path, geo_path: &Path) -> Result<Atlas> {
    let dataset = load_dataset(data_path)?;
    let regions = load_regions(geo_path)?;

    let missing = regions
        .iter()
        .filter(|r| !dataset.contains_region(&r.name))
        .count();
    if missing > 0 {
        warn!(missing, "regions without movement data will be drawn as no data");
    }
    info!(
        regions = regions.len(),
        with_data = dataset.region_count(),
        steps = dataset.meta.time_steps(),
        "loaded atlas"
    );
    Atlas::new(dataset, regions)
}

pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    debug!(bytes = bytes.len(), path = %path.display(), "parsing movement data");
    Dataset::from_json(bytes).with_context(|| format!("loading {}", path.display()))
}

pub fn load_regions(path: &Path) -> Result<Vec<Region>> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    parse_regions(bytes).with_context(|| format!("loading {}", path.display()))
}

/// `{ "kommune": ..., "polygons": [[[lon, lat], ...], ...] }`
#[derive(Deserialize)]
struct RawShape {
    #[serde(alias = "name")]
    kommune: String,
    polygons: Vec<Vec<[f64; 2]>>,
}

/// Accepts a plain array of named polygon lists, or GeoJSON
pub fn parse_regions(bytes: Vec<u8>) -> Result<Vec<Region>> {
    let mut scratch = bytes.clone();
    let regions = match simd_json::serde::from_slice::<Vec<RawShape>>(&mut scratch) {
        Ok(shapes) => shapes
            .into_iter()
            .map(|shape| {
                let polygons = shape
                    .polygons
                    .into_iter()
                    .map(|ring| ring.into_iter().map(|[lon, lat]| (lon, lat)).collect())
                    .collect();
                Region::new(shape.kommune, polygons)
            })
            .collect(),
        Err(_) => {
            let text = String::from_utf8(bytes).context("geometry file is not UTF-8")?;
            let geojson: GeoJson = text.parse().context("geometry is neither a region list nor GeoJSON")?;
            regions_from_geojson(&geojson)
        }
    };

    let regions: Vec<Region> = regions.into_iter().filter(|r| r.vertex_count() > 0).collect();
    if regions.is_empty() {
        bail!("geometry contains no polygons");
    }
    Ok(regions)
}

/// Property keys tried, in order, for a feature's region name
const NAME_KEYS: [&str; 3] = ["kommune", "name", "navn"];

fn regions_from_geojson(geojson: &GeoJson) -> Vec<Region> {
    let mut regions = Vec::new();
    let mut push = |name: Option<&str>, geometry: &Geometry| {
        let mut polygons = Vec::new();
        collect_polygons(geometry, &mut polygons);
        if polygons.is_empty() {
            return;
        }
        let name = name.map(str::to_string).unwrap_or_else(|| format!("Region {}", regions.len() + 1));
        regions.push(Region::new(name, polygons));
    };

    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                let name = feature.properties.as_ref().and_then(|props| {
                    NAME_KEYS.iter().find_map(|key| props.get(*key).and_then(|v| v.as_str()))
                });
                if let Some(ref geometry) = feature.geometry {
                    push(name, geometry);
                }
            }
        }
        GeoJson::Feature(f) => {
            let name = f.properties.as_ref().and_then(|props| {
                NAME_KEYS.iter().find_map(|key| props.get(*key).and_then(|v| v.as_str()))
            });
            if let Some(ref geometry) = f.geometry {
                push(name, geometry);
            }
        }
        GeoJson::Geometry(geometry) => push(None, geometry),
    }
    regions
}

/// Exterior rings of every polygon in a geometry
fn collect_polygons(geometry: &Geometry, out: &mut Vec<Polygon>) {
    match &geometry.value {
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                out.push(exterior.iter().map(|c| (c[0], c[1])).collect());
            }
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                if let Some(exterior) = rings.first() {
                    out.push(exterior.iter().map(|c| (c[0], c[1])).collect());
                }
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_polygons(g, out);
            }
        }
        _ => {}
    }
}
