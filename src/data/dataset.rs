use std::collections::{BTreeMap, HashMap};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Duration, NaiveDateTime};
use serde::Deserialize;

use crate::view::{Direction, ViewMode};

/// Timestamp layout used in `_meta.datetime`
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Time-indexed `[forward, reverse]` pairs for one mode.
/// Sparse: steps without a recorded value are absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Series(BTreeMap<usize, [f64; 2]>);

impl Series {
    pub fn insert(&mut self, t: usize, pair: [f64; 2]) {
        self.0.insert(t, pair);
    }

    pub fn contains(&self, t: usize) -> bool {
        self.0.contains_key(&t)
    }

    pub fn get(&self, t: usize, direction: Direction) -> Option<f64> {
        self.0.get(&t).map(|pair| pair[direction.index()])
    }
}

impl FromIterator<(usize, [f64; 2])> for Series {
    fn from_iter<I: IntoIterator<Item = (usize, [f64; 2])>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The three series recorded for one (origin, destination) pair
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlowSeries {
    pub on_date: Series,
    pub baseline: Series,
    pub percent_change: Series,
}

impl FlowSeries {
    pub fn series(&self, mode: ViewMode) -> &Series {
        match mode {
            ViewMode::OnDate => &self.on_date,
            ViewMode::Baseline => &self.baseline,
            ViewMode::PercentChange => &self.percent_change,
        }
    }

    pub fn series_mut(&mut self, mode: ViewMode) -> &mut Series {
        match mode {
            ViewMode::OnDate => &mut self.on_date,
            ViewMode::Baseline => &mut self.baseline,
            ViewMode::PercentChange => &mut self.percent_change,
        }
    }

    pub fn get(&self, mode: ViewMode, t: usize, direction: Direction) -> Option<f64> {
        self.series(mode).get(t, direction)
    }
}

/// Everything recorded for one origin region
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionRecords {
    /// The region's own totals
    pub own: Option<FlowSeries>,
    /// Flows keyed by the other region's name
    pub flows: HashMap<String, FlowSeries>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Defaults {
    pub t: usize,
    pub mode: ViewMode,
    pub direction: Direction,
}

/// Validated `_meta` block
#[derive(Clone, Debug, PartialEq)]
pub struct Meta {
    /// Largest inbound magnitude, rounded to two decimals. `<= 1` means shares.
    pub in_max: f64,
    pub out_max: f64,
    pub datetimes: Vec<NaiveDateTime>,
    pub defaults: Defaults,
    /// Modes offered by the radio control, in display order
    pub modes: Vec<ViewMode>,
    pub legend_label_count: String,
    pub legend_label_relative: String,
}

impl Meta {
    pub fn time_steps(&self) -> usize {
        self.datetimes.len()
    }

    /// True when magnitudes are population shares rather than counts
    pub fn is_share(&self) -> bool {
        self.in_max <= 1.0
    }

    pub fn legend_title(&self, mode: ViewMode) -> &str {
        if mode.is_relative() {
            &self.legend_label_relative
        } else {
            &self.legend_label_count
        }
    }

    /// Tick label for step `t`: weekday, day/month of the first stamp plus `t` days
    pub fn date_label(&self, t: usize) -> String {
        match self.datetimes.first() {
            Some(start) => (*start + Duration::days(t as i64)).format("%a %-d/%-m").to_string(),
            None => String::new(),
        }
    }

    /// Long date for the status bar
    pub fn date_long(&self, t: usize) -> String {
        match self.datetimes.first() {
            Some(start) => (*start + Duration::days(t as i64)).format("%e %B").to_string().trim().to_string(),
            None => String::new(),
        }
    }
}

/// In-memory movement data
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    pub meta: Meta,
    records: HashMap<String, RegionRecords>,
}

impl Dataset {
    pub fn new(meta: Meta) -> Self {
        Self {
            meta,
            records: HashMap::new(),
        }
    }

    pub fn records_mut(&mut self, region: &str) -> &mut RegionRecords {
        self.records.entry(region.to_string()).or_default()
    }

    pub fn contains_region(&self, region: &str) -> bool {
        self.records.contains_key(region)
    }

    pub fn region_count(&self) -> usize {
        self.records.len()
    }

    /// Region present and has its own value at `t` for `mode`
    pub fn exists(&self, region: &str, mode: ViewMode, t: usize) -> bool {
        self.records
            .get(region)
            .and_then(|r| r.own.as_ref())
            .is_some_and(|own| own.series(mode).contains(t))
    }

    /// The region's own value; `None` means no data
    pub fn own_value(&self, region: &str, mode: ViewMode, t: usize, direction: Direction) -> Option<f64> {
        self.records.get(region)?.own.as_ref()?.get(mode, t, direction)
    }

    /// Recorded flow between `origin` and `other`; `None` means no data
    #[cfg(test)]
    pub fn flow(
        &self,
        origin: &str,
        other: &str,
        mode: ViewMode,
        t: usize,
        direction: Direction,
    ) -> Option<f64> {
        self.records.get(origin)?.flows.get(other)?.get(mode, t, direction)
    }

    pub fn flow_series(&self, origin: &str, other: &str) -> Option<&FlowSeries> {
        self.records.get(origin)?.flows.get(other)
    }

    /// All regions with a record under `origin`
    pub fn flows_from<'a>(&'a self, origin: &str) -> impl Iterator<Item = (&'a str, &'a FlowSeries)> + 'a {
        self.records
            .get(origin)
            .into_iter()
            .flat_map(|r| r.flows.iter().map(|(name, series)| (name.as_str(), series)))
    }

    /// Decode and validate a movement data file
    pub fn from_json(mut bytes: Vec<u8>) -> Result<Self> {
        let raw: RawFile =
            simd_json::serde::from_slice(&mut bytes).context("movement data is not valid JSON")?;
        let meta = raw
            .meta
            .ok_or_else(|| anyhow!("movement data has no _meta block"))?
            .validate()?;

        let mut dataset = Dataset::new(meta);
        for (region, entries) in raw.regions {
            let own_key = format!("_{region}");
            let mut records = RegionRecords::default();
            for (key, raw_series) in entries {
                let series = raw_series.into_flow_series();
                if key == own_key {
                    records.own = Some(series);
                } else {
                    records.flows.insert(key, series);
                }
            }
            dataset.records.insert(region, records);
        }
        Ok(dataset)
    }
}

#[derive(Deserialize)]
struct RawFile {
    #[serde(rename = "_meta")]
    meta: Option<RawMeta>,
    #[serde(flatten)]
    regions: HashMap<String, HashMap<String, RawFlowSeries>>,
}

#[derive(Deserialize)]
struct RawMeta {
    variables: Option<RawVariables>,
    datetime: Option<Vec<String>>,
    defaults: Option<RawDefaults>,
    #[serde(rename = "radioOptions")]
    radio_options: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct RawVariables {
    #[serde(rename = "inMax")]
    in_max: Option<f64>,
    #[serde(rename = "outMax")]
    out_max: Option<f64>,
    legend_label_count: Option<String>,
    legend_label_relative: Option<String>,
}

#[derive(Deserialize)]
struct RawDefaults {
    t: Option<usize>,
    #[serde(rename = "radioOption")]
    radio_option: Option<String>,
    idx0or1: Option<usize>,
}

impl RawMeta {
    fn validate(self) -> Result<Meta> {
        let vars = self.variables.context("_meta.variables is missing")?;
        let in_max = vars.in_max.context("_meta.variables.inMax is missing")?;
        let out_max = vars.out_max.context("_meta.variables.outMax is missing")?;
        if !in_max.is_finite() || in_max <= 0.0 {
            bail!("_meta.variables.inMax must be a positive number, got {in_max}");
        }
        let legend_label_count = vars
            .legend_label_count
            .context("_meta.variables.legend_label_count is missing")?;
        let legend_label_relative = vars
            .legend_label_relative
            .context("_meta.variables.legend_label_relative is missing")?;

        let datetimes = self
            .datetime
            .context("_meta.datetime is missing")?
            .iter()
            .map(|s| {
                NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
                    .with_context(|| format!("bad timestamp {s:?} in _meta.datetime"))
            })
            .collect::<Result<Vec<_>>>()?;
        if datetimes.is_empty() {
            bail!("_meta.datetime is empty");
        }

        let modes = self
            .radio_options
            .context("_meta.radioOptions is missing")?
            .iter()
            .map(|key| ViewMode::from_key(key).ok_or_else(|| anyhow!("unknown view mode {key:?} in _meta.radioOptions")))
            .collect::<Result<Vec<_>>>()?;
        if modes.is_empty() {
            bail!("_meta.radioOptions is empty");
        }

        let defaults = self.defaults.context("_meta.defaults is missing")?;
        let t = defaults.t.context("_meta.defaults.t is missing")?;
        if t >= datetimes.len() {
            bail!("_meta.defaults.t = {t} is outside the {} time steps", datetimes.len());
        }
        let mode_key = defaults
            .radio_option
            .context("_meta.defaults.radioOption is missing")?;
        let mode = ViewMode::from_key(&mode_key)
            .ok_or_else(|| anyhow!("unknown default view mode {mode_key:?}"))?;
        let idx = defaults.idx0or1.context("_meta.defaults.idx0or1 is missing")?;
        let direction = Direction::from_index(idx)
            .ok_or_else(|| anyhow!("_meta.defaults.idx0or1 must be 0 or 1, got {idx}"))?;

        Ok(Meta {
            in_max: (in_max * 100.0).round() / 100.0,
            out_max,
            datetimes,
            defaults: Defaults { t, mode, direction },
            modes,
            legend_label_count,
            legend_label_relative,
        })
    }
}

#[derive(Deserialize, Default)]
struct RawFlowSeries {
    crisis: Option<RawSeries>,
    baseline: Option<RawSeries>,
    percent_change: Option<RawSeries>,
}

/// A series is either a dense array (nulls for gaps) or an object keyed by step
#[derive(Deserialize)]
#[serde(untagged)]
enum RawSeries {
    Dense(Vec<Option<[Option<f64>; 2]>>),
    Sparse(BTreeMap<String, [Option<f64>; 2]>),
}

impl RawSeries {
    fn into_series(self) -> Series {
        // Missing halves of a pair are unknown, not zero
        let pair = |p: [Option<f64>; 2]| [p[0].unwrap_or(f64::NAN), p[1].unwrap_or(f64::NAN)];
        match self {
            RawSeries::Dense(values) => values
                .into_iter()
                .enumerate()
                .filter_map(|(t, p)| p.map(|p| (t, pair(p))))
                .collect(),
            RawSeries::Sparse(values) => values
                .into_iter()
                .filter_map(|(t, p)| t.parse::<usize>().ok().map(|t| (t, pair(p))))
                .collect(),
        }
    }
}

impl RawFlowSeries {
    fn into_flow_series(self) -> FlowSeries {
        FlowSeries {
            on_date: self.crisis.map(RawSeries::into_series).unwrap_or_default(),
            baseline: self.baseline.map(RawSeries::into_series).unwrap_or_default(),
            percent_change: self.percent_change.map(RawSeries::into_series).unwrap_or_default(),
        }
    }
}
