use std::f64::consts::TAU;

use chrono::{NaiveDate, NaiveDateTime};

use crate::data::{Atlas, Dataset, Defaults, FlowSeries, Meta};
use crate::map::Region;
use crate::view::{Direction, ViewMode};

/// (name, lon, lat, lon radius, lat radius, weekday trips)
const TOWNS: [(&str, f64, f64, f64, f64, f64); 6] = [
    ("København", 12.55, 55.68, 0.14, 0.08, 9000.0),
    ("Roskilde", 12.08, 55.64, 0.17, 0.09, 2500.0),
    ("Odense", 10.39, 55.40, 0.22, 0.12, 4000.0),
    ("Aarhus", 10.18, 56.16, 0.20, 0.11, 6000.0),
    ("Aalborg", 9.92, 57.03, 0.22, 0.11, 3200.0),
    ("Esbjerg", 8.52, 55.49, 0.20, 0.11, 2100.0),
];

/// Drawn but absent from the movement data
const UNSURVEYED: (&str, f64, f64, f64, f64) = ("Læsø", 11.03, 57.27, 0.09, 0.04);

const DAYS: usize = 28;
/// First day of the restrictions, as a step index
const LOCKDOWN: usize = 11;
/// Towns further apart than this (degrees) have no recorded flow
const MAX_FLOW_DISTANCE: f64 = 2.5;

/// Irregular closed outline around a center, deterministic
fn blob(lon: f64, lat: f64, r_lon: f64, r_lat: f64, seed: usize) -> Vec<(f64, f64)> {
    const SIDES: usize = 9;
    (0..SIDES)
        .map(|k| {
            let angle = k as f64 * TAU / SIDES as f64;
            let wobble = 0.8 + 0.2 * ((k * 37 + seed * 11) % 5) as f64 / 4.0;
            (lon + r_lon * wobble * angle.cos(), lat + r_lat * wobble * angle.sin())
        })
        .collect()
}

/// Share of trips lost on day `t`
fn drop_on(t: usize) -> f64 {
    match t {
        t if t < LOCKDOWN => 0.0,
        t if t < LOCKDOWN + 3 => 0.18 * (t - LOCKDOWN + 1) as f64,
        _ => 0.55,
    }
}

/// Day 0 is a Sunday
fn weekday_factor(t: usize) -> f64 {
    match t % 7 {
        0 | 6 => 0.6,
        _ => 1.0,
    }
}

/// Fill a series triple from a baseline function, mirroring `[forward, reverse]`
fn series_from(baseline: impl Fn(usize) -> [f64; 2]) -> FlowSeries {
    let mut flows = FlowSeries::default();
    for t in 0..DAYS {
        let base = baseline(t);
        let keep = 1.0 - drop_on(t);
        let on_date = [base[0] * keep, base[1] * keep];
        let change = [
            if base[0] > 0.0 { (on_date[0] - base[0]) / base[0] } else { f64::NAN },
            if base[1] > 0.0 { (on_date[1] - base[1]) / base[1] } else { f64::NAN },
        ];
        flows.series_mut(ViewMode::Baseline).insert(t, base);
        flows.series_mut(ViewMode::OnDate).insert(t, on_date);
        flows.series_mut(ViewMode::PercentChange).insert(t, change);
    }
    flows
}

/// Small synthetic Danish dataset used when no files are given
pub fn generate_demo() -> Atlas {
    let start: NaiveDateTime = NaiveDate::from_ymd_opt(2020, 3, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    let peak = TOWNS.iter().map(|town| town.5).fold(0.0, f64::max);

    let meta = Meta {
        in_max: peak,
        out_max: peak * 0.97,
        datetimes: (0..DAYS).map(|t| start + chrono::Duration::days(t as i64)).collect(),
        defaults: Defaults {
            t: LOCKDOWN + 3,
            mode: ViewMode::OnDate,
            direction: Direction::Forward,
        },
        modes: ViewMode::ALL.to_vec(),
        legend_label_count: "Trips".to_string(),
        legend_label_relative: "Change".to_string(),
    };

    let mut dataset = Dataset::new(meta);
    let mut regions = Vec::with_capacity(TOWNS.len() + 1);

    for (i, &(name, lon, lat, r_lon, r_lat, trips)) in TOWNS.iter().enumerate() {
        regions.push(Region::new(name, vec![blob(lon, lat, r_lon, r_lat, i)]));

        let records = dataset.records_mut(name);
        records.own = Some(series_from(|t| {
            let base = trips * weekday_factor(t);
            [base, base * 0.97]
        }));

        for &(other, o_lon, o_lat, _, _, o_trips) in TOWNS.iter() {
            if other == name {
                continue;
            }
            let distance = ((lon - o_lon).powi(2) + (lat - o_lat).powi(2)).sqrt();
            if distance > MAX_FLOW_DISTANCE {
                continue;
            }
            let share = 0.08 * (-distance / 1.5).exp();
            let flows = series_from(|t| {
                let w = weekday_factor(t);
                [(trips * share * w).round(), (o_trips * share * w).round()]
            });
            dataset.records_mut(name).flows.insert(other.to_string(), flows);
        }
    }

    let (name, lon, lat, r_lon, r_lat) = UNSURVEYED;
    regions.push(Region::new(name, vec![blob(lon, lat, r_lon, r_lat, TOWNS.len())]));

    Atlas::assemble(dataset, regions)
}
