//! Records loaded from the paged NYC Open Data sources

use super::bbl::{derive_bbl, normalize_bbl};
use super::fields::FieldSource;
use super::types::{PagedRecord, TableRecord};
use crate::coerce;
use crate::types::JsonObject;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// BBL from an explicit column, else borough + block + lot
fn parcel_key(row: &JsonObject, borough_fields: &[&str]) -> Option<String> {
    if let Some(bbl) = row.text("bbl").and_then(|raw| normalize_bbl(&raw)) {
        return Some(bbl);
    }
    borough_fields.iter().find_map(|field| {
        derive_bbl(&row.text(field)?, &row.text("block")?, &row.text("lot")?)
    })
}

// ============================================================================
// PLUTO
// ============================================================================

/// Row of `pluto_raw`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlutoParcel {
    pub bbl: String,
    pub borough: Option<String>,
    pub zonedist1: Option<String>,
    pub landuse: Option<String>,
    pub yearbuilt: Option<i64>,
    pub numfloors: Option<f64>,
    pub unitsres: Option<i64>,
    pub unitstotal: Option<i64>,
    pub bldgclass: Option<String>,
    pub address: Option<String>,
    pub raw: Value,
    pub ingested_at: DateTime<Utc>,
}

impl TableRecord for PlutoParcel {
    const TABLE: &'static str = "pluto_raw";
    const CONFLICT_KEY: &'static [&'static str] = &["bbl"];
}

impl PagedRecord for PlutoParcel {
    const SOURCE: &'static str = "pluto";
    const SELECT: &'static [&'static str] = &[
        "bbl",
        "borough",
        "borocode",
        "block",
        "lot",
        "zonedist1",
        "landuse",
        "yearbuilt",
        "numfloors",
        "unitsres",
        "unitstotal",
        "bldgclass",
        "address",
    ];

    fn from_json(row: &JsonObject, now: DateTime<Utc>) -> Option<Self> {
        let bbl = parcel_key(row, &["borocode", "borough"])?;

        Some(Self {
            bbl,
            borough: row.text("borough"),
            zonedist1: row.text("zonedist1"),
            landuse: row.text("landuse"),
            yearbuilt: row.integer("yearbuilt"),
            numfloors: row.number("numfloors"),
            unitsres: row.integer("unitsres"),
            unitstotal: row.integer("unitstotal"),
            bldgclass: row.text("bldgclass"),
            address: row.text("address"),
            raw: Value::Object(row.clone()),
            ingested_at: now,
        })
    }
}

// ============================================================================
// DOB Permits
// ============================================================================

/// Row of `dob_permits`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DobPermit {
    pub source_id: String,
    pub bbl: Option<String>,
    pub filed_date: Option<DateTime<Utc>>,
    pub job_type: Option<String>,
    pub job_status: Option<String>,
    pub raw: Value,
    pub ingested_at: DateTime<Utc>,
}

impl DobPermit {
    fn source_id(row: &JsonObject, bbl: Option<&str>, filed: Option<&str>) -> Option<String> {
        if let Some(id) = row.text("permit_si_no") {
            return Some(id);
        }
        if let Some(job) = row.text("job__") {
            return Some(match row.text("job_doc___") {
                Some(doc) => format!("{job}-{doc}"),
                None => job,
            });
        }
        bbl.map(|bbl| format!("bbl:{bbl}:{}", filed.unwrap_or_default()))
    }
}

impl TableRecord for DobPermit {
    const TABLE: &'static str = "dob_permits";
    const CONFLICT_KEY: &'static [&'static str] = &["source_id"];
}

impl PagedRecord for DobPermit {
    const SOURCE: &'static str = "dob_permits";
    const SELECT: &'static [&'static str] = &[];

    fn from_json(row: &JsonObject, now: DateTime<Utc>) -> Option<Self> {
        let bbl = parcel_key(row, &["borough"]);
        let filed_raw = row.first_text(&["filing_date", "issuance_date"]);
        let source_id = Self::source_id(row, bbl.as_deref(), filed_raw.as_deref())?;

        Some(Self {
            source_id,
            bbl,
            filed_date: filed_raw.and_then(|raw| coerce::to_timestamp(&raw)),
            job_type: row.text("job_type"),
            job_status: row.first_text(&["permit_status", "filing_status"]),
            raw: Value::Object(row.clone()),
            ingested_at: now,
        })
    }
}
