//! Records loaded from the CSV sources

use super::bbl::normalize_bbl;
use super::fields::FieldSource;
use super::types::{CsvRecord, TableRecord};
use crate::coerce::{self, JsonShape};
use crate::types::CsvRow;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// Buildings
// ============================================================================

/// Row of `buildings`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Building {
    pub bbl: String,
    pub neighborhood_id: Option<String>,
    pub address_norm: Option<String>,
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl TableRecord for Building {
    const TABLE: &'static str = "buildings";
    const CONFLICT_KEY: &'static [&'static str] = &["bbl"];
}

impl CsvRecord for Building {
    fn from_csv(row: &CsvRow, _now: DateTime<Utc>) -> Option<Self> {
        let bbl = row.text("bbl").and_then(|raw| normalize_bbl(&raw))?;
        let address = row.text("address");

        Some(Self {
            bbl,
            neighborhood_id: row.text("neighborhood_id"),
            address_norm: address.as_deref().and_then(coerce::normalize_address),
            address,
            lat: row.number("lat"),
            lng: row.number("lng"),
        })
    }
}

// ============================================================================
// Listings
// ============================================================================

/// Row of `listings`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub url: String,
    pub bbl: Option<String>,
    pub source: String,
    pub status: Option<String>,
    pub price: Option<f64>,
    pub listed_date: Option<DateTime<Utc>>,
    pub raw: Value,
}

impl TableRecord for Listing {
    const TABLE: &'static str = "listings";
    const CONFLICT_KEY: &'static [&'static str] = &["url"];
}

impl CsvRecord for Listing {
    fn from_csv(row: &CsvRow, _now: DateTime<Utc>) -> Option<Self> {
        let url = row.text("url")?;

        Some(Self {
            url,
            bbl: row.text("bbl").and_then(|raw| normalize_bbl(&raw)),
            source: row.text("source").unwrap_or_else(|| "csv".to_string()),
            status: row.text("status"),
            price: row.number("price"),
            listed_date: row
                .text("listed_date")
                .and_then(|raw| coerce::to_timestamp(&raw)),
            raw: coerce::to_json(
                row.get("raw").map_or("", String::as_str),
                JsonShape::Object,
            ),
        })
    }
}

// ============================================================================
// Intelligence Scores
// ============================================================================

/// Row of `intel_current`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntelScore {
    pub bbl: String,
    pub distress_score: Option<i64>,
    pub momentum_score: Option<i64>,
    pub value_score: Option<i64>,
    pub risk_score: Option<i64>,
    pub flags: Value,
    pub updated_at: DateTime<Utc>,
}

impl TableRecord for IntelScore {
    const TABLE: &'static str = "intel_current";
    const CONFLICT_KEY: &'static [&'static str] = &["bbl"];
}

impl CsvRecord for IntelScore {
    fn from_csv(row: &CsvRow, now: DateTime<Utc>) -> Option<Self> {
        let bbl = row.text("bbl").and_then(|raw| normalize_bbl(&raw))?;

        Some(Self {
            bbl,
            distress_score: row.integer("distress_score"),
            momentum_score: row.integer("momentum_score"),
            value_score: row.integer("value_score"),
            risk_score: row.integer("risk_score"),
            flags: coerce::to_json(
                row.get("flags").map_or("", String::as_str),
                JsonShape::Array,
            ),
            updated_at: now,
        })
    }
}
