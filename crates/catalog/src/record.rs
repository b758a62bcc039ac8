use anyhow::Result;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use walks_core::{CatalogError, Coordinate, Place};

#[derive(Debug, Deserialize)]
struct RawRecord {
    id: Option<Value>,
    address: Option<String>,
    geometry: Option<String>,
    description: Option<String>,
}

/// Parses one JSON line of the catalog export into a [`Place`].
#[derive(Debug, Clone)]
pub struct RecordParser {
    point: Regex,
    strip_prefixes: Vec<String>,
}

impl RecordParser {
    pub fn new(strip_prefixes: &[String]) -> Result<Self> {
        Ok(Self {
            point: Regex::new(r"(?i)^\s*POINT\s*\(\s*(\S+)\s+(\S+)\s*\)\s*$")?,
            strip_prefixes: strip_prefixes.to_vec(),
        })
    }

    pub fn parse_line(&self, line: usize, raw: &str) -> Result<Place, CatalogError> {
        let malformed = |reason: String| CatalogError::MalformedRecord { line, reason };

        let record: RawRecord =
            serde_json::from_str(raw).map_err(|error| malformed(format!("invalid json: {error}")))?;

        let id = record
            .id
            .as_ref()
            .and_then(parse_id)
            .ok_or_else(|| malformed("missing or non-integer id".to_string()))?;

        let address = record
            .address
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| malformed("missing address".to_string()))?;

        let geometry = record
            .geometry
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| malformed("missing geometry".to_string()))?;
        let coordinate = self
            .parse_point(&geometry)
            .ok_or_else(|| malformed(format!("unparseable point {geometry:?}")))?;

        Ok(Place {
            id,
            name: self.display_name(&address),
            address,
            coordinate,
            description: record.description.unwrap_or_default().trim().to_string(),
        })
    }

    /// `POINT (lon lat)` in WKT order.
    pub fn parse_point(&self, geometry: &str) -> Option<Coordinate> {
        let captures = self.point.captures(geometry)?;
        let lon = captures.get(1)?.as_str().parse::<f64>().ok()?;
        let lat = captures.get(2)?.as_str().parse::<f64>().ok()?;
        let coordinate = Coordinate::new(lat, lon);
        coordinate.is_valid().then_some(coordinate)
    }

    /// The address without the city prefix; the full address when nothing
    /// would be left.
    pub fn display_name(&self, address: &str) -> String {
        self.strip_prefixes
            .iter()
            .find_map(|prefix| address.strip_prefix(prefix.as_str()))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(address)
            .to_string()
    }
}

fn parse_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|v| v.fract() == 0.0).map(|v| v as i64)),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}
