//! Route acquisition. The engine only ever sees the resulting list of coordinates.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::error::WalkError;
use crate::route::Coordinate;

/// What the caller wants to walk.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteQuery {
    File(PathBuf),
    Between { start: Coordinate, end: Coordinate },
}

pub trait RouteProvider {
    fn fetch(&self, query: &RouteQuery) -> Result<Vec<Coordinate>, WalkError>;
}

fn unavailable(msg: impl std::fmt::Display) -> WalkError {
    WalkError::RouteUnavailable(msg.to_string())
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RouteDocument {
    Points(Vec<Coordinate>),
    Geometry(Geometry),
    Feature { geometry: Geometry },
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(rename = "type")]
    kind: String,
    coordinates: Vec<[f64; 2]>,
}

impl Geometry {
    // GeoJSON positions are [lng, lat]
    fn into_points(self) -> Result<Vec<Coordinate>, WalkError> {
        if self.kind != "LineString" {
            return Err(unavailable(format!(
                "expected a LineString geometry, found {}",
                self.kind
            )));
        }
        Ok(self
            .coordinates
            .into_iter()
            .map(|[lng, lat]| Coordinate { lat, lng })
            .collect())
    }
}

/// Reads routes from `.json`/`.geojson` or `.csv` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileRouteProvider;

impl FileRouteProvider {
    pub fn load(&self, path: &Path) -> Result<Vec<Coordinate>, WalkError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let points = match ext.as_str() {
            "csv" => parse_csv(
                fs::File::open(path).map_err(|e| unavailable(format!("{}: {e}", path.display())))?,
            )?,
            _ => {
                let text = fs::read_to_string(path)
                    .map_err(|e| unavailable(format!("{}: {e}", path.display())))?;
                parse_json(&text)?
            }
        };

        info!(path = %path.display(), points = points.len(), "route file read");
        Ok(points)
    }
}

impl RouteProvider for FileRouteProvider {
    fn fetch(&self, query: &RouteQuery) -> Result<Vec<Coordinate>, WalkError> {
        match query {
            RouteQuery::File(path) => self.load(path),
            RouteQuery::Between { .. } => Err(unavailable("file provider needs a path")),
        }
    }
}

pub fn parse_json(text: &str) -> Result<Vec<Coordinate>, WalkError> {
    let doc: RouteDocument = serde_json::from_str(text).map_err(unavailable)?;
    match doc {
        RouteDocument::Points(points) => Ok(points),
        RouteDocument::Geometry(g) | RouteDocument::Feature { geometry: g } => g.into_points(),
    }
}

/// Expects a header row with `lat` and `lng` columns; other columns are ignored.
pub fn parse_csv<R: std::io::Read>(reader: R) -> Result<Vec<Coordinate>, WalkError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    rdr.deserialize::<Coordinate>()
        .map(|row| row.map_err(unavailable))
        .collect()
}

/// Walks as the crow flies between the two endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightLineProvider;

impl RouteProvider for StraightLineProvider {
    fn fetch(&self, query: &RouteQuery) -> Result<Vec<Coordinate>, WalkError> {
        match query {
            RouteQuery::Between { start, end } => Ok(vec![*start, *end]),
            RouteQuery::File(_) => Err(unavailable("straight-line provider needs two endpoints")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: Geometry,
}

/// Asks an OSRM server for a walking route between two points.
#[derive(Debug, Clone)]
pub struct OsrmRouteProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl OsrmRouteProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn route_url(&self, start: &Coordinate, end: &Coordinate) -> String {
        format!(
            "{}/route/v1/foot/{},{};{},{}?overview=full&geometries=geojson",
            self.base_url.trim_end_matches('/'),
            start.lng,
            start.lat,
            end.lng,
            end.lat
        )
    }
}

pub fn parse_osrm(text: &str) -> Result<Vec<Coordinate>, WalkError> {
    let resp: OsrmResponse = serde_json::from_str(text).map_err(unavailable)?;
    if resp.code != "Ok" {
        return Err(unavailable(format!(
            "routing service said {}: {}",
            resp.code,
            resp.message.unwrap_or_default()
        )));
    }
    let route = resp
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| unavailable("routing service returned no routes"))?;
    route.geometry.into_points()
}

impl RouteProvider for OsrmRouteProvider {
    fn fetch(&self, query: &RouteQuery) -> Result<Vec<Coordinate>, WalkError> {
        let RouteQuery::Between { start, end } = query else {
            return Err(unavailable("routing service needs two endpoints"));
        };
        let url = self.route_url(start, end);
        info!(%url, "requesting walking route");

        let body = self
            .client
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(unavailable)?;
        parse_osrm(&body)
    }
}
