use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

impl Point {
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Row as stored: the point sequence lives in a single JSONB column.
#[derive(Debug, FromRow)]
pub struct RideRow {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub points: Json<Vec<Point>>,
    pub distance: f64,
    pub start: String,
    pub finish: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct Ride {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub points: Vec<Point>,
    pub distance: f64,
    pub start: String,
    pub finish: String,
    pub created_at: OffsetDateTime,
}

impl From<RideRow> for Ride {
    fn from(r: RideRow) -> Self {
        Self {
            id: r.id,
            creator_id: r.creator_id,
            name: r.name,
            description: r.description,
            points: r.points.0,
            distance: r.distance,
            start: r.start,
            finish: r.finish,
            created_at: r.created_at,
        }
    }
}

/// Fields needed to insert a ride; `start`/`finish` are already geocoded.
#[derive(Debug, Clone)]
pub struct NewRide {
    pub creator_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub points: Vec<Point>,
    pub distance: f64,
    pub start: String,
    pub finish: String,
}
