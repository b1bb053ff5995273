use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{config::MapboxConfig, rides::repo_types::Point};

/// Resolves a coordinate to a human-readable place name.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `None` when the service knows no place at that point.
    async fn reverse(&self, point: Point) -> anyhow::Result<Option<String>>;
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    text: Option<String>,
}

/// Mapbox Geocoding v5 client, restricted to places and localities.
#[derive(Clone)]
pub struct MapboxGeocoder {
    client: Client,
    config: MapboxConfig,
}

impl MapboxGeocoder {
    pub fn new(config: MapboxConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn reverse_url(&self, point: Point) -> String {
        format!(
            "{}/geocoding/v5/mapbox.places/{},{}.json",
            self.config.api_url.trim_end_matches('/'),
            point.longitude,
            point.latitude
        )
    }
}

#[async_trait]
impl Geocoder for MapboxGeocoder {
    #[instrument(skip(self))]
    async fn reverse(&self, point: Point) -> anyhow::Result<Option<String>> {
        let url = self.reverse_url(point);
        let body: FeatureCollection = self
            .client
            .get(&url)
            .query(&[
                ("types", "place,locality"),
                ("language", self.config.language.as_str()),
                ("access_token", self.config.token.as_str()),
            ])
            .send()
            .await
            .context("mapbox reverse geocode request")?
            .error_for_status()
            .context("mapbox reverse geocode status")?
            .json()
            .await
            .context("mapbox reverse geocode body")?;

        let place = body
            .features
            .into_iter()
            .next()
            .and_then(|f| f.text)
            .filter(|t| !t.is_empty());
        debug!(?place, "reverse geocoded");
        Ok(place)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_url_is_lng_lat_ordered() {
        let geocoder = MapboxGeocoder::new(MapboxConfig {
            token: "tk".into(),
            api_url: "https://api.mapbox.com/".into(),
            language: "fr".into(),
        });
        let url = geocoder.reverse_url(Point {
            latitude: 45.75,
            longitude: 4.85,
        });
        assert_eq!(
            url,
            "https://api.mapbox.com/geocoding/v5/mapbox.places/4.85,45.75.json"
        );
    }

    #[test]
    fn first_feature_text_wins() {
        let body: FeatureCollection = serde_json::from_str(
            r#"{"type":"FeatureCollection","features":[{"text":"Lyon","place_type":["place"]},{"text":"Rhône"}]}"#,
        )
        .unwrap();
        assert_eq!(body.features[0].text.as_deref(), Some("Lyon"));

        let empty: FeatureCollection = serde_json::from_str(r#"{"type":"FeatureCollection"}"#).unwrap();
        assert!(empty.features.is_empty());
    }
}
