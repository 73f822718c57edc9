//! Place autocomplete / geocoding provider client.

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::SearchError;
use crate::models::Coordinates;

/// One ranked place description from the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceMatch {
    pub id: String,
    pub description: String,
    pub location: Option<Coordinates>,
}

#[async_trait::async_trait]
pub trait PlaceAutocomplete: Send + Sync {
    async fn autocomplete(
        &self,
        text: &str,
        bias: Option<Coordinates>,
        radius_m: Option<f64>,
    ) -> Result<Vec<PlaceMatch>, SearchError>;
}

#[derive(Clone)]
pub struct HttpPlacesClient {
    client: Client,
    base_url: String,
}

impl HttpPlacesClient {
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PlacesResponse {
    #[serde(default)]
    predictions: Vec<PlaceMatch>,
}

#[async_trait::async_trait]
impl PlaceAutocomplete for HttpPlacesClient {
    async fn autocomplete(
        &self,
        text: &str,
        bias: Option<Coordinates>,
        radius_m: Option<f64>,
    ) -> Result<Vec<PlaceMatch>, SearchError> {
        let mut url = Url::parse(&format!(
            "{}/autocomplete",
            self.base_url.trim_end_matches('/')
        ))
        .map_err(|e| SearchError::Network(format!("invalid places URL: {e}")))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("text", text);
            if let Some(bias) = bias {
                pairs.append_pair("bias", &format!("{},{}", bias.latitude, bias.longitude));
            }
            if let Some(radius) = radius_m {
                pairs.append_pair("radius", &radius.to_string());
            }
        }

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(SearchError::Network(format!(
                "autocomplete returned {}",
                response.status()
            )));
        }

        let payload: PlacesResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Network(format!("malformed autocomplete payload: {e}")))?;

        Ok(payload.predictions)
    }
}

/// Stand-in used when the provider is disabled in config. Location
/// suggestions simply stay empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledPlacesClient;

#[async_trait::async_trait]
impl PlaceAutocomplete for DisabledPlacesClient {
    async fn autocomplete(
        &self,
        _text: &str,
        _bias: Option<Coordinates>,
        _radius_m: Option<f64>,
    ) -> Result<Vec<PlaceMatch>, SearchError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_predictions() {
        let json = r#"{
            "predictions": [
                {"id": "p1", "description": "Alexanderplatz, Berlin",
                 "location": {"latitude": 52.5219, "longitude": 13.4132}},
                {"id": "p2", "description": "Alexandria, Egypt", "location": null}
            ]
        }"#;

        let payload: PlacesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(payload.predictions.len(), 2);
        assert!(payload.predictions[0].location.is_some());
        assert!(payload.predictions[1].location.is_none());
    }
}
