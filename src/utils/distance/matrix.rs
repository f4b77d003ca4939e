use crate::config::distance::DistanceSettings;
use crate::utils::distance::errors::DistanceError;
use crate::utils::distance::models::{Destination, DistanceEstimate};
use crate::utils::distance::DistanceEstimator;
use crate::utils::events::models::GeoPoint;
use axum::async_trait;
use futures::future::join_all;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use tracing::{debug, trace};

/// Destinations per upstream request.
pub const MATRIX_BATCH_SIZE: usize = 25;

#[derive(Debug, Deserialize)]
struct TextValue {
    text: String,
    value: u64,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    distance: Option<TextValue>,
    duration: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    rows: Vec<MatrixRow>,
    error_message: Option<String>,
}

fn coordinates(point: GeoPoint) -> String {
    format!("{},{}", point.latitude, point.longitude)
}

/// Pairs the single origin row with `batch`, skipping elements the provider could not route.
fn read_batch(
    batch: &[Destination],
    response: MatrixResponse,
) -> Result<Vec<DistanceEstimate>, DistanceError> {
    if response.status != "OK" {
        return Err(DistanceError::Rejected {
            status: response.status,
            message: response.error_message.unwrap_or_default(),
        });
    }
    let row = response
        .rows
        .into_iter()
        .next()
        .ok_or_else(|| DistanceError::Malformed("no rows for the origin".to_string()))?;
    if row.elements.len() != batch.len() {
        return Err(DistanceError::Malformed(format!(
            "expected {} elements, got {}",
            batch.len(),
            row.elements.len()
        )));
    }

    Ok(batch
        .iter()
        .zip(row.elements)
        .filter_map(|(destination, element)| {
            if element.status != "OK" {
                trace!(
                    "No route to event {}: {}",
                    destination.event_id,
                    element.status
                );
                return None;
            }
            let (distance, duration) = (element.distance?, element.duration?);
            Some(DistanceEstimate {
                id: destination.event_id,
                distance: distance.value,
                duration: duration.value,
                distance_text: distance.text,
                duration_text: duration.text,
            })
        })
        .collect())
}

/// Client for a Distance-Matrix style JSON API.
pub struct MatrixDistanceEstimator {
    client: reqwest::Client,
    endpoint: String,
    api_key: Secret<String>,
}

impl MatrixDistanceEstimator {
    pub fn new(settings: &DistanceSettings) -> Result<Self, DistanceError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/maps/api/distancematrix/json",
                settings.base_url.trim_end_matches('/')
            ),
            api_key: settings.api_key.clone(),
        })
    }

    async fn estimate_batch(
        &self,
        origin: &str,
        batch: &[Destination],
    ) -> Result<Vec<DistanceEstimate>, DistanceError> {
        let destinations = batch
            .iter()
            .map(|d| coordinates(d.point))
            .collect::<Vec<_>>()
            .join("|");

        let response: MatrixResponse = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("origins", origin),
                ("destinations", destinations.as_str()),
                ("units", "metric"),
                ("key", self.api_key.expose_secret().as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        read_batch(batch, response)
    }
}

#[async_trait]
impl DistanceEstimator for MatrixDistanceEstimator {
    async fn estimate(
        &self,
        origin: GeoPoint,
        destinations: &[Destination],
    ) -> Result<Vec<DistanceEstimate>, DistanceError> {
        let origin = coordinates(origin);
        let batches = destinations.chunks(MATRIX_BATCH_SIZE);
        debug!(
            "Requesting distances for {} destination(s) in {} batch(es)",
            destinations.len(),
            batches.len()
        );

        let results = join_all(batches.map(|batch| self.estimate_batch(&origin, batch))).await;

        let mut estimates = Vec::with_capacity(destinations.len());
        for result in results {
            estimates.extend(result?);
        }
        Ok(estimates)
    }
}
