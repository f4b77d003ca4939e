pub mod errors;
pub mod matrix;
pub mod models;

use crate::config::distance::DistanceSettings;
use crate::utils::distance::errors::DistanceError;
use crate::utils::distance::matrix::MatrixDistanceEstimator;
use crate::utils::distance::models::{Destination, DistanceAnnotation, DistanceEstimate};
use crate::utils::events::models::GeoPoint;
use axum::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Travel distance provider. Destinations it cannot answer are left out of the result.
#[async_trait]
pub trait DistanceEstimator: Send + Sync {
    async fn estimate(
        &self,
        origin: GeoPoint,
        destinations: &[Destination],
    ) -> Result<Vec<DistanceEstimate>, DistanceError>;
}

/// A [`DistanceEstimator`] bound to the timeout every call runs under.
#[derive(Clone)]
pub struct DistanceRefinement {
    estimator: Arc<dyn DistanceEstimator>,
    timeout: Duration,
}

impl DistanceRefinement {
    pub fn new(estimator: Arc<dyn DistanceEstimator>, timeout: Duration) -> Self {
        Self { estimator, timeout }
    }

    pub fn from_settings(settings: &DistanceSettings) -> Result<Self, DistanceError> {
        let estimator = MatrixDistanceEstimator::new(settings)?;
        Ok(Self::new(Arc::new(estimator), settings.timeout))
    }

    pub async fn estimate(
        &self,
        origin: GeoPoint,
        destinations: &[Destination],
    ) -> Result<HashMap<Uuid, DistanceAnnotation>, DistanceError> {
        if destinations.is_empty() {
            return Ok(HashMap::new());
        }
        let estimates = tokio::time::timeout(
            self.timeout,
            self.estimator.estimate(origin, destinations),
        )
        .await
        .map_err(|_| DistanceError::TimedOut(self.timeout))??;

        debug!(
            "Distance service answered {}/{} destination(s)",
            estimates.len(),
            destinations.len()
        );
        Ok(estimates
            .into_iter()
            .map(|estimate| (estimate.id, DistanceAnnotation::from(estimate)))
            .collect())
    }

    /// Like [`DistanceRefinement::estimate`], but any failure is logged and yields `None`.
    pub async fn annotations(
        &self,
        origin: GeoPoint,
        destinations: &[Destination],
    ) -> Option<HashMap<Uuid, DistanceAnnotation>> {
        match self.estimate(origin, destinations).await {
            Ok(annotations) => Some(annotations),
            Err(e) => {
                warn!("Distance refinement skipped: {e}");
                None
            }
        }
    }
}

/// Orders `items` by annotated travel distance, then by event id.
///
/// Items without an annotation compare as infinitely far and are always kept.
/// With `max_meters`, annotated items beyond it are dropped.
pub fn rank_by_distance<T>(
    items: Vec<T>,
    event_id: impl Fn(&T) -> Uuid,
    mut annotations: HashMap<Uuid, DistanceAnnotation>,
    max_meters: Option<f64>,
) -> Vec<(T, Option<DistanceAnnotation>)> {
    let mut ranked: Vec<_> = items
        .into_iter()
        .map(|item| {
            let annotation = annotations.remove(&event_id(&item));
            (item, annotation)
        })
        .filter(|(_, annotation)| match (annotation, max_meters) {
            (Some(annotation), Some(max)) => annotation.distance_meters as f64 <= max,
            _ => true,
        })
        .collect();

    let meters = |a: &Option<DistanceAnnotation>| {
        a.as_ref().map_or(u64::MAX, |a| a.distance_meters)
    };
    ranked.sort_by(|(a, da), (b, db)| {
        meters(da)
            .cmp(&meters(db))
            .then_with(|| event_id(a).cmp(&event_id(b)))
    });
    ranked
}
