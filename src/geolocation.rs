//! Single-shot resolution of where the viewer is.

use crate::models::Coordinates;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeolocationError {
    #[error("geolocation is not supported in this environment")]
    Unsupported,
    #[error("geolocation failed: {0}")]
    Failed(String),
}

/// Where the viewer's position comes from
#[async_trait]
pub trait GeolocationSource: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError>;
}

/// Viewer position known up front (command line, config)
pub struct FixedLocation(pub Coordinates);

#[async_trait]
impl GeolocationSource for FixedLocation {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Ok(self.0)
    }
}

/// Environment without any position capability
pub struct NoGeolocation;

#[async_trait]
impl GeolocationSource for NoGeolocation {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Err(GeolocationError::Unsupported)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ViewerLocation {
    #[default]
    Pending,
    Resolved(Coordinates),
    Unavailable,
}

impl ViewerLocation {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            ViewerLocation::Resolved(c) => Some(*c),
            _ => None,
        }
    }

    pub fn status(&self) -> LocationStatus {
        match self {
            ViewerLocation::Pending => LocationStatus::Pending,
            ViewerLocation::Resolved(_) => LocationStatus::Resolved,
            ViewerLocation::Unavailable => LocationStatus::Unavailable,
        }
    }
}

/// What the listing page tells the viewer about the ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationStatus {
    Pending,
    Resolved,
    Unavailable,
}

impl LocationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            LocationStatus::Pending => "Finding your location...",
            LocationStatus::Resolved => "Sorted by distance from you",
            LocationStatus::Unavailable => "Location unavailable, showing listings in default order",
        }
    }
}

/// Ask the source once. Failures are logged and never retried.
pub async fn resolve_viewer_location(source: &dyn GeolocationSource) -> ViewerLocation {
    match source.current_position().await {
        Ok(coords) if coords.is_valid() => {
            info!(lat = coords.lat, lng = coords.lng, "Viewer location resolved");
            ViewerLocation::Resolved(coords)
        }
        Ok(coords) => {
            warn!(lat = coords.lat, lng = coords.lng, "Geolocation returned out-of-range coordinates");
            ViewerLocation::Unavailable
        }
        Err(e) => {
            warn!(error = %e, "Viewer location unavailable");
            ViewerLocation::Unavailable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSource;

    #[async_trait]
    impl GeolocationSource for FailingSource {
        async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
            Err(GeolocationError::Failed("User denied Geolocation".to_string()))
        }
    }

    #[tokio::test]
    async fn test_fixed_location_resolves() {
        let here = Coordinates::new(34.05, -118.24);
        let loc = resolve_viewer_location(&FixedLocation(here)).await;
        assert_eq!(loc, ViewerLocation::Resolved(here));
        assert_eq!(loc.status(), LocationStatus::Resolved);
    }

    #[tokio::test]
    async fn test_errors_and_unsupported_become_unavailable() {
        assert_eq!(resolve_viewer_location(&FailingSource).await, ViewerLocation::Unavailable);
        assert_eq!(resolve_viewer_location(&NoGeolocation).await, ViewerLocation::Unavailable);
    }

    #[tokio::test]
    async fn test_out_of_range_position_is_unavailable() {
        let loc = resolve_viewer_location(&FixedLocation(Coordinates::new(95.0, 0.0))).await;
        assert_eq!(loc, ViewerLocation::Unavailable);
    }

    #[test]
    fn test_pending_is_default() {
        assert_eq!(ViewerLocation::default().status(), LocationStatus::Pending);
        assert_eq!(ViewerLocation::default().coordinates(), None);
    }
}
