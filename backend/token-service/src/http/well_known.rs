//! Deep-link association manifests under `/.well-known/`.
//!
//! The mobile apps open magic links through these, so they are served
//! verbatim with a JSON content type.
use super::AppState;
use crate::config::WellKnownSettings;
use anyhow::{Context, Result};
use axum::{extract::State, http::header, response::IntoResponse};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Empty placeholder manifests, served when no file is configured.
///
/// They associate no app with this domain, so magic links open in the
/// browser instead of the app. Deployments must set
/// `APPLE_APP_SITE_ASSOCIATION_PATH` and `ANDROID_ASSET_LINKS_PATH` for
/// deep links to work.
const DEFAULT_APPLE_APP_SITE_ASSOCIATION: &str = r#"{"applinks":{"apps":[],"details":[]}}"#;
const DEFAULT_ASSET_LINKS: &str = "[]";

#[derive(Debug, Clone)]
pub struct WellKnownDocuments {
    pub apple_app_site_association: String,
    pub asset_links: String,
}

impl Default for WellKnownDocuments {
    fn default() -> Self {
        Self {
            apple_app_site_association: DEFAULT_APPLE_APP_SITE_ASSOCIATION.to_string(),
            asset_links: DEFAULT_ASSET_LINKS.to_string(),
        }
    }
}

impl WellKnownDocuments {
    /// Read the configured manifests, keeping the built-in defaults for
    /// any path left unset. Files must hold valid JSON.
    pub fn load(settings: &WellKnownSettings) -> Result<Self> {
        let mut documents = Self::default();
        match &settings.apple_app_site_association_path {
            Some(path) => documents.apple_app_site_association = read_json(path)?,
            None => warn!("APPLE_APP_SITE_ASSOCIATION_PATH not set; iOS deep links disabled"),
        }
        match &settings.asset_links_path {
            Some(path) => documents.asset_links = read_json(path)?,
            None => warn!("ANDROID_ASSET_LINKS_PATH not set; Android deep links disabled"),
        }
        Ok(documents)
    }
}

fn read_json(path: &Path) -> Result<String> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str::<serde_json::Value>(&contents)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    Ok(contents)
}

pub async fn apple_app_site_association(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        state.well_known.apple_app_site_association.clone(),
    )
}

pub async fn asset_links(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        state.well_known.asset_links.clone(),
    )
}
