//! PubChem PUG REST client for canonical molecular structures.
//!
//! One call shape only: compound-by-name property lookup. Every failure
//! mode (timeout, non-2xx, malformed body, missing property) degrades to
//! `None` — a miss for one compound must never abort a pipeline walk.

use std::time::Duration;

use serde::Deserialize;

use crate::config;

pub struct PubChemClient {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

#[derive(Deserialize)]
struct PropertyResponse {
    #[serde(rename = "PropertyTable")]
    property_table: PropertyTable,
}

#[derive(Deserialize)]
struct PropertyTable {
    #[serde(rename = "Properties")]
    properties: Vec<CompoundProperties>,
}

#[derive(Deserialize)]
struct CompoundProperties {
    #[serde(rename = "CanonicalSMILES")]
    canonical_smiles: Option<String>,
    #[serde(rename = "ConnectivitySMILES")]
    connectivity_smiles: Option<String>,
}

impl PubChemClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        }
    }

    /// Client for the configured PubChem instance with the default
    /// lookup timeout.
    pub fn from_config() -> Self {
        Self::new(&config::pubchem_url(), config::PUBCHEM_TIMEOUT_SECS)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Look up the canonical structure string for a compound name.
    ///
    /// Prefers `CanonicalSMILES`, falls back to `ConnectivitySMILES`.
    /// Returns `None` on every failure path.
    pub async fn canonical_smiles(&self, name: &str) -> Option<String> {
        let url = match self.property_url(name) {
            Some(url) => url,
            None => {
                tracing::warn!(compound = name, "Cannot build PubChem lookup URL");
                return None;
            }
        };

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                if e.is_timeout() {
                    tracing::debug!(
                        compound = name,
                        timeout_secs = self.timeout_secs,
                        "PubChem lookup timed out"
                    );
                } else {
                    tracing::debug!(compound = name, error = %e, "PubChem lookup failed");
                }
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(compound = name, %status, "PubChem returned non-success");
            return None;
        }

        let parsed: PropertyResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(compound = name, error = %e, "Malformed PubChem response");
                return None;
            }
        };

        let props = parsed.property_table.properties.into_iter().next()?;
        props.canonical_smiles.or(props.connectivity_smiles)
    }

    fn property_url(&self, name: &str) -> Option<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url).ok()?;
        url.path_segments_mut().ok()?.extend([
            "rest",
            "pug",
            "compound",
            "name",
            name,
            "property",
            "CanonicalSMILES,ConnectivitySMILES",
            "JSON",
        ]);
        Some(url)
    }
}
