//! PubChem PUG REST compound-to-SMILES lookup.
use anyhow::{Context, Result};

use crate::io::sider_csv::SmilesResolver;

const PUBCHEM_BASE: &str = "https://pubchem.ncbi.nlm.nih.gov/rest/pug";

/// Blocking HTTP client for the PubChem property endpoint.
///
/// Non-2xx responses are logged and their body is still returned, so
/// callers must validate the resolved string before trusting it.
pub struct PubChemClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl PubChemClient {
    pub fn new() -> Self {
        Self::with_base_url(PUBCHEM_BASE.to_string())
    }

    /// Point the client at a different endpoint root (used by tests and
    /// mirrors).
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            base_url,
        }
    }
}

impl Default for PubChemClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip the `CID` prefix and leading zeros from a STITCH-style compound
/// identifier, leaving the bare PubChem CID.
pub fn normalize_cid(compound_id: &str) -> &str {
    let trimmed = compound_id
        .strip_prefix("CID")
        .unwrap_or(compound_id)
        .trim_start_matches('0');
    if trimmed.is_empty() {
        "0"
    } else {
        trimmed
    }
}

impl SmilesResolver for PubChemClient {
    fn resolve(&mut self, compound_id: &str) -> Result<String> {
        let cid = normalize_cid(compound_id);
        let url = format!(
            "{}/compound/cid/{}/property/CanonicalSMILES/txt",
            self.base_url, cid
        );

        let response = self
            .http
            .get(&url)
            .send()
            .with_context(|| format!("Failed to fetch SMILES for {}", compound_id))?;

        if !response.status().is_success() {
            log::warn!(
                "Problem retrieving SMILES for {}: HTTP {}",
                compound_id,
                response.status()
            );
        }

        let body = response
            .text()
            .with_context(|| format!("Failed to read SMILES response for {}", compound_id))?;
        Ok(body.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cid_normalization() {
        assert_eq!(normalize_cid("CID000010917"), "10917");
        assert_eq!(normalize_cid("CID123"), "123");
        assert_eq!(normalize_cid("123"), "123");
        assert_eq!(normalize_cid("CID000"), "0");
    }
}
