//! Readers for the compound-to-label CSV and the off-label category table.
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use ndarray::Array2;

use crate::data_handling::LabelFrame;

/// A loaded dataset: SMILES strings plus the binary label table, row
/// aligned. Molecule parsing and featurization happen elsewhere.
#[derive(Debug, Clone)]
pub struct SiderDataset {
    pub smiles: Vec<String>,
    pub labels: LabelFrame,
}

/// Read a CSV with one SMILES column and N binary label columns. Label
/// column order is preserved; any non-zero numeric cell counts as positive.
pub fn read_sider_csv<P: AsRef<Path>>(path: P) -> Result<SiderDataset> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to open dataset file: {}", path.display()))?;

    let headers = reader
        .headers()
        .context("Failed to read dataset header row")?
        .clone();

    let smiles_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("smiles"))
        .ok_or_else(|| anyhow!("Missing 'smiles' column in {}", path.display()))?;

    let label_names: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != smiles_idx)
        .map(|(_, h)| h.to_string())
        .collect();
    if label_names.is_empty() {
        return Err(anyhow!("No label columns found in {}", path.display()));
    }

    let mut smiles = Vec::new();
    let mut values = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;
        smiles.push(
            record
                .get(smiles_idx)
                .ok_or_else(|| anyhow!("Missing SMILES value at row {}", row_idx + 1))?
                .trim()
                .to_string(),
        );
        for (i, field) in record.iter().enumerate() {
            if i == smiles_idx {
                continue;
            }
            let value: f64 = field.trim().parse().with_context(|| {
                format!(
                    "Invalid label value '{}' at row {}, column '{}'",
                    field,
                    row_idx + 1,
                    headers.get(i).unwrap_or("")
                )
            })?;
            values.push(if value != 0.0 { 1 } else { 0 });
        }
    }

    let y = Array2::from_shape_vec((smiles.len(), label_names.len()), values)
        .context("Label table has ragged rows")?;
    let labels = LabelFrame::new(label_names, y).map_err(|e| anyhow!(e.to_string()))?;
    Ok(SiderDataset { smiles, labels })
}

/// Resolves a compound identifier to a canonical SMILES string.
/// Implemented over HTTP by [`crate::io::pubchem::PubChemClient`]; tests
/// substitute in-memory maps.
pub trait SmilesResolver {
    fn resolve(&mut self, compound_id: &str) -> Result<String>;
}

/// One row of the off-label category table: a compound identifier and the
/// side-effect category it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsideRecord {
    pub compound_id: String,
    pub category: String,
}

/// Read the auxiliary (compound-id, category) CSV. Expects `stitch_id` and
/// `SOC` columns.
pub fn read_offsides_csv<P: AsRef<Path>>(path: P) -> Result<Vec<OffsideRecord>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to open off-label file: {}", path.display()))?;

    let headers = reader
        .headers()
        .context("Failed to read off-label header row")?
        .clone();
    let id_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("stitch_id"))
        .ok_or_else(|| anyhow!("Missing 'stitch_id' column in {}", path.display()))?;
    let soc_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("soc"))
        .ok_or_else(|| anyhow!("Missing 'SOC' column in {}", path.display()))?;

    let mut records = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;
        records.push(OffsideRecord {
            compound_id: record
                .get(id_idx)
                .ok_or_else(|| anyhow!("Missing stitch_id at row {}", row_idx + 1))?
                .trim()
                .to_string(),
            category: record
                .get(soc_idx)
                .ok_or_else(|| anyhow!("Missing SOC at row {}", row_idx + 1))?
                .trim()
                .to_string(),
        });
    }
    Ok(records)
}

/// Build the off-label evaluation dataset: one row per unique compound (in
/// first-appearance order), SMILES from the resolver, and a binary cell per
/// known label name.
///
/// Resolver failures are logged with the offending identifier and leave an
/// empty SMILES placeholder; the rest of the batch continues. Categories
/// outside `label_names` are ignored.
pub fn build_offside_dataset(
    records: &[OffsideRecord],
    label_names: &[String],
    resolver: &mut dyn SmilesResolver,
) -> SiderDataset {
    let mut compound_ids: Vec<&str> = Vec::new();
    for record in records {
        if !compound_ids.contains(&record.compound_id.as_str()) {
            compound_ids.push(&record.compound_id);
        }
    }

    let smiles: Vec<String> = compound_ids
        .iter()
        .map(|&id| match resolver.resolve(id) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("Problem retrieving SMILES for {}: {}", id, e);
                String::new()
            }
        })
        .collect();

    let mut y = Array2::<i32>::zeros((compound_ids.len(), label_names.len()));
    for record in records {
        let Some(row) = compound_ids.iter().position(|&id| id == record.compound_id) else {
            continue;
        };
        if let Some(col) = label_names.iter().position(|n| *n == record.category) {
            y[(row, col)] = 1;
        }
    }

    let labels = LabelFrame::new(label_names.to_vec(), y)
        .expect("label width matches names by construction");
    SiderDataset { smiles, labels }
}
