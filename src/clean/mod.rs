//! Turn the raw scrape into the cleaned project table and the contractor
//! table.

pub mod contractors;
pub mod normalize;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::records::{CleanProject, ProjectRecord, ReferenceRow};
use contractors::split_contractors;
use normalize::{
    is_numeric_cost, normalize_date, normalize_municipality, resolve_province, split_coordinates,
};

pub struct CleanReport {
    pub input_rows: usize,
    pub kept_rows: usize,
    pub contractor_rows: usize,
    pub cleaned_path: PathBuf,
    pub contractors_path: Option<PathBuf>,
}

impl CleanReport {
    pub fn print(&self) {
        println!(
            "Kept {} of {} rows ({} dropped for non-numeric cost).",
            self.kept_rows,
            self.input_rows,
            self.input_rows - self.kept_rows
        );
        println!("Cleaned file saved as: {}", self.cleaned_path.display());
        match &self.contractors_path {
            Some(path) => println!(
                "Contractor table saved as: {} ({} rows)",
                path.display(),
                self.contractor_rows
            ),
            None => println!("No contractor data found to export."),
        }
    }
}

/// Clean `input` and write `<stem>_cleaned.csv` and `<stem>_contractors.csv`
/// next to it. `reference` is an optional dataset keyed by `ContractId`
/// that contributes district and municipality columns.
pub fn clean(input: &Path, reference: Option<&Path>) -> Result<CleanReport> {
    let records: Vec<ProjectRecord> = read_csv(input)?;
    let lookup = match reference {
        Some(path) => load_reference(path)?,
        None => HashMap::new(),
    };
    info!("Cleaning {} rows ({} reference contracts)", records.len(), lookup.len());

    let cleaned: Vec<CleanProject> = records
        .par_iter()
        .filter_map(|r| clean_record(r, &lookup))
        .collect();

    let mut contractor_rows = Vec::new();
    let mut missing_ids = 0;
    for project in &cleaned {
        match project.contract_id.as_deref() {
            Some(id) => contractor_rows.extend(split_contractors(id, &project.contractor)),
            None => missing_ids += 1,
        }
    }
    if missing_ids > 0 {
        warn!("{} projects have no contract id; left out of the contractor table", missing_ids);
    }

    let cleaned_path = sibling(input, "_cleaned");
    write_csv(&cleaned_path, &cleaned)?;

    let contractors_path = if contractor_rows.is_empty() {
        None
    } else {
        let path = sibling(input, "_contractors");
        write_csv(&path, &contractor_rows)?;
        Some(path)
    };

    Ok(CleanReport {
        input_rows: records.len(),
        kept_rows: cleaned.len(),
        contractor_rows: contractor_rows.len(),
        cleaned_path,
        contractors_path,
    })
}

/// `None` when the row has no usable cost.
pub fn clean_record(
    record: &ProjectRecord,
    lookup: &HashMap<String, ReferenceRow>,
) -> Option<CleanProject> {
    if !is_numeric_cost(&record.cost) {
        return None;
    }

    let reference = record
        .contract_id
        .as_ref()
        .and_then(|id| lookup.get(id.trim()));
    let municipality = reference
        .and_then(|r| r.municipality.as_deref())
        .map(normalize_municipality);
    let (latitude, longitude) = match record.long_lat.as_deref().and_then(split_coordinates) {
        Some((lat, lon)) => (Some(lat), Some(lon)),
        None => (None, None),
    };

    Some(CleanProject {
        description: record.description.clone(),
        province: resolve_province(&record.province, municipality.as_deref()),
        contractor: record.contractor.clone(),
        cost: record.cost.clone(),
        completion_date: normalize_date(&record.completion_date),
        start_date: record.start_date.as_deref().and_then(normalize_date),
        region: record.region.clone(),
        contract_id: record.contract_id.clone(),
        type_of_work: record.type_of_work.clone(),
        fiscal_year: record.fiscal_year.clone(),
        reference_contract_id: reference.map(|r| r.contract_id.clone()),
        legislative_district: reference.and_then(|r| r.legislative_district.clone()),
        municipality,
        district_engineering_office: reference.and_then(|r| r.district_engineering_office.clone()),
        approved_budget: reference.and_then(|r| r.approved_budget.clone()),
        latitude,
        longitude,
    })
}

fn load_reference(path: &Path) -> Result<HashMap<String, ReferenceRow>> {
    let rows: Vec<ReferenceRow> = read_csv(path)?;
    let mut lookup = HashMap::with_capacity(rows.len());
    for row in rows {
        // First occurrence wins.
        lookup.entry(row.contract_id.trim().to_string()).or_insert(row);
    }
    Ok(lookup)
}

pub(crate) fn read_csv<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut rows = Vec::new();
    for (line, result) in rdr.deserialize().enumerate() {
        let row: T = result.with_context(|| {
            format!("Failed to parse line {} of {}", line + 2, path.display())
        })?;
        rows.push(row);
    }
    Ok(rows)
}

pub(crate) fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// `data/x.csv` + `_cleaned` → `data/x_cleaned.csv`
fn sibling(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };
    input.with_file_name(name)
}
