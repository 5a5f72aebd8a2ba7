use serde::{Deserialize, Serialize};

// ── Extraction ──

/// The six visible cells of one result row, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub description: String,
    pub province: String,
    pub contractor: String,
    pub cost: String,
    pub completion_date: String,
    pub report: String,
}

impl RawRow {
    /// Missing trailing cells stay empty; extra cells are ignored.
    pub fn from_cells<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut values = cells.into_iter().map(|c| c.as_ref().trim().to_string());
        let mut next = || values.next().unwrap_or_default();
        RawRow {
            description: next(),
            province: next(),
            contractor: next(),
            cost: next(),
            completion_date: next(),
            report: next(),
        }
    }
}

/// Detail fields carried by the hidden template that follows a row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateFields {
    pub start_date: String,
    pub long_lat: String,
    pub region: String,
    pub contract_id: String,
    pub type_of_work: String,
    pub fiscal_year: String,
}

/// One output line of the raw dataset. Template fields are all `Some`
/// or all `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    #[serde(rename = "Project Description")]
    pub description: String,
    #[serde(rename = "Province")]
    pub province: String,
    #[serde(rename = "Contractor")]
    pub contractor: String,
    #[serde(rename = "Cost")]
    pub cost: String,
    #[serde(rename = "Completion Date")]
    pub completion_date: String,
    #[serde(rename = "Report")]
    pub report: String,
    #[serde(rename = "Start Date")]
    pub start_date: Option<String>,
    #[serde(rename = "Long Lat")]
    pub long_lat: Option<String>,
    #[serde(rename = "Region")]
    pub region: Option<String>,
    #[serde(rename = "Contract ID")]
    pub contract_id: Option<String>,
    #[serde(rename = "Type of Work")]
    pub type_of_work: Option<String>,
    #[serde(rename = "Fiscal Year")]
    pub fiscal_year: Option<String>,
}

impl ProjectRecord {
    pub fn merge(row: RawRow, template: Option<TemplateFields>) -> Self {
        let mut record = ProjectRecord {
            description: row.description,
            province: row.province,
            contractor: row.contractor,
            cost: row.cost,
            completion_date: row.completion_date,
            report: row.report,
            ..Default::default()
        };
        if let Some(t) = template {
            record.start_date = Some(t.start_date);
            record.long_lat = Some(t.long_lat);
            record.region = Some(t.region);
            record.contract_id = Some(t.contract_id);
            record.type_of_work = Some(t.type_of_work);
            record.fiscal_year = Some(t.fiscal_year);
        }
        record
    }

    pub fn is_partial(&self) -> bool {
        self.contract_id.is_none()
    }
}

/// Records extracted for one region in one pass.
#[derive(Debug, Default)]
pub struct Batch {
    pub region: String,
    pub records: Vec<ProjectRecord>,
    /// Rows emitted without template fields.
    pub partial: usize,
    /// Templates with no row in front of them.
    pub orphans: usize,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ── Cleaning ──

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanProject {
    #[serde(rename = "Project Description")]
    pub description: String,
    #[serde(rename = "Province")]
    pub province: String,
    #[serde(rename = "Contractor")]
    pub contractor: String,
    #[serde(rename = "Cost")]
    pub cost: String,
    #[serde(rename = "Completion Date")]
    pub completion_date: Option<String>,
    #[serde(rename = "Start Date")]
    pub start_date: Option<String>,
    #[serde(rename = "Region")]
    pub region: Option<String>,
    #[serde(rename = "Contract ID")]
    pub contract_id: Option<String>,
    #[serde(rename = "Type of Work")]
    pub type_of_work: Option<String>,
    #[serde(rename = "Fiscal Year")]
    pub fiscal_year: Option<String>,
    #[serde(rename = "ContractId")]
    pub reference_contract_id: Option<String>,
    #[serde(rename = "LegislativeDistrict")]
    pub legislative_district: Option<String>,
    #[serde(rename = "Municipality")]
    pub municipality: Option<String>,
    #[serde(rename = "DistrictEngineeringOffice")]
    pub district_engineering_office: Option<String>,
    #[serde(rename = "ApprovedBudgetForContract")]
    pub approved_budget: Option<String>,
    #[serde(rename = "Latitude")]
    pub latitude: Option<String>,
    #[serde(rename = "Longitude")]
    pub longitude: Option<String>,
}

/// A row of the public reference dataset keyed by contract id.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReferenceRow {
    #[serde(rename = "ContractId")]
    pub contract_id: String,
    #[serde(rename = "LegislativeDistrict", default)]
    pub legislative_district: Option<String>,
    #[serde(rename = "Municipality", default)]
    pub municipality: Option<String>,
    #[serde(rename = "DistrictEngineeringOffice", default)]
    pub district_engineering_office: Option<String>,
    #[serde(rename = "ApprovedBudgetForContract", default)]
    pub approved_budget: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractorRow {
    #[serde(rename = "Contract ID")]
    pub contract_id: String,
    #[serde(rename = "Contractor")]
    pub contractor: String,
    #[serde(rename = "Contract Type")]
    pub contract_type: String,
}

// ── Enrichment ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRow {
    #[serde(rename = "Contractor")]
    pub contractor: String,
    #[serde(rename = "Owner", default)]
    pub owner: String,
}
