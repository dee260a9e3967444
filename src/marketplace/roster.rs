//! CSV roster import.
//!
//! Marketplace exports list one application per row. The importer turns an
//! export into applications plus optional reputation snapshots so a task's
//! field can be ranked offline or used to seed the in-memory store.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use super::domain::{
    ApplicantProfile, Application, ApplicationId, ApplicationStatus, Task, TaskId, UserId,
};
use super::store::InMemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum RosterImportError {
    #[error("failed to read roster export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid roster CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: field '{field}' has invalid value '{value}'")]
    InvalidField {
        row: usize,
        field: &'static str,
        value: String,
    },
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(rename = "Application ID")]
    application_id: String,
    #[serde(rename = "Applicant ID")]
    applicant_id: String,
    #[serde(rename = "Bid Amount", default, deserialize_with = "empty_as_none")]
    bid_amount: Option<String>,
    #[serde(rename = "Rating Sum", default, deserialize_with = "empty_as_none")]
    rating_sum: Option<String>,
    #[serde(rename = "Rating Count", default, deserialize_with = "empty_as_none")]
    rating_count: Option<String>,
    #[serde(rename = "Message", default, deserialize_with = "empty_as_none")]
    message: Option<String>,
    #[serde(rename = "Created At", default, deserialize_with = "empty_as_none")]
    created_at: Option<String>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// One imported application with its applicant's reputation snapshot, when
/// the export carried rating columns for the row.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub application: Application,
    pub profile: Option<ApplicantProfile>,
}

pub struct ApplicantRosterImporter;

impl ApplicantRosterImporter {
    pub fn from_path(
        path: impl AsRef<Path>,
        task_id: &TaskId,
    ) -> Result<Vec<RosterEntry>, RosterImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, task_id)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        task_id: &TaskId,
    ) -> Result<Vec<RosterEntry>, RosterImportError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        // Rows without a timestamp all get the import instant, so the stable
        // sort keeps them in file order.
        let imported_at = Utc::now();
        let mut entries = Vec::new();

        for (index, result) in csv_reader.deserialize::<RosterRow>().enumerate() {
            let row = result?;
            let row_number = index + 1;

            let bid_amount = parse_optional_amount(&row.bid_amount, "Bid Amount", row_number)?;
            let created_at = row
                .created_at
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or(imported_at);

            let profile = match (&row.rating_sum, &row.rating_count) {
                (None, None) => None,
                (sum, count) => {
                    let rating_sum =
                        parse_optional_amount(sum, "Rating Sum", row_number)?.unwrap_or(0.0);
                    let rating_count = match count {
                        Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                            RosterImportError::InvalidField {
                                row: row_number,
                                field: "Rating Count",
                                value: raw.clone(),
                            }
                        })?,
                        None => 0,
                    };
                    Some(ApplicantProfile {
                        applicant_id: UserId(row.applicant_id.clone()),
                        rating_sum,
                        rating_count,
                    })
                }
            };

            entries.push(RosterEntry {
                application: Application {
                    id: ApplicationId(row.application_id),
                    task_id: task_id.clone(),
                    applicant_id: UserId(row.applicant_id),
                    bid_amount,
                    status: ApplicationStatus::Pending,
                    message: row.message,
                    created_at,
                },
                profile,
            });
        }

        Ok(entries)
    }
}

fn parse_optional_amount(
    raw: &Option<String>,
    field: &'static str,
    row: usize,
) -> Result<Option<f64>, RosterImportError> {
    match raw {
        None => Ok(None),
        Some(value) => {
            let amount =
                value
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| RosterImportError::InvalidField {
                        row,
                        field,
                        value: value.clone(),
                    })?;
            if amount.is_sign_negative() {
                return Err(RosterImportError::InvalidField {
                    row,
                    field,
                    value: value.clone(),
                });
            }
            Ok(Some(amount))
        }
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc));
    }

    None
}

/// Load a task and its imported roster into an in-memory store.
pub fn seed_store(store: &InMemoryStore, task: Task, entries: Vec<RosterEntry>) {
    store.insert_task(task);
    for entry in entries {
        if let Some(profile) = entry.profile {
            store.insert_profile(profile);
        }
        store.insert_application(entry.application);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Application ID,Applicant ID,Bid Amount,Rating Sum,Rating Count,Message,Created At
a1,u1,90,40,10,Happy to start this week,2025-06-01T09:00:00Z
a2,u2,150,,,No history yet,2025-06-02
a3,u3,,12,3,,
";

    #[test]
    fn parses_rows_with_optional_columns() {
        let task_id = TaskId("t1".to_string());
        let entries = ApplicantRosterImporter::from_reader(SAMPLE.as_bytes(), &task_id)
            .expect("sample roster parses");

        assert_eq!(entries.len(), 3);

        let first = &entries[0];
        assert_eq!(first.application.id, ApplicationId("a1".to_string()));
        assert_eq!(first.application.bid_amount, Some(90.0));
        assert_eq!(
            first.profile.as_ref().map(|p| (p.rating_sum, p.rating_count)),
            Some((40.0, 10))
        );

        let second = &entries[1];
        assert!(second.profile.is_none());
        assert_eq!(second.application.bid_amount, Some(150.0));

        let third = &entries[2];
        assert!(third.application.bid_amount.is_none());
        assert_eq!(third.profile.as_ref().map(|p| p.rating_count), Some(3));
    }

    #[test]
    fn rejects_negative_bid() {
        let raw = "\
Application ID,Applicant ID,Bid Amount,Rating Sum,Rating Count,Message,Created At
a1,u1,-5,,,,
";
        let task_id = TaskId("t1".to_string());
        let result = ApplicantRosterImporter::from_reader(raw.as_bytes(), &task_id);
        assert!(matches!(
            result,
            Err(RosterImportError::InvalidField {
                field: "Bid Amount",
                ..
            })
        ));
    }

    #[test]
    fn date_only_timestamps_parse() {
        let parsed = parse_timestamp("2025-06-02").expect("date parses");
        assert_eq!(parsed.date_naive().to_string(), "2025-06-02");
        assert!(parse_timestamp("not-a-date").is_none());
    }
}
