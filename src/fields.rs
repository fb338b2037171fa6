//! Canonical patient fields and alias-driven resolution.
//!
//! Upstream directories disagree on field naming (`PatientId`, `patient_id`,
//! `id`, ...). Each canonical field carries a priority-ordered list of
//! accepted source keys; the first key *present* in a raw record wins, even
//! when its value is null or empty. Resolution is total: any JSON object in
//! yields a fully-populated `CanonicalPatient` out.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A raw record as delivered by the upstream API — no shape guarantee
/// beyond "JSON object".
pub type RawRecord = Map<String, Value>;

// ═══════════════════════════════════════════
// Canonical fields
// ═══════════════════════════════════════════

/// The normalized semantic slots of a patient record, decoupled from any
/// single upstream API's naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Id,
    Name,
    Age,
    Diagnosis,
    Medications,
    Allergies,
    LastUpdated,
    // Legacy subset — older directory deployments still serve these.
    Department,
    Status,
    Admitted,
}

impl CanonicalField {
    /// All fields in presentation order.
    pub const ALL: [CanonicalField; 10] = [
        CanonicalField::Id,
        CanonicalField::Name,
        CanonicalField::Age,
        CanonicalField::Diagnosis,
        CanonicalField::Medications,
        CanonicalField::Allergies,
        CanonicalField::LastUpdated,
        CanonicalField::Department,
        CanonicalField::Status,
        CanonicalField::Admitted,
    ];

    /// The coercion rule applied to whatever value the winning alias holds.
    pub fn kind(self) -> FieldKind {
        match self {
            CanonicalField::Age => FieldKind::Integer,
            CanonicalField::Medications | CanonicalField::Allergies => FieldKind::TextList,
            CanonicalField::LastUpdated | CanonicalField::Admitted => FieldKind::Timestamp,
            _ => FieldKind::Text,
        }
    }

    /// Default used when no alias key is present (or coercion falls through).
    fn default_text(self) -> &'static str {
        match self {
            CanonicalField::Name => "Unknown",
            _ => "N/A",
        }
    }
}

/// Type coercion rule for a canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    TextList,
    /// Stored as an opaque string — wardline renders timestamps verbatim.
    Timestamp,
}

// ═══════════════════════════════════════════
// Alias table
// ═══════════════════════════════════════════

/// Ordered mapping from canonical field to its accepted source keys.
///
/// Order matters twice: fields resolve in declared order, and within one
/// field the aliases are tried in declared order. New upstream shapes are
/// supported by adding alias data, not code.
#[derive(Debug, Clone)]
pub struct AliasTable {
    entries: Vec<(CanonicalField, Vec<String>)>,
}

impl AliasTable {
    /// Build a table from explicit entries. Fields missing from `entries`
    /// still resolve — to their defaults, since no alias can match.
    pub fn new(entries: Vec<(CanonicalField, Vec<String>)>) -> Self {
        Self { entries }
    }

    /// Aliases for one field, in priority order.
    pub fn aliases(&self, field: CanonicalField) -> &[String] {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, a)| a.as_slice())
            .unwrap_or(&[])
    }

    /// Resolve a raw record into a canonical patient.
    ///
    /// For each field the alias list is scanned in order; the first alias
    /// present as a key supplies the value (null included — presence wins,
    /// not truthiness). Absent fields take their declared default. Never
    /// fails.
    pub fn resolve(&self, raw: &RawRecord) -> CanonicalPatient {
        CanonicalPatient {
            id: self.text(raw, CanonicalField::Id),
            name: self.text(raw, CanonicalField::Name),
            age: self.integer(raw, CanonicalField::Age),
            diagnosis: self.text(raw, CanonicalField::Diagnosis),
            medications: self.text_list(raw, CanonicalField::Medications),
            allergies: self.text_list(raw, CanonicalField::Allergies),
            last_updated: self.text(raw, CanonicalField::LastUpdated),
            department: self.text(raw, CanonicalField::Department),
            status: self.text(raw, CanonicalField::Status),
            admitted: self.text(raw, CanonicalField::Admitted),
        }
    }

    /// First alias key present in `raw`, regardless of its value.
    fn pick<'a>(&self, raw: &'a RawRecord, field: CanonicalField) -> Option<&'a Value> {
        self.aliases(field)
            .iter()
            .find_map(|alias| raw.get(alias.as_str()))
    }

    fn text(&self, raw: &RawRecord, field: CanonicalField) -> String {
        match self.pick(raw, field) {
            Some(value) => coerce_text(value).unwrap_or_else(|| field.default_text().to_string()),
            None => field.default_text().to_string(),
        }
    }

    fn integer(&self, raw: &RawRecord, field: CanonicalField) -> i64 {
        self.pick(raw, field).and_then(coerce_integer).unwrap_or(0)
    }

    fn text_list(&self, raw: &RawRecord, field: CanonicalField) -> Vec<String> {
        self.pick(raw, field).map(coerce_text_list).unwrap_or_default()
    }
}

impl Default for AliasTable {
    /// The alias data every known directory deployment has needed so far.
    fn default() -> Self {
        fn entry(field: CanonicalField, aliases: &[&str]) -> (CanonicalField, Vec<String>) {
            (field, aliases.iter().map(|a| a.to_string()).collect())
        }

        Self::new(vec![
            entry(
                CanonicalField::Id,
                &["id", "patient_id", "patientId", "PatientId", "ID"],
            ),
            entry(
                CanonicalField::Name,
                &["name", "patient_name", "fullName", "full_name", "Name"],
            ),
            entry(CanonicalField::Age, &["age", "patient_age", "Age"]),
            entry(
                CanonicalField::Diagnosis,
                &["diagnosis", "Diagnosis", "condition", "medical_condition"],
            ),
            entry(
                CanonicalField::Medications,
                &["medications", "Medications", "meds", "drugs", "prescriptions"],
            ),
            entry(
                CanonicalField::Allergies,
                &["allergies", "Allergies", "allergy_list", "medical_allergies"],
            ),
            entry(
                CanonicalField::LastUpdated,
                &["last_updated", "LastUpdated", "lastUpdated", "updated_at", "modified_date"],
            ),
            entry(
                CanonicalField::Department,
                &["department", "dept", "department_name"],
            ),
            entry(CanonicalField::Status, &["status", "patient_status", "state"]),
            entry(
                CanonicalField::Admitted,
                &["admission_date", "admissionDate", "admitted", "date_admitted"],
            ),
        ])
    }
}

// ═══════════════════════════════════════════
// Canonical patient
// ═══════════════════════════════════════════

/// A fully-resolved patient record — every canonical field present and
/// typed. List fields are always materialized as string sequences, even
/// when the source delivered one comma-delimited string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPatient {
    pub id: String,
    pub name: String,
    pub age: i64,
    pub diagnosis: String,
    pub medications: Vec<String>,
    pub allergies: Vec<String>,
    pub last_updated: String,
    pub department: String,
    pub status: String,
    pub admitted: String,
}

// ═══════════════════════════════════════════
// Coercions — permissive, never panic
// ═══════════════════════════════════════════

/// Scalar → string. `None` means "no usable value" (null, object, array)
/// and the caller falls back to the field default.
fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Object(_) | Value::Array(_) => None,
    }
}

/// Scalar → integer. Invalid numeric strings fall back to the default at
/// the call site rather than erroring.
fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Anything → list of strings.
///
/// A single string splits on commas (trimmed, empty parts dropped); an
/// array coerces each element; any other scalar becomes a one-element
/// list; null yields the empty list.
fn coerce_text_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Array(items) => items.iter().filter_map(coerce_text).collect(),
        Value::Number(_) | Value::Bool(_) => coerce_text(value).into_iter().collect(),
        Value::Null | Value::Object(_) => Vec::new(),
    }
}
