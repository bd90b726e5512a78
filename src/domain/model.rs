use crate::utils::error::{GradebookError, Result};
use crate::utils::validation::{parse_score, validate_cell_text, validate_non_empty_string};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Text form of enrollment dates, e.g. `9-1-2022`.
pub const ENROLL_DATE_FORMAT: &str = "%m-%d-%Y";
const ENROLL_DATE_DISPLAY: &str = "%-m-%-d-%Y";

/// Header row shared by the `student` table and the TSV files.
pub const TSV_COLUMNS: [&str; 9] = [
    "ID",
    "Name",
    "Gender",
    "Enroll_Date",
    "English",
    "Math",
    "History",
    "Science",
    "Arts",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Subject {
    English,
    Math,
    History,
    Science,
    Arts,
}

impl Subject {
    pub const ALL: [Subject; 5] = [
        Subject::English,
        Subject::Math,
        Subject::History,
        Subject::Science,
        Subject::Arts,
    ];

    /// Column name in the `student` table and TSV header.
    pub fn column(self) -> &'static str {
        match self {
            Subject::English => "English",
            Subject::Math => "Math",
            Subject::History => "History",
            Subject::Science => "Science",
            Subject::Arts => "Arts",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Subject {
    type Err = GradebookError;

    fn from_str(s: &str) -> Result<Self> {
        Subject::ALL
            .into_iter()
            .find(|subject| subject.column().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                GradebookError::invalid_value(
                    "subject",
                    s,
                    "Expected one of English, Math, History, Science, Arts",
                )
            })
    }
}

/// Updatable columns of a student row. The identifier is immutable and has no variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Gender,
    EnrollDate,
    Score(Subject),
}

impl Field {
    pub fn column(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Gender => "Gender",
            Field::EnrollDate => "Enroll_Date",
            Field::Score(subject) => subject.column(),
        }
    }

    /// Converts user or TSV text into a value of this field's type.
    pub fn parse_value(self, raw: &str, max_score: f64) -> Result<FieldValue> {
        match self {
            Field::Name => {
                validate_non_empty_string("Name", raw)?;
                validate_cell_text("Name", raw.trim())?;
                Ok(FieldValue::Text(raw.trim().to_string()))
            }
            Field::Gender => {
                validate_cell_text("Gender", raw.trim())?;
                Ok(FieldValue::Text(raw.trim().to_string()))
            }
            Field::EnrollDate => parse_enroll_date(raw).map(FieldValue::Date),
            Field::Score(subject) => {
                parse_score(subject.column(), raw, max_score).map(FieldValue::Score)
            }
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Field {
    type Err = GradebookError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Field::Name),
            "gender" => Ok(Field::Gender),
            "enroll_date" | "enrollment" => Ok(Field::EnrollDate),
            "id" => Err(GradebookError::invalid_value(
                "field",
                s,
                "The student ID cannot be changed",
            )),
            other => other
                .parse::<Subject>()
                .map(Field::Score)
                .map_err(|_| GradebookError::invalid_value("field", s, "Unknown field")),
        }
    }
}

/// Anything readable from a record: the identifier or one of its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Id,
    Field(Field),
}

impl FromStr for Attribute {
    type Err = GradebookError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("id") {
            return Ok(Attribute::Id);
        }
        s.parse::<Field>()
            .map(Attribute::Field)
            .map_err(|_| GradebookError::invalid_value("attribute", s, "Unknown attribute"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Date(Option<NaiveDate>),
    Score(Option<f64>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Date(date) => f.write_str(&format_enroll_date(*date)),
            FieldValue::Score(score) => f.write_str(&format_score(*score)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: String,
    pub name: String,
    pub gender: String,
    pub enroll_date: Option<NaiveDate>,
    pub scores: BTreeMap<Subject, f64>,
}

impl StudentRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            gender: String::new(),
            enroll_date: None,
            scores: BTreeMap::new(),
        }
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = gender.into();
        self
    }

    pub fn with_enroll_date(mut self, date: NaiveDate) -> Self {
        self.enroll_date = Some(date);
        self
    }

    pub fn with_score(mut self, subject: Subject, score: f64) -> Self {
        self.scores.insert(subject, score);
        self
    }

    pub fn score(&self, subject: Subject) -> Option<f64> {
        self.scores.get(&subject).copied()
    }

    pub fn attribute(&self, attribute: Attribute) -> FieldValue {
        match attribute {
            Attribute::Id => FieldValue::Text(self.id.clone()),
            Attribute::Field(Field::Name) => FieldValue::Text(self.name.clone()),
            Attribute::Field(Field::Gender) => FieldValue::Text(self.gender.clone()),
            Attribute::Field(Field::EnrollDate) => FieldValue::Date(self.enroll_date),
            Attribute::Field(Field::Score(subject)) => FieldValue::Score(self.score(subject)),
        }
    }

    /// Overwrites one field. The value must match the field's type.
    pub fn apply(&mut self, field: Field, value: FieldValue) -> Result<()> {
        match (field, value) {
            (Field::Name, FieldValue::Text(name)) => self.name = name,
            (Field::Gender, FieldValue::Text(gender)) => self.gender = gender,
            (Field::EnrollDate, FieldValue::Date(date)) => self.enroll_date = date,
            (Field::Score(subject), FieldValue::Score(Some(score))) => {
                self.scores.insert(subject, score);
            }
            (Field::Score(subject), FieldValue::Score(None)) => {
                self.scores.remove(&subject);
            }
            (field, value) => {
                return Err(GradebookError::invalid_value(
                    field.column(),
                    value.to_string(),
                    "Value type does not match the field",
                ))
            }
        }
        Ok(())
    }
}

pub fn parse_enroll_date(raw: &str) -> Result<Option<NaiveDate>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, ENROLL_DATE_FORMAT)
        .map(Some)
        .map_err(|e| GradebookError::invalid_value("Enroll_Date", raw, e.to_string()))
}

pub fn format_enroll_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(ENROLL_DATE_DISPLAY).to_string())
        .unwrap_or_default()
}

pub fn format_score(score: Option<f64>) -> String {
    score.map(|s| s.to_string()).unwrap_or_default()
}

/// Max/min/mean of one subject across the record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub subject: Subject,
    pub max: f64,
    pub min: f64,
    pub mean: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub inserted: usize,
    pub skipped: usize,
    pub rejected: usize,
}
