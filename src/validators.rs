//! Field validators shared by the API payloads and the HTML forms.
//!
//! Every validator reports a [`ValidationError`] with a machine code, the
//! offending value and a localized message. Errors for a whole payload are
//! gathered in [`ValidationErrors`], keyed by field name.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

/// Maximum length of short text columns.
pub const MAX_CHARFIELD: usize = 150;
/// The first automobile was patented in 1886; 1885 is the historical floor.
pub const MIN_YEAR: i64 = 1885;
pub const MAX_YEAR: i64 = 3000;

static TITLE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-zА-Яа-яЁё0-9\s-]+$").expect("title regex"));
static TEXT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[:;.,?!A-Za-zА-Яа-яЁё0-9\s-]+$").expect("text regex"));
static YEAR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{4}$").expect("year regex"));

const REQUIRED_MESSAGE: &str = "Это поле обязательно.";
const BLANK_MESSAGE: &str = "Это поле не может быть пустым.";
const TITLE_MESSAGE: &str = "В названии допустимы: кириллица и латинские символы, \
                             арабские цифры, пробел, а также дефис.";
const TEXT_MESSAGE: &str = "В текстовом описании допустимы: кириллица и латинские символы, \
                            арабские цифры, пробел, знаки препинания, а также дефис.";
const YEAR_FORMAT_MESSAGE: &str = "Год должен состоять из 4 арабских цифр.";
const YEAR_MIN_MESSAGE: &str = "Год не может быть меньше 1885.";
const YEAR_MAX_MESSAGE: &str = "Убедитесь, что это значение меньше либо равно 3000.";
const INTEGER_MESSAGE: &str = "Требуется целочисленное значение.";

/// A single failed check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
    pub value: Option<String>,
}

impl ValidationError {
    pub fn new(code: &'static str, message: impl Into<String>, value: Option<&str>) -> Self {
        Self {
            code,
            message: message.into(),
            value: value.map(str::to_owned),
        }
    }

    pub fn required() -> Self {
        Self::new("required", REQUIRED_MESSAGE, None)
    }

    pub fn blank() -> Self {
        Self::new("blank", BLANK_MESSAGE, Some(""))
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Errors of a whole payload, keyed by field name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, Vec<ValidationError>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, error: ValidationError) {
        self.fields.entry(field).or_default().push(error);
    }

    /// Records the error of `result` under `field` and returns the value, if any.
    pub fn check<T>(&mut self, field: &'static str, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.add(field, error);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> &[ValidationError] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Messages for one field, in the order they were raised.
    pub fn messages(&self, field: &str) -> Vec<String> {
        self.get(field).iter().map(|e| e.message.to_owned()).collect()
    }

    /// Every message across all fields.
    pub fn all_messages(&self) -> Vec<String> {
        self.fields
            .values()
            .flatten()
            .map(|e| e.message.to_owned())
            .collect()
    }

    /// `{"field": ["message", ...]}`
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .fields
            .iter()
            .map(|(field, errors)| {
                (
                    (*field).to_owned(),
                    serde_json::Value::from(
                        errors.iter().map(|e| e.message.to_owned()).collect::<Vec<_>>(),
                    ),
                )
            })
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl std::error::Error for ValidationErrors {}

pub trait Validator {
    fn validate(&self, value: &str) -> Result<(), ValidationError>;
}

/// Makes and other names: letters, digits, spaces and hyphens.
pub struct TitleValidator;

/// Free text: a title plus basic punctuation.
pub struct TextValidator;

impl Validator for TitleValidator {
    fn validate(&self, value: &str) -> Result<(), ValidationError> {
        if TITLE_REGEX.is_match(value) {
            Ok(())
        } else {
            Err(ValidationError::new("invalid", TITLE_MESSAGE, Some(value)))
        }
    }
}

impl Validator for TextValidator {
    fn validate(&self, value: &str) -> Result<(), ValidationError> {
        if TEXT_REGEX.is_match(value) {
            Ok(())
        } else {
            Err(ValidationError::new("invalid", TEXT_MESSAGE, Some(value)))
        }
    }
}

/// Validates a required text field: present, non-blank after trimming,
/// within `max_len` characters, and accepted by `validator`.
pub fn required_text(
    value: Option<&str>,
    max_len: Option<usize>,
    validator: &dyn Validator,
) -> Result<String, ValidationError> {
    let value = value.ok_or_else(ValidationError::required)?.trim();
    if value.is_empty() {
        return Err(ValidationError::blank());
    }
    if let Some(max_len) = max_len {
        let len = value.chars().count();
        if len > max_len {
            return Err(ValidationError::new(
                "max_length",
                format!(
                    "Убедитесь, что это значение содержит не более {} символов (сейчас {}).",
                    max_len, len
                ),
                Some(value),
            ));
        }
    }
    validator.validate(value)?;
    Ok(value.to_owned())
}

/// A release year as submitted: a JSON number or the text of a form field.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum YearInput {
    Number(i64),
    /// A JSON number with a fractional part, such as `1967.0`.
    Float(f64),
    Text(String),
}

/// Validates an optional release year. Blank text means "no year".
pub fn validate_year(input: Option<&YearInput>) -> Result<Option<i32>, ValidationError> {
    let year = match input {
        None => return Ok(None),
        Some(YearInput::Number(year)) => *year,
        Some(YearInput::Float(year)) => {
            if year.fract() != 0.0 || !year.is_finite() || year.abs() > i64::MAX as f64 {
                return Err(ValidationError::new(
                    "invalid",
                    INTEGER_MESSAGE,
                    Some(&year.to_string()),
                ));
            }
            *year as i64
        }
        Some(YearInput::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<i64>()
                .map_err(|_| ValidationError::new("invalid", INTEGER_MESSAGE, Some(text)))?
        }
    };

    let repr = year.to_string();
    if !YEAR_REGEX.is_match(&repr) {
        return Err(ValidationError::new("invalid", YEAR_FORMAT_MESSAGE, Some(&repr)));
    }
    if year < MIN_YEAR {
        return Err(ValidationError::new("min_value", YEAR_MIN_MESSAGE, Some(&repr)));
    }
    if year > MAX_YEAR {
        return Err(ValidationError::new("max_value", YEAR_MAX_MESSAGE, Some(&repr)));
    }
    Ok(Some(year as i32))
}
