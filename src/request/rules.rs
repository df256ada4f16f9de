//! Rule-driven validated request: per-field rules loaded from JSON or built in code.

use crate::error::ValidationErrors;
use crate::request::{ApiRequest, ValidatedRequest};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ValidationRule {
    #[serde(default)]
    pub required: Option<bool>,
    /// `email`, `uuid`, `date` or `datetime`.
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub allowed: Option<Vec<Value>>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
}

impl ValidationRule {
    pub fn required() -> Self {
        ValidationRule {
            required: Some(true),
            ..Default::default()
        }
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn length(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn allowed(mut self, values: Vec<Value>) -> Self {
        self.allowed = Some(values);
        self
    }

    pub fn range(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }
}

/// Validates a body against per-field rules, reporting every failing field.
#[derive(Clone, Debug, Default)]
pub struct RuleRequest {
    rules: BTreeMap<String, ValidationRule>,
    partial: bool,
}

impl RuleRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: BTreeMap<String, ValidationRule>) -> Self {
        RuleRequest {
            rules,
            partial: false,
        }
    }

    pub fn rule(mut self, field: impl Into<String>, rule: ValidationRule) -> Self {
        self.rules.insert(field.into(), rule);
        self
    }

    /// Only fields present in the body are checked; `required` is not enforced for absent ones.
    pub fn partial(mut self) -> Self {
        self.partial = true;
        self
    }
}

impl ValidatedRequest for RuleRequest {
    fn validate(&self, request: &ApiRequest) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for (field, rule) in &self.rules {
            match request.body.get(field) {
                None | Some(Value::Null) => {
                    let absent = request.body.get(field).is_none();
                    if rule.required == Some(true) && !(self.partial && absent) {
                        errors.add(field, format!("{} is required", field));
                    }
                }
                Some(v) => check_field(field, v, rule, &mut errors),
            }
        }
        errors.into_result()
    }
}

fn check_field(field: &str, v: &Value, rule: &ValidationRule, errors: &mut ValidationErrors) {
    if let Some(format) = &rule.format {
        if let Some(message) = check_format(field, v, format) {
            errors.add(field, message);
        }
    }
    if let Some(s) = v.as_str() {
        let len = s.chars().count();
        if let Some(min) = rule.min_length {
            if len < min as usize {
                errors.add(field, format!("{} must be at least {} characters", field, min));
            }
        }
        if let Some(max) = rule.max_length {
            if len > max as usize {
                errors.add(field, format!("{} must be at most {} characters", field, max));
            }
        }
        if let Some(pattern) = &rule.pattern {
            match Regex::new(pattern) {
                Ok(re) if re.is_match(s) => {}
                Ok(_) => errors.add(field, format!("{} does not match required pattern", field)),
                Err(_) => errors.add(field, format!("invalid pattern for {}", field)),
            }
        }
    }
    if let Some(allowed) = &rule.allowed {
        if !allowed.iter().any(|a| value_eq(v, a)) {
            let shown: Vec<String> = allowed.iter().take(5).map(Value::to_string).collect();
            errors.add(field, format!("{} must be one of: {}", field, shown.join(", ")));
        }
    }
    if let Some(n) = v.as_f64() {
        if let Some(min) = rule.minimum {
            if n < min {
                errors.add(field, format!("{} must be at least {}", field, min));
            }
        }
        if let Some(max) = rule.maximum {
            if n > max {
                errors.add(field, format!("{} must be at most {}", field, max));
            }
        }
    }
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

fn check_format(field: &str, v: &Value, format: &str) -> Option<String> {
    let s = v.as_str()?;
    let ok = match format.to_lowercase().as_str() {
        "email" => s.len() >= 3 && s.contains('@'),
        "uuid" => uuid::Uuid::parse_str(s).is_ok(),
        "date" => chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok(),
        "datetime" => chrono::DateTime::parse_from_rfc3339(s).is_ok(),
        _ => true,
    };
    if ok {
        None
    } else {
        Some(format!("{} must be a valid {}", field, format.to_lowercase()))
    }
}
