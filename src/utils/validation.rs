use crate::utils::error::{CareError, Result};
use std::collections::HashSet;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(CareError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(CareError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(CareError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(CareError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(CareError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(CareError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_file_extensions(
    field_name: &str,
    files: &[&str],
    allowed_extensions: &[&str],
) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    for file in files {
        match std::path::Path::new(file)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            Some(extension) if allowed_set.contains(extension) => {}
            Some(extension) => {
                return Err(CareError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.to_string(),
                    reason: format!(
                        "Unsupported file extension: {}. Allowed extensions: {}",
                        extension,
                        allowed_extensions.join(", ")
                    ),
                });
            }
            None => {
                return Err(CareError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.to_string(),
                    reason: "File has no extension or invalid filename".to_string(),
                });
            }
        }
    }

    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| CareError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CareError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// 左開右閉區間 (min, max]
pub fn validate_range_exclusive_min<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value <= min || value > max {
        return Err(CareError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be greater than {} and at most {}", min, max),
        });
    }
    Ok(())
}

/// 驗證 "MM-DD" 格式的日期 (節日表)
pub fn validate_month_day(field_name: &str, value: &str) -> Result<()> {
    let invalid = |reason: &str| CareError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let (month, day) = value
        .split_once('-')
        .ok_or_else(|| invalid("Expected MM-DD"))?;
    let month: u32 = month.parse().map_err(|_| invalid("Month is not a number"))?;
    let day: u32 = day.parse().map_err(|_| invalid("Day is not a number"))?;

    // 2024 為閏年，允許 02-29
    if chrono::NaiveDate::from_ymd_opt(2024, month, day).is_none() {
        return Err(invalid("Not a calendar day"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required_field() {
        let endpoint = Some("https://example.com".to_string());
        assert_eq!(
            validate_required_field("weather_api.endpoint", &endpoint).unwrap(),
            "https://example.com"
        );
        let missing: Option<String> = None;
        assert!(matches!(
            validate_required_field("weather_api.endpoint", &missing),
            Err(CareError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("weather_api.endpoint", "https://example.com").is_ok());
        assert!(validate_url("weather_api.endpoint", "http://example.com").is_ok());
        assert!(validate_url("weather_api.endpoint", "").is_err());
        assert!(validate_url("weather_api.endpoint", "invalid-url").is_err());
        assert!(validate_url("weather_api.endpoint", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("analysis.trees", 100, 1).is_ok());
        assert!(validate_positive_number("analysis.trees", 0, 1).is_err());
    }

    #[test]
    fn test_validate_file_extensions() {
        let files = ["residents.csv", "meal_orders.csv"];
        assert!(validate_file_extensions("data", &files, &["csv"]).is_ok());
        assert!(validate_file_extensions("data", &["residents.xlsx"], &["csv"]).is_err());
        assert!(validate_file_extensions("data", &["residents"], &["csv"]).is_err());
    }

    #[test]
    fn test_validate_range_exclusive_min() {
        assert!(validate_range_exclusive_min("analysis.contamination", 0.1, 0.0, 0.5).is_ok());
        assert!(validate_range_exclusive_min("analysis.contamination", 0.5, 0.0, 0.5).is_ok());
        assert!(validate_range_exclusive_min("analysis.contamination", 0.0, 0.0, 0.5).is_err());
        assert!(validate_range_exclusive_min("analysis.contamination", 0.6, 0.0, 0.5).is_err());
    }

    #[test]
    fn test_validate_month_day() {
        assert!(validate_month_day("risk.holidays", "12-25").is_ok());
        assert!(validate_month_day("risk.holidays", "02-29").is_ok());
        assert!(validate_month_day("risk.holidays", "13-01").is_err());
        assert!(validate_month_day("risk.holidays", "1225").is_err());
    }
}
