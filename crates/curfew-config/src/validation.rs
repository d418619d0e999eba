//! Configuration validation

use crate::schema::{RawApp, RawConfig, RawDays, RawTimeWindow};
use curfew_util::{DaysOfWeek, WeekDay};
use std::collections::HashSet;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("App '{package}': {message}")]
    AppError { package: String, message: String },

    #[error("Duplicate app package: {0}")]
    DuplicatePackage(String),

    #[error("Invalid time format '{value}': {message}")]
    InvalidTimeFormat { value: String, message: String },

    #[error("Invalid day specification: {0}")]
    InvalidDaySpec(String),

    #[error("Service config error: {0}")]
    ServiceError(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let service = &config.service;
    if service.reconcile_interval_seconds == Some(0) {
        errors.push(ValidationError::ServiceError(
            "reconcile_interval_seconds must be greater than 0".into(),
        ));
    }
    if service.cache_ttl_seconds == Some(0) {
        errors.push(ValidationError::ServiceError(
            "cache_ttl_seconds must be greater than 0".into(),
        ));
    }
    if service.page_size == Some(0) {
        errors.push(ValidationError::ServiceError(
            "page_size must be greater than 0".into(),
        ));
    }

    if config.distractive.iter().any(|p| p.trim().is_empty()) {
        errors.push(ValidationError::ServiceError(
            "distractive package IDs cannot be empty".into(),
        ));
    }

    let mut seen = HashSet::new();
    for app in &config.apps {
        if !seen.insert(&app.package) {
            errors.push(ValidationError::DuplicatePackage(app.package.clone()));
        }
    }

    for app in &config.apps {
        errors.extend(validate_app(app));
    }

    errors
}

fn validate_app(app: &RawApp) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if app.package.trim().is_empty() {
        errors.push(ValidationError::AppError {
            package: app.package.clone(),
            message: "package cannot be empty".into(),
        });
    }

    for window in app.lock.iter().chain(&app.unlock) {
        errors.extend(validate_time_window(window, &app.package));
    }

    errors
}

fn validate_time_window(window: &RawTimeWindow, package: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match parse_days(&window.days) {
        Ok(days) if days.is_empty() => errors.push(ValidationError::AppError {
            package: package.to_string(),
            message: "a window must apply to at least one day".into(),
        }),
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::InvalidDaySpec(e)),
    }

    for value in [&window.start, &window.end] {
        if let Err(e) = parse_time(value) {
            errors.push(ValidationError::InvalidTimeFormat {
                value: value.clone(),
                message: e,
            });
        }
    }

    errors
}

/// Parse HH:MM time format
pub fn parse_time(s: &str) -> Result<(u8, u8), String> {
    let (hour, minute) = s
        .split_once(':')
        .ok_or_else(|| "Expected HH:MM format".to_string())?;

    let hour: u8 = hour.parse().map_err(|_| "Invalid hour".to_string())?;
    let minute: u8 = minute.parse().map_err(|_| "Invalid minute".to_string())?;

    if hour >= 24 {
        return Err("Hour must be 0-23".into());
    }
    if minute >= 60 {
        return Err("Minute must be 0-59".into());
    }

    Ok((hour, minute))
}

/// Parse days specification
pub fn parse_days(days: &RawDays) -> Result<DaysOfWeek, String> {
    match days {
        RawDays::Preset(preset) => match preset.to_lowercase().as_str() {
            "all" | "every" | "daily" => Ok(DaysOfWeek::ALL_DAYS),
            "weekdays" => Ok(DaysOfWeek::WEEKDAYS),
            "weekends" => Ok(DaysOfWeek::WEEKENDS),
            other => Err(format!("Unknown day preset: {}", other)),
        },
        RawDays::List(list) => list.iter().try_fold(DaysOfWeek::NONE, |set, day| {
            let day = match day.to_lowercase().as_str() {
                "sun" | "sunday" => WeekDay::Sunday,
                "mon" | "monday" => WeekDay::Monday,
                "tue" | "tuesday" => WeekDay::Tuesday,
                "wed" | "wednesday" => WeekDay::Wednesday,
                "thu" | "thursday" => WeekDay::Thursday,
                "fri" | "friday" => WeekDay::Friday,
                "sat" | "saturday" => WeekDay::Saturday,
                other => return Err(format!("Unknown day: {}", other)),
            };
            Ok(set.with(day))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(days: RawDays, start: &str, end: &str) -> RawTimeWindow {
        RawTimeWindow {
            days,
            start: start.into(),
            end: end.into(),
        }
    }

    fn app(package: &str, lock: Vec<RawTimeWindow>) -> RawApp {
        RawApp {
            package: package.into(),
            manual_lock: false,
            lock,
            unlock: vec![],
        }
    }

    fn config(apps: Vec<RawApp>) -> RawConfig {
        RawConfig {
            config_version: 1,
            service: Default::default(),
            distractive: vec![],
            apps,
        }
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("14:30").unwrap(), (14, 30));
        assert_eq!(parse_time("00:00").unwrap(), (0, 0));
        assert_eq!(parse_time("23:59").unwrap(), (23, 59));

        assert!(parse_time("24:00").is_err());
        assert!(parse_time("12:60").is_err());
        assert!(parse_time("-1:00").is_err());
        assert!(parse_time("invalid").is_err());
    }

    #[test]
    fn test_parse_days() {
        assert_eq!(
            parse_days(&RawDays::Preset("weekdays".into())).unwrap(),
            DaysOfWeek::WEEKDAYS
        );
        assert_eq!(
            parse_days(&RawDays::Preset("Weekends".into())).unwrap(),
            DaysOfWeek::WEEKENDS
        );

        let days = parse_days(&RawDays::List(vec!["sun".into(), "fri".into()])).unwrap();
        assert!(days.contains(WeekDay::Sunday));
        assert!(days.contains(WeekDay::Friday));
        assert_eq!(days.len(), 2);

        assert!(parse_days(&RawDays::List(vec!["someday".into()])).is_err());
        assert!(parse_days(&RawDays::List(vec![])).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_package_detection() {
        let errors = validate_config(&config(vec![
            app("org.example.Game", vec![]),
            app("org.example.Game", vec![]),
        ]));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::DuplicatePackage(_))));
    }

    #[test]
    fn test_empty_day_list_rejected() {
        let errors = validate_config(&config(vec![app(
            "org.example.Game",
            vec![window(RawDays::List(vec![]), "09:00", "17:00")],
        )]));
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ValidationError::AppError { .. }));
    }

    #[test]
    fn test_midnight_crossing_window_is_valid() {
        let errors = validate_config(&config(vec![app(
            "org.example.Game",
            vec![window(RawDays::Preset("all".into()), "22:00", "02:00")],
        )]));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_zero_service_values_rejected() {
        let mut raw = config(vec![]);
        raw.service.page_size = Some(0);
        raw.service.reconcile_interval_seconds = Some(0);

        let errors = validate_config(&raw);
        assert_eq!(errors.len(), 2);
    }
}
