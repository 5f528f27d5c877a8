use crate::utils::error::{GcsPocError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: &str, reason: impl Into<String>) -> GcsPocError {
    GcsPocError::InvalidArgumentError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(invalid(
            field_name,
            &value.to_string(),
            format!("Value must be at least {}", min_value),
        ));
    }
    Ok(())
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    validate_non_empty_string(field_name, path)?;

    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }

    Ok(())
}

/// GCS bucket 命名規則
pub fn validate_bucket_name(field_name: &str, bucket_name: &str) -> Result<()> {
    validate_non_empty_string(field_name, bucket_name)?;

    // 含有 '.' 的名稱最長可到 222 字元
    let max_len = if bucket_name.contains('.') { 222 } else { 63 };
    if bucket_name.len() < 3 || bucket_name.len() > max_len {
        return Err(invalid(
            field_name,
            bucket_name,
            format!("Bucket name must be between 3 and {} characters", max_len),
        ));
    }

    if !bucket_name.chars().all(|c| {
        c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_' || c == '.'
    }) {
        return Err(invalid(
            field_name,
            bucket_name,
            "Bucket name can only contain lowercase letters, numbers, hyphens, underscores, and dots",
        ));
    }

    let starts_ok = bucket_name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric());
    let ends_ok = bucket_name
        .chars()
        .last()
        .is_some_and(|c| c.is_ascii_alphanumeric());
    if !starts_ok || !ends_ok {
        return Err(invalid(
            field_name,
            bucket_name,
            "Bucket name must start and end with a letter or number",
        ));
    }

    if bucket_name.starts_with("goog") {
        return Err(invalid(
            field_name,
            bucket_name,
            "Bucket name cannot begin with the \"goog\" prefix",
        ));
    }

    Ok(())
}

pub fn validate_object_name(field_name: &str, object_name: &str) -> Result<()> {
    if object_name.is_empty() || object_name.len() > 1024 {
        return Err(invalid(
            field_name,
            object_name,
            "Object name must be between 1 and 1024 bytes",
        ));
    }

    // 名稱必須與本地路徑、遠端物件一字不差
    if object_name.starts_with('/') {
        return Err(invalid(field_name, object_name, "Object name cannot start with /"));
    }

    for segment in object_name.split('/') {
        if segment.is_empty() {
            return Err(invalid(
                field_name,
                object_name,
                "Object name cannot contain empty segments",
            ));
        }
        if segment == "." || segment == ".." {
            return Err(invalid(
                field_name,
                object_name,
                "Object name cannot contain . or .. segments",
            ));
        }
    }

    if object_name.contains(['\r', '\n']) {
        return Err(invalid(
            field_name,
            object_name,
            "Object name cannot contain carriage return or line feed characters",
        ));
    }

    if object_name.starts_with(".well-known/acme-challenge/") {
        return Err(invalid(
            field_name,
            object_name,
            "Object name cannot start with .well-known/acme-challenge/",
        ));
    }

    Ok(())
}
