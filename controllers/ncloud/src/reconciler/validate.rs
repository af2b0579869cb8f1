//! Field checks shared by the resource kinds.
//!
//! Each check returns the human-readable problem, which the reconciler wraps
//! into a `Validation` error naming the kind.

use std::net::Ipv4Addr;

pub fn required(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} is required", field))
    } else {
        Ok(())
    }
}

pub fn required_opt(field: &str, value: Option<&str>, context: &str) -> Result<(), String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(format!("{} is required {}", field, context)),
    }
}

pub fn forbidden(field: &str, value: Option<&str>, context: &str) -> Result<(), String> {
    match value {
        Some(_) => Err(format!("{} is not allowed {}", field, context)),
        None => Ok(()),
    }
}

/// Vendor instance naming: 3-30 chars of lowercase letters, digits and
/// hyphens, starting with a letter and not ending with a hyphen
pub fn instance_name(field: &str, name: &str) -> Result<(), String> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    let starts_with_letter = name.chars().next().is_some_and(|c| c.is_ascii_lowercase());

    if !(3..=30).contains(&name.len()) {
        return Err(format!("{} must be 3-30 characters (got {:?})", field, name));
    }
    if !valid_chars || !starts_with_letter || name.ends_with('-') {
        return Err(format!(
            "{} must use lowercase letters, digits and hyphens, start with a letter and not end with a hyphen (got {:?})",
            field, name
        ));
    }
    Ok(())
}

pub fn numeric(field: &str, value: &str) -> Result<u64, String> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| format!("{} must be numeric (got {:?})", field, value))
}

/// Private IPv4 CIDR block with a prefix length in `min_prefix..=max_prefix`
pub fn private_cidr(field: &str, value: &str, min_prefix: u8, max_prefix: u8) -> Result<(), String> {
    let invalid = || format!("{} must be an IPv4 CIDR block (got {:?})", field, value);

    let (address, prefix) = value.split_once('/').ok_or_else(invalid)?;
    let address: Ipv4Addr = address.parse().map_err(|_| invalid())?;
    let prefix: u8 = prefix.parse().map_err(|_| invalid())?;

    if !(min_prefix..=max_prefix).contains(&prefix) {
        return Err(format!(
            "{} prefix length must be between /{} and /{} (got {:?})",
            field, min_prefix, max_prefix, value
        ));
    }
    if !address.is_private() {
        return Err(format!(
            "{} must be within 10.0.0.0/8, 172.16.0.0/12 or 192.168.0.0/16 (got {:?})",
            field, value
        ));
    }
    Ok(())
}

pub fn one_of(field: &str, value: &str, allowed: &[&str]) -> Result<(), String> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(format!(
            "{} must be one of {} (got {:?})",
            field,
            allowed.join(", "),
            value
        ))
    }
}
