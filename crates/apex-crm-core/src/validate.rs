//! Input validation shared by the entity layer and the HTTP routes.

use crate::error::EntityError;
use crate::models::SeoStats;

pub const MAX_QUALITY_RATING: u8 = 100;

/// Loose shape check, equivalent to `^[^\s@]+@[^\s@]+\.[^\s@]+$`: no
/// whitespace, exactly one `@` with something before it, and a dot in the
/// domain with something on both sides of it.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

pub fn seo_stats(stats: &SeoStats) -> Result<(), EntityError> {
    if stats.website_quality_rating > MAX_QUALITY_RATING {
        return Err(EntityError::validation(format!(
            "websiteQualityRating must be between 0 and {}, got {}",
            MAX_QUALITY_RATING, stats.website_quality_rating
        )));
    }
    Ok(())
}

pub fn lead_value(value: f64) -> Result<(), EntityError> {
    if !value.is_finite() || value < 0.0 {
        return Err(EntityError::validation(
            "estimatedValue must be a non-negative number",
        ));
    }
    Ok(())
}

/// Required-field check for new clients: company and a well-formed email.
pub fn new_client(company: Option<&str>, email: Option<&str>) -> Result<(), EntityError> {
    let company = company.unwrap_or_default();
    let email = email.unwrap_or_default();
    if company.trim().is_empty() || email.trim().is_empty() {
        return Err(EntityError::validation("Company and email are required"));
    }
    if !is_valid_email(email) {
        return Err(EntityError::validation(format!(
            "invalid email address: {}",
            email
        )));
    }
    Ok(())
}
