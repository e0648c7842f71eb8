//! Built-in claims validation rules.

use ids_types::Claims;

use super::claims::ValidationRule;
use super::entities::SecurityProfile;

/// Requires the `securityProfile` claim to name exactly `required`.
pub fn security_profile_rule(required: SecurityProfile) -> ValidationRule {
    ValidationRule::new("security-profile", move |claims: &Claims| {
        let raw = claims
            .get_str(Claims::SECURITY_PROFILE)
            .ok_or_else(|| "securityProfile claim missing".to_string())?;
        match SecurityProfile::parse(raw) {
            Some(profile) if profile == required => Ok(()),
            Some(profile) => Err(format!(
                "security profile {} does not match required {}",
                profile.vocabulary_id(),
                required.vocabulary_id()
            )),
            None => Err(format!("unknown security profile {raw}")),
        }
    })
}

/// Requires the `iss` claim to equal `expected`.
pub fn issuer_rule(expected: impl Into<String>) -> ValidationRule {
    let expected = expected.into();
    ValidationRule::new("issuer", move |claims: &Claims| {
        if claims.issuer == expected {
            Ok(())
        } else {
            Err(format!("unexpected issuer {}", claims.issuer))
        }
    })
}
