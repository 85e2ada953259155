//! Registry response normalization.
//!
//! The upstream is known to vary its payload shape: identity fields may sit
//! at the top level or nested under `data`, and surnames arrive as either
//! `apellido_paterno` or `apellidoPaterno` depending on the backend serving
//! the request. All of that is mapped to [`IdentityData`] here, once, at
//! the client boundary.

use serde_json::Value;

use super::IdentityData;
use crate::error::{Result, VaultError};

/// Normalize a raw registry response body for `dni` into [`IdentityData`].
///
/// # Errors
///
/// Returns `VaultError::Upstream` when the body carries `success: false`
/// or is missing the mandatory `nombres` field.
pub fn normalize_payload(dni: &str, body: &Value) -> Result<IdentityData> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("registry reported an error");
        return Err(VaultError::Upstream(message.to_string()));
    }

    // Identity fields are either nested under `data` or at the top level.
    let data = match body.get("data") {
        Some(nested) if nested.is_object() => nested,
        _ => body,
    };

    let given_names = string_field(data, &["nombres"]);
    if given_names.is_empty() {
        return Err(VaultError::Upstream(
            "registry response is missing the name fields".to_string(),
        ));
    }

    let paternal_surname = string_field(data, &["apellido_paterno", "apellidoPaterno"]);
    let maternal_surname = string_field(data, &["apellido_materno", "apellidoMaterno"]);
    let full_name = join_name_parts(&[&given_names, &paternal_surname, &maternal_surname]);

    Ok(IdentityData {
        dni: dni.to_string(),
        given_names,
        paternal_surname,
        maternal_surname,
        full_name,
    })
}

/// First non-empty string among the accepted spellings of a field.
fn string_field(data: &Value, names: &[&str]) -> String {
    names
        .iter()
        .filter_map(|name| data.get(name).and_then(Value::as_str))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or("")
        .to_string()
}

/// Join name parts with single spaces, skipping empty parts.
fn join_name_parts(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snake_case_payload() {
        let body = json!({
            "success": true,
            "data": {
                "nombres": "ANA",
                "apellido_paterno": "PEREZ",
                "apellido_materno": "LOPEZ",
            }
        });

        let identity = normalize_payload("12345678", &body).unwrap();
        assert_eq!(identity.dni, "12345678");
        assert_eq!(identity.given_names, "ANA");
        assert_eq!(identity.paternal_surname, "PEREZ");
        assert_eq!(identity.maternal_surname, "LOPEZ");
        assert_eq!(identity.full_name, "ANA PEREZ LOPEZ");
    }

    #[test]
    fn test_camel_case_payload() {
        let body = json!({
            "nombres": "JUAN CARLOS",
            "apellidoPaterno": "QUISPE",
            "apellidoMaterno": "MAMANI",
        });

        let identity = normalize_payload("87654321", &body).unwrap();
        assert_eq!(identity.paternal_surname, "QUISPE");
        assert_eq!(identity.maternal_surname, "MAMANI");
        assert_eq!(identity.full_name, "JUAN CARLOS QUISPE MAMANI");
    }

    #[test]
    fn test_flat_payload_without_data_wrapper() {
        let body = json!({
            "nombres": "MARIA",
            "apellido_paterno": "ROJAS",
            "apellido_materno": "DIAZ",
        });

        assert!(normalize_payload("11112222", &body).is_ok());
    }

    #[test]
    fn test_missing_surname_skipped_in_full_name() {
        let body = json!({
            "nombres": "ANA",
            "apellido_materno": "LOPEZ",
        });

        let identity = normalize_payload("12345678", &body).unwrap();
        assert_eq!(identity.paternal_surname, "");
        assert_eq!(identity.full_name, "ANA LOPEZ");
    }

    #[test]
    fn test_whitespace_trimmed() {
        let body = json!({
            "nombres": "  ANA ",
            "apellido_paterno": " PEREZ",
            "apellido_materno": "LOPEZ  ",
        });

        let identity = normalize_payload("12345678", &body).unwrap();
        assert_eq!(identity.full_name, "ANA PEREZ LOPEZ");
    }

    #[test]
    fn test_success_false_is_upstream_error() {
        let body = json!({
            "success": false,
            "message": "quota exceeded",
        });

        let err = normalize_payload("12345678", &body).unwrap_err();
        assert!(matches!(err, VaultError::Upstream(message) if message == "quota exceeded"));
    }

    #[test]
    fn test_missing_names_is_upstream_error() {
        let body = json!({ "success": true, "data": {} });

        let result = normalize_payload("12345678", &body);
        assert!(matches!(result, Err(VaultError::Upstream(_))));
    }
}
