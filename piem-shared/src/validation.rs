/// Input validation
///
/// Raw request payloads go through three steps before they reach the store:
///
/// 1. [`sanitize`]: trim and HTML-escape every top-level string; email
///    fields are trimmed and lowercased instead of escaped.
/// 2. Typed deserialization with `deny_unknown_fields`. Structural problems
///    (not an object, wrong JSON type, unknown field) become a single
///    `body` error.
/// 3. `validator` rules declared on the input type. Failures are collected
///    into a [`FieldError`] list ordered by field name.
///
/// # Example
///
/// ```
/// use piem_shared::models::category::CreateCategory;
/// use piem_shared::validation::parse_payload;
/// use serde_json::json;
///
/// let input: CreateCategory = parse_payload(json!({ "name": "  Tools & Parts " })).unwrap();
/// assert_eq!(input.name.as_deref(), Some("Tools &amp; Parts"));
///
/// assert!(parse_payload::<CreateCategory>(json!({ "name": "x" })).is_err());
/// ```

use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{FieldError, ResourceError, ResourceResult};

/// Fields that are normalized to lowercase and never escaped
const EMAIL_FIELDS: &[&str] = &["email"];

/// Parses a path identifier
///
/// Anything that is not a UUID is rejected before the store is consulted.
pub fn parse_id(raw: &str) -> ResourceResult<Uuid> {
    let invalid = || ResourceError::InvalidArgument("Invalid ID format".to_string());

    // Hyphenated form only; simple, braced and URN spellings are rejected.
    let id = Uuid::parse_str(raw).map_err(|_| invalid())?;
    if !id.hyphenated().to_string().eq_ignore_ascii_case(raw) {
        return Err(invalid());
    }

    Ok(id)
}

/// Escapes `& < > " ' /` as HTML entities
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            '/' => escaped.push_str("&#x2F;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Normalizes top-level string values of an object payload
///
/// Non-object payloads are returned unchanged so deserialization can report
/// them.
pub fn sanitize(payload: Value) -> Value {
    let Value::Object(object) = payload else {
        return payload;
    };

    Value::Object(
        object
            .into_iter()
            .map(|(field, value)| {
                let value = match value {
                    Value::String(s) if EMAIL_FIELDS.contains(&field.as_str()) => {
                        Value::String(s.trim().to_lowercase())
                    }
                    Value::String(s) => Value::String(escape_html(s.trim())),
                    other => other,
                };
                (field, value)
            })
            .collect(),
    )
}

/// Sanitizes, deserializes and validates a payload into `T`
pub fn parse_payload<T>(payload: Value) -> ResourceResult<T>
where
    T: DeserializeOwned + Validate,
{
    if !payload.is_object() {
        return Err(ResourceError::Validation(vec![FieldError::new(
            "body",
            "Request body must be a JSON object",
        )]));
    }

    let input: T = serde_json::from_value(sanitize(payload))
        .map_err(|e| ResourceError::Validation(vec![FieldError::new("body", e.to_string())]))?;

    input
        .validate()
        .map_err(|e| ResourceError::Validation(collect_errors(&e)))?;

    Ok(input)
}

/// Flattens `validator` output into an ordered error list
pub fn collect_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut collected: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            let field = to_camel_case(&field.to_string());
            errors.iter().map(move |error| FieldError {
                field: field.clone(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field)),
            })
        })
        .collect();

    // HashMap iteration order is arbitrary; the message breaks ties.
    collected.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.message.cmp(&b.message)));
    collected
}

/// `zip_code` -> `zipCode`
pub fn to_camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// `user` or `admin`
pub fn validate_role(role: &str) -> Result<(), ValidationError> {
    match role {
        "user" | "admin" => Ok(()),
        _ => Err(ValidationError::new("role")),
    }
}

/// `Available` or `Out of Stock`
pub fn validate_inventory_status(status: &str) -> Result<(), ValidationError> {
    match status {
        "Available" | "Out of Stock" => Ok(()),
        _ => Err(ValidationError::new("status")),
    }
}

/// Digits, spaces and `-+()`, at least one digit
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '+' | '(' | ')'));

    if allowed && phone.chars().any(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("phone"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, Validate)]
    #[serde(deny_unknown_fields, rename_all = "camelCase")]
    struct Probe {
        #[validate(required(message = "Name is required"), length(min = 2, message = "Name too short"))]
        name: Option<String>,

        #[validate(email(message = "Email must be a valid email address"))]
        email: Option<String>,

        #[validate(length(min = 3, message = "Zip too short"))]
        zip_code: Option<String>,
    }

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
        assert_eq!(parse_id(&id.to_string().to_uppercase()).unwrap(), id);

        let simple = id.simple().to_string();
        let braced = id.braced().to_string();
        let urn = id.urn().to_string();
        let padded = format!(" {} ", id);

        for bad in [
            "",
            "123",
            "not-a-uuid",
            "507f1f77bcf86cd799439011",
            simple.as_str(),
            braced.as_str(),
            urn.as_str(),
            padded.as_str(),
        ] {
            assert!(
                matches!(parse_id(bad), Err(ResourceError::InvalidArgument(m)) if m == "Invalid ID format"),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="/x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;&#x2F;x&quot;&gt;Tom &amp; Jerry&#x27;s&lt;&#x2F;a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_sanitize() {
        let value = sanitize(json!({
            "name": "  <b>Tools</b> ",
            "email": "  Jane.Doe@Example.COM ",
            "quantity": 3,
            "isActive": true
        }));

        assert_eq!(value["name"], "&lt;b&gt;Tools&lt;&#x2F;b&gt;");
        assert_eq!(value["email"], "jane.doe@example.com");
        assert_eq!(value["quantity"], 3);
        assert_eq!(value["isActive"], true);
        assert_eq!(sanitize(json!([1, 2])), json!([1, 2]));
    }

    #[test]
    fn test_parse_payload_ok() {
        let probe: Probe = parse_payload(json!({ "name": " ab ", "zipCode": "12345" })).unwrap();
        assert_eq!(probe.name.as_deref(), Some("ab"));
        assert_eq!(probe.zip_code.as_deref(), Some("12345"));
        assert!(probe.email.is_none());
    }

    #[test]
    fn test_parse_payload_collects_sorted_errors() {
        let err = parse_payload::<Probe>(json!({ "email": "nope", "zipCode": "1" })).unwrap_err();

        let ResourceError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["email", "name", "zipCode"]);
        assert_eq!(errors[1].message, "Name is required");
    }

    #[test]
    fn test_parse_payload_structural_errors() {
        for payload in [json!("text"), json!({ "name": "ok", "extra": 1 }), json!({ "name": 5 })] {
            let err = parse_payload::<Probe>(payload).unwrap_err();
            assert!(
                matches!(&err, ResourceError::Validation(errors) if errors.len() == 1 && errors[0].field == "body"),
                "unexpected {err:?}"
            );
        }
    }

    #[test]
    fn test_to_camel_case() {
        assert_eq!(to_camel_case("zip_code"), "zipCode");
        assert_eq!(to_camel_case("is_active"), "isActive");
        assert_eq!(to_camel_case("name"), "name");
    }

    #[test]
    fn test_custom_validators() {
        assert!(validate_role("admin").is_ok());
        assert!(validate_role("root").is_err());

        assert!(validate_inventory_status("Out of Stock").is_ok());
        assert!(validate_inventory_status("available").is_err());

        assert!(validate_phone("+1 (555) 123-4567").is_ok());
        assert!(validate_phone("555-CALL").is_err());
        assert!(validate_phone("()").is_err());
    }
}
