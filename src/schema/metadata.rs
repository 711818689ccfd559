use schemars::schema::SchemaObject;

pub fn extension_string(schema: &SchemaObject, key: &str) -> Option<String> {
    schema
        .extensions
        .get(key)
        .and_then(|value| value.as_str().map(str::to_string))
}

/// Human label for a property name: `economicOperatorId` and `economic_operator_id` both
/// become `Economic Operator Id`.
pub fn prettify_label(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let mut result = String::with_capacity(raw.len() + 4);
    let mut capitalize = true;
    let mut prev_lower = false;
    for ch in raw.chars() {
        if ch == '_' || ch == '-' || ch == ' ' {
            if !result.ends_with(' ') {
                result.push(' ');
            }
            capitalize = true;
            prev_lower = false;
            continue;
        }

        if ch.is_ascii_uppercase() && prev_lower {
            result.push(' ');
        }

        if capitalize {
            result.push(ch.to_ascii_uppercase());
            capitalize = false;
        } else {
            result.push(ch);
        }
        prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
    }

    result.trim().to_string()
}
