use validator::ValidationErrors;

/// Flattens `validator` derive errors into a single human-readable string,
/// naming the offending field for each message.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(m) => format!("{field}: {m}"),
                None => format!("{field}: invalid value"),
            })
        })
        .collect();
    parts.sort();
    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(email(message = "must be a valid email address"))]
        email: String,
        #[validate(length(min = 8, message = "must be at least 8 characters"))]
        password: String,
    }

    #[test]
    fn names_each_offending_field() {
        let probe = Probe {
            email: "not-an-email".into(),
            password: "short".into(),
        };
        let msg = format_validation_errors(&probe.validate().unwrap_err());
        assert!(msg.contains("email: must be a valid email address"));
        assert!(msg.contains("password: must be at least 8 characters"));
    }
}
