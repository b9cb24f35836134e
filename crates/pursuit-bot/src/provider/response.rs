use super::ProviderError;
use pursuit_core::model::location::Location;
use pursuit_core::model::transport::TransportMode;
use serde::{Deserialize, Serialize};

/// Structured decision returned by a provider.
///
/// Every field is required and unknown fields are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Decision {
    pub mode: TransportMode,
    pub target_location: Location,
    pub concealed: bool,
    pub double: bool,
}

impl Decision {
    pub fn parse(raw: &str) -> Result<Self, ProviderError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ProviderError::Malformed("empty response".into()));
        }
        serde_json::from_str(trimmed).map_err(|err| ProviderError::Malformed(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_decision() {
        let raw = r#" {"mode":"bus","targetLocation":31,"concealed":false,"double":true} "#;
        let decision = Decision::parse(raw).unwrap();
        assert_eq!(decision.mode, TransportMode::Bus);
        assert_eq!(decision.target_location, Location::new(31));
        assert!(decision.double);
    }

    #[test]
    fn accepts_mode_aliases() {
        let raw = r#"{"mode":"express","targetLocation":19,"concealed":true,"double":false}"#;
        assert_eq!(Decision::parse(raw).unwrap().mode, TransportMode::Underground);
    }

    #[test]
    fn rejects_missing_and_unknown_fields() {
        let missing = r#"{"mode":"taxi","targetLocation":2,"concealed":false}"#;
        let extra = r#"{"mode":"taxi","targetLocation":2,"concealed":false,"double":false,"why":"x"}"#;
        assert!(matches!(Decision::parse(missing), Err(ProviderError::Malformed(_))));
        assert!(matches!(Decision::parse(extra), Err(ProviderError::Malformed(_))));
    }

    #[test]
    fn rejects_prose_and_wrong_types() {
        for raw in [
            "",
            "I would take the bus to 31.",
            r#"{"mode":"rocket","targetLocation":2,"concealed":false,"double":false}"#,
            r#"{"mode":"taxi","targetLocation":"2","concealed":false,"double":false}"#,
            r#"{"mode":"taxi","targetLocation":-4,"concealed":false,"double":false}"#,
        ] {
            assert!(Decision::parse(raw).is_err(), "accepted {raw:?}");
        }
    }
}
