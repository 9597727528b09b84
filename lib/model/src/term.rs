use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::LazyLock;

/// Letters-only prefix, and a local part that is a SPARQL `PN_LOCAL` restricted to ASCII.
///
/// `-` may not start the local part, `.` may neither start nor end it, and `%` must begin a
/// two-digit hex escape.
static CONTROLLED_TERM_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z]+:(?:[A-Za-z0-9_:]|%[0-9A-Fa-f]{2})(?:(?:[A-Za-z0-9_.:-]|%[0-9A-Fa-f]{2})*(?:[A-Za-z0-9_:-]|%[0-9A-Fa-f]{2}))?$",
    )
    .unwrap()
});

/// A prefixed name (e.g., `snomed:35489007`) that refers to a controlled term.
///
/// Controlled terms are interpolated verbatim into generated SPARQL queries. Therefore, the only
/// way to obtain one is through [FromStr], which enforces the syntax.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ControlledTerm {
    value: String,
    colon: usize,
}

impl ControlledTerm {
    /// The prefix of the term, without the colon.
    pub fn prefix(&self) -> &str {
        &self.value[..self.colon]
    }

    /// The part after the first colon.
    pub fn local_name(&self) -> &str {
        &self.value[self.colon + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl FromStr for ControlledTerm {
    type Err = TermParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if !CONTROLLED_TERM_REGEX.is_match(value) {
            return Err(TermParseError {
                value: value.to_owned(),
            });
        }
        let colon = value.find(':').ok_or_else(|| TermParseError {
            value: value.to_owned(),
        })?;
        Ok(Self {
            value: value.to_owned(),
            colon,
        })
    }
}

impl TryFrom<String> for ControlledTerm {
    type Error = TermParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ControlledTerm> for String {
    fn from(term: ControlledTerm) -> Self {
        term.value
    }
}

impl Display for ControlledTerm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

/// Raised if a string is not a valid prefixed controlled term.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not a valid controlled term. Expected a prefixed term like 'snomed:35489007'.")]
pub struct TermParseError {
    value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_prefixed_terms() {
        for value in [
            "snomed:248153007",
            "snomed:32570681000036106",
            "nb:cogAtlas-1234",
            "nidm:T1Weighted",
            "nb:Assessment",
            "dbo:abstract",
            "nb:x",
            "nb:x.y",
            "nidm:a%20b",
            "nb:%2Fx",
        ] {
            assert!(value.parse::<ControlledTerm>().is_ok(), "{value}");
        }
    }

    #[test]
    fn rejects_malformed_terms() {
        for value in [
            "apple",
            "some_thing:cool",
            "sn0med:35489007",
            ":123456",
            "bg01:cogAtlas-1234",
            "2nim:EEG",
            "cogAtlas-1234",
            "nb:",
            "nb:x} . ?s ?p ?o",
            "nb:<http://example.com>",
            "nidm:T1.",
            "nidm:.x",
            "nidm:-x",
            "nidm:a%zz",
            "nidm:a%2",
            "nidm:a%",
        ] {
            assert!(value.parse::<ControlledTerm>().is_err(), "{value}");
        }
    }

    #[test]
    fn splits_prefix_and_local_name() {
        let term: ControlledTerm = "cogatlas:tsk_U9gDp8utahAfO".parse().unwrap();
        assert_eq!(term.prefix(), "cogatlas");
        assert_eq!(term.local_name(), "tsk_U9gDp8utahAfO");
        assert_eq!(term.to_string(), "cogatlas:tsk_U9gDp8utahAfO");
    }

    #[test]
    fn deserialize_validates() {
        let term: ControlledTerm = serde_json::from_str("\"nb:Diagnosis\"").unwrap();
        assert_eq!(term.as_str(), "nb:Diagnosis");
        assert!(serde_json::from_str::<ControlledTerm>("\"apple\"").is_err());
    }
}
