//! Reject-list interchange with the component review document.
//!
//! The ICA review page (an external HTML/JS collaborator) lets the scientist
//! accept or reject each component and saves the decision next to the
//! decomposition as `{"reject": [...]}`. The page stores indices as strings,
//! so both `[2, 5]` and `["2", "5"]` must parse.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::artifact::Ica;
use crate::error::Result;

/// Components rejected in a review document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RejectList {
    #[serde(deserialize_with = "deserialize_indices")]
    reject: Vec<usize>,
}

impl RejectList {
    /// Build a reject list from component indices.
    #[must_use]
    pub fn new(reject: Vec<usize>) -> Self {
        Self { reject }
    }

    /// Rejected component indices, sorted and deduplicated.
    #[must_use]
    pub fn indices(&self) -> Vec<usize> {
        let mut indices = self.reject.clone();
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// Overwrite a decomposition's exclusion list with this reject list.
    pub fn apply_to(&self, ica: &mut Ica) {
        ica.exclude = self.indices();
    }
}

fn deserialize_indices<'de, D>(deserializer: D) -> std::result::Result<Vec<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<serde_json::Value> = Vec::deserialize(deserializer)?;
    let mut indices = Vec::with_capacity(raw.len());
    for value in raw {
        let index = match value {
            serde_json::Value::Number(n) => {
                let n = n
                    .as_u64()
                    .ok_or_else(|| D::Error::custom("component index must be a non-negative integer"))?;
                usize::try_from(n).map_err(D::Error::custom)?
            }
            serde_json::Value::String(s) => s.parse().map_err(D::Error::custom)?,
            other => {
                return Err(D::Error::custom(format!(
                    "invalid component index: {other}"
                )))
            }
        };
        indices.push(index);
    }
    Ok(indices)
}

/// Where the review document saves its reject list: the decomposition's
/// file name with a `.json` suffix.
#[must_use]
pub fn reject_list_path(ica_path: impl AsRef<Path>) -> PathBuf {
    ica_path.as_ref().with_extension("json")
}

/// Read a saved reject list.
///
/// # Errors
///
/// Fails when the file is unreadable or not a valid reject document.
pub fn read_reject_list(path: impl AsRef<Path>) -> Result<RejectList> {
    Ok(serde_json::from_slice(&fs::read(path.as_ref())?)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_integer_indices() {
        let list: RejectList = serde_json::from_str("{\"reject\": [2, 5]}").unwrap();
        assert_eq!(list.indices(), vec![2, 5]);
    }

    #[test]
    fn test_parses_string_indices_from_review_page() {
        let list: RejectList = serde_json::from_str("{\"reject\": [\"5\", \"2\", \"5\"]}").unwrap();
        assert_eq!(list.indices(), vec![2, 5]);
    }

    #[test]
    fn test_rejects_garbage_indices() {
        assert!(serde_json::from_str::<RejectList>("{\"reject\": [-1]}").is_err());
        assert!(serde_json::from_str::<RejectList>("{\"reject\": [true]}").is_err());
    }

    #[test]
    fn test_apply_to_overwrites_exclusions() {
        let mut ica = Ica::builder("i-ica.fif").build();
        ica.exclude = vec![0, 1, 2];
        RejectList::new(vec![5, 2]).apply_to(&mut ica);
        assert_eq!(ica.exclude, vec![2, 5]);
    }

    #[test]
    fn test_reject_list_path_convention() {
        assert_eq!(
            reject_list_path("/data/sub-01-epo-ica.fif"),
            PathBuf::from("/data/sub-01-epo-ica.json")
        );
    }
}
