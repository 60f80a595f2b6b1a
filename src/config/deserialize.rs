// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Handles non-empty worker marker lists.

use nonempty::NonEmpty;
use serde::Deserialize;

pub fn deserialize_markers<'de, D>(deserializer: D) -> Result<NonEmpty<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<String> = Vec::deserialize(deserializer)?;
    let markers: Vec<String> = values
        .into_iter()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect();

    NonEmpty::from_vec(markers)
        .ok_or_else(|| serde::de::Error::custom("at least one worker marker is required"))
}
