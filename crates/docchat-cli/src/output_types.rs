use docchat_core::config::ConfigSource;
use docchat_core::models::SourceCitation;
use serde::Serialize;
use std::collections::HashMap;
use tabled::Tabled;

/// Output for query command
#[derive(Debug, Serialize)]
pub struct QueryOutput {
    pub query: String,
    pub answer: String,
    pub sources: Vec<SourceCitation>,
}

/// One row of the sources table
#[derive(Debug, Tabled)]
pub struct SourceRow {
    #[tabled(rename = "#")]
    pub rank: usize,
    pub source: String,
    pub preview: String,
}

impl SourceRow {
    pub fn rows(sources: &[SourceCitation]) -> Vec<SourceRow> {
        sources
            .iter()
            .enumerate()
            .map(|(i, citation)| SourceRow {
                rank: i + 1,
                source: citation.source.clone().unwrap_or_else(|| "(unknown)".to_string()),
                preview: citation.content_preview.replace('\n', " "),
            })
            .collect()
    }
}

/// Output for inspect command
#[derive(Debug, Serialize)]
pub struct InspectOutput {
    pub config_file: Option<String>,
    pub settings: Vec<ConfigEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<IndexStatus>,
}

#[derive(Debug, Serialize, Tabled)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub source: String,
}

impl ConfigEntry {
    /// Entries sorted by key
    pub fn from_inspection_map(map: HashMap<String, (String, ConfigSource)>) -> Vec<ConfigEntry> {
        let mut entries: Vec<ConfigEntry> = map
            .into_iter()
            .map(|(key, (value, source))| ConfigEntry {
                key,
                value,
                source: format!("{:?}", source),
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }
}

#[derive(Debug, Serialize)]
pub struct IndexStatus {
    pub path: String,
    pub loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passages: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IndexStatus {
    pub fn failed(path: String, error: String) -> Self {
        Self {
            path,
            loaded: false,
            passages: None,
            dimensions: None,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_rows() {
        let rows = SourceRow::rows(&[
            SourceCitation {
                source: Some("policy.pdf#3".into()),
                content_preview: "line\nbreak".into(),
            },
            SourceCitation {
                source: None,
                content_preview: "x".into(),
            },
        ]);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].preview, "line break");
        assert_eq!(rows[1].source, "(unknown)");
    }

    #[test]
    fn test_config_entries_sorted() {
        let mut map = HashMap::new();
        map.insert("top_k".to_string(), ("5".to_string(), ConfigSource::Default));
        map.insert("index_path".to_string(), ("i.json".to_string(), ConfigSource::Cli));

        let entries = ConfigEntry::from_inspection_map(map);
        assert_eq!(entries[0].key, "index_path");
        assert_eq!(entries[0].source, "Cli");
        assert_eq!(entries[1].key, "top_k");
    }
}
