use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub relops: RelOpsConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Bytes available to records on one heap page.
    pub page_size: usize,
    /// Bucket count for newly created hash indexes.
    pub index_buckets: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            page_size: 4096,
            index_buckets: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RelOpsConfig {
    /// Result relations are named `<n><result_suffix>`.
    pub result_suffix: String,
    /// Block size of the join behind `check_files_equal`.
    pub equality_block_size: u32,
}

impl Default for RelOpsConfig {
    fn default() -> Self {
        RelOpsConfig {
            result_suffix: "result".to_owned(),
            equality_block_size: 5,
        }
    }
}

impl Config {
    pub fn from_toml_str(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }
}
