use serde::{Deserialize, Serialize};

fn unknown_name() -> String {
    "unknown".to_string()
}

/// One record of `conda list --json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackage {
    #[serde(default = "unknown_name")]
    pub name: String,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub channel: Option<String>,

    #[serde(default)]
    pub build_string: Option<String>,

    #[serde(default)]
    pub base_url: Option<String>,
}

impl InstalledPackage {
    pub fn version_label(&self) -> &str {
        self.version.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_conda_list_record() {
        let json = r#"[
            {"base_url": "https://conda.anaconda.org/conda-forge", "build_number": 0,
             "build_string": "pyhd8ed1ab_0", "channel": "conda-forge",
             "dist_name": "six-1.16.0-pyhd8ed1ab_0", "name": "six",
             "platform": "noarch", "version": "1.16.0"},
            {"version": "0.1"}
        ]"#;

        let packages: Vec<InstalledPackage> = serde_json::from_str(json).unwrap();
        assert_eq!(packages[0].name, "six");
        assert_eq!(packages[0].channel.as_deref(), Some("conda-forge"));
        assert_eq!(packages[1].name, "unknown");
        assert!(packages[1].channel.is_none());
    }
}
