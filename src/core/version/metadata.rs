use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A released client build: the primary artifact plus its libraries.
///
/// `libraries` maps library id to download URL, in manifest order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionMetadata {
    pub version: String,
    pub url: String,
    pub file_name: String,
    #[serde(default, deserialize_with = "string_valued")]
    pub libraries: Map<String, Value>,
}

/// Library maps whose values are not all URL strings are rejected.
fn string_valued<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Map<String, Value>, D::Error> {
    let libraries = Map::deserialize(deserializer)?;
    if let Some((id, _)) = libraries.iter().find(|(_, url)| !url.is_string()) {
        return Err(D::Error::custom(format!("library {id} has no URL")));
    }
    Ok(libraries)
}

/// A file the game needs on disk, named after its download URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameFile {
    pub url: String,
    pub name: String,
}

const PRIMARY_FALLBACK: &str = "game-client.jar";
const LIBRARY_FALLBACK: &str = "library.jar";

impl VersionMetadata {
    /// `(library id, url)` pairs in manifest order.
    pub fn library_urls(&self) -> impl Iterator<Item = (&str, &str)> {
        self.libraries
            .iter()
            .filter_map(|(id, url)| Some((id.as_str(), url.as_str()?)))
    }

    /// The primary artifact followed by every library, in manifest order.
    pub fn required_files(&self) -> Vec<GameFile> {
        let mut files = Vec::with_capacity(self.libraries.len() + 1);
        files.push(GameFile {
            url: self.url.clone(),
            name: file_name_from_url(&self.url, PRIMARY_FALLBACK),
        });
        for (_, url) in self.library_urls() {
            files.push(GameFile {
                url: url.to_string(),
                name: file_name_from_url(url, LIBRARY_FALLBACK),
            });
        }
        files
    }
}

/// Last `/`-separated segment of `url`, or `fallback` when it is empty.
pub fn file_name_from_url(url: &str, fallback: &str) -> String {
    match url.rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment.to_string(),
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_update_manifest() {
        let json = r#"{
            "version": "1.2.0",
            "url": "https://cdn.example/selene-client-1.2.0.jar",
            "fileName": "selene-client-1.2.0.jar",
            "libraries": {
                "kotlin-stdlib.jar": "https://cdn.example/libs/kotlin-stdlib.jar",
                "gson.jar": "https://cdn.example/libs/gson.jar"
            }
        }"#;
        let meta: VersionMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.file_name, "selene-client-1.2.0.jar");

        let names: Vec<_> = meta
            .required_files()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(
            names,
            ["selene-client-1.2.0.jar", "kotlin-stdlib.jar", "gson.jar"]
        );
    }

    #[test]
    fn library_without_url_is_rejected() {
        let json = r#"{
            "version": "1.2.0",
            "url": "https://cdn.example/game.jar",
            "fileName": "game.jar",
            "libraries": { "broken.jar": 42 }
        }"#;
        assert!(serde_json::from_str::<VersionMetadata>(json).is_err());
    }

    #[test]
    fn trailing_slash_falls_back() {
        assert_eq!(
            file_name_from_url("https://cdn.example/dir/", "library.jar"),
            "library.jar"
        );
        assert_eq!(file_name_from_url("plain.jar", "library.jar"), "plain.jar");
    }
}
