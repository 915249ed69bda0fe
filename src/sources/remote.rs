use std::fs;
use std::path::PathBuf;

use crate::sources::VocabSource;
use crate::Result;

#[derive(Debug, Clone)]
pub struct FileSource {
    pub path: PathBuf,
}

impl VocabSource for FileSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<String> {
        Ok(fs::read_to_string(&self.path)?)
    }

    fn is_json(&self) -> bool {
        self.path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
    }
}

/// A single blocking GET, no retry.
#[derive(Debug, Clone)]
pub struct UrlSource {
    pub url: String,
}

impl VocabSource for UrlSource {
    fn name(&self) -> String {
        self.url.clone()
    }

    fn fetch(&self) -> Result<String> {
        let response = reqwest::blocking::get(&self.url)?.error_for_status()?;
        Ok(response.text()?)
    }

    fn is_json(&self) -> bool {
        let path = self.url.split(['?', '#']).next().unwrap_or("");
        path.to_ascii_lowercase().ends_with(".json")
    }
}
