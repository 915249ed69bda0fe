use include_dir::{include_dir, Dir, File};

use crate::sources::VocabSource;
use crate::{Error, Result};

static ASSETS_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/assets");

const SAMPLE_FILE: &str = "sample.csv";

/// Small dataset compiled into the binary, used when nothing else loads.
#[derive(Debug, Clone)]
pub struct BuiltinSample;

impl VocabSource for BuiltinSample {
    fn name(&self) -> String {
        "built-in sample".to_string()
    }

    fn fetch(&self) -> Result<String> {
        let file: &File = ASSETS_DIR
            .get_file(SAMPLE_FILE)
            .ok_or(Error::MissingAsset(SAMPLE_FILE))?;

        file.contents_utf8()
            .map(str::to_string)
            .ok_or(Error::MissingAsset(SAMPLE_FILE))
    }
}
