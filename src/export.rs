use csv::WriterBuilder;

use crate::entry::VocabEntry;
use crate::Result;

pub const EXPORT_FILENAME: &str = "vocab-export.csv";

pub const EXPORT_HEADER: [&str; 10] = [
    "zh_title", "en_title", "zh_def", "en_def", "category", "tags", "example", "details",
    "images", "frequency",
];

fn cell(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

/// Writes the collection as CSV that [`crate::normalize::parse_csv`] reads
/// back into equal entries (ids and timestamps aside).
pub fn serialize(collection: &[VocabEntry]) -> Result<String> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(EXPORT_HEADER)?;

    for entry in collection {
        let tags = entry.tags.join(";");
        let images = entry.images.join(";");
        let frequency = entry.frequency.map(|f| f.to_string()).unwrap_or_default();
        writer.write_record([
            cell(&entry.title_zh),
            cell(&entry.title_en),
            cell(&entry.def_zh),
            cell(&entry.def_en),
            cell(&entry.category),
            tags.as_str(),
            cell(&entry.example),
            cell(&entry.details),
            images.as_str(),
            frequency.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}
