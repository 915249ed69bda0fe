use std::collections::HashMap;

use csv::{ReaderBuilder, Trim};
use serde::Deserialize;

use crate::entry::{Batch, VocabEntry};
use crate::Result;

const TITLE_ZH: &[&str] = &[
    "zh_title", "title_zh", "titlezh", "chinese_title", "中文标题", "中文术语", "中文名称", "中文",
];
const TITLE_EN: &[&str] = &[
    "en_title", "title_en", "titleen", "english_title", "英文标题", "英文术语", "英文名称", "英文",
];
const DEF_ZH: &[&str] = &[
    "zh_def", "def_zh", "defzh", "zh_definition", "definition_zh", "中文释义", "中文定义", "释义",
];
const DEF_EN: &[&str] = &[
    "en_def", "def_en", "defen", "en_definition", "definition_en", "英文释义", "英文定义",
];
const TERM: &[&str] = &["term", "word", "title", "name", "词条", "术语", "词语", "名称"];
const DEFINITION: &[&str] = &["definition", "def", "meaning", "description", "定义", "含义", "解释"];
const CATEGORY: &[&str] = &["category", "cat", "type", "分类", "类别", "类型"];
const TAGS: &[&str] = &["tags", "tag", "labels", "keywords", "标签", "关键词"];
const EXAMPLE: &[&str] = &["example", "examples", "sample", "例子", "例句", "示例"];
const DETAILS: &[&str] = &["details", "detail", "notes", "note", "详情", "详细", "备注", "说明"];
const IMAGES: &[&str] = &["images", "image", "img", "imgs", "pictures", "图片", "配图"];
const FREQUENCY: &[&str] = &["frequency", "freq", "count", "频率", "词频", "次数"];

const LIST_DELIMITERS: &[char] = &[',', '，', ';', '、'];

/// One cell of a raw record. CSV cells are always text; JSON imports may
/// carry lists that are already split.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    List(Vec<String>),
    Text(String),
    Number(f64),
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

/// Header → cell mapping for one input row.
pub type RawRecord = HashMap<String, RawValue>;

/// Record view with trimmed, lowercased keys.
struct Fields<'a> {
    by_key: HashMap<String, &'a RawValue>,
}

impl<'a> Fields<'a> {
    /// Headers that collide after trimming and case-folding resolve to the
    /// first non-blank value in byte order of the original header.
    fn new(record: &'a RawRecord) -> Self {
        let mut headers: Vec<_> = record.iter().collect();
        headers.sort_by(|a, b| a.0.cmp(b.0));

        let mut by_key: HashMap<String, &'a RawValue> = HashMap::new();
        for (key, value) in headers {
            by_key
                .entry(key.trim().to_lowercase())
                .and_modify(|kept| {
                    if is_blank(kept) && !is_blank(value) {
                        *kept = value;
                    }
                })
                .or_insert(value);
        }
        Self { by_key }
    }

    /// First alias with a non-blank value wins.
    fn resolve(&self, aliases: &[&str]) -> Option<&'a RawValue> {
        aliases
            .iter()
            .filter_map(|alias| self.by_key.get(*alias).copied())
            .find(|value| !is_blank(value))
    }

    fn text(&self, aliases: &[&str]) -> Option<String> {
        self.resolve(aliases).and_then(|value| match value {
            RawValue::Text(s) => Some(s.trim().to_string()),
            RawValue::Number(n) => Some(n.to_string()),
            RawValue::List(items) => {
                let joined = items.join(", ");
                Some(joined.trim().to_string()).filter(|s| !s.is_empty())
            }
        })
    }

    fn list(&self, aliases: &[&str]) -> Vec<String> {
        match self.resolve(aliases) {
            Some(RawValue::List(items)) => items.clone(),
            Some(RawValue::Text(s)) => split_list(s),
            Some(RawValue::Number(n)) => vec![n.to_string()],
            None => Vec::new(),
        }
    }

    fn number(&self, aliases: &[&str]) -> Option<f64> {
        let n = match self.resolve(aliases)? {
            RawValue::Number(n) => *n,
            RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
            RawValue::List(_) => return None,
        };
        (n.is_finite() && n >= 0.0).then_some(n)
    }
}

fn is_blank(value: &RawValue) -> bool {
    match value {
        RawValue::Text(s) => s.trim().is_empty(),
        RawValue::List(items) => items.iter().all(|s| s.trim().is_empty()),
        RawValue::Number(_) => false,
    }
}

/// Splits a multi-valued cell on commas, semicolons, the Chinese comma and
/// enumeration comma, and whitespace runs.
pub fn split_list(s: &str) -> Vec<String> {
    s.split(|c: char| LIST_DELIMITERS.contains(&c) || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn has_han(s: &str) -> bool {
    s.chars().any(|c| {
        matches!(c as u32,
            0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF | 0x20000..=0x2FA1F)
    })
}

/// Maps one raw record onto a [`VocabEntry`], or `None` when the row has
/// neither a complete Chinese nor a complete English title/definition pair.
pub fn normalize(record: &RawRecord, index: usize, batch: &Batch) -> Option<VocabEntry> {
    let fields = Fields::new(record);

    let mut title_zh = fields.text(TITLE_ZH);
    let mut title_en = fields.text(TITLE_EN);
    let mut def_zh = fields.text(DEF_ZH);
    let mut def_en = fields.text(DEF_EN);

    // Single-language sheets: the term fills the first free title, trying
    // its own script first, whose side has a definition to pair with.
    if let Some(term) = fields.text(TERM) {
        let definition = fields.text(DEFINITION);
        let zh = (&mut title_zh, &mut def_zh);
        let en = (&mut title_en, &mut def_en);
        let sides = if has_han(&term) { [zh, en] } else { [en, zh] };

        if let Some((title, def)) = sides
            .into_iter()
            .find(|(title, def)| title.is_none() && (def.is_some() || definition.is_some()))
        {
            *title = Some(term);
            if def.is_none() {
                *def = definition;
            }
        }
    }

    let entry = VocabEntry {
        id: batch.id_for(index),
        title_zh,
        title_en,
        def_zh,
        def_en,
        category: fields.text(CATEGORY),
        tags: fields.list(TAGS),
        example: fields.text(EXAMPLE),
        details: fields.text(DETAILS),
        images: fields.list(IMAGES),
        frequency: fields.number(FREQUENCY),
        added_at: batch.started_at,
    };

    if entry.has_zh_pair() || entry.has_en_pair() {
        Some(entry)
    } else {
        tracing::debug!(row = index, "dropping row without a title/definition pair");
        None
    }
}

/// Normalizes every record, dropping invalid rows.
pub fn normalize_all<'a, I>(records: I, batch: &Batch) -> Vec<VocabEntry>
where
    I: IntoIterator<Item = &'a RawRecord>,
{
    let mut total = 0;
    let entries: Vec<_> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| {
            total += 1;
            normalize(record, index, batch)
        })
        .collect();

    if entries.len() < total {
        tracing::info!(
            kept = entries.len(),
            dropped = total - entries.len(),
            "normalized records"
        );
    }
    entries
}

/// Reads CSV text with a header row into raw records. Rows the reader cannot
/// decode are skipped.
pub fn read_csv(text: &str) -> Result<Vec<RawRecord>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for (index, result) in reader.records().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(row = index + 1, error = %e, "skipping unreadable CSV row");
                continue;
            }
        };

        let mut record = RawRecord::new();
        for (col, header) in headers.iter().enumerate() {
            let value = row.get(col).unwrap_or("");
            record
                .entry(header.to_string())
                .or_insert_with(|| RawValue::from(value));
        }
        records.push(record);
    }

    Ok(records)
}

pub fn parse_csv(text: &str, batch: &Batch) -> Result<Vec<VocabEntry>> {
    let records = read_csv(text)?;
    Ok(normalize_all(&records, batch))
}

/// Parses a JSON array of raw records.
pub fn parse_json(text: &str, batch: &Batch) -> Result<Vec<VocabEntry>> {
    let records: Vec<HashMap<String, Option<RawValue>>> = serde_json::from_str(text)?;
    let records: Vec<RawRecord> = records
        .into_iter()
        .map(|record| {
            record
                .into_iter()
                .filter_map(|(k, v)| v.map(|v| (k, v)))
                .collect()
        })
        .collect();
    Ok(normalize_all(&records, batch))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), RawValue::from(*v)))
            .collect()
    }

    fn batch() -> Batch {
        Batch::at(1_700_000_000_000)
    }

    #[test]
    fn drops_rows_without_any_pair() {
        let r = record(&[("category", "逻辑"), ("zh_title", "演绎法")]);
        assert!(normalize(&r, 0, &batch()).is_none());

        let r = record(&[("en_title", "Deduction"), ("zh_def", "推理")]);
        assert!(normalize(&r, 0, &batch()).is_none());
    }

    #[test]
    fn keys_are_trimmed_and_case_insensitive() {
        let r = record(&[(" EN_Title ", " Deduction "), ("En_Def", "Reasoning")]);
        let e = normalize(&r, 3, &batch()).unwrap();
        assert_eq!(e.title_en.as_deref(), Some("Deduction"));
        assert_eq!(e.def_en.as_deref(), Some("Reasoning"));
        assert!(e.id.starts_with("1700000000000-3-"));
        assert_eq!(e.added_at, 1_700_000_000_000);
    }

    #[test]
    fn first_non_blank_alias_wins() {
        let r = record(&[
            ("zh_title", "  "),
            ("title_zh", "归纳法"),
            ("中文标题", "不会用到"),
            ("中文释义", "从特殊到一般"),
        ]);
        let e = normalize(&r, 0, &batch()).unwrap();
        assert_eq!(e.title_zh.as_deref(), Some("归纳法"));
        assert_eq!(e.def_zh.as_deref(), Some("从特殊到一般"));
    }

    #[test]
    fn splits_tags_and_images_on_all_delimiters() {
        let r = record(&[
            ("en_title", "Modus ponens"),
            ("en_def", "If P then Q; P; therefore Q"),
            ("tags", "a,b，c;d、e  f,,"),
            ("images", "http://x/1.png; http://x/2.png"),
        ]);
        let e = normalize(&r, 0, &batch()).unwrap();
        assert_eq!(e.tags, vec!["a", "b", "c", "d", "e", "f"]);
        assert_eq!(e.images, vec!["http://x/1.png", "http://x/2.png"]);
    }

    #[test]
    fn list_values_pass_through() {
        let mut r = record(&[("en_title", "Fallacy"), ("en_def", "Bad argument")]);
        r.insert(
            "tags".into(),
            RawValue::List(vec!["informal logic".into(), "b".into()]),
        );
        let e = normalize(&r, 0, &batch()).unwrap();
        assert_eq!(e.tags, vec!["informal logic", "b"]);
    }

    #[test]
    fn frequency_is_optional_and_non_negative() {
        let base = [("en_title", "Premise"), ("en_def", "A proposition")];

        let mut pairs = base.to_vec();
        pairs.push(("frequency", "12.5"));
        assert_eq!(normalize(&record(&pairs), 0, &batch()).unwrap().frequency, Some(12.5));

        for bad in ["often", "-3", "NaN", ""] {
            let mut pairs = base.to_vec();
            pairs.push(("freq", bad));
            assert_eq!(normalize(&record(&pairs), 0, &batch()).unwrap().frequency, None);
        }
    }

    #[test]
    fn generic_term_routes_by_script() {
        let zh = record(&[("term", "悖论"), ("definition", "自相矛盾的命题")]);
        let e = normalize(&zh, 0, &batch()).unwrap();
        assert_eq!(e.title_zh.as_deref(), Some("悖论"));
        assert!(e.title_en.is_none());

        let en = record(&[("Word", "Paradox"), ("Meaning", "A self-contradictory statement")]);
        let e = normalize(&en, 0, &batch()).unwrap();
        assert_eq!(e.title_en.as_deref(), Some("Paradox"));
        assert!(e.title_zh.is_none());
    }

    #[test]
    fn term_pairs_with_a_language_definition_column() {
        for header in ["词条,释义", "术语,释义", "word,释义"] {
            let text = format!("{header}\n悖论,自相矛盾的命题\n演绎法,从一般到特殊的推理\n");
            let entries = parse_csv(&text, &batch()).unwrap();
            assert_eq!(entries.len(), 2, "{header}");
            assert_eq!(entries[0].title_zh.as_deref(), Some("悖论"));
            assert_eq!(entries[0].def_zh.as_deref(), Some("自相矛盾的命题"));
        }

        let en = record(&[("term", "Paradox"), ("英文释义", "A self-contradictory statement")]);
        let e = normalize(&en, 0, &batch()).unwrap();
        assert_eq!(e.title_en.as_deref(), Some("Paradox"));

        // a Latin term next to a lone Chinese definition still forms a pair
        let mixed = record(&[("word", "Paradox"), ("释义", "自相矛盾的命题")]);
        let e = normalize(&mixed, 0, &batch()).unwrap();
        assert_eq!(e.title_zh.as_deref(), Some("Paradox"));
    }

    #[test]
    fn term_never_overrides_explicit_titles() {
        let r = record(&[
            ("zh_title", "演绎法"),
            ("zh_def", "推理"),
            ("term", "归纳法"),
            ("definition", "另一种推理"),
        ]);
        let e = normalize(&r, 0, &batch()).unwrap();
        assert_eq!(e.title_zh.as_deref(), Some("演绎法"));
        assert_eq!(e.def_zh.as_deref(), Some("推理"));
    }

    #[test]
    fn colliding_headers_resolve_the_same_way_every_time() {
        for _ in 0..32 {
            let r = record(&[
                ("en_title", "Axiom"),
                ("en_def", "Assumed truth"),
                ("Tags", "x"),
                ("tags ", "y"),
                (" CATEGORY", ""),
                ("category", "Math"),
            ]);
            let e = normalize(&r, 0, &batch()).unwrap();
            assert_eq!(e.tags, vec!["x"]);
            assert_eq!(e.category.as_deref(), Some("Math"));
        }
    }

    #[test]
    fn read_csv_handles_bom_quotes_and_ragged_rows() {
        let text = "\u{feff}zh_title,en_title,zh_def,en_def\n\
                    \"演绎法\",\"Deduction\",\"从一般到特殊的推理\",\"Reasoning, general to specific\"\n\
                    归纳法,Induction\n";
        let entries = parse_csv(text, &batch()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].def_en.as_deref(),
            Some("Reasoning, general to specific")
        );
    }

    #[test]
    fn ids_are_unique_within_a_batch() {
        let text = "en_title,en_def\nA,a\nB,b\nC,c\n";
        let entries = parse_csv(text, &batch()).unwrap();
        let mut ids: Vec<_> = entries.iter().map(|e| e.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn parse_json_accepts_lists_numbers_and_nulls() {
        let text = r#"[
            {"titleEn": "Axiom", "defEn": "Assumed truth", "tags": ["math", "logic"], "frequency": 4, "category": null},
            {"category": "逻辑"}
        ]"#;
        let entries = parse_json(text, &batch()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tags, vec!["math", "logic"]);
        assert_eq!(entries[0].frequency, Some(4.0));
        assert_eq!(entries[0].category, None);
    }
}
