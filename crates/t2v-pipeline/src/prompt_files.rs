//! Prompt list files.
//!
//! Two formats are accepted:
//! - `.txt`: one prompt per line
//! - `.csv`: a table with `prompt` and `base_prompt` columns
//!
//! Validation cleans every prompt and rewrites the file in place; nothing
//! is written when any row fails.

use std::path::Path;

use tokio::fs;
use tracing::info;

use t2v_models::{normalize_prompts, PromptEntry, ValidationError, MAX_PROMPT_LEN, MAX_TABLE_PROMPT_LEN};

use crate::error::{PipelineError, PipelineResult};
use crate::fs_utils::write_atomic;

/// Sibling file receiving the prompt column of a validated table.
pub const PROMPT_LIST_FILE_NAME: &str = "prompts.txt";

const PROMPT_COLUMN: &str = "prompt";
const BASE_PROMPT_COLUMN: &str = "base_prompt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptFileFormat {
    Text,
    Table,
}

fn detect_format(path: &Path) -> PipelineResult<PromptFileFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" => Ok(PromptFileFormat::Text),
        "csv" => Ok(PromptFileFormat::Table),
        _ => Err(ValidationError::UnsupportedFormat(path.display().to_string()).into()),
    }
}

/// Parsed prompt table; other columns are kept so a rewrite preserves them.
struct PromptTable {
    headers: csv::StringRecord,
    rows: Vec<csv::StringRecord>,
    prompt_idx: usize,
    base_idx: usize,
}

impl PromptTable {
    fn parse(content: &str) -> PipelineResult<Self> {
        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let headers = reader.headers()?.clone();

        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| ValidationError::MissingColumn(name.to_string()))
        };
        let prompt_idx = column(PROMPT_COLUMN)?;
        let base_idx = column(BASE_PROMPT_COLUMN)?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| ValidationError::MalformedRow {
                line: e.position().map(|p| p.line()).unwrap_or(0),
                message: e.to_string(),
            })?;
            rows.push(record);
        }

        Ok(Self {
            headers,
            rows,
            prompt_idx,
            base_idx,
        })
    }

    fn entries(&self) -> Vec<PromptEntry> {
        self.rows
            .iter()
            .map(|row| {
                PromptEntry::with_base(
                    row.get(self.prompt_idx).unwrap_or_default(),
                    row.get(self.base_idx).unwrap_or_default(),
                )
            })
            .collect()
    }

    /// Serialize with the cleaned entries substituted in.
    fn to_csv(&self, cleaned: &[PromptEntry]) -> PipelineResult<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for (row, entry) in self.rows.iter().zip(cleaned) {
            let fields: Vec<&str> = row
                .iter()
                .enumerate()
                .map(|(i, field)| {
                    if i == self.prompt_idx {
                        entry.prompt.as_str()
                    } else if i == self.base_idx {
                        entry.base_prompt.as_str()
                    } else {
                        field
                    }
                })
                .collect();
            writer.write_record(&fields)?;
        }
        writer.into_inner().map_err(|e| PipelineError::Io(e.into_error()))
    }
}

fn parse_text(content: &str) -> Vec<PromptEntry> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(PromptEntry::new)
        .collect()
}

fn prompt_lines(entries: &[PromptEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.prompt);
        out.push('\n');
    }
    out
}

/// Read and clean a prompt file without modifying it.
pub async fn read_prompt_file(path: impl AsRef<Path>) -> PipelineResult<Vec<PromptEntry>> {
    let path = path.as_ref();
    let format = detect_format(path)?;
    let content = fs::read_to_string(path).await?;

    let entries = match format {
        PromptFileFormat::Text => normalize_prompts(&parse_text(&content), MAX_PROMPT_LEN)?,
        PromptFileFormat::Table => {
            let table = PromptTable::parse(&content)?;
            normalize_prompts(&table.entries(), MAX_TABLE_PROMPT_LEN)?
        }
    };
    Ok(entries)
}

/// Validate a prompt file and rewrite it cleaned.
///
/// For tables, a sibling `prompts.txt` also receives the prompt column.
pub async fn validate_prompt_file(path: impl AsRef<Path>) -> PipelineResult<Vec<PromptEntry>> {
    let path = path.as_ref();
    let format = detect_format(path)?;
    let content = fs::read_to_string(path).await?;

    match format {
        PromptFileFormat::Text => {
            let entries = normalize_prompts(&parse_text(&content), MAX_PROMPT_LEN)?;
            write_atomic(path, prompt_lines(&entries).as_bytes()).await?;
            info!("Validated {} prompts in {}", entries.len(), path.display());
            Ok(entries)
        }
        PromptFileFormat::Table => {
            let table = PromptTable::parse(&content)?;
            let entries = normalize_prompts(&table.entries(), MAX_TABLE_PROMPT_LEN)?;
            let csv_bytes = table.to_csv(&entries)?;

            write_atomic(path, &csv_bytes).await?;
            let list_path = path.with_file_name(PROMPT_LIST_FILE_NAME);
            write_atomic(&list_path, prompt_lines(&entries).as_bytes()).await?;

            info!(
                "Validated {} prompts in {}, prompt list written to {}",
                entries.len(),
                path.display(),
                list_path.display()
            );
            Ok(entries)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_validate_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompts.txt");
        std::fs::write(&path, "  \"a beautiful waterfall\"\n\n   \nday/night cycle\n").unwrap();

        let entries = validate_prompt_file(&path).await.unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "a beautiful waterfall\ndaynight cycle\n"
        );
    }

    #[tokio::test]
    async fn test_validate_table_writes_prompt_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("approved.csv");
        std::fs::write(
            &path,
            "id,prompt,base_prompt\n1, a cat/dog ,cats\n2,\"rain, at night\",\n",
        )
        .unwrap();

        let entries = validate_prompt_file(&path).await.unwrap();
        assert_eq!(entries[0], PromptEntry::with_base("a catdog", "cats"));
        assert_eq!(entries[1], PromptEntry::new("rain, at night"));

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "id,prompt,base_prompt\n1,a catdog,cats\n2,\"rain, at night\",\n"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join(PROMPT_LIST_FILE_NAME)).unwrap(),
            "a catdog\nrain, at night\n"
        );
    }

    #[tokio::test]
    async fn test_table_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.csv");
        std::fs::write(&path, "prompt\nhello\n").unwrap();

        let err = validate_prompt_file(&path).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Validation(ValidationError::MissingColumn(ref c)) if c == "base_prompt"
        ));
    }

    #[tokio::test]
    async fn test_malformed_row_reports_line_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.csv");
        let original = "prompt,base_prompt\nok,fine\nbad\n";
        std::fs::write(&path, original).unwrap();

        let err = validate_prompt_file(&path).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Validation(ValidationError::MalformedRow { line: 3, .. })
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
        assert!(!dir.path().join(PROMPT_LIST_FILE_NAME).exists());
    }

    #[tokio::test]
    async fn test_too_long_table_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.csv");
        let long = "x".repeat(651);
        std::fs::write(&path, format!("prompt,base_prompt\nshort,{long}\n")).unwrap();

        let err = validate_prompt_file(&path).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Validation(ValidationError::TooLong { max: 650, .. })
        ));
    }

    #[tokio::test]
    async fn test_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.json");
        std::fs::write(&path, "[]").unwrap();

        let err = read_prompt_file(&path).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Validation(ValidationError::UnsupportedFormat(_))
        ));
    }

    #[tokio::test]
    async fn test_read_does_not_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompts.txt");
        std::fs::write(&path, "'quoted'\n").unwrap();

        let entries = read_prompt_file(&path).await.unwrap();
        assert_eq!(entries, vec![PromptEntry::new("quoted")]);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "'quoted'\n");
    }
}
