use crate::error::Result;
use crate::records::Record;
use crate::resources::ResourceSpec;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Local file stage: a landing directory where batches are written as temp
/// CSV files for the warehouse bulk load, then deleted.
pub struct Stage {
    dir: PathBuf,
}

impl Stage {
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Write a batch to a uniquely named staged CSV. Columns are
    /// `record_id`, the resource's watermark column (when it has one, empty
    /// string for null) and the JSON `payload`.
    pub fn put(&self, resource: &ResourceSpec, records: &[Record]) -> Result<StagedFile> {
        let file_name = format!("{}_{}.csv", resource.name, Uuid::new_v4());
        let path = self.dir.join(file_name);

        let mut writer = csv::Writer::from_path(&path)?;
        match resource.watermark {
            Some(w) => {
                writer.write_record(["record_id", w.column, "payload"])?;
                for record in records {
                    let watermark = record
                        .watermark
                        .as_ref()
                        .map(|v| v.to_string())
                        .unwrap_or_default();
                    let payload = serde_json::to_string(&record.payload)?;
                    writer.write_record([&record.record_id, &watermark, &payload])?;
                }
            }
            None => {
                writer.write_record(["record_id", "payload"])?;
                for record in records {
                    let payload = serde_json::to_string(&record.payload)?;
                    writer.write_record([&record.record_id, &payload])?;
                }
            }
        }
        writer.flush()?;

        Ok(StagedFile { path })
    }
}

/// A staged temp file; callers remove it once the bulk load has consumed it.
pub struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn remove(self) -> Result<()> {
        fs::remove_file(&self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Watermark;
    use crate::resources::{COUNTRIES, PLAYERS};
    use serde_json::json;

    fn record(id: &str, watermark: Option<Watermark>) -> Record {
        Record::new(id.to_string(), watermark, json!({"player_id": 1}))
    }

    #[test]
    fn stages_and_removes_files() {
        let dir = tempfile::tempdir().unwrap();
        let stage = Stage::new(dir.path()).unwrap();

        let staged = stage
            .put(&PLAYERS, &[record("abc", Some(Watermark::Int(104925)))])
            .unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("record_id,player_id,payload"));
        let data = lines.next().unwrap();
        assert!(data.starts_with("abc,104925,"));

        staged.remove().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn null_watermark_is_empty_field() {
        let dir = tempfile::tempdir().unwrap();
        let stage = Stage::new(dir.path()).unwrap();
        let staged = stage.put(&PLAYERS, &[record("abc", None)]).unwrap();
        let content = fs::read_to_string(staged.path()).unwrap();
        assert!(content.lines().nth(1).unwrap().starts_with("abc,,"));
        staged.remove().unwrap();
    }

    #[test]
    fn keyless_resources_stage_two_columns() {
        let dir = tempfile::tempdir().unwrap();
        let stage = Stage::new(dir.path()).unwrap();
        let staged = stage.put(&COUNTRIES, &[record("abc", None)]).unwrap();
        let content = fs::read_to_string(staged.path()).unwrap();
        assert_eq!(content.lines().next(), Some("record_id,payload"));
        staged.remove().unwrap();
    }

    #[test]
    fn staged_names_are_unique_per_put() {
        let dir = tempfile::tempdir().unwrap();
        let stage = Stage::new(dir.path()).unwrap();
        let a = stage.put(&PLAYERS, &[]).unwrap();
        let b = stage.put(&PLAYERS, &[]).unwrap();
        assert_ne!(a.path(), b.path());
        a.remove().unwrap();
        b.remove().unwrap();
    }
}
