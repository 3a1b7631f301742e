//! JSON array persistence for stage outputs.
//!
//! Every stage loads the whole array, appends, and rewrites the file at the
//! end of a run. There is no atomic-write guarantee.

use std::{fs, io::Write, path::{Path, PathBuf}};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{FigcapError, Result};

#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored array, or an empty one if the file does not exist yet.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        self.read()
    }

    /// Load the stored array; a missing file is an error.
    pub fn read<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let text = fs::read_to_string(&self.path).map_err(|e| FigcapError::io(&self.path, e))?;
        serde_json::from_str(&text).map_err(|e| FigcapError::Json {
            path: self.path.clone(),
            source: e,
        })
    }

    pub fn write<T: Serialize>(&self, records: &[T]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| FigcapError::io(parent, e))?;
        }

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        records.serialize(&mut ser).map_err(|e| FigcapError::Json {
            path: self.path.clone(),
            source: e,
        })?;

        let mut file = fs::File::create(&self.path).map_err(|e| FigcapError::io(&self.path, e))?;
        file.write_all(&buf).map_err(|e| FigcapError::io(&self.path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FigureRecord;

    fn record(n: usize) -> FigureRecord {
        FigureRecord {
            figure_path: format!("figs/c/{n}.png"),
            caption: format!("caption {n}"),
            source: "src/c/main.tex".into(),
            collection_id: "c".into(),
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("out.json"));
        let records: Vec<FigureRecord> = store.load().unwrap();
        assert!(records.is_empty());
        assert!(store.read::<FigureRecord>().is_err());
    }

    #[test]
    fn append_across_runs_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("nested").join("out.json"));

        store.write(&[record(1)]).unwrap();
        let mut existing: Vec<FigureRecord> = store.load().unwrap();
        existing.push(record(2));
        store.write(&existing).unwrap();

        let reloaded: Vec<FigureRecord> = store.load().unwrap();
        assert_eq!(reloaded, vec![record(1), record(2)]);

        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\n    {"));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        fs::write(&path, "[{").unwrap();
        let err = JsonStore::new(&path).load::<FigureRecord>().unwrap_err();
        assert!(matches!(err, FigcapError::Json { .. }));
    }
}
