//! Session Module
//! The datasets currently loaded plus the upload errors to show.

use crate::data::Dataset;
use polars::prelude::DataFrame;

#[derive(Default)]
pub struct Session {
    datasets: Vec<Dataset>,
    errors: Vec<String>,
    next_id: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one upload. Failures become a visible error
    /// and no dataset is added.
    pub fn add_upload(&mut self, name: &str, result: anyhow::Result<DataFrame>) -> Option<u64> {
        match result {
            Ok(frame) => {
                let id = self.next_id;
                self.next_id += 1;
                log::info!(
                    "Loaded {}: {} rows, {} columns",
                    name,
                    frame.height(),
                    frame.width()
                );
                self.datasets.push(Dataset::new(id, name, frame));
                Some(id)
            }
            Err(e) => {
                log::warn!("Rejected {}: {:#}", name, e);
                self.errors.push(format!("❌ {e:#} ({name})"));
                None
            }
        }
    }

    pub fn remove(&mut self, id: u64) {
        if let Some(pos) = self.datasets.iter().position(|d| d.id == id) {
            let removed = self.datasets.remove(pos);
            log::info!("Removed {}", removed.name);
        }
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn datasets_mut(&mut self) -> &mut [Dataset] {
        &mut self.datasets
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Dataset> {
        self.datasets.iter_mut().find(|d| d.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataLoader;

    fn upload_bytes(session: &mut Session, name: &str, bytes: &[u8]) -> Option<u64> {
        let result = DataLoader::load_bytes(name, bytes).map_err(anyhow::Error::from);
        session.add_upload(name, result)
    }

    #[test]
    fn test_unsupported_upload_reports_error_without_dataset() {
        let mut session = Session::new();
        let id = upload_bytes(&mut session, "notes.txt", b"just text");

        assert!(id.is_none());
        assert!(session.is_empty());
        assert_eq!(session.errors().len(), 1);
        assert!(session.errors()[0].contains("Unsupported file type: .txt"));
    }

    #[test]
    fn test_multiple_uploads_continue_past_failures() {
        let mut session = Session::new();
        upload_bytes(&mut session, "a.csv", b"x,y\n1,2\n");
        upload_bytes(&mut session, "b.pdf", b"%PDF");
        upload_bytes(&mut session, "a.csv", b"x,y\n3,4\n");

        let names: Vec<&str> = session.datasets().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a.csv", "a.csv"]);
        assert_ne!(session.datasets()[0].id, session.datasets()[1].id);
        assert_eq!(session.errors().len(), 1);

        session.clear_errors();
        assert!(session.errors().is_empty());
    }

    #[test]
    fn test_remove_discards_dataset() {
        let mut session = Session::new();
        let id = upload_bytes(&mut session, "a.csv", b"x\n1\n").unwrap();
        assert!(session.get_mut(id).is_some());

        session.remove(id);
        assert!(session.is_empty());
        assert!(session.get_mut(id).is_none());
    }
}
