//! Last search and sort per table, kept between runs in `views.json`.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use datagres_ui::ViewState;

use crate::errors::DatagresError;

const VIEWS_FILE: &str = "views.json";

#[derive(Debug, Default)]
pub struct ViewStore {
    path: Option<PathBuf>,
    views: BTreeMap<String, ViewState>,
}

fn view_key(connection: &str, table: &str) -> String {
    format!("{connection}/{table}")
}

impl ViewStore {
    /// Read `<dir>/views.json`. A missing or unreadable file starts empty.
    #[must_use]
    pub fn open(dir: &Path) -> Self {
        let path = dir.join(VIEWS_FILE);
        let views = fs::read_to_string(&path)
            .ok()
            .and_then(|contents| match serde_json::from_str(&contents) {
                Ok(views) => Some(views),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable saved views");
                    None
                }
            })
            .unwrap_or_default();

        Self {
            path: Some(path),
            views,
        }
    }

    #[must_use]
    pub fn get(&self, connection: &str, table: &str) -> ViewState {
        self.views
            .get(&view_key(connection, table))
            .cloned()
            .unwrap_or_default()
    }

    pub fn set(&mut self, connection: &str, table: &str, view: ViewState) {
        let key = view_key(connection, table);
        if view == ViewState::default() {
            self.views.remove(&key);
        } else {
            self.views.insert(key, view);
        }
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<(), DatagresError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.views)
            .map_err(|e| DatagresError::Config(e.to_string()))?;
        fs::write(path, contents)?;
        Ok(())
    }
}
