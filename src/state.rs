use std::{path::Path, sync::Arc};

use crate::{
    error::StoreError,
    store::{ScoreStore, SqliteStore},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ScoreStore>,
}

impl AppState {
    pub fn new(store: impl ScoreStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub async fn open(database_path: &Path) -> Result<Self, StoreError> {
        let store = SqliteStore::open(database_path).await?;

        Ok(Self::new(store))
    }
}
