use std::{fmt, sync::Arc};

use reelshelf_core::LibraryService;

use crate::infra::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub library: Arc<LibraryService>,
    pub config: Arc<Config>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("library_root", &self.config.library.root)
            .field("frame_source", &self.library.frame_source_name())
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(library: Arc<LibraryService>, config: Arc<Config>) -> Self {
        Self { library, config }
    }

    pub fn library(&self) -> &LibraryService {
        &self.library
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
