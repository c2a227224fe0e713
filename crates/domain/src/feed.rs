use std::collections::HashSet;

use crate::{Gallery, GalleryId, GalleryPage, Pagination, Photo, PhotoId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    Replace,
    Append,
}

/// Issued by [`GalleryFeed::begin_load`]; a commit with a superseded ticket is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    mode: LoadMode,
    cursor: Option<String>,
}

impl LoadTicket {
    pub fn mode(&self) -> LoadMode {
        self.mode
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Replaced { count: usize },
    Appended { added: usize },
    Failed { mode: LoadMode, error: String },
    Stale,
}

/// Merged, paginated view of one gallery's photos for the current session.
#[derive(Debug, Clone)]
pub struct GalleryFeed {
    gallery_id: GalleryId,
    gallery: Option<Gallery>,
    photos: Vec<Photo>,
    pagination: Pagination,
    loading: bool,
    loading_more: bool,
    error: Option<String>,
    generation: u64,
    pages_loaded: usize,
}

impl GalleryFeed {
    pub fn new(gallery_id: GalleryId) -> Self {
        Self {
            gallery_id,
            gallery: None,
            photos: Vec::new(),
            pagination: Pagination::default(),
            loading: false,
            loading_more: false,
            error: None,
            generation: 0,
            pages_loaded: 0,
        }
    }

    pub fn gallery_id(&self) -> &GalleryId {
        &self.gallery_id
    }

    pub fn gallery(&self) -> Option<&Gallery> {
        self.gallery.as_ref()
    }

    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading || self.loading_more
    }

    pub fn pages_loaded(&self) -> usize {
        self.pages_loaded
    }

    pub fn photo(&self, photo_id: &PhotoId) -> Option<&Photo> {
        self.photos.iter().find(|photo| &photo.id == photo_id)
    }

    pub fn photo_mut(&mut self, photo_id: &PhotoId) -> Option<&mut Photo> {
        self.photos.iter_mut().find(|photo| &photo.id == photo_id)
    }

    pub fn index_of(&self, photo_id: &PhotoId) -> Option<usize> {
        self.photos.iter().position(|photo| &photo.id == photo_id)
    }

    /// Starts a load. A replacing load always starts and supersedes anything in
    /// flight; a load-more returns `None` when another load is running, when no
    /// first page exists yet, or when the backend reported no further pages.
    pub fn begin_load(&mut self, load_more: bool) -> Option<LoadTicket> {
        if load_more {
            if self.loading
                || self.loading_more
                || self.pages_loaded == 0
                || !self.pagination.has_more
            {
                return None;
            }
            self.loading_more = true;
            return Some(LoadTicket {
                generation: self.generation,
                mode: LoadMode::Append,
                cursor: self.pagination.next_key.clone(),
            });
        }

        self.generation += 1;
        self.loading = true;
        self.loading_more = false;
        self.error = None;
        Some(LoadTicket {
            generation: self.generation,
            mode: LoadMode::Replace,
            cursor: None,
        })
    }

    pub fn commit(
        &mut self,
        ticket: LoadTicket,
        result: Result<GalleryPage, String>,
    ) -> CommitOutcome {
        if ticket.generation != self.generation {
            return CommitOutcome::Stale;
        }

        match ticket.mode {
            LoadMode::Replace => {
                self.loading = false;
                match result {
                    Ok(page) => {
                        self.photos = page.photos.into_iter().map(|raw| raw.normalize()).collect();
                        self.pagination = page.pagination;
                        if page.gallery.is_some() {
                            self.gallery = page.gallery;
                        }
                        self.pages_loaded = 1;
                        CommitOutcome::Replaced {
                            count: self.photos.len(),
                        }
                    }
                    Err(error) => {
                        self.error = Some(error.clone());
                        CommitOutcome::Failed {
                            mode: LoadMode::Replace,
                            error,
                        }
                    }
                }
            }
            LoadMode::Append => {
                self.loading_more = false;
                match result {
                    Ok(page) => {
                        let known: HashSet<PhotoId> =
                            self.photos.iter().map(|photo| photo.id.clone()).collect();
                        let before = self.photos.len();
                        self.photos.extend(
                            page.photos
                                .into_iter()
                                .filter(|raw| !known.contains(&raw.id))
                                .map(|raw| raw.normalize()),
                        );
                        self.pagination = page.pagination;
                        self.pages_loaded += 1;
                        CommitOutcome::Appended {
                            added: self.photos.len() - before,
                        }
                    }
                    Err(error) => CommitOutcome::Failed {
                        mode: LoadMode::Append,
                        error,
                    },
                }
            }
        }
    }
}
