use std::cell::{Cell, RefCell};

use shotbook_domain::{
    Comment, CommentId, CommitOutcome, DomainError, GalleryFeed, GalleryPermissions,
    GuestIdentity, LoadMode, NewComment, PhotoId,
};
use tracing::{debug, info, warn};

use crate::{
    AddCommentCommand, AnalyticsSink, ApplicationError, Clock, CommentsApi, DeleteCommentCommand,
    DownloadApi, DuplicateChecker, DuplicateResolver, FavoritesApi, GalleryApi, GuestPrompt,
    LoadGalleryCommand, StudioApi, ToggleFavoriteCommand, UploadManager, UploadScanner,
};

pub struct ServicePorts {
    pub galleries: Box<dyn GalleryApi>,
    pub favorites: Box<dyn FavoritesApi>,
    pub comments: Box<dyn CommentsApi>,
    pub duplicates: Box<dyn DuplicateChecker>,
    pub uploads: Box<dyn UploadManager>,
    pub downloads: Box<dyn DownloadApi>,
    pub studio: Box<dyn StudioApi>,
    pub analytics: Box<dyn AnalyticsSink>,
    pub scanner: Box<dyn UploadScanner>,
    pub resolver: Box<dyn DuplicateResolver>,
    pub guest_prompt: Box<dyn GuestPrompt>,
    pub clock: Box<dyn Clock>,
}

pub struct ApplicationService {
    pub(crate) ports: ServicePorts,
    page_size: usize,
    guest: RefCell<GuestIdentity>,
    local_comments: Cell<u64>,
}

impl ApplicationService {
    pub fn new(ports: ServicePorts, page_size: usize, guest: GuestIdentity) -> Self {
        Self {
            ports,
            page_size: page_size.max(1),
            guest: RefCell::new(guest),
            local_comments: Cell::new(0),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn guest(&self) -> GuestIdentity {
        self.guest.borrow().clone()
    }

    pub fn now_millis(&self) -> u64 {
        self.ports.clock.now_millis()
    }

    /// Runs one feed load. `Ok(None)` means the load was skipped because
    /// another one is running or there is nothing more to fetch.
    ///
    /// A failed first page is both recorded on the feed and returned; a failed
    /// load-more is only logged so the photos already shown stay intact.
    pub fn load_gallery(
        &self,
        feed: &mut GalleryFeed,
        command: LoadGalleryCommand,
    ) -> Result<Option<CommitOutcome>, ApplicationError> {
        let Some(ticket) = feed.begin_load(command.load_more) else {
            debug!(gallery_id = %feed.gallery_id(), "load skipped");
            return Ok(None);
        };

        let fetched =
            self.ports
                .galleries
                .fetch_page(feed.gallery_id(), self.page_size, ticket.cursor());
        let mode = ticket.mode();

        match fetched {
            Ok(page) => {
                let outcome = feed.commit(ticket, Ok(page));
                debug!(gallery_id = %feed.gallery_id(), ?outcome, "page committed");
                Ok(Some(outcome))
            }
            Err(error) => match feed.commit(ticket, Err(error.to_string())) {
                CommitOutcome::Failed {
                    mode: LoadMode::Replace,
                    ..
                } => Err(error),
                outcome => {
                    if mode == LoadMode::Append {
                        warn!(gallery_id = %feed.gallery_id(), %error, "load more failed");
                    }
                    Ok(Some(outcome))
                }
            },
        }
    }

    /// Replaces the feed with a fresh first page, superseding any load in flight.
    pub fn reload_gallery(
        &self,
        feed: &mut GalleryFeed,
    ) -> Result<Option<CommitOutcome>, ApplicationError> {
        self.load_gallery(feed, LoadGalleryCommand { load_more: false })
    }

    /// Loads every remaining page and returns the number of photos in the feed.
    pub fn load_all(&self, feed: &mut GalleryFeed) -> Result<usize, ApplicationError> {
        if feed.pages_loaded() == 0 {
            self.reload_gallery(feed)?;
        }
        while feed.pagination().has_more {
            match self.load_gallery(feed, LoadGalleryCommand { load_more: true })? {
                Some(CommitOutcome::Appended { added }) if added > 0 => {}
                Some(CommitOutcome::Appended { .. }) => {
                    warn!(gallery_id = %feed.gallery_id(), "page added no new photos; stopping");
                    break;
                }
                Some(CommitOutcome::Failed { error, .. }) => {
                    return Err(ApplicationError::Transport(error));
                }
                _ => break,
            }
        }
        info!(
            gallery_id = %feed.gallery_id(),
            photos = feed.photos().len(),
            pages = feed.pages_loaded(),
            "gallery loaded"
        );
        Ok(feed.photos().len())
    }

    /// Flips the favorite flag immediately and rolls it back if the backend
    /// refuses. Returns the new flag.
    pub fn toggle_favorite(
        &self,
        feed: &mut GalleryFeed,
        command: ToggleFavoriteCommand,
    ) -> Result<bool, ApplicationError> {
        ensure_allowed(feed, "favorites", |permissions| permissions.allow_favorites)?;
        let photo_id = command.photo_id;
        let photo = feed
            .photo_mut(&photo_id)
            .ok_or_else(|| not_in_feed(&photo_id))?;
        let snapshot = photo.toggle_favorite();
        let favorite = photo.is_favorite;

        let result = self.with_guest_retry("favorite", |guest| {
            self.ports.favorites.set_favorite(&photo_id, favorite, guest)
        });

        if let Err(error) = result {
            if let Some(photo) = feed.photo_mut(&photo_id) {
                photo.restore_favorite(snapshot);
            }
            warn!(%photo_id, %error, "favorite change rolled back");
            return Err(error);
        }
        debug!(%photo_id, favorite, "favorite saved");
        Ok(favorite)
    }

    /// Shows the comment right away under a local id, then swaps in the
    /// server's copy or removes it again on failure.
    pub fn add_comment(
        &self,
        feed: &mut GalleryFeed,
        command: AddCommentCommand,
    ) -> Result<Comment, ApplicationError> {
        ensure_allowed(feed, "comments", |permissions| permissions.allow_comments)?;
        let new_comment = NewComment {
            photo_id: command.photo_id,
            text: command.text.trim().to_string(),
            annotation: command.annotation,
            video_timestamp_secs: command.video_timestamp_secs,
        };
        new_comment.validate()?;

        let local_id = self.next_local_comment_id()?;
        let author = self.guest.borrow().name.clone();
        let photo = feed
            .photo_mut(&new_comment.photo_id)
            .ok_or_else(|| not_in_feed(&new_comment.photo_id))?;
        photo.push_comment(Comment {
            id: local_id.clone(),
            photo_id: new_comment.photo_id.clone(),
            text: new_comment.text.clone(),
            author,
            created_at: None,
            annotation: new_comment.annotation.clone(),
            video_timestamp_secs: new_comment.video_timestamp_secs,
        });

        let result = self.with_guest_retry("comment", |guest| {
            self.ports.comments.create_comment(&new_comment, guest)
        });

        let photo = feed.photo_mut(&new_comment.photo_id);
        match result {
            Ok(saved) => {
                if let Some(photo) = photo {
                    photo.replace_comment(&local_id, saved.clone());
                }
                Ok(saved)
            }
            Err(error) => {
                if let Some(photo) = photo {
                    photo.remove_comment(&local_id);
                }
                warn!(photo_id = %new_comment.photo_id, %error, "comment rolled back");
                Err(error)
            }
        }
    }

    pub fn delete_comment(
        &self,
        feed: &mut GalleryFeed,
        command: DeleteCommentCommand,
    ) -> Result<(), ApplicationError> {
        let photo = feed
            .photo_mut(&command.photo_id)
            .ok_or_else(|| not_in_feed(&command.photo_id))?;
        let position = photo
            .comments
            .iter()
            .position(|comment| comment.id == command.comment_id);
        let (Some(position), Some(removed)) = (position, photo.remove_comment(&command.comment_id))
        else {
            return Err(ApplicationError::NotFound(format!(
                "comment {} on photo {}",
                command.comment_id, command.photo_id
            )));
        };

        if let Err(error) = self.ports.comments.delete_comment(&command.comment_id) {
            if let Some(photo) = feed.photo_mut(&command.photo_id) {
                photo.insert_comment(position, removed);
            }
            warn!(comment_id = %command.comment_id, %error, "comment delete rolled back");
            return Err(error);
        }
        Ok(())
    }

    /// Replaces a photo's comment list with the server's.
    pub fn refresh_comments(
        &self,
        feed: &mut GalleryFeed,
        photo_id: &PhotoId,
    ) -> Result<usize, ApplicationError> {
        let comments = self.ports.comments.list_comments(photo_id)?;
        let photo = feed.photo_mut(photo_id).ok_or_else(|| not_in_feed(photo_id))?;
        photo.set_comments(comments);
        Ok(photo.comments.len())
    }

    /// Runs `call` with the current guest identity. On an authentication
    /// failure the user is asked for a new identity and the call is retried
    /// exactly once.
    pub(crate) fn with_guest_retry<T>(
        &self,
        action: &'static str,
        call: impl Fn(&GuestIdentity) -> Result<T, ApplicationError>,
    ) -> Result<T, ApplicationError> {
        let guest = self.guest();
        match call(&guest) {
            Err(error) if error.is_auth_failure() => {
                warn!(action, %error, "request rejected; asking for guest identity");
                let Some(fresh) = self.ports.guest_prompt.prompt_guest(&guest)? else {
                    return Err(error);
                };
                *self.guest.borrow_mut() = fresh.clone();
                call(&fresh)
            }
            other => other,
        }
    }

    fn next_local_comment_id(&self) -> Result<CommentId, ApplicationError> {
        let next = self.local_comments.get() + 1;
        self.local_comments.set(next);
        Ok(CommentId::new(format!("local-{next}"))?)
    }
}

pub(crate) fn not_in_feed(photo_id: &PhotoId) -> ApplicationError {
    ApplicationError::Domain(DomainError::PhotoNotInFeed(photo_id.to_string()))
}

pub(crate) fn ensure_allowed(
    feed: &GalleryFeed,
    what: &str,
    allowed: impl Fn(&GalleryPermissions) -> bool,
) -> Result<(), ApplicationError> {
    match feed.gallery() {
        Some(gallery) if !allowed(&gallery.permissions) => Err(ApplicationError::InvalidInput(
            format!("{what} are disabled for gallery {}", gallery.id),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use shotbook_domain::{GalleryPermissions, GuestIdentity};

    use super::*;
    use crate::test_support::{auth_error, gallery, page, photo_id, service, FakeBackend};

    fn loaded_feed(service: &ApplicationService, backend: &FakeBackend) -> GalleryFeed {
        backend.push_page(page(&["a", "b"], Some("k2")));
        let mut feed = GalleryFeed::new(crate::test_support::gallery_id());
        service
            .reload_gallery(&mut feed)
            .expect("first page should load");
        feed
    }

    #[test]
    fn load_more_passes_cursor_and_appends() {
        let backend = FakeBackend::shared();
        let service = service(&backend);
        let mut feed = loaded_feed(&service, &backend);

        backend.push_page(page(&["b", "c"], None));
        let outcome = service
            .load_gallery(&mut feed, LoadGalleryCommand { load_more: true })
            .expect("load more");

        assert_eq!(outcome, Some(CommitOutcome::Appended { added: 1 }));
        assert_eq!(
            *backend.page_cursors.borrow(),
            vec![None, Some("k2".to_string())]
        );
        assert_eq!(feed.photos().len(), 3);
    }

    #[test]
    fn load_more_without_more_pages_is_a_no_op() {
        let backend = FakeBackend::shared();
        let service = service(&backend);
        backend.push_page(page(&["a"], None));
        let mut feed = GalleryFeed::new(crate::test_support::gallery_id());
        service.reload_gallery(&mut feed).expect("load");

        let outcome = service
            .load_gallery(&mut feed, LoadGalleryCommand { load_more: true })
            .expect("no-op");
        assert_eq!(outcome, None);
        assert_eq!(backend.page_cursors.borrow().len(), 1);
    }

    #[test]
    fn first_page_failure_sets_page_error() {
        let backend = FakeBackend::shared();
        let service = service(&backend);
        let mut feed = GalleryFeed::new(crate::test_support::gallery_id());

        let result = service.reload_gallery(&mut feed);
        assert!(matches!(result, Err(ApplicationError::Transport(_))));
        assert!(feed.error().is_some());
    }

    #[test]
    fn load_more_failure_keeps_existing_photos() {
        let backend = FakeBackend::shared();
        let service = service(&backend);
        let mut feed = loaded_feed(&service, &backend);

        let outcome = service
            .load_gallery(&mut feed, LoadGalleryCommand { load_more: true })
            .expect("failure is logged, not returned");
        assert!(matches!(outcome, Some(CommitOutcome::Failed { .. })));
        assert_eq!(feed.photos().len(), 2);
        assert!(feed.error().is_none());
    }

    #[test]
    fn load_all_follows_every_page() {
        let backend = FakeBackend::shared();
        let service = service(&backend);
        backend.push_page(page(&["a", "b"], Some("k2")));
        backend.push_page(page(&["c", "d"], Some("k3")));
        backend.push_page(page(&["e"], None));

        let mut feed = GalleryFeed::new(crate::test_support::gallery_id());
        assert_eq!(service.load_all(&mut feed).expect("load all"), 5);
        assert_eq!(feed.pages_loaded(), 3);
    }

    #[test]
    fn favorite_is_optimistic_and_saved() {
        let backend = FakeBackend::shared();
        let service = service(&backend);
        let mut feed = loaded_feed(&service, &backend);

        let favorite = service
            .toggle_favorite(
                &mut feed,
                ToggleFavoriteCommand {
                    photo_id: photo_id("a"),
                },
            )
            .expect("favorite");

        assert!(favorite);
        let photo = feed.photo(&photo_id("a")).expect("photo");
        assert_eq!((photo.is_favorite, photo.favorites_count), (true, 4));
        assert!(backend.favorite_calls.borrow()[0].1);
    }

    #[test]
    fn favorite_failure_rolls_back() {
        let backend = FakeBackend::shared();
        let service = service(&backend);
        let mut feed = loaded_feed(&service, &backend);
        backend
            .favorite_results
            .borrow_mut()
            .push_back(Err(ApplicationError::from_status(500, "boom")));

        let result = service.toggle_favorite(
            &mut feed,
            ToggleFavoriteCommand {
                photo_id: photo_id("a"),
            },
        );

        assert!(matches!(result, Err(ApplicationError::Http { status: 500, .. })));
        let photo = feed.photo(&photo_id("a")).expect("photo");
        assert_eq!((photo.is_favorite, photo.favorites_count), (false, 3));
        assert_eq!(backend.prompts.get(), 0);
    }

    #[test]
    fn auth_failure_prompts_for_guest_and_retries_once() {
        let backend = FakeBackend::shared();
        let service = service(&backend);
        let mut feed = loaded_feed(&service, &backend);
        backend.favorite_results.borrow_mut().push_back(Err(auth_error()));
        *backend.prompt_reply.borrow_mut() = Some(GuestIdentity {
            share_token: Some("share".to_string()),
            email: Some("sam@example.com".to_string()),
            name: Some("Sam".to_string()),
        });

        service
            .toggle_favorite(
                &mut feed,
                ToggleFavoriteCommand {
                    photo_id: photo_id("a"),
                },
            )
            .expect("retry succeeds");

        let calls = backend.favorite_calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].2.email.as_deref(), Some("sam@example.com"));
        assert_eq!(service.guest().name.as_deref(), Some("Sam"));
        assert_eq!(backend.prompts.get(), 1);
    }

    #[test]
    fn second_auth_failure_is_not_retried_again() {
        let backend = FakeBackend::shared();
        let service = service(&backend);
        let mut feed = loaded_feed(&service, &backend);
        backend.favorite_results.borrow_mut().push_back(Err(auth_error()));
        backend.favorite_results.borrow_mut().push_back(Err(auth_error()));
        *backend.prompt_reply.borrow_mut() = Some(GuestIdentity::default());

        let result = service.toggle_favorite(
            &mut feed,
            ToggleFavoriteCommand {
                photo_id: photo_id("b"),
            },
        );

        assert!(result.is_err_and(|error| error.is_auth_failure()));
        assert_eq!(backend.favorite_calls.borrow().len(), 2);
        assert!(!feed.photo(&photo_id("b")).expect("photo").is_favorite);
    }

    #[test]
    fn declined_prompt_rolls_back() {
        let backend = FakeBackend::shared();
        let service = service(&backend);
        let mut feed = loaded_feed(&service, &backend);
        backend.favorite_results.borrow_mut().push_back(Err(auth_error()));

        let result = service.toggle_favorite(
            &mut feed,
            ToggleFavoriteCommand {
                photo_id: photo_id("a"),
            },
        );

        assert!(result.is_err());
        assert_eq!(backend.favorite_calls.borrow().len(), 1);
        assert_eq!(feed.photo(&photo_id("a")).expect("photo").favorites_count, 3);
    }

    #[test]
    fn favorites_respect_gallery_permissions() {
        let backend = FakeBackend::shared();
        let service = service(&backend);
        let mut locked = page(&["a"], None);
        locked.gallery = Some(gallery(GalleryPermissions {
            allow_favorites: false,
            ..GalleryPermissions::default()
        }));
        backend.push_page(locked);
        let mut feed = GalleryFeed::new(crate::test_support::gallery_id());
        service.reload_gallery(&mut feed).expect("load");

        let result = service.toggle_favorite(
            &mut feed,
            ToggleFavoriteCommand {
                photo_id: photo_id("a"),
            },
        );
        assert!(matches!(result, Err(ApplicationError::InvalidInput(_))));
        assert!(backend.favorite_calls.borrow().is_empty());
    }

    #[test]
    fn unknown_photo_is_reported() {
        let backend = FakeBackend::shared();
        let service = service(&backend);
        let mut feed = loaded_feed(&service, &backend);
        let result = service.toggle_favorite(
            &mut feed,
            ToggleFavoriteCommand {
                photo_id: photo_id("zzz"),
            },
        );
        assert!(matches!(
            result,
            Err(ApplicationError::Domain(DomainError::PhotoNotInFeed(_)))
        ));
    }

    #[test]
    fn comment_replaces_local_copy_with_server_copy() {
        let backend = FakeBackend::shared();
        let service = service(&backend);
        let mut feed = loaded_feed(&service, &backend);

        let saved = service
            .add_comment(
                &mut feed,
                AddCommentCommand {
                    photo_id: photo_id("a"),
                    text: "  Love this one  ".to_string(),
                    annotation: None,
                    video_timestamp_secs: None,
                },
            )
            .expect("comment");

        let photo = feed.photo(&photo_id("a")).expect("photo");
        assert_eq!(photo.comments_count, 1);
        assert_eq!(photo.comments[0].id, saved.id);
        assert_eq!(photo.comments[0].text, "Love this one");
    }

    #[test]
    fn failed_comment_is_removed_again() {
        let backend = FakeBackend::shared();
        let service = service(&backend);
        let mut feed = loaded_feed(&service, &backend);
        backend
            .comment_results
            .borrow_mut()
            .push_back(Err(ApplicationError::from_status(500, "down")));

        let result = service.add_comment(
            &mut feed,
            AddCommentCommand {
                photo_id: photo_id("a"),
                text: "Nice".to_string(),
                annotation: None,
                video_timestamp_secs: None,
            },
        );

        assert!(result.is_err());
        let photo = feed.photo(&photo_id("a")).expect("photo");
        assert!(photo.comments.is_empty());
        assert_eq!(photo.comments_count, 0);
    }

    #[test]
    fn empty_comment_is_rejected_before_any_request() {
        let backend = FakeBackend::shared();
        let service = service(&backend);
        let mut feed = loaded_feed(&service, &backend);

        let result = service.add_comment(
            &mut feed,
            AddCommentCommand {
                photo_id: photo_id("a"),
                text: "   ".to_string(),
                annotation: None,
                video_timestamp_secs: None,
            },
        );
        assert!(matches!(result, Err(ApplicationError::Domain(_))));
        assert!(backend.stored_comments.borrow().is_empty());
    }

    #[test]
    fn failed_delete_restores_comment_in_place() {
        let backend = FakeBackend::shared();
        let service = service(&backend);
        let mut feed = loaded_feed(&service, &backend);
        for text in ["first", "second", "third"] {
            service
                .add_comment(
                    &mut feed,
                    AddCommentCommand {
                        photo_id: photo_id("a"),
                        text: text.to_string(),
                        annotation: None,
                        video_timestamp_secs: None,
                    },
                )
                .expect("comment");
        }
        backend.fail_deletes.set(true);

        let middle = feed.photo(&photo_id("a")).expect("photo").comments[1].id.clone();
        let result = service.delete_comment(
            &mut feed,
            DeleteCommentCommand {
                photo_id: photo_id("a"),
                comment_id: middle.clone(),
            },
        );

        assert!(result.is_err());
        let photo = feed.photo(&photo_id("a")).expect("photo");
        assert_eq!(photo.comments[1].id, middle);
        assert_eq!(photo.comments_count, 3);
    }

    #[test]
    fn refresh_comments_uses_server_list() {
        let backend = FakeBackend::shared();
        let service = service(&backend);
        let mut feed = loaded_feed(&service, &backend);
        service
            .add_comment(
                &mut feed,
                AddCommentCommand {
                    photo_id: photo_id("b"),
                    text: "hello".to_string(),
                    annotation: None,
                    video_timestamp_secs: None,
                },
            )
            .expect("comment");

        let count = service
            .refresh_comments(&mut feed, &photo_id("a"))
            .expect("refresh");
        assert_eq!(count, 1);
        assert_eq!(feed.photo(&photo_id("a")).expect("photo").comments_count, 1);
    }
}
