//! In-memory discussion thread for the group currently in view.
//!
//! The backend is authoritative: posts only enter the store as server
//! records, never as provisional local copies. Comment responses come in two
//! shapes (see [`CommentCreated`]) and are merged by post id, so responses
//! arriving out of order cannot corrupt the thread.

use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::api::{CommentCreated, NewPost, Post};
use crate::data::DiscussionService;
use crate::error::{Error, Result};
use crate::session::Session;

pub const FORUM_ACCESS_NOTICE: &str = "You must be a group member to view this forum";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// The server sent the whole post; it replaced the local copy.
    Replaced,
    /// The server sent only the new comment; it was appended.
    Appended,
    /// No matching post (or a stale group), nothing changed.
    Dropped,
}

pub struct ThreadStore {
    service: Rc<dyn DiscussionService>,
    session: Session,
    group_id: i64,
    posts: Vec<Post>,
}

impl ThreadStore {
    pub fn new(service: Rc<dyn DiscussionService>, session: Session, group_id: i64) -> Self {
        Self {
            service,
            session,
            group_id,
            posts: Vec::new(),
        }
    }

    pub fn group_id(&self) -> i64 {
        self.group_id
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Posts newest first.
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn post(&self, post_id: i64) -> Option<&Post> {
        self.posts.iter().find(|post| post.id == post_id)
    }

    pub fn is_own(&self, post: &Post) -> bool {
        self.session.is_author(&post.author_name)
    }

    /// Switches to another group, dropping everything held for the old one.
    pub fn navigate(&mut self, group_id: i64) {
        if group_id != self.group_id {
            debug!(from = self.group_id, to = group_id, "thread store navigated");
        }
        self.group_id = group_id;
        self.posts.clear();
    }

    /// Replaces the thread with the backend's current list. Any failure
    /// leaves the store empty and is reported as a forum access error.
    pub fn load(&mut self) -> Result<&[Post]> {
        let group_id = self.group_id;
        match self.service.list_posts(group_id) {
            Ok(posts) => {
                info!(group_id, count = posts.len(), "discussion loaded");
                self.apply_posts(group_id, posts);
                Ok(self.posts.as_slice())
            }
            Err(err) => {
                warn!(group_id, error = %err, "discussion load failed");
                self.posts.clear();
                Err(Error::ForumAccess(FORUM_ACCESS_NOTICE.to_string()))
            }
        }
    }

    /// Returns `Ok(None)` without contacting the backend when `content` is blank.
    pub fn create_post(&mut self, content: &str) -> Result<Option<&Post>> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(None);
        }
        let group_id = self.group_id;
        let request = NewPost {
            content: content.to_string(),
            chapter: None,
        };
        let post = self.service.create_post(group_id, &request)?;
        info!(group_id, post_id = post.id, "post created");
        if !self.apply_created_post(group_id, post) {
            return Ok(None);
        }
        Ok(self.posts.first())
    }

    /// Returns `Ok(None)` without contacting the backend when `content` is blank.
    pub fn create_comment(&mut self, post_id: i64, content: &str) -> Result<Option<Reconciled>> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(None);
        }
        let group_id = self.group_id;
        let created = self.service.create_comment(group_id, post_id, content)?;
        Ok(Some(self.reconcile_comment(group_id, post_id, created)))
    }

    /// Installs a full post list fetched for `group_id`. Returns false when the
    /// list belongs to a group that is no longer in view.
    pub fn apply_posts(&mut self, group_id: i64, posts: Vec<Post>) -> bool {
        if group_id != self.group_id {
            debug!(group_id, current = self.group_id, "stale post list discarded");
            return false;
        }
        self.posts = posts;
        true
    }

    pub fn apply_created_post(&mut self, group_id: i64, post: Post) -> bool {
        if group_id != self.group_id {
            debug!(group_id, current = self.group_id, "stale post discarded");
            return false;
        }
        self.posts.insert(0, post);
        true
    }

    pub fn reconcile_comment(
        &mut self,
        group_id: i64,
        post_id: i64,
        created: CommentCreated,
    ) -> Reconciled {
        if group_id != self.group_id {
            debug!(group_id, current = self.group_id, "stale comment discarded");
            return Reconciled::Dropped;
        }
        let Some(target) = self.posts.iter_mut().find(|post| post.id == post_id) else {
            debug!(group_id, post_id, "comment for unknown post dropped");
            return Reconciled::Dropped;
        };
        match created {
            CommentCreated::FullPost(post) => {
                *target = post;
                Reconciled::Replaced
            }
            CommentCreated::Comment(comment) => {
                target.comments.push(comment);
                Reconciled::Appended
            }
        }
    }
}
