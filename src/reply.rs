use tracing::debug;

use crate::error::Result;
use crate::thread::{Reconciled, ThreadStore};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReplyState {
    #[default]
    Idle,
    Composing { post_id: i64, draft: String },
}

/// Tracks the single reply being composed in this session.
#[derive(Debug, Default)]
pub struct ReplyController {
    state: ReplyState,
}

impl ReplyController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ReplyState {
        &self.state
    }

    pub fn is_composing_to(&self, post_id: i64) -> bool {
        matches!(self.state, ReplyState::Composing { post_id: p, .. } if p == post_id)
    }

    /// Any draft in progress is discarded, even one for another post.
    pub fn start_reply(&mut self, post_id: i64) {
        if let ReplyState::Composing { post_id: previous, .. } = self.state {
            debug!(previous, post_id, "reply draft replaced");
        }
        self.state = ReplyState::Composing {
            post_id,
            draft: String::new(),
        };
    }

    pub fn edit(&mut self, text: impl Into<String>) {
        if let ReplyState::Composing { draft, .. } = &mut self.state {
            *draft = text.into();
        }
    }

    pub fn cancel(&mut self) {
        self.state = ReplyState::Idle;
    }

    /// Sends the draft through `store`. Back to idle only once the backend
    /// accepted it; on error or a blank draft the draft is kept.
    pub fn submit(&mut self, store: &mut ThreadStore) -> Result<Option<Reconciled>> {
        let ReplyState::Composing { post_id, draft } = &self.state else {
            return Ok(None);
        };
        match store.create_comment(*post_id, draft)? {
            Some(outcome) => {
                self.state = ReplyState::Idle;
                Ok(Some(outcome))
            }
            None => Ok(None),
        }
    }
}
