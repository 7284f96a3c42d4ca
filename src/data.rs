use std::sync::Arc;

use log::{debug, warn};

use crate::nav::{Event, FetchRequest};
use crate::tabnews::{self, Comment, ContentDetail, FeedItem, SourceError, Strategy};

pub trait ContentSource: Send + Sync {
    fn list_contents(
        &self,
        page: u32,
        per_page: u32,
        strategy: Strategy,
    ) -> Result<Vec<FeedItem>, SourceError>;

    fn list_user_contents(
        &self,
        owner: &str,
        page: u32,
        per_page: u32,
        strategy: Strategy,
    ) -> Result<Vec<FeedItem>, SourceError>;

    fn get_content(&self, owner: &str, slug: &str) -> Result<ContentDetail, SourceError>;

    fn get_comments(&self, owner: &str, slug: &str) -> Result<Vec<Comment>, SourceError>;
}

pub struct TabNewsSource {
    client: Arc<tabnews::Client>,
}

impl TabNewsSource {
    pub fn new(client: Arc<tabnews::Client>) -> Self {
        Self { client }
    }
}

impl ContentSource for TabNewsSource {
    fn list_contents(
        &self,
        page: u32,
        per_page: u32,
        strategy: Strategy,
    ) -> Result<Vec<FeedItem>, SourceError> {
        self.client.list_contents(page, per_page, strategy)
    }

    fn list_user_contents(
        &self,
        owner: &str,
        page: u32,
        per_page: u32,
        strategy: Strategy,
    ) -> Result<Vec<FeedItem>, SourceError> {
        self.client
            .list_user_contents(owner, page, per_page, strategy)
    }

    fn get_content(&self, owner: &str, slug: &str) -> Result<ContentDetail, SourceError> {
        self.client.get_content(owner, slug)
    }

    fn get_comments(&self, owner: &str, slug: &str) -> Result<Vec<Comment>, SourceError> {
        self.client.get_comments(owner, slug)
    }
}

/// Source used when the HTTP client could not be built; every call fails so
/// the feed degrades to an empty list with a visible error.
pub struct UnavailableSource {
    reason: String,
}

impl UnavailableSource {
    pub fn new<S: Into<String>>(reason: S) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn fail<T>(&self) -> Result<T, SourceError> {
        Err(SourceError::Network(self.reason.clone()))
    }
}

impl ContentSource for UnavailableSource {
    fn list_contents(&self, _: u32, _: u32, _: Strategy) -> Result<Vec<FeedItem>, SourceError> {
        self.fail()
    }

    fn list_user_contents(
        &self,
        _: &str,
        _: u32,
        _: u32,
        _: Strategy,
    ) -> Result<Vec<FeedItem>, SourceError> {
        self.fail()
    }

    fn get_content(&self, _: &str, _: &str) -> Result<ContentDetail, SourceError> {
        self.fail()
    }

    fn get_comments(&self, _: &str, _: &str) -> Result<Vec<Comment>, SourceError> {
        self.fail()
    }
}

/// Runs one fetch request to completion and returns the event that reports
/// its outcome back to the state machine.
pub fn execute(source: &dyn ContentSource, request: FetchRequest) -> Event {
    match request {
        FetchRequest::Feed {
            request_id,
            page,
            per_page,
            strategy,
            owner,
        } => {
            debug!("fetch #{request_id}: feed page {page} ({strategy})");
            let result = match owner.as_deref() {
                Some(owner) => source.list_user_contents(owner, page, per_page, strategy),
                None => source.list_contents(page, per_page, strategy),
            };
            if let Err(err) = &result {
                warn!("fetch #{request_id}: feed page {page} failed: {err}");
            }
            Event::FeedLoaded {
                request_id,
                page,
                result,
            }
        }
        FetchRequest::Content {
            request_id,
            owner,
            slug,
        } => {
            debug!("fetch #{request_id}: content {owner}/{slug}");
            let result = source.get_content(&owner, &slug).and_then(|detail| {
                source
                    .get_comments(&owner, &slug)
                    .map(|comments| (detail, comments))
            });
            if let Err(err) = &result {
                warn!("fetch #{request_id}: content {owner}/{slug} failed: {err}");
            }
            Event::ContentLoaded { request_id, result }
        }
    }
}
