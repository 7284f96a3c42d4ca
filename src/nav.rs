//! Navigation state machine.
//!
//! All view state lives in one [`NavigationState`] owned by the event loop.
//! [`update`] applies an [`Event`] to it and reports an [`Effect`]: nothing,
//! a fetch to run, or quitting. Fetch results come back through the same
//! function as [`Event::FeedLoaded`] / [`Event::ContentLoaded`], tagged with
//! the request id that produced them, so the machine can be driven without a
//! terminal and without caring whether fetches block or run on a thread.

use crate::tabnews::{Comment, ContentDetail, FeedItem, SourceError, Strategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Feed,
    Content,
    Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    MoveUp,
    MoveDown,
    PageBack,
    PageForward,
    Select,
    ShowComments,
    Back,
    Quit,
    FeedLoaded {
        request_id: u64,
        page: u32,
        result: Result<Vec<FeedItem>, SourceError>,
    },
    ContentLoaded {
        request_id: u64,
        result: Result<(ContentDetail, Vec<Comment>), SourceError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    Feed {
        request_id: u64,
        page: u32,
        per_page: u32,
        strategy: Strategy,
        owner: Option<String>,
    },
    Content {
        request_id: u64,
        owner: String,
        slug: String,
    },
}

impl FetchRequest {
    pub fn request_id(&self) -> u64 {
        match self {
            FetchRequest::Feed { request_id, .. } | FetchRequest::Content { request_id, .. } => {
                *request_id
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    Fetch(FetchRequest),
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pending {
    Feed { request_id: u64, page: u32 },
    Content { request_id: u64 },
}

impl Pending {
    fn request_id(&self) -> u64 {
        match self {
            Pending::Feed { request_id, .. } | Pending::Content { request_id } => *request_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavigationState {
    pub view_mode: ViewMode,
    pub page: u32,
    pub per_page: u32,
    pub strategy: Strategy,
    /// Restricts the feed to one author's contents when set.
    pub owner: Option<String>,
    pub selected_index: usize,
    pub scroll_offset: u16,
    pub items: Vec<FeedItem>,
    pub current_detail: Option<ContentDetail>,
    pub comments: Vec<Comment>,
    pub error: Option<String>,
    pub pending: Option<Pending>,
    next_request_id: u64,
}

impl NavigationState {
    pub fn new(per_page: u32, strategy: Strategy, owner: Option<String>) -> Self {
        Self {
            view_mode: ViewMode::Feed,
            page: 1,
            per_page: per_page.max(1),
            strategy,
            owner,
            selected_index: 0,
            scroll_offset: 0,
            items: Vec::new(),
            current_detail: None,
            comments: Vec::new(),
            error: None,
            pending: None,
            next_request_id: 1,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);
        id
    }

    /// Page the next feed request should be relative to: the page still in
    /// flight, otherwise the page on screen.
    fn base_page(&self) -> u32 {
        match self.pending {
            Some(Pending::Feed { page, .. }) => page,
            _ => self.page,
        }
    }

    fn request_feed(&mut self, page: u32) -> Effect {
        let request_id = self.next_id();
        self.pending = Some(Pending::Feed { request_id, page });
        Effect::Fetch(FetchRequest::Feed {
            request_id,
            page,
            per_page: self.per_page,
            strategy: self.strategy,
            owner: self.owner.clone(),
        })
    }

    fn request_content(&mut self) -> Effect {
        let Some(item) = self.items.get(self.selected_index) else {
            return Effect::None;
        };
        let owner = item.owner_username.clone();
        let slug = item.slug.clone();
        let request_id = self.next_id();
        self.pending = Some(Pending::Content { request_id });
        Effect::Fetch(FetchRequest::Content {
            request_id,
            owner,
            slug,
        })
    }

    fn opening_content(&self) -> bool {
        matches!(self.pending, Some(Pending::Content { .. }))
    }

    fn clamp_selection(&mut self) {
        self.selected_index = self
            .selected_index
            .min(self.items.len().saturating_sub(1));
    }

    fn return_to_feed(&mut self) {
        self.view_mode = ViewMode::Feed;
        self.current_detail = None;
        self.comments.clear();
        self.scroll_offset = 0;
    }

    fn accepts(&self, request_id: u64) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| pending.request_id() == request_id)
    }
}

/// Issues the fetch for the first feed page shown at startup.
pub fn initial_request(state: &mut NavigationState) -> Effect {
    let page = state.page;
    state.request_feed(page)
}

pub fn update(state: &mut NavigationState, event: Event) -> Effect {
    use ViewMode::{Comments, Content, Feed};

    if event.is_navigation() {
        state.error = None;
    }

    match (state.view_mode, event) {
        (_, Event::Quit) => Effect::Quit,

        // The marker stays on the item being opened.
        (Feed, Event::MoveUp | Event::MoveDown) if state.opening_content() => Effect::None,
        (Feed, Event::MoveUp) => {
            state.selected_index = state.selected_index.saturating_sub(1);
            Effect::None
        }
        (Feed, Event::MoveDown) => {
            state.selected_index = state.selected_index.saturating_add(1);
            state.clamp_selection();
            Effect::None
        }
        (Feed, Event::PageBack) => {
            let base = state.base_page();
            if base > 1 {
                state.request_feed(base - 1)
            } else {
                Effect::None
            }
        }
        (Feed, Event::PageForward) => {
            let next = state.base_page().saturating_add(1);
            state.request_feed(next)
        }
        // Items on screen belong to a page that is about to be replaced.
        (Feed, Event::Select) if matches!(state.pending, Some(Pending::Feed { .. })) => {
            Effect::None
        }
        (Feed, Event::Select) => state.request_content(),
        (Feed, Event::Back) => {
            if matches!(state.pending, Some(Pending::Content { .. })) {
                state.pending = None;
            }
            Effect::None
        }

        (Content | Comments, Event::MoveUp) => {
            state.scroll_offset = state.scroll_offset.saturating_sub(1);
            Effect::None
        }
        (Content | Comments, Event::MoveDown) => {
            state.scroll_offset = state.scroll_offset.saturating_add(1);
            Effect::None
        }
        (Content, Event::ShowComments) => {
            state.view_mode = Comments;
            state.scroll_offset = 0;
            Effect::None
        }
        (Content | Comments, Event::Back) => {
            state.return_to_feed();
            Effect::None
        }

        (
            _,
            Event::FeedLoaded {
                request_id,
                page,
                result,
            },
        ) => {
            if !state.accepts(request_id) {
                return Effect::None;
            }
            state.pending = None;
            match result {
                Ok(items) => {
                    state.page = page.max(1);
                    state.items = items;
                    state.selected_index = 0;
                    state.error = None;
                }
                Err(err) => state.error = Some(format!("Failed to load page {page}: {err}")),
            }
            Effect::None
        }
        (view, Event::ContentLoaded { request_id, result }) => {
            if !state.accepts(request_id) {
                return Effect::None;
            }
            state.pending = None;
            match result {
                // A content fetch only lands while the feed is on screen.
                Ok((detail, comments)) if view == Feed => {
                    state.view_mode = Content;
                    state.scroll_offset = 0;
                    state.current_detail = Some(detail);
                    state.comments = comments;
                    state.error = None;
                }
                Ok(_) => {}
                Err(err) => state.error = Some(format!("Failed to open content: {err}")),
            }
            Effect::None
        }

        // PageBack/PageForward/Select outside the feed, ShowComments outside
        // content.
        _ => Effect::None,
    }
}

impl Event {
    fn is_navigation(&self) -> bool {
        !matches!(
            self,
            Event::FeedLoaded { .. } | Event::ContentLoaded { .. } | Event::Quit
        )
    }
}
