use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tabnews_tui::data::ContentSource;
use tabnews_tui::nav::{Event, NavigationState, ViewMode};
use tabnews_tui::render;
use tabnews_tui::tabnews::{Comment, ContentDetail, FeedItem, SourceError, Strategy};
use tabnews_tui::ui::Model;

const WAIT: Duration = Duration::from_secs(5);

/// In-memory source: pages by number, details by (owner, slug). Records calls.
#[derive(Default)]
struct ScriptedSource {
    pages: HashMap<u32, Vec<FeedItem>>,
    details: HashMap<(String, String), Result<ContentDetail, SourceError>>,
    comments: HashMap<(String, String), Vec<Comment>>,
    fail_pages: bool,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSource {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ContentSource for ScriptedSource {
    fn list_contents(
        &self,
        page: u32,
        per_page: u32,
        strategy: Strategy,
    ) -> Result<Vec<FeedItem>, SourceError> {
        self.record(format!("list_contents({page},{per_page},{strategy})"));
        if self.fail_pages {
            return Err(SourceError::Network("connection refused".into()));
        }
        Ok(self.pages.get(&page).cloned().unwrap_or_default())
    }

    fn list_user_contents(
        &self,
        owner: &str,
        page: u32,
        per_page: u32,
        strategy: Strategy,
    ) -> Result<Vec<FeedItem>, SourceError> {
        self.record(format!("list_user_contents({owner},{page},{per_page},{strategy})"));
        Ok(self.pages.get(&page).cloned().unwrap_or_default())
    }

    fn get_content(&self, owner: &str, slug: &str) -> Result<ContentDetail, SourceError> {
        self.record(format!("get_content({owner},{slug})"));
        self.details
            .get(&(owner.to_string(), slug.to_string()))
            .cloned()
            .unwrap_or(Err(SourceError::Http { status: 404 }))
    }

    fn get_comments(&self, owner: &str, slug: &str) -> Result<Vec<Comment>, SourceError> {
        self.record(format!("get_comments({owner},{slug})"));
        Ok(self
            .comments
            .get(&(owner.to_string(), slug.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

fn item(owner: &str, slug: &str) -> FeedItem {
    FeedItem {
        title: format!("Title {slug}"),
        slug: slug.into(),
        owner_username: owner.into(),
        tabcoins: 1,
        children_deep_count: 0,
    }
}

fn key(owner: &str, slug: &str) -> (String, String) {
    (owner.to_string(), slug.to_string())
}

fn source() -> ScriptedSource {
    let mut source = ScriptedSource::default();
    source.pages.insert(
        1,
        vec![item("ann", "a"), item("joe", "hello"), item("bob", "c")],
    );
    source.pages.insert(2, vec![item("cid", "d")]);
    source.details.insert(
        key("joe", "hello"),
        Ok(ContentDetail {
            title: "Hello".into(),
            body: "Hello **world**".into(),
            owner_username: "joe".into(),
        }),
    );
    source.comments.insert(
        key("joe", "hello"),
        vec![Comment {
            body: "Nice post".into(),
            owner_username: "ann".into(),
            children: vec![],
        }],
    );
    source
}

fn started(source: Arc<ScriptedSource>, owner: Option<&str>) -> Model {
    let state = NavigationState::new(10, Strategy::Relevant, owner.map(str::to_string));
    let mut model = Model::new(state, source);
    model.start();
    assert!(model.wait_for_pending(WAIT));
    model
}

fn press(model: &mut Model, event: Event) {
    model.dispatch(event);
    assert!(model.wait_for_pending(WAIT), "fetch did not complete");
}

fn body_text(model: &Model) -> Vec<String> {
    render::render(model.state())
        .iter()
        .map(|line| line.spans.iter().map(|span| span.content.as_ref()).collect())
        .collect()
}

#[test]
fn startup_loads_first_page() {
    let source = Arc::new(source());
    let model = started(source.clone(), None);
    assert_eq!(model.state().items.len(), 3);
    assert_eq!(model.state().page, 1);
    assert_eq!(source.calls(), vec!["list_contents(1,10,relevant)"]);
}

#[test]
fn startup_failure_degrades_to_empty_feed_with_error() {
    let mut scripted = source();
    scripted.fail_pages = true;
    let model = started(Arc::new(scripted), None);
    assert!(model.state().items.is_empty());
    assert_eq!(model.state().view_mode, ViewMode::Feed);
    let text = body_text(&model);
    assert!(text[0].contains("connection refused"));
    assert!(text.iter().any(|line| line == "No contents on page 1."));
}

#[test]
fn select_opens_content_and_comments() {
    let source = Arc::new(source());
    let mut model = started(source.clone(), None);
    press(&mut model, Event::MoveDown);
    press(&mut model, Event::Select);

    assert_eq!(model.state().view_mode, ViewMode::Content);
    assert_eq!(
        &source.calls()[1..],
        &["get_content(joe,hello)", "get_comments(joe,hello)"]
    );
    let text = body_text(&model);
    assert_eq!(text[0], "Hello");
    assert!(text.contains(&"Hello world".to_string()));

    press(&mut model, Event::ShowComments);
    assert_eq!(model.state().view_mode, ViewMode::Comments);
    assert!(body_text(&model).contains(&"│ Nice post".to_string()));

    press(&mut model, Event::Back);
    assert_eq!(model.state().view_mode, ViewMode::Feed);
    assert!(model.state().current_detail.is_none());
    assert!(model.state().comments.is_empty());

    press(&mut model, Event::ShowComments);
    assert_eq!(model.state().view_mode, ViewMode::Feed);
}

#[test]
fn missing_content_stays_on_feed_with_error() {
    let source = Arc::new(source());
    let mut model = started(source, None);
    press(&mut model, Event::Select);
    assert_eq!(model.state().view_mode, ViewMode::Feed);
    assert!(model.state().current_detail.is_none());
    let text = body_text(&model);
    assert!(text[0].starts_with("Error:"));
    assert!(text[0].contains("404"));
    assert!(text.iter().any(|line| line.starts_with("→ Title a")));
}

#[test]
fn paging_forward_and_back() {
    let source = Arc::new(source());
    let mut model = started(source.clone(), None);
    press(&mut model, Event::MoveDown);
    press(&mut model, Event::PageForward);
    assert_eq!(model.state().page, 2);
    assert_eq!(model.state().selected_index, 0);
    assert_eq!(model.state().items, vec![item("cid", "d")]);

    press(&mut model, Event::PageForward);
    assert_eq!(model.state().page, 3);
    assert!(model.state().items.is_empty());
    assert!(model.state().error.is_none());
    press(&mut model, Event::MoveDown);
    assert_eq!(model.state().selected_index, 0);

    press(&mut model, Event::PageBack);
    press(&mut model, Event::PageBack);
    assert_eq!(model.state().page, 1);
    let calls_before = source.calls().len();
    press(&mut model, Event::PageBack);
    assert_eq!(model.state().page, 1);
    assert_eq!(source.calls().len(), calls_before);
}

#[test]
fn user_scope_lists_user_contents() {
    let source = Arc::new(source());
    let model = started(source.clone(), Some("joe"));
    assert_eq!(model.state().items.len(), 3);
    assert_eq!(source.calls(), vec!["list_user_contents(joe,1,10,relevant)"]);
}

#[test]
fn quit_is_reported() {
    let source = Arc::new(source());
    let mut model = started(source, None);
    assert!(model.dispatch(Event::Quit));
}
