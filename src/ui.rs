use std::io::{self, Stdout};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use log::{debug, info};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use unicode_width::UnicodeWidthStr;

use crate::data::{self, ContentSource};
use crate::nav::{self, Effect, Event, FetchRequest, NavigationState, ViewMode};
use crate::render;

const TICK_RATE: Duration = Duration::from_millis(120);

/// Fixed key bindings.
pub fn key_to_event(code: KeyCode) -> Option<Event> {
    match code {
        KeyCode::Up => Some(Event::MoveUp),
        KeyCode::Down => Some(Event::MoveDown),
        KeyCode::Left => Some(Event::PageBack),
        KeyCode::Right => Some(Event::PageForward),
        KeyCode::Enter => Some(Event::Select),
        KeyCode::Esc => Some(Event::Back),
        KeyCode::Char('c') => Some(Event::ShowComments),
        KeyCode::Char('q') => Some(Event::Quit),
        _ => None,
    }
}

struct InFlight {
    request_id: u64,
    cancel_flag: Arc<AtomicBool>,
}

pub struct Model {
    state: NavigationState,
    source: Arc<dyn ContentSource>,
    response_tx: Sender<Event>,
    response_rx: Receiver<Event>,
    in_flight: Option<InFlight>,
    needs_redraw: bool,
}

impl Model {
    pub fn new(state: NavigationState, source: Arc<dyn ContentSource>) -> Self {
        let (response_tx, response_rx) = unbounded();
        Self {
            state,
            source,
            response_tx,
            response_rx,
            in_flight: None,
            needs_redraw: true,
        }
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    /// Requests the first feed page.
    pub fn start(&mut self) {
        let effect = nav::initial_request(&mut self.state);
        self.apply_effect(effect);
    }

    pub fn run(&mut self) -> Result<()> {
        self.start();

        let mut stdout = io::stdout();
        enable_raw_mode()?;
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            self.poll_async();

            if self.needs_redraw {
                terminal.draw(|frame| self.draw(frame))?;
                self.needs_redraw = false;
            }

            if !event::poll(TICK_RATE)? {
                continue;
            }
            match event::read()? {
                TermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                    if let Some(event) = key_to_event(key.code) {
                        if self.dispatch(event) {
                            info!("quit requested");
                            break;
                        }
                    }
                }
                TermEvent::Resize(_, _) => self.needs_redraw = true,
                _ => {}
            }
        }

        self.cancel_in_flight();
        Ok(())
    }

    /// Feeds one event through the state machine. Returns true on quit.
    pub fn dispatch(&mut self, event: Event) -> bool {
        let effect = nav::update(&mut self.state, event);
        self.needs_redraw = true;
        if self.state.pending.is_none() {
            self.cancel_in_flight();
        }
        self.apply_effect(effect)
    }

    fn apply_effect(&mut self, effect: Effect) -> bool {
        match effect {
            Effect::None => false,
            Effect::Quit => true,
            Effect::Fetch(request) => {
                self.spawn_fetch(request);
                false
            }
        }
    }

    fn spawn_fetch(&mut self, request: FetchRequest) {
        self.cancel_in_flight();
        let request_id = request.request_id();
        let cancel_flag = Arc::new(AtomicBool::new(false));
        self.in_flight = Some(InFlight {
            request_id,
            cancel_flag: cancel_flag.clone(),
        });

        let tx = self.response_tx.clone();
        let source = self.source.clone();
        thread::spawn(move || {
            if cancel_flag.load(Ordering::SeqCst) {
                return;
            }
            let event = data::execute(source.as_ref(), request);
            if cancel_flag.load(Ordering::SeqCst) {
                debug!("fetch #{request_id}: superseded, dropping result");
                return;
            }
            let _ = tx.send(event);
        });
    }

    fn cancel_in_flight(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.cancel_flag.store(true, Ordering::SeqCst);
        }
    }

    /// Applies every completed fetch waiting on the channel.
    pub fn poll_async(&mut self) {
        while let Ok(event) = self.response_rx.try_recv() {
            self.complete(event);
        }
    }

    /// Blocks until the pending fetch completes, or the timeout elapses.
    pub fn wait_for_pending(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.state.is_loading() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.response_rx.recv_timeout(remaining) {
                Ok(event) => self.complete(event),
                Err(_) => return false,
            }
        }
        true
    }

    fn complete(&mut self, event: Event) {
        let finished = match &event {
            Event::FeedLoaded { request_id, .. } | Event::ContentLoaded { request_id, .. } => {
                Some(*request_id)
            }
            _ => None,
        };
        if finished.is_some() && finished == self.in_flight.as_ref().map(|f| f.request_id) {
            self.in_flight = None;
        }
        self.dispatch(event);
    }

    fn draw(&self, frame: &mut Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(frame.size());

        let mut header = render::header_line();
        pad_line_to_width(&mut header, chunks[0].width);
        frame.render_widget(Paragraph::new(header), chunks[0]);

        let body = Paragraph::new(Text::from(render::render(&self.state)));
        // Feed rows stay one screen row each so the selection maps to a row.
        let body = match self.state.view_mode {
            ViewMode::Feed => body.scroll((feed_scroll(&self.state, chunks[1].height), 0)),
            ViewMode::Content | ViewMode::Comments => body
                .wrap(Wrap { trim: false })
                .scroll((self.state.scroll_offset, 0)),
        };
        frame.render_widget(body, chunks[1]);

        frame.render_widget(Paragraph::new(render::status_line(&self.state)), chunks[2]);
    }
}

/// Keeps the selected feed row on screen.
fn feed_scroll(state: &NavigationState, height: u16) -> u16 {
    let lead = if state.error.is_some() { 2 } else { 0 };
    let row = state.selected_index.saturating_add(lead);
    let height = usize::from(height.max(1));
    let offset = row.saturating_sub(height - 1);
    u16::try_from(offset).unwrap_or(u16::MAX)
}

fn pad_line_to_width(line: &mut Line<'static>, width: u16) {
    let current: usize = line
        .spans
        .iter()
        .map(|span| UnicodeWidthStr::width(span.content.as_ref()))
        .sum();
    let target = usize::from(width);
    if current < target {
        line.spans.push(Span::styled(
            " ".repeat(target - current),
            Style::default().add_modifier(Modifier::REVERSED),
        ));
    }
}
