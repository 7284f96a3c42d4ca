use std::sync::Arc;

use anyhow::Context;
use log::{info, warn};

use crate::config::{self, Config};
use crate::data::{ContentSource, TabNewsSource, UnavailableSource};
use crate::logging;
use crate::nav::NavigationState;
use crate::tabnews::{self, Strategy};
use crate::ui;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration: {0:#}")]
    Config(anyhow::Error),
    #[error("terminal: {0:#}")]
    Terminal(anyhow::Error),
}

impl StartupError {
    pub fn exit_code(&self) -> i32 {
        match self {
            StartupError::Config(_) => 2,
            StartupError::Terminal(_) => 1,
        }
    }
}

/// Command-line overrides applied on top of the loaded config.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub strategy: Option<Strategy>,
    pub username: Option<String>,
    pub page: Option<u32>,
}

pub fn run(overrides: Overrides) -> Result<(), StartupError> {
    dotenv::dotenv().ok();

    let mut cfg = config::load(config::LoadOptions::default())
        .context("load config")
        .map_err(StartupError::Config)?;
    apply_overrides(&mut cfg, &overrides);

    if let Err(err) = logging::init(&cfg.log) {
        eprintln!("warning: logging disabled: {err:#}");
    }
    info!(
        "starting tabnews-tui {} (config: {})",
        crate::VERSION,
        config::default_path()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "none".into())
    );

    let source = build_source(&cfg);
    let mut state = NavigationState::new(cfg.feed.per_page, cfg.feed.strategy, cfg.feed.username);
    if let Some(page) = overrides.page {
        state.page = page.max(1);
    }

    let mut model = ui::Model::new(state, source);
    model.run().map_err(StartupError::Terminal)?;
    info!("exiting");
    Ok(())
}

fn apply_overrides(cfg: &mut Config, overrides: &Overrides) {
    if let Some(strategy) = overrides.strategy {
        cfg.feed.strategy = strategy;
    }
    if let Some(username) = &overrides.username {
        cfg.feed.username = Some(username.clone());
    }
}

/// Builds the content source, logging in first when credentials but no token
/// are configured. Never fails: an unusable client degrades to a source that
/// reports every fetch as a network error.
pub fn build_source(cfg: &Config) -> Arc<dyn ContentSource> {
    let client_config = tabnews::ClientConfig {
        user_agent: cfg.api.user_agent.clone(),
        base_url: Some(cfg.api.base_url.clone()),
        token: Some(cfg.api.token.clone()),
        timeout: Some(cfg.api.timeout),
        http_client: None,
    };
    let mut client = match tabnews::Client::new(client_config) {
        Ok(client) => client,
        Err(err) => {
            warn!("tabnews client unavailable: {err:#}");
            return Arc::new(UnavailableSource::new(format!(
                "client unavailable: {err:#}"
            )));
        }
    };

    if !client.is_authenticated() && !cfg.api.email.is_empty() && !cfg.api.password.is_empty() {
        if try_login(&mut client, &cfg.api.email, &cfg.api.password) {
            info!("logged in as {}", cfg.api.email);
        } else {
            warn!("login failed, browsing unauthenticated");
        }
    }

    Arc::new(TabNewsSource::new(Arc::new(client)))
}

/// Login outcome is a plain success flag; failures leave the client as is.
pub fn try_login(client: &mut tabnews::Client, email: &str, password: &str) -> bool {
    match client.login(email, password) {
        Ok(token) => {
            client.set_token(token);
            true
        }
        Err(err) => {
            warn!("login: {err}");
            false
        }
    }
}
