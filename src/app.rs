use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::config::AppConfig;
use crate::weather::search::{SearchDebouncer, SearchEvent};
use crate::weather::{ApiError, OpenMeteoClient, Place, Unit, WeatherSnapshot};

/// Shown in the conditions panel when a fetch fails
pub const FETCH_ERROR_MESSAGE: &str = "Couldn't load weather. Try again.";

/// How long a status message stays in the footer
const STATUS_SECONDS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Search,
    Conditions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Help,
}

/// Result of one conditions fetch, sent back from its task
#[derive(Debug)]
pub struct FetchOutcome {
    pub place: Place,
    pub result: Result<WeatherSnapshot, ApiError>,
}

pub struct App {
    pub focus: Focus,
    pub popup: Popup,

    // Search line and dropdown
    pub query: String,
    pub results: Vec<Place>,
    pub highlighted: usize,
    pub loading_search: bool,

    // Conditions panel
    pub selected: Option<Place>,
    pub unit: Unit,
    pub weather: Option<WeatherSnapshot>,
    pub error: Option<String>,
    fetches_in_flight: usize,

    // Status message (shown in footer, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,

    config: AppConfig,
    config_path: Option<PathBuf>,

    client: OpenMeteoClient,
    search: SearchDebouncer,
    fetch_tx: UnboundedSender<FetchOutcome>,
    fetch_rx: UnboundedReceiver<FetchOutcome>,
}

impl App {
    /// Build the app from saved preferences and start fetching the last place.
    /// With no `config_path` preferences are kept in memory only.
    pub fn new(config: AppConfig, config_path: Option<PathBuf>) -> Result<Self> {
        let client = OpenMeteoClient::new(&config.api)?;
        let search = SearchDebouncer::new(
            client.clone(),
            Duration::from_millis(config.search_debounce_ms),
        );
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();

        let mut app = Self {
            focus: Focus::Search,
            popup: Popup::None,

            query: String::new(),
            results: Vec::new(),
            highlighted: 0,
            loading_search: false,

            selected: config.last_place.clone(),
            unit: config.unit,
            weather: None,
            error: None,
            fetches_in_flight: 0,

            status_message: None,
            status_message_time: None,

            config,
            config_path,

            client,
            search,
            fetch_tx,
            fetch_rx,
        };

        if let Some(name) = app.selected.as_ref().map(Place::display_name) {
            tracing::info!("Restoring last place: {}", name);
            app.focus = Focus::Conditions;
            app.fetch_conditions();
        }

        Ok(app)
    }

    pub fn loading_weather(&self) -> bool {
        self.fetches_in_flight > 0
    }

    /// The snapshot to render; hidden while an error is shown
    pub fn displayed_snapshot(&self) -> Option<&WeatherSnapshot> {
        match self.error {
            Some(_) => None,
            None => self.weather.as_ref(),
        }
    }

    /// Set a status message (auto-clears after a few seconds)
    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.popup == Popup::Help {
            if matches!(
                key.code,
                KeyCode::Esc
                    | KeyCode::Char('?')
                    | KeyCode::Char('h')
                    | KeyCode::Enter
                    | KeyCode::Char('q')
            ) {
                self.popup = Popup::None;
            }
            return Ok(());
        }

        match self.focus {
            Focus::Search => self.handle_search_key(key),
            Focus::Conditions => self.handle_conditions_key(key),
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char(c) => {
                let mut query = std::mem::take(&mut self.query);
                query.push(c);
                self.set_query(query);
            }
            KeyCode::Backspace => {
                let mut query = std::mem::take(&mut self.query);
                query.pop();
                self.set_query(query);
            }
            KeyCode::Down => {
                if !self.results.is_empty() {
                    self.highlighted = (self.highlighted + 1) % self.results.len();
                }
            }
            KeyCode::Up => {
                if !self.results.is_empty() {
                    self.highlighted = self
                        .highlighted
                        .checked_sub(1)
                        .unwrap_or(self.results.len() - 1);
                }
            }
            KeyCode::Enter => {
                if !self.results.is_empty() {
                    self.select_place(self.highlighted);
                }
            }
            KeyCode::Esc => {
                // First Esc closes the dropdown, second clears the query
                if !self.results.is_empty() {
                    self.results.clear();
                    self.highlighted = 0;
                } else {
                    self.set_query(String::new());
                }
            }
            KeyCode::Tab | KeyCode::BackTab => self.focus = Focus::Conditions,
            KeyCode::F(1) => self.popup = Popup::Help,
            _ => {}
        }
        Ok(())
    }

    fn handle_conditions_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('c') => self.set_unit(Unit::Metric)?,
            KeyCode::Char('f') => self.set_unit(Unit::Imperial)?,
            KeyCode::Char('u') => self.set_unit(self.unit.toggled())?,
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Char('/') | KeyCode::Char('s') | KeyCode::Tab | KeyCode::BackTab => {
                self.focus = Focus::Search;
            }
            KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::F(1) => self.popup = Popup::Help,
            _ => {}
        }
        Ok(())
    }

    /// Replace the query text and (re)schedule the debounced search
    pub fn set_query(&mut self, query: String) {
        self.query = query;
        self.loading_search = false;
        self.highlighted = 0;

        if self.query.trim().is_empty() {
            self.search.cancel();
            self.results.clear();
        } else {
            self.search.schedule(&self.query);
        }
    }

    /// Make the result at `index` the current place and fetch its conditions
    pub fn select_place(&mut self, index: usize) {
        let Some(place) = self.results.get(index).cloned() else {
            return;
        };

        self.search.cancel();
        self.loading_search = false;
        self.results.clear();
        self.highlighted = 0;

        // Show the selection in the input without searching for it again
        self.query = place.display_name();
        self.selected = Some(place);
        self.focus = Focus::Conditions;
        self.fetch_conditions();
    }

    /// Switch units, persist the choice and re-fetch the current place
    pub fn set_unit(&mut self, unit: Unit) -> Result<()> {
        if unit == self.unit {
            return Ok(());
        }

        self.unit = unit;
        self.config.unit = unit;
        self.set_status(format!("Units: °{}", unit.temperature_symbol()));
        self.fetch_conditions();
        self.save_config()
    }

    pub fn refresh(&mut self) {
        if self.selected.is_some() {
            self.set_status("Refreshing…");
            self.fetch_conditions();
        }
    }

    /// Spawn a fetch for the selected place in the current unit
    fn fetch_conditions(&mut self) {
        let Some(place) = self.selected.clone() else {
            return;
        };

        self.error = None;
        self.fetches_in_flight += 1;

        let client = self.client.clone();
        let unit = self.unit;
        let tx = self.fetch_tx.clone();

        tokio::spawn(async move {
            let result = client.forecast(&place, unit).await;
            let _ = tx.send(FetchOutcome { place, result });
        });
    }

    fn apply_search_event(&mut self, event: SearchEvent) {
        match event {
            SearchEvent::Started { .. } => self.loading_search = true,
            SearchEvent::Finished { places, .. } => {
                self.loading_search = false;
                self.results = places;
                self.highlighted = 0;
            }
        }
    }

    fn apply_fetch_outcome(&mut self, outcome: FetchOutcome) {
        self.fetches_in_flight = self.fetches_in_flight.saturating_sub(1);

        match outcome.result {
            Ok(snapshot) => {
                self.weather = Some(snapshot);
                self.error = None;
                self.config.last_place = Some(outcome.place);
                if let Err(e) = self.save_config() {
                    tracing::warn!("Could not save last place: {}", e);
                }
            }
            Err(e) => {
                tracing::error!("Weather fetch for {} failed: {}", outcome.place.name, e);
                self.error = Some(FETCH_ERROR_MESSAGE.to_string());
            }
        }
    }

    fn save_config(&self) -> Result<()> {
        match &self.config_path {
            Some(path) => self.config.save(path),
            None => Ok(()),
        }
    }

    /// Apply finished background work and expire the status message
    pub fn tick(&mut self) {
        while let Some(event) = self.search.try_next() {
            self.apply_search_event(event);
        }

        while let Ok(outcome) = self.fetch_rx.try_recv() {
            self.apply_fetch_outcome(outcome);
        }

        if let Some(time) = self.status_message_time {
            if time.elapsed().as_secs() >= STATUS_SECONDS {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }

    /// Wait for the next fetch to finish and apply it
    #[cfg(test)]
    pub async fn next_fetch(&mut self) {
        if let Some(outcome) = self.fetch_rx.recv().await {
            self.apply_fetch_outcome(outcome);
        }
    }

    /// Wait for the pending search to finish and apply it
    #[cfg(test)]
    pub async fn next_search(&mut self) {
        while let Some(event) = self.search.next().await {
            let done = matches!(event, SearchEvent::Finished { .. });
            self.apply_search_event(event);
            if done {
                return;
            }
        }
    }
}
