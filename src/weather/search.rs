//! Debounced place search
//!
//! Every keystroke reschedules one task that sleeps for the debounce delay and
//! then queries the geocoder. Rescheduling aborts the previous task, which also
//! drops its in-flight request. A generation counter filters out results that
//! were already queued when the abort happened.

use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use super::{OpenMeteoClient, Place};

#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// Debounce elapsed, request sent
    Started { generation: u64 },
    /// Request finished; empty on no match or failure
    Finished { generation: u64, places: Vec<Place> },
}

impl SearchEvent {
    fn generation(&self) -> u64 {
        match self {
            Self::Started { generation } | Self::Finished { generation, .. } => *generation,
        }
    }
}

pub struct SearchDebouncer {
    client: OpenMeteoClient,
    delay: Duration,
    generation: u64,
    pending: Option<JoinHandle<()>>,
    tx: UnboundedSender<SearchEvent>,
    rx: UnboundedReceiver<SearchEvent>,
}

impl SearchDebouncer {
    pub fn new(client: OpenMeteoClient, delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            client,
            delay,
            generation: 0,
            pending: None,
            tx,
            rx,
        }
    }

    /// Supersede any pending search with `query`. An empty query only cancels.
    pub fn schedule(&mut self, query: &str) {
        self.cancel();

        let query = query.trim().to_string();
        if query.is_empty() {
            return;
        }

        let generation = self.generation;
        let client = self.client.clone();
        let delay = self.delay;
        let tx = self.tx.clone();

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(SearchEvent::Started { generation });

            let places = match client.search(&query).await {
                Ok(places) => places,
                Err(e) => {
                    tracing::warn!("Search for '{}' failed: {}", query, e);
                    Vec::new()
                }
            };
            let _ = tx.send(SearchEvent::Finished { generation, places });
        }));
    }

    /// Abort the pending search, if any, and invalidate its queued events
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        self.generation += 1;
    }

    /// Next event for the current generation, without waiting
    pub fn try_next(&mut self) -> Option<SearchEvent> {
        while let Ok(event) = self.rx.try_recv() {
            if event.generation() == self.generation {
                return Some(event);
            }
        }
        None
    }

    /// Wait for the next event for the current generation
    #[cfg(test)]
    pub async fn next(&mut self) -> Option<SearchEvent> {
        while let Some(event) = self.rx.recv().await {
            if event.generation() == self.generation {
                return Some(event);
            }
        }
        None
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::client::tests::{place_json, test_api_config};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_DELAY: Duration = Duration::from_millis(50);

    async fn finished(debouncer: &mut SearchDebouncer) -> Vec<Place> {
        loop {
            match debouncer.next().await {
                Some(SearchEvent::Finished { places, .. }) => return places,
                Some(SearchEvent::Started { .. }) => continue,
                None => panic!("search channel closed"),
            }
        }
    }

    #[tokio::test]
    async fn test_rapid_typing_sends_one_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("name", "Denver"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [place_json(1, "Denver")]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        // Prefixes must never reach the server
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = OpenMeteoClient::new(&test_api_config(&mock_server)).unwrap();
        let mut debouncer = SearchDebouncer::new(client, TEST_DELAY);

        debouncer.schedule("D");
        debouncer.schedule("De");
        debouncer.schedule("Denver");

        let places = finished(&mut debouncer).await;
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].name, "Denver");
    }

    #[tokio::test]
    async fn test_superseded_in_flight_request_is_dropped() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("name", "Paris"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "results": [place_json(1, "Paris")] }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("name", "Tokyo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [place_json(2, "Tokyo")]
            })))
            .mount(&mock_server)
            .await;

        let client = OpenMeteoClient::new(&test_api_config(&mock_server)).unwrap();
        let mut debouncer = SearchDebouncer::new(client, TEST_DELAY);

        debouncer.schedule("Paris");
        // Let the Paris request go out before superseding it
        tokio::time::sleep(Duration::from_millis(150)).await;
        debouncer.schedule("Tokyo");

        let places = finished(&mut debouncer).await;
        assert_eq!(places[0].name, "Tokyo");

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(debouncer.try_next(), None);
    }

    #[tokio::test]
    async fn test_empty_query_cancels_without_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = OpenMeteoClient::new(&test_api_config(&mock_server)).unwrap();
        let mut debouncer = SearchDebouncer::new(client, TEST_DELAY);

        debouncer.schedule("Lon");
        debouncer.schedule("");

        tokio::time::sleep(TEST_DELAY * 4).await;
        assert_eq!(debouncer.try_next(), None);
    }

    #[tokio::test]
    async fn test_failed_search_yields_empty_list() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = OpenMeteoClient::new(&test_api_config(&mock_server)).unwrap();
        let mut debouncer = SearchDebouncer::new(client, TEST_DELAY);

        debouncer.schedule("Berlin");
        assert!(finished(&mut debouncer).await.is_empty());
    }
}
