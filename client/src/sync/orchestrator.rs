//! Refresh orchestrator: decides which server views to re-fetch and when.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every trigger ends up here: operator actions, debounced push events, and
//! the follow-ups of a successful mutation. The orchestrator owns the
//! `Session`, consults the per-view `RateLimiter`, calls the API, and hands
//! typed views to the `Renderer`.
//!
//! DESIGN
//! ======
//! A refresh runs three checks in order: selection (views keyed by a disaster
//! render a placeholder when nothing is selected), throttle (denied calls
//! return silently), then the fetch itself. The selected id is captured
//! before the call; a response that lands after the selection moved on is
//! discarded, its gate slot is handed back, and the view is re-fetched for
//! the current selection so the panel never stays on its loading message.
//!
//! The struct is a bundle of `Rc` handles, so a clone per spawned task is
//! cheap and every clone shares one session, one limiter, and one filter.
//!
//! ERROR HANDLING
//! ==============
//! Failures are rendered into the affected panel and logged, then returned
//! as `SyncError` so callers can react. Follow-up refreshes after a
//! successful mutation never turn that mutation into a failure.

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod orchestrator_test;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use reqwest::Method;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::throttle::{Category, RateLimiter};
use crate::clock::Clock;
use crate::config::SyncConfig;
use crate::error::{ApiError, SyncError, ValidationError};
use crate::net::api::{ApiClient, Body, CallOptions};
use crate::net::http::HttpTransport;
use crate::net::types::{
    Catalog, Disaster, DisasterDraft, DisasterId, GeocodeResult, PushEvent, ReportDraft, ReportPayload,
    normalize_geocode, parse_created_disaster, parse_disasters, parse_reports, parse_resources, parse_updates,
    sort_newest_first,
};
use crate::render::{NotificationKind, Panel, Renderer, View};
use crate::state::session::Session;

/// Shown in a disaster-keyed panel while nothing is selected.
pub const SELECT_PLACEHOLDER: &str = "Select a disaster";
/// Shown in the geocode panel when the geocoder found nothing.
pub const NO_COORDINATES: &str = "No coordinates found";
/// Notification shown when the operator reopens the push channel.
pub const RECONNECTING: &str = "Reconnecting to live updates...";

const REPORT_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const REPORT_ID_SUFFIX_LEN: usize = 9;

/// How a refresh request was settled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    Fetched,
    /// The view is keyed by a disaster and none is selected.
    NoSelection,
    /// The view's gate denied the call.
    RateLimited,
    /// The selection changed while the call was in flight.
    Stale,
}

/// Result of a successful report submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportReceipt {
    /// Server-assigned id when returned, else the generated one.
    pub report_id: String,
    pub disaster_id: DisasterId,
}

#[derive(Clone)]
pub struct Orchestrator {
    session: Session,
    api: ApiClient,
    renderer: Rc<dyn Renderer>,
    limiter: Rc<RateLimiter>,
    tag_filter: Rc<RefCell<Option<String>>>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        config: &SyncConfig,
        transport: Rc<dyn HttpTransport>,
        renderer: Rc<dyn Renderer>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let session = Session::new(config.user_id.clone());
        let api = ApiClient::new(&config.api_base_url, transport, session.reader());
        Self {
            session,
            api,
            renderer,
            limiter: Rc::new(RateLimiter::new(config.min_call_interval, clock)),
            tag_filter: Rc::new(RefCell::new(None)),
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn tag_filter(&self) -> Option<String> {
        self.tag_filter.borrow().clone()
    }

    // =========================================================================
    // REFRESH
    // =========================================================================

    /// Re-fetch one view, subject to selection and throttling.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Network` when the fetch fails. The failure has
    /// already been rendered into the view's panel.
    pub async fn refresh(&self, category: Category) -> Result<RefreshOutcome, SyncError> {
        let context = self.session.current();
        let key = context.selected_disaster_id.clone();

        let endpoint = match (category, key.as_ref()) {
            (Category::Disasters, _) => self.disasters_endpoint(),
            (Category::SocialMedia, Some(id)) => format!("/api/disasters/{id}/social"),
            (Category::Resources, Some(id)) => {
                let lat = context.selected_latitude.unwrap_or(0.0);
                let lon = context.selected_longitude.unwrap_or(0.0);
                format!("/api/disasters/{id}/resources?lat={lat}&lon={lon}")
            }
            (Category::Updates, Some(id)) => format!("/api/disasters/{id}/updates"),
            (_, None) => {
                debug!(category = category.label(), "refresh skipped; no disaster selected");
                self.renderer.render(View::Placeholder { panel: category.panel(), message: SELECT_PLACEHOLDER });
                return Ok(RefreshOutcome::NoSelection);
            }
        };

        let Some(marked) = self.limiter.acquire(category) else {
            debug!(category = category.label(), "refresh throttled");
            return Ok(RefreshOutcome::RateLimited);
        };

        self.renderer.show_loading(category.panel(), loading_message(category));
        let result = self.api.get(&endpoint).await;

        if category.requires_selection() && self.session.selected_disaster() != key {
            // The panel still shows this call's loading message, and refreshes
            // for the new selection were throttled by it.
            debug!(category = category.label(), %endpoint, "discarding response for previous selection");
            self.limiter.release(category, marked);
            log_follow_up(category, Box::pin(self.refresh(category)).await);
            return Ok(RefreshOutcome::Stale);
        }

        match result {
            Ok(payload) => {
                self.renderer.render(build_view(category, payload.as_ref()));
                Ok(RefreshOutcome::Fetched)
            }
            Err(e) => {
                warn!(category = category.label(), %endpoint, error = %e, "refresh failed");
                self.renderer.show_error(category.panel(), failure_message(category));
                Err(e.into())
            }
        }
    }

    fn disasters_endpoint(&self) -> String {
        match self.tag_filter.borrow().as_deref() {
            Some(tag) => {
                let encoded: String = url::form_urlencoded::byte_serialize(tag.as_bytes()).collect();
                format!("/api/disasters?tag={encoded}")
            }
            None => "/api/disasters".to_owned(),
        }
    }

    /// Refresh social media and resources for the current selection together.
    async fn refresh_selection_views(&self) {
        let (social, resources) =
            futures_util::future::join(self.refresh(Category::SocialMedia), self.refresh(Category::Resources)).await;
        log_follow_up(Category::SocialMedia, social);
        log_follow_up(Category::Resources, resources);
    }

    /// Refresh the disaster list and reload the catalog after a mutation.
    async fn refresh_listings(&self) {
        log_follow_up(Category::Disasters, self.refresh(Category::Disasters).await);
        if let Err(e) = self.load_catalog().await {
            debug!(error = %e, "catalog reload after mutation failed");
        }
    }

    // =========================================================================
    // SELECTION
    // =========================================================================

    /// Select a disaster and refresh the views keyed by it.
    pub async fn select_disaster(&self, id: DisasterId, latitude: Option<f64>, longitude: Option<f64>) {
        info!(disaster_id = %id, ?latitude, ?longitude, "disaster selected");
        self.session.select_disaster(id, latitude, longitude);
        self.announce_selection();
        self.refresh_selection_views().await;
    }

    /// Switch the acting user. Takes effect on the next request.
    pub fn select_user(&self, user_id: &str) {
        info!(user_id, "acting user changed");
        self.session.select_user(user_id);
        self.announce_selection();
    }

    /// Set or clear the disaster-list tag filter, then refresh the list.
    ///
    /// # Errors
    ///
    /// See [`Orchestrator::refresh`].
    pub async fn set_tag_filter(&self, tag: Option<String>) -> Result<RefreshOutcome, SyncError> {
        let tag = tag.map(|t| t.trim().to_owned()).filter(|t| !t.is_empty());
        debug!(?tag, "tag filter changed");
        *self.tag_filter.borrow_mut() = tag;
        self.refresh(Category::Disasters).await
    }

    /// Display the current selection.
    pub fn announce_selection(&self) {
        self.renderer.show_selection(&self.session.current());
    }

    // =========================================================================
    // LOADING
    // =========================================================================

    /// Fetch every disaster (unthrottled, unfiltered) and render the catalog.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Network` when the fetch fails.
    pub async fn load_catalog(&self) -> Result<Catalog, SyncError> {
        match self.api.get("/api/disasters").await {
            Ok(payload) => {
                let catalog = Catalog::from_disasters(parse_disasters(payload.as_ref()));
                debug!(disasters = catalog.disasters.len(), tags = catalog.tags.len(), "catalog loaded");
                self.renderer.render(View::Catalog(catalog.clone()));
                Ok(catalog)
            }
            Err(e) => {
                warn!(error = %e, "catalog load failed");
                self.renderer.show_error(Panel::Disasters, "Failed to load disasters for selection");
                Err(e.into())
            }
        }
    }

    /// Initial load: disaster list, catalog, then the selection-keyed views.
    ///
    /// # Errors
    ///
    /// Returns the first failure; every step runs regardless.
    pub async fn bootstrap(&self) -> Result<(), SyncError> {
        info!(user_id = %self.session.reader().acting_user(), "bootstrapping views");
        let disasters = self.refresh(Category::Disasters).await;
        let catalog = self.load_catalog().await;
        self.announce_selection();
        self.refresh_selection_views().await;
        disasters?;
        catalog?;
        Ok(())
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Create a disaster and select it.
    ///
    /// Returns the created record when the server echoed one back.
    ///
    /// # Errors
    ///
    /// `Validation` when title or location is blank, `Network` when the
    /// request fails.
    pub async fn create_disaster(&self, draft: &DisasterDraft) -> Result<Option<Disaster>, SyncError> {
        let draft = draft.trimmed();
        if draft.title.is_empty() || draft.location.is_empty() {
            return Err(self.reject(Panel::Disasters, ValidationError::TitleAndLocationRequired));
        }

        self.renderer.show_loading(Panel::Disasters, "Creating disaster...");
        let payload = match self.send_encoded(Method::POST, "/api/disasters", &draft).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(title = %draft.title, error = %e, "create disaster failed");
                self.renderer.show_error(Panel::Disasters, "Failed to create disaster");
                return Err(e.into());
            }
        };

        let created = parse_created_disaster(payload.as_ref());
        match &created {
            Some(disaster) => {
                info!(disaster_id = %disaster.id, "disaster created");
                self.renderer
                    .show_success(Panel::Disasters, &format!("Disaster created successfully! ID: {}", disaster.id));
                self.select_disaster(disaster.id.clone(), disaster.latitude, disaster.longitude)
                    .await;
            }
            None => {
                warn!("create disaster response carried no disaster id");
                self.renderer.show_success(Panel::Disasters, "Disaster created successfully!");
            }
        }

        self.refresh_listings().await;
        Ok(created)
    }

    /// Update the selected disaster.
    ///
    /// # Errors
    ///
    /// `Validation` when nothing is selected, `Network` when the request fails.
    pub async fn update_disaster(&self, draft: &DisasterDraft) -> Result<DisasterId, SyncError> {
        let Some(id) = self.session.selected_disaster() else {
            return Err(self.reject(Panel::Disasters, ValidationError::NoSelection("to update")));
        };
        let draft = draft.trimmed();

        self.renderer.show_loading(Panel::Disasters, "Updating disaster...");
        if let Err(e) = self.send_encoded(Method::PUT, &format!("/api/disasters/{id}"), &draft).await {
            warn!(disaster_id = %id, error = %e, "update disaster failed");
            self.renderer.show_error(Panel::Disasters, "Failed to update disaster");
            return Err(e.into());
        }

        info!(disaster_id = %id, "disaster updated");
        self.renderer
            .show_success(Panel::Disasters, &format!("Disaster ID {id} updated successfully!"));
        self.refresh_listings().await;
        Ok(id)
    }

    /// Submit a verification report for the selected disaster.
    ///
    /// # Errors
    ///
    /// `Validation` for a missing selection, blank content, or a malformed
    /// image URL; `Network` when the request fails.
    pub async fn submit_report(&self, draft: &ReportDraft) -> Result<ReportReceipt, SyncError> {
        let Some(id) = self.session.selected_disaster() else {
            return Err(self.reject(Panel::SocialMedia, ValidationError::NoSelection("before submitting a report")));
        };

        let content = draft.content.trim();
        if content.is_empty() {
            return Err(self.reject(Panel::SocialMedia, ValidationError::ReportContentRequired));
        }
        let image_url = draft
            .image_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(ToOwned::to_owned);
        if let Some(raw) = &image_url {
            if url::Url::parse(raw).is_err() {
                return Err(self.reject(Panel::SocialMedia, ValidationError::InvalidImageUrl(raw.clone())));
            }
        }

        let payload = ReportPayload { image_url, report_id: generate_report_id(), content: content.to_owned() };
        self.renderer.show_loading(Panel::SocialMedia, "Submitting report...");
        let response = match self
            .send_encoded(Method::POST, &format!("/api/disasters/{id}/verify-image"), &payload)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(disaster_id = %id, report_id = %payload.report_id, error = %e, "report submission failed");
                self.renderer
                    .show_error(Panel::SocialMedia, &format!("Failed to submit report for ID: {id}"));
                return Err(e.into());
            }
        };

        let report_id = response
            .as_ref()
            .and_then(|v| v.get("id"))
            .and_then(id_text)
            .unwrap_or(payload.report_id);
        info!(disaster_id = %id, %report_id, "report submitted");
        self.renderer
            .show_success(Panel::SocialMedia, &format!("Report submitted for ID: {id}!"));
        log_follow_up(Category::SocialMedia, self.refresh(Category::SocialMedia).await);
        Ok(ReportReceipt { report_id, disaster_id: id })
    }

    /// Geocode a free-text description and adopt the coordinates.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank description, `Network` when the request
    /// fails. A failure clears the session coordinates.
    pub async fn geocode(&self, description: &str) -> Result<GeocodeResult, SyncError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(self.reject(Panel::Geocode, ValidationError::GeocodeDescriptionRequired));
        }

        self.renderer.show_loading(Panel::Geocode, "Getting coordinates...");
        let payload = match self.api.call("/geocode", CallOptions::post(json!({ "description": description }))).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(description, error = %e, "geocoding failed");
                self.session.set_coordinates(None, None);
                self.announce_selection();
                self.renderer.show_error(Panel::Geocode, "Geocoding failed");
                return Err(e.into());
            }
        };

        let result = normalize_geocode(payload.as_ref());
        let coordinates = result.coordinates;
        if coordinates.lat.is_some() || coordinates.lon.is_some() {
            self.renderer.render(View::Geocode(result.clone()));
        } else {
            self.renderer.render(View::Placeholder { panel: Panel::Geocode, message: NO_COORDINATES });
        }

        match coordinates.pair() {
            Some((lat, lon)) => {
                info!(description, lat, lon, "geocoded");
                self.session.set_coordinates(Some(lat), Some(lon));
                self.announce_selection();
                self.refresh_selection_views().await;
            }
            None => {
                info!(description, "geocoder returned no usable coordinates");
                self.session.set_coordinates(None, None);
                self.announce_selection();
            }
        }
        Ok(result)
    }

    // =========================================================================
    // PUSH
    // =========================================================================

    /// Act on a debounced push event.
    ///
    /// Events for anything but the current selection are dropped and return
    /// `Ok(None)`.
    ///
    /// # Errors
    ///
    /// See [`Orchestrator::refresh`].
    pub async fn handle_push_event(&self, event: PushEvent) -> Result<Option<RefreshOutcome>, SyncError> {
        let id = event.disaster_id();
        if !self.session.is_selected(id) {
            debug!(event = event.kind().event_name(), disaster_id = %id, "ignoring push event for unselected disaster");
            return Ok(None);
        }

        let (message, category) = match &event {
            PushEvent::DisasterUpdated { disaster_id } => (format!("Disaster ID {disaster_id} updated"), Category::Disasters),
            PushEvent::SocialMediaUpdated { disaster_id } => {
                (format!("Social media updated for ID: {disaster_id}"), Category::SocialMedia)
            }
            PushEvent::ResourcesUpdated { disaster_id } => {
                (format!("Resources updated for ID: {disaster_id}"), Category::Resources)
            }
        };
        info!(event = event.kind().event_name(), disaster_id = %id, "push event");
        self.renderer.show_notification(&message, NotificationKind::Success);
        self.refresh(category).await.map(Some)
    }

    /// Tell the operator the push channel is being reopened.
    pub fn push_reconnecting(&self) {
        self.renderer.show_notification(RECONNECTING, NotificationKind::Info);
    }

    /// Reflect a push channel status change.
    pub fn push_status(&self, connected: bool) {
        info!(connected, "push channel status");
        self.renderer.show_connection(connected);
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    fn reject(&self, panel: Panel, error: ValidationError) -> SyncError {
        debug!(error = %error, "input rejected");
        self.renderer.show_error(panel, &error.to_string());
        error.into()
    }

    /// Send `body` already encoded, the way form submissions go out.
    async fn send_encoded<T: Serialize>(
        &self,
        method: Method,
        endpoint: &str,
        body: &T,
    ) -> Result<Option<Value>, ApiError> {
        let encoded = serde_json::to_string(body).map_err(ApiError::Encode)?;
        let options = CallOptions { method, body: Some(Body::Prebuilt(encoded)), headers: Vec::new() };
        self.api.call(endpoint, options).await
    }
}

fn build_view(category: Category, payload: Option<&Value>) -> View {
    match category {
        Category::Disasters => {
            let mut disasters = parse_disasters(payload);
            sort_newest_first(&mut disasters);
            View::Disasters(disasters)
        }
        Category::SocialMedia => View::SocialMedia(parse_reports(payload)),
        Category::Resources => View::Resources(parse_resources(payload)),
        Category::Updates => View::Updates(parse_updates(payload)),
    }
}

fn loading_message(category: Category) -> &'static str {
    match category {
        Category::Disasters => "Loading disasters...",
        Category::SocialMedia => "Loading social media...",
        Category::Resources => "Loading resources...",
        Category::Updates => "Loading updates...",
    }
}

fn failure_message(category: Category) -> &'static str {
    match category {
        Category::Disasters => "Failed to load disasters",
        Category::SocialMedia => "Failed to load social media",
        Category::Resources => "Failed to load resources",
        Category::Updates => "Failed to load updates",
    }
}

fn log_follow_up(category: Category, result: Result<RefreshOutcome, SyncError>) {
    match result {
        Ok(outcome) => debug!(category = category.label(), ?outcome, "follow-up refresh settled"),
        Err(e) => debug!(category = category.label(), error = %e, "follow-up refresh failed"),
    }
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `report_<epoch ms>_<9 base36 chars>`.
fn generate_report_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis());
    let mut rng = rand::rng();
    let suffix: String = (0..REPORT_ID_SUFFIX_LEN)
        .map(|_| char::from(REPORT_ID_ALPHABET[rng.random_range(0..REPORT_ID_ALPHABET.len())]))
        .collect();
    format!("report_{millis}_{suffix}")
}
