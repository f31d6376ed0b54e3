//! Plain-text renderer for the console.
//!
//! Writes one block per view to the wrapped writer (stdout in production).
//! Logs go to stderr, so the two streams never interleave mid-line.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::cell::RefCell;
use std::fmt::Write as _;
use std::io::{self, Write};

use relief_client::net::types::{Catalog, Disaster, GeocodeResult, OfficialUpdate, Resource, SocialReport};
use relief_client::render::{NotificationKind, Panel, Renderer, View};
use relief_client::state::session::SessionContext;

const NA: &str = "N/A";

pub struct TerminalRenderer<W: Write> {
    out: RefCell<W>,
}

impl TerminalRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out: RefCell::new(out) }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn emit(&self, text: &str) {
        let mut out = self.out.borrow_mut();
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
            tracing::warn!(error = %e, "console write failed");
        }
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn render(&self, view: View) {
        let panel = view.panel();
        let body = match view {
            View::Disasters(disasters) => list(&disasters, "No disasters found", disaster_block),
            View::SocialMedia(reports) => list(&reports, "No social media reports", report_block),
            View::Resources(resources) => list(&resources, "No resources", resource_block),
            View::Updates(updates) => list(&updates, "No updates", update_block),
            View::Geocode(result) => geocode_block(&result),
            View::Catalog(catalog) => catalog_block(&catalog),
            View::Placeholder { message, .. } => format!("  {message}\n"),
        };
        self.emit(&format!("== {} ==\n{body}", panel_title(panel)));
    }

    fn show_loading(&self, panel: Panel, message: &str) {
        self.emit(&format!("[{}] {message}\n", panel_title(panel)));
    }

    fn show_error(&self, panel: Panel, message: &str) {
        self.emit(&format!("[{}] error: {message}\n", panel_title(panel)));
    }

    fn show_success(&self, panel: Panel, message: &str) {
        self.emit(&format!("[{}] {message}\n", panel_title(panel)));
    }

    fn show_notification(&self, message: &str, kind: NotificationKind) {
        let marker = match kind {
            NotificationKind::Info => "i",
            NotificationKind::Success => "*",
        };
        self.emit(&format!("{marker} {message}\n"));
    }

    fn show_connection(&self, connected: bool) {
        let state = if connected { "connected" } else { "disconnected" };
        self.emit(&format!("push: {state}\n"));
    }

    fn show_selection(&self, session: &SessionContext) {
        let disaster = session.selected_disaster_id.as_ref().map_or(NA.to_owned(), ToString::to_string);
        self.emit(&format!(
            "user: {} | disaster: {disaster} | lat: {} | lon: {}\n",
            session.acting_user_id,
            number(session.selected_latitude),
            number(session.selected_longitude),
        ));
    }
}

fn panel_title(panel: Panel) -> &'static str {
    match panel {
        Panel::Disasters => "Disasters",
        Panel::SocialMedia => "Social media",
        Panel::Resources => "Resources",
        Panel::Updates => "Official updates",
        Panel::Geocode => "Geocode",
        Panel::Catalog => "Catalog",
    }
}

fn list<T>(items: &[T], empty: &str, block: fn(&T) -> String) -> String {
    if items.is_empty() {
        return format!("  {empty}\n");
    }
    items.iter().map(block).collect()
}

fn text(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or(NA)
}

fn number(value: Option<f64>) -> String {
    value.map_or_else(|| NA.to_owned(), |v| v.to_string())
}

fn disaster_block(d: &Disaster) -> String {
    let mut block = format!(
        "- {} (ID: {})\n  location: {}\n  description: {}\n",
        text(d.title.as_deref()),
        d.id,
        text(d.location.as_deref()),
        text(d.description.as_deref()),
    );
    if !d.tags.is_empty() {
        let _ = writeln!(block, "  tags: {}", d.tags.join(", "));
    }
    block
}

fn report_block(r: &SocialReport) -> String {
    format!(
        "- {}\n  author: {} | at: {}\n  image: {} | uri: {} | cid: {}\n",
        text(r.text.as_deref()),
        text(r.author.as_deref()),
        text(r.timestamp.as_deref()),
        text(r.image_url.as_deref()),
        text(r.uri.as_deref()),
        text(r.cid.as_deref()),
    )
}

fn resource_block(r: &Resource) -> String {
    format!(
        "- {} ({})\n  location: {} | availability: {} | contact: {}\n  distance: {} meters | created: {}\n",
        r.name.as_deref().unwrap_or("Resource"),
        text(r.kind.as_deref()),
        text(r.display_location()),
        text(r.availability.as_deref()),
        text(r.contact.as_deref()),
        number(r.distance),
        text(r.created_at.as_deref()),
    )
}

fn update_block(u: &OfficialUpdate) -> String {
    format!(
        "- {}\n  {}\n  author: {} | at: {}\n",
        u.title.as_deref().unwrap_or("Official Update"),
        text(u.content.as_deref()),
        text(u.author.as_deref()),
        text(u.timestamp.as_deref()),
    )
}

fn geocode_block(result: &GeocodeResult) -> String {
    format!(
        "  latitude: {}\n  longitude: {}\n  location: {}\n",
        number(result.coordinates.lat),
        number(result.coordinates.lon),
        text(result.location.as_deref()),
    )
}

fn catalog_block(catalog: &Catalog) -> String {
    let mut block = String::new();
    for d in &catalog.disasters {
        let _ = writeln!(
            block,
            "  {}: {} ({}, {})",
            d.id,
            d.title.as_deref().unwrap_or("Untitled"),
            number(d.latitude),
            number(d.longitude),
        );
    }
    if catalog.disasters.is_empty() {
        block.push_str("  No disasters found\n");
    }
    let tags = if catalog.tags.is_empty() { NA.to_owned() } else { catalog.tags.join(", ") };
    let _ = writeln!(block, "  tags: {tags}");
    block
}
