//! Renderer seam.
//!
//! SYSTEM CONTEXT
//! ==============
//! The sync layer never formats markup. It hands typed `View`s and status
//! messages to a `Renderer`, which only displays them. Nothing the renderer
//! shows is ever read back as state; the session is the sole state carrier.

use crate::net::types::{Catalog, Disaster, GeocodeResult, OfficialUpdate, Resource, SocialReport};
use crate::state::session::SessionContext;

/// Display region a view or message belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Panel {
    Disasters,
    SocialMedia,
    Resources,
    Updates,
    Geocode,
    Catalog,
}

/// Fetched data ready to display.
#[derive(Clone, Debug, PartialEq)]
pub enum View {
    Disasters(Vec<Disaster>),
    SocialMedia(Vec<SocialReport>),
    Resources(Vec<Resource>),
    Updates(Vec<OfficialUpdate>),
    Geocode(GeocodeResult),
    Catalog(Catalog),
    /// Nothing to fetch yet, e.g. no disaster selected.
    Placeholder { panel: Panel, message: &'static str },
}

impl View {
    #[must_use]
    pub fn panel(&self) -> Panel {
        match self {
            Self::Disasters(_) => Panel::Disasters,
            Self::SocialMedia(_) => Panel::SocialMedia,
            Self::Resources(_) => Panel::Resources,
            Self::Updates(_) => Panel::Updates,
            Self::Geocode(_) => Panel::Geocode,
            Self::Catalog(_) => Panel::Catalog,
            Self::Placeholder { panel, .. } => *panel,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
}

/// Display collaborator.
pub trait Renderer {
    fn render(&self, view: View);
    fn show_loading(&self, panel: Panel, message: &str);
    fn show_error(&self, panel: Panel, message: &str);
    fn show_success(&self, panel: Panel, message: &str);
    /// Transient toast; a newer notification replaces the previous one.
    fn show_notification(&self, message: &str, kind: NotificationKind);
    /// Push channel status indicator.
    fn show_connection(&self, connected: bool);
    /// Display the current selection (display only).
    fn show_selection(&self, session: &SessionContext);
}
