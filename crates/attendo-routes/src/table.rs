//! The static route table.

use std::sync::OnceLock;

use serde::Serialize;

/// Screens the gateway can show.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ViewId {
    /// Landing page.
    Accueil,
    /// List of exam sessions.
    Sessions,
    /// One session.
    SessionDetail,
    /// About page.
    APropos,
    /// One teaching unit of a session.
    UeDetail,
    /// One exam event of a teaching unit.
    EventDetail,
    /// Attendance sheet of one room.
    Attendance,
}

/// A view resolved on first use and memoized afterwards.
pub struct LazyView {
    loader: fn() -> ViewId,
    loaded: OnceLock<ViewId>,
}

impl LazyView {
    /// Wrap `loader`; it runs at most once.
    pub const fn new(loader: fn() -> ViewId) -> Self {
        Self {
            loader,
            loaded: OnceLock::new(),
        }
    }

    /// Resolve the view, running the loader on first call.
    pub fn load(&self) -> ViewId {
        *self.loaded.get_or_init(self.loader)
    }

    /// Whether [`Self::load`] has run.
    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }
}

impl std::fmt::Debug for LazyView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyView")
            .field("loaded", &self.loaded.get())
            .finish_non_exhaustive()
    }
}

/// How a route obtains its view.
#[derive(Clone, Copy, Debug)]
pub enum View {
    /// Available immediately.
    Eager(ViewId),
    /// Resolved on first navigation.
    Lazy(&'static LazyView),
}

impl View {
    /// The concrete view, loading it if needed.
    pub fn resolve(&self) -> ViewId {
        match self {
            Self::Eager(id) => *id,
            Self::Lazy(lazy) => lazy.load(),
        }
    }

    /// Whether the view must be loaded before display.
    pub fn is_lazy(&self) -> bool {
        matches!(self, Self::Lazy(_))
    }
}

/// One navigation entry.
#[derive(Debug)]
pub struct RouteDef {
    /// Unique route name.
    pub name: &'static str,
    /// Path pattern; `:name` segments capture a parameter.
    pub pattern: &'static str,
    /// View shown for the route.
    pub view: View,
    /// Label shown in the breadcrumb trail.
    pub breadcrumb: &'static str,
}

impl RouteDef {
    /// Pattern split into segments, root yielding none.
    pub(crate) fn segments(&self) -> impl Iterator<Item = &'static str> {
        self.pattern.split('/').filter(|s| !s.is_empty())
    }

    /// Parameter names in pattern order.
    pub fn params(&self) -> impl Iterator<Item = &'static str> {
        self.segments().filter_map(|s| s.strip_prefix(':'))
    }
}

fn load_attendance() -> ViewId {
    tracing::debug!("loading attendance view");
    ViewId::Attendance
}

static ATTENDANCE_VIEW: LazyView = LazyView::new(load_attendance);

/// Every route the gateway knows, in declaration order.
pub static ROUTES: [RouteDef; 7] = [
    RouteDef {
        name: "Accueil",
        pattern: "/",
        view: View::Eager(ViewId::Accueil),
        breadcrumb: "Accueil",
    },
    RouteDef {
        name: "Sessions",
        pattern: "/sessions",
        view: View::Eager(ViewId::Sessions),
        breadcrumb: "Sessions",
    },
    RouteDef {
        name: "SessionDetail",
        pattern: "/sessions/:id",
        view: View::Eager(ViewId::SessionDetail),
        breadcrumb: "Session",
    },
    RouteDef {
        name: "APropos",
        pattern: "/a-propos",
        view: View::Eager(ViewId::APropos),
        breadcrumb: "À propos",
    },
    RouteDef {
        name: "ueDetail",
        pattern: "/sessions/:sessionId/ue/:sessionCompoId/:ue",
        view: View::Eager(ViewId::UeDetail),
        breadcrumb: "UE",
    },
    RouteDef {
        name: "EventDetail",
        pattern: "/sessions/:sessionId/ue/:sessionCompoId/:ue/event/:eventId",
        view: View::Eager(ViewId::EventDetail),
        breadcrumb: "épreuve",
    },
    RouteDef {
        name: "AttendanceView",
        pattern: "/sessions/:sessionId/ue/:sessionCompoId/:ue/event/:eventId/room/:roomId",
        view: View::Lazy(&ATTENDANCE_VIEW),
        breadcrumb: "local",
    },
];

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
