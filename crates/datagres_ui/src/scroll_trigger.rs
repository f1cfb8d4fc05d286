//! Fires a "load more" callback when a sentinel gets close to the bottom of
//! its scroll container.
//!
//! Geometry is in whatever unit the host lays out in: pixels for a GUI,
//! rows for the terminal view.

use std::{fmt, sync::Arc};

pub type LoadMore = Arc<dyn Fn() + Send + Sync>;

/// Vertical extent of something on screen; `bottom` is exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    pub top: i64,
    pub bottom: i64,
}

impl Bounds {
    #[must_use]
    pub const fn new(top: i64, bottom: i64) -> Self {
        Self { top, bottom }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementBounds {
    pub id: String,
    pub bounds: Bounds,
}

/// What the sentinel's proximity is measured against
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Container {
    /// The whole visible area
    #[default]
    Viewport,
    Element(ElementBounds),
}

impl Container {
    fn same_identity(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Viewport, Self::Viewport) => true,
            (Self::Element(a), Self::Element(b)) => a.id == b.id,
            _ => false,
        }
    }

    fn root(&self, viewport: Bounds) -> Bounds {
        match self {
            Self::Viewport => viewport,
            Self::Element(element) => element.bounds,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntersectionEntry {
    pub is_intersecting: bool,
}

#[derive(Clone)]
pub struct TriggerOptions {
    pub on_load_more: LoadMore,
    pub has_more: bool,
    pub is_loading: bool,
    /// How far before the container's bottom edge the sentinel counts as
    /// reached
    pub threshold_px: u32,
    pub container: Container,
}

impl fmt::Debug for TriggerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerOptions")
            .field("has_more", &self.has_more)
            .field("is_loading", &self.is_loading)
            .field("threshold_px", &self.threshold_px)
            .field("container", &self.container)
            .finish_non_exhaustive()
    }
}

impl TriggerOptions {
    /// Whether switching from `self` to `next` needs a new observer
    fn needs_new_observer(&self, next: &Self) -> bool {
        self.has_more != next.has_more
            || self.is_loading != next.is_loading
            || !Arc::ptr_eq(&self.on_load_more, &next.on_load_more)
            || self.threshold_px != next.threshold_px
            || !self.container.same_identity(&next.container)
    }
}

/// Polling stand-in for a native intersection observer. Reports an entry on
/// the first check and afterwards only when the reached state flips.
#[derive(Debug, Clone)]
pub struct ProximityObserver {
    threshold: u32,
    reached: Option<bool>,
}

impl ProximityObserver {
    #[must_use]
    pub const fn new(threshold: u32) -> Self {
        Self {
            threshold,
            reached: None,
        }
    }

    /// The sentinel overlaps `root` extended downwards by `threshold`
    #[must_use]
    pub fn is_reached(sentinel: Bounds, root: Bounds, threshold: u32) -> bool {
        sentinel.top < root.bottom + i64::from(threshold)
            && sentinel.bottom > root.top
    }

    pub fn check(
        &mut self,
        sentinel: Bounds,
        root: Bounds,
    ) -> Option<IntersectionEntry> {
        let reached = Self::is_reached(sentinel, root, self.threshold);
        if self.reached == Some(reached) {
            return None;
        }
        self.reached = Some(reached);
        Some(IntersectionEntry {
            is_intersecting: reached,
        })
    }
}

struct Active {
    observer: ProximityObserver,
    options: TriggerOptions,
}

#[derive(Default)]
pub struct ScrollTrigger {
    active: Option<Active>,
    observers_created: usize,
}

impl fmt::Debug for ScrollTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollTrigger")
            .field("options", &self.active.as_ref().map(|a| &a.options))
            .field("observers_created", &self.observers_created)
            .finish()
    }
}

impl ScrollTrigger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// How many observers have been constructed over this trigger's life
    #[must_use]
    pub const fn observers_created(&self) -> usize {
        self.observers_created
    }

    #[must_use]
    pub const fn is_observing(&self) -> bool {
        self.active.is_some()
    }

    /// Start observing, or pick up new options. The observer is only rebuilt
    /// when a dependency changed; container bounds alone are updated in
    /// place.
    pub fn observe(&mut self, options: TriggerOptions) {
        if let Some(active) = &mut self.active {
            if !active.options.needs_new_observer(&options) {
                active.options.container = options.container;
                return;
            }
        }

        self.disconnect();
        self.observers_created += 1;
        self.active = Some(Active {
            observer: ProximityObserver::new(options.threshold_px),
            options,
        });
    }

    /// Measure the sentinel against the container and fire if it just
    /// became reached. Returns whether the callback ran.
    pub fn check(&mut self, sentinel: Bounds, viewport: Bounds) -> bool {
        let Some(active) = &mut self.active else {
            return false;
        };
        let root = active.options.container.root(viewport);
        match active.observer.check(sentinel, root) {
            Some(entry) => self.deliver(entry),
            None => false,
        }
    }

    /// Handle one intersection entry. Every intersecting entry fires the
    /// callback once, unless loading is forbidden right now.
    pub fn deliver(&mut self, entry: IntersectionEntry) -> bool {
        let Some(active) = &self.active else {
            return false;
        };
        let options = &active.options;
        if !entry.is_intersecting || !options.has_more || options.is_loading {
            return false;
        }

        (options.on_load_more)();
        true
    }

    pub fn disconnect(&mut self) {
        self.active = None;
    }
}
