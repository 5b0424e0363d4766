#![forbid(unsafe_code)]

//! Collaborator contracts: what the runtime tells the outside world and what
//! it asks of it.
//!
//! Every port is an in-process callback. Closures implement the single-method
//! ports directly, so a host can pass `|action| ...` without a wrapper type.
//!
//! # Failure Modes
//!
//! Ports cannot fail from the runtime's point of view. Persistence is
//! fire-and-forget: a collaborator that cannot save a speed must swallow the
//! error itself.

use std::collections::HashMap;

use kinescroll_core::config::{ConfigError, ConfigHandle, ScrollConfig};
use kinescroll_core::interactive::{self, ElementTarget};

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Notifications the runtime cannot render itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Autoscroll started at `speed` (px/s).
    Activated { speed: f64 },
    /// Scrolling was paused (`true`) or resumed (`false`).
    PausedStateChanged { paused: bool },
    /// Current speed changed (px/s).
    SpeedChanged { speed: f64 },
    /// The engine stopped at the end of the content.
    EndOfContent { chain_navigation: bool },
    /// Autoscroll was switched off by a gesture or by the activity gate.
    Deactivated,
    /// Three-finger tap: the user asked to toggle activation for this site.
    ToggleSiteActivation,
    /// Four-finger tap: the user asked to pick an element.
    EnterElementPick,
    /// A host API failed; the runtime is back in its inactive state.
    Failure { message: String },
}

impl Action {
    /// Stable identifier, matching the host's `onAction(kind, ...)` names.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Activated { .. } => "activated",
            Self::PausedStateChanged { .. } => "pausedStateChanged",
            Self::SpeedChanged { .. } => "speedChanged",
            Self::EndOfContent { .. } => "endOfContent",
            Self::Deactivated => "deactivated",
            Self::ToggleSiteActivation => "toggleSiteActivation",
            Self::EnterElementPick => "enterElementPick",
            Self::Failure { .. } => "failure",
        }
    }
}

/// Receives [`Action`]s.
pub trait ActionSink {
    fn on_action(&mut self, action: Action);
}

impl<F: FnMut(Action)> ActionSink for F {
    fn on_action(&mut self, action: Action) {
        self(action);
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Advisory request to persist a new default speed.
pub trait SpeedPersistence {
    fn on_speed_changed(&mut self, speed: f64);
}

impl<F: FnMut(f64)> SpeedPersistence for F {
    fn on_speed_changed(&mut self, speed: f64) {
        self(speed);
    }
}

/// Discards persistence requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPersistence;

impl SpeedPersistence for NoPersistence {
    fn on_speed_changed(&mut self, _speed: f64) {}
}

// ---------------------------------------------------------------------------
// Activity gate
// ---------------------------------------------------------------------------

/// Whether kinescroll is enabled for the current site.
pub trait ActivityGate {
    fn is_active(&self) -> bool;
}

impl<F: Fn() -> bool> ActivityGate for F {
    fn is_active(&self) -> bool {
        self()
    }
}

/// A gate that is always open.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysActive;

impl ActivityGate for AlwaysActive {
    fn is_active(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Interactive predicate
// ---------------------------------------------------------------------------

/// Decides whether a tap target belongs to the page.
pub trait InteractivePredicate {
    fn is_interactive(&self, target: &ElementTarget) -> bool;
}

impl<F: Fn(&ElementTarget) -> bool> InteractivePredicate for F {
    fn is_interactive(&self, target: &ElementTarget) -> bool {
        self(target)
    }
}

/// Tag, cursor, and role check over the target and its near ancestors.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomInteractivity;

impl InteractivePredicate for DomInteractivity {
    fn is_interactive(&self, target: &ElementTarget) -> bool {
        interactive::is_interactive(target)
    }
}

// ---------------------------------------------------------------------------
// Configuration store
// ---------------------------------------------------------------------------

/// Source of per-domain configuration snapshots.
///
/// `watch` returns a live [`ConfigHandle`]; the store pushes every later
/// change for that domain into it.
pub trait ConfigStore {
    /// Effective configuration for `domain`.
    fn get(&self, domain: &str) -> ScrollConfig;

    /// A handle that tracks `domain` from now on.
    fn watch(&mut self, domain: &str) -> ConfigHandle;
}

/// In-memory [`ConfigStore`]: a base snapshot plus per-domain overrides.
///
/// Writes are validated; an invalid snapshot is rejected and leaves the
/// store unchanged.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    base: ScrollConfig,
    overrides: HashMap<String, ScrollConfig>,
    watchers: Vec<(String, ConfigHandle)>,
}

impl MemoryConfigStore {
    /// Create a store with `base` as the fallback for every domain.
    #[must_use]
    pub fn new(base: ScrollConfig) -> Self {
        Self {
            base,
            overrides: HashMap::new(),
            watchers: Vec::new(),
        }
    }

    /// Replace the base snapshot.
    pub fn set_base(&mut self, config: ScrollConfig) -> Result<(), ConfigError> {
        self.base = config.validated()?;
        self.publish(|_| true);
        Ok(())
    }

    /// Override the snapshot for one domain.
    pub fn set_override(&mut self, domain: &str, config: ScrollConfig) -> Result<(), ConfigError> {
        let config = config.validated()?;
        self.overrides.insert(domain.to_owned(), config);
        self.publish(|d| d == domain);
        Ok(())
    }

    /// Drop a domain override; the domain falls back to the base.
    pub fn clear_override(&mut self, domain: &str) {
        if self.overrides.remove(domain).is_some() {
            self.publish(|d| d == domain);
        }
    }

    /// Persist a new default speed for `domain`.
    pub fn set_default_speed(&mut self, domain: &str, speed: f64) -> Result<(), ConfigError> {
        let mut config = self.get(domain);
        config.default_speed = speed;
        self.set_override(domain, config)
    }

    /// Number of live watchers.
    #[must_use]
    pub fn watcher_count(&self) -> usize {
        self.watchers
            .iter()
            .filter(|(_, handle)| handle.handle_count() > 1)
            .count()
    }

    /// Forget watchers whose handles have all been dropped; the store's own
    /// clone is the only one left.
    fn prune(&mut self) {
        self.watchers.retain(|(_, handle)| handle.handle_count() > 1);
    }

    fn publish(&mut self, affected: impl Fn(&str) -> bool) {
        self.prune();
        for (domain, handle) in &self.watchers {
            if affected(domain) {
                handle.store(self.get(domain));
            }
        }
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get(&self, domain: &str) -> ScrollConfig {
        self.overrides
            .get(domain)
            .unwrap_or(&self.base)
            .clone()
    }

    fn watch(&mut self, domain: &str) -> ConfigHandle {
        self.prune();
        let handle = ConfigHandle::new(self.get(domain));
        self.watchers.push((domain.to_owned(), handle.clone()));
        handle
    }
}
