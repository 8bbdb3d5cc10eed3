use super::choreography::ProgressSignals;
use super::constants::{VAR_AUTO_ANIMATE, VAR_MESH_LOADED, VAR_SCROLL_ENABLED};

/// A value crossing the host variable protocol.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HostValue {
    Bool(bool),
    Number(f64),
}

impl HostValue {
    /// Truthiness as the host player sees it: non-zero numbers are true.
    pub fn as_bool(&self) -> bool {
        match *self {
            HostValue::Bool(b) => b,
            HostValue::Number(n) => n != 0.0 && !n.is_nan(),
        }
    }
}

/// The hosting player's variable store.
pub trait Player {
    fn get_var(&self, name: &str) -> Option<HostValue>;
    fn set_var(&self, name: &str, value: HostValue);
}

/// Flags read from the host once per frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HostFlags {
    pub auto_animate: bool,
    pub scroll_enabled: bool,
}

impl Default for HostFlags {
    fn default() -> Self {
        Self {
            auto_animate: true,
            scroll_enabled: true,
        }
    }
}

/// Bridge between the scene and the hosting player.
///
/// Built without a player (standalone/testing), every read returns the
/// defaults and every write is dropped.
pub struct HostBridge {
    player: Option<Box<dyn Player>>,
    flags: HostFlags,
}

impl HostBridge {
    pub fn new(player: Box<dyn Player>) -> Self {
        Self {
            player: Some(player),
            flags: HostFlags::default(),
        }
    }

    pub fn standalone() -> Self {
        Self {
            player: None,
            flags: HostFlags::default(),
        }
    }

    #[inline]
    pub fn is_standalone(&self) -> bool {
        self.player.is_none()
    }

    /// Last flags read by `poll_flags`.
    #[inline]
    pub fn flags(&self) -> HostFlags {
        self.flags
    }

    /// Re-read both flags from this frame's values only. A missing variable
    /// reads as false; the defaults apply only without a player.
    pub fn poll_flags(&mut self) -> HostFlags {
        if let Some(player) = &self.player {
            let read = |name: &str| player.get_var(name).is_some_and(|v| v.as_bool());
            self.flags = HostFlags {
                auto_animate: read(VAR_AUTO_ANIMATE),
                scroll_enabled: read(VAR_SCROLL_ENABLED),
            };
        }
        self.flags
    }

    /// Push the signals that fired this frame; absent ones are not sent.
    pub fn publish_progress(&self, progress: &ProgressSignals) {
        let Some(player) = &self.player else {
            return;
        };
        for (index, value) in progress.iter() {
            player.set_var(
                &ProgressSignals::var_name(index),
                HostValue::Number(value as f64),
            );
        }
    }

    pub fn mark_loaded(&self) {
        if let Some(player) = &self.player {
            player.set_var(VAR_MESH_LOADED, HostValue::Bool(true));
        }
        log::info!("[host] meshLoaded");
    }
}
