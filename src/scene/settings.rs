//! Scene Settings
//!
//! Runtime knobs for [`Scene`](crate::scene::Scene). They are plain data with
//! serde support so tools can keep them next to other project configuration.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use arbor::scene::{HookFailurePolicy, Scene, SceneSettings};
//!
//! let settings = SceneSettings {
//!     hook_failure: HookFailurePolicy::Continue,
//!     ..Default::default()
//! };
//! let scene = Scene::with_settings(settings);
//! ```

use serde::{Deserialize, Serialize};

/// What the traversal does with a node whose component or modifier hook
/// returned an error. The failure is logged in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookFailurePolicy {
    /// The node and its whole subtree keep last frame's transforms and
    /// boxes. Sibling subtrees update normally, and the node's stale box
    /// still feeds its parent's union.
    #[default]
    SkipSubtree,

    /// The node's remaining hooks are skipped for this frame (a failing
    /// modifier also skips every component), but its transform, bounds and
    /// children update normally.
    Continue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    pub hook_failure: HookFailurePolicy,
    /// Log tracked lights/cameras that the update does not reach. Each node
    /// is reported once until it gets attached.
    pub warn_unattached: bool,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            hook_failure: HookFailurePolicy::SkipSubtree,
            warn_unattached: true,
        }
    }
}
