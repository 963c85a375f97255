//! Engine configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Treat exhaustion of the right child as an operator failure. When false,
    /// running out of right tiles ends the stream the same way the left side does.
    pub strict_right_exhaustion: bool,

    /// Check that every input tile is sorted on its join keys before merging.
    pub verify_sorted_inputs: bool,

    /// Initial capacity reserved for each output position list.
    pub position_list_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_right_exhaustion: true,
            verify_sorted_inputs: false,
            position_list_capacity: 1024,
        }
    }
}

impl EngineConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `TILEMERGE_STRICT_RIGHT_EXHAUSTION`: `true`/`false`
    /// - `TILEMERGE_VERIFY_SORTED`: `true`/`false`
    /// - `TILEMERGE_POSITION_LIST_CAPACITY`: rows reserved per output list
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("TILEMERGE_STRICT_RIGHT_EXHAUSTION") {
            if let Ok(v) = s.parse::<bool>() {
                cfg.strict_right_exhaustion = v;
            }
        }

        if let Ok(s) = std::env::var("TILEMERGE_VERIFY_SORTED") {
            if let Ok(v) = s.parse::<bool>() {
                cfg.verify_sorted_inputs = v;
            }
        }

        if let Ok(s) = std::env::var("TILEMERGE_POSITION_LIST_CAPACITY") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.position_list_capacity = v;
            }
        }

        cfg
    }
}
