//! Configuration for the window persistence engine.
//!
//! All fields have defaults, so an empty RON document `()` or a missing file
//! yields [`ManagerCfg::default`]. Example:
//!
//! ```ron
//! (
//!     debounce_ms: 500,
//!     snap_tolerance: 12,
//!     store: (dir: "/var/lib/myapp"),
//! )
//! ```

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use ron::{Options, extensions::Extensions};
use serde::{Deserialize, Serialize};
use tracing::debug;
use winkeep_geom::{BoundsReconciler, Limits, SnapDetector};

mod error;

pub use error::Error;

/// Where the two JSON store files live.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreCfg {
    /// Directory holding the store files; relative names resolve against the
    /// caller's base directory when unset.
    pub dir: Option<PathBuf>,
    /// File name of the per-window state store.
    pub state_file: String,
    /// File name of the registry store.
    pub registry_file: String,
}

impl Default for StoreCfg {
    fn default() -> Self {
        Self {
            dir: None,
            state_file: "window-state.json".to_string(),
            registry_file: "window-registry.json".to_string(),
        }
    }
}

impl StoreCfg {
    /// Directory holding both files.
    fn root(&self, base: &Path) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| base.to_path_buf())
    }

    /// Full path of the state store.
    pub fn state_path(&self, base: &Path) -> PathBuf {
        self.root(base).join(&self.state_file)
    }

    /// Full path of the registry store.
    pub fn registry_path(&self, base: &Path) -> PathBuf {
        self.root(base).join(&self.registry_file)
    }
}

/// Tunables for the window manager.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerCfg {
    /// Quiet period after the last move/resize before geometry is saved.
    pub debounce_ms: u64,
    /// Pixel tolerance for approximate snap detection.
    pub snap_tolerance: i32,
    /// Delay between a focus rank update and re-asserting the stack.
    pub focus_enforce_delay_ms: u64,
    /// Delay after focus or restore before re-asserting the stack.
    pub restore_enforce_delay_ms: u64,
    /// Spacing between successive focus calls when re-ranking.
    pub focus_stagger_ms: u64,
    /// Offset of the creation placeholder from the work-area origin.
    pub placeholder_offset: i32,
    /// Width of a new window with no requested size.
    pub default_width: i32,
    /// Height of a new window with no requested size.
    pub default_height: i32,
    /// Smallest width given to a new window.
    pub min_width: i32,
    /// Smallest height given to a new window.
    pub min_height: i32,
    /// Store file locations.
    pub store: StoreCfg,
}

impl Default for ManagerCfg {
    fn default() -> Self {
        let limits = Limits::default();
        Self {
            debounce_ms: 1000,
            snap_tolerance: winkeep_geom::DEFAULT_SNAP_TOLERANCE,
            focus_enforce_delay_ms: 50,
            restore_enforce_delay_ms: 100,
            focus_stagger_ms: 50,
            placeholder_offset: limits.placeholder_offset,
            default_width: limits.default_width,
            default_height: limits.default_height,
            min_width: limits.min_width,
            min_height: limits.min_height,
            store: StoreCfg::default(),
        }
    }
}

impl ManagerCfg {
    /// Parse a configuration from RON text. `Option` fields may be written
    /// without `Some(..)`.
    pub fn from_ron(text: &str) -> Result<Self, Error> {
        Self::parse(text, None)
    }

    /// Parse RON, attributing errors to `path`.
    fn parse(text: &str, path: Option<&Path>) -> Result<Self, Error> {
        let options = Options::default().with_default_extension(Extensions::IMPLICIT_SOME);
        options.from_str(text).map_err(|e| Error::Parse {
            path: path.map(Path::to_path_buf),
            message: e.to_string(),
        })
    }

    /// Load a configuration file. A missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self, Error> {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(&text, Some(path)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file; using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(Error::Read {
                path: Some(path.to_path_buf()),
                message: e.to_string(),
            }),
        }
    }

    /// Debounce for drags and resizes.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Delay between a focus rank update and the restack.
    pub fn focus_enforce_delay(&self) -> Duration {
        Duration::from_millis(self.focus_enforce_delay_ms)
    }

    /// Delay after focus or restore before the restack.
    pub fn restore_enforce_delay(&self) -> Duration {
        Duration::from_millis(self.restore_enforce_delay_ms)
    }

    /// Spacing of staggered focus calls.
    pub fn focus_stagger(&self) -> Duration {
        Duration::from_millis(self.focus_stagger_ms)
    }

    /// Geometry limits for bounds reconciliation.
    pub fn limits(&self) -> Limits {
        Limits {
            default_width: self.default_width,
            default_height: self.default_height,
            min_width: self.min_width,
            min_height: self.min_height,
            placeholder_offset: self.placeholder_offset,
            ..Limits::default()
        }
    }

    /// Detector with the configured tolerance.
    pub fn snap_detector(&self) -> SnapDetector {
        SnapDetector::new(self.snap_tolerance.max(0))
    }

    /// Reconciler with the configured limits.
    pub fn reconciler(&self) -> BoundsReconciler {
        BoundsReconciler::new(self.limits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(ManagerCfg::from_ron("()").unwrap(), ManagerCfg::default());
    }

    #[test]
    fn partial_document_overrides_fields() {
        let cfg = ManagerCfg::from_ron(
            r#"(debounce_ms: 250, min_width: 320, store: (dir: "/tmp/wk", state_file: "s.json"))"#,
        )
        .unwrap();
        assert_eq!(cfg.debounce(), Duration::from_millis(250));
        assert_eq!(cfg.limits().min_width, 320);
        assert_eq!(cfg.snap_tolerance, 10);
        let base = Path::new("/ignored");
        assert_eq!(cfg.store.state_path(base), PathBuf::from("/tmp/wk/s.json"));
        assert_eq!(
            cfg.store.registry_path(base),
            PathBuf::from("/tmp/wk/window-registry.json")
        );
    }

    #[test]
    fn store_paths_default_to_base_dir() {
        let cfg = ManagerCfg::default();
        assert_eq!(
            cfg.store.state_path(Path::new("/data")),
            PathBuf::from("/data/window-state.json")
        );
    }

    #[test]
    fn parse_errors_carry_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("winkeep.ron");
        fs::write(&path, "(debounce_ms: \"soon\")").unwrap();
        let err = ManagerCfg::load_from_path(&path).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert_eq!(err.path(), Some(&path));
        assert!(err.pretty().contains("winkeep.ron"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ManagerCfg::load_from_path(&dir.path().join("absent.ron")).unwrap();
        assert_eq!(cfg, ManagerCfg::default());
    }
}
