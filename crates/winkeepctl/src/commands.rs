//! Implementations of the winkeepctl subcommands.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use serde_json::{Value, json};
use tracing::{debug, warn};
use winkeep_config::ManagerCfg;
use winkeep_geom::{BoundsRequest, Display, RestorePlan};
use winkeep_store::{
    COUNTER_KEY, JsonFileStore, KvStore, KvStoreExt, LEGACY_LIST_KEY, REGISTRY_KEY,
    WindowRegistry, WindowState, cleanup_orphaned_states,
};

use crate::{
    cli::{DetectArgs, DisplayArgs, PlanArgs},
    error::{Error, Result},
};

/// Resolved configuration and store locations shared by all commands.
pub struct Context {
    /// Loaded configuration.
    pub cfg: ManagerCfg,
    /// Window state store file.
    pub state_path: PathBuf,
    /// Registry store file.
    pub registry_path: PathBuf,
    /// Emit JSON instead of text.
    pub json: bool,
}

impl Context {
    /// Load `config` (defaults when absent) and resolve store paths against
    /// `dir`, then the config's `store.dir`, then the current directory.
    pub fn load(dir: Option<&Path>, config: Option<&Path>, json: bool) -> Result<Self> {
        let cfg = match config {
            Some(path) => ManagerCfg::load_from_path(path)?,
            None => ManagerCfg::default(),
        };
        let mut store = cfg.store.clone();
        if let Some(dir) = dir {
            store.dir = Some(dir.to_path_buf());
        }
        let base = Path::new(".");
        let ctx = Self {
            state_path: store.state_path(base),
            registry_path: store.registry_path(base),
            cfg,
            json,
        };
        debug!(
            state = %ctx.state_path.display(),
            registry = %ctx.registry_path.display(),
            "resolved store paths"
        );
        Ok(ctx)
    }

    /// Open the state store.
    fn states(&self) -> Result<JsonFileStore> {
        Ok(JsonFileStore::open(&self.state_path)?)
    }

    /// Open the registry.
    fn registry(&self) -> Result<WindowRegistry> {
        let store = JsonFileStore::open(&self.registry_path)?;
        Ok(WindowRegistry::new(Arc::new(store)))
    }

    /// Print `value` as JSON, or the text rendering.
    fn emit(&self, value: &Value, text: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }
}

/// True for registry and counter keys kept alongside states.
fn is_bookkeeping(key: &str) -> bool {
    [REGISTRY_KEY, COUNTER_KEY, LEGACY_LIST_KEY].contains(&key)
}

/// Primary display described by `args`.
fn display_from(args: &DisplayArgs) -> Display {
    Display::new(
        args.display_id,
        args.display_bounds.unwrap_or(args.work_area),
        args.work_area,
    )
    .primary()
}

/// One-line text rendering of a saved state.
fn describe_state(id: &str, s: &WindowState) -> String {
    let mut line = match s.bounds() {
        Some(b) => format!("{id:<12} {},{} {}x{}", b.x, b.y, b.width, b.height),
        None => format!("{id:<12} (no bounds)"),
    };
    if let Some(d) = s.display_id {
        line.push_str(&format!("  display={d}"));
    }
    if let Some(t) = s.snap_type {
        line.push_str(&format!("  snap={t}"));
    }
    if s.is_maximized {
        line.push_str("  maximized");
    }
    if s.is_full_screen {
        line.push_str("  fullscreen");
    }
    if s.is_always_on_top {
        line.push_str("  on-top");
    }
    line
}

/// `list`: every saved window state.
pub fn list(ctx: &Context) -> Result<()> {
    let states = ctx.states()?;
    let mut out = serde_json::Map::new();
    let mut lines = Vec::new();
    for key in states.keys()? {
        if is_bookkeeping(&key) {
            continue;
        }
        match states.get_as::<WindowState>(&key) {
            Ok(Some(state)) => {
                lines.push(describe_state(&key, &state));
                out.insert(key, serde_json::to_value(&state)?);
            }
            Ok(None) => {}
            Err(e) => warn!(key = %key, error = %e, "skipping unreadable entry"),
        }
    }
    ctx.emit(&Value::Object(out), || {
        if lines.is_empty() {
            "no saved windows".to_string()
        } else {
            lines.join("\n")
        }
    })
}

/// `registry`: registered windows and their metadata.
pub fn registry(ctx: &Context) -> Result<()> {
    let map = ctx.registry()?.all()?;
    let text = || {
        map.values()
            .map(|m| {
                let mut line = format!("{:<12} {:?}", m.id, m.title);
                if m.is_main {
                    line.push_str("  main");
                }
                if let Some(band) = m.manual_z_order {
                    line.push_str(&format!("  band={band}"));
                }
                if let Some(at) = &m.registered_at {
                    line.push_str(&format!("  registered={at}"));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    ctx.emit(&serde_json::to_value(&map)?, text)
}

/// `detect`: classify bounds on a described display.
pub fn detect(ctx: &Context, args: &DetectArgs) -> Result<()> {
    let display = display_from(&args.display);
    let detector = ctx.cfg.snap_detector();
    let info = detector.detect(&args.bounds, &display);
    let native = detector.is_native_snap(&args.bounds, &display);
    let value = json!({
        "isSnapped": info.is_snapped,
        "snapType": info.snap_type,
        "isThirdParty": info.is_third_party,
        "nativeSnap": native,
        "workArea": info.work_area,
    });
    ctx.emit(&value, || match info.snap_type {
        Some(t) if native => format!("{t} (native grid)"),
        Some(t) => format!("{t}"),
        None => "not snapped".to_string(),
    })
}

/// JSON and text renderings of a restore plan.
fn describe_plan(plan: &RestorePlan) -> (Value, String) {
    match *plan {
        RestorePlan::Maximize => (json!({"action": "maximize"}), "maximize".to_string()),
        RestorePlan::FullScreen => (
            json!({"action": "fullScreen"}),
            "enter fullscreen".to_string(),
        ),
        RestorePlan::Exact(r) => (
            json!({"action": "exact", "bounds": r}),
            format!("exact {},{} {}x{}", r.x, r.y, r.width, r.height),
        ),
        RestorePlan::Recomputed { rect, snap_type } => (
            json!({"action": "recomputed", "bounds": rect, "snapType": snap_type}),
            format!(
                "recompute {snap_type}: {},{} {}x{}",
                rect.x, rect.y, rect.width, rect.height
            ),
        ),
        RestorePlan::Nothing => (json!({"action": "none"}), "nothing to restore".to_string()),
    }
}

/// `plan`: how a saved window would come back on a described display.
pub fn plan(ctx: &Context, args: &PlanArgs) -> Result<()> {
    let states = ctx.states()?;
    let state = states
        .get_as::<WindowState>(&args.id)?
        .ok_or_else(|| Error::UnknownWindow(args.id.clone()))?;
    let saved = state.geometry();
    let displays = [display_from(&args.display)];
    let reconciler = ctx.cfg.reconciler();
    let placeholder = reconciler.initial_bounds(Some(&saved), &BoundsRequest::default(), &displays);
    let plan = reconciler.restore_plan(&saved, &displays);
    let (mut value, text) = describe_plan(&plan);
    value["placeholder"] = json!(placeholder);
    ctx.emit(&value, || {
        format!(
            "placeholder {},{} {}x{}\nthen {text}",
            placeholder.x, placeholder.y, placeholder.width, placeholder.height
        )
    })
}

/// `cleanup`: delete states of unregistered windows.
pub fn cleanup(ctx: &Context) -> Result<()> {
    let states = ctx.states()?;
    let registry = ctx.registry()?;
    let removed = cleanup_orphaned_states(&states, &registry)?;
    ctx.emit(&json!(removed), || {
        if removed.is_empty() {
            "nothing to clean up".to_string()
        } else {
            format!("removed {}", removed.join(", "))
        }
    })
}

/// `stats`: registry counts.
pub fn stats(ctx: &Context) -> Result<()> {
    let stats = ctx.registry()?.stats(0)?;
    ctx.emit(&serde_json::to_value(&stats)?, || {
        format!(
            "registered {} (main {}, regular {}), next id {}",
            stats.registered, stats.main, stats.regular, stats.next_id
        )
    })
}

#[cfg(test)]
mod tests {
    use winkeep_geom::{Rect, SnapType};
    use winkeep_ids::WindowId;
    use winkeep_store::WindowMetadata;

    use super::*;

    fn context(dir: &Path) -> Context {
        Context::load(Some(dir), None, true).unwrap()
    }

    fn seed(ctx: &Context) {
        let states = ctx.states().unwrap();
        let mut s = WindowState::default();
        s.set_bounds(Rect::new(0, 0, 960, 1040));
        s.display_id = Some(1);
        s.is_snapped = true;
        s.snap_type = Some(SnapType::LeftHalf);
        s.work_area = Some(Rect::new(0, 0, 1920, 1040));
        states.set_as("win1", &s).unwrap();
        states.set_as("win9", &WindowState::default()).unwrap();

        let registry = ctx.registry().unwrap();
        let id = WindowId::new("win1");
        registry
            .register(&id, WindowMetadata::new(id.clone(), "Notes"))
            .unwrap();
    }

    #[test]
    fn paths_follow_dir_override() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        assert_eq!(ctx.state_path, dir.path().join("window-state.json"));
        assert_eq!(ctx.registry_path, dir.path().join("window-registry.json"));
    }

    #[test]
    fn cleanup_deletes_only_orphans() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        seed(&ctx);
        cleanup(&ctx).unwrap();
        let states = ctx.states().unwrap();
        assert!(states.get("win1").unwrap().is_some());
        assert!(states.get("win9").unwrap().is_none());
    }

    #[test]
    fn plan_reports_unknown_window() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let args = PlanArgs {
            id: "win4".into(),
            display: DisplayArgs {
                work_area: Rect::new(0, 0, 1920, 1040),
                display_bounds: None,
                display_id: 1,
            },
        };
        assert!(matches!(plan(&ctx, &args), Err(Error::UnknownWindow(id)) if id == "win4"));
    }

    #[test]
    fn recomputed_plan_is_described() {
        let (value, text) = describe_plan(&RestorePlan::Recomputed {
            rect: Rect::new(0, 0, 960, 1000),
            snap_type: SnapType::LeftHalf,
        });
        assert_eq!(value["action"], "recomputed");
        assert_eq!(value["snapType"], "left-half");
        assert_eq!(text, "recompute left-half: 0,0 960x1000");
    }

    #[test]
    fn state_lines_mention_layout() {
        let mut s = WindowState::default();
        s.set_bounds(Rect::new(10, 20, 300, 200));
        s.is_maximized = true;
        let line = describe_state("win2", &s);
        assert!(line.contains("10,20 300x200"));
        assert!(line.contains("maximized"));
    }
}
