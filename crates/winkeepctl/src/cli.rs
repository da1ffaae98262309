//! Command-line interface definitions for winkeepctl.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use logging::LogArgs;
use winkeep_geom::{DisplayId, Rect};

/// Command-line interface for the `winkeepctl` binary.
#[derive(Parser, Debug)]
#[command(
    name = "winkeepctl",
    about = "Inspect and maintain winkeep window-state stores",
    version
)]
pub struct Cli {
    /// Logging controls shared across winkeep binaries.
    #[command(flatten)]
    pub log: LogArgs,

    /// Directory holding the store files. Overrides the config's `store.dir`.
    #[arg(long, global = true, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Manager configuration file (RON).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Emit JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List saved window states.
    List,
    /// Show the window registry.
    Registry,
    /// Classify bounds against a work area.
    Detect(DetectArgs),
    /// Show how a saved window would be restored on a given display.
    Plan(PlanArgs),
    /// Delete saved states of windows that are no longer registered.
    Cleanup,
    /// Registry counts and the next window id.
    Stats,
}

/// A display described on the command line.
#[derive(Args, Debug, Clone)]
pub struct DisplayArgs {
    /// Work area as `x,y,width,height`.
    #[arg(long, value_parser = parse_rect, value_name = "RECT")]
    pub work_area: Rect,

    /// Full display bounds as `x,y,width,height`; defaults to the work area.
    #[arg(long, value_parser = parse_rect, value_name = "RECT")]
    pub display_bounds: Option<Rect>,

    /// Display id.
    #[arg(long, default_value_t = 1)]
    pub display_id: DisplayId,
}

/// Arguments for `detect`.
#[derive(Args, Debug, Clone)]
pub struct DetectArgs {
    /// Window bounds as `x,y,width,height`.
    #[arg(value_parser = parse_rect, value_name = "RECT")]
    pub bounds: Rect,

    /// Display the bounds are classified against.
    #[command(flatten)]
    pub display: DisplayArgs,
}

/// Arguments for `plan`.
#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    /// Window id.
    pub id: String,

    /// Display the window is restored onto.
    #[command(flatten)]
    pub display: DisplayArgs,
}

/// Parse `x,y,width,height`.
pub fn parse_rect(s: &str) -> Result<Rect, String> {
    let parts = s
        .split(',')
        .map(|p| {
            p.trim()
                .parse::<i32>()
                .map_err(|e| format!("invalid component {:?}: {e}", p.trim()))
        })
        .collect::<Result<Vec<i32>, String>>()?;
    match parts[..] {
        [x, y, width, height] => Ok(Rect::new(x, y, width, height)),
        _ => Err(format!("expected x,y,width,height, got {} values", parts.len())),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn rect_parsing() {
        assert_eq!(parse_rect("0, 0,960,1040"), Ok(Rect::new(0, 0, 960, 1040)));
        assert_eq!(parse_rect("-1920,0,1920,1080").map(|r| r.x), Ok(-1920));
        assert!(parse_rect("1,2,3").is_err());
        assert!(parse_rect("a,2,3,4").is_err());
    }

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn detect_parses_display_flags() {
        let cli = Cli::try_parse_from([
            "winkeepctl",
            "--json",
            "detect",
            "1200,0,600,960",
            "--work-area",
            "0,0,1800,960",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Detect(a) => {
                assert_eq!(a.bounds, Rect::new(1200, 0, 600, 960));
                assert_eq!(a.display.display_id, 1);
                assert!(a.display.display_bounds.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
