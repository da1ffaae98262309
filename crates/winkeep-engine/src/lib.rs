//! winkeep-engine
//!
//! Keeps application windows where the user left them:
//! - saves geometry on a debounce, or at once for discrete and snapped changes
//! - restores saved geometry when windows are recreated, recomputing OS grid
//!   layouts when the work area changed
//! - maintains a two-tier stacking order (manual bands over focus recency)
//!
//! The toolkit is abstracted behind [`WindowHost`] and [`WindowHandle`];
//! everything else is driven through [`WindowManager`].

mod error;
mod host;
mod manager;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
mod report;
mod scheduler;
mod stack;
mod ticker;

pub use error::{Error, Result};
pub use host::{CreateOptions, WindowEvent, WindowHandle, WindowHost};
pub use manager::{Notice, WindowManager, WindowOptions, cascade_origin};
#[cfg(any(test, feature = "test-utils"))]
pub use mock::{MockHost, MockWindow};
pub use report::{DisplaySummary, RelativePosition, WindowFlags, WindowSummary, ZOrderInfo};
pub use scheduler::{Cadence, PersistenceScheduler, cadence_for};
pub use stack::{
    MANUAL_DEFAULT, MANUAL_MAX, MANUAL_MIN, Priority, StackOrderController, normalize_manual,
};
pub use ticker::Ticker;
