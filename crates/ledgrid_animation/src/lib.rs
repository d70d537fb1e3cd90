//! LedGrid Animation Engine
//!
//! Time-based animation scheduling for LED panels. Animations write into
//! `SharedValue` cells owned by the drawing side; the controller updates all
//! of them on a fixed period and then asks the host to render and send the
//! frame.
//!
//! # Features
//!
//! - **Controller**: fixed-rate ticker, parallel update pass, global pause
//!   on a virtual clock
//! - **Tweens**: float, alpha, color, integer and fixed-point positions,
//!   paths and polygons, image frames, palettes and palette fades
//! - **Composites**: groups, sequences and timelines of tasks
//! - **Instant tasks**: callbacks, visibility and pause toggles
//! - **Shaders**: endless per-pixel palette animations
//! - **Value sources**: random targets for continuing tweens
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use ledgrid_animation::{AnimationController, ControllerConfig, FloatTween, Task};
//! use ledgrid_core::SharedValue;
//!
//! let ctrl = AnimationController::new(ControllerConfig::default())?;
//! ctrl.start_background()?;
//!
//! let brightness = SharedValue::new(0.0);
//! let fade = FloatTween::new(&ctrl, &brightness, 1.0, Duration::from_millis(500));
//! fade.set_auto_reverse(true);
//! fade.set_repeat_count(-1);
//! fade.start();
//! # Ok::<(), ledgrid_animation::AnimationError>(())
//! ```

pub mod clock;
pub mod config;
pub mod easing;
pub mod error;
pub mod group;
pub mod instant;
pub mod palette;
pub mod path;
pub mod scheduler;
pub mod sequence;
pub mod shader;
pub mod source;
pub mod task;
pub mod timeline;
pub mod tween;
pub mod values;

pub use clock::{ManualTime, MonotonicTime, TimeSource, Timestamp, VirtualClock};
pub use config::{ControllerConfig, DEFAULT_REFRESH_RATE_MS};
pub use easing::Curve;
pub use error::{AnimationError, ConfigError, Result};
pub use group::Group;
pub use instant::{BackgroundTask, PauseToggle, VisibilityToggle};
pub use palette::{PaletteFadeKind, PaletteFadeTween, PaletteFader, PaletteKind, PaletteTween};
pub use path::{PathFn, PolygonPath};
pub use scheduler::{AnimationController, ControllerHandle, FrameCallback, TickStats};
pub use sequence::Sequence;
pub use shader::{ShaderAnimation, ShaderFn};
pub use source::{
    BoxedSource, PaletteRef, RandAlpha, RandFloat, RandPalette, RandPoint, RandPointTrunc,
    RandSize, SeqPalette, ValueSource,
};
pub use task::{Animation, AnimationRef, Task, TaskRef};
pub use timeline::Timeline;
pub use tween::{TargetKind, Tween, TweenKind};
pub use values::{
    AlphaTween, ColorKind, ColorTween, FixedPosTween, FloatTween, ImageKind, ImageTween,
    IntPosTween, Interpolate, PathKind, PathTween, ValueKind,
};
