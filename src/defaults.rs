use chrono_tz::Tz;

pub const DEFAULT_CANVAS_WIDTH: u32 = 1000;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 400;
/// Taller canvas used when the legend is drawn.
pub const DEFAULT_LEGEND_CANVAS_HEIGHT: u32 = 500;
pub const DEFAULT_MARGIN: u32 = 50;
pub const DEFAULT_ROW_HEIGHT: u32 = 20;
pub const DEFAULT_ROW_SPACING: u32 = 50;

/// Zone for axis ticks and time labels; `TIMELINE_TIMEZONE` overrides it.
pub const DEFAULT_ZONE: Tz = chrono_tz::America::Denver;
pub const DEFAULT_OUTPUT_DIR: &str = ".";
