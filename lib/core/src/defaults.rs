//! Named defaults shared across the workspace.

/// Real-world width of a generated canvas box, in meters.
pub const DEFAULT_WIDTH_METERS: f32 = 0.6;

/// Depth of a generated canvas box, in meters.
pub const DEFAULT_THICKNESS_METERS: f32 = 0.01;

/// Number of recommendations returned when the caller does not ask for a count.
pub const DEFAULT_TOP_N: usize = 6;

/// Display name used when an artwork is created without one.
pub const DEFAULT_NAME: &str = "Untitled Artwork";
