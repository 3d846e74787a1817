//! Shared application-wide constants.
//! Centralizes tweakable values used by placement, rendering and networking.

use std::time::Duration;

// Placement
/// Horizontal nudge (in window pixels) applied to earlier occupants each time
/// another piece lands on the same location.
pub const OCCUPANT_OFFSET: f32 = 15.0;

// Layout text
/// Multiplier applied to a label's `font-size` (in px) before scaling by the
/// layout ratio.
pub const LABEL_FONT_SCALE: f32 = 2.5;
/// Font size used for labels that carry no `font-size` style.
pub const DEFAULT_LABEL_FONT_SIZE: f32 = 4.0;

// Update loop
/// Interval between update ticks when no input arrives.
pub const TICK_INTERVAL: Duration = Duration::from_millis(16);

// Networking
/// Default address the client connects to.
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:7878";
/// Pause between reconnect attempts after the transport drops.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(2);
/// Capacity of the server's snapshot broadcast channel.
pub const BROADCAST_CAPACITY: usize = 64;

// Window
/// Initial window size in logical points.
pub const DEFAULT_WINDOW_SIZE: (f32, f32) = (1024.0, 768.0);
