//! Application-level configuration constants.

// Endpoints
pub const PP_REQUEST_PATH: &str = "/pp_request";
pub const PP_CHECK_PATH: &str = "/pp_check";
pub const SIMULATE_PATH: &str = "/simulate";
pub const PROFILE_PATH: &str = "/pp";

// Polling
pub const POLL_INTERVAL_MS: u32 = 2000;

// UI Behavior
pub const TOAST_TIMEOUT_MS: u32 = 5000;

// Placeholders for input fields
pub const BEATMAP_PLACEHOLDER: &str = "https://osu.ppy.sh/b/129891 or 129891";
pub const MODS_PLACEHOLDER: &str = "HD,HR";
