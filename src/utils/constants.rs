//! Shared configuration constants for channelscout
//!
//! This module contains default values and configuration constants used
//! throughout the codebase to ensure consistency and avoid magic numbers.

/// Hosts a discovered link may point at.
///
/// Compared verbatim against the host reported by the `url` parser, which
/// lowercases registrable domains. Anything else is rejected by the sanitizer.
pub const ALLOWED_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "youtu.be",
];

/// Platforms whose store rows can be turned into work items
pub const ALLOWED_PLATFORMS: &[&str] = &["youtube"];

/// Watch URL prefix used to build a content URL from a platform reference
pub const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Channel URL prefix used when the store already knows an author's channel id
pub const CHANNEL_URL_PREFIX: &str = "https://www.youtube.com/channel/";

/// Suffix appended to a channel URL to reach its upload listing
pub const CHANNEL_LISTING_SUFFIX: &str = "/videos";

/// Anchor linking a watch page to its author's channel.
///
/// Tied to the site's markup at time of writing.
pub const CHANNEL_ANCHOR_SELECTOR: &str = "ytd-video-owner-renderer ytd-channel-name #text > a";

/// Thumbnail anchors on a channel's upload listing
pub const THUMBNAIL_ANCHOR_SELECTOR: &str = "a#thumbnail";

/// Default position of the newest upload among matched thumbnails.
///
/// The listing reserved the leading slots for pinned and featured content
/// when this was calibrated. Recalibrate through config if the layout moves.
pub const DEFAULT_THUMBNAIL_OFFSET: usize = 2;

/// Default minimum number of thumbnails a listing must show
pub const DEFAULT_THUMBNAIL_MIN_COUNT: usize = 3;

/// Navigation attempts per target before it is given up
pub const MAX_NAVIGATION_ATTEMPTS: u8 = 3;

/// Runs that may end with a checkpointed channel still unreachable before
/// its rows are given up
pub const MAX_LISTING_ATTEMPTS: u32 = 3;

/// Factor applied to the wait after every failed attempt and to the redirect settle wait
pub const RETRY_DELAY_MULTIPLIER: f64 = 1.1;

/// URL length that maps to one full minute of delay
pub const DELAY_URL_LENGTH_UNIT: f64 = 200.0;

/// Seconds of delay per `DELAY_URL_LENGTH_UNIT` characters
pub const DELAY_SECONDS_PER_UNIT: f64 = 60.0;

/// Minimum wall-clock time spent on one robots.txt fetch-and-parse attempt
pub const DEFAULT_ROBOTS_FETCH_FLOOR_MS: u64 = 1_000;

/// Timeout for the robots.txt HTTP request itself
pub const ROBOTS_REQUEST_TIMEOUT_SECS: u64 = 10;

/// How far back the store is searched for unprocessed content
pub const DEFAULT_LOOKBACK_DAYS: u32 = 14;

/// Default page navigation timeout
pub const DEFAULT_PAGE_LOAD_TIMEOUT_SECS: u64 = 30;

/// File name of the phase-one checkpoint inside the cache directory
pub const CHECKPOINT_FILE_NAME: &str = "phase_one.checkpoint.json";

/// Subdirectory of the cache dir holding browser profiles
pub const PROFILES_DIR_NAME: &str = "profiles";

/// Binary names tried on `PATH` when no browser is configured
pub const BROWSER_BINARY_NAMES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
];

/// Directory under the user cache dir holding a downloaded Chromium
pub const MANAGED_BROWSER_DIR: &str = "kodegen_channelscout/chromium";

/// Prefix for temporary Chrome profile directories
pub const PROFILE_DIR_PREFIX: &str = "kodegen_channelscout_chrome";

/// Fallback user agent when the user-agent file yields nothing usable
///
/// Updated: 2025-01-29 to Chrome 132 (current stable)
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";
