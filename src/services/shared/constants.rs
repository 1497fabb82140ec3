pub const NOT_AVAILABLE: &str = "N/A";

pub const DEFAULT_NAV_CONFIG_PATH: &str = "public/nav.json";
pub const DEFAULT_OUT_DIR: &str = "public/data";
pub const DEFAULT_ERROR_ARTIFACT_DIR: &str = "errors";

pub const DEFAULT_FETCH_DELAY_MS: u64 = 1000;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 45;
// KST, the timezone the published data is read in
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 9;

// days of slack before the oldest unpriced (or newest stored) ex-date on incremental fetches
pub const INCREMENTAL_FETCH_SLACK_DAYS: i64 = 7;
// closes fetched on either side of an ex-date when pricing a scraped record
pub const PRICE_LOOKUP_WINDOW_DAYS: i64 = 10;

pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
