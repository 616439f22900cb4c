// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display and platform directories)
pub const APP_NAME: &str = "Canvass";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "canvass";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".canvass";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "canvass.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "CANVASS_CONFIG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "CANVASS_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "CANVASS_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "CANVASS_LOG";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 8000;

/// Maximum request body size for JSON endpoints (1 MB)
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

// =============================================================================
// Environment Variables - Storage
// =============================================================================

/// Environment variable to override data directory
pub const ENV_DATA_DIR: &str = "CANVASS_DATA_DIR";

// =============================================================================
// Secrets
// =============================================================================

/// Environment variable holding a hex-encoded JWT signing key
pub const ENV_JWT_SECRET: &str = "CANVASS_JWT_SECRET";

/// File name of the local secret vault inside the data directory
pub const SECRETS_FILENAME: &str = "secrets.json";

/// Vault key for the JWT signing key
pub const SECRET_KEY_JWT_SIGNING: &str = "jwt_signing_key";

// =============================================================================
// Authentication
// =============================================================================

/// Environment variable for access token lifetime (minutes)
pub const ENV_ACCESS_TOKEN_MINUTES: &str = "CANVASS_ACCESS_TOKEN_MINUTES";

/// Environment variable for refresh token lifetime (days)
pub const ENV_REFRESH_TOKEN_DAYS: &str = "CANVASS_REFRESH_TOKEN_DAYS";

/// Environment variable for the password given to users created without one
pub const ENV_DEFAULT_PASSWORD: &str = "CANVASS_DEFAULT_PASSWORD";

/// Default access token lifetime (minutes)
pub const DEFAULT_ACCESS_TOKEN_MINUTES: u32 = 60;

/// Default refresh token lifetime (days)
pub const DEFAULT_REFRESH_TOKEN_DAYS: u32 = 7;

/// Longest accepted access token lifetime (one year, in minutes)
pub const MAX_ACCESS_TOKEN_MINUTES: u32 = 525_600;

/// Longest accepted refresh token lifetime (ten years)
pub const MAX_REFRESH_TOKEN_DAYS: u32 = 3650;

/// Password assigned to users created from the admin console
pub const DEFAULT_USER_PASSWORD: &str = "defaultpassword123";

// =============================================================================
// Dashboard
// =============================================================================

/// Default number of activity items
pub const DEFAULT_ACTIVITY_LIMIT: i64 = 10;

/// Maximum number of activity items per request
pub const MAX_ACTIVITY_LIMIT: i64 = 100;

// =============================================================================
// SQLite
// =============================================================================

/// SQLite database filename
pub const SQLITE_DB_FILENAME: &str = "canvass.db";

/// Maximum connections in the SQLite pool
pub const SQLITE_MAX_CONNECTIONS: u32 = 5;

/// Busy timeout for locked database (seconds)
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 30;

/// Page cache size (negative = KiB)
pub const SQLITE_CACHE_SIZE: &str = "-64000";

/// Pages between automatic WAL checkpoints
pub const SQLITE_WAL_AUTOCHECKPOINT: &str = "1000";

/// Interval for the background WAL checkpoint task (seconds)
pub const SQLITE_CHECKPOINT_INTERVAL_SECS: u64 = 300;

// =============================================================================
// Shutdown
// =============================================================================

/// Maximum time to wait for background tasks on shutdown (seconds)
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 30;
