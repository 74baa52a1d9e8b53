use std::time::Duration;

/// How often every subscription is re-fetched.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Pass-through endpoint for feeds that reject direct cross-origin requests.
pub const DEFAULT_PROXY_URL: &str = "https://api.allorigins.win/raw";

pub const DEFAULT_USER_AGENT: &str = concat!("chaoscal/", env!("CARGO_PKG_VERSION"));

pub const PRODUCT_ID: &str = "-//ChaosCal//Brutalist Calendar//EN";

/// Domain appended to event ids in exported UID lines.
pub const UID_DOMAIN: &str = "chaoscal.app";

/// Display color given to new subscriptions.
pub const DEFAULT_SUBSCRIPTION_COLOR: &str = "#DFFF00";
