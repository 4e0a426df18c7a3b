mod settings;

pub use settings::{Config, DEFAULT_PROFILE_CACHE_TTL};
