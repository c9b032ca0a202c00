pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::ChainwatchError;
pub use types::{
    event_id, Assessment, Event, GeoPoint, MapEntry, Query, RiskCategory, DEFAULT_COUNT,
    DEFAULT_TOPIC, DEFAULT_WINDOW_DAYS,
};
