pub mod assess;
pub mod fetch;
pub mod map_loader;
pub mod params;
pub mod run;
pub mod run_log;
pub mod stats;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
