pub mod app;
pub mod logging;
pub mod output;
pub mod scenario_loader;
pub mod ticker;
