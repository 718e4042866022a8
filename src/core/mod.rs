pub mod dispatcher;
pub mod error;
pub mod escape_time;
pub mod gradient;
pub mod raster;
pub mod stopwatch;
pub mod tile;
pub mod viewport;
