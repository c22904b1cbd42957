//! I/O operations for reading and writing vector layers

mod geojson_io;

pub use geojson_io::{read_geojson, read_geojson_str, to_geojson_string, write_geojson};
