mod imprint;
pub(crate) mod settings;

pub use imprint::write_header;
pub use settings::{Configuration, DiisConfig, LoopConfig};
