pub(crate) mod logging;

pub use logging::init_tracing;
