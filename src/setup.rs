use env_logger::Builder;
use log::LevelFilter;

/// Init the logger, `RUST_LOG` overrides the default `Info` level.
/// Round by round traces are logged at the `Debug` level.
pub fn init() {
    logger(LevelFilter::Info).init();
}

/// Init the logger if no logger is set yet, used by tests and demos
pub fn try_init(level: LevelFilter) -> bool {
    logger(level).try_init().is_ok()
}

fn logger(level: LevelFilter) -> Builder {
    let mut builder = Builder::new();
    builder.filter(None, level).parse_env("RUST_LOG");
    builder
}
