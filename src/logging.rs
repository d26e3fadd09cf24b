use tracing::Level;

pub fn init() {
    let builder = tracing_subscriber::fmt().with_max_level(Level::INFO);
    if cfg!(test) {
        builder.compact().try_init().ok();
    } else {
        builder.init();
    }
}
