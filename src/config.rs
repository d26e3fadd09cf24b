use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::env;
use std::time::Duration;

pub struct Config {
    inner: RwLock<InnerConfig>,
}

struct InnerConfig {
    database_url: String,
    server_port: String,
    serial_ports: Vec<String>,
    baud_rate: u32,
    record_delimiter: char,
    read_timeout_ms: u64,
    write_timeout_ms: u64,
    window_capacity: usize,
    backoff_initial_ms: u64,
    backoff_max_ms: u64,
}

impl Config {
    pub fn database_url(&self) -> String {
        let inner = self.inner.read();
        inner.database_url.clone()
    }

    pub fn server_port(&self) -> String {
        let inner = self.inner.read();
        inner.server_port.clone()
    }

    pub fn serial_ports(&self) -> Vec<String> {
        let inner = self.inner.read();
        inner.serial_ports.clone()
    }

    pub fn baud_rate(&self) -> u32 {
        self.inner.read().baud_rate
    }

    pub fn record_delimiter(&self) -> char {
        self.inner.read().record_delimiter
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.inner.read().read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.inner.read().write_timeout_ms)
    }

    pub fn window_capacity(&self) -> usize {
        self.inner.read().window_capacity
    }

    pub fn backoff_initial(&self) -> Duration {
        Duration::from_millis(self.inner.read().backoff_initial_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.inner.read().backoff_max_ms)
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv::dotenv().ok();

    let database_url = env_or("DATABASE_URL", "sqlite://data/sprout.db?mode=rwc");
    let server_port = env_or("SERVER_PORT", "3030");
    // GPIO UART paths are preferred over USB adapters
    let serial_ports: Vec<String> = env_or(
        "SERIAL_PORTS",
        "/dev/serial0,/dev/ttyAMA0,/dev/ttyAMA10,/dev/ttyACM0,/dev/ttyUSB0",
    )
    .split(',')
    .map(|s| s.trim().to_owned())
    .filter(|s| !s.is_empty())
    .collect();
    let baud_rate = env_or("BAUD_RATE", "115200")
        .parse()
        .expect("BAUD_RATE must be numeric");
    let record_delimiter = env_or("RECORD_DELIMITER", ":")
        .chars()
        .next()
        .expect("RECORD_DELIMITER must not be empty");
    let read_timeout_ms = env_or("SERIAL_READ_TIMEOUT_MS", "1000")
        .parse()
        .expect("SERIAL_READ_TIMEOUT_MS must be numeric");
    let write_timeout_ms = env_or("DB_WRITE_TIMEOUT_MS", "2000")
        .parse()
        .expect("DB_WRITE_TIMEOUT_MS must be numeric");
    let window_capacity = env_or("WINDOW_CAPACITY", "360")
        .parse()
        .expect("WINDOW_CAPACITY must be numeric");
    let backoff_initial_ms = env_or("BACKOFF_INITIAL_MS", "1000")
        .parse()
        .expect("BACKOFF_INITIAL_MS must be numeric");
    let backoff_max_ms = env_or("BACKOFF_MAX_MS", "60000")
        .parse()
        .expect("BACKOFF_MAX_MS must be numeric");

    if serial_ports.is_empty() {
        panic!("No serial port candidates provided");
    }

    Config {
        inner: RwLock::new(InnerConfig {
            database_url,
            server_port,
            serial_ports,
            baud_rate,
            record_delimiter,
            read_timeout_ms,
            write_timeout_ms,
            window_capacity,
            backoff_initial_ms,
            backoff_max_ms,
        }),
    }
});
