pub use config::{Config, Navigation, Traveller};
pub use load::{get, init, ConfigError, ConfigType};

mod config;
mod load;
