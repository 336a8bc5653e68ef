use std::borrow::Cow;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use arc_swap::{ArcSwap, Guard};
use notify::{watcher, DebouncedEvent, RecursiveMode, Watcher};
use once_cell::sync::OnceCell;

use common::*;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parsing(#[from] ron::de::Error),

    #[error("Failed to watch config file: {0}")]
    Notify(#[from] notify::Error),

    #[error("Config path has no parent directory")]
    NoParent,

    #[error("Config has already been initialized")]
    AlreadyInitialized,
}

type ConfigResult<T> = std::result::Result<T, ConfigError>;

pub enum ConfigType<'a> {
    String(&'a str),
    WatchedFile(&'a Path),
}

static CONFIG: OnceCell<ArcSwap<Config>> = OnceCell::new();

/// Must be called once only, and before [get]
pub fn init(cfg: ConfigType) -> ConfigResult<()> {
    if CONFIG.get().is_some() {
        return Err(ConfigError::AlreadyInitialized);
    }

    // parse config and fail early
    let config = cfg.load()?;

    if let ConfigType::WatchedFile(path) = cfg {
        watch(path.to_owned())?;
    }

    CONFIG
        .set(ArcSwap::from_pointee(config))
        .map_err(|_| ConfigError::AlreadyInitialized)?;

    debug!("initialized config");
    Ok(())
}

/// Falls back to the default config if [init] was never called
pub fn get() -> impl Deref<Target = Config> {
    let cfg = CONFIG.get_or_init(|| {
        warn!("config accessed before initialization, using defaults");
        ArcSwap::from_pointee(Config::default())
    });

    Guard::into_inner(cfg.load())
}

fn watch(path: PathBuf) -> ConfigResult<()> {
    let watch_dir = path.parent().ok_or(ConfigError::NoParent)?.to_owned();
    let watch_file = path.file_name().map(|s| s.to_owned());

    let (tx, rx) = channel();
    let mut watcher = watcher(tx, Duration::from_secs(1))?;
    watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;

    thread::Builder::new()
        .name("cfg-watcher".to_owned())
        .spawn(move || {
            let _watcher = watcher; // keep alive
            let is_config = |p: &PathBuf| p.file_name() == watch_file.as_deref();

            loop {
                let reload = match rx.recv() {
                    Ok(DebouncedEvent::Write(ref p)) if is_config(p) => true,
                    Ok(DebouncedEvent::Remove(ref p)) if is_config(p) => {
                        warn!("config was deleted");
                        false
                    }
                    Ok(DebouncedEvent::Rename(ref a, ref b)) if is_config(a) || is_config(b) => {
                        warn!("config was renamed");
                        true
                    }
                    Ok(_) => false,
                    Err(_) => {
                        debug!("config watcher channel closed");
                        break;
                    }
                };

                if reload {
                    info!("config was modified, reloading");
                    reload_from(&path);
                }
            }
        })?;

    Ok(())
}

fn reload_from(path: &Path) {
    let cfg = match CONFIG.get() {
        Some(cfg) => cfg,
        None => {
            warn!("config changed before it was initialized, ignoring");
            return;
        }
    };

    match ConfigType::WatchedFile(path).load() {
        Ok(config) => {
            let new = Arc::new(config);
            let new_ptr = Arc::as_ptr(&new);
            let old = cfg.swap(new);
            debug!("swapped config instance"; "new" => ?new_ptr, "old" => ?Arc::as_ptr(&old));
        }
        Err(e) => {
            warn!("failed to reload config"; "error" => %e);
        }
    }
}

impl<'a> ConfigType<'a> {
    fn load(&self) -> ConfigResult<Config> {
        let contents = match self {
            ConfigType::String(s) => Cow::Borrowed(*s),
            ConfigType::WatchedFile(path) => Cow::Owned(std::fs::read_to_string(path)?),
        };

        Ok(ron::de::from_str(&contents)?)
    }
}
