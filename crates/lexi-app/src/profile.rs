use std::env;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use lexi_config::Config;
use serde::{Deserialize, Serialize};

/// Load the default config shipped in the repo, or built-in defaults without one
fn load_repo_default_config() -> anyhow::Result<Config> {
    let path = Path::new("config.json");
    if !path.exists() {
        tracing::info!("No config.json found, using built-in defaults");
        return Ok(Config::default());
    }

    tracing::info!("Loading repo default config...");
    load_config_file(path)
}

pub fn load_config_file(path: &Path) -> anyhow::Result<Config> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let config = serde_json::from_reader(reader)?;
    Ok(config)
}

/// `LEXI_HOME`, else `~/.lexi`
fn lexi_root() -> PathBuf {
    if let Ok(home) = env::var("LEXI_HOME") {
        return PathBuf::from(home);
    }

    env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".lexi")
}

fn profiles_dir() -> PathBuf {
    lexi_root().join("profiles")
}

#[derive(Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub value: Config,
}

fn read_profile(path: &Path) -> anyhow::Result<Config> {
    let data = fs::read_to_string(path)?;
    let profile: Profile = serde_json::from_str(&data)?;
    Ok(profile.value)
}

/// Create the profiles folder and the main profile if missing
pub fn init_user_config() -> anyhow::Result<()> {
    init_in(&profiles_dir())
}

fn init_in(dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir)?;

    let main_profile = dir.join("main.json");
    if !main_profile.exists() {
        let profile = Profile {
            name: "main".into(),
            value: load_repo_default_config()?,
        };
        fs::write(&main_profile, serde_json::to_string_pretty(&profile)?)?;
        tracing::info!("Created main profile at {}", main_profile.display());
    }

    Ok(())
}

/// Load a profile by name, falling back to main and then the repo default
pub fn load_user_profile(name: &str) -> anyhow::Result<Config> {
    load_from(&profiles_dir(), name)
}

fn load_from(dir: &Path, name: &str) -> anyhow::Result<Config> {
    let profile_file = dir.join(format!("{name}.json"));
    if profile_file.exists() {
        return read_profile(&profile_file);
    }

    tracing::warn!("Profile {name} not found, falling back to main profile or repo default");
    let main_file = dir.join("main.json");
    if main_file.exists() {
        read_profile(&main_file)
    } else {
        load_repo_default_config()
    }
}
