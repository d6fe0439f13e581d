//! INI configuration file with a DEFAULT section and named profiles
//!
//! The file is looked up as `./rdspump.cfg` and `~/.rdspump.cfg`. Every file found is read in
//! that order and later files override earlier ones key by key. Keys are case-insensitive,
//! section names are not.

use crate::error::{Error, NotFound, Result};

pub const CONFIG_FILE_NAME: &str = "rdspump.cfg";
pub const HOME_CONFIG_FILE_NAME: &str = ".rdspump.cfg";
pub const DEFAULT_SECTION: &str = "DEFAULT";
/// Selector listing every profile name
pub const LIST_ALL: &str = "*";

// passwords may contain backslashes
fn parse_options() -> ini::ParseOption {
    ini::ParseOption {
        enabled_escape: false,
        ..Default::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

impl Section {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value for `key`, empty values are reported as absent
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn set(&mut self, key: &str, value: &str) {
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim().to_string();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    defaults: Section,
    profiles: Vec<Section>,
    sources: Vec<std::path::PathBuf>,
}

impl ConfigFile {
    /// Default lookup order: working directory first, then the home directory
    pub fn search_paths() -> Vec<std::path::PathBuf> {
        let mut paths = vec![std::path::PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(HOME_CONFIG_FILE_NAME));
        }
        paths
    }

    /// Loads `explicit` if given, otherwise every existing file from [`Self::search_paths`]
    pub fn load(explicit: Option<&std::path::Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(Error::config(format!("config file {path:?} not found")));
                }
                Self::load_from_paths(&[path.to_path_buf()])
            }
            None => Self::load_from_paths(&Self::search_paths()),
        }
    }

    pub fn load_from_paths(paths: &[std::path::PathBuf]) -> Result<Self> {
        let mut config = Self {
            defaults: Section::new(DEFAULT_SECTION),
            ..Default::default()
        };
        for path in paths.iter().filter(|path| path.is_file()) {
            tracing::debug!("reading config file {:?}", path);
            let ini = ini::Ini::load_from_file_opt(path, parse_options())
                .map_err(|error| Error::config(format!("failed parsing {path:?}: {error}")))?;
            config.merge(&ini);
            config.sources.push(path.clone());
        }
        if config.sources.is_empty() {
            return Err(Error::config(format!(
                "config file not found (looked for {})",
                paths
                    .iter()
                    .map(|p| format!("{p:?}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let ini = ini::Ini::load_from_str_opt(text, parse_options())
            .map_err(|error| Error::config(format!("failed parsing config: {error}")))?;
        let mut config = Self {
            defaults: Section::new(DEFAULT_SECTION),
            ..Default::default()
        };
        config.merge(&ini);
        Ok(config)
    }

    fn merge(&mut self, ini: &ini::Ini) {
        for (name, properties) in ini.iter() {
            // keys outside of any section belong to DEFAULT
            let section = match name {
                None | Some(DEFAULT_SECTION) => &mut self.defaults,
                Some(name) => {
                    let idx = match self.profiles.iter().position(|s| s.name == name) {
                        Some(idx) => idx,
                        None => {
                            self.profiles.push(Section::new(name));
                            self.profiles.len() - 1
                        }
                    };
                    &mut self.profiles[idx]
                }
            };
            for (key, value) in properties.iter() {
                section.set(key, value);
            }
        }
    }

    pub fn defaults(&self) -> &Section {
        &self.defaults
    }

    pub fn profile(&self, name: &str) -> Option<&Section> {
        self.profiles.iter().find(|s| s.name == name)
    }

    pub fn profile_names(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|s| s.name.as_str())
    }

    pub fn sources(&self) -> &[std::path::PathBuf] {
        &self.sources
    }

    /// Prints profile names (`None` or `*`) or the `key: value` pairs of one profile
    pub fn list(&self, selector: Option<&str>, out: &mut impl std::io::Write) -> Result<()> {
        let write_err = |error| Error::io("<stdout>", error);
        match selector {
            None | Some(LIST_ALL) => {
                for name in self.profile_names() {
                    writeln!(out, "{name}").map_err(write_err)?;
                }
            }
            Some(name) => {
                let section = self
                    .profile(name)
                    .ok_or_else(|| Error::NotFound(NotFound::Profile(name.to_string())))?;
                for (key, value) in section.entries() {
                    writeln!(out, "{key}: {value}").map_err(write_err)?;
                }
            }
        }
        Ok(())
    }
}
