use anyhow::{bail, Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

// Constants
pub const BANG_MARKER: char = '!';
pub const PLACEHOLDER: &str = "{{{s";
pub const WEB_SEARCH_URL: &str = "https://www.google.com/search?q=";
pub const DEFAULT_BANGS: &str = include_str!("../assets/bangs.json");

const DATA_DIR: &str = ".searchcli";
const CONFIG_FILE: &str = "config.json";
const BANGS_FILE: &str = "bangs.json";

// Bang definition, keyed the way upstream bang lists are
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BangRecord {
    #[serde(rename = "c", default)]
    pub category: String,
    #[serde(rename = "d", default)]
    pub domain: String,
    #[serde(rename = "r", default)]
    pub relevance: i64,
    #[serde(rename = "s", default)]
    pub name: String,
    #[serde(rename = "sc", default)]
    pub subcategory: String,
    #[serde(rename = "t")]
    pub shortcut: String,
    #[serde(rename = "u")]
    pub url_template: String,
}

impl BangRecord {
    // Substitute a search term into this record's template
    #[must_use]
    pub fn url_for(&self, term: &str) -> String {
        build_url(&self.url_template, term)
    }
}

/// Replace the first placeholder occurrence in `template` with `term`.
///
/// Only the `{{{s` prefix of the conventional `{{{s}}}` token is matched, so
/// the closing braces stay in the result. The term is inserted verbatim.
#[must_use]
pub fn build_url(template: &str, term: &str) -> String {
    template.replacen(PLACEHOLDER, term, 1)
}

// Files used by a single invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Paths {
    pub config_file: PathBuf,
    pub bangs_file: PathBuf,
}

impl Paths {
    // Lay out the data files under the given directory
    #[must_use]
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            config_file: dir.join(CONFIG_FILE),
            bangs_file: dir.join(BANGS_FILE),
        }
    }

    /// Resolve the per-user data directory (`~/.searchcli`)
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn from_home() -> Result<Self> {
        let home = dirs::home_dir().context("could not determine home directory")?;
        Ok(Self::in_dir(home.join(DATA_DIR)))
    }
}

// Loaded bang table
#[derive(Debug, Clone)]
pub struct BangTable {
    pub bangs: Vec<BangRecord>,
    lookup: Option<HashMap<String, usize>>, // shortcut -> index of first record
}

impl BangTable {
    // Constructor for creating a new table
    #[must_use]
    pub fn new(bangs: Vec<BangRecord>) -> Self {
        Self {
            bangs,
            lookup: None,
        }
    }

    /// Parse a table from JSON text
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not a JSON array of bang records.
    pub fn from_json(content: &str) -> Result<Self> {
        let bangs: Vec<BangRecord> =
            serde_json::from_str(content).context("failed to parse bang table JSON")?;

        let mut table = Self::new(bangs);
        table.init_lookup();
        Ok(table)
    }

    /// Load table from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if it contains invalid JSON.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy();
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read bang table from {path_str}"))?;

        Self::from_json(&content).with_context(|| format!("invalid bang table in {path_str}"))
    }

    /// Table compiled into the binary
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded asset is not a valid bang table.
    pub fn embedded() -> Result<Self> {
        Self::from_json(DEFAULT_BANGS).context("embedded bang table is invalid")
    }

    /// Load the user's copy, seeding it from the embedded table on first run
    ///
    /// # Errors
    ///
    /// Returns an error if an existing on-disk table cannot be read or parsed.
    pub fn load(paths: &Paths) -> Result<Self> {
        let path = &paths.bangs_file;
        if path.exists() {
            debug!("loading bang table from {}", path.display());
            return Self::from_file(path);
        }

        debug!("no bang table at {}, using embedded copy", path.display());
        if let Err(e) = Self::seed(path) {
            warn!("could not seed bang table at {}: {e:#}", path.display());
        }
        Self::embedded()
    }

    // Write the embedded table to disk
    fn seed(path: &Path) -> Result<()> {
        let path_str = path.to_string_lossy();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory for {path_str}"))?;
        }
        fs::write(path, DEFAULT_BANGS)
            .with_context(|| format!("failed to write bang table to {path_str}"))
    }

    // Initialize the lookup map, earlier records win on duplicate shortcuts
    pub fn init_lookup(&mut self) {
        let mut map = HashMap::with_capacity(self.bangs.len());
        for (index, bang) in self.bangs.iter().enumerate() {
            map.entry(bang.shortcut.clone()).or_insert(index);
        }
        self.lookup = Some(map);
    }

    // Exact, case-sensitive shortcut lookup
    #[must_use]
    pub fn find(&self, shortcut: &str) -> Option<&BangRecord> {
        if let Some(map) = &self.lookup {
            map.get(shortcut).map(|&index| &self.bangs[index])
        } else {
            // Fallback to linear search if map not initialized
            self.bangs.iter().find(|bang| bang.shortcut == shortcut)
        }
    }

    // Records whose shortcut or name contains the filter, ignoring case
    #[must_use]
    pub fn search(&self, filter: &str) -> Vec<&BangRecord> {
        let needle = filter.to_lowercase();
        self.bangs
            .iter()
            .filter(|bang| {
                needle.is_empty()
                    || bang.shortcut.to_lowercase().contains(&needle)
                    || bang.name.to_lowercase().contains(&needle)
            })
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bangs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bangs.is_empty()
    }

    // Method for checking if the lookup map is initialized (for testing)
    #[must_use]
    pub fn has_lookup_map(&self) -> bool {
        self.lookup.is_some()
    }
}

// Persisted user preferences
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub default_bang: String,
}

impl Config {
    // Load config, treating a missing or corrupt file as empty
    #[must_use]
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path_ref = path.as_ref();
        let Ok(content) = fs::read_to_string(path_ref) else {
            return Self::default();
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            debug!("ignoring unreadable config {}: {e}", path_ref.display());
            Self::default()
        })
    }

    /// Save config as pretty-printed JSON, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path_ref = path.as_ref();
        let path_str = path_ref.to_string_lossy();

        if let Some(parent) = path_ref.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create config directory for {path_str}"))?;
        }

        let content =
            serde_json::to_string_pretty(&self).context("failed to serialize config to JSON")?;
        fs::write(path_ref, content)
            .with_context(|| format!("failed to write config to {path_str}"))?;

        // Fix permissions - set to 644 (rw-r--r--)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path_ref)
                .with_context(|| format!("failed to get metadata for {path_str}"))?
                .permissions();
            perms.set_mode(0o644);
            fs::set_permissions(path_ref, perms)
                .with_context(|| format!("failed to set permissions for {path_str}"))?;
        }

        Ok(())
    }

    #[must_use]
    pub fn default_bang(&self) -> Option<&str> {
        if self.default_bang.is_empty() {
            None
        } else {
            Some(&self.default_bang)
        }
    }
}

// Parsed user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub raw: String,
    pub shortcut: Option<String>,
    pub term: String,
}

impl Query {
    /// Join arguments and split off a leading `!shortcut`.
    ///
    /// The shortcut is only recognised when the query starts with it and a
    /// search term follows; a lone `!w` or a leading space is plain text.
    #[must_use]
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Self {
        let raw = args
            .iter()
            .map(|arg| arg.as_ref())
            .collect::<Vec<&str>>()
            .join(" ");

        if let Some((head, rest)) = raw.split_once(char::is_whitespace) {
            let rest = rest.trim_start();
            if let Some(shortcut) = head.strip_prefix(BANG_MARKER) {
                if !rest.is_empty() {
                    return Self {
                        shortcut: Some(shortcut.to_string()),
                        term: rest.to_string(),
                        raw,
                    };
                }
            }
        }

        Self {
            shortcut: None,
            term: raw.trim().to_string(),
            raw,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.trim().is_empty()
    }
}

// Outcome of resolving a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Open(String),
    UnknownBang(String),
}

// Resolve a query against the table, falling back to the configured default
#[must_use]
pub fn resolve(query: &Query, config: &Config, table: &BangTable) -> Resolution {
    let (shortcut, term) = match (&query.shortcut, config.default_bang()) {
        (Some(shortcut), _) => (shortcut.as_str(), query.term.as_str()),
        (None, Some(default)) => (default, query.raw.as_str()),
        (None, None) => return Resolution::Open(format!("{WEB_SEARCH_URL}{}", query.raw)),
    };

    match table.find(shortcut) {
        Some(bang) => {
            debug!("resolved !{shortcut} to {}", bang.name);
            Resolution::Open(bang.url_for(term))
        }
        None => Resolution::UnknownBang(shortcut.to_string()),
    }
}

/// Build the command that opens `url` with the platform's default handler
///
/// # Errors
///
/// Returns an error for platforms without a known opener.
pub fn open_command(os: &str, url: &str) -> Result<Command> {
    let mut command = match os {
        "windows" => {
            let mut command = Command::new("rundll32");
            command.arg("url.dll,FileProtocolHandler");
            command
        }
        "macos" => Command::new("open"),
        "linux" => Command::new("xdg-open"),
        other => bail!("unsupported platform {other}"),
    };
    command.arg(url);
    Ok(command)
}
