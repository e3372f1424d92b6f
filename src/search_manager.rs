use anyhow::{Context, Result};
use log::debug;
use searchcli::{resolve, BangRecord, BangTable, Config, Paths, Query, Resolution, BANG_MARKER};

// SearchManager ties the config and bang table to one invocation
pub struct SearchManager {
    paths: Paths,
    config: Config,
    table: Option<BangTable>,
}

impl SearchManager {
    // Initialize the manager with the user's config, the table is loaded lazily
    pub fn new(paths: Paths) -> Self {
        let config = Config::load(&paths.config_file);
        debug!("default bang: {:?}", config.default_bang());

        Self {
            paths,
            config,
            table: None,
        }
    }

    // Load the table on first use, borrowing only the fields involved
    fn table<'a>(table: &'a mut Option<BangTable>, paths: &Paths) -> Result<&'a BangTable> {
        let loaded = match table.take() {
            Some(loaded) => loaded,
            None => {
                let loaded = BangTable::load(paths).context("failed to load bangs")?;
                debug!("loaded {} bangs", loaded.len());
                loaded
            }
        };
        Ok(table.insert(loaded))
    }

    // Turn raw arguments into a URL or an unknown bang
    pub fn resolve(&mut self, args: &[String]) -> Result<Resolution> {
        let query = Query::parse(args);
        debug!("parsed query: {query:?}");

        let table = Self::table(&mut self.table, &self.paths)?;
        Ok(resolve(&query, &self.config, table))
    }

    // Persist a new default bang, returning the stored shortcut
    pub fn set_default(&mut self, bang: &str) -> Result<String> {
        let shortcut = bang.strip_prefix(BANG_MARKER).unwrap_or(bang).to_string();
        self.config.default_bang.clone_from(&shortcut);
        self.config
            .save(&self.paths.config_file)
            .context("failed to save config")?;
        Ok(shortcut)
    }

    pub fn default_bang(&self) -> Option<&str> {
        self.config.default_bang()
    }

    // Bangs matching a filter, in table order
    pub fn list(&mut self, filter: &str) -> Result<Vec<BangRecord>> {
        let table = Self::table(&mut self.table, &self.paths)?;
        Ok(table.search(filter).into_iter().cloned().collect())
    }
}
