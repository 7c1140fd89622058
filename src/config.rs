use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::default::Default;
use std::fmt::{Display, Formatter};

use clap::Parser;

use crate::error::{self, Context};
use crate::path::normalize;

mod shape;

pub const DEFAULT_PERSIST_CRON: &str = "0 0/5 * * * *";

fn invalid<M>(msg: M) -> error::Error
where
    M: Into<String>
{
    error::Error::new()
        .kind(error::ErrorKind::Config)
        .message(msg)
}

#[derive(Debug, Parser)]
#[command(author, version ,about, long_about = None)]
pub struct CliArgs {
    /// a config file to load settings from. can be specified multiple times
    #[arg(long)]
    config: Vec<PathBuf>
}

#[derive(Debug)]
pub struct Config {
    pub settings: Settings,
}

pub fn get_config() -> error::Result<Config> {
    Config::from_args(CliArgs::parse())
}

impl Config {
    pub fn from_args(args: CliArgs) -> error::Result<Self> {
        let cwd = std::env::current_dir()
            .context("failed to retrieve cwd for Settings")?;
        let mut settings = Settings::default();

        for config_path in args.config {
            let full = if config_path.is_absolute() {
                config_path
            } else {
                normalize(cwd.join(config_path))
            };

            tracing::debug!("loading config file \"{}\"", full.display());

            let loaded = Self::load_file(&full)?;
            let src = SrcFile::new(&full);
            let dot = DotPath::new(&"settings");

            settings.merge(&src, dot, loaded)?;
        }

        tracing::debug!("{settings:#?}");

        Ok(Config {
            settings,
        })
    }

    /// yaml and json files are accepted, picked by extension
    fn load_file(path: &Path) -> error::Result<shape::Settings> {
        let ext = path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .context(format!("config file has no usable extension: \"{}\"", path.display()))?;

        let reader = std::fs::File::open(path)
            .map(std::io::BufReader::new)
            .context(format!("failed to open config file: \"{}\"", path.display()))?;

        match ext.as_str() {
            "yaml" | "yml" => serde_yaml::from_reader(reader)
                .context(format!("invalid yaml in config file: \"{}\"", path.display())),
            "json" => serde_json::from_reader(reader)
                .context(format!("invalid json in config file: \"{}\"", path.display())),
            _ => Err(invalid(format!(
                "unsupported config file type \"{ext}\": \"{}\"", path.display()
            )))
        }
    }
}

struct SrcFile<'a> {
    src: &'a Path,
}

impl<'a> SrcFile<'a> {
    fn new(src: &'a Path) -> Self {
        SrcFile { src }
    }
}

impl<'a> Display for SrcFile<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\"", self.src.display())
    }
}

struct DotPath<'a>(Vec<&'a dyn Display>);

impl<'a> DotPath<'a> {
    fn new(name: &'a (dyn Display)) -> Self {
        DotPath(vec![name])
    }

    fn push(&self, name: &'a (dyn Display)) -> Self {
        let mut path = self.0.clone();
        path.push(name);

        DotPath(path)
    }
}

impl<'a> Display for DotPath<'a> {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;

        for name in &self.0 {
            if first {
                write!(fmt, "{name}")?;
                first = false;
            } else {
                write!(fmt, ".{name}")?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Store {
    Memory,
    Postgres,
}

#[derive(Debug)]
pub struct Settings {
    pub id: i64,
    pub store: Store,
    pub db: Db,
    pub jobs: Jobs,
    pub cache: Cache,
}

impl Settings {
    fn merge(&mut self, src: &SrcFile<'_>, dot: DotPath<'_>, settings: shape::Settings) -> error::Result<()> {
        if let Some(id) = settings.id {
            self.id = id;
        }

        if let Some(store) = settings.store {
            self.store = match store {
                shape::Store::Memory => Store::Memory,
                shape::Store::Postgres => Store::Postgres,
            };
        }

        if let Some(db) = settings.db {
            self.db.merge(src, dot.push(&"db"), db)?;
        }

        if let Some(jobs) = settings.jobs {
            self.jobs.merge(src, dot.push(&"jobs"), jobs)?;
        }

        if let Some(cache) = settings.cache {
            self.cache.merge(src, dot.push(&"cache"), cache)?;
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            id: 1,
            store: Store::Memory,
            db: Db::default(),
            jobs: Jobs::default(),
            cache: Cache::default(),
        }
    }
}

#[derive(Debug)]
pub struct Db {
    pub user: String,
    pub password: Option<String>,
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub max_size: usize,
}

impl Db {
    fn merge(&mut self, src: &SrcFile<'_>, dot: DotPath<'_>, db: shape::Db) -> error::Result<()> {
        if let Some(user) = db.user {
            self.user = user;
        }

        if let Some(password) = db.password {
            self.password = Some(password);
        }

        if let Some(host) = db.host {
            self.host = host;
        }

        if let Some(port) = db.port {
            self.port = port;
        }

        if let Some(dbname) = db.dbname {
            self.dbname = dbname;
        }

        if let Some(max_size) = db.max_size {
            if max_size == 0 {
                return Err(invalid(format!(
                    "{} must be greater than 0. file: {src}", dot.push(&"max_size")
                )));
            }

            self.max_size = max_size;
        }

        Ok(())
    }
}

impl Default for Db {
    fn default() -> Self {
        Db {
            user: "postgres".into(),
            password: None,
            host: "localhost".into(),
            port: 5432,
            dbname: "cloudhub_disk".into(),
            max_size: 4,
        }
    }
}

#[derive(Debug)]
pub struct Jobs {
    pub workers: usize,
    pub queue: usize,
    pub persist_cron: String,
}

impl Jobs {
    fn merge(&mut self, src: &SrcFile<'_>, dot: DotPath<'_>, jobs: shape::Jobs) -> error::Result<()> {
        if let Some(workers) = jobs.workers {
            if workers == 0 {
                return Err(invalid(format!(
                    "{} must be greater than 0. file: {src}", dot.push(&"workers")
                )));
            }

            self.workers = workers;
        }

        if let Some(queue) = jobs.queue {
            if queue == 0 {
                return Err(invalid(format!(
                    "{} must be greater than 0. file: {src}", dot.push(&"queue")
                )));
            }

            self.queue = queue;
        }

        if let Some(persist_cron) = jobs.persist_cron {
            if let Err(err) = cron::Schedule::from_str(&persist_cron) {
                return Err(invalid(format!(
                    "{} \"{persist_cron}\" is not a valid cron expression. file: {src}",
                    dot.push(&"persist_cron")
                )).source(err));
            }

            self.persist_cron = persist_cron;
        }

        Ok(())
    }
}

impl Default for Jobs {
    fn default() -> Self {
        Jobs {
            workers: 10,
            queue: 20,
            persist_cron: DEFAULT_PERSIST_CRON.into(),
        }
    }
}

#[derive(Debug)]
pub struct Cache {
    pub capacity: u64,
}

impl Cache {
    fn merge(&mut self, src: &SrcFile<'_>, dot: DotPath<'_>, cache: shape::Cache) -> error::Result<()> {
        if let Some(capacity) = cache.capacity {
            if capacity == 0 {
                return Err(invalid(format!(
                    "{} must be greater than 0. file: {src}", dot.push(&"capacity")
                )));
            }

            self.capacity = capacity;
        }

        Ok(())
    }
}

impl Default for Cache {
    fn default() -> Self {
        Cache {
            capacity: 10_000,
        }
    }
}
