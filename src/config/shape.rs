use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Store {
    Memory,
    Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Db {
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
    pub max_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct Jobs {
    pub workers: Option<usize>,
    pub queue: Option<usize>,
    pub persist_cron: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Cache {
    pub capacity: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub id: Option<i64>,
    pub store: Option<Store>,

    pub db: Option<Db>,
    pub jobs: Option<Jobs>,
    pub cache: Option<Cache>,
}
