use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CUSTOMER_ID: &str = "demo";
const DEFAULT_BOT_NAME: &str = "Eric";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerConfig {
    pub id: String,
    pub display_name: String,
    pub accent_color: String,
    pub bot_name: String,
}

impl CustomerConfig {
    pub fn demo() -> Self {
        Self {
            id: DEFAULT_CUSTOMER_ID.to_string(),
            display_name: "AI Chatbot Demo".to_string(),
            accent_color: "#6366f1".to_string(),
            bot_name: DEFAULT_BOT_NAME.to_string(),
        }
    }

    pub fn welcome_message(&self) -> String {
        format!(
            "👋 Hi! I'm {} - an AI chatbot DEMO.\n\n\
             I showcase what chatbots can do:\n\n\
             • 24/7 customer support\n\
             • Product information\n\
             • Order tracking\n\
             • Multi-language support\n\
             • API integrations\n\n\
             What would you like to test?",
            self.bot_name
        )
    }
}

/// On-disk shape of one entry in the customers file; the id is the map key.
#[derive(Debug, Deserialize)]
struct CustomerRecord {
    name: String,
    color: String,
    #[serde(default = "default_bot_name")]
    bot_name: String,
}

fn default_bot_name() -> String {
    DEFAULT_BOT_NAME.to_string()
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("customer config file `{0}` does not exist")]
    Missing(PathBuf),
    #[error("could not read customer config file `{path}`: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not parse customer config file `{path}`: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct CustomerTable {
    customers: HashMap<String, CustomerConfig>,
    fallback: CustomerConfig,
}

impl Default for CustomerTable {
    fn default() -> Self {
        let demo = CustomerConfig::demo();
        Self {
            customers: HashMap::from([(demo.id.clone(), demo.clone())]),
            fallback: demo,
        }
    }
}

impl CustomerTable {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let raw = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                LoadError::Missing(path.to_path_buf())
            } else {
                LoadError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::from_json(&raw).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let records: HashMap<String, CustomerRecord> = serde_json::from_str(raw)?;
        let customers = records
            .into_iter()
            .map(|(id, record)| {
                let config = CustomerConfig {
                    id: id.clone(),
                    display_name: record.name,
                    accent_color: record.color,
                    bot_name: record.bot_name,
                };
                (id, config)
            })
            .collect::<HashMap<_, _>>();

        let fallback = customers
            .get(DEFAULT_CUSTOMER_ID)
            .cloned()
            .unwrap_or_else(CustomerConfig::demo);

        Ok(Self {
            customers,
            fallback,
        })
    }

    /// Unknown ids resolve to the `demo` entry.
    pub fn lookup(&self, customer_id: &str) -> &CustomerConfig {
        self.customers.get(customer_id).unwrap_or(&self.fallback)
    }

    pub fn customer_count(&self) -> usize {
        self.customers.len()
    }
}
