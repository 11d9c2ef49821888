use serde::{Deserialize, Serialize};

/// A news outlet, keyed by its canonical domain (no leading `www.`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub domain: String,
    pub name: String,
}
