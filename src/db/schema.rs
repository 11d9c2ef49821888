pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- sources table
CREATE TABLE IF NOT EXISTS sources (
    domain TEXT PRIMARY KEY CHECK (length(domain) <= 253),
    name TEXT NOT NULL
);

-- articles table
CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source TEXT NOT NULL REFERENCES sources(domain) ON DELETE CASCADE,
    url TEXT NOT NULL,
    canonical_path TEXT NOT NULL,
    title TEXT NOT NULL,
    published_at TEXT NOT NULL,
    author TEXT,
    description TEXT,
    image_url TEXT,
    content TEXT,
    UNIQUE(source, canonical_path, title)
);

CREATE INDEX IF NOT EXISTS idx_articles_source ON articles(source);
CREATE INDEX IF NOT EXISTS idx_articles_published_at ON articles(published_at DESC);
"#;
