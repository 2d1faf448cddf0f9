pub(crate) const MIGRATION: &str = r#"
    CREATE TABLE IF NOT EXISTS conversations (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL DEFAULT 'Untitled Conversation',
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS messages (
        id TEXT PRIMARY KEY,
        conversation_id TEXT NOT NULL,
        sender TEXT NOT NULL CHECK (sender IN ('user', 'ai')),
        text TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_messages_conversation_created
        ON messages (conversation_id, created_at);

    CREATE TABLE IF NOT EXISTS analyses (
        id TEXT PRIMARY KEY,
        conversation_id TEXT NOT NULL UNIQUE,
        clarity_score REAL NOT NULL,
        relevance_score REAL NOT NULL,
        accuracy_score REAL NOT NULL,
        completeness_score REAL NOT NULL,
        coherence_score REAL NOT NULL,
        empathy_score REAL NOT NULL,
        politeness_score REAL NOT NULL,
        overall_score REAL NOT NULL,
        sentiment TEXT NOT NULL CHECK (sentiment IN ('positive', 'neutral', 'negative')),
        avg_response_time REAL,
        resolution INTEGER NOT NULL,
        escalation_needed INTEGER NOT NULL,
        fallback_frequency INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL,
        FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE
    );
"#;
