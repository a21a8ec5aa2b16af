//! 建表语句
//!
//! 启动时幂等执行, 两种后端各一套DDL。列集合保持一致,
//! 只有类型拼写随方言变化。

/// SQLite DDL
pub const SQLITE_MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS leads (
        id TEXT PRIMARY KEY,
        customer_name TEXT NOT NULL,
        customer_phone TEXT NOT NULL DEFAULT '',
        customer_address TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL,
        team_id TEXT NOT NULL,
        dispatch_type TEXT NOT NULL,
        assigned_closer_id TEXT,
        assigned_closer_name TEXT,
        setter_id TEXT NOT NULL,
        setter_name TEXT NOT NULL,
        setter_location TEXT,
        setter_verified BOOLEAN NOT NULL DEFAULT FALSE,
        verified_by TEXT,
        verified_at TIMESTAMP,
        scheduled_time TIMESTAMP,
        photo_urls TEXT NOT NULL DEFAULT '[]',
        created_at TIMESTAMP NOT NULL,
        updated_at TIMESTAMP NOT NULL,
        accepted_at TIMESTAMP
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_leads_team ON leads (team_id, status)",
    "CREATE INDEX IF NOT EXISTS idx_leads_closer ON leads (assigned_closer_id, status)",
    r#"
    CREATE TABLE IF NOT EXISTS closers (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        status TEXT NOT NULL,
        team_id TEXT NOT NULL,
        lineup_order BIGINT,
        last_exception_at TIMESTAMP,
        last_exception_reason TEXT,
        created_at TIMESTAMP NOT NULL,
        updated_at TIMESTAMP NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_closers_team ON closers (team_id, status)",
    r#"
    CREATE TABLE IF NOT EXISTS activities (
        id TEXT PRIMARY KEY,
        kind TEXT NOT NULL,
        lead_id TEXT,
        closer_id TEXT,
        team_id TEXT NOT NULL,
        detail TEXT NOT NULL,
        created_at TIMESTAMP NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_activities_team ON activities (team_id, created_at)",
    r#"
    CREATE TABLE IF NOT EXISTS reminders (
        id TEXT PRIMARY KEY,
        lead_id TEXT NOT NULL UNIQUE,
        closer_id TEXT,
        appointment_time TIMESTAMP NOT NULL,
        reminder_time TIMESTAMP NOT NULL,
        processed BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMP NOT NULL,
        updated_at TIMESTAMP NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_reminders_due ON reminders (processed, reminder_time)",
    r#"
    CREATE TABLE IF NOT EXISTS device_tokens (
        closer_id TEXT NOT NULL,
        token TEXT NOT NULL,
        created_at TIMESTAMP NOT NULL,
        PRIMARY KEY (closer_id, token)
    )
    "#,
];

/// PostgreSQL DDL
pub const POSTGRES_MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS leads (
        id VARCHAR(64) PRIMARY KEY,
        customer_name VARCHAR(255) NOT NULL,
        customer_phone VARCHAR(64) NOT NULL DEFAULT '',
        customer_address TEXT NOT NULL DEFAULT '',
        status VARCHAR(32) NOT NULL,
        team_id VARCHAR(64) NOT NULL,
        dispatch_type VARCHAR(16) NOT NULL,
        assigned_closer_id VARCHAR(64),
        assigned_closer_name VARCHAR(255),
        setter_id VARCHAR(64) NOT NULL,
        setter_name VARCHAR(255) NOT NULL,
        setter_location TEXT,
        setter_verified BOOLEAN NOT NULL DEFAULT FALSE,
        verified_by VARCHAR(64),
        verified_at TIMESTAMPTZ,
        scheduled_time TIMESTAMPTZ,
        photo_urls TEXT NOT NULL DEFAULT '[]',
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        accepted_at TIMESTAMPTZ
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_leads_team ON leads (team_id, status)",
    "CREATE INDEX IF NOT EXISTS idx_leads_closer ON leads (assigned_closer_id, status)",
    r#"
    CREATE TABLE IF NOT EXISTS closers (
        id VARCHAR(64) PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        status VARCHAR(16) NOT NULL,
        team_id VARCHAR(64) NOT NULL,
        lineup_order BIGINT,
        last_exception_at TIMESTAMPTZ,
        last_exception_reason TEXT,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_closers_team ON closers (team_id, status)",
    r#"
    CREATE TABLE IF NOT EXISTS activities (
        id VARCHAR(64) PRIMARY KEY,
        kind VARCHAR(32) NOT NULL,
        lead_id VARCHAR(64),
        closer_id VARCHAR(64),
        team_id VARCHAR(64) NOT NULL,
        detail TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_activities_team ON activities (team_id, created_at)",
    r#"
    CREATE TABLE IF NOT EXISTS reminders (
        id VARCHAR(64) PRIMARY KEY,
        lead_id VARCHAR(64) NOT NULL UNIQUE,
        closer_id VARCHAR(64),
        appointment_time TIMESTAMPTZ NOT NULL,
        reminder_time TIMESTAMPTZ NOT NULL,
        processed BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_reminders_due ON reminders (processed, reminder_time)",
    r#"
    CREATE TABLE IF NOT EXISTS device_tokens (
        closer_id VARCHAR(64) NOT NULL,
        token TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (closer_id, token)
    )
    "#,
];
