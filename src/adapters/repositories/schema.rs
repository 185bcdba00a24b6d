use sqlx::PgPool;
use tracing::info;

const SCHEMA: &str = r#"
CREATE SCHEMA IF NOT EXISTS application;

CREATE TABLE IF NOT EXISTS application.folders (
    id          BIGSERIAL PRIMARY KEY,
    name        VARCHAR(255) NOT NULL,
    owner_id    BIGINT NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE (id, owner_id)
);

CREATE INDEX IF NOT EXISTS folders_owner_created_idx
    ON application.folders (owner_id, created_at DESC);

CREATE TABLE IF NOT EXISTS application.files (
    id             BIGSERIAL PRIMARY KEY,
    filename       TEXT NOT NULL,
    original_name  TEXT NOT NULL,
    mime_type      TEXT NOT NULL,
    size           BIGINT NOT NULL CHECK (size >= 0),
    locator        TEXT NOT NULL UNIQUE,
    owner_id       BIGINT NOT NULL,
    folder_id      BIGINT,
    created_at     TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    FOREIGN KEY (folder_id, owner_id) REFERENCES application.folders (id, owner_id)
);

CREATE INDEX IF NOT EXISTS files_owner_created_idx
    ON application.files (owner_id, created_at DESC);

CREATE INDEX IF NOT EXISTS files_folder_idx
    ON application.files (folder_id);
"#;

/// Creates the schema and tables if they are missing. Safe to run on every
/// start.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    info!("Database schema ready");
    Ok(())
}
