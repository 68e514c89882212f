use anyhow::Context;
use rusqlite::Connection;

// Migrations are embedded so that `:memory:` databases used in tests get the
// full schema without a migrations directory on disk.
const MIGRATIONS: &[(&str, &str)] = &[(
    "001_initial",
    "CREATE TABLE IF NOT EXISTS bikes (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        brand TEXT,
        rate_per_hour INTEGER NOT NULL,
        rate_per_day INTEGER NOT NULL,
        rate_per_7_days INTEGER
    );
    CREATE TABLE IF NOT EXISTS locations (
        id TEXT PRIMARY KEY,
        address TEXT NOT NULL,
        city TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1
    );
    CREATE TABLE IF NOT EXISTS bookings (
        id TEXT PRIMARY KEY,
        bike_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        pickup_ts TEXT NOT NULL,
        drop_ts TEXT NOT NULL,
        rental_type TEXT NOT NULL,
        pickup_type TEXT NOT NULL,
        pickup_location_id TEXT,
        delivery_address TEXT,
        tax_amount INTEGER NOT NULL,
        discount_amount INTEGER NOT NULL DEFAULT 0,
        total_amount INTEGER NOT NULL,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_bookings_user ON bookings(user_id);
    CREATE TABLE IF NOT EXISTS session_tokens (
        namespace TEXT PRIMARY KEY,
        token TEXT NOT NULL
    );",
)];

pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .context("failed to create migrations table")?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .context("failed to check migration status")?;

        if already_applied {
            continue;
        }

        conn.execute_batch(sql)
            .with_context(|| format!("failed to apply migration {name}"))?;
        conn.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])
            .with_context(|| format!("failed to record migration {name}"))?;

        tracing::info!("applied migration {name}");
    }

    Ok(())
}
