use anyhow::Result;
use rusqlite::Connection;

const DB_PATH: &str = "data/ipo.sqlite";

pub fn connect() -> Result<Connection> {
    std::fs::create_dir_all("data")?;
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS pages (
            id           INTEGER PRIMARY KEY,
            external_id  TEXT UNIQUE NOT NULL,
            url          TEXT NOT NULL,
            html         TEXT,
            status       INTEGER,
            content_type TEXT,
            error        TEXT,
            fetched_at   TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_pages_external ON pages(external_id);

        CREATE TABLE IF NOT EXISTS offerings (
            external_id      TEXT PRIMARY KEY,
            slug             TEXT,
            name             TEXT,
            issue_size_crore REAL,
            issue_open_date  TEXT,
            issue_close_date TEXT,
            degraded         BOOLEAN NOT NULL DEFAULT 0,
            record_json      TEXT NOT NULL,
            extracted_at     TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_offerings_open ON offerings(issue_open_date);
        ",
    )?;
    Ok(())
}

// ── HTML cache ──

/// One fetch result, stored raw. Error rows keep `html` null so the cache
/// read path never serves a failed download.
pub struct PageRow {
    pub external_id: String,
    pub url: String,
    pub html: Option<String>,
    pub status: Option<i32>,
    pub content_type: Option<String>,
    pub error: Option<String>,
}

pub struct CachedPage {
    pub external_id: String,
    pub url: String,
    pub html: String,
    pub fetched_at: String,
}

pub fn save_page(conn: &Connection, row: &PageRow) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO pages (external_id, url, html, status, content_type, error)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            row.external_id,
            row.url,
            row.html,
            row.status,
            row.content_type,
            row.error,
        ],
    )?;
    Ok(())
}

/// `None` signals "not cached"; callers decide whether to download.
pub fn load_page(conn: &Connection, external_id: &str) -> Result<Option<CachedPage>> {
    let mut stmt = conn.prepare(
        "SELECT external_id, url, html, fetched_at FROM pages
         WHERE external_id = ?1 AND html IS NOT NULL",
    )?;
    let mut rows = stmt.query_map([external_id], |row| {
        Ok(CachedPage {
            external_id: row.get(0)?,
            url: row.get(1)?,
            html: row.get(2)?,
            fetched_at: row.get(3)?,
        })
    })?;
    rows.next().transpose().map_err(Into::into)
}

pub fn fetch_cached(conn: &Connection, limit: Option<usize>) -> Result<Vec<CachedPage>> {
    let sql = format!(
        "SELECT external_id, url, html, fetched_at FROM pages
         WHERE html IS NOT NULL ORDER BY id{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(CachedPage {
                external_id: row.get(0)?,
                url: row.get(1)?,
                html: row.get(2)?,
                fetched_at: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Extracted offerings ──

pub struct OfferingRow {
    pub external_id: String,
    pub slug: Option<String>,
    pub name: Option<String>,
    pub issue_size_crore: Option<f64>,
    pub issue_open_date: Option<String>,
    pub issue_close_date: Option<String>,
    pub degraded: bool,
    pub record_json: String,
}

pub fn save_offerings(conn: &Connection, rows: &[OfferingRow]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO offerings
             (external_id, slug, name, issue_size_crore, issue_open_date,
              issue_close_date, degraded, record_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for r in rows {
            stmt.execute(rusqlite::params![
                r.external_id,
                r.slug,
                r.name,
                r.issue_size_crore,
                r.issue_open_date,
                r.issue_close_date,
                r.degraded,
                r.record_json,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

// ── Overview ──

pub struct OverviewRow {
    pub external_id: String,
    pub name: String,
    pub open: String,
    pub close: String,
    pub issue_size_crore: Option<f64>,
    pub degraded: bool,
}

pub fn fetch_overview(conn: &Connection, limit: usize) -> Result<Vec<OverviewRow>> {
    let mut stmt = conn.prepare(
        "SELECT external_id, COALESCE(name,''), COALESCE(issue_open_date,''),
                COALESCE(issue_close_date,''), issue_size_crore, degraded
         FROM offerings
         ORDER BY issue_open_date DESC, external_id
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map([limit], |row| {
            Ok(OverviewRow {
                external_id: row.get(0)?,
                name: row.get(1)?,
                open: row.get(2)?,
                close: row.get(3)?,
                issue_size_crore: row.get(4)?,
                degraded: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub pages: usize,
    pub errors: usize,
    pub offerings: usize,
    pub degraded: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let pages: usize = conn.query_row("SELECT COUNT(*) FROM pages", [], |r| r.get(0))?;
    let errors: usize = conn.query_row(
        "SELECT COUNT(*) FROM pages WHERE error IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let offerings: usize = conn.query_row("SELECT COUNT(*) FROM offerings", [], |r| r.get(0))?;
    let degraded: usize = conn.query_row(
        "SELECT COUNT(*) FROM offerings WHERE degraded = 1",
        [],
        |r| r.get(0),
    )?;
    Ok(Stats {
        pages,
        errors,
        offerings,
        degraded,
    })
}

// ── Tests ──
