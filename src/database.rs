use std::{path::Path, sync::Arc};

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use regex::{Regex, RegexBuilder};
use rusqlite::{functions::FunctionFlags, vtab::csvtab, Connection, OptionalExtension};

use crate::Result;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Opens the pool. Every connection gets its own copy of the temporary tables.
pub fn open_pool(database_url: &str, langs_path: &Path) -> Result<DbPool> {
    let langs_path = langs_path.to_string_lossy().into_owned();
    let manager = SqliteConnectionManager::file(database_url)
        .with_init(move |conn| init_connection(conn, &langs_path));
    Ok(Pool::builder().build(manager)?)
}

fn init_connection(conn: &mut Connection, langs_path: &str) -> rusqlite::Result<()> {
    // initialize CSV virtual table module
    csvtab::load_module(conn)?;
    // implement the REGEXP operator
    conn.create_scalar_function(
        "regexp",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        move |ctx| {
            assert_eq!(ctx.len(), 2, "called with unexpected number of arguments");
            let regexp: Arc<Regex> = ctx.get_or_create_aux(
                0,
                |vr| -> std::result::Result<_, Box<dyn std::error::Error + Send + Sync>> {
                    Ok(RegexBuilder::new(vr.as_str()?)
                        .case_insensitive(true)
                        .build()?)
                },
            )?;

            let is_match = {
                let text = ctx
                    .get_raw(1)
                    .as_str_or_null()
                    .map_err(|e| rusqlite::Error::UserFunctionError(e.into()))?;

                text.map(|text| regexp.is_match(text))
            };

            Ok(is_match)
        },
    )?;
    init_langs(conn, langs_path)
}

fn init_langs(conn: &Connection, langs_path: &str) -> rusqlite::Result<()> {
    conn.execute_batch(&format!(
        "
        CREATE VIRTUAL TABLE temp.langs
        USING csv(
            filename='{}',
            header=1,
            schema='CREATE TABLE x(
                code TEXT NOT NULL,
                name TEXT NOT NULL
            )'
        )
        ",
        langs_path.replace('\'', "''")
    ))
}

/// Resolves a language given either its code or its (case-insensitive) name.
pub fn resolve_language(conn: &Connection, query: &str) -> Result<Option<String>> {
    let query = query.trim();
    let by_code = conn
        .query_row(
            "SELECT code FROM temp.langs WHERE code = ?1 LIMIT 1",
            [query],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    if by_code.is_some() {
        return Ok(by_code);
    }

    let by_name = conn
        .query_row(
            "SELECT code FROM temp.langs WHERE name = ?1 COLLATE NOCASE LIMIT 1",
            [query],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(by_name)
}

/// Language names in file order, optionally filtered by a case-insensitive regex.
pub fn language_names(conn: &Connection, filter: Option<&str>) -> Result<Vec<String>> {
    if let Some(pattern) = filter {
        // surface bad patterns as a regex error rather than a generic sqlite one
        Regex::new(pattern)?;
    }
    let mut stmt = conn.prepare(
        "SELECT name FROM temp.langs
        WHERE ?1 IS NULL OR name REGEXP ?1",
    )?;
    let names = stmt
        .query_map([filter], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}
