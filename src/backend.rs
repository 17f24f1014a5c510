//! Data-access interface and the JSON-file backend.
//!
//! The application never touches storage directly: every read and write
//! goes through [`DataAccess`], a small table-oriented interface
//! (equality filters, insert, update, delete, ordered select). The
//! bundled [`JsonBackend`] keeps all tables in a single JSON file and
//! applies the column defaults the hosted schema declares.

use std::cmp::Ordering;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{Error, Result};

/// One stored record, keyed by column name.
pub type Row = serde_json::Map<String, Value>;

/// Persisted entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Profiles,
    Tasks,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Profiles => "profiles",
            Table::Tasks => "tasks",
        }
    }

    /// Columns that must be present (NOT NULL without default).
    fn required_columns(self) -> &'static [&'static str] {
        match self {
            Table::Profiles => &["id"],
            Table::Tasks => &["user_id", "title", "deadline", "priority", "category"],
        }
    }

    /// Fill in the defaults the schema declares for absent columns.
    fn apply_defaults(self, row: &mut Row) {
        let now = json!(Utc::now());
        let defaults: Vec<(&str, Value)> = match self {
            Table::Profiles => vec![("created_at", now)],
            Table::Tasks => vec![
                ("id", json!(Uuid::new_v4())),
                ("description", Value::Null),
                ("recurring", json!("none")),
                ("completed", json!(false)),
                ("archived", json!(false)),
                ("order_index", json!(0)),
                ("created_at", now.clone()),
                ("updated_at", now),
            ],
        };
        for (column, value) in defaults {
            row.entry(column.to_string()).or_insert(value);
        }
    }
}

/// Equality predicate on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: &str, value: impl Serialize) -> Self {
        Self {
            column: column.to_string(),
            value: serde_json::to_value(value).unwrap_or(Value::Null),
        }
    }

    pub fn matches(&self, row: &Row) -> bool {
        row.get(&self.column).unwrap_or(&Value::Null) == &self.value
    }
}

/// Sort specification for `select`.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: &str) -> Self {
        Self { column: column.to_string(), ascending: true }
    }
}

/// Storage operations the application relies on.
///
/// All filters are combined with AND. Every failure is reported as
/// [`Error::DataAccess`].
pub trait DataAccess {
    fn select(&self, table: Table, filters: &[Filter], order: Option<&Order>) -> Result<Vec<Row>>;
    fn insert(&mut self, table: Table, rows: Vec<Row>) -> Result<()>;
    fn update(&mut self, table: Table, patch: &Row, filters: &[Filter]) -> Result<()>;
    fn delete(&mut self, table: Table, filters: &[Filter]) -> Result<()>;
}

fn matches_all(row: &Row, filters: &[Filter]) -> bool {
    filters.iter().all(|f| f.matches(row))
}

/// Nulls first, numbers numerically, strings lexically.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// All tables as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Tables {
    #[serde(default)]
    profiles: Vec<Row>,
    #[serde(default)]
    tasks: Vec<Row>,
}

impl Tables {
    fn rows(&self, table: Table) -> &Vec<Row> {
        match table {
            Table::Profiles => &self.profiles,
            Table::Tasks => &self.tasks,
        }
    }

    fn rows_mut(&mut self, table: Table) -> &mut Vec<Row> {
        match table {
            Table::Profiles => &mut self.profiles,
            Table::Tasks => &mut self.tasks,
        }
    }

    /// Load tables from a JSON file; a missing file is an empty store.
    fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Tables::default());
        }
        let mut buf = String::new();
        File::open(path)
            .and_then(|mut f| f.read_to_string(&mut buf))
            .map_err(Error::data_access)?;
        serde_json::from_str(&buf).map_err(Error::data_access)
    }

    /// Save tables to a JSON file using atomic write (temp file + rename).
    fn save(&self, path: &Path) -> Result<()> {
        let write = || -> std::io::Result<()> {
            let tmp = path.with_extension("json.tmp");
            let mut f = File::create(&tmp)?;
            let data = serde_json::to_string_pretty(self)?;
            f.write_all(data.as_bytes())?;
            f.flush()?;
            fs::rename(tmp, path)
        };
        write().map_err(Error::data_access)
    }
}

/// Table store backed by one JSON file, or held in memory when no path is given.
///
/// File-backed instances re-read the file on every call so that a reload
/// always reflects what is persisted, including writes by other processes.
#[derive(Debug, Default)]
pub struct JsonBackend {
    path: Option<PathBuf>,
    memory: Tables,
}

impl JsonBackend {
    pub fn open(path: &Path) -> Self {
        Self {
            path: Some(path.to_path_buf()),
            memory: Tables::default(),
        }
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<Tables> {
        match &self.path {
            Some(path) => Tables::load(path),
            None => Ok(self.memory.clone()),
        }
    }

    fn write(&mut self, tables: Tables) -> Result<()> {
        match &self.path {
            Some(path) => tables.save(path),
            None => {
                self.memory = tables;
                Ok(())
            }
        }
    }
}

impl DataAccess for JsonBackend {
    fn select(&self, table: Table, filters: &[Filter], order: Option<&Order>) -> Result<Vec<Row>> {
        let tables = self.read()?;
        let mut rows: Vec<Row> = tables
            .rows(table)
            .iter()
            .filter(|row| matches_all(row, filters))
            .cloned()
            .collect();
        if let Some(order) = order {
            rows.sort_by(|a, b| {
                let a = a.get(&order.column).unwrap_or(&Value::Null);
                let b = b.get(&order.column).unwrap_or(&Value::Null);
                let ord = compare_values(a, b);
                if order.ascending { ord } else { ord.reverse() }
            });
        }
        Ok(rows)
    }

    fn insert(&mut self, table: Table, rows: Vec<Row>) -> Result<()> {
        let mut tables = self.read()?;
        for mut row in rows {
            for column in table.required_columns() {
                if row.get(*column).map_or(true, Value::is_null) {
                    return Err(Error::DataAccess(format!(
                        "null value in column \"{column}\" of relation \"{}\"",
                        table.name()
                    )));
                }
            }
            table.apply_defaults(&mut row);
            tables.rows_mut(table).push(row);
        }
        self.write(tables)
    }

    fn update(&mut self, table: Table, patch: &Row, filters: &[Filter]) -> Result<()> {
        let mut tables = self.read()?;
        let now = json!(Utc::now());
        for row in tables.rows_mut(table).iter_mut() {
            if matches_all(row, filters) {
                for (column, value) in patch {
                    row.insert(column.clone(), value.clone());
                }
                if table == Table::Tasks {
                    row.insert("updated_at".into(), now.clone());
                }
            }
        }
        self.write(tables)
    }

    fn delete(&mut self, table: Table, filters: &[Filter]) -> Result<()> {
        let mut tables = self.read()?;
        tables.rows_mut(table).retain(|row| !matches_all(row, filters));
        self.write(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_row(user: Uuid, title: &str, order_index: i64) -> Row {
        let mut row = Row::new();
        row.insert("user_id".into(), json!(user));
        row.insert("title".into(), json!(title));
        row.insert("deadline".into(), json!("2024-01-01T09:00:00Z"));
        row.insert("priority".into(), json!("low"));
        row.insert("category".into(), json!("work"));
        row.insert("order_index".into(), json!(order_index));
        row
    }

    #[test]
    fn insert_applies_schema_defaults() {
        let mut db = JsonBackend::in_memory();
        let mut row = task_row(Uuid::new_v4(), "a", 0);
        row.remove("order_index");
        db.insert(Table::Tasks, vec![row]).unwrap();
        let rows = db.select(Table::Tasks, &[], None).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0]["id"].is_string());
        assert_eq!(rows[0]["recurring"], json!("none"));
        assert_eq!(rows[0]["completed"], json!(false));
        assert_eq!(rows[0]["archived"], json!(false));
        assert_eq!(rows[0]["order_index"], json!(0));
    }

    #[test]
    fn insert_rejects_missing_required_column() {
        let mut db = JsonBackend::in_memory();
        let mut row = task_row(Uuid::new_v4(), "a", 0);
        row.remove("title");
        let err = db.insert(Table::Tasks, vec![row]).unwrap_err();
        assert!(matches!(err, Error::DataAccess(_)));
        assert!(db.select(Table::Tasks, &[], None).unwrap().is_empty());
    }

    #[test]
    fn select_filters_and_orders() {
        let mut db = JsonBackend::in_memory();
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        db.insert(
            Table::Tasks,
            vec![task_row(me, "c", 2), task_row(other, "x", 0), task_row(me, "a", 0), task_row(me, "b", 1)],
        )
        .unwrap();

        let mine = db
            .select(Table::Tasks, &[Filter::eq("user_id", me)], Some(&Order::asc("order_index")))
            .unwrap();
        let titles: Vec<_> = mine.iter().map(|r| r["title"].as_str().unwrap()).collect();
        assert_eq!(titles, ["a", "b", "c"]);

        let desc = db
            .select(Table::Tasks, &[Filter::eq("user_id", me)], Some(&Order { column: "title".into(), ascending: false }))
            .unwrap();
        assert_eq!(desc[0]["title"], json!("c"));
    }

    #[test]
    fn update_and_delete_touch_only_matching_rows() {
        let mut db = JsonBackend::in_memory();
        let me = Uuid::new_v4();
        db.insert(Table::Tasks, vec![task_row(me, "a", 0), task_row(me, "b", 1)]).unwrap();

        let mut patch = Row::new();
        patch.insert("completed".into(), json!(true));
        db.update(Table::Tasks, &patch, &[Filter::eq("title", "a")]).unwrap();
        let done = db.select(Table::Tasks, &[Filter::eq("completed", true)], None).unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0]["title"], json!("a"));

        db.delete(Table::Tasks, &[Filter::eq("title", "a")]).unwrap();
        let left = db.select(Table::Tasks, &[], None).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0]["title"], json!("b"));
    }

    #[test]
    fn file_backend_persists_between_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backend.json");
        let me = Uuid::new_v4();

        let mut writer = JsonBackend::open(&path);
        writer.insert(Table::Tasks, vec![task_row(me, "kept", 0)]).unwrap();

        let reader = JsonBackend::open(&path);
        let rows = reader.select(Table::Tasks, &[Filter::eq("user_id", me)], None).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], json!("kept"));
    }

    #[test]
    fn corrupt_file_is_a_data_access_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backend.json");
        fs::write(&path, "{ not json").unwrap();
        let db = JsonBackend::open(&path);
        assert!(matches!(db.select(Table::Tasks, &[], None), Err(Error::DataAccess(_))));
    }
}
