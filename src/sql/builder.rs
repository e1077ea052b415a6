//! Builds parameterized SELECT, INSERT, UPDATE, DELETE for SQLite.
//! Table names come from config; projection expressions and predicates are passed through as given.

use crate::session::ValueSet;
use crate::sql::Selection;
use serde_json::Value;

/// Quote identifier for SQLite.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    fn new(sql: String) -> Self {
        Statement {
            sql,
            params: Vec::new(),
        }
    }

    fn push_where(&mut self, selection: &Selection) {
        if let Some(clause) = selection.clause() {
            self.sql.push_str(" WHERE ");
            self.sql.push_str(clause);
        }
        self.params
            .extend(selection.args.iter().cloned().map(Value::String));
    }
}

/// SELECT columns FROM table [WHERE selection] [ORDER BY sort_order]. Empty column list selects `*`.
pub fn select(table: &str, columns: &[String], selection: &Selection, sort_order: Option<&str>) -> Statement {
    let cols = if columns.is_empty() {
        "*".to_string()
    } else {
        columns.join(", ")
    };
    let mut q = Statement::new(format!("SELECT {} FROM {}", cols, quoted(table)));
    q.push_where(selection);
    if let Some(order) = sort_order.map(str::trim).filter(|s| !s.is_empty()) {
        q.sql.push_str(" ORDER BY ");
        q.sql.push_str(order);
    }
    q
}

/// INSERT one row. An empty value set inserts NULL into `null_column_hack`, or DEFAULT VALUES without one.
pub fn insert(table: &str, null_column_hack: Option<&str>, values: &ValueSet) -> Statement {
    if values.is_empty() {
        let sql = match null_column_hack {
            Some(col) => format!("INSERT INTO {} ({}) VALUES (NULL)", quoted(table), quoted(col)),
            None => format!("INSERT INTO {} DEFAULT VALUES", quoted(table)),
        };
        return Statement::new(sql);
    }
    let mut cols = Vec::with_capacity(values.len());
    let mut q = Statement::new(String::new());
    for (name, value) in values {
        cols.push(quoted(name));
        q.params.push(value.clone());
    }
    let placeholders = vec!["?"; cols.len()].join(", ");
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quoted(table),
        cols.join(", "),
        placeholders
    );
    q
}

/// UPDATE SET each value; value params come before selection args. Callers reject empty value sets.
pub fn update(table: &str, values: &ValueSet, selection: &Selection) -> Statement {
    let mut q = Statement::new(String::new());
    let mut sets = Vec::with_capacity(values.len());
    for (name, value) in values {
        sets.push(format!("{} = ?", quoted(name)));
        q.params.push(value.clone());
    }
    q.sql = format!("UPDATE {} SET {}", quoted(table), sets.join(", "));
    q.push_where(selection);
    q
}

/// DELETE FROM table [WHERE selection]. No selection deletes every row.
pub fn delete(table: &str, selection: &Selection) -> Statement {
    let mut q = Statement::new(format!("DELETE FROM {}", quoted(table)));
    q.push_where(selection);
    q
}
