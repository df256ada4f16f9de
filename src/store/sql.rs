//! Builds parameterized SELECT, INSERT, UPDATE, DELETE for a mapped model.
//! Identifiers come from repository configuration only and are always quoted; values are parameters.

use serde_json::Value;

/// Quote identifier for PostgreSQL.
pub(crate) fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub(crate) fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

/// Alias for the addressed table in every statement; `to_jsonb` of it yields the full record.
const ROW_ALIAS: &str = "rec";

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum SqlParam {
    Text(String),
    Json(Value),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct QueryBuf {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: SqlParam) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

/// Table being addressed plus an optional foreign-key equality filter (relation scopes).
pub(crate) struct TableRef<'a> {
    pub schema: &'a str,
    pub table: &'a str,
    pub primary_key: &'a str,
    pub filter: Option<(&'a str, String)>,
}

impl TableRef<'_> {
    fn qualified(&self) -> String {
        qualified_table(self.schema, self.table)
    }

    fn push_filter(&self, q: &mut QueryBuf, where_parts: &mut Vec<String>) {
        if let Some((fk, value)) = &self.filter {
            let n = q.push_param(SqlParam::Text(value.clone()));
            where_parts.push(format!("{}.{}::text = ${}", ROW_ALIAS, quoted(fk), n));
        }
    }
}

fn where_clause(parts: &[String]) -> String {
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// SELECT every row in scope, ordered by primary key.
pub(crate) fn select_all(t: &TableRef<'_>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut where_parts = Vec::new();
    t.push_filter(&mut q, &mut where_parts);
    q.sql = format!(
        "SELECT to_jsonb({alias}) FROM {} AS {alias}{} ORDER BY {alias}.{}",
        t.qualified(),
        where_clause(&where_parts),
        quoted(t.primary_key),
        alias = ROW_ALIAS,
    );
    q
}

/// SELECT one row in scope by primary key (compared as text so any key type works).
pub(crate) fn select_by_id(t: &TableRef<'_>, id: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(SqlParam::Text(id.to_string()));
    let mut where_parts = vec![format!("{}.{}::text = ${}", ROW_ALIAS, quoted(t.primary_key), n)];
    t.push_filter(&mut q, &mut where_parts);
    q.sql = format!(
        "SELECT to_jsonb({alias}) FROM {} AS {alias}{}",
        t.qualified(),
        where_clause(&where_parts),
        alias = ROW_ALIAS,
    );
    q
}

/// INSERT the given columns, letting Postgres coerce types through `jsonb_populate_record`.
pub(crate) fn insert(t: &TableRef<'_>, columns: &[String], body: Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = t.qualified();
    if columns.is_empty() {
        q.sql = format!(
            "INSERT INTO {} AS {alias} DEFAULT VALUES RETURNING to_jsonb({alias})",
            table,
            alias = ROW_ALIAS,
        );
        return q;
    }
    let n = q.push_param(SqlParam::Json(body));
    let cols = columns.iter().map(|c| quoted(c)).collect::<Vec<_>>().join(", ");
    q.sql = format!(
        "INSERT INTO {table} AS {alias} ({cols}) SELECT {cols} FROM jsonb_populate_record(NULL::{table}, ${n}) RETURNING to_jsonb({alias})",
        table = table,
        alias = ROW_ALIAS,
        cols = cols,
        n = n,
    );
    q
}

/// UPDATE only the given columns of one row. Caller handles the no-column case.
pub(crate) fn update(t: &TableRef<'_>, id: &str, columns: &[String], body: Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = t.qualified();
    let n_body = q.push_param(SqlParam::Json(body));
    let n_id = q.push_param(SqlParam::Text(id.to_string()));
    let sets = columns
        .iter()
        .map(|c| format!("{col} = src.{col}", col = quoted(c)))
        .collect::<Vec<_>>()
        .join(", ");
    q.sql = format!(
        "UPDATE {table} AS {alias} SET {sets} FROM jsonb_populate_record(NULL::{table}, ${n_body}) AS src \
         WHERE {alias}.{pk}::text = ${n_id} RETURNING to_jsonb({alias})",
        table = table,
        alias = ROW_ALIAS,
        sets = sets,
        n_body = n_body,
        pk = quoted(t.primary_key),
        n_id = n_id,
    );
    q
}

pub(crate) fn delete(t: &TableRef<'_>, id: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(SqlParam::Text(id.to_string()));
    q.sql = format!(
        "DELETE FROM {} AS {alias} WHERE {alias}.{}::text = ${}",
        t.qualified(),
        quoted(t.primary_key),
        n,
        alias = ROW_ALIAS,
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn comments(filter: Option<(&'static str, String)>) -> TableRef<'static> {
        TableRef {
            schema: "blog",
            table: "comments",
            primary_key: "id",
            filter,
        }
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quoted("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(qualified_table("blog", "posts"), "\"blog\".\"posts\"");
    }

    #[test]
    fn select_all_with_relation_filter() {
        let q = select_all(&comments(Some(("post_id", "5".into()))));
        assert_eq!(
            q.sql,
            "SELECT to_jsonb(rec) FROM \"blog\".\"comments\" AS rec WHERE rec.\"post_id\"::text = $1 ORDER BY rec.\"id\""
        );
        assert_eq!(q.params, vec![SqlParam::Text("5".into())]);
    }

    #[test]
    fn select_by_id_numbers_params_in_order() {
        let q = select_by_id(&comments(Some(("post_id", "5".into()))), "9");
        assert!(q.sql.ends_with("WHERE rec.\"id\"::text = $1 AND rec.\"post_id\"::text = $2"));
        assert_eq!(q.params, vec![SqlParam::Text("9".into()), SqlParam::Text("5".into())]);
    }

    #[test]
    fn insert_selects_from_populated_record() {
        let q = insert(&comments(None), &["body".into(), "post_id".into()], json!({ "body": "x", "post_id": 5 }));
        assert!(q.sql.starts_with("INSERT INTO \"blog\".\"comments\" AS rec (\"body\", \"post_id\") SELECT \"body\", \"post_id\""));
        assert!(q.sql.contains("jsonb_populate_record(NULL::\"blog\".\"comments\", $1)"));
        assert_eq!(q.params.len(), 1);

        let empty = insert(&comments(None), &[], json!({}));
        assert!(empty.sql.contains("DEFAULT VALUES"));
        assert!(empty.params.is_empty());
    }

    #[test]
    fn update_sets_only_given_columns() {
        let q = update(&comments(None), "3", &["body".into()], json!({ "body": "y" }));
        assert!(q.sql.contains("SET \"body\" = src.\"body\""));
        assert!(q.sql.contains("WHERE rec.\"id\"::text = $2"));
        assert_eq!(q.params[1], SqlParam::Text("3".into()));
    }

    #[test]
    fn delete_by_text_key() {
        let q = delete(&comments(None), "3");
        assert_eq!(q.sql, "DELETE FROM \"blog\".\"comments\" AS rec WHERE rec.\"id\"::text = $1");
    }
}
