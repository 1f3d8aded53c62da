//! Compiles `QueryParameters` to SQL over the `documents` table.
//!
//! The result must select the same records in the same order as
//! `standards_core::query::apply`. Entity fields are read with `json_extract`
//! and typed with `json_type`, so a string field never matches a numeric
//! literal numerically and a number never matches text.

use rusqlite::types::Value as SqlValue;

use standards_core::domain::EntityKind;
use standards_core::query::{
    Filter, FilterOp, Literal, QueryParameters, SortDirection, SortField, RECORD_FIELDS,
};

use super::conversions::json_path;
use super::schema::DOCUMENT_COLUMNS;

/// SQL text plus positional parameters, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub count_sql: String,
    pub count_params: Vec<SqlValue>,
    pub select_sql: String,
    pub select_params: Vec<SqlValue>,
}

#[derive(Default)]
struct Params(Vec<SqlValue>);

impl Params {
    fn bind(&mut self, value: impl Into<SqlValue>) -> &'static str {
        self.0.push(value.into());
        "?"
    }
}

/// A column or JSON field as an SQL expression.
enum Operand {
    /// `id`, `created_at` or `updated_at`: always text.
    Column(&'static str),
    /// An entity field. The name has passed `validate_field`, so it is safe
    /// inside a quoted JSON path.
    Json(String),
}

impl Operand {
    fn new(field: &str) -> Self {
        match RECORD_FIELDS.iter().find(|f| **f == field) {
            Some(column) => Operand::Column(column),
            None => Operand::Json(json_path(field)),
        }
    }

    fn value(&self) -> String {
        match self {
            Operand::Column(column) => (*column).to_string(),
            Operand::Json(path) => format!("json_extract(fields, '{path}')"),
        }
    }

    fn json_type(&self) -> String {
        match self {
            Operand::Column(_) => "'text'".to_string(),
            Operand::Json(path) => format!("json_type(fields, '{path}')"),
        }
    }
}

/// `value symbol operand` following the typing rules: text compares against
/// the raw operand, numbers and booleans only against matching literals.
fn typed_comparison(
    value: &str,
    json_type: &str,
    symbol: &str,
    filter: &Filter,
    params: &mut Params,
) -> String {
    let raw = &filter.value.raw;
    match filter.value.literal {
        Literal::Null if symbol == "=" => {
            format!("({json_type} IS NULL OR {json_type} = 'null')")
        }
        Literal::Null => "0".to_string(),
        Literal::Text => format!(
            "({json_type} = 'text' AND {value} {symbol} {})",
            params.bind(raw.clone())
        ),
        Literal::Number(n) => format!(
            "(({json_type} = 'text' AND {value} {symbol} {}) OR ({json_type} IN ('integer', 'real') AND {value} {symbol} {}))",
            params.bind(raw.clone()),
            params.bind(n)
        ),
        Literal::Bool(b) => format!(
            "(({json_type} = 'text' AND {value} {symbol} {}) OR ({json_type} IN ('true', 'false') AND {value} {symbol} {}))",
            params.bind(raw.clone()),
            params.bind(i64::from(b))
        ),
    }
}

fn filter_sql(filter: &Filter, params: &mut Params) -> String {
    let operand = Operand::new(&filter.field);
    let value = operand.value();
    let json_type = operand.json_type();

    let symbol = match filter.op {
        FilterOp::Eq => "=",
        FilterOp::Gt => ">",
        FilterOp::Gte => ">=",
        FilterOp::Lt => "<",
        FilterOp::Lte => "<=",
        FilterOp::Ne => {
            return format!(
                "NOT COALESCE({}, 0)",
                typed_comparison(&value, &json_type, "=", filter, params)
            )
        }
        FilterOp::Contains => {
            let text = format!(
                "({json_type} = 'text' AND instr(lower({value}), lower({})) > 0)",
                params.bind(filter.value.raw.clone())
            );
            return match &operand {
                Operand::Column(_) => format!("COALESCE({text}, 0)"),
                Operand::Json(path) => {
                    let element = typed_comparison("je.value", "je.type", "=", filter, params);
                    format!(
                        "COALESCE(({text} OR ({json_type} = 'array' AND EXISTS (SELECT 1 FROM json_each(fields, '{path}') je WHERE {element}))), 0)"
                    )
                }
            };
        }
        FilterOp::StartsWith => {
            let raw = filter.value.raw.clone();
            return format!(
                "COALESCE(({json_type} = 'text' AND substr(lower({value}), 1, length({})) = lower({})), 0)",
                params.bind(raw.clone()),
                params.bind(raw)
            );
        }
    };

    format!(
        "COALESCE({}, 0)",
        typed_comparison(&value, &json_type, symbol, filter, params)
    )
}

fn search_sql(search: &str, params: &mut Params) -> String {
    format!(
        "EXISTS (SELECT 1 FROM json_each(fields) je WHERE je.type = 'text' AND instr(lower(je.value), lower({})) > 0)",
        params.bind(search.to_string())
    )
}

/// Null, then numbers and booleans, then text; arrays and objects sort as
/// their JSON text.
fn order_sql(sort: &SortField) -> String {
    let direction = match sort.direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    };
    match Operand::new(&sort.field) {
        Operand::Column(column) => format!("{column} {direction}"),
        operand => {
            let value = operand.value();
            let json_type = operand.json_type();
            format!(
                "CASE WHEN {json_type} IS NULL OR {json_type} = 'null' THEN 0 \
                 WHEN {json_type} IN ('integer', 'real', 'true', 'false') THEN 1 \
                 ELSE 2 END {direction}, {value} {direction}"
            )
        }
    }
}

/// Builds the count and page queries for one kind.
pub fn compile(kind: EntityKind, query: &QueryParameters) -> CompiledQuery {
    let mut params = Params::default();
    let mut conditions = vec![format!("kind = {}", params.bind(kind.as_str().to_string()))];
    conditions.extend(query.filters.iter().map(|f| filter_sql(f, &mut params)));
    if let Some(search) = &query.search {
        conditions.push(search_sql(search, &mut params));
    }
    let where_sql = conditions.join(" AND ");

    let mut order: Vec<String> = if query.sort.is_empty() {
        vec!["created_at ASC".to_string()]
    } else {
        query.sort.iter().map(order_sql).collect()
    };
    order.push("id ASC".to_string());

    let count_sql = format!("SELECT COUNT(*) FROM documents WHERE {where_sql}");
    let count_params = params.0.clone();

    let mut select_params = params.0;
    select_params.push(SqlValue::Integer(i64::from(query.page_size)));
    select_params.push(SqlValue::Integer(
        i64::try_from(query.offset()).unwrap_or(i64::MAX),
    ));
    let select_sql = format!(
        "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE {where_sql} ORDER BY {} LIMIT ? OFFSET ?",
        order.join(", ")
    );

    CompiledQuery {
        count_sql,
        count_params,
        select_sql,
        select_params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sqlite::conversions::{document_to_row, row_to_document};
    use crate::storage::sqlite::schema::{CREATE_TABLES, INSERT_DOCUMENT};
    use chrono::{Duration, TimeZone, Utc};
    use rusqlite::Connection;
    use serde_json::{json, Map, Value};
    use standards_core::query;
    use standards_core::storage::Document;
    use uuid::Uuid;

    fn document(n: i64, fields: Value) -> Document {
        let Value::Object(fields) = fields else {
            panic!("expected object");
        };
        let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(n);
        Document {
            kind: EntityKind::Room,
            id: Uuid::from_u128(n as u128),
            fields,
            created_at,
            updated_at: created_at,
        }
    }

    fn documents() -> Vec<Document> {
        vec![
            document(1, json!({"name": "Lab 101", "length": 5.0, "sector_id": null, "tags": ["a", "b"]})),
            document(2, json!({"name": "Office 102", "length": 3, "sector_id": "s1", "tags": []})),
            document(3, json!({"name": "lab storage", "length": 12.5, "comments": "Basement"})),
            document(4, json!({"name": "101", "length": 2, "active": true, "tags": ["b", 7]})),
            document(5, json!({"name": "Ünit hall", "length": 3, "active": false})),
        ]
    }

    fn database() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(CREATE_TABLES).unwrap();
        for document in documents() {
            let row = document_to_row(&document).unwrap();
            conn.execute(
                INSERT_DOCUMENT,
                rusqlite::params![row.kind, row.id, row.fields, row.created_at, row.updated_at],
            )
            .unwrap();
        }
        // A record of another kind must never show up.
        conn.execute(
            INSERT_DOCUMENT,
            rusqlite::params![
                "floor",
                Uuid::new_v4().to_string(),
                r#"{"name": "Lab 101"}"#,
                "2024-01-01T00:00:00.000000Z",
                "2024-01-01T00:00:00.000000Z"
            ],
        )
        .unwrap();
        conn
    }

    fn run_sql(conn: &Connection, raw: &str) -> (Vec<Uuid>, u64) {
        let params = QueryParameters::parse(raw).unwrap();
        let compiled = compile(EntityKind::Room, &params);
        let total: i64 = conn
            .query_row(
                &compiled.count_sql,
                rusqlite::params_from_iter(compiled.count_params.iter()),
                |row| row.get(0),
            )
            .unwrap();
        let mut stmt = conn.prepare(&compiled.select_sql).unwrap();
        let ids = stmt
            .query_map(
                rusqlite::params_from_iter(compiled.select_params.iter()),
                row_to_document,
            )
            .unwrap()
            .map(|d| d.unwrap().id)
            .collect();
        (ids, total as u64)
    }

    fn run_memory(raw: &str) -> (Vec<Uuid>, u64) {
        let params = QueryParameters::parse(raw).unwrap();
        let page = query::apply(documents(), &params, |d: &Document| -> Map<String, Value> {
            d.view()
        });
        (page.items.iter().map(|d| d.id).collect(), page.total)
    }

    #[test]
    fn test_sql_agrees_with_memory_evaluation() {
        let conn = database();
        let queries = [
            "",
            "filter=name:contains:LAB",
            "filter=name:starts_with:office",
            "filter=name:eq:101",
            "filter=name:gt:Lab",
            "filter=length:gte:5",
            "filter=length:lt:3",
            "filter=length:eq:3",
            "filter=length:ne:3",
            "filter=sector_id:eq:null",
            "filter=sector_id:ne:null",
            "filter=sector_id:gt:null",
            "filter=sector_id:ne:s1",
            "filter=active:eq:true",
            "filter=active:eq:1",
            "filter=active:ne:false",
            "filter=tags:contains:b",
            "filter=tags:contains:7",
            "filter=id:eq:00000000-0000-0000-0000-000000000002",
            "filter=created_at:gte:2024-01-01T00:03:00.000000Z",
            "search=lab",
            "search=basement",
            "search=2024",
            "search=ünit",
            "sort=-name",
            "sort=length,-id",
            "sort=-length",
            "sort=sector_id",
            "sort=-sector_id",
            "sort=active",
            "sort=tags",
            "sort=-updated_at",
            "filter=length:gte:3&sort=-length&page=2&page_size=2",
            "page=3&page_size=2",
            "page=9",
        ];

        for raw in queries {
            assert_eq!(run_sql(&conn, raw), run_memory(raw), "query {raw:?}");
        }
    }

    #[test]
    fn test_compiled_query_binds_kind_and_paging() {
        let params = QueryParameters::parse("page=3&page_size=10").unwrap();
        let compiled = compile(EntityKind::Unit, &params);

        assert_eq!(compiled.count_params, vec![SqlValue::Text("unit".to_string())]);
        assert_eq!(
            compiled.select_params[1..],
            [SqlValue::Integer(10), SqlValue::Integer(20)]
        );
        assert!(compiled.select_sql.ends_with("ORDER BY created_at ASC, id ASC LIMIT ? OFFSET ?"));
    }
}
