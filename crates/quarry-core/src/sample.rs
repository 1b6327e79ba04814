//! Built-in sample tables.
//!
//! Fixed literal data so previews and tests are deterministic across runs.

use crate::schema::{ColumnDef, ColumnType, Schema};
use crate::value::{Row, Value};

fn row(pairs: Vec<(&str, Value)>) -> Row {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

pub(crate) fn sample_tables() -> Vec<(Schema, Vec<Row>)> {
    vec![users(), orders(), products()]
}

fn users() -> (Schema, Vec<Row>) {
    let schema = Schema::new(
        "users",
        vec![
            ColumnDef::new("id", ColumnType::Integer, false),
            ColumnDef::new("name", ColumnType::Varchar, false),
            ColumnDef::new("email", ColumnType::Varchar, true),
            ColumnDef::new("age", ColumnType::Integer, false),
            ColumnDef::new("status", ColumnType::Varchar, false),
            ColumnDef::new("created_at", ColumnType::Date, false),
        ],
    );
    let rows = vec![
        row(vec![
            ("id", Value::Int(1)),
            ("name", text("Alice Nguyen")),
            ("email", text("alice@gmail.com")),
            ("age", Value::Int(25)),
            ("status", text("active")),
            ("created_at", text("2023-01-14")),
        ]),
        row(vec![
            ("id", Value::Int(2)),
            ("name", text("Bruno Costa")),
            ("email", text("bruno@example.org")),
            ("age", Value::Int(40)),
            ("status", text("active")),
            ("created_at", text("2023-02-02")),
        ]),
        row(vec![
            ("id", Value::Int(3)),
            ("name", text("Chen Wei")),
            ("email", Value::Null),
            ("age", Value::Int(17)),
            ("status", text("pending")),
            ("created_at", text("2023-02-19")),
        ]),
        row(vec![
            ("id", Value::Int(4)),
            ("name", text("Dana Whitfield")),
            ("email", text("dana@gmail.com")),
            ("age", Value::Int(32)),
            ("status", text("inactive")),
            ("created_at", text("2023-03-07")),
        ]),
        row(vec![
            ("id", Value::Int(5)),
            ("name", text("Emre Aydin")),
            ("email", text("emre@workmail.io")),
            ("age", Value::Int(29)),
            ("status", text("active")),
            ("created_at", text("2023-04-23")),
        ]),
        row(vec![
            ("id", Value::Int(6)),
            ("name", text("Farah Haddad")),
            ("email", text("farah@gmail.co")),
            ("age", Value::Int(25)),
            ("status", text("inactive")),
            ("created_at", text("2023-05-30")),
        ]),
        row(vec![
            ("id", Value::Int(7)),
            ("name", text("Grete Lindqvist")),
            ("email", Value::Null),
            ("age", Value::Int(51)),
            ("status", text("active")),
            ("created_at", text("2023-06-11")),
        ]),
        row(vec![
            ("id", Value::Int(8)),
            ("name", text("Hiro Tanaka")),
            ("email", text("hiro@gmail.com")),
            ("age", Value::Int(34)),
            ("status", text("pending")),
            ("created_at", text("2023-07-25")),
        ]),
    ];
    (schema, rows)
}

fn orders() -> (Schema, Vec<Row>) {
    let schema = Schema::new(
        "orders",
        vec![
            ColumnDef::new("id", ColumnType::Integer, false),
            ColumnDef::new("user_id", ColumnType::Integer, false),
            ColumnDef::new("product", ColumnType::Varchar, false),
            ColumnDef::new("quantity", ColumnType::Integer, false),
            ColumnDef::new("total", ColumnType::Integer, false),
            ColumnDef::new("ordered_at", ColumnType::Timestamp, false),
        ],
    );
    let rows = vec![
        row(vec![
            ("id", Value::Int(101)),
            ("user_id", Value::Int(1)),
            ("product", text("Notebook")),
            ("quantity", Value::Int(3)),
            ("total", Value::Int(27)),
            ("ordered_at", text("2023-03-01 09:15:00")),
        ]),
        row(vec![
            ("id", Value::Int(102)),
            ("user_id", Value::Int(1)),
            ("product", text("Desk Lamp")),
            ("quantity", Value::Int(1)),
            ("total", Value::Int(45)),
            ("ordered_at", text("2023-03-14 18:02:00")),
        ]),
        row(vec![
            ("id", Value::Int(103)),
            ("user_id", Value::Int(2)),
            ("product", text("Monitor")),
            ("quantity", Value::Int(2)),
            ("total", Value::Int(380)),
            ("ordered_at", text("2023-04-02 11:40:00")),
        ]),
        row(vec![
            ("id", Value::Int(104)),
            ("user_id", Value::Int(4)),
            ("product", text("Notebook")),
            ("quantity", Value::Int(5)),
            ("total", Value::Int(45)),
            ("ordered_at", text("2023-04-28 15:55:00")),
        ]),
        row(vec![
            ("id", Value::Int(105)),
            ("user_id", Value::Int(5)),
            ("product", text("Keyboard")),
            ("quantity", Value::Int(1)),
            ("total", Value::Int(120)),
            ("ordered_at", text("2023-05-09 08:30:00")),
        ]),
        row(vec![
            ("id", Value::Int(106)),
            ("user_id", Value::Int(999)),
            ("product", text("Ghost Chair")),
            ("quantity", Value::Int(1)),
            ("total", Value::Int(60)),
            ("ordered_at", text("2023-05-21 20:10:00")),
        ]),
        row(vec![
            ("id", Value::Int(107)),
            ("user_id", Value::Int(2)),
            ("product", text("Desk Lamp")),
            ("quantity", Value::Int(2)),
            ("total", Value::Int(90)),
            ("ordered_at", text("2023-06-17 13:05:00")),
        ]),
    ];
    (schema, rows)
}

fn products() -> (Schema, Vec<Row>) {
    let schema = Schema::new(
        "products",
        vec![
            ColumnDef::new("id", ColumnType::Integer, false),
            ColumnDef::new("name", ColumnType::Varchar, false),
            ColumnDef::new("price", ColumnType::Integer, false),
            ColumnDef::new("category", ColumnType::Varchar, false),
            ColumnDef::new("in_stock", ColumnType::Boolean, false),
        ],
    );
    let rows = vec![
        row(vec![
            ("id", Value::Int(1)),
            ("name", text("Notebook")),
            ("price", Value::Int(9)),
            ("category", text("stationery")),
            ("in_stock", Value::Bool(true)),
        ]),
        row(vec![
            ("id", Value::Int(2)),
            ("name", text("Desk Lamp")),
            ("price", Value::Int(45)),
            ("category", text("furniture")),
            ("in_stock", Value::Bool(true)),
        ]),
        row(vec![
            ("id", Value::Int(3)),
            ("name", text("Monitor")),
            ("price", Value::Int(190)),
            ("category", text("electronics")),
            ("in_stock", Value::Bool(false)),
        ]),
        row(vec![
            ("id", Value::Int(4)),
            ("name", text("Keyboard")),
            ("price", Value::Int(120)),
            ("category", text("electronics")),
            ("in_stock", Value::Bool(true)),
        ]),
        row(vec![
            ("id", Value::Int(5)),
            ("name", text("Ghost Chair")),
            ("price", Value::Int(60)),
            ("category", text("furniture")),
            ("in_stock", Value::Bool(false)),
        ]),
        row(vec![
            ("id", Value::Int(6)),
            ("name", text("Sticky Notes")),
            ("price", Value::Int(4)),
            ("category", text("stationery")),
            ("in_stock", Value::Bool(true)),
        ]),
    ];
    (schema, rows)
}
