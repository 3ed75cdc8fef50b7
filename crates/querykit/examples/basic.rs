//! Basic usage example for querykit
//!
//! Run with: cargo run --example basic -p querykit
//!
//! Optionally point QUERYKIT_CONFIG at a TOML file describing named
//! connections; otherwise an in-memory SQLite database is used.
//! Set RUST_LOG=querykit.sql=debug to see every executed statement.

use querykit::prelude::*;
use querykit::{AggregateFn, ConnectionConfig};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct User {
    id: i64,
    name: String,
    age: i64,
}

fn main() -> Result<(), DbError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match std::env::var("QUERYKIT_CONFIG") {
        Ok(path) => DatabaseConfig::load(path)?,
        Err(_) => DatabaseConfig::single("main", ConnectionConfig::sqlite(":memory:")),
    };
    let registry = ConnectionRegistry::new(config);
    let conn = registry.default_connection()?;

    conn.exec_raw(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            age INTEGER NOT NULL,
            visits INTEGER NOT NULL DEFAULT 0
        )",
    )?;
    conn.exec_raw("DELETE FROM users")?;

    // ============================================
    // Insert
    // ============================================
    println!("=== Insert ===");

    let id = conn
        .table("users")
        .insert(Record::new().set("name", "alice").set("age", 31))?;
    println!("inserted alice with id {id}");

    conn.table("users").insert(vec![
        Record::from([("name", Value::from("bob")), ("age", Value::from(17))]),
        Record::from([("name", Value::from("carol")), ("age", Value::from(45))]),
    ])?;

    // ============================================
    // Select
    // ============================================
    println!("\n=== Select ===");

    let adults = conn
        .table("users")
        .select(["id", "name", "age"])
        .where_op("age", ">=", 18)
        .order_by_asc("name")
        .get()?;
    for row in &adults {
        let user: User = row.deserialize()?;
        println!("{user:?}");
    }

    let bob = conn.table("users").find("name", "bob")?;
    println!("find(name = bob): {bob:?}");

    // ============================================
    // Update with a literal expression
    // ============================================
    println!("\n=== Update ===");

    let affected = conn
        .table("users")
        .where_in("name", ["alice", "carol"])
        .update(Record::new().set("visits", raw("visits + 1")))?;
    println!("updated {affected} rows");

    // ============================================
    // Aggregates
    // ============================================
    println!("\n=== Aggregates ===");

    let total = conn.table("users").count("*")?;
    let oldest = conn.table("users").aggregate(AggregateFn::Max, "age")?;
    println!("count = {total:?}, max(age) = {oldest:?}");

    // ============================================
    // Transaction
    // ============================================
    println!("\n=== Transaction ===");

    conn.begin_transaction(&["users"])?;
    let outcome = conn.table("users").update_or_insert(
        Record::from([("name", "dave")]),
        Record::from([("age", 52)]),
    );
    match outcome {
        Ok(outcome) => {
            conn.commit()?;
            println!("update_or_insert: {outcome:?}");
        }
        Err(e) => {
            conn.rollback()?;
            return Err(e);
        }
    }

    // ============================================
    // Diagnostics
    // ============================================
    println!("\n=== Diagnostics ===");

    let q = conn.table("users").where_eq("name", "O'Brien");
    println!("sql:          {}", q.to_sql()?);
    println!("interpolated: {}", q.to_interpolated_sql()?);

    if let Err(e) = conn.table("missing_table").get() {
        println!("error:\n{e}");
    }

    Ok(())
}
