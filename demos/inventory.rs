//! Small walk through the registry API.
//!
//! ```sh
//! RUST_LOG=debug cargo run --example inventory -- inventory.db
//! ```

use anyhow::Result;
use sqlite_tables::{Database, Value};

fn main() -> Result<()> {
    env_logger::init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "inventory.db".to_string());
    let mut db = Database::open_fresh(&path)?;

    let table = db.create_table(
        "myTable",
        "num INTEGER PRIMARY KEY AUTOINCREMENT, name VARCHAR(20), age INT, height FLOAT",
    )?;
    table.insert(&[Value::from("Mika"), Value::from(20), Value::from(185.0)])?;
    table.insert(&[Value::from("MaX"), Value::from(20), Value::from(183.5)])?;
    table.insert(&[Value::from("Serj"), Value::from(26), Value::from(184.3)])?;

    println!("{:?}", table.get(1, &[])?);
    println!("{:?}", table.get(2, &["height"])?);
    println!("{:?}", table.get(3, &["age", "height", "name"])?);
    println!("{:?}", table.get(2, &["*"])?);

    for name in db.get_existing_table_names()? {
        println!("{name}: {:?}", db.get_table_columns(&name)?);
    }

    let other = Database::open(&path)?;
    if let Some(table) = other.table("myTable") {
        println!("seen from a second registry: {:?}", table.get(3, &[])?);
    }
    Ok(())
}
