use bartleby_core::{row, Connect, DebugConnection, Executable, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let conn = DebugConnection::new();

    let rows = (1..=5).map(|id| row! { "id" => id, "label" => format!("item-{id}") });
    let affected = conn
        .insert_bulk("items", rows)
        .batch(2)
        .add_to_row(row! { "source" => "demo" })
        .exec(&conn)
        .await?;
    println!("bulk insert affected {affected} rows");

    let id = conn
        .insert("items", row! { "label" => "single" })
        .exec_and_get_last_id(&conn)
        .await?;
    println!("last insert id: {id}");

    conn.update("items")
        .set("label", "renamed")
        .where_eq("id", 1)
        .exec(&conn)
        .await?;

    for sql in conn.executed() {
        println!("{sql}");
    }

    Ok(())
}
