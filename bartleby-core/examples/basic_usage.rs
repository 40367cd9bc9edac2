use bartleby_core::{col, row, Connect, DebugConnection, QueryBuilder, Raw, Result};

fn main() -> Result<()> {
    let conn = DebugConnection::new();

    // SELECT with grouped conditions
    let select = conn
        .select("users", vec![col("id"), col("name"), col("email")])
        .where_gt("age", 18)
        .where_eq("status", "active")
        .where_sub_fn(|w| {
            w.like("city", "%York%").or_is_null("city");
        })
        .order_by_desc("created_at")
        .set_limit(Some(10), Some(5));
    println!("SELECT SQL: {}", select.to_sql()?);

    // INSERT with upsert
    let insert = conn
        .insert("users", row! {
            "name" => "John Doe",
            "email" => "john@example.com",
            "age" => 30,
        })
        .on_duplicate_key_update(row! { "logins" => Raw::new("`logins`+1") });
    println!("INSERT SQL: {}", insert.to_sql()?);

    // UPDATE
    let update = conn
        .update("users")
        .set_row(row! { "email" => "newemail@example.com", "last_login" => "2024-01-15" })
        .where_eq("id", 123)
        .where_eq("active", true);
    println!("UPDATE SQL: {}", update.to_sql()?);

    // DELETE
    let delete = conn
        .delete("users")
        .where_lt("age", 13)
        .or_where_lt("last_login", "2020-01-01")
        .limit(100);
    println!("DELETE SQL: {}", delete.to_sql()?);

    // IN with a sub-select
    let admins = conn.select("roles", vec!["user_id"]).where_eq("name", "admin");
    let privileged = conn.select("users", ()).where_in("id", admins);
    println!("Sub-select SQL: {}", privileged.to_sql()?);

    Ok(())
}
