//! User store command handlers.

use usershare::config::UsershareConfig;
use usershare::models::User;
use usershare::storage::{FileStore, UserStore};
use usershare::{Error, Result};

use super::ListFormat;

/// Executes the list command.
pub fn cmd_list(config: &UsershareConfig, format: ListFormat) -> Result<()> {
    let store = FileStore::open(&config.data_dir)?;
    let users = store.all_users()?;

    match format {
        ListFormat::Json => {
            let json = serde_json::to_string_pretty(&users).map_err(|e| {
                Error::OperationFailed {
                    operation: "render_users".to_string(),
                    cause: e.to_string(),
                }
            })?;
            println!("{json}");
        },
        ListFormat::Table => {
            if users.is_empty() {
                println!("No users stored in {}", store.path().display());
                return Ok(());
            }
            print!("{}", render_table(&users));
            println!();
            println!("{} users", users.len());
        },
    }

    Ok(())
}

/// Executes the add command.
pub fn cmd_add(
    config: &UsershareConfig,
    id: String,
    name: Option<String>,
    visits: u64,
) -> Result<()> {
    let user = User::new(id)
        .with_display_name(name.unwrap_or_default())
        .with_visit_count(visits);

    let mut store = FileStore::open(&config.data_dir)?;
    let summary = store.upsert_users(std::slice::from_ref(&user))?;

    if summary.inserted > 0 {
        println!("Added user {}", user.id);
    } else {
        println!("Updated user {}", user.id);
    }
    Ok(())
}

/// Executes the delete command.
pub fn cmd_delete(config: &UsershareConfig, id: &str) -> Result<()> {
    let mut store = FileStore::open(&config.data_dir)?;
    if store.delete_user(id)? {
        println!("Deleted user {id}");
    } else {
        println!("No user with id {id}");
    }
    Ok(())
}

fn render_table(users: &[User]) -> String {
    let width = |text: &str| text.chars().count();
    let id_width = users.iter().map(|u| width(&u.id)).max().unwrap_or(0).max(2);
    let name_width = users
        .iter()
        .map(|u| width(&u.display_name))
        .max()
        .unwrap_or(0)
        .max(4);

    // `{:<w$}` pads by char count, matching `width`.
    let mut out = format!("{:<id_width$}  {:<name_width$}  VISITS\n", "ID", "NAME");
    for user in users {
        out.push_str(&format!(
            "{:<id_width$}  {:<name_width$}  {}\n",
            user.id, user.display_name, user.visit_count
        ));
    }
    out
}
