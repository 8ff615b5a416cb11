//! Prepares a new installation.
//!
//! Creates the database tables (if missing) and the first administrator account, which is then
//! used to add everything else with `attendance-tracker admin ...`.

use anyhow::Context;
use attendance_tracker::NewAccount;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "setup", about = "Create the database and the first administrator")]
struct Args {
    /// Database to use instead of the configured one.
    #[arg(long)]
    database: Option<String>,

    #[arg(long)]
    admin_username: String,

    #[arg(long)]
    email: String,

    #[arg(long)]
    first_name: String,

    #[arg(long)]
    last_name: String,
}

pub fn main() -> anyhow::Result<()> {
    attendance_tracker::init_logging();

    let args = Args::parse();
    let mut manager = attendance_tracker::create_default_manager(args.database.as_deref())
        .context("failed to open the attendance database")?;

    manager.initialize()?;

    let admin = manager.create_admin(&NewAccount {
        username: args.admin_username,
        email: args.email,
        first_name: args.first_name,
        last_name: args.last_name,
        phone: None,
    })?;

    println!("Created administrator '{}' (id {}).", admin.username, admin.id);
    Ok(())
}
