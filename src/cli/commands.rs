use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sg", about = concat!("[~] sprig v", env!("CARGO_PKG_VERSION"), " - your tasks, in a tree"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different config directory
    #[arg(short = 'C', long = "config-dir", global = true)]
    pub config_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter config.toml
    Init(InitArgs),
    /// Sign in with Google interactively
    Signin,
    /// Sign out and clear the stored session
    Signout,
    /// Show config and session status
    Status,
    /// Print the task tree once
    List(ListArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Hide completed tasks (and their subtasks)
    #[arg(long)]
    pub pending: bool,
}
