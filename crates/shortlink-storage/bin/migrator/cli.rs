use clap::{Parser, ValueEnum};
use shortlink_telemetry::Environment;
use std::fmt::{Display, Formatter};

pub const ENV_ENV: &str = "SHORTLINK_ENV";
pub const STORAGE_PATH_ENV: &str = "SHORTLINK_STORAGE_PATH";
pub const DIRECTION_ENV: &str = "SHORTLINK_MIGRATION_DIRECTION";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    #[value(name = "up")]
    Up,
    #[value(name = "down")]
    Down,
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "shortlink-migrator", about = "Apply or revert the SQLite schema")]
pub struct Cli {
    #[arg(long, env = ENV_ENV, default_value_t = Environment::Local)]
    pub env: Environment,

    #[arg(long, env = STORAGE_PATH_ENV)]
    pub storage_path: String,

    #[arg(long, env = DIRECTION_ENV, value_enum, default_value_t = Direction::Up)]
    pub direction: Direction,
}
