//! Bootstrap helpers for Curio.
//!
//! File: `~/.curio/.env` (standard dotenvy format), holding machine-local
//! values such as the RPC endpoint that should be available before any
//! config file is consulted.

use std::path::PathBuf;

/// Path to the Curio-specific `.env` file: `~/.curio/.env`.
pub fn curio_env_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".curio")
        .join(".env")
}

/// Load env vars from `~/.curio/.env` (in addition to the standard `.env`).
///
/// Call this **after** `dotenvy::dotenv()` so that the standard `./.env`
/// takes priority. dotenvy never overwrites existing vars, so the effective
/// priority is: explicit env vars > `./.env` > `~/.curio/.env`.
pub fn load_curio_env() {
    let path = curio_env_path();
    if path.exists() {
        let _ = dotenvy::from_path(&path);
    }
}
