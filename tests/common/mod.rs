//! Shared test utilities and fixtures

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Write `content` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write fixture");
    path
}

/// An empty user config, so tests never read `~/.localgate/config.toml`.
pub fn empty_config(dir: &Path) -> PathBuf {
    write_file(dir, "config.toml", "")
}

/// Run the `localgate` binary with `args`.
pub fn localgate(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_localgate"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("spawn localgate")
}

/// Shell snippet that fails with exit code 9 if another holder already owns
/// `dir/claim`, holds the claim briefly, then releases it.
pub fn exclusive_claim(dir: &Path) -> String {
    let claim = dir.join("claim");
    let claim = claim.display();
    format!("mkdir '{claim}' || exit 9; sleep 0.2; rmdir '{claim}'")
}
