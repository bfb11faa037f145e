//! FileTriage: runs pluggable analyzer modules over files and aggregates
//! their findings.
//!
//! Thin binary entry point. All logic lives in the `filetriage-core`
//! and `filetriage-cli` crates.

fn main() -> anyhow::Result<()> {
    filetriage_cli::run()
}
