//! Writes the eeburn manual pages
//!
//! One page for `eeburn` itself and one per subcommand (`eeburn-write.1`,
//! `eeburn-verify.1`, ...). Takes the target directory as its only
//! argument, `man/` if omitted.

use clap::CommandFactory;
use std::path::PathBuf;
use std::{env, fs, io};

#[path = "../cli.rs"]
mod cli;

fn main() -> io::Result<()> {
    let out_dir = env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));
    fs::create_dir_all(&out_dir)?;

    clap_mangen::generate_to(cli::Cli::command(), &out_dir)?;

    let mut pages: Vec<_> = fs::read_dir(&out_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("eeburn") && name.ends_with(".1"))
        })
        .collect();
    pages.sort();

    for page in &pages {
        println!("wrote {}", page.display());
    }
    if let Some(main_page) = pages.first() {
        println!("preview with: man -l {}", main_page.display());
    }

    Ok(())
}
