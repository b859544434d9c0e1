//! Command implementations

pub mod check_name;
pub mod cleanup;
pub mod profile;
pub mod run;

use crate::error::Result as CliResult;
use std::io::{self, Write};

/// Ask a y/N question on stdout; anything but "y"/"yes" is a no
pub(crate) fn confirm(prompt: &str) -> CliResult<bool> {
    print!("{} (y/N): ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim().to_lowercase();

    Ok(input == "y" || input == "yes")
}
