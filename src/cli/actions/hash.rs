use crate::auth::password;
use anyhow::{bail, Context, Result};
use std::io::BufRead;

#[derive(Debug)]
pub struct Args {
    pub password: Option<String>,
}

/// Print an argon2 PHC string for the given password (or the first line of stdin).
/// # Errors
/// Returns an error if stdin cannot be read, the password is empty, or hashing fails.
pub fn execute(args: Args) -> Result<()> {
    let plaintext = match args.password {
        Some(password) => password,
        None => read_line(std::io::stdin().lock())?,
    };

    println!("{}", hash_plaintext(&plaintext)?);

    Ok(())
}

fn read_line<R: BufRead>(mut reader: R) -> Result<String> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn hash_plaintext(plaintext: &str) -> Result<String> {
    if plaintext.trim().is_empty() {
        bail!("password must not be empty");
    }
    password::hash(plaintext)
}
