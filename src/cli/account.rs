use crate::cli::CliContext;
use crate::core::identity::Identity;
use crate::error::StoreError;
use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use dialoguer::Password;
use std::io::Read;
use zeroize::Zeroizing;

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Identity (UUID)
    pub identity: Identity,

    /// Display name stored with the record
    pub name: String,

    /// Read the password from stdin instead of an interactive prompt
    #[arg(long)]
    pub from_stdin: bool,
}

#[derive(Args, Debug)]
pub struct PasswordArgs {
    /// Identity (UUID)
    pub identity: Identity,

    /// Read password(s) from stdin, one per line, instead of prompting
    #[arg(long)]
    pub from_stdin: bool,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Identity (UUID)
    pub identity: Identity,
}

struct Prompt<'a> {
    label: &'a str,
    confirm: bool,
}

const CURRENT: Prompt<'static> = Prompt {
    label: "Password",
    confirm: false,
};

pub fn run_register(ctx: &CliContext, args: RegisterArgs) -> Result<()> {
    let store = ctx.open_store()?;
    if store.is_registered(&args.identity) {
        bail!("{} is already registered; use `login`", args.identity);
    }
    let mut passwords = read_passwords(
        ctx,
        args.from_stdin,
        &[Prompt {
            label: "New password",
            confirm: true,
        }],
    )?;
    let password = passwords.remove(0);
    check_policy(ctx, &password)?;

    store
        .register(&args.identity, &args.name, &password)
        .map_err(explain)?;
    println!("Registered {} ({})", args.identity, args.name);
    Ok(())
}

pub fn run_login(ctx: &CliContext, args: PasswordArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let password = read_passwords(ctx, args.from_stdin, &[CURRENT])?.remove(0);
    if !store.verify(&args.identity, &password) {
        bail!("invalid credentials");
    }
    println!("Login successful");
    Ok(())
}

pub fn run_change_password(ctx: &CliContext, args: PasswordArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let mut passwords = read_passwords(
        ctx,
        args.from_stdin,
        &[
            Prompt {
                label: "Current password",
                confirm: false,
            },
            Prompt {
                label: "New password",
                confirm: true,
            },
        ],
    )?;
    let new_password = passwords.remove(1);
    let current = passwords.remove(0);

    if !store.verify(&args.identity, &current) {
        bail!("invalid credentials");
    }
    check_policy(ctx, &new_password)?;
    store
        .change_password(&args.identity, &new_password)
        .map_err(explain)?;
    println!("Password changed for {}", args.identity);
    Ok(())
}

pub fn run_delete(ctx: &CliContext, args: PasswordArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let password = read_passwords(ctx, args.from_stdin, &[CURRENT])?.remove(0);
    if !store.verify(&args.identity, &password) {
        bail!("invalid credentials");
    }
    store.delete_account(&args.identity).map_err(explain)?;
    println!("Deleted {}", args.identity);
    Ok(())
}

pub fn run_status(ctx: &CliContext, args: StatusArgs) -> Result<()> {
    let store = ctx.open_store()?;
    if store.is_registered(&args.identity) {
        println!("{}: registered", args.identity);
    } else {
        println!("{}: not registered", args.identity);
    }
    Ok(())
}

fn check_policy(ctx: &CliContext, password: &str) -> Result<()> {
    ctx.config
        .policy
        .check_password(password)
        .map_err(|msg| anyhow!("policy: {}", msg))
}

/// Turn a store failure into an operator-facing error.
fn explain(err: StoreError) -> anyhow::Error {
    match err {
        StoreError::AlreadyRegistered(id) => anyhow!("{} is already registered; use `login`", id),
        StoreError::NotRegistered(id) => anyhow!("{} is not registered; use `register`", id),
        StoreError::EmptyPassword => anyhow!("password must not be empty"),
        other => anyhow::Error::new(other).context("credential store failure"),
    }
}

fn read_passwords(ctx: &CliContext, from_stdin: bool, prompts: &[Prompt]) -> Result<Vec<Zeroizing<String>>> {
    if ctx.non_interactive && !from_stdin {
        bail!("--non-interactive requires --from-stdin");
    }
    if from_stdin {
        let mut buf = Zeroizing::new(String::new());
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read password from stdin")?;
        return password_lines(&buf, prompts.len());
    }
    prompts
        .iter()
        .map(|prompt| {
            let mut input = Password::new()
                .with_prompt(prompt.label)
                .allow_empty_password(false);
            if prompt.confirm {
                input = input.with_confirmation("Repeat password", "passwords do not match");
            }
            input
                .interact()
                .map(Zeroizing::new)
                .context("read password from prompt")
        })
        .collect()
}

/// First `count` lines of `input`, line endings stripped.
fn password_lines(input: &str, count: usize) -> Result<Vec<Zeroizing<String>>> {
    let lines: Vec<Zeroizing<String>> = input
        .split('\n')
        .take(count)
        .map(|line| Zeroizing::new(line.trim_end_matches('\r').to_string()))
        .collect();
    if lines.len() < count || lines.iter().any(|l| l.is_empty()) {
        bail!("expected {} non-empty password line(s) on stdin", count);
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_lines_single() {
        let lines = password_lines("hunter2\n", 1).unwrap();
        assert_eq!(lines[0].as_str(), "hunter2");
    }

    #[test]
    fn test_password_lines_crlf_and_spaces_kept() {
        let lines = password_lines("old pw\r\nnew pw \r\n", 2).unwrap();
        assert_eq!(lines[0].as_str(), "old pw");
        assert_eq!(lines[1].as_str(), "new pw ");
    }

    #[test]
    fn test_password_lines_without_trailing_newline() {
        let lines = password_lines("only", 1).unwrap();
        assert_eq!(lines[0].as_str(), "only");
    }

    #[test]
    fn test_password_lines_too_few() {
        assert!(password_lines("one\n", 2).is_err());
        assert!(password_lines("", 1).is_err());
    }

    #[test]
    fn test_explain_messages() {
        let id = Identity::new_random();
        assert!(explain(StoreError::AlreadyRegistered(id))
            .to_string()
            .contains("already registered"));
        assert!(explain(StoreError::NotRegistered(id))
            .to_string()
            .contains("not registered"));
        let storage = explain(StoreError::storage(
            "write record",
            std::io::Error::other("disk full"),
        ));
        assert_eq!(storage.to_string(), "credential store failure");
    }
}
