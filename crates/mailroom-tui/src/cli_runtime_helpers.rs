use anyhow::Result;
use clap::Parser;
use serde_json::{Value as JsonValue, json};

use super::{CLI_SCHEMA_VERSION, Cli, CliCommand, shell_split};

pub(crate) fn envelope_ok(value: JsonValue) -> JsonValue {
    json!({
        "schema": CLI_SCHEMA_VERSION,
        "ok": true,
        "result": value
    })
}

pub(crate) fn envelope_error(message: &str) -> JsonValue {
    json!({
        "schema": CLI_SCHEMA_VERSION,
        "ok": false,
        "error": message
    })
}

pub(crate) fn output_ok(value: JsonValue) -> Result<()> {
    println!("{}", serde_json::to_string(&envelope_ok(value))?);
    Ok(())
}

pub(crate) fn output_error(message: &str) -> Result<()> {
    println!("{}", serde_json::to_string(&envelope_error(message))?);
    Ok(())
}

/// Returns whether CLI mode was requested, plus the command to run.
pub(crate) fn resolve_cli_command(cli: Cli) -> Result<(bool, Option<CliCommand>)> {
    let cli_requested = cli.cmd.is_some() || cli.command.is_some();
    if let Some(cmd) = cli.cmd {
        let parts = shell_split(&cmd).map_err(|e| anyhow::anyhow!(e.to_string()))?;
        if parts.is_empty() {
            return Ok((true, None));
        }
        let mut args = Vec::with_capacity(parts.len() + 1);
        args.push("mailroom".to_string());
        args.extend(parts);
        let parsed = Cli::try_parse_from(args).map_err(|e| anyhow::anyhow!(e.to_string()))?;
        return Ok((true, parsed.command));
    }
    Ok((cli_requested, cli.command))
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{envelope_error, envelope_ok, resolve_cli_command};
    use crate::cli::{Cli, CliCommand, SendCmd, ShowCmd};

    #[test]
    fn cmd_string_is_split_like_a_shell() {
        let cli = Cli::try_parse_from([
            "mailroom",
            "-c",
            "send --to 'a@x.com, b@x.com' --subject \"Hi there\" --body Hey",
        ])
        .unwrap();
        let (requested, command) = resolve_cli_command(cli).unwrap();
        assert!(requested);
        assert_eq!(
            command,
            Some(CliCommand::Send(SendCmd {
                to: "a@x.com, b@x.com".to_string(),
                subject: "Hi there".to_string(),
                body: "Hey".to_string(),
            }))
        );
    }

    #[test]
    fn no_arguments_means_interactive() {
        let cli = Cli::try_parse_from(["mailroom", "--demo"]).unwrap();
        assert!(cli.demo);
        assert_eq!(resolve_cli_command(cli).unwrap(), (false, None));
    }

    #[test]
    fn subcommand_flags_parse() {
        let cli = Cli::try_parse_from(["mailroom", "show", "7", "--no-mark-read"]).unwrap();
        assert_eq!(
            resolve_cli_command(cli).unwrap().1,
            Some(CliCommand::Show(ShowCmd {
                id: 7,
                no_mark_read: true
            }))
        );
    }

    #[test]
    fn unbalanced_quotes_are_an_error() {
        let cli = Cli::try_parse_from(["mailroom", "-c", "send --to 'oops"]).unwrap();
        assert!(resolve_cli_command(cli).is_err());
    }

    #[test]
    fn envelopes_carry_schema() {
        let ok = envelope_ok(serde_json::json!([1, 2]));
        assert_eq!(ok["schema"], "mailroom.cli.v1");
        assert_eq!(ok["ok"], true);
        assert_eq!(ok["result"][1], 2);

        let err = envelope_error("nope");
        assert_eq!(err["ok"], false);
        assert_eq!(err["error"], "nope");
    }
}
