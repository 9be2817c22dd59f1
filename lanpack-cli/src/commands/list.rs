use lanpack_model::RootKind;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use rusqlite::Connection;

use crate::error::CliError;

pub(crate) fn run_list(
    conn: &Connection,
    kind: Option<RootKind>,
    json: bool,
) -> Result<(), CliError> {
    let roots = lanpack_db::list_roots(conn, kind)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&roots)?);
        return Ok(());
    }

    if roots.is_empty() {
        log::info!("No roots in the library.");
        return Ok(());
    }

    let mut current_kind = None;
    for root in &roots {
        if current_kind != Some(root.kind) {
            if current_kind.is_some() {
                log::info!("");
            }
            current_kind = Some(root.kind);
            log::info!("{}:", root.kind.if_supports_color(Stdout, |t| t.bold()));
        }
        log::info!(
            "  {} {}",
            root.id.if_supports_color(Stdout, |t| t.dimmed()),
            root.name
        );
    }
    Ok(())
}
