//! List command - one line per selected torrent, then the total

use std::io::Write;

use colored::Colorize;

use crate::{
    TrpcError,
    cli::FilterArgs,
    commands::OutputStyle,
    config::TrpcConfig,
    output,
    resolve::UnmatchedPolicy,
    rpc::RpcClient,
    select::{Request, Sort, process_torrents},
    torrent::{Derived, Deriver},
};

type Result<T> = std::result::Result<T, TrpcError>;

/// Execute the list command
///
/// Path arguments that match nothing make the command fail.
///
/// # Errors
///
/// Returns `TrpcError` if the filter is invalid, the daemon fails, no
/// argument resolves, or writing fails.
#[allow(clippy::too_many_arguments)]
pub fn execute<C: RpcClient, W: Write>(
    client: &C,
    config: &TrpcConfig,
    torrents: &[String],
    filter: &FilterArgs,
    sort: Option<Sort>,
    no_totals: bool,
    style: OutputStyle,
    out: &mut W,
) -> Result<()> {
    let deriver = Deriver::new(&config.trackernames, config.zero_size());
    let request = Request::new(torrents.to_vec())
        .filter(filter.into())
        .sort(sort)
        .totals(!no_totals)
        .policy(UnmatchedPolicy::Abort);

    if !style.quiet {
        let header = output::list_header();
        if style.color {
            writeln!(out, "{}", header.bold())?;
        } else {
            writeln!(out, "{header}")?;
        }
    }

    let outcome = process_torrents(client, &request, &deriver, |_, record| {
        write_line(out, record, style)
    })?;

    if let Some(total) = outcome.total {
        write_line(out, &total, style)?;
    }
    Ok(())
}

fn write_line<W: Write>(out: &mut W, record: &Derived, style: OutputStyle) -> Result<()> {
    let line = output::list_line(record);
    if style.color {
        writeln!(out, "{}", output::colorize_list_line(&line, record))?;
    } else {
        writeln!(out, "{line}")?;
    }
    Ok(())
}
