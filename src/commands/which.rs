//! Which command - map paths back to torrents and files

use std::io::Write;

use crate::{TrpcError, finder::Finder, output, rpc::RpcClient};

type Result<T> = std::result::Result<T, TrpcError>;

/// Execute the which command
///
/// Paths no torrent claims are reported on stderr, or with `missing`
/// printed as the only output. They never make the command fail.
///
/// # Errors
///
/// Returns `TrpcError` if the daemon fails or writing fails.
pub fn execute<C: RpcClient, W: Write>(
    client: &C,
    paths: &[String],
    missing: bool,
    out: &mut W,
) -> Result<()> {
    let mut finder = Finder::new(client)?;

    for path in paths {
        match finder.find(path)? {
            Some(location) if !missing => writeln!(out, "{}", output::which_line(path, &location))?,
            Some(_) => {}
            None if missing => writeln!(out, "{path}")?,
            None => eprintln!("{}", output::not_found(path)),
        }
    }
    Ok(())
}
