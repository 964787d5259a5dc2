use std::io::{self, Write};

use serde::Serialize;

use crate::envelope::Envelope;
use crate::error::CliError;

/// Writes one envelope to stdout as a single JSON document.
pub fn render<T: Serialize>(envelope: &Envelope<T>, pretty: bool) -> Result<(), CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(envelope)?
    } else {
        serde_json::to_string(envelope)?
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{payload}")?;
    handle.flush()?;
    Ok(())
}
