use std::io::{self, Write};

use crate::error::Error;

pub(super) fn report_error(err: &Error) {
    let mut out = io::stderr();
    if let Err(io_err) = report_error_to(err, &mut out) {
        let _ = writeln!(io::stderr(), "failed to report error: {io_err}");
    }
}

pub(super) fn report_error_to(err: &Error, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "{err}")?;
    if cfg!(debug_assertions) {
        if let Some(backtrace) = err.backtrace() {
            writeln!(out, "stack trace:")?;
            writeln!(out, "{backtrace}")?;
        }
    }
    Ok(())
}
