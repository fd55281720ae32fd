pub mod probe;
pub mod result;

pub mod prelude {
    pub use super::probe::{DEFAULT_TIMEOUT, HttpProber, probe_url};
    pub use super::result::{Outcome, ProbeResult};
}

use std::fmt::Write;

/// Renders an error together with every `source()` below it.
pub(crate) fn report(mut err: &(dyn std::error::Error + 'static)) -> String {
    let mut s = format!("{}", err);
    while let Some(src) = err.source() {
        let _ = write!(s, "\n\nCaused by: {}", src);
        err = src;
    }
    s
}
