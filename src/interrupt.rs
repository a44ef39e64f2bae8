//! Ctrl-C handling.
//!
//! The first SIGINT cancels the running command; dropping its future closes
//! any open issue view, which in turn drops outstanding responses and
//! background re-analysis. A second SIGINT exits immediately.

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub const EXIT_INTERRUPTED: i32 = 130;

pub struct Interrupt {
    token: CancellationToken,
    #[cfg(unix)]
    handle: signal_hook::iterator::Handle,
}

impl Interrupt {
    #[cfg(unix)]
    pub fn install() -> std::io::Result<Self> {
        use signal_hook::consts::SIGINT;
        use signal_hook::iterator::Signals;

        let mut signals = Signals::new([SIGINT])?;
        let handle = signals.handle();
        let token = CancellationToken::new();
        let watched = token.clone();

        std::thread::Builder::new()
            .name("issuedesk-sigint".into())
            .spawn(move || {
                for signal in signals.forever() {
                    if watched.is_cancelled() {
                        warn!(signal, "interrupted twice, exiting");
                        std::process::exit(EXIT_INTERRUPTED);
                    }
                    debug!(signal, "interrupt received");
                    watched.cancel();
                }
            })?;

        Ok(Interrupt { token, handle })
    }

    #[cfg(not(unix))]
    pub fn install() -> std::io::Result<Self> {
        Ok(Interrupt {
            token: CancellationToken::new(),
        })
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_interrupted(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for Interrupt {
    fn drop(&mut self) {
        #[cfg(unix)]
        self.handle.close();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_sigint_cancels_token() {
        let interrupt = Interrupt::install().unwrap();
        assert!(!interrupt.is_interrupted());

        signal_hook::low_level::raise(signal_hook::consts::SIGINT).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while !interrupt.is_interrupted() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(interrupt.token().is_cancelled());
    }
}
