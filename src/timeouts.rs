//! Request timeout configuration.
//!
//! [`RequestTimeouts`] is consumed once by the transport builder to
//! parameterize the underlying `reqwest` client. A zero duration leaves the
//! corresponding reqwest default in place.

use std::time::Duration;

/// Default phase timeout (dial, TLS handshake, idle connection, response header).
pub const DEFAULT_PHASE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default wait for an HTTP/1.1 `100 Continue` response.
pub const DEFAULT_EXPECT_CONTINUE_TIMEOUT: Duration = Duration::from_secs(2);

/// Default deadline for a complete request/response exchange.
pub const DEFAULT_GLOBAL_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeouts applied to every request issued by a transport.
///
/// No validation is performed. A phase timeout larger than `global` is
/// allowed; such requests simply hit the global deadline first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTimeouts {
    /// Maximum time to establish the TCP connection.
    pub dial: Duration,
    /// Maximum time for the TLS handshake.
    pub tls_handshake: Duration,
    /// Wait for `100 Continue`. reqwest has no such knob; kept for completeness.
    pub expect_continue: Duration,
    /// How long an idle pooled connection is kept for reuse.
    pub idle_connection: Duration,
    /// Maximum wait between socket reads, which bounds the wait for response headers.
    pub response_header: Duration,
    /// Maximum duration of a single request and response, end to end.
    pub global: Duration,
}

impl Default for RequestTimeouts {
    fn default() -> Self {
        Self {
            dial: DEFAULT_PHASE_TIMEOUT,
            tls_handshake: DEFAULT_PHASE_TIMEOUT,
            expect_continue: DEFAULT_EXPECT_CONTINUE_TIMEOUT,
            idle_connection: DEFAULT_PHASE_TIMEOUT,
            response_header: DEFAULT_PHASE_TIMEOUT,
            global: DEFAULT_GLOBAL_TIMEOUT,
        }
    }
}

impl RequestTimeouts {
    /// Creates the default timeout set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the dial timeout.
    pub fn with_dial(mut self, timeout: Duration) -> Self {
        self.dial = timeout;
        self
    }

    /// Sets the TLS handshake timeout.
    pub fn with_tls_handshake(mut self, timeout: Duration) -> Self {
        self.tls_handshake = timeout;
        self
    }

    /// Sets the expect-continue timeout.
    pub fn with_expect_continue(mut self, timeout: Duration) -> Self {
        self.expect_continue = timeout;
        self
    }

    /// Sets the idle connection timeout.
    pub fn with_idle_connection(mut self, timeout: Duration) -> Self {
        self.idle_connection = timeout;
        self
    }

    /// Sets the response header timeout.
    pub fn with_response_header(mut self, timeout: Duration) -> Self {
        self.response_header = timeout;
        self
    }

    /// Sets the global timeout.
    pub fn with_global(mut self, timeout: Duration) -> Self {
        self.global = timeout;
        self
    }

    /// Connect budget handed to reqwest, whose connector covers dialing and TLS.
    ///
    /// Returns `None` when both phases are left at zero.
    pub fn connect(&self) -> Option<Duration> {
        non_zero(self.dial + self.tls_handshake)
    }

    /// Applies these timeouts to a reqwest client builder.
    pub(crate) fn apply(&self, mut builder: reqwest::ClientBuilder) -> reqwest::ClientBuilder {
        if let Some(global) = non_zero(self.global) {
            builder = builder.timeout(global);
        }
        if let Some(connect) = self.connect() {
            builder = builder.connect_timeout(connect);
        }
        if let Some(idle) = non_zero(self.idle_connection) {
            builder = builder.pool_idle_timeout(idle);
        }
        if let Some(read) = non_zero(self.response_header) {
            builder = builder.read_timeout(read);
        }
        builder
    }
}

fn non_zero(duration: Duration) -> Option<Duration> {
    (!duration.is_zero()).then_some(duration)
}
