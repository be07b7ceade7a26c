use tokio::time::{Duration, Instant};

/// Length of a route's admission window.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Calls per window for ordinary routes.
pub const ORDINARY_LIMIT: u32 = 40;

/// Calls per window for console input routes (one call per submitted line).
pub const CONSOLE_INPUT_LIMIT: u32 = 120;

const CONSOLE_INPUT_SEGMENT: &str = "send_input";

/// Limit tier of a route, derived purely from the shape of its URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Configuration and listing endpoints
    Ordinary,
    /// Interactive console input submission
    ConsoleInput,
}

impl RouteClass {
    /// Classify a request path. Paths whose last segment is `send_input`
    /// (with or without a trailing slash or query string) are console input.
    pub fn classify(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let path = path.strip_suffix('/').unwrap_or(path);
        match path.rsplit('/').next() {
            Some(CONSOLE_INPUT_SEGMENT) => Self::ConsoleInput,
            _ => Self::Ordinary,
        }
    }

    /// Calls admitted per window
    pub const fn limit(self) -> u32 {
        match self {
            Self::Ordinary => ORDINARY_LIMIT,
            Self::ConsoleInput => CONSOLE_INPUT_LIMIT,
        }
    }
}

/// Result of one admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The call may proceed
    Admitted,
    /// The call must not be sent; the window closes after `retry_after`
    Denied {
        /// Time until the route's window closes
        retry_after: Duration,
    },
}

/// Throttle state for one endpoint.
#[derive(Debug)]
pub struct Route {
    url: String,
    class: RouteClass,
    calls: u32,
    window_end: Instant,
}

impl Route {
    /// Fresh route. Its window is already closed, so the first admission opens one.
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            class: RouteClass::classify(&url),
            url,
            calls: 0,
            window_end: Instant::now(),
        }
    }

    /// Run one admission check at `now`.
    ///
    /// A closed window (`now >= window_end`) resets the counter so the
    /// admitting call becomes the first of the new window. Every check, admitted
    /// or not, pushes `window_end` to `now + WINDOW`: the window slides for as
    /// long as calls keep arriving less than a window apart.
    // TODO: move to a fixed window boundary once the server-side window
    // semantics are confirmed; a sliding window never resets under steady polling.
    pub fn admit(&mut self, now: Instant) -> Admission {
        if now >= self.window_end {
            self.calls = 0;
        }
        self.window_end = now + WINDOW;

        if self.calls >= self.limit() {
            return Admission::Denied {
                retry_after: self.window_end - now,
            };
        }
        self.calls += 1;
        Admission::Admitted
    }

    /// Request path this route throttles
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Limit tier
    pub const fn class(&self) -> RouteClass {
        self.class
    }

    /// Calls admitted per window
    pub const fn limit(&self) -> u32 {
        self.class.limit()
    }

    /// Calls admitted in the current window
    pub const fn calls(&self) -> u32 {
        self.calls
    }

    /// Instant the current window closes
    pub const fn window_end(&self) -> Instant {
        self.window_end
    }
}
