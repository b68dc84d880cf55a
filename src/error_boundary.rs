// Local failure containment for a rendered subtree.
// Errors never propagate past the boundary; retry clears only this boundary's flag.

use serde::Serialize;

pub const FALLBACK_TITLE: &str = "Something went wrong";

/// What the host should draw for the guarded subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoundaryView {
    Children,
    /// Generic card with a retry action and a developer-facing debug line.
    Fallback { title: String, debug_line: String },
}

#[derive(Debug, Clone, Default)]
pub struct ErrorBoundary {
    error: Option<String>,
    captures: u32,
}

impl ErrorBoundary {
    pub fn new() -> Self {
        ErrorBoundary::default()
    }

    /// Record a render failure. The first message is kept until reset.
    pub fn capture(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(error = %message, "Render failure caught by error boundary");
        self.captures += 1;
        if self.error.is_none() {
            self.error = Some(message);
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Retry: clear the flag and render children again.
    pub fn reset(&mut self) {
        self.error = None;
    }

    pub fn debug_line(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Total failures seen, including ones before a reset.
    pub fn capture_count(&self) -> u32 {
        self.captures
    }

    pub fn view(&self) -> BoundaryView {
        match &self.error {
            None => BoundaryView::Children,
            Some(message) => BoundaryView::Fallback {
                title: FALLBACK_TITLE.to_string(),
                debug_line: message.clone(),
            },
        }
    }

    /// Run `render`, capturing an `Err` instead of propagating it.
    pub fn guard<T, E, F>(&mut self, render: F) -> Option<T>
    where
        E: std::fmt::Display,
        F: FnOnce() -> Result<T, E>,
    {
        if self.has_error() {
            return None;
        }
        match render() {
            Ok(value) => Some(value),
            Err(e) => {
                self.capture(e.to_string());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_and_reset() {
        let mut boundary = ErrorBoundary::new();
        assert_eq!(boundary.view(), BoundaryView::Children);

        boundary.capture("cannot read properties of null");
        boundary.capture("second failure");
        assert!(boundary.has_error());
        assert_eq!(boundary.debug_line(), Some("cannot read properties of null"));
        assert_eq!(
            boundary.view(),
            BoundaryView::Fallback {
                title: FALLBACK_TITLE.to_string(),
                debug_line: "cannot read properties of null".to_string(),
            }
        );

        boundary.reset();
        assert!(!boundary.has_error());
        assert_eq!(boundary.debug_line(), None);
        assert_eq!(boundary.capture_count(), 2);
    }

    #[test]
    fn guard_contains_errors() {
        let mut boundary = ErrorBoundary::new();
        assert_eq!(boundary.guard(|| Ok::<_, String>(3)), Some(3));
        assert_eq!(boundary.guard(|| Err::<u8, _>("boom")), None);
        assert!(boundary.has_error());
        // Tripped boundaries don't re-render until reset.
        assert_eq!(boundary.guard(|| Ok::<_, String>(4)), None);
        boundary.reset();
        assert_eq!(boundary.guard(|| Ok::<_, String>(5)), Some(5));
    }
}
