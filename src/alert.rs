//! Inline alert fragments for htmx form responses.
//!
//! Endpoints that fail validation render one of these into the
//! `#alert-container` target instead of a full page.

use maud::{Markup, html};

/// A dismissable alert message.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    Success { message: String, details: String },
    Error { message: String, details: String },
}

impl Alert {
    pub fn error(message: &str, details: &str) -> Self {
        Self::Error {
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    pub fn success(message: &str, details: &str) -> Self {
        Self::Success {
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    pub fn into_html(self) -> Markup {
        let (container_style, message, details) = match self {
            Alert::Success { message, details } => (
                "flex flex-col p-4 mb-4 text-sm rounded-lg border \
                 text-green-800 border-green-300 bg-green-50 \
                 dark:bg-gray-800 dark:text-green-400 dark:border-green-800",
                message,
                details,
            ),
            Alert::Error { message, details } => (
                "flex flex-col p-4 mb-4 text-sm rounded-lg border \
                 text-red-800 border-red-300 bg-red-50 \
                 dark:bg-gray-800 dark:text-red-400 dark:border-red-800",
                message,
                details,
            ),
        };

        html!(
            div
                role="alert"
                class=(container_style)
                onclick="this.parentElement.classList.add('hidden')"
            {
                span class="font-semibold" { (message) }

                @if !details.is_empty() {
                    span { (details) }
                }
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Alert;

    #[test]
    fn error_alert_renders_message_and_details() {
        let html = Alert::error("Invalid amount", "The amount must be greater than zero.")
            .into_html()
            .into_string();

        assert!(html.contains("Invalid amount"));
        assert!(html.contains("The amount must be greater than zero."));
        assert!(html.contains("role=\"alert\""));
    }

    #[test]
    fn success_alert_omits_empty_details() {
        let html = Alert::success("Saved", "").into_html().into_string();

        assert!(html.contains("Saved"));
        assert!(!html.contains("<span></span>"));
    }
}
