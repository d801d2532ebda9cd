//! Alert system for displaying success and error messages to users.
//!
//! Alerts are rendered as HTML fragments that HTMX swaps into the
//! `#alert-container` element of the base page.

use maud::{Markup, html};

/// An alert message with styling based on its kind.
#[derive(Debug, Clone)]
pub enum Alert {
    /// A success message without details.
    SuccessSimple { message: String },
    /// An error message with details on how to fix the problem.
    Error { message: String, details: String },
    /// An error message without details.
    ErrorSimple { message: String },
}

impl Alert {
    pub fn into_html(self) -> Markup {
        let (container_style, message, details) = match self {
            Alert::SuccessSimple { message } => (
                "text-green-800 border-green-300 bg-green-50 \
                dark:bg-gray-800 dark:text-green-400 dark:border-green-800",
                message,
                None,
            ),
            Alert::Error { message, details } => (
                "text-red-800 border-red-300 bg-red-50 \
                dark:bg-gray-800 dark:text-red-400 dark:border-red-800",
                message,
                Some(details),
            ),
            Alert::ErrorSimple { message } => (
                "text-red-800 border-red-300 bg-red-50 \
                dark:bg-gray-800 dark:text-red-400 dark:border-red-800",
                message,
                None,
            ),
        };

        html! {
            div
                role="alert"
                class={"flex items-start justify-between gap-4 p-4 mb-4 border rounded-lg " (container_style)}
            {
                div
                {
                    p class="font-medium" { (message) }

                    @if let Some(details) = details {
                        p class="text-sm" { (details) }
                    }
                }

                button
                    type="button"
                    aria-label="Fechar"
                    onclick="this.closest('#alert-container').classList.add('hidden')"
                    class="text-sm font-semibold"
                {
                    "×"
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use super::Alert;

    #[test]
    fn error_alert_shows_message_and_details() {
        let markup = Alert::Error {
            message: "Falhou".to_owned(),
            details: "Tente novamente".to_owned(),
        }
        .into_html()
        .into_string();

        let html = Html::parse_fragment(&markup);
        let paragraphs = html
            .select(&Selector::parse("p").unwrap())
            .map(|p| p.text().collect::<String>())
            .collect::<Vec<_>>();

        assert_eq!(paragraphs, vec!["Falhou", "Tente novamente"]);
    }
}
