//! Shared page layout, styles and formatting helpers for the HTML views.

use maud::{DOCTYPE, Markup, PreEscaped, html};

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};

use crate::{Period, endpoints::with_period};

// Link styles
pub const LINK_STYLE: &str = "text-blue-600 hover:text-blue-500 \
    dark:text-blue-500 dark:hover:text-blue-400 underline";

// Button styles
pub const BUTTON_PRIMARY_STYLE: &str = "w-full px-4 py-2 bg-blue-500 \
    dark:bg-blue-600 disabled:bg-blue-700 hover:enabled:bg-blue-600 \
    hover:enabled:dark:bg-blue-700 text-white rounded";

pub const BUTTON_DELETE_STYLE: &str = "text-red-600 hover:text-red-500 \
    dark:text-red-500 dark:hover:text-red-400 underline bg-transparent \
    border-none cursor-pointer";

// Form styles
pub const FORM_LABEL_STYLE: &str = "block mb-2 text-sm font-medium text-gray-900 dark:text-white";
pub const FORM_TEXT_INPUT_STYLE: &str = "block w-full p-2.5 rounded text-sm \
    text-gray-900 dark:text-white disabled:text-gray-500 bg-gray-50 \
    dark:bg-gray-700 border border-gray-300 dark:border-gray-600 \
    dark:placeholder-gray-400 focus:ring-blue-600 focus:border-blue-600 \
    focus:dark:border-blue-500 focus:dark:ring-blue-500";

// Table styles
pub const TABLE_HEADER_STYLE: &str = "text-xs text-gray-700 uppercase \
    bg-gray-50 dark:bg-gray-700 dark:text-gray-400";

pub const TABLE_ROW_STYLE: &str = "bg-white border-b dark:bg-gray-800 dark:border-gray-700";

pub const TABLE_CELL_STYLE: &str = "px-6 py-4";

// Badge style
pub const BADGE_STYLE: &str = "inline-flex items-center px-2.5 py-0.5 \
    text-xs font-semibold text-blue-800 bg-blue-100 rounded-full \
    dark:bg-blue-900 dark:text-blue-300";

// Summary card style
pub const CARD_STYLE: &str = "p-4 bg-white rounded-lg shadow dark:bg-gray-800";

// Page container
pub const PAGE_CONTAINER_STYLE: &str =
    "flex flex-col items-center px-6 py-8 mx-auto lg:py-5 text-gray-900 dark:text-white";

pub const AMOUNT_POSITIVE_STYLE: &str = "text-green-600 dark:text-green-400";
pub const AMOUNT_NEGATIVE_STYLE: &str = "text-red-600 dark:text-red-400";

pub enum HeadElement {
    /// The file path or URL to a JavaScript script.
    #[allow(dead_code)]
    ScriptLink(String),
    #[allow(dead_code)]
    Style(PreEscaped<String>),
}

pub fn base(title: &str, head_elements: &[HeadElement], content: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="pt-BR"
        {
            head
            {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - OpenMonetis" }
                link rel="icon" type="image/png" href="/static/favicon-32x32.png" sizes="32x32";
                link href="/static/main.css" rel="stylesheet";

                script src="/static/htmx-2.0.8-min.js" integrity="sha384-/TgkGk7p307TH7EXJDuUlgG3Ce1UVolAOFopFekQkkXihi5u/6OCvVKyz1W+idaz" {}
                script src="/static/htmx-ext-response-targets-2.0.4.js" integrity="sha384-T41oglUPvXLGBVyRdZsVRxNWnOOqCynaPubjUVjxhsjFTKrFJGEMm3/0KGmNQ+Pg" {}

                style
                {
                    r#"
                    #indicator.htmx-indicator {
                        display: none;
                    }

                    #indicator.htmx-request .htmx-indicator {
                        display: inline;
                    }
                    "#
                }

                @for element in head_elements
                {
                    @match element
                    {
                        HeadElement::ScriptLink(path) => script src=(path) {}
                        HeadElement::Style(text) => style { (text) }
                    }
                }
            }

            body
                hx-ext="response-targets"
                class="container max-w-full min-h-screen bg-gray-50 dark:bg-gray-900"
            {
                (content)

                // Alert container for action results
                div
                    id="alert-container"
                    class="w-full max-w-md px-4"
                    style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
                {}
            }
        }
    }
}

pub fn error_view(title: &str, header: &str, description: &str, fix: &str) -> Markup {
    // Template adapted from https://flowbite.com/blocks/marketing/404/
    let content = html!(
        section class="bg-white dark:bg-gray-900"
        {
            div class="py-8 px-4 mx-auto max-w-screen-xl lg:py-16 lg:px-6"
            {
                div class="mx-auto max-w-screen-sm text-center"
                {
                    h1
                        class="mb-4 text-7xl tracking-tight font-extrabold
                            lg:text-9xl text-blue-600 dark:text-blue-500"
                    {
                        (header)
                    }

                    p
                        class="mb-4 text-3xl md:text-4xl tracking-tight
                            font-bold text-gray-900 dark:text-white"
                    {
                        (description)
                    }

                    p
                        class="mb-4 text-1xl md:text-2xl tracking-tight
                            text-gray-900 dark:text-white"
                    {
                        (fix)
                    }

                    a
                        href="/"
                        class="inline-flex text-white bg-blue-600
                            hover:bg-blue-800 focus:ring-4 focus:outline-hidden
                            focus:ring-blue-300 font-medium rounded text-sm px-5
                            py-2.5 text-center dark:focus:ring-blue-900 my-4"
                    {
                        "Voltar ao início"
                    }
                }
            }
        }
    );

    base(title, &[], &content)
}

/// A heading with links to the previous and next month of `period` on `endpoint`.
pub fn month_navigation(endpoint: &str, period: Period) -> Markup {
    html! {
        nav
            aria-label="Navegação de meses"
            class="flex items-center justify-between w-full max-w-screen-md mb-6"
        {
            a
                href=(with_period(endpoint, &period.previous()))
                class=(LINK_STYLE)
                data-period=(period.previous())
            {
                "← Mês anterior"
            }

            h2 class="text-xl font-semibold capitalize" { (period.label()) }

            a
                href=(with_period(endpoint, &period.next()))
                class=(LINK_STYLE)
                data-period=(period.next())
            {
                "Próximo mês →"
            }
        }
    }
}

/// A centered message shown when a page has nothing to list.
pub fn empty_state(title: &str, description: &str) -> Markup {
    html! {
        div
            data-empty-state
            class="flex flex-col items-center py-16 text-center"
        {
            h3 class="font-semibold text-lg" { (title) }
            p class="text-sm text-gray-500 dark:text-gray-400 mt-1 max-w-sm" { (description) }
        }
    }
}

/// Format `number` as Brazilian reais, e.g. "R$ 1.234,50" or "-R$ 12,30".
pub fn format_currency(number: f64) -> String {
    static FMT: OnceLock<Formatter> = OnceLock::new();

    let fmt = FMT.get_or_init(|| {
        Formatter::currency("R$ ")
            .expect("currency prefix is short enough")
            .precision(Precision::Decimals(2))
    });

    if number == 0.0 {
        // Zero is hardcoded as "0", so we must specify the formatted string for zero
        return "R$ 0,00".to_owned();
    }

    let mut formatted_string = fmt.fmt_string(number.abs());

    // numfmt omits trailing zeros, so pad the cents to two digits.
    match formatted_string.rfind('.') {
        Some(index) if formatted_string.len() - index == 2 => formatted_string.push('0'),
        Some(_) => {}
        None => formatted_string.push_str(".00"),
    }

    // Swap to Brazilian separators: '.' for thousands and ',' for decimals.
    let formatted_string: String = formatted_string
        .chars()
        .map(|c| match c {
            ',' => '.',
            '.' => ',',
            c => c,
        })
        .collect();

    if number < 0.0 {
        format!("-{formatted_string}")
    } else {
        formatted_string
    }
}

/// Format a percentage with one decimal place, e.g. "12,5%".
pub fn format_percentage(value: f64) -> String {
    format!("{value:.1}%").replace('.', ",")
}

/// The text color class for an amount: green for income, red for spending.
pub fn amount_color_class(amount: f64) -> &'static str {
    if amount >= 0.0 {
        AMOUNT_POSITIVE_STYLE
    } else {
        AMOUNT_NEGATIVE_STYLE
    }
}

/// A link with blue text for use in a <p> tag.
pub fn link(url: &str, text: &str) -> Markup {
    html! (
        a href=(url) class=(LINK_STYLE)
        {
          (text)
        }
    )
}

#[cfg(test)]
mod tests {
    use super::{
        AMOUNT_NEGATIVE_STYLE, AMOUNT_POSITIVE_STYLE, amount_color_class, format_currency,
        format_percentage,
    };

    #[test]
    fn zero_uses_brazilian_format() {
        assert_eq!(format_currency(0.0), "R$ 0,00");
    }

    #[test]
    fn currency_always_has_two_decimal_places() {
        for amount in [12.3, 12.0, 0.5, 1234.56] {
            let formatted = format_currency(amount);
            let (_, cents) = formatted
                .rsplit_once(',')
                .unwrap_or_else(|| panic!("missing decimal comma in {formatted}"));

            assert_eq!(cents.len(), 2, "got {formatted}");
            assert!(formatted.starts_with("R$"), "got {formatted}");
        }
    }

    #[test]
    fn negative_amounts_have_leading_minus() {
        assert!(format_currency(-12.3).starts_with("-R$"));
    }

    #[test]
    fn percentage_uses_decimal_comma() {
        assert_eq!(format_percentage(12.345), "12,3%");
    }

    #[test]
    fn spending_is_red_and_income_is_green() {
        assert_eq!(amount_color_class(-0.01), AMOUNT_NEGATIVE_STYLE);
        assert_eq!(amount_color_class(0.0), AMOUNT_POSITIVE_STYLE);
        assert_eq!(amount_color_class(250.0), AMOUNT_POSITIVE_STYLE);
    }
}
