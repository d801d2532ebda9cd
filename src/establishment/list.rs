//! The establishments page and the JSON listing.

use axum::{
    Extension, Json,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error, UserId, endpoints,
    endpoints::format_endpoint,
    establishment::{EstablishmentRow, EstablishmentState, reconcile::fetch_establishments_for_user},
    html::{
        BADGE_STYLE, BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, empty_state,
    },
    navigation::NavBar,
};

/// Display the establishments of the user with a form to add more.
pub async fn get_establishments_page(
    State(state): State<EstablishmentState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let establishments = load_establishments(&state, user_id)?;

    Ok(establishments_view(&establishments).into_response())
}

/// The establishments of the user as JSON.
pub async fn get_establishments_json(
    State(state): State<EstablishmentState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<Vec<EstablishmentRow>>, Error> {
    load_establishments(&state, user_id).map(Json)
}

fn load_establishments(
    state: &EstablishmentState,
    user_id: UserId,
) -> Result<Vec<EstablishmentRow>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    fetch_establishments_for_user(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get establishments: {error}"))
}

fn create_form() -> Markup {
    html! {
        form
            hx-post=(endpoints::ESTABLISHMENTS_API)
            hx-target="#alert-container"
            hx-target-error="#alert-container"
            class="flex items-end w-full gap-4 mb-6"
        {
            div class="flex-1"
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Nome" }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="Ex.: Padaria do bairro"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Adicionar" }
            }
        }
    }
}

fn establishment_row(establishment: &EstablishmentRow) -> Markup {
    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            th scope="row" class={(TABLE_CELL_STYLE) " font-medium text-gray-900 dark:text-white"}
            {
                (establishment.name)
            }

            td class=(TABLE_CELL_STYLE) { (establishment.transaction_count) }

            td class=(TABLE_CELL_STYLE)
            {
                @if let Some(establishment_id) = establishment.establishment_id {
                    button
                        hx-delete=(format_endpoint(endpoints::DELETE_ESTABLISHMENT, establishment_id))
                        hx-confirm={
                            "Tem certeza que deseja excluir '" (establishment.name) "'?"
                        }
                        hx-target="#alert-container"
                        hx-target-error="#alert-container"
                        class=(BUTTON_DELETE_STYLE)
                    {
                        "Excluir"
                    }
                } @else {
                    span class=(BADGE_STYLE) title="Nome encontrado apenas nos lançamentos"
                    {
                        "Automático"
                    }
                }
            }
        }
    }
}

fn establishments_view(establishments: &[EstablishmentRow]) -> Markup {
    let nav_bar = NavBar::new(endpoints::ESTABLISHMENTS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full max-w-screen-md"
            {
                h1 class="mb-4 text-xl font-bold" { "Estabelecimentos" }

                (create_form())

                @if establishments.is_empty() {
                    (empty_state(
                        "Nenhum estabelecimento cadastrado",
                        "Cadastre um estabelecimento ou registre lançamentos para vê-los aqui.",
                    ))
                } @else {
                    div class="overflow-x-auto rounded-lg shadow"
                    {
                        table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                        {
                            thead class=(TABLE_HEADER_STYLE)
                            {
                                tr
                                {
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Nome" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Lançamentos" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Ações" }
                                }
                            }

                            tbody
                            {
                                @for establishment in establishments {
                                    (establishment_row(establishment))
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Estabelecimentos", &[], &content)
}
