//! Note generation and download. Both routes sit behind the session
//! middleware, so handlers receive an explicit [`SessionContext`].

use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Extension, Form};
use serde::Deserialize;

use crate::api::pages;
use crate::api::types::AppContext;
use crate::prompt;
use crate::session::SessionContext;

#[derive(Deserialize)]
pub struct GenerateForm {
    #[serde(default)]
    pub narrative: String,
}

/// `POST /generate` — compose the fixed prompt around the narrative and
/// call the Completion Provider once. A whitespace-only narrative is
/// rejected with a warning before any call is made. The provider's
/// answer (or its embedded error string) is rendered either way and
/// stashed on the session for download.
pub async fn generate(
    State(ctx): State<AppContext>,
    Extension(session): Extension<SessionContext>,
    Form(form): Form<GenerateForm>,
) -> Html<String> {
    if form.narrative.trim().is_empty() {
        return Html(pages::main_page(
            &session.email,
            "",
            None,
            Some("Please enter a fictional or de-identified scenario first."),
        ));
    }

    let messages = prompt::compose(&form.narrative);
    let note = ctx.completion.generate(&messages).await;
    ctx.sessions.store_note(&session.cookie, note.clone());

    Html(pages::main_page(&session.email, &form.narrative, Some(&note), None))
}

/// `GET /download` — the most recent generated note as a text file
/// named with a timestamp. With nothing generated yet, bounce to the
/// gate view.
pub async fn download(
    State(ctx): State<AppContext>,
    Extension(session): Extension<SessionContext>,
) -> Response {
    match ctx.sessions.last_note(&session.cookie) {
        Some(note) => {
            let filename = format!("fpn_training_note_{}.txt", chrono::Utc::now().timestamp());
            (
                [
                    (
                        header::CONTENT_TYPE,
                        "text/plain; charset=utf-8".to_string(),
                    ),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{filename}\""),
                    ),
                ],
                note,
            )
                .into_response()
        }
        None => Redirect::to("/").into_response(),
    }
}
