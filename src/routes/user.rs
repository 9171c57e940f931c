use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use sqlx::SqlitePool;
use std::sync::Arc;

use super::auth::AuthUser;
use super::render_page;
use crate::AppState;
use crate::domain::users;
use crate::services::auth::{blank_to_none, hash_password, is_admin};
use crate::services::cookies;
use crate::services::error::LogErr;
use crate::services::flash::{self, Flash};
use crate::views;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/profile", get(profile))
        .route("/profile/edit", get(edit_profile_page).post(edit_profile))
        .route("/profile/delete", post(delete_profile))
        .route("/admin/users", get(user_management))
}

/// GET /profile
async fn profile(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    jar: CookieJar,
) -> Response {
    render_page(jar, &state, &user, Vec::new(), |ctx| {
        views::profile_page(ctx, &user)
    })
}

/// GET /profile/edit
async fn edit_profile_page(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    jar: CookieJar,
) -> Response {
    render_page(jar, &state, &user, Vec::new(), |ctx| {
        views::profile_edit_page(ctx, &user)
    })
}

#[derive(Debug, Deserialize)]
struct ProfileForm {
    new_password: Option<String>,
    plex_baseurl: Option<String>,
    plex_token: Option<String>,
    /// Checkbox; present only when ticked
    clear_plex_token: Option<String>,
}

/// POST /profile/edit - Blank password or token keeps the current one. A blank
/// URL clears it; the token is only cleared through `clear_plex_token`.
async fn edit_profile(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    jar: CookieJar,
    Form(form): Form<ProfileForm>,
) -> Result<Response, StatusCode> {
    let new_hash = match form.new_password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => Some(hash_password(password).log_500("Hash password error")?),
        None => None,
    };

    let mut tx = state.db.begin().await.log_500("Begin transaction error")?;

    if let Some(hash) = &new_hash {
        users::update_password(&mut *tx, user.id, hash)
            .await
            .log_500("Update password error")?;
    }

    let plex_token = if form.clear_plex_token.is_some() {
        None
    } else {
        blank_to_none(form.plex_token.as_deref()).or(user.plex_token.as_deref())
    };

    users::update_plex_credentials(
        &mut *tx,
        user.id,
        blank_to_none(form.plex_baseurl.as_deref()),
        plex_token,
    )
    .await
    .log_500("Update Plex credentials error")?;

    tx.commit().await.log_500("Commit transaction error")?;

    tracing::info!(
        user_id = user.id,
        password_changed = new_hash.is_some(),
        "profile updated"
    );

    let jar = flash::push(jar, Flash::success("Profile updated successfully!"));
    Ok((jar, Redirect::to("/profile")).into_response())
}

/// POST /profile/delete - Remove the account and end the session
async fn delete_profile(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    jar: CookieJar,
) -> Response {
    match delete_account(&state.db, user.id).await {
        Ok(0) => {
            let jar = flash::push(jar, Flash::danger("Account not found."));
            (jar, Redirect::to("/dashboard")).into_response()
        }
        Ok(_) => {
            tracing::info!(user_id = user.id, "account deleted");
            let jar = jar.remove(cookies::clear_session_cookie());
            let jar = flash::push(
                jar,
                Flash::success("Your account has been successfully deleted."),
            );
            (jar, Redirect::to("/login")).into_response()
        }
        Err(e) => {
            tracing::error!(user_id = user.id, "Delete account error: {}", e);
            let jar = flash::push(
                jar,
                Flash::danger(format!("An error occurred during account deletion: {}", e)),
            );
            (jar, Redirect::to("/profile")).into_response()
        }
    }
}

async fn delete_account(db: &SqlitePool, user_id: i64) -> Result<u64, sqlx::Error> {
    let mut tx = db.begin().await?;
    let removed = users::delete_user(&mut *tx, user_id).await?;
    tx.commit().await?;
    Ok(removed)
}

/// GET /admin/users - Admin only; everyone else goes back to their profile
async fn user_management(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    jar: CookieJar,
) -> Result<Response, StatusCode> {
    if !is_admin(&user, &state.config) {
        tracing::warn!(user_id = user.id, "non-admin requested user management");
        let jar = flash::push(
            jar,
            Flash::danger("You do not have permission to view this page."),
        );
        return Ok((jar, Redirect::to("/profile")).into_response());
    }

    let all_users = users::list_users(&state.db)
        .await
        .log_500("List users error")?;

    Ok(render_page(jar, &state, &user, Vec::new(), |ctx| {
        views::users_page(ctx, &all_users)
    }))
}
