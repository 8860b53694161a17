use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::post,
};
use serde::{Deserialize, Serialize};

use crate::{
    adapters::http::{app_state::AppState, extract::RefreshAuth},
    app_error::AppResult,
    application::validators::{self, FieldErrors},
    use_cases::user::IssuedTokens,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(login).delete(logout))
        .route("/refresh", post(refresh))
}

#[derive(Deserialize)]
struct LoginPayload {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    keep_logged_in: bool,
}

#[derive(Serialize)]
struct AccessTokenResponse {
    jwt: String,
}

async fn login(
    State(app_state): State<AppState>,
    payload: Result<Json<LoginPayload>, JsonRejection>,
) -> AppResult<(StatusCode, Json<IssuedTokens>)> {
    let Json(payload) = payload?;

    let mut errors = FieldErrors::new();
    errors
        .check(
            validators::is_valid_email(&payload.email),
            "email",
            validators::EMAIL_MESSAGE,
        )
        .check(
            !payload.password.is_empty(),
            "password",
            validators::PASSWORD_MESSAGE,
        );
    errors.finish()?;

    let tokens = app_state
        .auth_use_cases
        .login(&payload.email, &payload.password, payload.keep_logged_in)
        .await?;

    Ok((StatusCode::CREATED, Json(tokens)))
}

async fn refresh(
    State(app_state): State<AppState>,
    RefreshAuth(identity): RefreshAuth,
) -> AppResult<Json<AccessTokenResponse>> {
    let jwt = app_state.auth_use_cases.refresh_access_token(identity).await?;
    Ok(Json(AccessTokenResponse { jwt }))
}

async fn logout(
    State(app_state): State<AppState>,
    RefreshAuth(identity): RefreshAuth,
) -> AppResult<StatusCode> {
    app_state.auth_use_cases.logout(identity).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue};
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::{adapters::http::extract::ACCESS_TOKEN_HEADER, test_utils::TestAppStateBuilder};

    const EMAIL: &str = "a@b.com";
    const PASSWORD: &str = "Abcdef1!";

    fn build_test_router(app_state: AppState) -> Router {
        Router::new()
            .nest("/access-tokens", router())
            .merge(crate::adapters::http::routes::user::router())
            .with_state(app_state)
    }

    async fn server_with_user() -> TestServer {
        let app_state = TestAppStateBuilder::new().build();
        app_state
            .auth_use_cases
            .signup(EMAIL, PASSWORD, "A B")
            .await
            .unwrap();
        TestServer::new(build_test_router(app_state)).unwrap()
    }

    async fn login(server: &TestServer) -> Value {
        let response = server
            .post("/access-tokens")
            .json(&json!({ "email": EMAIL, "password": PASSWORD }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    async fn me_status(server: &TestServer, jwt: &Value) -> StatusCode {
        server
            .get("/me")
            .add_header(
                HeaderName::from_static(ACCESS_TOKEN_HEADER),
                HeaderValue::from_str(jwt.as_str().unwrap()).unwrap(),
            )
            .await
            .status_code()
    }

    #[tokio::test]
    async fn login_returns_token_pair() {
        let server = server_with_user().await;
        let tokens = login(&server).await;

        assert_eq!(tokens["jwt"].as_str().unwrap().split('.').count(), 3);
        assert_eq!(tokens["refresh_token"].as_str().unwrap().split('.').count(), 3);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let server = server_with_user().await;

        let wrong_password = server
            .post("/access-tokens")
            .json(&json!({ "email": EMAIL, "password": "Abcdef1?" }))
            .await;
        wrong_password.assert_status(StatusCode::UNAUTHORIZED);

        let unknown_email = server
            .post("/access-tokens")
            .json(&json!({ "email": "nobody@b.com", "password": PASSWORD }))
            .await;
        unknown_email.assert_status(StatusCode::UNAUTHORIZED);

        let a: Value = wrong_password.json();
        let b: Value = unknown_email.json();
        assert_eq!(a["error"]["message"], "Invalid credentials");
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn login_validates_fields() {
        let server = server_with_user().await;
        let response = server
            .post("/access-tokens")
            .json(&json!({ "email": "nope" }))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = response.json();
        let fields: Vec<&str> = body["error"]["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["email", "password"]);
    }

    #[tokio::test]
    async fn second_login_revokes_first_session() {
        let server = server_with_user().await;
        let first = login(&server).await;
        let second = login(&server).await;

        assert_eq!(me_status(&server, &first["jwt"]).await, StatusCode::UNAUTHORIZED);
        assert_eq!(me_status(&server, &second["jwt"]).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn refresh_rotates_access_token_only() {
        let server = server_with_user().await;
        let tokens = login(&server).await;

        let response = server
            .post("/access-tokens/refresh")
            .json(&json!({ "refresh_token": tokens["refresh_token"] }))
            .await;
        response.assert_status_ok();
        let refreshed: Value = response.json();

        assert_eq!(me_status(&server, &tokens["jwt"]).await, StatusCode::UNAUTHORIZED);
        assert_eq!(me_status(&server, &refreshed["jwt"]).await, StatusCode::OK);

        // The refresh token is still good for another round.
        server
            .post("/access-tokens/refresh")
            .json(&json!({ "refresh_token": tokens["refresh_token"] }))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn logout_revokes_both_tokens() {
        let server = server_with_user().await;
        let tokens = login(&server).await;

        server
            .delete("/access-tokens")
            .json(&json!({ "refresh_token": tokens["refresh_token"] }))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        assert_eq!(me_status(&server, &tokens["jwt"]).await, StatusCode::UNAUTHORIZED);
        server
            .post("/access-tokens/refresh")
            .json(&json!({ "refresh_token": tokens["refresh_token"] }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn refresh_without_token_is_unprocessable() {
        let server = server_with_user().await;
        server
            .post("/access-tokens/refresh")
            .json(&json!({ "refresh_token": "" }))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}
