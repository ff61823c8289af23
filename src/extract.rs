//! Request extractors whose rejections use the JSON error envelope.
//!
//! axum's own `Json`, `Path` and `Query` reject with plain-text 4xx bodies. These
//! wrappers run the same extraction and turn any rejection into
//! [`AppError::BadRequest`], so clients always get `{ "error", "message" }`.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, OptionalFromRequest, Path, Query, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON request body.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppJson<T>(pub T);

/// Typed path parameters.
#[derive(Debug, Clone, Copy)]
pub struct AppPath<T>(pub T);

/// Typed query string.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppQuery<T>(pub T);

fn json_rejection(rejection: &JsonRejection) -> AppError {
    AppError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
}

fn path_rejection(rejection: &PathRejection) -> AppError {
    AppError::BadRequest(format!("Invalid path parameter: {}", rejection.body_text()))
}

fn query_rejection(rejection: &QueryRejection) -> AppError {
    AppError::BadRequest(format!("Invalid query string: {}", rejection.body_text()))
}

impl<S, T> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        <Json<T> as FromRequest<S>>::from_request(req, state)
            .await
            .map(|Json(value)| Self(value))
            .map_err(|rejection| json_rejection(&rejection))
    }
}

/// A missing `Content-Type` yields `None`; a present but malformed body is still an error.
impl<S, T> OptionalFromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        <Json<T> as OptionalFromRequest<S>>::from_request(req, state)
            .await
            .map(|body| body.map(|Json(value)| Self(value)))
            .map_err(|rejection| json_rejection(&rejection))
    }
}

impl<S, T> FromRequestParts<S> for AppPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| Self(value))
            .map_err(|rejection| path_rejection(&rejection))
    }
}

impl<S, T> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| Self(value))
            .map_err(|rejection| query_rejection(&rejection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Login {
        email: String,
        password: String,
    }

    #[derive(Debug, Deserialize)]
    struct Window {
        limit: u64,
    }

    fn json_request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn missing_field_is_a_bad_request() {
        let result = <AppJson<Login> as FromRequest<()>>::from_request(
            json_request(r#"{"email":"a@example.com"}"#),
            &(),
        )
        .await;
        assert_eq!(
            result.err().map(|err| err.status()),
            Some(StatusCode::BAD_REQUEST)
        );
    }

    #[tokio::test]
    async fn well_formed_body_is_extracted() {
        let result = <AppJson<Login> as FromRequest<()>>::from_request(
            json_request(r#"{"email":"a@example.com","password":"pw"}"#),
            &(),
        )
        .await
        .ok()
        .map(|AppJson(login)| (login.email, login.password));
        assert_eq!(
            result,
            Some(("a@example.com".to_string(), "pw".to_string()))
        );
    }

    #[tokio::test]
    async fn absent_optional_body_is_none() {
        let req = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::empty())
            .unwrap_or_default();
        let result = <AppJson<Login> as OptionalFromRequest<()>>::from_request(req, &()).await;
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn query_values_are_typed() {
        let (mut parts, ()) = Request::builder()
            .uri("/?limit=25")
            .body(())
            .unwrap_or_default()
            .into_parts();
        let result = AppQuery::<Window>::from_request_parts(&mut parts, &()).await;
        assert_eq!(result.ok().map(|AppQuery(w)| w.limit), Some(25));

        let (mut parts, ()) = Request::builder()
            .uri("/?limit=lots")
            .body(())
            .unwrap_or_default()
            .into_parts();
        let result = AppQuery::<Window>::from_request_parts(&mut parts, &()).await;
        assert_eq!(
            result.err().map(|err| err.status()),
            Some(StatusCode::BAD_REQUEST)
        );
    }
}
