//! HTTP handlers. Each one validates its inputs, calls [`countries_core::CountryService`] and shapes the
//! response; failures go through [`ApiError`].

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use countries_core::{ListOptions, Sort};

use crate::dto::{
    CountryRes, DeleteCountryRes, ErrorRes, ListCountriesParams, RefreshRes, StatusRes,
};
use crate::error::ApiError;
use crate::AppState;

const COUNTRY_NOT_FOUND: &str = "Country not found";

fn country_name(name: Result<Path<String>, PathRejection>) -> Result<String, ApiError> {
    name.map(|Path(name)| name)
        .map_err(|e| ApiError::validation("name", e.body_text()))
}

#[utoipa::path(
    get,
    path = "/countries",
    params(ListCountriesParams),
    responses(
        (status = 200, description = "Countries matching the filters", body = [CountryRes]),
        (status = 400, description = "Invalid sort expression", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// List countries, optionally filtered by region and currency and sorted.
///
/// # Errors
/// Returns `400 Bad Request` if `sort` does not end with `_asc` or `_desc`.
#[axum::debug_handler]
pub async fn list_countries(
    State(state): State<AppState>,
    params: Result<Query<ListCountriesParams>, QueryRejection>,
) -> Result<Json<Vec<CountryRes>>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::validation("query", e.body_text()))?;

    let sort = params
        .sort
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Sort>())
        .transpose()
        .map_err(|e| ApiError::validation("sort", e.to_string()))?;

    let options = ListOptions {
        region: params.region.filter(|r| !r.is_empty()),
        currency_code: params.currency.filter(|c| !c.is_empty()),
        sort,
    };

    let countries = state.service.list_countries(&options)?;
    Ok(Json(countries.into_iter().map(CountryRes::from).collect()))
}

#[utoipa::path(
    get,
    path = "/countries/{name}",
    params(("name" = String, Path, description = "Country name, matched ignoring case")),
    responses(
        (status = 200, description = "The country", body = CountryRes),
        (status = 400, description = "Malformed country name", body = ErrorRes),
        (status = 404, description = "No such country", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn get_country(
    State(state): State<AppState>,
    name: Result<Path<String>, PathRejection>,
) -> Result<Json<CountryRes>, ApiError> {
    let name = country_name(name)?;
    state
        .service
        .get_country(&name)?
        .map(|c| Json(c.into()))
        .ok_or(ApiError::NotFound(COUNTRY_NOT_FOUND))
}

#[utoipa::path(
    delete,
    path = "/countries/{name}",
    params(("name" = String, Path, description = "Country name, matched ignoring case")),
    responses(
        (status = 200, description = "Country deleted", body = DeleteCountryRes),
        (status = 400, description = "Malformed country name", body = ErrorRes),
        (status = 404, description = "No such country", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn delete_country(
    State(state): State<AppState>,
    name: Result<Path<String>, PathRejection>,
) -> Result<Json<DeleteCountryRes>, ApiError> {
    let name = country_name(name)?;
    if !state.service.delete_country(&name)? {
        return Err(ApiError::NotFound(COUNTRY_NOT_FOUND));
    }

    Ok(Json(DeleteCountryRes {
        status: "success".into(),
        message: format!("Country '{}' deleted successfully", name),
    }))
}

#[utoipa::path(
    post,
    path = "/countries/refresh",
    responses(
        (status = 200, description = "Store refreshed from the external sources", body = RefreshRes),
        (status = 503, description = "An external source failed", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Fetch both external feeds, upsert every country and regenerate the summary image.
///
/// Blocks until the fetches, the upserts and the image render have finished. A failed
/// image render is logged and does not affect the response.
#[axum::debug_handler]
pub async fn refresh_countries(State(state): State<AppState>) -> Result<Json<RefreshRes>, ApiError> {
    let outcome = state.service.refresh().await?;
    Ok(Json(outcome.into()))
}

#[utoipa::path(
    get,
    path = "/countries/image",
    responses(
        (status = 200, description = "Summary image as image/png bytes"),
        (status = 404, description = "No summary image generated yet", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn summary_image(State(state): State<AppState>) -> Result<Response, ApiError> {
    match state.service.summary_image()? {
        Some(bytes) => Ok(([(header::CONTENT_TYPE, "image/png")], bytes).into_response()),
        None => Err(ApiError::NotFound("Summary image not found")),
    }
}

#[utoipa::path(
    get,
    path = "/status",
    responses(
        (status = 200, description = "Store totals", body = StatusRes)
    )
)]
/// Total number of countries and the most recent refresh time (`null` when empty).
#[axum::debug_handler]
pub async fn status(State(state): State<AppState>) -> Result<Json<StatusRes>, ApiError> {
    Ok(Json(state.service.status()?.into()))
}

/// JSON 404 for unknown routes.
pub async fn fallback() -> (StatusCode, Json<ErrorRes>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorRes {
            error: "Not Found".into(),
            details: None,
        }),
    )
}

/// Give axum's bodiless 405 the JSON error envelope, keeping its `Allow` header.
pub async fn method_not_allowed(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED
        || response.headers().contains_key(header::CONTENT_TYPE)
    {
        return response;
    }

    let mut json = (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorRes {
            error: "Method Not Allowed".into(),
            details: None,
        }),
    )
        .into_response();
    if let Some(allow) = response.headers().get(header::ALLOW) {
        json.headers_mut().insert(header::ALLOW, allow.clone());
    }
    json
}
