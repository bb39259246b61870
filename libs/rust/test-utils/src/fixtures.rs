//! Test fixtures with sample data.
//!
//! A small "users" provider and the contract a "web" consumer holds against
//! it, plus provider answers that do and do not satisfy it.

use pact_verifier::{Contract, Expected, Interaction, MatcherValue, ProviderState, Request, Response};
use serde_json::{Value, json};

/// Consumer name used by the sample contract.
pub const CONSUMER: &str = "web";

/// Provider name used by the sample contract.
pub const PROVIDER: &str = "users";

/// Expected user body: typed id and name, email by pattern, roles as a
/// non-empty list of strings.
#[must_use]
#[allow(clippy::missing_panics_doc, clippy::unwrap_used)]
pub fn user_body() -> Expected {
    Expected::object([
        ("id", Expected::from(MatcherValue::like(1_i64).unwrap())),
        ("name", Expected::from(MatcherValue::like("alice").unwrap())),
        (
            "email",
            Expected::from(MatcherValue::term(r"[^@]+@[^@]+\.[a-z]+", "alice@example.com").unwrap()),
        ),
        (
            "roles",
            Expected::from(MatcherValue::each_like("admin", 1).unwrap()),
        ),
        ("active", Expected::from(true)),
    ])
}

/// `GET /users/1` given the user exists.
#[must_use]
pub fn get_user_interaction() -> Interaction {
    Interaction::new(
        "a request for user 1",
        Request::new("GET", "/users/1").with_header("Accept", "application/json"),
        Response::new(200)
            .with_header("Content-Type", "application/json; charset=utf-8")
            .with_body(user_body()),
    )
    .given_with_params(ProviderState::new("user exists").with_param("id", 1))
}

/// `DELETE /users/2` given the user does not exist.
#[must_use]
pub fn delete_missing_user_interaction() -> Interaction {
    Interaction::new(
        "a delete of a missing user",
        Request::new("DELETE", "/users/2"),
        Response::new(404),
    )
    .given("user 2 does not exist")
}

/// The sample contract, V3 encoded.
#[must_use]
pub fn users_contract() -> Contract {
    Contract::new(CONSUMER, PROVIDER)
        .with_interaction(get_user_interaction())
        .with_interaction(delete_missing_user_interaction())
}

/// A provider body satisfying [`user_body`].
#[must_use]
pub fn matching_user() -> Value {
    json!({
        "id": 42,
        "name": "bob",
        "email": "bob@example.org",
        "roles": ["reader", "writer"],
        "active": true,
        "created_at": "2025-01-15T00:00:00Z"
    })
}

/// A provider body violating [`user_body`] at `email`, `roles[1]` and
/// `active`.
#[must_use]
pub fn mismatching_user() -> Value {
    json!({
        "id": 42,
        "name": "bob",
        "email": "not-an-email",
        "roles": ["reader", 7],
        "active": false
    })
}
