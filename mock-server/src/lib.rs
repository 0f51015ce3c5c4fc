use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

pub const COLLECTION_PATH: &str = "/v1/organisation/accounts";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Account {
    pub data: AccountData,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountData {
    pub id: Uuid,
    pub organisation_id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub attributes: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error_message: String,
}

pub type Db = Arc<RwLock<HashMap<Uuid, AccountData>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route(COLLECTION_PATH, post(create_account))
        .route(
            &format!("{COLLECTION_PATH}/{{id}}"),
            get(fetch_account).delete(delete_account),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ErrorBody {
        error_message: message.into(),
    };
    (status, Json(body)).into_response()
}

fn parse_id(raw: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(raw).map_err(|_| error(StatusCode::BAD_REQUEST, "id is not a valid uuid"))
}

async fn create_account(State(db): State<Db>, body: Bytes) -> Response {
    let account: Account = match serde_json::from_slice(&body) {
        Ok(account) => account,
        Err(e) => return error(StatusCode::BAD_REQUEST, format!("validation failure: {e}")),
    };
    if account.data.kind != "accounts" {
        return error(StatusCode::BAD_REQUEST, "type must be accounts");
    }

    let mut accounts = db.write().await;
    if accounts.contains_key(&account.data.id) {
        debug!(id = %account.data.id, "duplicate account");
        return error(
            StatusCode::CONFLICT,
            "Account cannot be created as it violates a duplicate constraint",
        );
    }
    let data = AccountData {
        version: 0,
        ..account.data
    };
    accounts.insert(data.id, data.clone());
    debug!(id = %data.id, "account created");
    (StatusCode::CREATED, Json(Account { data })).into_response()
}

async fn fetch_account(State(db): State<Db>, Path(raw_id): Path<String>) -> Response {
    let id = match parse_id(&raw_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let accounts = db.read().await;
    match accounts.get(&id) {
        Some(data) => Json(Account { data: data.clone() }).into_response(),
        None => error(StatusCode::NOT_FOUND, format!("record {id} does not exist")),
    }
}

async fn delete_account(
    State(db): State<Db>,
    Path(raw_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let id = match parse_id(&raw_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let version: i64 = match params.get("version").map(|v| v.parse::<i64>()) {
        Some(Ok(version)) => version,
        _ => return error(StatusCode::BAD_REQUEST, "version is required and must be an integer"),
    };

    let mut accounts = db.write().await;
    match accounts.get(&id) {
        None => StatusCode::NOT_FOUND.into_response(),
        Some(data) if data.version != version => {
            error(StatusCode::CONFLICT, "invalid version")
        }
        Some(_) => {
            accounts.remove(&id);
            debug!(%id, version, "account deleted");
            StatusCode::NO_CONTENT.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_serializes_to_json() {
        let account = Account {
            data: AccountData {
                id: Uuid::nil(),
                organisation_id: Uuid::nil(),
                kind: "accounts".to_string(),
                version: 0,
                attributes: serde_json::json!({"country": "GB"}),
            },
        };
        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["data"]["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["data"]["type"], "accounts");
        assert_eq!(json["data"]["version"], 0);
        assert_eq!(json["data"]["attributes"]["country"], "GB");
    }

    #[test]
    fn version_defaults_to_zero() {
        let account: Account = serde_json::from_str(
            r#"{"data":{"id":"00000000-0000-0000-0000-000000000001","organisation_id":"00000000-0000-0000-0000-000000000002","type":"accounts"}}"#,
        )
        .unwrap();
        assert_eq!(account.data.version, 0);
        assert!(account.data.attributes.is_null());
    }

    #[test]
    fn account_rejects_missing_type() {
        let result: Result<Account, _> = serde_json::from_str(
            r#"{"data":{"id":"00000000-0000-0000-0000-000000000001","organisation_id":"00000000-0000-0000-0000-000000000002"}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn parse_id_rejects_hostnames() {
        assert!(parse_id("superfake.com").is_err());
        assert!(parse_id("00000000-0000-0000-0000-000000000000").is_ok());
    }
}
