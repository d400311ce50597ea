//! The HTTP surface: JSON handlers under `/api`, the shared application state, and the mapping of engine
//! errors onto status codes.

use crate::registry::{SessionRegistry, SharedSession, SESSION_COOKIE};
use crate::session::BlackjackSession;
use crate::snapshot::Snapshot;
use actix_web::{
    body::BoxBody,
    cookie::{Cookie, SameSite},
    error, get,
    http::StatusCode,
    post, web, HttpRequest, HttpResponse,
};
use blackjack_lib::{
    chart_entries, AllTimeAccuracy, BlackjackError, RngShuffle, ShuffleSource, TableConfig,
};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Produces the shuffle source for each new session's shoe.
pub type ShuffleFactory = Arc<dyn Fn() -> Box<dyn ShuffleSource> + Send + Sync>;

/// State shared by every worker of the server.
pub struct AppState {
    registry: Mutex<SessionRegistry>,
    all_time: Arc<AllTimeAccuracy>,
    table_config: TableConfig,
    shuffle_factory: ShuffleFactory,
}

impl AppState {
    /// Associated function to create a new `AppState`, sessions shuffle with entropy seeded rngs.
    pub fn new(
        table_config: TableConfig,
        all_time: Arc<AllTimeAccuracy>,
        session_ttl: Duration,
    ) -> AppState {
        AppState {
            registry: Mutex::new(SessionRegistry::new(session_ttl)),
            all_time,
            table_config,
            shuffle_factory: Arc::new(|| -> Box<dyn ShuffleSource> {
                Box::new(RngShuffle::from_entropy())
            }),
        }
    }

    /// Method for replacing the source of randomness given to new sessions.
    pub fn shuffle_factory<F>(mut self, factory: F) -> AppState
    where
        F: Fn() -> Box<dyn ShuffleSource> + Send + Sync + 'static,
    {
        self.shuffle_factory = Arc::new(factory);
        self
    }

    pub fn all_time(&self) -> &Arc<AllTimeAccuracy> {
        &self.all_time
    }

    /// Finds the caller's session from the session cookie, creating one when the cookie is missing, unknown
    /// or expired. The id is returned alongside a newly created session so it can be handed to the client.
    fn resolve_session(
        &self,
        req: &HttpRequest,
    ) -> Result<(SharedSession, Option<String>), UserError> {
        let mut registry = if let Ok(g) = self.registry.lock() {
            g
        } else {
            return Err(UserError::InternalError);
        };

        let now = Instant::now();
        if let Some(cookie) = req.cookie(SESSION_COOKIE) {
            if let Some(session) = registry.get(cookie.value(), now) {
                return Ok((session, None));
            }
            debug!("session cookie {} is unknown or expired", cookie.value());
        }

        let session = BlackjackSession::new(
            self.table_config,
            (self.shuffle_factory)(),
            Arc::clone(&self.all_time),
        );
        let (id, session) = registry.insert(session, now);
        Ok((session, Some(id)))
    }
}

/// An enum that will handle user facing errors
#[derive(Debug)]
pub enum UserError {
    InternalError,
    BadInput(String),
    IllegalState(String),
}

impl std::fmt::Display for UserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserError::InternalError => write!(f, "an internal error occurred"),
            UserError::BadInput(s) => write!(f, "{}", s),
            UserError::IllegalState(s) => write!(f, "{}", s),
        }
    }
}

impl std::error::Error for UserError {}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl error::ResponseError for UserError {
    fn error_response(&self) -> HttpResponse<BoxBody> {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            UserError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            UserError::BadInput(_) => StatusCode::BAD_REQUEST,
            UserError::IllegalState(_) => StatusCode::CONFLICT,
        }
    }
}

impl From<BlackjackError> for UserError {
    fn from(e: BlackjackError) -> Self {
        match e {
            BlackjackError::InvalidAction(_) => UserError::BadInput(e.to_string()),
            BlackjackError::IllegalState { .. } => UserError::IllegalState(e.to_string()),
            BlackjackError::EmptyShoe | BlackjackError::InvalidConfig(_) => {
                error!("engine failure: {}", e);
                UserError::InternalError
            }
        }
    }
}

/// Body of an action request, e.g. `{"action": "H"}`.
#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    #[serde(default)]
    pub action: Option<String>,
}

fn session_cookie(id: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, id);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

/// Helper function to run `op` against the caller's session while holding the session's lock, and to turn
/// the resulting snapshot into a response. A newly created session's id is set as a cookie.
fn with_session<F>(req: &HttpRequest, app: &AppState, op: F) -> Result<HttpResponse, UserError>
where
    F: FnOnce(&mut BlackjackSession) -> Result<Snapshot, BlackjackError>,
{
    let (session, new_id) = app.resolve_session(req)?;
    let snapshot = {
        let mut guard = if let Ok(g) = session.lock() {
            g
        } else {
            return Err(UserError::InternalError);
        };
        op(&mut *guard)?
    };

    let mut response = HttpResponse::Ok();
    if let Some(id) = new_id {
        response.cookie(session_cookie(id));
    }
    Ok(response.json(snapshot))
}

/// A handler that returns the caller's current round, dealing one if the session has none yet.
#[get("/api/start")]
async fn start(req: HttpRequest, app: web::Data<AppState>) -> Result<HttpResponse, UserError> {
    with_session(&req, &app, |session| session.start())
}

/// A handler that deals a new round, abandoning any round in progress.
#[post("/api/new-round")]
async fn new_round(req: HttpRequest, app: web::Data<AppState>) -> Result<HttpResponse, UserError> {
    with_session(&req, &app, |session| session.new_round())
}

/// A handler that applies a hit or a stand and grades it.
#[post("/api/action")]
async fn take_action(
    req: HttpRequest,
    body: web::Json<ActionRequest>,
    app: web::Data<AppState>,
) -> Result<HttpResponse, UserError> {
    let token = match body.into_inner().action {
        Some(token) => token,
        None => {
            return Err(UserError::BadInput(String::from(
                "missing action, expected \"H\" (hit) or \"S\" (stand)",
            )))
        }
    };
    with_session(&req, &app, |session| session.action(&token))
}

/// A handler that returns the caller's current round without dealing.
#[get("/api/state")]
async fn current_state(
    req: HttpRequest,
    app: web::Data<AppState>,
) -> Result<HttpResponse, UserError> {
    with_session(&req, &app, |session| Ok(session.snapshot()))
}

/// A handler that serves the basic strategy chart decisions are graded against.
#[get("/api/chart")]
async fn strategy_chart() -> HttpResponse {
    HttpResponse::Ok().json(chart_entries())
}

/// Registers the handlers, and makes malformed JSON bodies answer with the same error shape as every other
/// bad request.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        UserError::BadInput(format!("invalid request body: {}", err)).into()
    }))
    .service(start)
    .service(new_round)
    .service(take_action)
    .service(current_state)
    .service(strategy_chart);
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use blackjack_lib::{PlayerAction, RoundState};

    #[actix_web::test]
    async fn error_bodies_are_json() {
        let response = error::ResponseError::error_response(&UserError::BadInput(
            "invalid action `X`".to_string(),
        ));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, serde_json::json!({"error": "invalid action `X`"}));
    }

    #[test]
    fn engine_errors_map_to_status_codes() {
        let bad: UserError = BlackjackError::InvalidAction("X".to_string()).into();
        assert_eq!(
            error::ResponseError::status_code(&bad),
            StatusCode::BAD_REQUEST
        );

        let illegal: UserError = BlackjackError::IllegalState {
            action: PlayerAction::Hit,
            state: Some(RoundState::Settled),
        }
        .into();
        assert_eq!(
            error::ResponseError::status_code(&illegal),
            StatusCode::CONFLICT
        );

        let empty: UserError = BlackjackError::EmptyShoe.into();
        assert_eq!(
            error::ResponseError::status_code(&empty),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
