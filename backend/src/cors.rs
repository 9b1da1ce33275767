use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Method, Status};
use rocket::request::{self, FromRequest};
use rocket::serde::json::Json;
use rocket::{Request, Response};

use crate::structs::ApiError;

const ALLOW_HEADERS: [&str; 7] = [
    "Accept",
    "Accept-Version",
    "Content-Type",
    "Api-Version",
    "Origin",
    "X-Requested-With",
    "Authorization",
];

/// Echoes the caller's origin on every response and answers preflights with
/// the methods actually routed at the requested path.
pub struct CORS;

#[rocket::async_trait]
impl Fairing for CORS {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        if let Some(origin) = request.headers().get_one("Origin") {
            response.set_header(Header::new("Access-Control-Allow-Origin", origin.to_string()));
            response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
        }

        if request.method() == Method::Options {
            let methods = AllowedMethods::for_request(request);
            response.set_header(Header::new("Access-Control-Allow-Headers", ALLOW_HEADERS.join(", ")));
            response.set_header(Header::new("Access-Control-Allow-Methods", methods.to_string()));
        }
    }
}

/// Methods of every mounted route whose path matches the request, plus
/// OPTIONS.
#[derive(Debug, Clone, PartialEq)]
pub struct AllowedMethods(Vec<Method>);

impl AllowedMethods {
    pub fn for_request(request: &Request<'_>) -> Self {
        let segments: Vec<&str> = request.uri().path().segments().collect();

        let mut methods: Vec<Method> = Vec::new();
        for route in request.rocket().routes() {
            if route.method == Method::Options || methods.contains(&route.method) {
                continue;
            }
            if path_matches(route.uri.path(), &segments) {
                methods.push(route.method);
            }
        }
        methods.push(Method::Options);

        AllowedMethods(methods)
    }

    /// Whether any route besides the OPTIONS catch-all serves this path.
    pub fn is_routed(&self) -> bool {
        self.0.iter().any(|method| *method != Method::Options)
    }
}

impl std::fmt::Display for AllowedMethods {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|method| method.as_str()).collect();
        write!(f, "{}", names.join(", "))
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AllowedMethods {
    type Error = std::convert::Infallible;

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        request::Outcome::Success(AllowedMethods::for_request(request))
    }
}

/// Matches a mounted route path such as `/api/notes/<id>` against decoded
/// request segments.
fn path_matches(pattern: &str, segments: &[&str]) -> bool {
    let mut index = 0;
    for part in pattern.split('/').filter(|part| !part.is_empty()) {
        let dynamic = part.starts_with('<') && part.ends_with('>');
        if dynamic && part.ends_with("..>") {
            return true;
        }
        match segments.get(index) {
            Some(segment) if dynamic || part == *segment => index += 1,
            _ => return false,
        }
    }
    index == segments.len()
}

// Important for handling CORS error
#[options("/<_..>")]
pub fn preflight(methods: AllowedMethods) -> Status {
    if methods.is_routed() {
        Status::Ok
    } else {
        Status::NotFound
    }
}

/// Rocket reports a known path with an unrouted method as 404; tell the two
/// cases apart.
#[catch(404)]
pub fn not_found(request: &Request<'_>) -> (Status, Json<ApiError>) {
    if AllowedMethods::for_request(request).is_routed() {
        let message = format!("{} is not allowed", request.method());
        (Status::MethodNotAllowed, Json(ApiError::new("MethodNotAllowed", message)))
    } else {
        let message = format!("{} does not exist", request.uri().path());
        (Status::NotFound, Json(ApiError::new("ResourceNotFound", message)))
    }
}

/// Unparseable path ids and bodies that don't fit `NoteDraft`.
#[catch(422)]
pub fn unprocessable(request: &Request<'_>) -> Json<ApiError> {
    let message = format!("cannot process {} {}", request.method(), request.uri().path());
    Json(ApiError::new("UnprocessableEntity", message))
}

#[cfg(test)]
mod tests {
    use super::path_matches;

    #[test]
    fn matches_static_and_dynamic_segments() {
        assert!(path_matches("/api/notes", &["api", "notes"]));
        assert!(path_matches("/api/notes/<id>", &["api", "notes", "7"]));
        assert!(!path_matches("/api/notes/<id>", &["api", "notes"]));
        assert!(!path_matches("/api/notes", &["api", "notes", "7"]));
        assert!(!path_matches("/api/notes", &["api", "tags"]));
    }

    #[test]
    fn trailing_segments_match_anything() {
        assert!(path_matches("/<_..>", &[]));
        assert!(path_matches("/<_..>", &["a", "b", "c"]));
        assert!(path_matches("/api/<rest..>", &["api", "x"]));
        assert!(!path_matches("/api/<rest..>", &["other"]));
    }
}
