use serde::Deserialize;

/// Selects which standard middlewares are installed, either by listing the
/// ones to keep (`Include`) or the ones to drop (`Exclude`).
#[derive(Debug, Clone, Deserialize)]
pub enum HttpMiddlewareConfig {
    Include(Vec<HttpMiddleware>),
    Exclude(Vec<HttpMiddleware>),
}

impl HttpMiddlewareConfig {
    pub fn is_enabled(&self, middleware: HttpMiddleware) -> bool {
        match self {
            HttpMiddlewareConfig::Include(list) => list.contains(&middleware),
            HttpMiddlewareConfig::Exclude(list) => !list.contains(&middleware),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum HttpMiddleware {
    RequestId,
    Logging,
    Liveness,
    Readiness,
    Timeout,
    CatchPanic,
}
