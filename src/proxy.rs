//! Authorization gate for the reverse proxy
//!
//! Maps an inbound `{method, path}` to a configured resource, builds its URN
//! and asks the engine for a decision. Forwarding is not handled here.
//! Any failure to decide fails closed.

use tracing::{debug, warn};

use crate::config::{ProxyConfig, ProxyResource};
use crate::iam::AuthorizationEngine;
use crate::model::CallerContext;
use crate::urn::Urn;

/// Outcome of a proxy authorization check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyDecision {
    /// Forward the request
    Allowed { resource: String, urn: Urn },
    /// Answer 403
    Forbidden { resource: String, urn: Urn },
    /// No configured resource matches; answer 403 without forwarding
    NoRoute,
    /// The decision could not be made; answer 500 without forwarding
    Error(String),
}

impl ProxyDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, ProxyDecision::Allowed { .. })
    }

    /// HTTP status a transport should answer with when not forwarding
    pub fn status_code(&self) -> u16 {
        match self {
            ProxyDecision::Allowed { .. } => 200,
            ProxyDecision::Forbidden { .. } | ProxyDecision::NoRoute => 403,
            ProxyDecision::Error(_) => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RouteSegment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone)]
struct Route {
    resource: ProxyResource,
    segments: Vec<RouteSegment>,
}

impl Route {
    fn new(resource: ProxyResource) -> Self {
        let segments = split_path(&resource.url)
            .into_iter()
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => RouteSegment::Param(name.to_string()),
                None => RouteSegment::Literal(segment.to_string()),
            })
            .collect();
        Route { resource, segments }
    }

    /// Bind URL parameters if `method` and `path` match this route
    fn bind<'r, 'a>(
        &'r self,
        method: &str,
        path: &[&'a str],
    ) -> Option<Vec<(&'r str, &'a str)>> {
        if !self.resource.method.eq_ignore_ascii_case(method) || path.len() != self.segments.len() {
            return None;
        }

        let mut params = Vec::new();
        for (segment, value) in self.segments.iter().zip(path) {
            match segment {
                RouteSegment::Literal(literal) if literal == value => {}
                RouteSegment::Literal(_) => return None,
                RouteSegment::Param(name) => params.push((name.as_str(), *value)),
            }
        }
        Some(params)
    }

    /// Fill `{name}` placeholders in one pass; inserted values are never re-scanned
    fn urn(&self, params: &[(&str, &str)]) -> Urn {
        let template = self.resource.urn.as_str();
        let mut urn = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            let Some(len) = rest[open..].find('}') else {
                break;
            };
            let close = open + len;
            urn.push_str(&rest[..open]);

            let name = &rest[open + 1..close];
            match params.iter().find(|(param, _)| *param == name) {
                Some((_, value)) => urn.push_str(value),
                None => urn.push_str(&rest[open..=close]),
            }
            rest = &rest[close + 1..];
        }
        urn.push_str(rest);

        Urn::from_external(urn)
    }
}

/// Split a request path into segments, resolving `.` and `..`
fn split_path(path: &str) -> Vec<&str> {
    let mut resolved: Vec<&str> = Vec::new();
    for part in path.split('/').filter(|s| !s.is_empty()) {
        match part {
            "." => continue,
            ".." => {
                resolved.pop();
            }
            _ => resolved.push(part),
        }
    }
    resolved
}

/// Proxy-side authorization gate
#[derive(Clone)]
pub struct ProxyGate {
    engine: AuthorizationEngine,
    routes: Vec<Route>,
}

impl ProxyGate {
    pub fn new(engine: AuthorizationEngine, config: &ProxyConfig) -> Self {
        ProxyGate {
            engine,
            routes: config.resources.iter().cloned().map(Route::new).collect(),
        }
    }

    /// Resolve a request to the first matching resource and its URN
    pub fn resolve(&self, method: &str, path: &str) -> Option<(&ProxyResource, Urn)> {
        let path = split_path(path);
        self.routes.iter().find_map(|route| {
            let params = route.bind(method, &path)?;
            // Bound values must not introduce URN separators or wildcards
            if params
                .iter()
                .any(|(_, value)| value.contains(':') || value.contains('*'))
            {
                return None;
            }
            Some((&route.resource, route.urn(&params)))
        })
    }

    /// Decide whether a proxied request may be forwarded
    pub fn check(&self, caller: &CallerContext, method: &str, path: &str) -> ProxyDecision {
        let Some((resource, urn)) = self.resolve(method, path) else {
            debug!(caller = %caller.identifier, method, path, "no proxy route");
            return ProxyDecision::NoRoute;
        };

        match self
            .engine
            .authorize_external_resource(caller, &urn, &resource.action)
        {
            Ok(true) => ProxyDecision::Allowed {
                resource: resource.id.clone(),
                urn,
            },
            Ok(false) => {
                debug!(caller = %caller.identifier, %urn, action = %resource.action, "proxy request forbidden");
                ProxyDecision::Forbidden {
                    resource: resource.id.clone(),
                    urn,
                }
            }
            Err(err) => {
                warn!(caller = %caller.identifier, %urn, error = %err, "proxy authorization failed");
                ProxyDecision::Error(err.to_string())
            }
        }
    }
}
