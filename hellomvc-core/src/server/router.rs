//! Route matcher using a radix tree
//!
//! Paths are matched exactly; method constraints are checked after the
//! path so that a known path with the wrong method can answer 405.

use crate::config::RouteConfig;
use matchit::Router as RadixRouter;

/// Route entry ready for dispatch
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    /// Original route configuration
    pub config: RouteConfig,
}

impl CompiledRoute {
    /// Whether this route accepts `method`
    pub fn allows(&self, method: &str) -> bool {
        match &self.config.methods {
            Some(methods) => methods.iter().any(|m| m.eq_ignore_ascii_case(method)),
            None => true,
        }
    }

    /// Accepted methods, upper-cased
    pub fn allowed_methods(&self) -> Vec<String> {
        self.config
            .methods
            .iter()
            .flatten()
            .map(|m| m.to_ascii_uppercase())
            .collect()
    }
}

/// Outcome of matching a request
#[derive(Debug)]
pub enum RouteMatch<'a> {
    Found(&'a CompiledRoute),
    MethodNotAllowed(Vec<String>),
    NotFound,
}

/// Router over the configured routes
pub struct Router {
    /// Radix tree from path to route index
    path_router: RadixRouter<usize>,
    /// Routes in configuration order
    compiled: Vec<CompiledRoute>,
    /// All routes for iteration
    all_routes: Vec<RouteConfig>,
}

impl Router {
    /// Create a new router from route configurations
    pub fn new(routes: Vec<RouteConfig>) -> Self {
        let mut path_router = RadixRouter::new();
        let mut compiled = Vec::with_capacity(routes.len());

        for config in &routes {
            if !config.is_literal_path() {
                tracing::warn!("Skipping route {}: pattern syntax is not supported", config.path);
                continue;
            }

            let index = compiled.len();
            if let Err(e) = path_router.insert(config.path.as_str(), index) {
                tracing::warn!("Failed to insert route {}: {}", config.path, e);
                continue;
            }
            compiled.push(CompiledRoute {
                config: config.clone(),
            });
        }

        Self {
            path_router,
            compiled,
            all_routes: routes,
        }
    }

    /// Match a request path and method
    pub fn match_request(&self, path: &str, method: &str) -> RouteMatch<'_> {
        let Ok(matched) = self.path_router.at(path) else {
            return RouteMatch::NotFound;
        };

        let route = &self.compiled[*matched.value];
        if route.allows(method) {
            RouteMatch::Found(route)
        } else {
            RouteMatch::MethodNotAllowed(route.allowed_methods())
        }
    }

    /// Get all routes
    pub fn routes(&self) -> &[RouteConfig] {
        &self.all_routes
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(RouteConfig::defaults())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Binding, HandlerConfig, Reply};

    #[test]
    fn test_exact_match() {
        let router = Router::default();

        match router.match_request("/request-body-json-v3", "POST") {
            RouteMatch::Found(route) => {
                assert_eq!(route.config.path, "/request-body-json-v3");
                assert_eq!(
                    route.config.handler,
                    HandlerConfig::JsonBody { binding: Binding::Record, reply: Reply::Ok }
                );
            }
            other => panic!("unexpected match: {:?}", other),
        }
    }

    #[test]
    fn test_method_not_allowed() {
        let router = Router::default();
        match router.match_request("/request-body-json-v1", "GET") {
            RouteMatch::MethodNotAllowed(allowed) => assert_eq!(allowed, vec!["POST".to_string()]),
            other => panic!("unexpected match: {:?}", other),
        }
    }

    #[test]
    fn test_not_found() {
        let router = Router::default();
        assert!(matches!(router.match_request("/request-body-json-v6", "POST"), RouteMatch::NotFound));
        assert!(matches!(router.match_request("/request-body-json-v1/extra", "POST"), RouteMatch::NotFound));
    }

    #[test]
    fn test_any_method_when_unconstrained() {
        let mut route = RouteConfig::json_body("/open", Binding::Stream, Reply::Ok);
        route.methods = None;
        let router = Router::new(vec![route]);
        assert!(matches!(router.match_request("/open", "PUT"), RouteMatch::Found(_)));
    }

    #[test]
    fn test_pattern_paths_never_match() {
        let routes = vec![
            RouteConfig::json_body("/users/{id}", Binding::Record, Reply::Ok),
            RouteConfig::json_body("/broken/{", Binding::Record, Reply::Ok),
            RouteConfig::json_body("/users", Binding::Record, Reply::Ok),
        ];
        let router = Router::new(routes);
        assert!(matches!(router.match_request("/users/42", "POST"), RouteMatch::NotFound));
        assert!(matches!(router.match_request("/users/{id}", "POST"), RouteMatch::NotFound));
        assert!(matches!(router.match_request("/broken/{", "POST"), RouteMatch::NotFound));
        assert!(matches!(router.match_request("/users", "POST"), RouteMatch::Found(_)));
    }

    #[test]
    fn test_duplicate_route_keeps_first() {
        let routes = vec![
            RouteConfig::json_body("/dup", Binding::Record, Reply::Ok),
            RouteConfig::json_body("/dup", Binding::Record, Reply::Echo),
        ];
        let router = Router::new(routes);
        match router.match_request("/dup", "POST") {
            RouteMatch::Found(route) => assert_eq!(
                route.config.handler,
                HandlerConfig::JsonBody { binding: Binding::Record, reply: Reply::Ok }
            ),
            other => panic!("unexpected match: {:?}", other),
        }
        assert_eq!(router.routes().len(), 2);
    }
}
