use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::config::ConsoleConfig;

const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// The single logical location of the console. Exactly one route is current
/// at a time; it is derived from the address, never written directly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Overview,
    Queue,
    Services,
    Settings,
    Service {
        stack_id: String,
        service_id: String,
    },
    /// The observed path lives under the supervisor's base path, yet this
    /// application answered: the reverse proxy is not routing the
    /// self-upgrade helper. A deployment defect, not a navigable page.
    SupervisorMisroute {
        base_path: String,
        pathname: String,
    },
}

/// Bidirectional mapping between [`Route`] and address strings. Total in
/// both directions: every pathname decodes to exactly one route, with
/// unknown paths silently falling back to the overview.
#[derive(Clone, Debug)]
pub struct RouteCodec {
    base_path: Option<String>,
}

impl RouteCodec {
    pub fn new(config: &ConsoleConfig) -> Self {
        // `/api` belongs to the main service; treating it as a supervisor
        // base would shadow every API-shaped address.
        let base_path = config.supervisor_base_path().filter(|p| p != "/api");
        Self { base_path }
    }

    pub fn decode(&self, pathname: &str) -> Route {
        if let Some(base) = &self.base_path {
            if pathname == base || pathname.starts_with(&format!("{base}/")) {
                return Route::SupervisorMisroute {
                    base_path: base.clone(),
                    pathname: pathname.to_string(),
                };
            }
        }

        let segments: Vec<&str> = pathname.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Route::Overview,
            ["queue"] => Route::Queue,
            ["services"] => Route::Services,
            ["settings"] => Route::Settings,
            ["services", stack_id, service_id] => Route::Service {
                stack_id: decode_segment(stack_id),
                service_id: decode_segment(service_id),
            },
            _ => Route::Overview,
        }
    }

    pub fn encode(&self, route: &Route) -> String {
        match route {
            Route::Overview => "/".to_string(),
            Route::Queue => "/queue".to_string(),
            Route::Services => "/services".to_string(),
            Route::Settings => "/settings".to_string(),
            Route::Service {
                stack_id,
                service_id,
            } => format!(
                "/services/{}/{}",
                encode_segment(stack_id),
                encode_segment(service_id)
            ),
            Route::SupervisorMisroute { base_path, .. } => base_path.clone(),
        }
    }

    /// Dual addressing: a `#/`-prefixed hash takes precedence over the real
    /// pathname, so the same route model works inside an isolated preview
    /// frame that cannot rewrite the outer path.
    pub fn decode_address(&self, hash: &str, pathname: &str) -> Route {
        if hash.starts_with("#/") {
            self.decode(&hash[1..])
        } else {
            self.decode(pathname)
        }
    }
}

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

fn decode_segment(segment: &str) -> String {
    percent_decode_str(segment)
        .decode_utf8()
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> RouteCodec {
        RouteCodec::new(&ConsoleConfig::default())
    }

    #[test]
    fn decodes_known_paths() {
        let c = codec();
        assert_eq!(c.decode("/"), Route::Overview);
        assert_eq!(c.decode(""), Route::Overview);
        assert_eq!(c.decode("/queue"), Route::Queue);
        assert_eq!(c.decode("/services"), Route::Services);
        assert_eq!(c.decode("/settings"), Route::Settings);
        assert_eq!(
            c.decode("/services/stk_1/svc_2"),
            Route::Service {
                stack_id: "stk_1".to_string(),
                service_id: "svc_2".to_string(),
            }
        );
    }

    #[test]
    fn unknown_paths_fall_back_to_overview() {
        let c = codec();
        assert_eq!(c.decode("/nope"), Route::Overview);
        assert_eq!(c.decode("/services/only-stack"), Route::Overview);
        assert_eq!(c.decode("/services/a/b/c"), Route::Overview);
    }

    #[test]
    fn service_segments_are_percent_decoded() {
        let c = codec();
        assert_eq!(
            c.decode("/services/my%20stack/web%2Fapp"),
            Route::Service {
                stack_id: "my stack".to_string(),
                service_id: "web/app".to_string(),
            }
        );
    }

    #[test]
    fn round_trips_every_non_misroute_route() {
        let c = codec();
        let routes = [
            Route::Overview,
            Route::Queue,
            Route::Services,
            Route::Settings,
            Route::Service {
                stack_id: "stk_1".to_string(),
                service_id: "svc_2".to_string(),
            },
            Route::Service {
                stack_id: "my stack".to_string(),
                service_id: "web/app".to_string(),
            },
        ];
        for route in routes {
            assert_eq!(c.decode(&c.encode(&route)), route);
        }
    }

    #[test]
    fn supervisor_base_path_short_circuits_to_misroute() {
        let c = codec();
        assert_eq!(
            c.decode("/supervisor"),
            Route::SupervisorMisroute {
                base_path: "/supervisor".to_string(),
                pathname: "/supervisor".to_string(),
            }
        );
        // Even though "/supervisor/anything" would otherwise be an unknown
        // path defaulting to the overview.
        assert_eq!(
            c.decode("/supervisor/anything"),
            Route::SupervisorMisroute {
                base_path: "/supervisor".to_string(),
                pathname: "/supervisor/anything".to_string(),
            }
        );
        // Sibling paths sharing the prefix are not nested under it.
        assert_eq!(c.decode("/supervisor2"), Route::Overview);
    }

    #[test]
    fn trivial_base_path_disables_misroute_detection() {
        let c = RouteCodec::new(&ConsoleConfig::new("/", "repo"));
        assert_eq!(c.decode("/queue"), Route::Queue);

        let c = RouteCodec::new(&ConsoleConfig::new("/api", "repo"));
        assert_eq!(c.decode("/api/health"), Route::Overview);
    }

    #[test]
    fn hash_takes_precedence_over_pathname() {
        let c = codec();
        assert_eq!(c.decode_address("#/queue", "/settings"), Route::Queue);
        assert_eq!(c.decode_address("", "/settings"), Route::Settings);
        // A hash that is not `#/`-prefixed is an anchor, not an address.
        assert_eq!(c.decode_address("#section", "/queue"), Route::Queue);
    }
}
