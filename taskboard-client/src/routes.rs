/// Named client routes
///
/// A [`RouteQuery`] is the navigation target handed to the router: a
/// route name plus optional params, query and hash. Empty params and
/// query maps are left out.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const ROUTE_HOME: &str = "home";
pub const ROUTE_LOGIN: &str = "login";
pub const ROUTE_TODO_LIST: &str = "todo-list";
pub const ROUTE_CREATE_USER: &str = "create-user";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteQuery {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<BTreeMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<BTreeMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl RouteQuery {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: None,
            query: None,
            hash: None,
        }
    }

    pub fn with_params(mut self, params: BTreeMap<String, String>) -> Self {
        self.params = Some(params).filter(|p| !p.is_empty());
        self
    }

    pub fn with_query(mut self, query: BTreeMap<String, String>) -> Self {
        self.query = Some(query).filter(|q| !q.is_empty());
        self
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into()).filter(|h| !h.is_empty());
        self
    }
}

/// Builds a route target in one call
pub fn get_route(
    name: &str,
    params: BTreeMap<String, String>,
    query: BTreeMap<String, String>,
    hash: Option<&str>,
) -> RouteQuery {
    let route = RouteQuery::new(name).with_params(params).with_query(query);
    match hash {
        Some(hash) => route.with_hash(hash),
        None => route,
    }
}

pub fn home_route() -> RouteQuery {
    RouteQuery::new(ROUTE_HOME)
}

pub fn login_route() -> RouteQuery {
    RouteQuery::new(ROUTE_LOGIN)
}

pub fn todo_list_route() -> RouteQuery {
    RouteQuery::new(ROUTE_TODO_LIST)
}

pub fn create_user_route() -> RouteQuery {
    RouteQuery::new(ROUTE_CREATE_USER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_named_routes_carry_only_a_name() {
        assert_eq!(serde_json::to_value(login_route()).unwrap(), json!({ "name": "login" }));
        assert_eq!(home_route().name, "home");
        assert_eq!(todo_list_route().name, "todo-list");
        assert_eq!(create_user_route().name, "create-user");
    }

    #[test]
    fn test_get_route_omits_empty_parts() {
        let route = get_route(ROUTE_TODO_LIST, BTreeMap::new(), BTreeMap::new(), None);
        assert_eq!(route, todo_list_route());

        let params = BTreeMap::from([("id".to_string(), "7".to_string())]);
        let query = BTreeMap::from([("page".to_string(), "2".to_string())]);
        let route = get_route(ROUTE_TODO_LIST, params, query, Some("card-7"));

        assert_eq!(
            serde_json::to_value(route).unwrap(),
            json!({
                "name": "todo-list",
                "params": { "id": "7" },
                "query": { "page": "2" },
                "hash": "card-7",
            })
        );
    }
}
