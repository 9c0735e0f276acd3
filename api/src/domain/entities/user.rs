//! User identity entity

use serde::Serialize;

use crate::domain::ports::Service;

/// Identity bound to an access credential on a hosting provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub service: Service,
    pub login: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl User {
    pub fn new(service: Service, login: &str, email: Option<&str>, name: Option<&str>) -> Self {
        Self {
            service,
            login: login.to_string(),
            email: email.map(String::from),
            name: name.map(String::from),
        }
    }
}
