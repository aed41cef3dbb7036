//! Page routes: `/`, `/add`, `/edit/:id`, everything else is not found.

use std::fmt;

use roster_core::EmployeeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    List,
    Add,
    Edit(EmployeeId),
    NotFound(String),
}

impl Route {
    pub fn parse(path: &str) -> Route {
        let trimmed = path.split(['?', '#']).next().unwrap_or("");
        let parts: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();
        match parts.as_slice() {
            [] => Route::List,
            ["add"] => Route::Add,
            ["edit", id] => match id.parse::<EmployeeId>() {
                Ok(id) => Route::Edit(id),
                Err(_) => Route::NotFound(path.to_string()),
            },
            _ => Route::NotFound(path.to_string()),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::List => "/".to_string(),
            Route::Add => "/add".to_string(),
            Route::Edit(id) => format!("/edit/{}", id),
            Route::NotFound(p) => p.clone(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
