//! The CRUD actions a resource can expose.

use std::fmt;

/// Form actions that make no sense for a JSON API; always dropped from `only` and forced into `except`.
pub const FORM_ACTIONS: [&str; 2] = ["create", "edit"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Index,
    Show,
    Store,
    Update,
    Destroy,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Index,
        Action::Show,
        Action::Store,
        Action::Update,
        Action::Destroy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Index => "index",
            Action::Show => "show",
            Action::Store => "store",
            Action::Update => "update",
            Action::Destroy => "destroy",
        }
    }

    pub fn parse(name: &str) -> Option<Action> {
        Action::ALL.into_iter().find(|a| a.as_str() == name)
    }

    /// Item actions address one instance (`/name/:param`); the rest address the collection.
    pub fn is_item(&self) -> bool {
        matches!(self, Action::Show | Action::Update | Action::Destroy)
    }

    /// Only these actions carry a body and may swap in a validated request.
    pub fn accepts_body(&self) -> bool {
        matches!(self, Action::Store | Action::Update)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
