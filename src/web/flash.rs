//! One-time confirmation messages carried across a redirect in a cookie

use tower_cookies::{Cookie, Cookies};

const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Author,
    Category,
    Book,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Created,
    Updated,
    Deleted,
}

/// A success notice, stored as `resource.action` so the cookie value
/// never carries free text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flash {
    pub resource: Resource,
    pub action: Action,
}

impl Flash {
    pub fn new(resource: Resource, action: Action) -> Self {
        Self { resource, action }
    }

    fn encode(&self) -> String {
        let resource = match self.resource {
            Resource::Author => "author",
            Resource::Category => "category",
            Resource::Book => "book",
        };
        let action = match self.action {
            Action::Created => "created",
            Action::Updated => "updated",
            Action::Deleted => "deleted",
        };
        format!("{}.{}", resource, action)
    }

    fn decode(raw: &str) -> Option<Self> {
        let (resource, action) = raw.split_once('.')?;
        let resource = match resource {
            "author" => Resource::Author,
            "category" => Resource::Category,
            "book" => Resource::Book,
            _ => return None,
        };
        let action = match action {
            "created" => Action::Created,
            "updated" => Action::Updated,
            "deleted" => Action::Deleted,
            _ => return None,
        };
        Some(Self { resource, action })
    }

    pub fn message(&self) -> String {
        let resource = match self.resource {
            Resource::Author => "Author",
            Resource::Category => "Category",
            Resource::Book => "Book",
        };
        let action = match self.action {
            Action::Created => "created",
            Action::Updated => "updated",
            Action::Deleted => "deleted",
        };
        format!("{} {} successfully.", resource, action)
    }
}

fn cookie(value: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(FLASH_COOKIE, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie
}

/// Queue a notice for the next rendered page
pub fn push(cookies: &Cookies, flash: Flash) {
    cookies.add(cookie(flash.encode()));
}

/// Read and clear the pending notice, if any
pub fn take(cookies: &Cookies) -> Option<String> {
    let raw = cookies.get(FLASH_COOKIE)?.value().to_string();
    cookies.remove(cookie(String::new()));
    Flash::decode(&raw).map(|flash| flash.message())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let flash = Flash::new(Resource::Category, Action::Deleted);
        assert_eq!(flash.encode(), "category.deleted");
        assert_eq!(Flash::decode("category.deleted"), Some(flash));
    }

    #[test]
    fn test_unknown_values_are_dropped() {
        assert_eq!(Flash::decode("<script>.created"), None);
        assert_eq!(Flash::decode("book"), None);
    }

    #[test]
    fn test_message() {
        assert_eq!(
            Flash::new(Resource::Book, Action::Created).message(),
            "Book created successfully."
        );
    }
}
