//! User directory for starting new conversations.

use parley_core::{DirectoryUser, UserId};

/// Users the local user may chat with.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: Vec<DirectoryUser>,
}

impl UserDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the directory contents.
    pub fn load(&mut self, users: Vec<DirectoryUser>) {
        self.users = users;
    }

    /// User with `id`.
    pub fn get(&self, id: UserId) -> Option<&DirectoryUser> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Users whose name contains `query`, ignoring case. An empty query
    /// matches everyone.
    pub fn search(&self, query: &str) -> Vec<&DirectoryUser> {
        let needle = query.trim().to_lowercase();
        self.users.iter().filter(|u| u.username.to_lowercase().contains(&needle)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> UserDirectory {
        let mut directory = UserDirectory::new();
        directory.load(vec![
            DirectoryUser { id: UserId(2), username: "Ana".into() },
            DirectoryUser { id: UserId(3), username: "banana".into() },
            DirectoryUser { id: UserId(4), username: "Bob".into() },
        ]);
        directory
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let directory = directory();
        let names: Vec<&str> = directory.search(" ANA ").iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["Ana", "banana"]);
    }

    #[test]
    fn empty_query_matches_all() {
        assert_eq!(directory().search("").len(), 3);
    }

    #[test]
    fn lookup_by_id() {
        let directory = directory();
        assert_eq!(directory.get(UserId(4)).map(|u| u.username.as_str()), Some("Bob"));
        assert!(directory.get(UserId(9)).is_none());
    }
}
