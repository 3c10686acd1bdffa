use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "firstName", default)]
    pub first_name: String,
    #[serde(rename = "lastName", default)]
    pub last_name: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl User {
    pub fn full_name(&self) -> String {
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (false, false) => format!("{} {}", self.first_name, self.last_name),
            (false, true) => self.first_name.clone(),
            (true, false) => self.last_name.clone(),
            (true, true) => self.username.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
    pub total: u64,
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub limit: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserFilters {
    pub search: Option<String>,
    pub limit: u32,
    pub skip: u32,
}

impl Default for UserFilters {
    fn default() -> Self {
        Self {
            search: None,
            limit: 10,
            skip: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: &str, last: &str) -> User {
        User {
            id: 1,
            username: "emilys".into(),
            email: String::new(),
            first_name: first.into(),
            last_name: last.into(),
            gender: String::new(),
            image: String::new(),
            age: None,
            phone: None,
            role: None,
        }
    }

    #[test]
    fn test_full_name() {
        assert_eq!(user("Emily", "Johnson").full_name(), "Emily Johnson");
        assert_eq!(user("Emily", "").full_name(), "Emily");
        assert_eq!(user("", "Johnson").full_name(), "Johnson");
        assert_eq!(user("", "").full_name(), "emilys");
    }

    #[test]
    fn test_users_response_parses() {
        let json = r#"{"users":[{"id":2,"username":"michaelw","firstName":"Michael","lastName":"Williams","age":35,"role":"admin"}],"total":208,"skip":0,"limit":1}"#;
        let resp: UsersResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.total, 208);
        assert_eq!(resp.users[0].age, Some(35));
        assert_eq!(resp.users[0].role.as_deref(), Some("admin"));
    }
}
