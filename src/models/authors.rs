use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub surname: Option<String>,
}

impl Author {
    /// Name used for the free-text `author` field of quotes linked to this author.
    pub fn display_name(&self) -> String {
        match &self.surname {
            Some(surname) if !surname.is_empty() => format!("{} {}", self.name, surname),
            _ => self.name.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAuthor {
    pub name: String,
    pub surname: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CreateAuthor {
    pub name: Option<String>,
    pub surname: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct AuthorChanges {
    pub name: Option<String>,
    pub surname: Option<String>,
}

impl AuthorChanges {
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.filter(|s| !s.is_empty()),
            surname: self.surname.filter(|s| !s.is_empty()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.surname.is_none()
    }

    pub fn apply(&self, author: &mut Author) {
        if let Some(name) = &self.name {
            author.name = name.clone();
        }
        if let Some(surname) = &self.surname {
            author.surname = Some(surname.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_joins_surname() {
        let mut author = Author {
            id: 1,
            name: "Rick".into(),
            surname: Some("Cook".into()),
        };
        assert_eq!(author.display_name(), "Rick Cook");

        author.surname = None;
        assert_eq!(author.display_name(), "Rick");
    }
}
