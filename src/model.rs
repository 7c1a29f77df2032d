use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: i32,
    pub title: String,
    pub url: String,
    pub description: String,
    pub rating: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct List {
    pub id: i32,
    pub name: String,
    #[serde(rename = "bookmarkIds")]
    pub bookmark_ids: Vec<i32>,
}

/// A create payload that already passed validation.
#[derive(Debug, Clone)]
pub struct NewBookmark {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub rating: i32,
}

/// A partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct BookmarkPatch {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub rating: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewList {
    pub name: String,
    pub bookmark_ids: Vec<i32>,
}
