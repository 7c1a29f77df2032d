//! Request body validation for the bookmarks API.
//!
//! Raw JSON goes in, a typed payload or an `ApiError::Validation` naming the
//! offending field comes out. Presence means the key exists with a non-null
//! value; truthiness plays no part, so a rating of 0 is present and valid.

use serde_json::Value;
use url::Url;

use crate::error::ApiError;
use crate::model::{BookmarkPatch, NewBookmark, NewList};

/// Validates a bookmark create body. Checks run in field order and the first
/// failure wins.
pub fn new_bookmark(payload: &Value) -> Result<NewBookmark, ApiError> {
    let title = text_field(payload, "title")?;
    let url = checked_url(text_field(payload, "url")?)?;
    let description = payload
        .get("description")
        .and_then(Value::as_str)
        .map(String::from);
    let rating = match payload.get("rating") {
        Some(value) if !value.is_null() => checked_rating(value)?,
        _ => return Err(ApiError::Validation("'rating' is required".to_string())),
    };

    Ok(NewBookmark {
        title,
        url,
        description,
        rating,
    })
}

/// Validates a bookmark patch body: at least one recognized field must be
/// supplied, and whatever is supplied has to pass the create rules.
pub fn bookmark_patch(payload: &Value) -> Result<BookmarkPatch, ApiError> {
    const FIELDS: [&str; 4] = ["title", "url", "description", "rating"];

    if !FIELDS.iter().any(|field| has_value(payload, field)) {
        return Err(ApiError::Validation(
            "Request body must contain either 'title', 'url', 'description', 'rating'".to_string(),
        ));
    }

    let title = if has_value(payload, "title") {
        Some(text_field(payload, "title")?)
    } else {
        None
    };
    let url = if has_value(payload, "url") {
        Some(checked_url(text_field(payload, "url")?)?)
    } else {
        None
    };
    let description = payload
        .get("description")
        .and_then(Value::as_str)
        .map(String::from);
    let rating = match payload.get("rating") {
        Some(value) if !value.is_null() => Some(checked_rating(value)?),
        _ => None,
    };

    Ok(BookmarkPatch {
        title,
        url,
        description,
        rating,
    })
}

/// Validates a list create body. Referenced bookmark ids only have to be
/// integers here; whether they exist is the store's call.
pub fn new_list(payload: &Value) -> Result<NewList, ApiError> {
    let name = text_field(payload, "name")?;
    let bookmark_ids = match payload.get("bookmarkIds") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => {
            let mut ids = Vec::with_capacity(items.len());
            for item in items {
                match item.as_i64().and_then(|id| i32::try_from(id).ok()) {
                    Some(id) => ids.push(id),
                    None => return Err(bad_bookmark_ids()),
                }
            }
            ids
        }
        Some(_) => return Err(bad_bookmark_ids()),
    };

    Ok(NewList { name, bookmark_ids })
}

fn has_value(payload: &Value, field: &str) -> bool {
    payload.get(field).is_some_and(|value| !value.is_null())
}

fn text_field(payload: &Value, field: &str) -> Result<String, ApiError> {
    match payload.get(field).and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
        _ => Err(ApiError::Validation(format!("'{}' is required", field))),
    }
}

fn checked_url(raw: String) -> Result<String, ApiError> {
    let valid = Url::parse(&raw)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false);
    if valid {
        Ok(raw)
    } else {
        Err(ApiError::Validation("'url' must be a valid URL".to_string()))
    }
}

fn checked_rating(value: &Value) -> Result<i32, ApiError> {
    value
        .as_i64()
        .filter(|rating| (0..=5).contains(rating))
        .map(|rating| rating as i32)
        .ok_or_else(|| {
            ApiError::Validation("'rating' must be a number between 0 and 5".to_string())
        })
}

fn bad_bookmark_ids() -> ApiError {
    ApiError::Validation("'bookmarkIds' must be an array of bookmark ids".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(err: ApiError) -> String {
        match err {
            ApiError::Validation(m) => m,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    // A fully valid payload comes back typed, optional description included.
    #[test]
    fn accepts_valid_bookmark() {
        let payload = json!({
            "title": "Thoughtbot",
            "url": "https://thoughtbot.com",
            "description": "rails consultancy",
            "rating": 4,
        });
        let input = new_bookmark(&payload).unwrap();
        assert_eq!(input.title, "Thoughtbot");
        assert_eq!(input.url, "https://thoughtbot.com");
        assert_eq!(input.description.as_deref(), Some("rails consultancy"));
        assert_eq!(input.rating, 4);
    }

    // Description can be left out entirely.
    #[test]
    fn description_is_optional() {
        let payload = json!({ "title": "t", "url": "https://a.test", "rating": 1 });
        assert_eq!(new_bookmark(&payload).unwrap().description, None);
    }

    // Each missing required field is named in the error.
    #[test]
    fn rejects_missing_fields() {
        let full = json!({ "title": "t", "url": "https://a.test", "rating": 3 });
        for field in ["title", "url", "rating"] {
            let mut payload = full.clone();
            payload.as_object_mut().unwrap().remove(field);
            let err = new_bookmark(&payload).unwrap_err();
            assert_eq!(message(err), format!("'{}' is required", field));
        }
    }

    // Blank and non-string titles count as missing.
    #[test]
    fn rejects_blank_title() {
        for title in [json!(""), json!("   "), json!(12)] {
            let payload = json!({ "title": title, "url": "https://a.test", "rating": 3 });
            assert_eq!(
                message(new_bookmark(&payload).unwrap_err()),
                "'title' is required"
            );
        }
    }

    // Out-of-range values, floats and strings are all bad ratings.
    #[test]
    fn rejects_bad_ratings() {
        for rating in [json!(-1), json!(6), json!(3.5), json!("3")] {
            let payload = json!({ "title": "t", "url": "https://a.test", "rating": rating });
            assert_eq!(
                message(new_bookmark(&payload).unwrap_err()),
                "'rating' must be a number between 0 and 5"
            );
        }
    }

    // Zero is a legal rating; the bounds are inclusive.
    #[test]
    fn accepts_boundary_ratings() {
        for rating in [0, 5] {
            let payload = json!({ "title": "t", "url": "https://a.test", "rating": rating });
            assert_eq!(new_bookmark(&payload).unwrap().rating, rating);
        }
    }

    // Misspelled schemes, relative strings and non-web schemes are rejected.
    #[test]
    fn rejects_invalid_urls() {
        for url in [
            "htp://invalid-url",
            "not a url",
            "www.example.com",
            "ftp://files.test",
        ] {
            let payload = json!({ "title": "t", "url": url, "rating": 3 });
            assert_eq!(
                message(new_bookmark(&payload).unwrap_err()),
                "'url' must be a valid URL"
            );
        }
    }

    // A patch needs at least one recognized field with a non-null value.
    #[test]
    fn patch_requires_a_recognized_field() {
        for payload in [
            json!({}),
            json!({ "irrelevant": "foo" }),
            json!({ "rating": null }),
        ] {
            assert_eq!(
                message(bookmark_patch(&payload).unwrap_err()),
                "Request body must contain either 'title', 'url', 'description', 'rating'"
            );
        }
    }

    // Only supplied fields land in the patch; unknown fields are ignored.
    #[test]
    fn patch_keeps_only_supplied_fields() {
        let patch = bookmark_patch(&json!({ "rating": 0, "nonsense": true })).unwrap();
        assert_eq!(patch.rating, Some(0));
        assert!(patch.title.is_none());
        assert!(patch.url.is_none());
        assert!(patch.description.is_none());
    }

    // Present fields still have to pass the create rules.
    #[test]
    fn patch_validates_present_fields() {
        assert_eq!(
            message(bookmark_patch(&json!({ "rating": 99 })).unwrap_err()),
            "'rating' must be a number between 0 and 5"
        );
        assert_eq!(
            message(bookmark_patch(&json!({ "url": "htp://nope" })).unwrap_err()),
            "'url' must be a valid URL"
        );
    }

    // Lists need a name; ids default to empty and must all be integers.
    #[test]
    fn validates_lists() {
        assert_eq!(
            message(new_list(&json!({})).unwrap_err()),
            "'name' is required"
        );

        let list = new_list(&json!({ "name": "reading" })).unwrap();
        assert!(list.bookmark_ids.is_empty());

        let list = new_list(&json!({ "name": "reading", "bookmarkIds": [3, 1, 2] })).unwrap();
        assert_eq!(list.bookmark_ids, vec![3, 1, 2]);

        for ids in [json!("nope"), json!([1, "two"]), json!([4294967297i64])] {
            let err = new_list(&json!({ "name": "reading", "bookmarkIds": ids })).unwrap_err();
            assert_eq!(message(err), "'bookmarkIds' must be an array of bookmark ids");
        }
    }
}
